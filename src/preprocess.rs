use image::imageops::FilterType;
use ndarray::Array4;

use crate::error::ServiceError;

/// Spatial size every model in the registry was trained on.
pub const INPUT_SIZE: u32 = 176;

/// Decodes uploaded image bytes into the tensor the classifiers expect:
/// shape (1, 176, 176, 3), channels RGB, values scaled into [0, 1].
pub fn tensor_from_bytes(bytes: &[u8]) -> Result<Array4<f32>, ServiceError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ServiceError::ImageProcessing(e.to_string()))?;

    // Models take RGB regardless of the upload's color mode.
    let rgb = img.to_rgb8();
    let resized = image::imageops::resize(&rgb, INPUT_SIZE, INPUT_SIZE, FilterType::Nearest);

    let side = INPUT_SIZE as usize;
    let mut tensor = Array4::zeros((1, side, side, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, y as usize, x as usize, c]] = pixel[c] as f32 / 255.0;
        }
    }

    Ok(tensor)
}
