use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Diseases the service can screen for. One endpoint per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disease {
    Cancer,
    Alzheimer,
    Ms,
}

/// Where a model's artifacts live on disk.
///
/// `Bundled` is a self-contained .onnx file. `Split` is a graph definition
/// whose tensor data sits in a separate external-data file next to it.
#[derive(Debug, Clone)]
pub enum ArtifactSpec {
    Bundled(PathBuf),
    Split { graph: PathBuf, weights: PathBuf },
}

impl Disease {
    pub const ALL: [Disease; 3] = [Disease::Cancer, Disease::Alzheimer, Disease::Ms];

    pub fn key(self) -> &'static str {
        match self {
            Disease::Cancer => "cancer",
            Disease::Alzheimer => "alzheimer",
            Disease::Ms => "ms",
        }
    }

    pub fn from_key(key: &str) -> Option<Disease> {
        Disease::ALL.into_iter().find(|d| d.key() == key)
    }

    /// Class names in the order the model's output vector is laid out.
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            Disease::Cancer => &["Glioma", "Meningioma", "No tumor", "Pituitary"],
            Disease::Alzheimer => &[
                "Mild Demented",
                "Moderate Demented",
                "Not Demented",
                "Very Mild Demented",
            ],
            Disease::Ms => &["Negative1", "Negative2", "Positive1", "Positive2"],
        }
    }

    pub fn artifact(self, models_dir: &Path) -> ArtifactSpec {
        match self {
            Disease::Cancer => ArtifactSpec::Bundled(models_dir.join("cancer.onnx")),
            Disease::Alzheimer => ArtifactSpec::Split {
                graph: models_dir.join("alzheimer").join("model.onnx"),
                weights: models_dir.join("alzheimer").join("model.weights.bin"),
            },
            Disease::Ms => ArtifactSpec::Split {
                graph: models_dir.join("ms").join("model.onnx"),
                weights: models_dir.join("ms").join("model.weights.bin"),
            },
        }
    }
}

impl fmt::Display for Disease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub disease: String,
    pub predicted_class: String,
    pub confidence: f32,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub models: Vec<&'static str>,
}
