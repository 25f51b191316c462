use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Request-level failures. Every variant renders as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid disease type: {0}")]
    UnknownDisease(String),

    #[error("No file part in the request")]
    MissingFilePart,

    #[error("No file selected for uploading")]
    EmptyFilename,

    #[error("Malformed multipart payload: {0}")]
    Multipart(String),

    #[error("Error processing image: {0}")]
    ImageProcessing(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::UnknownDisease(_)
            | ServiceError::MissingFilePart
            | ServiceError::EmptyFilename
            | ServiceError::Multipart(_) => StatusCode::BAD_REQUEST,
            ServiceError::ImageProcessing(_) | ServiceError::Inference(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        tracing::error!("request failed: {} ({})", self, status);
        HttpResponse::build(status).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_400() {
        assert_eq!(
            ServiceError::UnknownDisease("flu".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::MissingFilePart.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::EmptyFilename.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn processing_errors_are_500() {
        assert_eq!(
            ServiceError::ImageProcessing("truncated".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::Inference("shape mismatch".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn image_errors_keep_the_processing_prefix() {
        let err = ServiceError::ImageProcessing("bad magic bytes".into());
        assert!(err.to_string().starts_with("Error processing image"));
    }
}
