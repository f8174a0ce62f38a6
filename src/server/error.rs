//! HTTP error responses.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::error::{ErrorCategory, Pdf2CsvError};

/// Everything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    /// The conversion itself failed.
    Conversion(Pdf2CsvError),
    /// The document has text but no table rows.
    NoData,
    /// The multipart body could not be read (malformed, or over the size limit).
    Multipart(MultipartError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::NoData => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NO_DATA",
                "No data extracted".to_string(),
            ),
            ApiError::Multipart(e) => (e.status(), "INVALID_REQUEST", e.body_text()),
            ApiError::Conversion(e) => match e.category() {
                ErrorCategory::Validation => {
                    (StatusCode::BAD_REQUEST, e.category().code(), e.to_string())
                }
                category @ (ErrorCategory::Parse | ErrorCategory::Internal) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    category.code(),
                    format!("An error occurred: {}", e),
                ),
            },
        }
    }
}

impl From<Pdf2CsvError> for ApiError {
    fn from(err: Pdf2CsvError) -> Self {
        ApiError::Conversion(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Multipart(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            error!("{} {}: {}", status.as_u16(), code, message);
        } else {
            warn!("{} {}: {}", status.as_u16(), code, message);
        }

        let body = ErrorResponse {
            error: message,
            code,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn validation_errors_are_bad_request() {
        let err = ApiError::from(Pdf2CsvError::InvalidFileName {
            filename: "notes.txt".into(),
        });
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");
        assert!(message.contains("Only PDF files are allowed"));
    }

    #[test]
    fn no_data_is_unprocessable() {
        let (status, code, message) = ApiError::NoData.parts();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(code, "NO_DATA");
        assert_eq!(message, "No data extracted");
    }

    #[test]
    fn parse_errors_are_prefixed_server_errors() {
        let err = ApiError::from(Pdf2CsvError::CorruptPdf {
            path: PathBuf::from("/scratch/x-input.pdf"),
            detail: "bad xref".into(),
        });
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "PARSE_ERROR");
        assert!(message.starts_with("An error occurred: "));
    }

    #[test]
    fn ocr_errors_are_internal() {
        let err = ApiError::from(Pdf2CsvError::OcrFailed {
            page: 3,
            detail: "engine crashed".into(),
        });
        let (status, code, _) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL_ERROR");
    }
}
