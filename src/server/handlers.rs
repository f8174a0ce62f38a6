//! Request handlers.

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use super::error::ApiError;
use super::AppState;
use crate::error::Pdf2CsvError;
use crate::output::{Conversion, CsvArtifact};
use crate::pipeline::input::{self, Upload};

/// Multipart field that carries the PDF.
const FILE_FIELD: &str = "file";

static EXTRACTION_MODE: HeaderName = HeaderName::from_static("x-extraction-mode");

/// Liveness message.
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to the PDF to CSV API!" }))
}

/// Convert an uploaded PDF and return the CSV as an attachment.
pub async fn convert_pdf_to_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_upload(&mut multipart).await?;

    match state.converter.convert_upload(upload).await? {
        Conversion::Csv(artifact) => csv_response(artifact).await,
        Conversion::NoData { .. } => Err(ApiError::NoData),
    }
}

/// Take the first `file` field; other fields are skipped.
async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        return Ok(Upload::new(filename, bytes.to_vec()));
    }
    Err(Pdf2CsvError::MissingUpload.into())
}

async fn csv_response(artifact: CsvArtifact) -> Result<Response, ApiError> {
    let body = tokio::fs::read(&artifact.path)
        .await
        .map_err(|source| Pdf2CsvError::ScratchIo {
            path: artifact.path.clone(),
            source,
        })?;

    let disposition = HeaderValue::from_str(&content_disposition(&artifact.download_name))
        .map_err(|e| Pdf2CsvError::Internal(format!("Invalid download name: {}", e)))?;

    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/csv; charset=utf-8"),
        ),
        (header::CONTENT_DISPOSITION, disposition),
        (
            EXTRACTION_MODE.clone(),
            HeaderValue::from_static(artifact.stats.mode.as_str()),
        ),
    ];

    Ok((StatusCode::OK, headers, body).into_response())
}

/// `attachment` disposition for `name`, with an RFC 6266 `filename*`
/// parameter when the name does not survive as plain ASCII.
fn content_disposition(name: &str) -> String {
    let fallback = input::ascii_fallback(name);
    if fallback == name {
        format!("attachment; filename=\"{}\"", name)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(name)
        )
    }
}
