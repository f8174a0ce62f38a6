//! Error types for the edgequake-pdf2csv library.
//!
//! Every fatal condition is a variant of [`Pdf2CsvError`]. Extractors and the
//! classifier never catch errors; they propagate with `?` up to the
//! request boundary ([`crate::convert::Converter`] or the HTTP handler), which
//! turns them into a structured response.
//!
//! "No data extracted" is **not** an error. It is reported as
//! [`crate::output::Conversion::NoData`].
//!
//! Each variant belongs to one [`ErrorCategory`], which the HTTP layer uses
//! to pick a status code and a machine-readable `code` field.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2csv library.
#[derive(Debug, Error)]
pub enum Pdf2CsvError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// The upload request carried no file part.
    #[error("No file was uploaded. Send the PDF in a multipart field named 'file'.")]
    MissingUpload,

    /// Uploaded filename does not carry the `.pdf` extension.
    #[error("Only PDF files are allowed (got '{filename}').")]
    InvalidFileName { filename: String },

    /// Uploaded file is zero bytes long.
    #[error("Uploaded file '{filename}' is empty.")]
    EmptyUpload { filename: String },

    /// The bytes were read, but they are not a PDF.
    #[error("File '{name}' is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { name: String, magic: Vec<u8> },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Text could not be read from a page.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    /// pdfium-render returned an error while rasterising a page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR engine ran but reported a failure.
    #[error("OCR failed for page {page}: {detail}")]
    OcrFailed { page: usize, detail: String },

    /// The OCR engine is not installed or cannot be started.
    #[error("OCR engine '{engine}' is not available: {hint}")]
    OcrUnavailable { engine: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create, write or remove a file in the scratch directory.
    #[error("Scratch storage error at '{path}': {source}")]
    ScratchIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output CSV file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV encoder rejected a record.
    #[error("Failed to encode CSV '{path}': {source}")]
    CsvWriteFailed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium for your platform, then either place it on the system\n\
library path or pass --pdfium-lib /path/to/libpdfium (PDFIUM_LIB_PATH).\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`Pdf2CsvError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or disallowed input. Reported to the client, never retried.
    Validation,
    /// The PDF itself could not be opened or parsed.
    Parse,
    /// Anything else: I/O, OCR engine failure, rasteriser failure.
    Internal,
}

impl ErrorCategory {
    /// Machine-readable code used in HTTP error bodies.
    pub fn code(self) -> &'static str {
        match self {
            ErrorCategory::Validation => "VALIDATION_ERROR",
            ErrorCategory::Parse => "PARSE_ERROR",
            ErrorCategory::Internal => "INTERNAL_ERROR",
        }
    }
}

impl Pdf2CsvError {
    /// The category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Pdf2CsvError::MissingUpload
            | Pdf2CsvError::InvalidFileName { .. }
            | Pdf2CsvError::EmptyUpload { .. }
            | Pdf2CsvError::NotAPdf { .. } => ErrorCategory::Validation,

            Pdf2CsvError::CorruptPdf { .. }
            | Pdf2CsvError::PasswordRequired { .. }
            | Pdf2CsvError::WrongPassword { .. }
            | Pdf2CsvError::TextExtractionFailed { .. } => ErrorCategory::Parse,

            _ => ErrorCategory::Internal,
        }
    }

    /// `true` for errors caused by the uploaded input rather than the service.
    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }
}
