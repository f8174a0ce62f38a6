//! # edgequake-pdf2csv
//!
//! Convert PDF documents to CSV. Documents with a text layer go through
//! table detection; scanned documents are rasterised and OCR'd page by page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF upload
//!  │
//!  ├─ 1. Input     extension + %PDF magic check, persist as <uuid>-input.pdf
//!  ├─ 2. Classify  any page with extractable text?
//!  ├─ 3a. Table    group positioned text runs into rows     (text layer)
//!  ├─ 3b. OCR      render page → PNG → tesseract → delete   (no text layer)
//!  └─ 4. Output    <uuid>.csv, input copy removed
//! ```
//!
//! A text document in which no table is found yields
//! [`Conversion::NoData`] rather than an empty file.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2csv::{Conversion, ConversionConfig, Converter, Upload};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = Converter::from_config(ConversionConfig::default())?;
//!     let bytes = std::fs::read("invoice.pdf")?;
//!     match converter.convert_upload(Upload::new("invoice.pdf", bytes)).await? {
//!         Conversion::Csv(artifact) => println!("wrote {}", artifact.path.display()),
//!         Conversion::NoData { .. } => eprintln!("no table found"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## HTTP service
//!
//! [`server::create_router`] exposes the converter as an axum router:
//! `GET /` answers a liveness message and `POST /convert_pdf_to_csv/`
//! takes a multipart field named `file`.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2csv` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## Runtime requirements
//!
//! - libpdfium on the library path (or `--pdfium-lib` / `PDFIUM_LIB_PATH`)
//! - `tesseract` on `PATH` for scanned documents

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, TableSettings};
pub use convert::Converter;
pub use error::{ErrorCategory, Pdf2CsvError};
pub use output::{Conversion, ConversionStats, CsvArtifact, ExtractionMode, ExtractionResult, Row};
pub use pipeline::input::Upload;
pub use pipeline::{OcrBackend, PdfBackend, PdfDocumentView, TextRun};
