//! Pipeline stages for PDF-to-CSV conversion.
//!
//! Each submodule implements one step. The PDF engine and the OCR engine sit
//! behind the [`PdfBackend`] and [`OcrBackend`] traits so the stages can run
//! against pdfium/tesseract in production and against fakes in tests.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ scratch ──▶ classify ──┬──▶ table ──┬──▶ write
//! (upload)  (uuid file)  (text?)   └──▶ ocr  ───┘    (csv)
//! ```
//!
//! 1. [`input`]: validate the upload (extension, magic bytes) or a local path
//! 2. [`scratch`]: collision-free scratch files removed on drop
//! 3. [`classify`]: does any page carry a text layer?
//! 4. [`table`]: group positioned text runs into table rows
//! 5. [`ocr`]: rasterise each page, recognise it, delete the image
//! 6. [`write`]: encode the result as CSV (atomic rename)
//!
//! [`pdfium::PdfiumBackend`] and [`ocr::TesseractBackend`] are the production backends.

pub mod classify;
pub mod input;
pub mod ocr;
pub mod pdfium;
pub mod scratch;
pub mod table;
pub mod write;

#[cfg(test)]
pub(crate) mod fake;

use crate::error::Pdf2CsvError;
use image::DynamicImage;
use std::path::Path;

/// A positioned fragment of page text, in PDF points with the y axis pointing up.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl TextRun {
    pub fn new(text: impl Into<String>, left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            text: text.into(),
            left,
            right,
            top,
            bottom,
        }
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// Read access to one open PDF document.
///
/// Page indices are 0-based. Implementations are used from a single blocking
/// thread and need not be `Send`.
pub trait PdfDocumentView {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// All extractable text on a page; empty when the page has no text layer.
    fn page_text(&self, index: usize) -> Result<String, Pdf2CsvError>;

    /// Positioned text runs on a page, in content order.
    fn text_runs(&self, index: usize) -> Result<Vec<TextRun>, Pdf2CsvError>;

    /// Rasterise a page at `dpi`, capping each dimension at `max_pixels`.
    fn render_page(
        &self,
        index: usize,
        dpi: u32,
        max_pixels: u32,
    ) -> Result<DynamicImage, Pdf2CsvError>;
}

/// Opens PDF files and lends a [`PdfDocumentView`] to a visitor.
///
/// The document only lives for the duration of `visit`; engines such as
/// pdfium tie document lifetimes to a library handle that stays inside the
/// backend.
pub trait PdfBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    fn with_document(
        &self,
        path: &Path,
        password: Option<&str>,
        visit: &mut dyn FnMut(&dyn PdfDocumentView) -> Result<(), Pdf2CsvError>,
    ) -> Result<(), Pdf2CsvError>;
}

/// Recognises text in a rasterised page image.
pub trait OcrBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Check if the engine can run (binary installed, language data present).
    fn is_available(&self) -> bool;

    /// Run OCR on an image file and return the recognised text.
    ///
    /// `page` is 1-indexed and only used for error reporting.
    fn recognize(&self, image_path: &Path, page: usize) -> Result<String, Pdf2CsvError>;
}
