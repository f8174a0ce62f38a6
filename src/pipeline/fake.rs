//! In-memory backends for unit tests.

use super::{OcrBackend, PdfBackend, PdfDocumentView, TextRun};
use crate::error::Pdf2CsvError;
use image::{DynamicImage, Rgba, RgbaImage};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub text: String,
    pub runs: Vec<TextRun>,
    pub broken: bool,
    pub render_fails: bool,
}

impl FakePage {
    pub fn scanned() -> Self {
        Self::default()
    }

    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            runs: vec![TextRun::new(text, 72.0, 700.0, 72.0 + 6.0 * text.len() as f32, 712.0)],
            ..Self::default()
        }
    }

    /// A page whose lines are laid out as a grid starting at y = 700.
    pub fn with_grid(rows: &[&[&str]]) -> Self {
        let mut runs = Vec::new();
        let mut text = String::new();
        for (r, row) in rows.iter().enumerate() {
            let bottom = 700.0 - 20.0 * r as f32;
            for (c, cell) in row.iter().enumerate() {
                let left = 72.0 + 100.0 * c as f32;
                runs.push(TextRun::new(*cell, left, bottom, left + 40.0, bottom + 10.0));
            }
            text.push_str(&row.join(" "));
            text.push('\n');
        }
        Self {
            text,
            runs,
            ..Self::default()
        }
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn unrenderable() -> Self {
        Self {
            render_fails: true,
            ..Self::default()
        }
    }
}

pub struct FakeDocument {
    pages: Vec<FakePage>,
    text_reads: Cell<usize>,
}

impl FakeDocument {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            text_reads: Cell::new(0),
        }
    }

    pub fn text_reads(&self) -> usize {
        self.text_reads.get()
    }

    fn page(&self, index: usize) -> Result<&FakePage, Pdf2CsvError> {
        let page = self
            .pages
            .get(index)
            .ok_or_else(|| Pdf2CsvError::Internal(format!("no page {index}")))?;
        if page.broken {
            return Err(Pdf2CsvError::TextExtractionFailed {
                page: index + 1,
                detail: "broken content stream".into(),
            });
        }
        Ok(page)
    }
}

impl PdfDocumentView for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, Pdf2CsvError> {
        self.text_reads.set(self.text_reads.get() + 1);
        Ok(self.page(index)?.text.clone())
    }

    fn text_runs(&self, index: usize) -> Result<Vec<TextRun>, Pdf2CsvError> {
        Ok(self.page(index)?.runs.clone())
    }

    fn render_page(
        &self,
        index: usize,
        _dpi: u32,
        _max_pixels: u32,
    ) -> Result<DynamicImage, Pdf2CsvError> {
        let page = self.page(index)?;
        if page.render_fails {
            return Err(Pdf2CsvError::RasterisationFailed {
                page: index + 1,
                detail: "fake render failure".into(),
            });
        }
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            4,
            4,
            Rgba([255, 255, 255, 255]),
        )))
    }
}

pub struct FakePdfBackend {
    pages: Vec<FakePage>,
    corrupt: bool,
    sessions: AtomicUsize,
    pub opened: Mutex<Vec<(PathBuf, bool)>>,
}

impl FakePdfBackend {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            corrupt: false,
            sessions: AtomicUsize::new(0),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Whether a `with_document` visit is currently in progress.
    pub fn is_open(&self) -> bool {
        self.sessions.load(Ordering::SeqCst) > 0
    }

    pub fn corrupt() -> Self {
        Self {
            corrupt: true,
            ..Self::new(vec![])
        }
    }
}

impl PdfBackend for FakePdfBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn with_document(
        &self,
        path: &Path,
        _password: Option<&str>,
        visit: &mut dyn FnMut(&dyn PdfDocumentView) -> Result<(), Pdf2CsvError>,
    ) -> Result<(), Pdf2CsvError> {
        self.opened
            .lock()
            .unwrap()
            .push((path.to_path_buf(), path.exists()));
        if self.corrupt {
            return Err(Pdf2CsvError::CorruptPdf {
                path: path.to_path_buf(),
                detail: "fake xref damage".into(),
            });
        }
        let document = FakeDocument::new(self.pages.clone());
        self.sessions.fetch_add(1, Ordering::SeqCst);
        let result = visit(&document);
        self.sessions.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Returns `texts[page - 1]` (or empty) and records every image it was shown.
#[derive(Default)]
pub struct FakeOcr {
    pub texts: Vec<String>,
    pub fail_on_page: Option<usize>,
    pub seen: Mutex<Vec<(PathBuf, bool)>>,
}

impl FakeOcr {
    pub fn with_texts(texts: &[&str]) -> Self {
        Self {
            texts: texts.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing_on(page: usize) -> Self {
        Self {
            fail_on_page: Some(page),
            ..Self::default()
        }
    }

    pub fn seen(&self) -> Vec<(PathBuf, bool)> {
        self.seen.lock().unwrap().clone()
    }
}

impl OcrBackend for FakeOcr {
    fn name(&self) -> &'static str {
        "fake-ocr"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn recognize(&self, image_path: &Path, page: usize) -> Result<String, Pdf2CsvError> {
        self.seen
            .lock()
            .unwrap()
            .push((image_path.to_path_buf(), image_path.exists()));
        if self.fail_on_page == Some(page) {
            return Err(Pdf2CsvError::OcrFailed {
                page,
                detail: "fake engine crash".into(),
            });
        }
        Ok(self.texts.get(page - 1).cloned().unwrap_or_default())
    }
}
