//! pdfium-backed [`PdfBackend`]: text layer, positioned text runs and page
//! rasterisation.
//!
//! ## Binding per call
//!
//! `PdfDocument<'a>` borrows the `Pdfium` handle it was loaded from, so the
//! handle cannot be stored next to the documents it produces. The backend
//! keeps only the library location and binds inside [`PdfBackend::with_document`],
//! which always runs on a `spawn_blocking` thread.
//!
//! ## Library lookup
//!
//! 1. `lib_path` from the config (a library file, or a directory holding the
//!    platform library name)
//! 2. `PDFIUM_LIB_PATH` environment variable
//! 3. the system library search path
//! 4. the current working directory

use super::{PdfBackend, PdfDocumentView, TextRun};
use crate::config::ConversionConfig;
use crate::error::Pdf2CsvError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// PDF engine backed by the pdfium shared library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumBackend {
    lib_path: Option<PathBuf>,
}

impl PdfiumBackend {
    /// Create a backend and check once that the library can be bound.
    pub fn new(lib_path: Option<PathBuf>) -> Result<Self, Pdf2CsvError> {
        let backend = Self { lib_path };
        backend.bind()?;
        Ok(backend)
    }

    pub fn from_config(config: &ConversionConfig) -> Result<Self, Pdf2CsvError> {
        Self::new(config.pdfium_lib_path.clone())
    }

    fn bind(&self) -> Result<Pdfium, Pdf2CsvError> {
        let explicit = self
            .lib_path
            .clone()
            .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

        let bindings = match explicit {
            Some(path) => {
                let library = if path.is_dir() {
                    Pdfium::pdfium_platform_library_name_at_path(&path)
                } else {
                    path
                };
                Pdfium::bind_to_library(&library).map_err(|e| {
                    Pdf2CsvError::PdfiumBindingFailed(format!("{}: {}", library.display(), e))
                })?
            }
            None => Pdfium::bind_to_system_library()
                .or_else(|_| {
                    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                })
                .map_err(|e| Pdf2CsvError::PdfiumBindingFailed(e.to_string()))?,
        };

        Ok(Pdfium::new(bindings))
    }
}

impl PdfBackend for PdfiumBackend {
    fn name(&self) -> &'static str {
        "pdfium"
    }

    fn with_document(
        &self,
        path: &Path,
        password: Option<&str>,
        visit: &mut dyn FnMut(&dyn PdfDocumentView) -> Result<(), Pdf2CsvError>,
    ) -> Result<(), Pdf2CsvError> {
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_file(path, password)
            .map_err(|e| load_error(path, password, e))?;

        let view = PdfiumDocument { document };
        info!("PDF loaded: {} pages", view.page_count());
        visit(&view)
    }
}

fn load_error(path: &Path, password: Option<&str>, e: PdfiumError) -> Pdf2CsvError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            Pdf2CsvError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            Pdf2CsvError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        Pdf2CsvError::CorruptPdf {
            path: path.to_path_buf(),
            detail: err_str,
        }
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumDocument<'a> {
    fn page(&self, index: usize) -> Result<PdfPage<'a>, PdfiumError> {
        self.document.pages().get(index as PdfPageIndex)
    }

    /// Run `read` against the text layer of a page.
    fn with_text<T>(
        &self,
        index: usize,
        read: impl FnOnce(&PdfPageText) -> T,
    ) -> Result<T, Pdf2CsvError> {
        let text_error = |e: PdfiumError| Pdf2CsvError::TextExtractionFailed {
            page: index + 1,
            detail: format!("{:?}", e),
        };
        let page = self.page(index).map_err(text_error)?;
        let text = page.text().map_err(text_error)?;
        Ok(read(&text))
    }
}

impl PdfDocumentView for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_text(&self, index: usize) -> Result<String, Pdf2CsvError> {
        self.with_text(index, |text| text.all())
    }

    fn text_runs(&self, index: usize) -> Result<Vec<TextRun>, Pdf2CsvError> {
        let runs = self.with_text(index, |text| {
            text.segments()
                .iter()
                .map(|segment| {
                    let bounds = segment.bounds();
                    TextRun::new(
                        segment.text(),
                        bounds.left().value,
                        bounds.bottom().value,
                        bounds.right().value,
                        bounds.top().value,
                    )
                })
                .collect::<Vec<_>>()
        })?;
        debug!("Page {}: {} text segments", index + 1, runs.len());
        Ok(runs)
    }

    fn render_page(
        &self,
        index: usize,
        dpi: u32,
        max_pixels: u32,
    ) -> Result<DynamicImage, Pdf2CsvError> {
        let render_error = |e: PdfiumError| Pdf2CsvError::RasterisationFailed {
            page: index + 1,
            detail: format!("{:?}", e),
        };
        let page = self.page(index).map_err(render_error)?;

        let max_pixels = i32::try_from(max_pixels).unwrap_or(i32::MAX);
        let target_width = ((page.width().value / 72.0) * dpi as f32).round().max(1.0) as i32;
        let render_config = PdfRenderConfig::new()
            .set_target_width(target_width)
            .set_maximum_width(max_pixels)
            .set_maximum_height(max_pixels);

        let bitmap = page.render_with_config(&render_config).map_err(render_error)?;
        let image = bitmap.as_image();
        debug!(
            "Rendered page {} at {} dpi → {}x{} px",
            index + 1,
            dpi,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}
