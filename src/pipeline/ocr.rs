//! OCR extraction for documents without a text layer.
//!
//! Pages are processed strictly one at a time: open the document, rasterise
//! the page, close the document, save it as PNG in the scratch directory,
//! recognise, delete. The document is only open while pdfium renders, so the
//! OCR engine never runs inside a pdfium session. At most one page image
//! exists on disk per request at any moment, and the [`ScratchFile`] guard
//! removes it even when rasterisation or OCR fails part-way.

use super::scratch::{ScratchFile, ScratchSpace};
use super::{OcrBackend, PdfBackend, PdfDocumentView};
use crate::config::ConversionConfig;
use crate::error::Pdf2CsvError;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Recognise the first `page_count` pages of the PDF at `input_path`,
/// returning one text blob per page.
///
/// Blank pages yield an empty string; they are never dropped.
pub fn extract_text(
    pdf: &dyn PdfBackend,
    input_path: &Path,
    page_count: usize,
    ocr: &dyn OcrBackend,
    scratch: &ScratchSpace,
    request: Uuid,
    config: &ConversionConfig,
) -> Result<Vec<String>, Pdf2CsvError> {
    let mut texts = Vec::with_capacity(page_count);

    for index in 0..page_count {
        let page_num = index + 1;
        let start = Instant::now();

        let image_file: ScratchFile = scratch.file(request, &format!("page-{page_num}.png"));
        let image = render_page(pdf, input_path, index, config)?;
        image
            .save_with_format(image_file.path(), image::ImageFormat::Png)
            .map_err(|e| Pdf2CsvError::RasterisationFailed {
                page: page_num,
                detail: format!("Could not save page image: {e}"),
            })?;

        let text = ocr.recognize(image_file.path(), page_num)?;
        drop(image_file);

        debug!(
            "OCR page {}/{}: {}x{} px → {} chars in {}ms",
            page_num,
            page_count,
            image.width(),
            image.height(),
            text.len(),
            start.elapsed().as_millis()
        );
        texts.push(text);
    }

    info!("OCR extraction: {} pages via {}", page_count, ocr.name());
    Ok(texts)
}

/// Open the document just long enough to rasterise one page.
fn render_page(
    pdf: &dyn PdfBackend,
    input_path: &Path,
    index: usize,
    config: &ConversionConfig,
) -> Result<DynamicImage, Pdf2CsvError> {
    let mut rendered = None;
    pdf.with_document(
        input_path,
        config.password.as_deref(),
        &mut |document: &dyn PdfDocumentView| -> Result<(), Pdf2CsvError> {
            rendered = Some(document.render_page(
                index,
                config.dpi,
                config.max_rendered_pixels,
            )?);
            Ok(())
        },
    )?;
    rendered.ok_or_else(|| {
        Pdf2CsvError::Internal(format!(
            "{} backend returned without opening the document",
            pdf.name()
        ))
    })
}

/// Tesseract OCR via its command-line binary.
#[derive(Debug, Clone)]
pub struct TesseractBackend {
    binary: PathBuf,
    language: String,
}

impl TesseractBackend {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(&config.tesseract_path, &config.ocr_language)
    }

    fn availability_hint(&self) -> String {
        format!(
            "'{}' not found (install tesseract-ocr and the '{}' language data)",
            self.binary.display(),
            self.language
        )
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    fn recognize(&self, image_path: &Path, page: usize) -> Result<String, Pdf2CsvError> {
        let output = Command::new(&self.binary)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Ok(clean_ocr_text(&String::from_utf8_lossy(&output.stdout)))
            }
            Ok(output) => Err(Pdf2CsvError::OcrFailed {
                page,
                detail: format!(
                    "tesseract exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Pdf2CsvError::OcrUnavailable {
                    engine: self.name().to_string(),
                    hint: self.availability_hint(),
                })
            }
            Err(e) => Err(Pdf2CsvError::OcrFailed {
                page,
                detail: e.to_string(),
            }),
        }
    }
}

/// Strip the trailing newlines and form feed tesseract appends to each page.
pub fn clean_ocr_text(raw: &str) -> String {
    raw.trim_end_matches(|c: char| c.is_whitespace() || c == '\u{c}')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fake::{FakeOcr, FakePage, FakePdfBackend};
    use std::sync::{Arc, Mutex};

    const INPUT: &str = "scan.pdf";

    fn run(
        pdf: &dyn PdfBackend,
        pages: usize,
        ocr: &dyn OcrBackend,
        scratch: &ScratchSpace,
        request: Uuid,
    ) -> Result<Vec<String>, Pdf2CsvError> {
        extract_text(
            pdf,
            Path::new(INPUT),
            pages,
            ocr,
            scratch,
            request,
            &ConversionConfig::default(),
        )
    }

    /// Records, for every recognised page, whether a document was open.
    struct SessionCheckingOcr {
        pdf: Arc<FakePdfBackend>,
        open_during_ocr: Mutex<Vec<bool>>,
    }

    impl OcrBackend for SessionCheckingOcr {
        fn name(&self) -> &'static str {
            "session-checking"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn recognize(&self, _image_path: &Path, _page: usize) -> Result<String, Pdf2CsvError> {
            self.open_during_ocr.lock().unwrap().push(self.pdf.is_open());
            Ok(String::new())
        }
    }

    fn png_count(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|x| x == "png"))
            .count()
    }

    #[test]
    fn one_blob_per_page_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::new(dir.path());
        let pdf = FakePdfBackend::new(vec![FakePage::scanned(); 3]);
        let ocr = FakeOcr::with_texts(&["first page", "", "third page"]);

        let texts = run(&pdf, 3, &ocr, &scratch, Uuid::new_v4()).unwrap();

        assert_eq!(texts, vec!["first page", "", "third page"]);
    }

    #[test]
    fn each_image_exists_during_ocr_and_is_removed_after() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::new(dir.path());
        let pdf = FakePdfBackend::new(vec![FakePage::scanned(); 2]);
        let ocr = FakeOcr::default();
        let request = Uuid::new_v4();

        run(&pdf, 2, &ocr, &scratch, request).unwrap();

        let seen = ocr.seen();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|(_, existed)| *existed));
        assert!(seen[0].0.to_string_lossy().contains(&request.to_string()));
        assert!(seen.iter().all(|(path, _)| !path.exists()));
        assert_eq!(png_count(dir.path()), 0);
    }

    #[test]
    fn ocr_failure_still_removes_image() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::new(dir.path());
        let pdf = FakePdfBackend::new(vec![FakePage::scanned(); 3]);
        let ocr = FakeOcr::failing_on(2);

        let err = run(&pdf, 3, &ocr, &scratch, Uuid::new_v4()).unwrap_err();

        assert!(matches!(err, Pdf2CsvError::OcrFailed { page: 2, .. }));
        assert_eq!(ocr.seen().len(), 2);
        assert_eq!(png_count(dir.path()), 0);
    }

    #[test]
    fn render_failure_stops_early() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::new(dir.path());
        let pdf = FakePdfBackend::new(vec![FakePage::scanned(), FakePage::unrenderable()]);
        let ocr = FakeOcr::default();

        let err = run(&pdf, 2, &ocr, &scratch, Uuid::new_v4()).unwrap_err();

        assert!(matches!(err, Pdf2CsvError::RasterisationFailed { page: 2, .. }));
        assert_eq!(ocr.seen().len(), 1);
        assert_eq!(png_count(dir.path()), 0);
    }

    #[test]
    fn document_is_closed_while_ocr_runs() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::new(dir.path());
        let pdf = Arc::new(FakePdfBackend::new(vec![FakePage::scanned(); 3]));
        let ocr = SessionCheckingOcr {
            pdf: Arc::clone(&pdf),
            open_during_ocr: Mutex::new(Vec::new()),
        };

        let texts = run(pdf.as_ref(), 3, &ocr, &scratch, Uuid::new_v4()).unwrap();

        assert_eq!(texts.len(), 3);
        assert_eq!(*ocr.open_during_ocr.lock().unwrap(), vec![false; 3]);
        assert_eq!(pdf.opened.lock().unwrap().len(), 3, "one session per page");
    }

    #[test]
    fn test_clean_ocr_text() {
        assert_eq!(clean_ocr_text("Hello\nWorld\n\u{c}"), "Hello\nWorld");
        assert_eq!(clean_ocr_text("\u{c}"), "");
        assert_eq!(clean_ocr_text("  indented\n"), "  indented");
    }

    #[test]
    fn missing_binary_is_unavailable() {
        let backend = TesseractBackend::new("/nonexistent/tesseract-binary", "eng");
        assert!(!backend.is_available());
        let err = backend
            .recognize(Path::new("/tmp/does-not-matter.png"), 1)
            .unwrap_err();
        assert!(matches!(err, Pdf2CsvError::OcrUnavailable { .. }));
    }
}
