//! Conversion entry points: upload → validated scratch file → CSV artifact.
//!
//! A [`Converter`] owns the PDF and OCR backends plus the scratch directory.
//! Every request gets a fresh UUID; the input copy, page images and the CSV
//! artifact are all named after it. The PDF work runs on a blocking thread
//! because pdfium is CPU-bound and not async-safe.
//!
//! ```text
//! validate ─▶ persist <uuid>-input.pdf ─▶ spawn_blocking {
//!     open ─▶ classify ─┬─▶ table rows ─┬─▶ <uuid>.csv
//!                       └─▶ OCR pages ──┘
//! } ─▶ input removed (guard dropped) ─▶ Conversion
//! ```

use crate::config::ConversionConfig;
use crate::error::Pdf2CsvError;
use crate::output::{Conversion, ConversionStats, CsvArtifact, ExtractionMode, ExtractionResult};
use crate::pipeline::input::{self, Upload};
use crate::pipeline::ocr::TesseractBackend;
use crate::pipeline::pdfium::PdfiumBackend;
use crate::pipeline::scratch::{ScratchFile, ScratchSpace};
use crate::pipeline::{classify, ocr, table, write};
use crate::pipeline::{OcrBackend, PdfBackend, PdfDocumentView};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Runs conversions against a fixed pair of backends and a scratch directory.
///
/// Cheap to share: wrap it in an `Arc` and call it from any number of tasks.
/// With [`PdfiumBackend`], pdfium calls from all tasks are serialised by a
/// process-wide lock held while a document is open. Documents are only kept
/// open for classification, table extraction and page rasterisation; OCR
/// and CSV writing run concurrently.
pub struct Converter {
    pdf: Arc<dyn PdfBackend>,
    ocr: Arc<dyn OcrBackend>,
    config: ConversionConfig,
    scratch: ScratchSpace,
}

/// What the blocking stage found, before stats are attached.
struct Extraction {
    total_pages: usize,
    mode: ExtractionMode,
    result: Option<ExtractionResult>,
}

impl Converter {
    pub fn new(
        pdf: Arc<dyn PdfBackend>,
        ocr: Arc<dyn OcrBackend>,
        config: ConversionConfig,
    ) -> Self {
        let scratch = ScratchSpace::new(&config.scratch_dir);
        Self {
            pdf,
            ocr,
            config,
            scratch,
        }
    }

    /// Build a converter with pdfium and tesseract.
    ///
    /// Fails when the pdfium library cannot be bound. A missing tesseract
    /// binary only surfaces when a scanned document arrives; check
    /// [`Converter::ocr_available`] to warn earlier.
    pub fn from_config(config: ConversionConfig) -> Result<Self, Pdf2CsvError> {
        let pdf = PdfiumBackend::from_config(&config)?;
        let ocr = TesseractBackend::from_config(&config);
        let converter = Self::new(Arc::new(pdf), Arc::new(ocr), config);
        converter.scratch.ensure()?;
        Ok(converter)
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn scratch(&self) -> &ScratchSpace {
        &self.scratch
    }

    pub fn ocr_available(&self) -> bool {
        self.ocr.is_available()
    }

    /// Convert an uploaded PDF into a CSV artifact in the scratch directory.
    ///
    /// # Returns
    /// - `Conversion::Csv` with the artifact path and `<filename>.csv` as
    ///   the download name
    /// - `Conversion::NoData` when the document has text but no table rows
    ///
    /// # Errors
    /// Validation errors are returned before anything is written. Every
    /// other error is returned after the persisted input has been removed.
    pub async fn convert_upload(&self, upload: Upload) -> Result<Conversion, Pdf2CsvError> {
        let start = Instant::now();
        upload.validate()?;

        let request = Uuid::new_v4();
        info!(
            "Request {}: received '{}' ({} bytes)",
            request,
            upload.filename,
            upload.bytes.len()
        );

        let input = self.scratch.persist(request, "input.pdf", &upload.bytes).await?;
        let input_path = input.path().to_path_buf();
        let artifact_path = self.scratch.artifact_path(request);

        let extraction = self
            .run_blocking(request, input_path, Some(input), artifact_path.clone())
            .await?;

        let conversion = finish(
            extraction,
            artifact_path,
            input::download_name(&upload.filename),
            start,
        );
        log_outcome(request, &conversion);
        Ok(conversion)
    }

    /// Convert a local PDF and write the CSV to `output_path`.
    ///
    /// The input file is left untouched. Page images still go through the
    /// scratch directory.
    pub async fn convert_file(
        &self,
        input_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
    ) -> Result<Conversion, Pdf2CsvError> {
        let start = Instant::now();
        let input_path = input::resolve_local(input_path)?;
        let output_path = output_path.as_ref().to_path_buf();
        let request = Uuid::new_v4();
        info!("Request {}: converting {}", request, input_path.display());

        let extraction = self
            .run_blocking(request, input_path.clone(), None, output_path.clone())
            .await?;

        let download_name = input::download_name(&input_path.to_string_lossy());
        let conversion = finish(extraction, output_path, download_name, start);
        log_outcome(request, &conversion);
        Ok(conversion)
    }

    /// Extract and write on a blocking thread.
    ///
    /// `guard`, when present, is dropped on that thread once the document is
    /// closed, so the input copy outlives every reader.
    async fn run_blocking(
        &self,
        request: Uuid,
        input_path: PathBuf,
        guard: Option<ScratchFile>,
        output_path: PathBuf,
    ) -> Result<Extraction, Pdf2CsvError> {
        let pdf = Arc::clone(&self.pdf);
        let ocr = Arc::clone(&self.ocr);
        let scratch = self.scratch.clone();
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || -> Result<Extraction, Pdf2CsvError> {
            let _guard = guard;
            let extraction = extract(
                pdf.as_ref(),
                ocr.as_ref(),
                &scratch,
                request,
                &config,
                &input_path,
            )?;
            if let Some(result) = &extraction.result {
                write::write_csv(result, &output_path)?;
            }
            Ok(extraction)
        })
        .await
        .map_err(|e| Pdf2CsvError::Internal(format!("Conversion task panicked: {}", e)))?
    }
}

/// Classify the document and run exactly one extractor.
///
/// Classification and table extraction share one document session. OCR
/// runs after that session is closed and reopens the document per page
/// only to rasterise it, so the OCR engine never holds the pdfium lock.
fn extract(
    pdf_backend: &dyn PdfBackend,
    ocr_backend: &dyn OcrBackend,
    scratch: &ScratchSpace,
    request: Uuid,
    config: &ConversionConfig,
    input_path: &Path,
) -> Result<Extraction, Pdf2CsvError> {
    let mut extraction = None;

    pdf_backend.with_document(
        input_path,
        config.password.as_deref(),
        &mut |document: &dyn PdfDocumentView| -> Result<(), Pdf2CsvError> {
            let total_pages = document.page_count();
            let found = if classify::has_text_layer(document)? {
                debug!("Request {}: text layer found, extracting tables", request);
                let rows = table::extract_rows(document, &config.table)?;
                Extraction {
                    total_pages,
                    mode: ExtractionMode::Table,
                    result: (!rows.is_empty()).then_some(ExtractionResult::Table(rows)),
                }
            } else {
                Extraction {
                    total_pages,
                    mode: ExtractionMode::Ocr,
                    result: None,
                }
            };
            extraction = Some(found);
            Ok(())
        },
    )?;

    let mut extraction = extraction.ok_or_else(|| {
        Pdf2CsvError::Internal(format!(
            "{} backend returned without opening the document",
            pdf_backend.name()
        ))
    })?;

    if extraction.mode == ExtractionMode::Ocr {
        debug!("Request {}: no text layer, running OCR", request);
        let texts = ocr::extract_text(
            pdf_backend,
            input_path,
            extraction.total_pages,
            ocr_backend,
            scratch,
            request,
            config,
        )?;
        extraction.result = Some(ExtractionResult::Ocr(texts));
    }
    Ok(extraction)
}

fn finish(
    extraction: Extraction,
    path: PathBuf,
    download_name: String,
    start: Instant,
) -> Conversion {
    let mut stats = ConversionStats {
        total_pages: extraction.total_pages,
        mode: extraction.mode,
        rows_written: 0,
        total_duration_ms: start.elapsed().as_millis() as u64,
    };
    match extraction.result {
        Some(result) => {
            stats.rows_written = result.record_count();
            Conversion::Csv(CsvArtifact {
                path,
                download_name,
                stats,
            })
        }
        None => Conversion::NoData { stats },
    }
}

fn log_outcome(request: Uuid, conversion: &Conversion) {
    let stats = conversion.stats();
    match conversion {
        Conversion::Csv(artifact) => info!(
            "Request {}: {} pages via {} → {} records in {} ({}ms)",
            request,
            stats.total_pages,
            stats.mode,
            stats.rows_written,
            artifact.path.display(),
            stats.total_duration_ms
        ),
        Conversion::NoData { .. } => info!(
            "Request {}: {} pages, text layer but no table rows ({}ms)",
            request, stats.total_pages, stats.total_duration_ms
        ),
    }
}
