//! Result types produced by the conversion pipeline.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// One extracted row: ordered cells, column count may vary between rows.
pub type Row = Vec<String>;

/// Which extraction path handled a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Text layer present: rows came from table detection.
    Table,
    /// No text layer: one OCR text blob per page.
    Ocr,
}

impl ExtractionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionMode::Table => "table",
            ExtractionMode::Ocr => "ocr",
        }
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data recovered from a document, in exactly one of two shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    /// Table rows in page order, then table order, then row order.
    Table(Vec<Row>),
    /// OCR text, one entry per page, in page order.
    Ocr(Vec<String>),
}

impl ExtractionResult {
    pub fn mode(&self) -> ExtractionMode {
        match self {
            ExtractionResult::Table(_) => ExtractionMode::Table,
            ExtractionResult::Ocr(_) => ExtractionMode::Ocr,
        }
    }

    /// Number of data records the CSV will contain (header excluded).
    pub fn record_count(&self) -> usize {
        match self {
            ExtractionResult::Table(rows) => rows.len(),
            ExtractionResult::Ocr(pages) => pages.len(),
        }
    }
}

/// Summary of one conversion run.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionStats {
    /// Pages in the source document.
    pub total_pages: usize,
    /// Path taken after classification.
    pub mode: ExtractionMode,
    /// Data records written (header excluded). Zero for a no-data outcome.
    pub rows_written: usize,
    /// Wall-clock time from persisting the input to writing the CSV.
    pub total_duration_ms: u64,
}

/// A CSV file produced by a successful conversion.
#[derive(Debug, Clone)]
pub struct CsvArtifact {
    /// Location of the CSV on disk.
    pub path: PathBuf,
    /// Name offered to the client: `<original filename>.csv`.
    pub download_name: String,
    pub stats: ConversionStats,
}

/// Outcome of a conversion that did not fail.
#[derive(Debug, Clone)]
pub enum Conversion {
    /// A CSV artifact was written.
    Csv(CsvArtifact),
    /// The document has a text layer but no detectable table rows.
    NoData { stats: ConversionStats },
}

impl Conversion {
    pub fn stats(&self) -> &ConversionStats {
        match self {
            Conversion::Csv(artifact) => &artifact.stats,
            Conversion::NoData { stats } => stats,
        }
    }
}
