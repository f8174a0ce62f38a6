//! CSV encoding of an [`ExtractionResult`].
//!
//! Table results get a header of positional column labels (`0`, `1`, …)
//! spanning the widest row, followed by every row as a data record. Short
//! rows are filled with empty fields out to the header width. OCR results get a single `Extracted_Text` column
//! with one record per page.
//!
//! Files are written to `<path>.tmp` and renamed into place, so a reader
//! never observes a half-written CSV.

use crate::error::Pdf2CsvError;
use crate::output::{ExtractionResult, Row};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Header of the single OCR column.
pub const OCR_COLUMN: &str = "Extracted_Text";

/// Encode `result` as CSV bytes.
pub fn to_csv_bytes(result: &ExtractionResult) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    match result {
        ExtractionResult::Table(rows) => {
            let header = positional_header(rows);
            writer.write_record(&header)?;
            for row in rows {
                let padding = header.len() - row.len();
                writer.write_record(
                    row.iter()
                        .map(String::as_str)
                        .chain(std::iter::repeat("").take(padding)),
                )?;
            }
        }
        ExtractionResult::Ocr(pages) => {
            writer.write_record([OCR_COLUMN])?;
            for text in pages {
                writer.write_record([text])?;
            }
        }
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Write `result` as CSV to `path` atomically.
pub fn write_csv(result: &ExtractionResult, path: &Path) -> Result<(), Pdf2CsvError> {
    let bytes = to_csv_bytes(result).map_err(|source| Pdf2CsvError::CsvWriteFailed {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| Pdf2CsvError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let tmp_path = path.with_extension("csv.tmp");
    let write_tmp = || -> std::io::Result<()> {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()
    };
    if let Err(source) = write_tmp().and_then(|()| std::fs::rename(&tmp_path, path)) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(Pdf2CsvError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        });
    }

    debug!(
        "Wrote {} records ({} bytes) to {}",
        result.record_count(),
        bytes.len(),
        path.display()
    );
    Ok(())
}

fn positional_header(rows: &[Row]) -> Vec<String> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..width).map(|i| i.to_string()).collect()
}
