//! Input validation: uploaded files and local paths.
//!
//! Uploads are checked before anything touches the disk: the filename must
//! carry the `.pdf` extension, the body must be non-empty and must start with
//! the `%PDF` magic. Rejected uploads are never persisted.

use crate::error::Pdf2CsvError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A PDF received from a client, held in memory until validated.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-supplied filename. Used for validation and the download name only.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Run all upload checks.
    pub fn validate(&self) -> Result<(), Pdf2CsvError> {
        validate_upload(&self.filename, &self.bytes)
    }
}

/// `true` when `filename` ends with `.pdf` (ASCII case-insensitive).
pub fn has_pdf_extension(filename: &str) -> bool {
    let name = filename.trim();
    name.len() > 4
        && name
            .get(name.len() - 4..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".pdf"))
}

/// Validate an uploaded file before it is persisted.
pub fn validate_upload(filename: &str, bytes: &[u8]) -> Result<(), Pdf2CsvError> {
    if !has_pdf_extension(filename) {
        return Err(Pdf2CsvError::InvalidFileName {
            filename: filename.to_string(),
        });
    }
    if bytes.is_empty() {
        return Err(Pdf2CsvError::EmptyUpload {
            filename: filename.to_string(),
        });
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(Pdf2CsvError::NotAPdf {
            name: filename.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

/// Download name for the CSV produced from `filename`: `<basename>.csv`.
///
/// Directory components are stripped and control characters are replaced
/// with `_`. Non-ASCII characters are kept; see [`ascii_fallback`].
pub fn download_name(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();
    let cleaned = if cleaned.is_empty() {
        "document.pdf".to_string()
    } else {
        cleaned
    };
    format!("{cleaned}.csv")
}

/// `name` with every character that cannot appear in a quoted
/// `Content-Disposition` `filename=` replaced with `_`.
pub fn ascii_fallback(name: &str) -> String {
    name.chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Resolve a local file path, validating existence and PDF magic bytes.
pub fn resolve_local(path: impl AsRef<Path>) -> Result<PathBuf, Pdf2CsvError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(Pdf2CsvError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_err() || &magic != PDF_MAGIC {
                return Err(Pdf2CsvError::NotAPdf {
                    name: path.display().to_string(),
                    magic: magic.to_vec(),
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2CsvError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Pdf2CsvError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}
