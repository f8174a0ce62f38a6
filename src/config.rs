//! Configuration types for PDF-to-CSV conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Table-detection tolerances live in the
//! nested [`TableSettings`].

use crate::error::Pdf2CsvError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const MIN_RENDERED_PIXELS: u32 = 100;
const MAX_RENDERED_PIXELS: u32 = 20_000;

/// Configuration for a PDF-to-CSV conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdf2csv::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .scratch_dir("/var/tmp/pdf2csv")
///     .dpi(300)
///     .ocr_language("deu")
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 300);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Directory holding uploaded inputs, page images and CSV artifacts.
    /// Default: `$TMPDIR/pdf2csv`.
    pub scratch_dir: PathBuf,

    /// Rasterisation DPI for OCR pages. Range: 72–600. Default: 200.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels.
    /// Range: 100–20000. Default: 4000.
    ///
    /// Caps either dimension independently of DPI; oversized pages are scaled
    /// down proportionally.
    pub max_rendered_pixels: u32,

    /// Tesseract language pack(s), e.g. `"eng"` or `"eng+deu"`. Default: `"eng"`.
    pub ocr_language: String,

    /// Tesseract executable. Default: `"tesseract"` (resolved via `PATH`).
    pub tesseract_path: PathBuf,

    /// Explicit pdfium library file or directory. If None, the system
    /// library search path is used.
    pub pdfium_lib_path: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Table-detection tolerances.
    pub table: TableSettings,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir().join("pdf2csv"),
            dpi: 200,
            max_rendered_pixels: 4000,
            ocr_language: "eng".to_string(),
            tesseract_path: PathBuf::from("tesseract"),
            pdfium_lib_path: None,
            password: None,
            table: TableSettings::default(),
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = dir.into();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    /// Clamped to 100–20000 px per side.
    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.clamp(MIN_RENDERED_PIXELS, MAX_RENDERED_PIXELS);
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn tesseract_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tesseract_path = path.into();
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn table(mut self, settings: TableSettings) -> Self {
        self.config.table = settings;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2CsvError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(Pdf2CsvError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.ocr_language.trim().is_empty() {
            return Err(Pdf2CsvError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if c.scratch_dir.as_os_str().is_empty() {
            return Err(Pdf2CsvError::InvalidConfig(
                "Scratch directory must not be empty".into(),
            ));
        }
        c.table.validate()?;
        Ok(self.config)
    }
}

/// Tolerances for the text-run table detector, in PDF points (1/72 inch).
///
/// Named after the pdfplumber `table_settings` keys they approximate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableSettings {
    /// Runs whose vertical centres differ by at most this much share a line. Default: 3.0.
    pub row_tolerance: f32,

    /// A horizontal gap wider than this starts a new cell. Default: 12.0.
    pub column_gap: f32,

    /// A vertical gap between consecutive lines wider than this ends a table. Default: 24.0.
    pub max_row_gap: f32,

    /// Minimum cells on a line for it to count as a table row. Default: 2.
    pub min_columns: usize,

    /// Minimum consecutive rows for a block to count as a table. Default: 2.
    pub min_rows: usize,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            row_tolerance: 3.0,
            column_gap: 12.0,
            max_row_gap: 24.0,
            min_columns: 2,
            min_rows: 2,
        }
    }
}

impl TableSettings {
    fn validate(&self) -> Result<(), Pdf2CsvError> {
        let finite_positive = |v: f32| v.is_finite() && v > 0.0;
        if !finite_positive(self.row_tolerance)
            || !finite_positive(self.column_gap)
            || !finite_positive(self.max_row_gap)
        {
            return Err(Pdf2CsvError::InvalidConfig(
                "Table tolerances must be positive finite numbers".into(),
            ));
        }
        if self.min_columns < 2 || self.min_rows < 1 {
            return Err(Pdf2CsvError::InvalidConfig(format!(
                "Tables need ≥ 2 columns and ≥ 1 row, got {} columns / {} rows",
                self.min_columns, self.min_rows
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ConversionConfig::builder().build().unwrap();
        assert_eq!(config.dpi, 200);
        assert_eq!(config.ocr_language, "eng");
        assert!(config.scratch_dir.ends_with("pdf2csv"));
    }

    #[test]
    fn dpi_is_clamped() {
        let config = ConversionConfig::builder().dpi(10).build().unwrap();
        assert_eq!(config.dpi, 72);
        let config = ConversionConfig::builder().dpi(5000).build().unwrap();
        assert_eq!(config.dpi, 600);
    }

    #[test]
    fn rendered_pixels_are_clamped() {
        let config = ConversionConfig::builder()
            .max_rendered_pixels(u32::MAX)
            .build()
            .unwrap();
        assert_eq!(config.max_rendered_pixels, 20_000);
        let config = ConversionConfig::builder()
            .max_rendered_pixels(1)
            .build()
            .unwrap();
        assert_eq!(config.max_rendered_pixels, 100);
    }

    #[test]
    fn empty_language_rejected() {
        let err = ConversionConfig::builder()
            .ocr_language("  ")
            .build()
            .unwrap_err();
        assert!(matches!(err, Pdf2CsvError::InvalidConfig(_)));
    }

    #[test]
    fn single_column_tables_rejected() {
        let err = ConversionConfig::builder()
            .table(TableSettings {
                min_columns: 1,
                ..TableSettings::default()
            })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("columns"));
    }

    #[test]
    fn nan_tolerance_rejected() {
        let err = ConversionConfig::builder()
            .table(TableSettings {
                column_gap: f32::NAN,
                ..TableSettings::default()
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, Pdf2CsvError::InvalidConfig(_)));
    }
}
