//! Text-layer detection: decides between table extraction and OCR.

use super::PdfDocumentView;
use crate::error::Pdf2CsvError;
use tracing::debug;

/// `true` if any page yields non-blank extractable text.
///
/// Stops at the first page with text. Errors from the PDF engine propagate
/// unchanged.
pub fn has_text_layer(document: &dyn PdfDocumentView) -> Result<bool, Pdf2CsvError> {
    for index in 0..document.page_count() {
        let text = document.page_text(index)?;
        if !text.trim().is_empty() {
            debug!("Page {} has a text layer", index + 1);
            return Ok(true);
        }
    }
    Ok(false)
}
