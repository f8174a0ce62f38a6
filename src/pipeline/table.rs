//! Table detection over positioned text runs.
//!
//! pdfium reports where text sits on the page, not which text forms a table.
//! The detector works in three passes:
//!
//! 1. **Lines**: runs whose vertical centres lie within
//!    [`TableSettings::row_tolerance`] of a line's first run join that line.
//!    Lines are ordered top to bottom (PDF y grows upwards).
//! 2. **Cells**: within a line, runs are ordered left to right and a gap
//!    wider than [`TableSettings::column_gap`] starts a new cell.
//! 3. **Tables**: a maximal stack of consecutive lines with at least
//!    [`TableSettings::min_columns`] cells, no more than
//!    [`TableSettings::max_row_gap`] apart, and at least
//!    [`TableSettings::min_rows`] tall.
//!
//! Columns are positional: the n-th cell of a row is column n. Rows keep
//! their own width here; the CSV writer fills them out to the header.

use super::{PdfDocumentView, TextRun};
use crate::config::TableSettings;
use crate::error::Pdf2CsvError;
use crate::output::Row;
use tracing::{debug, info};

/// One detected table: rows top to bottom, cells left to right.
pub type Table = Vec<Row>;

/// Runs closer than this are glued without a separating space.
const GLUE_GAP: f32 = 0.5;

/// Collect every detected table row of every page, in page order then table order.
///
/// Returns an empty vector when no page contains a table.
pub fn extract_rows(
    document: &dyn PdfDocumentView,
    settings: &TableSettings,
) -> Result<Vec<Row>, Pdf2CsvError> {
    let mut rows = Vec::new();
    for index in 0..document.page_count() {
        let runs = document.text_runs(index)?;
        let tables = detect_tables(&runs, settings);
        debug!(
            "Page {}: {} text runs, {} tables",
            index + 1,
            runs.len(),
            tables.len()
        );
        rows.extend(tables.into_iter().flatten());
    }
    info!(
        "Table extraction: {} rows from {} pages",
        rows.len(),
        document.page_count()
    );
    Ok(rows)
}

/// Detect tables on one page.
pub fn detect_tables(runs: &[TextRun], settings: &TableSettings) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut current: Table = Vec::new();
    let mut previous_bottom: Option<f32> = None;

    for line in group_lines(runs, settings.row_tolerance) {
        let cells = line.cells(settings.column_gap);
        let is_row = cells.len() >= settings.min_columns;
        let close_enough =
            previous_bottom.map_or(true, |bottom| bottom - line.top <= settings.max_row_gap);

        if !(is_row && close_enough) {
            flush(&mut current, &mut tables, settings.min_rows);
        }
        if is_row {
            current.push(cells);
        }
        previous_bottom = Some(line.bottom);
    }
    flush(&mut current, &mut tables, settings.min_rows);

    tables
}

fn flush(current: &mut Table, tables: &mut Vec<Table>, min_rows: usize) {
    let block = std::mem::take(current);
    if block.len() >= min_rows {
        tables.push(block);
    }
}

struct Line<'a> {
    anchor: f32,
    top: f32,
    bottom: f32,
    runs: Vec<&'a TextRun>,
}

impl<'a> Line<'a> {
    fn start(run: &'a TextRun) -> Self {
        Self {
            anchor: run.center_y(),
            top: run.top,
            bottom: run.bottom,
            runs: vec![run],
        }
    }

    fn push(&mut self, run: &'a TextRun) {
        self.top = self.top.max(run.top);
        self.bottom = self.bottom.min(run.bottom);
        self.runs.push(run);
    }

    fn cells(&self, column_gap: f32) -> Row {
        let mut runs = self.runs.clone();
        runs.sort_by(|a, b| a.left.total_cmp(&b.left));

        let mut cells: Row = Vec::new();
        let mut cell_right = f32::NEG_INFINITY;
        for run in runs {
            let text = run.text.trim();
            let gap = run.left - cell_right;
            match cells.last_mut() {
                Some(cell) if gap <= column_gap => {
                    if gap > GLUE_GAP {
                        cell.push(' ');
                    }
                    cell.push_str(text);
                }
                _ => cells.push(text.to_string()),
            }
            cell_right = cell_right.max(run.right);
        }
        cells
    }
}

fn group_lines(runs: &[TextRun], tolerance: f32) -> Vec<Line<'_>> {
    let mut sorted: Vec<&TextRun> = runs.iter().filter(|r| !r.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| {
        b.center_y()
            .total_cmp(&a.center_y())
            .then(a.left.total_cmp(&b.left))
    });

    let mut lines: Vec<Line<'_>> = Vec::new();
    for run in sorted {
        match lines.last_mut() {
            Some(line) if (line.anchor - run.center_y()).abs() <= tolerance => line.push(run),
            _ => lines.push(Line::start(run)),
        }
    }
    lines
}
