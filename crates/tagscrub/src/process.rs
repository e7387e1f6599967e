//! Sheet-by-sheet orchestration
//!
//! # Example
//!
//! ```rust
//! use tagscrub::{ScrubConfig, Workbook, WorkbookScrubExt};
//!
//! let mut workbook = Workbook::empty();
//! let idx = workbook.add_worksheet_with_name("Sheet1").unwrap();
//! let sheet = workbook.worksheet_mut(idx).unwrap();
//! sheet.set_value("H1", "Başvuru İçeriği").unwrap();
//! sheet.set_value("H2", "<p>Merhaba&nbsp;Dünya</p>").unwrap();
//!
//! let report = workbook.scrub(&ScrubConfig::default());
//! assert_eq!(report.cells_cleaned, 1);
//! ```

use tagscrub_core::{CellAddress, Workbook, Worksheet};

use crate::columns::{resolve_columns, ResolvedColumns};
use crate::config::ScrubConfig;
use crate::sanitize::{clean_text, extract_text, write_text};

/// Outcome for one worksheet
#[derive(Debug, Clone, PartialEq)]
pub struct SheetReport {
    pub name: String,
    pub columns: ResolvedColumns,
    /// Non-empty rows below the header row
    pub rows_visited: usize,
    pub cells_cleaned: usize,
}

/// Outcome of a scrub run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrubReport {
    /// Cells whose text changed, over all sheets
    pub cells_cleaned: usize,
    pub sheets: Vec<SheetReport>,
}

/// Extension trait for Workbook to add the scrub pass
pub trait WorkbookScrubExt {
    /// Clean the target columns of every worksheet in place
    fn scrub(&mut self, config: &ScrubConfig) -> ScrubReport;
}

impl WorkbookScrubExt for Workbook {
    fn scrub(&mut self, config: &ScrubConfig) -> ScrubReport {
        let mut report = ScrubReport::default();
        for sheet in self.worksheets_mut() {
            let sheet_report = scrub_worksheet(sheet, config);
            report.cells_cleaned += sheet_report.cells_cleaned;
            report.sheets.push(sheet_report);
        }
        log::debug!(
            "cleaned {} cells in {} sheets",
            report.cells_cleaned,
            report.sheets.len()
        );
        report
    }
}

/// Consume a workbook and hand it back cleaned, together with the report
pub fn process_workbook(mut workbook: Workbook, config: &ScrubConfig) -> (Workbook, ScrubReport) {
    let report = workbook.scrub(config);
    (workbook, report)
}

/// Clean one worksheet. Columns are resolved from this sheet's own header
/// row; nothing carries over between sheets.
pub fn scrub_worksheet(sheet: &mut Worksheet, config: &ScrubConfig) -> SheetReport {
    let columns = resolve_columns(sheet, &config.columns);
    let header_row = config.columns.header_row.saturating_sub(1);

    let rows: Vec<u32> = sheet
        .row_indices()
        .filter(|&row| row > header_row)
        .collect();

    let mut cells_cleaned = 0;
    for &row in &rows {
        // Both targets are visited even when they resolve to the same column
        for column in columns.targets() {
            let Some(col) = column.to_zero_based() else {
                continue;
            };
            if scrub_cell(sheet, row, col) {
                cells_cleaned += 1;
            }
        }
    }

    log::debug!(
        "sheet '{}': {} rows visited, {} cells cleaned",
        sheet.name(),
        rows.len(),
        cells_cleaned
    );
    SheetReport {
        name: sheet.name().to_string(),
        columns,
        rows_visited: rows.len(),
        cells_cleaned,
    }
}

/// Returns true when the cell was rewritten
fn scrub_cell(sheet: &mut Worksheet, row: u32, col: u16) -> bool {
    let cleaned = {
        let Some(text) = sheet.value_at(row, col).and_then(extract_text) else {
            return false;
        };
        let cleaned = clean_text(&text);
        if cleaned == text {
            return false;
        }
        log::trace!(
            "{}!{}: {:?} -> {:?}",
            sheet.name(),
            CellAddress::new(row, col),
            text,
            cleaned
        );
        cleaned
    };

    match sheet.value_at_mut(row, col) {
        Some(value) => {
            write_text(value, cleaned);
            true
        }
        None => false,
    }
}
