//! # tagscrub
//!
//! Strips HTML markup and encoded entities from the two free-text columns of
//! Excel workbooks exported by the CİMER complaint system, and writes the
//! workbook back with nothing else changed.
//!
//! ## Pipeline
//!
//! For every worksheet:
//!
//! 1. [`resolve_columns`] finds the "Başvuru İçeriği" and "Metin" columns
//!    in the header row, falling back to H and J.
//! 2. Every non-empty row below the header is visited; each target cell's
//!    text ([`extract_text`]) is run through [`clean_text`] and written back
//!    with [`write_text`] when it changed.
//!
//! The XLSX side is handled by [`tagscrub_xlsx`]: only the cells that were
//! rewritten are patched into the package.
//!
//! ## Example
//!
//! ```no_run
//! use tagscrub::{output_file_name, scrub_bytes, ScrubConfig};
//!
//! let input = std::fs::read("başvurular.xlsx")?;
//! let config = ScrubConfig::default();
//! let output = scrub_bytes(Some(&input), &config)?;
//!
//! println!("{} cells cleaned", output.report.cells_cleaned);
//! std::fs::write(output_file_name("başvurular.xlsx", &config.output_suffix), output.bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod columns;
pub mod config;
pub mod error;
pub mod process;
pub mod sanitize;

pub use columns::{resolve_columns, ColumnIndex, ColumnOrigin, ResolvedColumn, ResolvedColumns};
pub use config::{ColumnRules, ScrubConfig};
pub use error::{ScrubError, ScrubResult};
pub use process::{process_workbook, scrub_worksheet, ScrubReport, SheetReport, WorkbookScrubExt};
pub use sanitize::{clean_text, extract_text, write_text};

// Re-export the model and I/O types callers need alongside the pipeline
pub use tagscrub_core::{CellValue, Workbook, Worksheet};
pub use tagscrub_xlsx::{XlsxDocument, XlsxError, XlsxReader, XlsxWriter};

/// Cleaned package plus what was done to it
#[derive(Debug, Clone)]
pub struct ScrubOutput {
    pub bytes: Vec<u8>,
    pub report: ScrubReport,
}

/// Scrub a loaded document in place
pub fn scrub_document(doc: &mut XlsxDocument, config: &ScrubConfig) -> ScrubReport {
    doc.workbook_mut().scrub(config)
}

/// Run the whole pipeline over an in-memory workbook file.
///
/// `None` stands for "no file chosen" and yields
/// [`ScrubError::NoFileSelected`]. Load and save failures carry the
/// package error unchanged. Nothing is returned on failure.
pub fn scrub_bytes(input: Option<&[u8]>, config: &ScrubConfig) -> ScrubResult<ScrubOutput> {
    let input = input.ok_or(ScrubError::NoFileSelected)?;

    let mut doc = XlsxReader::read_bytes(input.to_vec()).map_err(ScrubError::Load)?;
    let report = scrub_document(&mut doc, config);
    let bytes = XlsxWriter::write_to_vec(&doc).map_err(ScrubError::Serialize)?;

    Ok(ScrubOutput { bytes, report })
}

/// Name of the cleaned file: the input's extension (if any) is replaced by
/// `{suffix}.xlsx`, so `kayit.xls` becomes `kayit_temizlenmis.xlsx` with the
/// default suffix. Only the final path component is considered.
pub fn output_file_name(input_name: &str, suffix: &str) -> String {
    let (dir, file) = match input_name.rfind(['/', '\\']) {
        Some(pos) => input_name.split_at(pos + 1),
        None => ("", input_name),
    };
    let stem = match file.rfind('.') {
        Some(pos) if pos > 0 => &file[..pos],
        _ => file,
    };
    format!("{dir}{stem}{suffix}.xlsx")
}
