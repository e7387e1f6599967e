//! # tagscrub-xlsx
//!
//! XLSX (Office Open XML) package reader and in-place patching writer.
//!
//! [`XlsxReader`] loads a package into an [`XlsxDocument`]: a
//! [`tagscrub_core::Workbook`] plus the original bytes. After cells are
//! edited, [`XlsxWriter`] re-emits the package, rewriting only the worksheet
//! parts that hold edited cells and appending new text to the shared-string
//! table. Every other part is copied as-is.
//!
//! ```no_run
//! use tagscrub_xlsx::{XlsxReader, XlsxWriter};
//!
//! let mut doc = XlsxReader::read_file("input.xlsx")?;
//! if let Some(sheet) = doc.workbook_mut().worksheet_mut(0) {
//!     sheet.set_value("H2", "cleaned")?;
//! }
//! XlsxWriter::write_file(&doc, "output.xlsx")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod document;
pub mod error;
pub mod reader;
pub mod writer;

mod escape;
mod package;
#[cfg(test)]
mod test_util;

pub use document::XlsxDocument;
pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;
