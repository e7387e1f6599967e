//! # tagscrub-core
//!
//! Workbook object model shared by the tagscrub crates.
//!
//! - [`Workbook`], [`Worksheet`] - the document and its sparse cell grid
//! - [`CellValue`] - plain strings, [`RichText`], [`Hyperlink`] text and the
//!   non-text kinds (numbers, booleans, errors, formulas)
//! - [`CellAddress`] and [`CellRange`] - A1-style addressing
//!
//! ## Example
//!
//! ```rust
//! use tagscrub_core::{CellValue, Workbook};
//!
//! let mut workbook = Workbook::empty();
//! let idx = workbook.add_worksheet_with_name("Sheet1").unwrap();
//! let sheet = workbook.worksheet_mut(idx).unwrap();
//!
//! sheet.set_value("A1", "Metin").unwrap();
//! sheet.set_value_at(1, 0, CellValue::Number(3.5)).unwrap();
//! assert!(sheet.is_edited(0, 0));
//! ```

pub mod cell;
pub mod error;
pub mod workbook;
pub mod worksheet;

pub use cell::{
    CellAddress, CellData, CellError, CellRange, CellValue, Hyperlink, HyperlinkTarget, RichText,
    RunFormat, SharedString, TextRun,
};
pub use error::{Error, Result};
pub use workbook::Workbook;
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name, in characters
pub const MAX_SHEET_NAME_LEN: usize = 31;
