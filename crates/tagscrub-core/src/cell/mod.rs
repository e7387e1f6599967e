//! Cell-related types
//!
//! - [`CellValue`] - the value stored in a cell, including the text-bearing
//!   variants ([`RichText`], [`Hyperlink`])
//! - [`CellAddress`] / [`CellRange`] - A1-style locations
//! - [`CellData`] - value plus style index

mod address;
mod data;
mod rich_text;
mod value;

pub use address::{CellAddress, CellRange};
pub use data::CellData;
pub use rich_text::{RichText, RunFormat, TextRun};
pub use value::{CellError, CellValue, Hyperlink, HyperlinkTarget, SharedString};
