//! A loaded XLSX package: the editable workbook model plus everything needed
//! to re-emit the original package around it.

use tagscrub_core::Workbook;

use crate::reader::strings::StringItem;

/// Workbook model bound to the package it was read from.
///
/// Edit the cells through [`XlsxDocument::workbook_mut`], then hand the
/// document to [`crate::XlsxWriter`]; only the cells recorded as edited are
/// rewritten, every other part of the package is copied as it was.
#[derive(Debug)]
pub struct XlsxDocument {
    pub(crate) workbook: Workbook,
    /// The package exactly as it was read
    pub(crate) source: Vec<u8>,
    /// Worksheet part path per sheet, index-aligned with the workbook
    pub(crate) sheet_parts: Vec<String>,
    pub(crate) shared_strings_part: Option<String>,
    pub(crate) shared_strings: Vec<StringItem>,
}

impl XlsxDocument {
    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    /// Package path of the worksheet at `index`
    pub fn sheet_part(&self, index: usize) -> Option<&str> {
        self.sheet_parts.get(index).map(String::as_str)
    }

    /// Package path of the shared-string table, if the package has one
    pub fn shared_strings_part(&self) -> Option<&str> {
        self.shared_strings_part.as_deref()
    }

    /// Number of entries in the original shared-string table
    pub fn shared_string_count(&self) -> usize {
        self.shared_strings.len()
    }

    /// Original package bytes
    pub fn source_bytes(&self) -> &[u8] {
        &self.source
    }
}
