//! Pipeline configuration
//!
//! Defaults match the layout of CİMER complaint exports. `ScrubConfig::default()`
//! is what the command-line tool runs with unless a JSON config file says
//! otherwise.

use crate::columns::ColumnIndex;

/// 1-based row holding the column headers
pub const HEADER_ROW: u32 = 1;

/// Headers are looked for in columns 1 through this one, inclusive
pub const SCAN_LAST_COLUMN: u32 = 20;

/// Both markers must appear in the application-content header
pub const APPLICATION_MARKER: &str = "Başvuru";
pub const CONTENT_MARKER: &str = "İçeriği";

/// Exact header of the text column
pub const TEXT_HEADER: &str = "Metin";

/// Column H
pub const APPLICATION_FALLBACK: ColumnIndex = ColumnIndex::new(8);

/// Column J
pub const TEXT_FALLBACK: ColumnIndex = ColumnIndex::new(10);

/// Appended to the input file stem to name the output
pub const OUTPUT_SUFFIX: &str = "_temizlenmis";

/// How the two target columns are found in a sheet's header row
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ColumnRules {
    pub header_row: u32,
    pub scan_last_column: u32,
    /// Substrings that must all occur in the application-content header
    pub application_markers: Vec<String>,
    /// Literal the text-column header must equal
    pub text_header: String,
    pub application_fallback: ColumnIndex,
    pub text_fallback: ColumnIndex,
}

impl Default for ColumnRules {
    fn default() -> Self {
        Self {
            header_row: HEADER_ROW,
            scan_last_column: SCAN_LAST_COLUMN,
            application_markers: vec![APPLICATION_MARKER.to_string(), CONTENT_MARKER.to_string()],
            text_header: TEXT_HEADER.to_string(),
            application_fallback: APPLICATION_FALLBACK,
            text_fallback: TEXT_FALLBACK,
        }
    }
}

impl ColumnRules {
    pub(crate) fn is_application_header(&self, header: &str) -> bool {
        !self.application_markers.is_empty()
            && self
                .application_markers
                .iter()
                .all(|marker| header.contains(marker.as_str()))
    }

    pub(crate) fn is_text_header(&self, header: &str) -> bool {
        header == self.text_header
    }
}

/// Options for a scrub run
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ScrubConfig {
    pub columns: ColumnRules,
    /// Suffix for [`crate::output_file_name`]
    pub output_suffix: String,
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            columns: ColumnRules::default(),
            output_suffix: OUTPUT_SUFFIX.to_string(),
        }
    }
}

#[cfg(feature = "serde")]
impl ScrubConfig {
    /// Parse a JSON config; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
