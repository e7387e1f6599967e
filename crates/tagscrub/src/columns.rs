//! Locating the two target columns from a worksheet's header row

use std::fmt;

use tagscrub_core::{CellAddress, CellValue, Worksheet, MAX_COLS};

use crate::config::ColumnRules;

/// 1-based column number, as a user reads it off the sheet (`8` is `H`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct ColumnIndex(u32);

impl ColumnIndex {
    pub const fn new(one_based: u32) -> Self {
        ColumnIndex(one_based)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// 0-based column for the cell model, `None` when outside the sheet
    pub fn to_zero_based(self) -> Option<u16> {
        self.0
            .checked_sub(1)
            .filter(|&c| c < u32::from(MAX_COLS))
            .and_then(|c| u16::try_from(c).ok())
    }

    /// Column letters, e.g. `H`
    pub fn letters(self) -> String {
        self.to_zero_based()
            .map(CellAddress::column_to_letters)
            .unwrap_or_else(|| "?".to_string())
    }
}

impl fmt::Display for ColumnIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.letters())
    }
}

/// Where a resolved column came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOrigin {
    /// A header cell matched
    Header,
    /// No header matched; the positional default was used
    Fallback,
}

impl fmt::Display for ColumnOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColumnOrigin::Header => "header",
            ColumnOrigin::Fallback => "fallback",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub index: ColumnIndex,
    pub origin: ColumnOrigin,
}

/// The two columns the sanitizer visits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    /// "Başvuru İçeriği"
    pub application: ResolvedColumn,
    /// "Metin"
    pub text: ResolvedColumn,
}

impl ResolvedColumns {
    /// Application column first, then text column. Both are returned even
    /// when they are the same column.
    pub fn targets(&self) -> [ColumnIndex; 2] {
        [self.application.index, self.text.index]
    }
}

/// Header text as compared against the rules: display form, trimmed
pub fn header_text(value: &CellValue) -> String {
    value.to_string().trim().to_string()
}

/// Scan the header row and pick the target columns.
///
/// Never fails: a missing header row or unmatched header falls back to the
/// configured positional defaults. When several headers match the same
/// target the right-most one wins.
pub fn resolve_columns(sheet: &Worksheet, rules: &ColumnRules) -> ResolvedColumns {
    let mut application = None;
    let mut text = None;

    if let Some(header_row) = rules.header_row.checked_sub(1) {
        for number in 1..=rules.scan_last_column {
            let column = ColumnIndex::new(number);
            let Some(col) = column.to_zero_based() else {
                break;
            };
            let Some(value) = sheet.value_at(header_row, col) else {
                continue;
            };
            let header = header_text(value);
            if header.is_empty() {
                continue;
            }

            if rules.is_application_header(&header) {
                application = Some(column);
            } else if rules.is_text_header(&header) {
                text = Some(column);
            }
        }
    }

    let resolved = ResolvedColumns {
        application: pick(application, rules.application_fallback),
        text: pick(text, rules.text_fallback),
    };
    log::debug!(
        "sheet '{}': application column {} ({}), text column {} ({})",
        sheet.name(),
        resolved.application.index,
        resolved.application.origin,
        resolved.text.index,
        resolved.text.origin
    );
    resolved
}

fn pick(found: Option<ColumnIndex>, fallback: ColumnIndex) -> ResolvedColumn {
    match found {
        Some(index) => ResolvedColumn {
            index,
            origin: ColumnOrigin::Header,
        },
        None => ResolvedColumn {
            index: fallback,
            origin: ColumnOrigin::Fallback,
        },
    }
}
