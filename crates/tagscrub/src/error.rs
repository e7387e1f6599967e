//! Pipeline error types

use tagscrub_xlsx::XlsxError;
use thiserror::Error;

/// Result type for scrub operations
pub type ScrubResult<T> = std::result::Result<T, ScrubError>;

/// Why a scrub run produced no output
#[derive(Debug, Error)]
pub enum ScrubError {
    /// No input was supplied
    #[error("no file selected, please select a file")]
    NoFileSelected,

    /// The input could not be read as a workbook
    #[error(transparent)]
    Load(XlsxError),

    /// The cleaned workbook could not be written back
    #[error(transparent)]
    Serialize(XlsxError),
}

impl ScrubError {
    /// Underlying package error, if any
    pub fn xlsx_error(&self) -> Option<&XlsxError> {
        match self {
            ScrubError::NoFileSelected => None,
            ScrubError::Load(e) | ScrubError::Serialize(e) => Some(e),
        }
    }
}
