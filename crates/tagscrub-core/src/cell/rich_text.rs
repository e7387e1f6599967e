//! Rich text: a string split into runs that each carry their own font

use std::fmt;

/// Character formatting of a single run.
///
/// Only the attributes commonly found in `<rPr>` are kept; anything else in
/// the file is ignored on read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunFormat {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub font_name: Option<String>,
    pub size: Option<f64>,
    /// ARGB hex as written in the file, e.g. `FFFF0000`
    pub color: Option<String>,
}

impl RunFormat {
    pub fn is_default(&self) -> bool {
        *self == RunFormat::default()
    }
}

/// One formatted piece of a rich text value
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub format: Option<RunFormat>,
}

impl TextRun {
    pub fn plain<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            format: None,
        }
    }

    pub fn formatted<S: Into<String>>(text: S, format: RunFormat) -> Self {
        Self {
            text: text.into(),
            format: Some(format),
        }
    }
}

/// Ordered run list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RichText {
    runs: Vec<TextRun>,
}

impl RichText {
    pub fn from_runs(runs: Vec<TextRun>) -> Self {
        Self { runs }
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// Run texts joined in order with no separator
    pub fn to_plain_string(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

impl fmt::Display for RichText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for run in &self.runs {
            f.write_str(&run.text)?;
        }
        Ok(())
    }
}
