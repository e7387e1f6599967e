//! Cell text extraction, cleanup and write-back

use std::borrow::Cow;

use lazy_regex::{lazy_regex, regex, Lazy, Regex};
use tagscrub_core::CellValue;

/// Any `<...>` span, attributes and all
static TAG: Lazy<Regex> = lazy_regex!(r"<[^>]*>");

/// Runs of ECMAScript whitespace: tab, line and form feeds, the Zs
/// category, U+2028/U+2029 and the BOM. Unicode `\s` would also take U+0085.
static WHITESPACE: Lazy<Regex> = lazy_regex!(
    r"[\t\n\x0B\x0C\r \x{A0}\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}]+"
);

/// Entity table, decoded in this order, one pass per entry. Case folding is
/// ASCII only, so `ſ` never stands in for `s`.
fn entities() -> [(&'static Regex, &'static str); 11] {
    [
        (regex!("(?i-u)&nbsp;"), " "),
        (regex!("(?i-u)&lt;"), "<"),
        (regex!("(?i-u)&gt;"), ">"),
        (regex!("(?i-u)&amp;"), "&"),
        (regex!("(?i-u)&quot;"), "\""),
        (regex!("(?i-u)&#39;"), "'"),
        (regex!("(?i-u)&#34;"), "\""),
        (regex!("(?i-u)&rdquo;"), "\""),
        (regex!("(?i-u)&ldquo;"), "\""),
        (regex!("(?i-u)&rsquo;"), "'"),
        (regex!("(?i-u)&lsquo;"), "'"),
    ]
}

/// Textual content of a cell, or `None` for kinds that are never cleaned.
///
/// Rich text is flattened by concatenating its runs; a hyperlink yields its
/// display text. Numbers, booleans, errors, formulas and empty cells are
/// skipped even when they would display as text.
pub fn extract_text(value: &CellValue) -> Option<Cow<'_, str>> {
    match value {
        CellValue::String(s) => Some(Cow::Borrowed(s.as_str())),
        CellValue::RichText(rt) => Some(Cow::Owned(rt.to_plain_string())),
        CellValue::Hyperlink(link) => Some(Cow::Borrowed(link.text.as_str())),
        _ => None,
    }
}

/// Decode the entity table, drop tags, then normalise whitespace.
///
/// ```
/// use tagscrub::clean_text;
///
/// assert_eq!(clean_text("&lt;b&gt;hi&lt;/b&gt;"), "hi");
/// assert_eq!(clean_text("<p>Hello&nbsp;World</p>"), "Hello World");
/// assert_eq!(clean_text("a\n\n  b\tc"), "a b c");
/// ```
pub fn clean_text(input: &str) -> String {
    let mut text = input.to_string();
    for (pattern, replacement) in entities() {
        if pattern.is_match(&text) {
            text = pattern.replace_all(&text, replacement).into_owned();
        }
    }
    let text = TAG.replace_all(&text, "");
    // Every whitespace run is a single space by now
    WHITESPACE.replace_all(&text, " ").trim_matches(' ').to_string()
}

/// Store cleaned text back into a cell value.
///
/// A hyperlink keeps its target and tooltip and only its text changes. Rich
/// text loses its runs and becomes a plain string. Anything else is replaced
/// by a plain string.
pub fn write_text(value: &mut CellValue, text: String) {
    match value {
        CellValue::Hyperlink(link) => link.text = text,
        other => *other = CellValue::string(text),
    }
}
