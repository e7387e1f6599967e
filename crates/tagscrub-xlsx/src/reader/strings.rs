//! String items: the `<si>` entries of the shared-string table and the `<is>`
//! body of inline string cells share one grammar (`<t>` or a list of `<r>`
//! runs, plus phonetic `<rPh>` hints that are not part of the text).

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tagscrub_core::{CellValue, RichText, RunFormat, SharedString, TextRun};

use crate::error::{XlsxError, XlsxResult};
use crate::escape::decode_excel_escapes;
use crate::package::{attr_flag, attr_value};

/// A parsed string item
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StringItem {
    Plain(SharedString),
    Rich(RichText),
}

impl StringItem {
    pub fn to_value(&self) -> CellValue {
        match self {
            StringItem::Plain(s) => CellValue::String(s.clone()),
            StringItem::Rich(rt) => CellValue::RichText(rt.clone()),
        }
    }

    /// Text of a plain item, `None` for rich items
    pub fn plain_text(&self) -> Option<&str> {
        match self {
            StringItem::Plain(s) => Some(s.as_str()),
            StringItem::Rich(_) => None,
        }
    }
}

/// Consume events up to and including the closing tag named `end`
/// (`si` or `is`), which must already have been opened.
pub(crate) fn read_string_item<R: BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    end: &[u8],
) -> XlsxResult<StringItem> {
    let mut plain = String::new();
    let mut runs: Vec<TextRun> = Vec::new();

    let mut run_text = String::new();
    let mut run_format: Option<RunFormat> = None;
    let mut in_run = false;
    let mut in_run_props = false;
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        buf.clear();
        match reader.read_event_into(buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"r" if !in_phonetic => {
                    in_run = true;
                    run_text.clear();
                    run_format = None;
                }
                b"rPr" if in_run => {
                    in_run_props = true;
                    run_format = Some(RunFormat::default());
                }
                b"rPh" => in_phonetic = true,
                b"t" if !in_phonetic => in_text = true,
                name if in_run_props => {
                    if let Some(format) = run_format.as_mut() {
                        apply_run_property(format, name, &e)?;
                    }
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"rPr" if in_run => run_format = Some(RunFormat::default()),
                name if in_run_props => {
                    if let Some(format) = run_format.as_mut() {
                        apply_run_property(format, name, &e)?;
                    }
                }
                _ => {}
            },
            Event::Text(e) if in_text => {
                let text = e.unescape()?;
                if in_run {
                    run_text.push_str(&text);
                } else {
                    plain.push_str(&text);
                }
            }
            Event::CData(e) if in_text => {
                let text = String::from_utf8_lossy(&e);
                if in_run {
                    run_text.push_str(&text);
                } else {
                    plain.push_str(&text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"rPr" => in_run_props = false,
                b"rPh" => in_phonetic = false,
                b"r" if in_run => {
                    in_run = false;
                    runs.push(TextRun {
                        text: decode_excel_escapes(&run_text),
                        format: run_format.take(),
                    });
                }
                name if name == end => break,
                _ => {}
            },
            Event::Eof => {
                return Err(XlsxError::Parse(format!(
                    "unterminated <{}> string item",
                    String::from_utf8_lossy(end)
                )))
            }
            _ => {}
        }
    }

    if runs.is_empty() {
        return Ok(StringItem::Plain(SharedString::new(decode_excel_escapes(
            &plain,
        ))));
    }
    // A bare <t> next to runs is unusual; keep it as a leading unformatted run
    if !plain.is_empty() {
        runs.insert(0, TextRun::plain(decode_excel_escapes(&plain)));
    }
    Ok(StringItem::Rich(RichText::from_runs(runs)))
}

fn apply_run_property(format: &mut RunFormat, name: &[u8], e: &BytesStart<'_>) -> XlsxResult<()> {
    match name {
        b"b" => format.bold = attr_flag(e, b"val", true)?,
        b"i" => format.italic = attr_flag(e, b"val", true)?,
        b"strike" => format.strike = attr_flag(e, b"val", true)?,
        b"u" => {
            format.underline = attr_value(e, b"val")?.map_or(true, |v| v != "none");
        }
        b"sz" => format.size = attr_value(e, b"val")?.and_then(|v| v.parse().ok()),
        b"rFont" => format.font_name = attr_value(e, b"val")?,
        b"color" => format.color = attr_value(e, b"rgb")?,
        _ => {}
    }
    Ok(())
}
