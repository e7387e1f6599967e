//! Worksheet part parsing (`xl/worksheets/sheetN.xml`)

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tagscrub_core::{CellAddress, CellData, CellError, CellRange, CellValue, Worksheet};

use super::strings::{read_string_item, StringItem};
use crate::error::{XlsxError, XlsxResult};
use crate::escape::decode_excel_escapes;
use crate::package::attr_value;

/// A `<hyperlink>` entry before its relationship id has been resolved
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SheetHyperlink {
    pub range: CellRange,
    pub rel_id: Option<String>,
    pub location: Option<String>,
    pub tooltip: Option<String>,
}

/// Raw pieces of one `<c>` element
#[derive(Debug, Default)]
struct PendingCell {
    addr: Option<CellAddress>,
    cell_type: Option<String>,
    style: u32,
    value: Option<String>,
    formula: Option<String>,
    inline: Option<StringItem>,
}

/// Tracks row/column position for cells that omit their `r` attribute
#[derive(Debug, Default)]
pub(crate) struct Cursor {
    row: Option<u32>,
    col: Option<u16>,
}

impl Cursor {
    pub fn enter_row(&mut self, e: &BytesStart<'_>) -> XlsxResult<u32> {
        let row = match attr_value(e, b"r")? {
            Some(r) => r
                .parse::<u32>()
                .ok()
                .and_then(|r| r.checked_sub(1))
                .ok_or_else(|| XlsxError::Parse(format!("Invalid row number '{r}'")))?,
            None => self.row.map_or(0, |r| r + 1),
        };
        self.row = Some(row);
        self.col = None;
        Ok(row)
    }

    pub fn enter_cell(&mut self, e: &BytesStart<'_>) -> XlsxResult<CellAddress> {
        let addr = match attr_value(e, b"r")? {
            Some(r) => CellAddress::parse(&r).map_err(|err| {
                XlsxError::Parse(format!("Invalid cell reference '{r}': {err}"))
            })?,
            None => CellAddress::new(
                self.row.unwrap_or(0),
                self.col.map_or(0, |c| c.saturating_add(1)),
            ),
        };
        self.row = Some(addr.row);
        self.col = Some(addr.col);
        Ok(addr)
    }
}

/// Load every cell of a worksheet part into `worksheet` and collect its
/// hyperlinks. Cells are stored with [`Worksheet::load_cell`], so nothing is
/// marked as edited.
pub(crate) fn read_worksheet_xml(
    xml: &[u8],
    worksheet: &mut Worksheet,
    shared_strings: &[StringItem],
) -> XlsxResult<Vec<SheetHyperlink>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut item_buf = Vec::new();
    let mut cursor = Cursor::default();
    let mut hyperlinks = Vec::new();

    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_formula = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    cursor.enter_row(&e)?;
                }
                b"c" => cell = Some(start_cell(&mut cursor, &e)?),
                b"v" if cell.is_some() => in_value = true,
                b"f" => {
                    if let Some(c) = cell.as_mut() {
                        in_formula = true;
                        c.formula = Some(String::new());
                    }
                }
                b"is" => {
                    if let Some(c) = cell.as_mut() {
                        c.inline = Some(read_string_item(&mut reader, &mut item_buf, b"is")?);
                    }
                }
                b"hyperlink" => hyperlinks.push(parse_hyperlink(&e)?),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    cursor.enter_row(&e)?;
                }
                b"c" => {
                    let pending = start_cell(&mut cursor, &e)?;
                    finish_cell(worksheet, pending, shared_strings)?;
                }
                b"f" => {
                    if let Some(c) = cell.as_mut() {
                        c.formula = Some(String::new());
                    }
                }
                b"is" => {
                    if let Some(c) = cell.as_mut() {
                        c.inline = Some(StringItem::Plain("".into()));
                    }
                }
                b"hyperlink" => hyperlinks.push(parse_hyperlink(&e)?),
                _ => {}
            },
            Event::Text(e) if in_value || in_formula => {
                let text = e.unescape()?;
                if let Some(c) = cell.as_mut() {
                    let slot = if in_value { &mut c.value } else { &mut c.formula };
                    slot.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" => in_value = false,
                b"f" => in_formula = false,
                b"c" => {
                    if let Some(pending) = cell.take() {
                        finish_cell(worksheet, pending, shared_strings)?;
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(hyperlinks)
}

fn start_cell(cursor: &mut Cursor, e: &BytesStart<'_>) -> XlsxResult<PendingCell> {
    let addr = cursor.enter_cell(e)?;
    let style = attr_value(e, b"s")?
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(0);
    Ok(PendingCell {
        addr: Some(addr),
        cell_type: attr_value(e, b"t")?,
        style,
        ..PendingCell::default()
    })
}

fn finish_cell(
    worksheet: &mut Worksheet,
    pending: PendingCell,
    shared_strings: &[StringItem],
) -> XlsxResult<()> {
    let Some(addr) = pending.addr else {
        return Ok(());
    };
    let cell_type = pending.cell_type.as_deref();

    let value = match pending.formula {
        Some(text) => {
            let cached = match pending.value.as_deref() {
                Some(v) => Some(typed_value(cell_type, v, shared_strings)?),
                None => None,
            };
            CellValue::Formula {
                text,
                cached_value: cached.map(Box::new),
            }
        }
        None => match (cell_type, pending.inline, pending.value) {
            (Some("inlineStr"), Some(item), _) => item.to_value(),
            (_, _, Some(v)) => typed_value(cell_type, &v, shared_strings)?,
            _ => CellValue::Empty,
        },
    };

    if value.is_empty() && pending.style == 0 {
        return Ok(());
    }
    worksheet.load_cell(addr.row, addr.col, CellData::with_style(value, pending.style))?;
    Ok(())
}

/// Interpret a `<v>` payload according to the cell's `t` attribute
fn typed_value(
    cell_type: Option<&str>,
    v: &str,
    shared_strings: &[StringItem],
) -> XlsxResult<CellValue> {
    let value = match cell_type {
        Some("s") => {
            let idx: usize = v
                .trim()
                .parse()
                .map_err(|_| XlsxError::Parse(format!("Invalid shared string index: {v}")))?;
            shared_strings
                .get(idx)
                .ok_or_else(|| {
                    XlsxError::Parse(format!("Shared string index {idx} out of bounds"))
                })?
                .to_value()
        }
        Some("b") => CellValue::Boolean(v.trim() == "1" || v.trim().eq_ignore_ascii_case("true")),
        Some("e") => CellError::parse(v)
            .map(CellValue::Error)
            .unwrap_or_else(|| CellValue::string(v)),
        Some("str") | Some("inlineStr") => CellValue::string(decode_excel_escapes(v)),
        Some("d") => {
            // ISO 8601 date cells; kept out of the string family
            log::debug!("keeping t=\"d\" cell value '{v}' opaque");
            CellValue::Empty
        }
        None | Some("n") => match v.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::string(v),
        },
        Some(other) => {
            log::warn!("unknown cell type '{other}', reading value as text");
            CellValue::string(v)
        }
    };
    Ok(value)
}

fn parse_hyperlink(e: &BytesStart<'_>) -> XlsxResult<SheetHyperlink> {
    let reference = attr_value(e, b"ref")?
        .ok_or_else(|| XlsxError::Parse("<hyperlink> without ref".into()))?;
    let range = CellRange::parse(&reference)
        .map_err(|err| XlsxError::Parse(format!("Invalid hyperlink ref '{reference}': {err}")))?;
    Ok(SheetHyperlink {
        range,
        rel_id: attr_value(e, b"id")?,
        location: attr_value(e, b"location")?,
        tooltip: attr_value(e, b"tooltip")?,
    })
}
