//! Splicing edited cells into an existing worksheet part.
//!
//! The original XML is copied byte for byte; only the `<c>` elements of
//! edited cells are replaced, and cells that did not exist yet are inserted in
//! row/column order.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tagscrub_core::{CellAddress, CellData, CellValue, RichText, Worksheet};

use super::shared_strings::{element_prefix, SharedStringTable};
use super::{escape_xml, text_element};
use crate::error::XlsxResult;
use crate::escape::encode_excel_escapes;
use crate::package::attr_value;
use crate::reader::worksheet::Cursor;

/// Edited cells still waiting to be written, by row then column
type PendingRows = BTreeMap<u32, BTreeMap<u16, CellData>>;

/// Output buffer that copies untouched source ranges lazily
struct Splice<'a> {
    src: &'a [u8],
    out: Vec<u8>,
    copied: usize,
}

impl<'a> Splice<'a> {
    fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            out: Vec::with_capacity(src.len() + 256),
            copied: 0,
        }
    }

    fn copy_to(&mut self, pos: usize) {
        if pos > self.copied {
            self.out.extend_from_slice(&self.src[self.copied..pos]);
            self.copied = pos;
        }
    }

    fn push(&mut self, s: &str) {
        self.out.extend_from_slice(s.as_bytes());
    }

    fn skip_to(&mut self, pos: usize) {
        self.copied = pos;
    }

    fn finish(mut self) -> Vec<u8> {
        self.copy_to(self.src.len());
        self.out
    }
}

/// Rewrite a worksheet part so it carries the edited cells of `sheet`
pub(crate) fn patch_worksheet_xml(
    xml: &[u8],
    sheet: &Worksheet,
    strings: &mut SharedStringTable,
) -> XlsxResult<Vec<u8>> {
    let mut pending = PendingRows::new();
    for addr in sheet.edited_cells() {
        let data = sheet.cell_at(addr.row, addr.col).cloned().unwrap_or_default();
        pending.entry(addr.row).or_default().insert(addr.col, data);
    }
    if pending.is_empty() {
        return Ok(xml.to_vec());
    }

    let mut reader = Reader::from_reader(xml);
    reader.trim_text(false);

    let mut splice = Splice::new(xml);
    let mut cursor = Cursor::default();
    let mut prefix = String::new();
    let mut in_sheet_data = false;
    let mut open_row: Option<u32> = None;

    loop {
        let before = reader.buffer_position();
        let event = reader.read_event()?;
        let after = reader.buffer_position();

        match event {
            Event::Start(e) if e.local_name().as_ref() == b"sheetData" => {
                prefix = element_prefix(&e);
                in_sheet_data = true;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"sheetData" => {
                prefix = element_prefix(&e);
                splice.copy_to(before);
                let mut body = open_tag(&xml[before..after]);
                write_rows(&mut body, &prefix, std::mem::take(&mut pending), strings);
                body.push_str(&format!("</{prefix}sheetData>"));
                splice.push(&body);
                splice.skip_to(after);
            }
            Event::End(e) if in_sheet_data && e.local_name().as_ref() == b"sheetData" => {
                splice.copy_to(before);
                let mut body = String::new();
                write_rows(&mut body, &prefix, std::mem::take(&mut pending), strings);
                splice.push(&body);
                in_sheet_data = false;
            }
            Event::Start(e) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                let row = cursor.enter_row(&e)?;
                flush_rows_before(&mut splice, before, &prefix, &mut pending, row, strings);
                open_row = Some(row);
            }
            Event::Empty(e) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                let row = cursor.enter_row(&e)?;
                flush_rows_before(&mut splice, before, &prefix, &mut pending, row, strings);
                if let Some(cells) = pending.remove(&row) {
                    splice.copy_to(before);
                    let mut body = open_tag(&xml[before..after]);
                    write_cells(&mut body, &prefix, row, cells, strings);
                    body.push_str(&format!("</{prefix}row>"));
                    splice.push(&body);
                    splice.skip_to(after);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"row" => {
                if let Some(cells) = open_row.take().and_then(|row| pending.remove(&row).map(|c| (row, c))) {
                    splice.copy_to(before);
                    let mut body = String::new();
                    write_cells(&mut body, &prefix, cells.0, cells.1, strings);
                    splice.push(&body);
                }
            }
            Event::Start(ref e) | Event::Empty(ref e)
                if open_row.is_some() && e.local_name().as_ref() == b"c" =>
            {
                let addr = cursor.enter_cell(e)?;
                let Some(row_cells) = pending.get_mut(&addr.row) else {
                    continue;
                };

                let right = row_cells.split_off(&addr.col);
                let left = std::mem::replace(row_cells, right);
                if !left.is_empty() {
                    splice.copy_to(before);
                    let mut body = String::new();
                    write_cells(&mut body, &prefix, addr.row, left, strings);
                    splice.push(&body);
                }

                if let Some(data) = row_cells.remove(&addr.col) {
                    splice.copy_to(before);
                    let end = if matches!(event, Event::Start(_)) {
                        reader.read_to_end(e.name())?;
                        reader.buffer_position()
                    } else {
                        after
                    };
                    if attr_value(e, b"t")?.as_deref() == Some("s") {
                        strings.release();
                    }
                    let extra = extra_attributes(e)?;
                    splice.push(&cell_xml(&prefix, addr, &data, &extra, strings));
                    splice.skip_to(end);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !pending.is_empty() {
        log::warn!(
            "sheet '{}': {} edited rows had nowhere to go (no <sheetData>)",
            sheet.name(),
            pending.len()
        );
    }
    Ok(splice.finish())
}

fn flush_rows_before(
    splice: &mut Splice<'_>,
    pos: usize,
    prefix: &str,
    pending: &mut PendingRows,
    row: u32,
    strings: &mut SharedStringTable,
) {
    let later = pending.split_off(&row);
    let earlier = std::mem::replace(pending, later);
    if earlier.is_empty() {
        return;
    }
    splice.copy_to(pos);
    let mut body = String::new();
    write_rows(&mut body, prefix, earlier, strings);
    splice.push(&body);
}

/// `<row .../>` as an opening tag
fn open_tag(raw: &[u8]) -> String {
    let raw = String::from_utf8_lossy(raw);
    match raw.strip_suffix("/>") {
        Some(head) => format!("{head}>"),
        None => raw.into_owned(),
    }
}

fn write_rows(out: &mut String, prefix: &str, rows: PendingRows, strings: &mut SharedStringTable) {
    for (row, cells) in rows {
        out.push_str(&format!("<{prefix}row r=\"{}\">", row + 1));
        write_cells(out, prefix, row, cells, strings);
        out.push_str(&format!("</{prefix}row>"));
    }
}

fn write_cells(
    out: &mut String,
    prefix: &str,
    row: u32,
    cells: BTreeMap<u16, CellData>,
    strings: &mut SharedStringTable,
) {
    for (col, data) in cells {
        out.push_str(&cell_xml(prefix, CellAddress::new(row, col), &data, "", strings));
    }
}

/// Attributes of an original `<c>` other than the ones we regenerate
fn extra_attributes(e: &BytesStart<'_>) -> XlsxResult<String> {
    let mut extra = String::new();
    for attr in e.attributes() {
        let attr = attr?;
        if matches!(attr.key.local_name().as_ref(), b"r" | b"s" | b"t") {
            continue;
        }
        extra.push_str(&format!(
            " {}=\"{}\"",
            String::from_utf8_lossy(attr.key.as_ref()),
            escape_xml(&attr.unescape_value()?)
        ));
    }
    Ok(extra)
}

/// Serialise one cell
fn cell_xml(
    prefix: &str,
    addr: CellAddress,
    data: &CellData,
    extra: &str,
    strings: &mut SharedStringTable,
) -> String {
    let (cell_type, body) = value_xml(prefix, &data.value, strings);

    let mut xml = format!("<{prefix}c r=\"{addr}\"");
    if data.style_index != 0 {
        xml.push_str(&format!(" s=\"{}\"", data.style_index));
    }
    if let Some(t) = cell_type {
        xml.push_str(&format!(" t=\"{t}\""));
    }
    xml.push_str(extra);

    if body.is_empty() {
        xml.push_str("/>");
    } else {
        xml.push_str(&format!(">{body}</{prefix}c>"));
    }
    xml
}

/// `t` attribute and child elements for a value
fn value_xml(
    prefix: &str,
    value: &CellValue,
    strings: &mut SharedStringTable,
) -> (Option<&'static str>, String) {
    let v = |text: &str| format!("<{prefix}v>{text}</{prefix}v>");

    match value {
        CellValue::Empty => (None, String::new()),
        CellValue::Number(n) => (None, v(&n.to_string())),
        CellValue::Boolean(b) => (Some("b"), v(if *b { "1" } else { "0" })),
        CellValue::Error(e) => (Some("e"), v(&escape_xml(e.as_str()))),
        CellValue::String(s) => string_xml(prefix, s.as_str(), strings),
        CellValue::Hyperlink(link) => string_xml(prefix, &link.text, strings),
        CellValue::RichText(rt) => (
            Some("inlineStr"),
            format!("<{prefix}is>{}</{prefix}is>", runs_xml(prefix, rt)),
        ),
        CellValue::Formula { text, cached_value } => {
            let formula = format!("<{prefix}f>{}</{prefix}f>", escape_xml(text));
            let cached_text = |s: &str| v(&escape_xml(&encode_excel_escapes(s)));
            match cached_value.as_deref() {
                Some(CellValue::Number(n)) => (None, formula + &v(&n.to_string())),
                Some(CellValue::Boolean(b)) => {
                    (Some("b"), formula + &v(if *b { "1" } else { "0" }))
                }
                Some(CellValue::Error(e)) => (Some("e"), formula + &v(&escape_xml(e.as_str()))),
                Some(CellValue::String(s)) => (Some("str"), formula + &cached_text(s.as_str())),
                Some(CellValue::Hyperlink(link)) => (Some("str"), formula + &cached_text(&link.text)),
                Some(CellValue::RichText(rt)) => {
                    (Some("str"), formula + &cached_text(&rt.to_plain_string()))
                }
                _ => (None, formula),
            }
        }
    }
}

fn string_xml(
    prefix: &str,
    text: &str,
    strings: &mut SharedStringTable,
) -> (Option<&'static str>, String) {
    match strings.reference(text) {
        Some(idx) => (Some("s"), format!("<{prefix}v>{idx}</{prefix}v>")),
        None => (
            Some("inlineStr"),
            format!("<{prefix}is>{}</{prefix}is>", text_element(prefix, text)),
        ),
    }
}

fn runs_xml(prefix: &str, rich: &RichText) -> String {
    let mut xml = String::new();
    for run in rich.runs() {
        xml.push_str(&format!("<{prefix}r>"));
        if let Some(format) = run.format.as_ref().filter(|f| !f.is_default()) {
            xml.push_str(&format!("<{prefix}rPr>"));
            if let Some(font) = &format.font_name {
                xml.push_str(&format!("<{prefix}rFont val=\"{}\"/>", escape_xml(font)));
            }
            if format.bold {
                xml.push_str(&format!("<{prefix}b/>"));
            }
            if format.italic {
                xml.push_str(&format!("<{prefix}i/>"));
            }
            if format.strike {
                xml.push_str(&format!("<{prefix}strike/>"));
            }
            if let Some(color) = &format.color {
                xml.push_str(&format!("<{prefix}color rgb=\"{}\"/>", escape_xml(color)));
            }
            if let Some(size) = format.size {
                xml.push_str(&format!("<{prefix}sz val=\"{size}\"/>"));
            }
            if format.underline {
                xml.push_str(&format!("<{prefix}u/>"));
            }
            xml.push_str(&format!("</{prefix}rPr>"));
        }
        xml.push_str(&text_element(prefix, &run.text));
        xml.push_str(&format!("</{prefix}r>"));
    }
    xml
}
