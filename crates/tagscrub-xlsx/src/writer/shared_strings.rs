//! Appending to an existing shared-string table.
//!
//! Existing `<si>` entries are never rewritten: other cells, other sheets and
//! rich formatting may depend on them. New text is appended at the end and
//! the `count`/`uniqueCount` attributes on `<sst>` are kept consistent.

use ahash::AHashMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::{escape_xml, text_element};
use crate::error::XlsxResult;
use crate::reader::strings::StringItem;

#[derive(Debug)]
pub(crate) struct SharedStringTable {
    /// False when the package has no table; callers then write inline strings
    available: bool,
    original_len: usize,
    /// Plain entries by text, first occurrence wins
    lookup: AHashMap<String, u32>,
    appended: Vec<String>,
    /// Net change in the number of `t="s"` cell references
    ref_delta: i64,
}

impl SharedStringTable {
    pub fn new(items: &[StringItem], available: bool) -> Self {
        let mut lookup = AHashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            if let Some(text) = item.plain_text() {
                lookup.entry(text.to_string()).or_insert(idx as u32);
            }
        }
        Self {
            available,
            original_len: items.len(),
            lookup,
            appended: Vec::new(),
            ref_delta: 0,
        }
    }

    /// Index of a plain entry holding `text`, appending one if needed.
    /// Counts as one new cell reference.
    pub fn reference(&mut self, text: &str) -> Option<u32> {
        if !self.available {
            return None;
        }
        let idx = match self.lookup.get(text) {
            Some(&idx) => idx,
            None => {
                let idx = (self.original_len + self.appended.len()) as u32;
                self.appended.push(text.to_string());
                self.lookup.insert(text.to_string(), idx);
                idx
            }
        };
        self.ref_delta += 1;
        Some(idx)
    }

    /// A `t="s"` cell was overwritten
    pub fn release(&mut self) {
        if self.available {
            self.ref_delta -= 1;
        }
    }

    pub fn is_dirty(&self) -> bool {
        !self.appended.is_empty() || self.ref_delta != 0
    }

    pub fn appended(&self) -> &[String] {
        &self.appended
    }

    /// Rewrite sharedStrings.xml: new `<si>` entries go just before `</sst>`
    /// and the counters on the root element are adjusted. Everything else is
    /// copied byte for byte.
    pub fn patch_xml(&self, xml: &[u8]) -> XlsxResult<Vec<u8>> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(false);

        let mut out = Vec::with_capacity(xml.len() + self.appended.len() * 32);
        let mut copied = 0;
        let mut prefix = String::new();

        loop {
            let before = reader.buffer_position();
            match reader.read_event()? {
                Event::Start(e) if e.local_name().as_ref() == b"sst" => {
                    prefix = element_prefix(&e);
                    out.extend_from_slice(&xml[copied..before]);
                    out.extend_from_slice(self.root_tag(&e)?.as_bytes());
                    copied = reader.buffer_position();
                }
                Event::Empty(e) if e.local_name().as_ref() == b"sst" => {
                    prefix = element_prefix(&e);
                    out.extend_from_slice(&xml[copied..before]);
                    out.extend_from_slice(self.root_tag(&e)?.as_bytes());
                    out.extend_from_slice(self.new_items(&prefix).as_bytes());
                    out.extend_from_slice(format!("</{prefix}sst>").as_bytes());
                    copied = reader.buffer_position();
                }
                Event::End(e) if e.local_name().as_ref() == b"sst" => {
                    out.extend_from_slice(&xml[copied..before]);
                    out.extend_from_slice(self.new_items(&prefix).as_bytes());
                    copied = before;
                }
                Event::Eof => break,
                _ => {}
            }
        }
        out.extend_from_slice(&xml[copied..]);
        Ok(out)
    }

    fn new_items(&self, prefix: &str) -> String {
        self.appended
            .iter()
            .map(|text| format!("<{prefix}si>{}</{prefix}si>", text_element(prefix, text)))
            .collect()
    }

    /// The `<sst>` start tag with adjusted counters
    fn root_tag(&self, e: &BytesStart<'_>) -> XlsxResult<String> {
        let mut tag = format!("<{}", String::from_utf8_lossy(e.name().as_ref()));
        for attr in e.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?;
            let value = match attr.key.local_name().as_ref() {
                b"count" => match value.trim().parse::<i64>() {
                    Ok(count) => (count + self.ref_delta).max(0).to_string(),
                    Err(_) => value.into_owned(),
                },
                b"uniqueCount" => (self.original_len + self.appended.len()).to_string(),
                _ => value.into_owned(),
            };
            tag.push_str(&format!(" {key}=\"{}\"", escape_xml(&value)));
        }
        tag.push('>');
        Ok(tag)
    }
}

/// `x:` for `<x:sst>`, empty for the default namespace
pub(crate) fn element_prefix(e: &BytesStart<'_>) -> String {
    match e.name().prefix() {
        Some(prefix) => format!("{}:", String::from_utf8_lossy(prefix.as_ref())),
        None => String::new(),
    }
}
