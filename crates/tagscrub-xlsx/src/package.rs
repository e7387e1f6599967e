//! OPC package plumbing: part lookup, relationships and XML helpers

use std::io::{Read, Seek};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};

/// First bytes of an OLE compound file (legacy `.xls`, encrypted workbooks)
pub(crate) const OLE_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// First bytes of a ZIP local file header
pub(crate) const ZIP_SIGNATURE: [u8; 4] = [b'P', b'K', 0x03, 0x04];

pub(crate) const WORKBOOK_PART: &str = "xl/workbook.xml";
pub(crate) const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub(crate) const DEFAULT_SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// One `<Relationship>` entry
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    /// True when the type URI ends with `/{kind}`, whichever namespace
    /// flavour (transitional or strict) the file uses
    pub fn is(&self, kind: &str) -> bool {
        self.rel_type
            .rsplit('/')
            .next()
            .is_some_and(|last| last == kind)
    }
}

/// Reject byte streams that are obviously not an OOXML package
pub(crate) fn sniff_container(bytes: &[u8]) -> XlsxResult<()> {
    if bytes.starts_with(&OLE_SIGNATURE) {
        return Err(XlsxError::UnsupportedFormat(
            "OLE compound document (legacy .xls or password-protected workbook); \
             save it as .xlsx first"
                .into(),
        ));
    }
    if !bytes.starts_with(&ZIP_SIGNATURE) {
        return Err(XlsxError::InvalidFormat(
            "not a ZIP container (is this really an .xlsx file?)".into(),
        ));
    }
    Ok(())
}

/// Read a whole part, `None` if the package does not contain it
pub(crate) fn read_part<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> XlsxResult<Option<Vec<u8>>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut bytes = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut bytes)?;
            Ok(Some(bytes))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Like [`read_part`] but the part must exist
pub(crate) fn read_required_part<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> XlsxResult<Vec<u8>> {
    read_part(archive, name)?.ok_or_else(|| XlsxError::MissingPart(name.to_string()))
}

/// `xl/worksheets/sheet1.xml` → `xl/worksheets/_rels/sheet1.xml.rels`
pub(crate) fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target against the part that owns the
/// relationship. Absolute targets start at the package root.
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Parse a `.rels` part
pub(crate) fn parse_relationships(xml: &[u8]) -> XlsxResult<Vec<Relationship>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut rels = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"Relationship" => {
                let id = attr_value(&e, b"Id")?;
                let target = attr_value(&e, b"Target")?;
                let rel_type = attr_value(&e, b"Type")?;
                let external = attr_value(&e, b"TargetMode")?
                    .is_some_and(|mode| mode.eq_ignore_ascii_case("External"));

                if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                    rels.push(Relationship {
                        id,
                        rel_type,
                        target,
                        external,
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Unescaped value of the attribute whose local name is `local`
pub(crate) fn attr_value(e: &BytesStart<'_>, local: &[u8]) -> XlsxResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == local {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// `1`/`true` style boolean attribute, `default` when absent
pub(crate) fn attr_flag(e: &BytesStart<'_>, local: &[u8], default: bool) -> XlsxResult<bool> {
    Ok(attr_value(e, local)?.map_or(default, |v| v == "1" || v.eq_ignore_ascii_case("true")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rels_path_for() {
        assert_eq!(
            rels_path_for("xl/worksheets/sheet1.xml"),
            "xl/worksheets/_rels/sheet1.xml.rels"
        );
        assert_eq!(rels_path_for("xl/workbook.xml"), "xl/_rels/workbook.xml.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("xl/workbook.xml", "worksheets/sheet1.xml"),
            "xl/worksheets/sheet1.xml"
        );
        assert_eq!(
            resolve_target("xl/workbook.xml", "/xl/worksheets/sheet2.xml"),
            "xl/worksheets/sheet2.xml"
        );
        assert_eq!(
            resolve_target("xl/worksheets/sheet1.xml", "../sharedStrings.xml"),
            "xl/sharedStrings.xml"
        );
        assert_eq!(
            resolve_target("xl/workbook.xml", "./styles.xml"),
            "xl/styles.xml"
        );
    }

    #[test]
    fn test_parse_relationships() {
        let xml = br#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.test/?a=1&amp;b=2" TargetMode="External"/>
</Relationships>"#;
        let rels = parse_relationships(xml).unwrap();

        assert_eq!(rels.len(), 2);
        assert!(rels[0].is("worksheet"));
        assert!(!rels[0].external);
        assert!(rels[1].is("hyperlink"));
        assert!(rels[1].external);
        assert_eq!(rels[1].target, "https://example.test/?a=1&b=2");
    }

    #[test]
    fn test_sniff_container() {
        assert!(matches!(
            sniff_container(&OLE_SIGNATURE),
            Err(XlsxError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            sniff_container(b"hello"),
            Err(XlsxError::InvalidFormat(_))
        ));
        assert!(sniff_container(b"PK\x03\x04rest").is_ok());
    }
}
