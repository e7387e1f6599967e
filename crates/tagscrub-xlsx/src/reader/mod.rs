//! XLSX reader

pub(crate) mod strings;
pub(crate) mod worksheet;

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tagscrub_core::{CellData, CellValue, Hyperlink, HyperlinkTarget, Workbook, Worksheet};

use crate::document::XlsxDocument;
use crate::error::{XlsxError, XlsxResult};
use crate::package::{
    attr_value, parse_relationships, read_part, read_required_part, rels_path_for,
    resolve_target, sniff_container, Relationship, CONTENT_TYPES_PART,
    DEFAULT_SHARED_STRINGS_PART, WORKBOOK_PART,
};
use self::strings::{read_string_item, StringItem};
use self::worksheet::{read_worksheet_xml, SheetHyperlink};

/// `<sheet>` entry of workbook.xml
#[derive(Debug)]
struct SheetEntry {
    name: String,
    rel_id: String,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<XlsxDocument> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read a workbook from a reader. The whole stream is buffered, since
    /// the writer needs the original package to copy untouched parts.
    pub fn read<R: Read>(mut reader: R) -> XlsxResult<XlsxDocument> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::read_bytes(bytes)
    }

    /// Read a workbook from an in-memory package
    pub fn read_bytes(bytes: Vec<u8>) -> XlsxResult<XlsxDocument> {
        sniff_container(&bytes)?;

        let (workbook, sheet_parts, shared_strings_part, shared_strings) = {
            let mut archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice()))?;

            // Verify this is an OOXML package
            if archive.by_name(CONTENT_TYPES_PART).is_err() {
                return Err(XlsxError::InvalidFormat(format!(
                    "Missing {CONTENT_TYPES_PART}"
                )));
            }

            let workbook_part = Self::find_workbook_part(&mut archive)?;
            let sheets = Self::read_workbook_xml(&mut archive, &workbook_part)?;
            let workbook_rels = match read_part(&mut archive, &rels_path_for(&workbook_part))? {
                Some(xml) => parse_relationships(&xml)?,
                None => Vec::new(),
            };

            let shared_strings_part = Self::find_shared_strings_part(
                &mut archive,
                &workbook_part,
                &workbook_rels,
            );
            let shared_strings = match &shared_strings_part {
                Some(part) => Self::read_shared_strings(&read_required_part(&mut archive, part)?)?,
                None => Vec::new(),
            };
            log::debug!(
                "package has {} sheets and {} shared strings",
                sheets.len(),
                shared_strings.len()
            );

            let mut workbook = Workbook::empty();
            let mut sheet_parts = Vec::with_capacity(sheets.len());

            for entry in &sheets {
                let Some(rel) = workbook_rels
                    .iter()
                    .find(|rel| rel.id == entry.rel_id && rel.is("worksheet"))
                else {
                    // Chartsheets and dialog sheets carry no cell grid
                    log::debug!("skipping non-worksheet sheet '{}'", entry.name);
                    continue;
                };
                let part = resolve_target(&workbook_part, &rel.target);
                let xml = read_required_part(&mut archive, &part)?;

                let sheet = workbook.push_loaded_worksheet(&entry.name);
                let hyperlinks = read_worksheet_xml(&xml, sheet, &shared_strings)?;

                if !hyperlinks.is_empty() {
                    let sheet_rels = match read_part(&mut archive, &rels_path_for(&part))? {
                        Some(xml) => parse_relationships(&xml)?,
                        None => Vec::new(),
                    };
                    apply_hyperlinks(sheet, &hyperlinks, &sheet_rels)?;
                }
                sheet_parts.push(part);
            }

            (workbook, sheet_parts, shared_strings_part, shared_strings)
        };

        Ok(XlsxDocument {
            workbook,
            source: bytes,
            sheet_parts,
            shared_strings_part,
            shared_strings,
        })
    }

    /// Locate the main workbook part through the package relationships,
    /// falling back to the conventional path
    fn find_workbook_part<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> XlsxResult<String> {
        let from_rels = match read_part(archive, "_rels/.rels")? {
            Some(xml) => parse_relationships(&xml)?
                .into_iter()
                .find(|rel| rel.is("officeDocument"))
                .map(|rel| resolve_target("", &rel.target)),
            None => None,
        };
        Ok(from_rels.unwrap_or_else(|| WORKBOOK_PART.to_string()))
    }

    fn find_shared_strings_part<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        workbook_part: &str,
        workbook_rels: &[Relationship],
    ) -> Option<String> {
        let part = workbook_rels
            .iter()
            .find(|rel| rel.is("sharedStrings"))
            .map(|rel| resolve_target(workbook_part, &rel.target))
            .unwrap_or_else(|| DEFAULT_SHARED_STRINGS_PART.to_string());
        archive.by_name(&part).is_ok().then_some(part)
    }

    /// Read workbook.xml to get the sheet names in tab order
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        part: &str,
    ) -> XlsxResult<Vec<SheetEntry>> {
        let xml = read_required_part(archive, part)?;
        let mut reader = Reader::from_reader(xml.as_slice());
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"sheet" => {
                    if let (Some(name), Some(rel_id)) = (attr_value(&e, b"name")?, attr_value(&e, b"id")?) {
                        sheets.push(SheetEntry { name, rel_id });
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Parse the shared-string table, keeping rich items as rich text
    fn read_shared_strings(xml: &[u8]) -> XlsxResult<Vec<StringItem>> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(false);

        let mut buf = Vec::new();
        let mut item_buf = Vec::new();
        let mut strings = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) if e.local_name().as_ref() == b"si" => {
                    strings.push(read_string_item(&mut reader, &mut item_buf, b"si")?);
                }
                Event::Empty(e) if e.local_name().as_ref() == b"si" => {
                    strings.push(StringItem::Plain("".into()));
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }
}

/// Turn string cells covered by a `<hyperlink>` into [`Hyperlink`] values.
/// The link itself lives in the sheet part and its relationships, which the
/// writer never touches; only the display text is editable.
///
/// Rich text under a link stays [`CellValue::RichText`]: it is cleaned and
/// flattened like any other rich cell, and the link survives in the sheet XML.
fn apply_hyperlinks(
    sheet: &mut Worksheet,
    hyperlinks: &[SheetHyperlink],
    rels: &[Relationship],
) -> XlsxResult<()> {
    for link in hyperlinks {
        let target = match (&link.rel_id, &link.location) {
            (Some(id), _) => match rels.iter().find(|rel| &rel.id == id) {
                Some(rel) => HyperlinkTarget::External(rel.target.clone()),
                None => {
                    log::warn!(
                        "hyperlink at {} points to unknown relationship '{id}'",
                        link.range
                    );
                    continue;
                }
            },
            (None, Some(location)) => HyperlinkTarget::Internal(location.clone()),
            (None, None) => continue,
        };

        let covered: Vec<(u32, u16, CellData)> = sheet
            .cells_in_range(&link.range)
            .filter_map(|(row, col, cell)| match &cell.value {
                CellValue::String(text) => {
                    let hyperlink = Hyperlink {
                        text: text.as_str().to_string(),
                        target: target.clone(),
                        tooltip: link.tooltip.clone(),
                    };
                    Some((row, col, CellData::with_style(hyperlink.into(), cell.style_index)))
                }
                _ => None,
            })
            .collect();

        for (row, col, cell) in covered {
            sheet.load_cell(row, col, cell)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::PackageBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_minimal_package() {
        let bytes = PackageBuilder::new()
            .sheet("Sheet1", r#"<sheetData></sheetData>"#)
            .build();
        let doc = XlsxReader::read_bytes(bytes).unwrap();

        assert_eq!(doc.workbook().sheet_count(), 1);
        assert_eq!(doc.workbook().worksheet(0).unwrap().name(), "Sheet1");
        assert_eq!(doc.sheet_part(0), Some("xl/worksheets/sheet1.xml"));
        assert_eq!(doc.shared_strings_part(), None);
    }

    #[test]
    fn test_read_shared_strings_and_sheets_in_order() {
        let bytes = PackageBuilder::new()
            .shared_strings(&["Başvuru İçeriği", "<p>x</p>"])
            .sheet(
                "Kayıtlar",
                r#"<sheetData><row r="1"><c r="H1" t="s"><v>0</v></c></row><row r="2"><c r="H2" t="s"><v>1</v></c></row></sheetData>"#,
            )
            .sheet("Boş", "<sheetData/>")
            .build();
        let doc = XlsxReader::read_bytes(bytes).unwrap();
        let wb = doc.workbook();

        assert_eq!(wb.sheet_count(), 2);
        assert_eq!(wb.worksheet(1).unwrap().name(), "Boş");
        let sheet = wb.worksheet(0).unwrap();
        assert_eq!(sheet.get_value("H1").unwrap(), CellValue::string("Başvuru İçeriği"));
        assert_eq!(sheet.get_value("H2").unwrap(), CellValue::string("<p>x</p>"));
        assert_eq!(doc.shared_strings_part(), Some("xl/sharedStrings.xml"));
        assert_eq!(doc.shared_string_count(), 2);
        assert!(!wb.has_edits());
    }

    #[test]
    fn test_hyperlink_cells_become_hyperlink_values() {
        let bytes = PackageBuilder::new()
            .sheet(
                "Sheet1",
                r#"<sheetData><row r="2"><c r="J2" t="inlineStr"><is><t>&lt;u&gt;site&lt;/u&gt;</t></is></c><c r="K2" t="inlineStr"><is><t>jump</t></is></c></row></sheetData><hyperlinks><hyperlink ref="J2" r:id="rId1" tooltip="open"/><hyperlink ref="K2" location="Sheet1!A1"/></hyperlinks>"#,
            )
            .sheet_rels(
                1,
                r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.test/" TargetMode="External"/>"#,
            )
            .build();
        let doc = XlsxReader::read_bytes(bytes).unwrap();
        let sheet = doc.workbook().worksheet(0).unwrap();

        let external = sheet.get_value("J2").unwrap();
        let link = external.as_hyperlink().unwrap();
        assert_eq!(link.text, "<u>site</u>");
        assert_eq!(link.target, HyperlinkTarget::External("https://example.test/".into()));
        assert_eq!(link.tooltip.as_deref(), Some("open"));

        let internal = sheet.get_value("K2").unwrap();
        assert_eq!(
            internal.as_hyperlink().unwrap().target,
            HyperlinkTarget::Internal("Sheet1!A1".into())
        );
        assert!(!sheet.has_edits());
    }

    #[test]
    fn test_one_link_per_row_on_a_long_sheet() {
        const ROWS: u32 = 5_000;
        let mut body = String::from("<sheetData>");
        let mut links = String::from("<hyperlinks>");
        for r in 1..=ROWS {
            body.push_str(&format!(r#"<row r="{r}">"#));
            for col in ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"] {
                body.push_str(&format!(
                    r#"<c r="{col}{r}" t="inlineStr"><is><t>{col}{r}</t></is></c>"#
                ));
            }
            body.push_str("</row>");
            links.push_str(&format!(r#"<hyperlink ref="J{r}" location="Sheet1!A{r}"/>"#));
        }
        body.push_str("</sheetData>");
        links.push_str("</hyperlinks>");

        let bytes = PackageBuilder::new()
            .sheet("Sheet1", &format!("{body}{links}"))
            .build();
        let doc = XlsxReader::read_bytes(bytes).unwrap();
        let sheet = doc.workbook().worksheet(0).unwrap();

        let linked = sheet
            .iter_cells()
            .filter(|(_, _, cell)| cell.value.as_hyperlink().is_some())
            .count();
        assert_eq!(linked, ROWS as usize);
        assert_eq!(
            sheet.get_value("J4321").unwrap().as_hyperlink().unwrap().target,
            HyperlinkTarget::Internal("Sheet1!A4321".into())
        );
        assert_eq!(sheet.get_value("I4321").unwrap(), CellValue::string("I4321"));
    }

    #[test]
    fn test_linked_range_converts_only_covered_string_cells() {
        let bytes = PackageBuilder::new()
            .sheet(
                "Sheet1",
                r#"<sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>a</t></is></c><c r="B1"><v>2</v></c><c r="C1" t="inlineStr"><is><t>c</t></is></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>d</t></is></c></row></sheetData><hyperlinks><hyperlink ref="A1:B2" location="Sheet1!Z1"/></hyperlinks>"#,
            )
            .build();
        let doc = XlsxReader::read_bytes(bytes).unwrap();
        let sheet = doc.workbook().worksheet(0).unwrap();

        assert!(sheet.get_value("A1").unwrap().as_hyperlink().is_some());
        assert!(sheet.get_value("A2").unwrap().as_hyperlink().is_some());
        assert_eq!(sheet.get_value("B1").unwrap(), CellValue::Number(2.0));
        assert_eq!(sheet.get_value("C1").unwrap(), CellValue::string("c"));
    }

    #[test]
    fn test_rich_text_under_a_link_stays_rich() {
        let bytes = PackageBuilder::new()
            .sheet(
                "Sheet1",
                r#"<sheetData><row r="2"><c r="J2" t="inlineStr"><is><r><rPr><b/></rPr><t>&lt;b&gt;</t></r><r><t>site</t></r></is></c></row></sheetData><hyperlinks><hyperlink ref="J2" location="Sheet1!A1"/></hyperlinks>"#,
            )
            .build();
        let doc = XlsxReader::read_bytes(bytes).unwrap();
        let value = doc.workbook().worksheet(0).unwrap().get_value("J2").unwrap();

        assert!(value.as_hyperlink().is_none());
        assert_eq!(
            value.as_rich_text().map(|rt| rt.to_plain_string()).as_deref(),
            Some("<b>site")
        );
    }

    #[test]
    fn test_sheet_names_are_taken_as_stored() {
        let long_name = "Başvuru Listesi 2024 Ocak - Aralık Dönemi";
        let bytes = PackageBuilder::new()
            .sheet(long_name, "<sheetData/>")
            .sheet("veri[1]", "<sheetData/>")
            .build();
        let doc = XlsxReader::read_bytes(bytes).unwrap();

        assert_eq!(doc.workbook().worksheet(0).unwrap().name(), long_name);
        assert_eq!(doc.workbook().worksheet(1).unwrap().name(), "veri[1]");
    }

    #[test]
    fn test_rejects_legacy_xls() {
        let mut bytes = crate::package::OLE_SIGNATURE.to_vec();
        bytes.extend_from_slice(&[0; 504]);
        assert!(matches!(
            XlsxReader::read_bytes(bytes),
            Err(XlsxError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_rejects_zip_without_content_types() {
        let bytes = PackageBuilder::new()
            .sheet("Sheet1", "<sheetData/>")
            .without_content_types()
            .build();
        assert!(matches!(
            XlsxReader::read_bytes(bytes),
            Err(XlsxError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_read_from_reader() {
        let bytes = PackageBuilder::new().sheet("Sheet1", "<sheetData/>").build();
        let doc = XlsxReader::read(bytes.as_slice()).unwrap();
        assert_eq!(doc.source_bytes(), bytes.as_slice());
    }
}
