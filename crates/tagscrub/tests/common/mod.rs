//! Builds small but realistic XLSX packages in memory

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

pub const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="1"><fill><patternFill patternType="none"/></fill></fills><borders count="1"><border/></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs></styleSheet>"#;

pub struct Sheet {
    pub name: String,
    pub body: String,
    pub rels: Option<String>,
}

/// One worksheet; `rows` is the content of `<sheetData>`
pub fn sheet(name: &str, rows: &str) -> Sheet {
    Sheet {
        name: name.to_string(),
        body: format!("<sheetData>{rows}</sheetData>"),
        rels: None,
    }
}

impl Sheet {
    /// Extra elements after `<sheetData>`, e.g. `<hyperlinks>`
    pub fn with_tail(mut self, tail: &str) -> Self {
        self.body.push_str(tail);
        self
    }

    pub fn with_rels(mut self, rels: &str) -> Self {
        self.rels = Some(rels.to_string());
        self
    }
}

/// Inline string cell
pub fn inline(addr: &str, text: &str) -> String {
    format!(r#"<c r="{addr}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#, escape(text))
}

/// Shared string cell
pub fn shared(addr: &str, index: usize) -> String {
    format!(r#"<c r="{addr}" t="s"><v>{index}</v></c>"#)
}

pub fn number(addr: &str, n: f64) -> String {
    format!(r#"<c r="{addr}"><v>{n}</v></c>"#)
}

pub fn row(r: u32, cells: &[String]) -> String {
    format!(r#"<row r="{r}">{}</row>"#, cells.concat())
}

/// Assemble a package. `shared_strings` of `None` leaves the table out.
pub fn package(sheets: &[Sheet], shared_strings: Option<&[&str]>) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    let mut put = |name: &str, content: &str| {
        zip.start_file(name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    };

    let sheet_overrides: String = (1..=sheets.len())
        .map(|n| format!(r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#))
        .collect();
    put(
        "[Content_Types].xml",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>{sheet_overrides}<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/></Types>"#
        ),
    );
    put(
        "_rels/.rels",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{PKG_REL_NS}"><Relationship Id="rId1" Type="{REL_NS}/officeDocument" Target="xl/workbook.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/></Relationships>"#
        ),
    );
    put(
        "docProps/app.xml",
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>Microsoft Excel</Application></Properties>"#,
    );

    let entries: String = sheets
        .iter()
        .enumerate()
        .map(|(i, s)| format!(r#"<sheet name="{}" sheetId="{n}" r:id="rId{n}"/>"#, escape(&s.name), n = i + 1))
        .collect();
    put(
        "xl/workbook.xml",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheets>{entries}</sheets></workbook>"#
        ),
    );

    let mut rels: String = (1..=sheets.len())
        .map(|n| format!(r#"<Relationship Id="rId{n}" Type="{REL_NS}/worksheet" Target="worksheets/sheet{n}.xml"/>"#))
        .collect();
    rels.push_str(&format!(
        r#"<Relationship Id="rIdStyles" Type="{REL_NS}/styles" Target="styles.xml"/>"#
    ));
    if shared_strings.is_some() {
        rels.push_str(&format!(
            r#"<Relationship Id="rIdSst" Type="{REL_NS}/sharedStrings" Target="sharedStrings.xml"/>"#
        ));
    }
    put(
        "xl/_rels/workbook.xml.rels",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{PKG_REL_NS}">{rels}</Relationships>"#
        ),
    );
    put("xl/styles.xml", STYLES_XML);

    for (i, s) in sheets.iter().enumerate() {
        let n = i + 1;
        put(
            &format!("xl/worksheets/sheet{n}.xml"),
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheetViews><sheetView workbookViewId="0"/></sheetViews>{}<pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/></worksheet>"#,
                s.body
            ),
        );
        if let Some(rels) = &s.rels {
            put(
                &format!("xl/worksheets/_rels/sheet{n}.xml.rels"),
                &format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{PKG_REL_NS}">{rels}</Relationships>"#
                ),
            );
        }
    }

    if let Some(items) = shared_strings {
        let body: String = items
            .iter()
            .map(|s| format!(r#"<si><t xml:space="preserve">{}</t></si>"#, escape(s)))
            .collect();
        put(
            "xl/sharedStrings.xml",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="{MAIN_NS}" count="{n}" uniqueCount="{n}">{body}</sst>"#,
                n = items.len()
            ),
        );
    }

    zip.finish().unwrap();
    buf
}

/// Name and raw (still compressed) bytes of every entry, in archive order
pub fn raw_entries(package: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(package)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index_raw(i).unwrap();
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes).unwrap();
            (file.name().to_string(), bytes)
        })
        .collect()
}

/// Decompressed text of one part
pub fn part_text(package: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(package)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut out = String::new();
    file.read_to_string(&mut out).unwrap();
    out
}

pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Copy of `package` with one part's content swapped out
pub fn replace_part(package: &[u8], name: &str, content: &str) -> Vec<u8> {
    rebuild(package, |entry| (entry == name).then(|| Some(content.as_bytes().to_vec())))
}

/// Copy of `package` without one part
pub fn remove_part(package: &[u8], name: &str) -> Vec<u8> {
    rebuild(package, |entry| (entry == name).then_some(None))
}

/// `change` returns `None` to keep an entry, `Some(None)` to drop it and
/// `Some(Some(bytes))` to replace it
fn rebuild(package: &[u8], change: impl Fn(&str) -> Option<Option<Vec<u8>>>) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(package)).unwrap();
    let mut buf = Vec::new();
    let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let file = archive.by_index_raw(i).unwrap();
        let name = file.name().to_string();
        match change(&name) {
            None => zip.raw_copy_file(file).unwrap(),
            Some(None) => {}
            Some(Some(bytes)) => {
                drop(file);
                zip.start_file(name.as_str(), options).unwrap();
                zip.write_all(&bytes).unwrap();
            }
        }
    }
    zip.finish().unwrap();
    buf
}
