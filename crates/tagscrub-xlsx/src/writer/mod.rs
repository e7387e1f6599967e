//! XLSX writer
//!
//! Writing is a patch over the package the document was read from: parts
//! that hold no edited cell are copied as raw compressed entries, so anything
//! this crate does not model (styles, drawings, pivot caches, macros...)
//! survives untouched.

pub(crate) mod shared_strings;
pub(crate) mod sheet_patch;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

use crate::document::XlsxDocument;
use crate::error::{XlsxError, XlsxResult};
use crate::escape::encode_excel_escapes;
use crate::package::read_required_part;
use self::shared_strings::SharedStringTable;
use self::sheet_patch::patch_worksheet_xml;

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a document to a file path
    pub fn write_file<P: AsRef<Path>>(doc: &XlsxDocument, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(doc, BufWriter::new(file))
    }

    /// Serialise a document into memory
    pub fn write_to_vec(doc: &XlsxDocument) -> XlsxResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(doc.source.len());
        Self::write(doc, Cursor::new(&mut buf))?;
        Ok(buf)
    }

    /// Write a document to a writer.
    ///
    /// With no edited cell the original bytes are written back unchanged.
    pub fn write<W: Write + Seek>(doc: &XlsxDocument, mut writer: W) -> XlsxResult<()> {
        if !doc.workbook.has_edits() {
            writer.write_all(&doc.source)?;
            writer.flush()?;
            return Ok(());
        }

        let mut archive = zip::ZipArchive::new(Cursor::new(doc.source.as_slice()))?;
        let replaced = Self::patched_parts(doc, &mut archive)?;

        let mut zip = zip::ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for i in 0..archive.len() {
            let file = archive.by_index_raw(i)?;
            let name = file.name().to_string();
            match replaced.get(&name) {
                Some(bytes) => {
                    drop(file);
                    zip.start_file(name.as_str(), options)?;
                    zip.write_all(bytes)?;
                }
                None => zip.raw_copy_file(file)?,
            }
        }

        zip.finish()?.flush()?;
        Ok(())
    }

    /// New content for every part that has to change, keyed by part name
    fn patched_parts(
        doc: &XlsxDocument,
        archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    ) -> XlsxResult<HashMap<String, Vec<u8>>> {
        let mut parts = HashMap::new();
        let mut strings =
            SharedStringTable::new(&doc.shared_strings, doc.shared_strings_part.is_some());

        for (idx, sheet) in doc.workbook.worksheets().enumerate() {
            if !sheet.has_edits() {
                continue;
            }
            let part = doc.sheet_parts.get(idx).ok_or_else(|| {
                XlsxError::MissingPart(format!("worksheet part for '{}'", sheet.name()))
            })?;
            let xml = read_required_part(archive, part)?;
            let patched = patch_worksheet_xml(&xml, sheet, &mut strings)?;
            log::debug!(
                "patched {} cells in {part}",
                sheet.edited_cells().count()
            );
            parts.insert(part.clone(), patched);
        }

        if let (true, Some(part)) = (strings.is_dirty(), &doc.shared_strings_part) {
            let xml = read_required_part(archive, part)?;
            log::debug!(
                "appending {} entries to {part}",
                strings.appended().len()
            );
            parts.insert(part.clone(), strings.patch_xml(&xml)?);
        }

        Ok(parts)
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// `<t>` element for cell text, preserving edge whitespace
fn text_element(prefix: &str, text: &str) -> String {
    let body = escape_xml(&encode_excel_escapes(text));
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        format!("<{prefix}t xml:space=\"preserve\">{body}</{prefix}t>")
    } else {
        format!("<{prefix}t>{body}</{prefix}t>")
    }
}
