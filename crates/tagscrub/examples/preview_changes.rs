//! Example: show which cells a scrub would change, without writing anything
//!
//! ```text
//! cargo run -p tagscrub --example preview_changes -- başvurular.xlsx
//! ```

use tagscrub::{clean_text, extract_text, resolve_columns, ColumnRules, XlsxReader};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: preview_changes <file.xlsx>");
        std::process::exit(2);
    };

    let doc = XlsxReader::read_file(&path)?;
    let rules = ColumnRules::default();

    for sheet in doc.workbook().worksheets() {
        let columns = resolve_columns(sheet, &rules);
        println!(
            "{}: application column {} ({}), text column {} ({})",
            sheet.name(),
            columns.application.index,
            columns.application.origin,
            columns.text.index,
            columns.text.origin
        );

        for row in sheet.row_indices().filter(|&row| row >= rules.header_row) {
            for column in columns.targets() {
                let Some(col) = column.to_zero_based() else {
                    continue;
                };
                let Some(text) = sheet.value_at(row, col).and_then(extract_text) else {
                    continue;
                };
                let cleaned = clean_text(&text);
                if cleaned != text {
                    println!("  row {:>5} col {}: {:?} -> {:?}", row + 1, column.letters(), text, cleaned);
                }
            }
        }
    }
    Ok(())
}
