#![allow(dead_code)]

use std::io::Cursor;
use std::io::Write;
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

/// Cell style 1 is the built-in date format, style 2 a custom one.
const STYLES: &str = r#"<styleSheet><cellXfs count="3"><xf numFmtId="0"/><xf numFmtId="14"/><xf numFmtId="170"/></cellXfs></styleSheet>"#;

/// One spreadsheet cell used to build worksheet xml.
pub enum Cell<'a> {
    Text(&'a str),
    Number(&'a str),
    Date(&'a str),
}

/// Builds a `<row>` whose first cell sits at `first_column` (zero-based) of row `row` (one-based).
pub fn row(row: usize, first_column: usize, cells: &[Cell]) -> String {
    let mut xml = format!(r#"<row r="{}">"#, row);
    for (offset, cell) in cells.iter().enumerate() {
        let reference = format!("{}{}", column_name(first_column + offset), row);
        match cell {
            Cell::Text(text) => {
                xml.push_str(&format!(r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#, reference, text))
            }
            Cell::Number(number) => xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, number)),
            Cell::Date(serial) => xml.push_str(&format!(r#"<c r="{}" s="1"><v>{}</v></c>"#, reference, serial)),
        }
    }
    xml.push_str("</row>");
    xml
}

fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8(name).unwrap()
}

/// Builds an xlsx package in memory from `(sheet name, sheetData xml)` pairs.
pub fn xlsx_bytes(sheets: &[(&str, String)], date1904: bool) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut relationships = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    let mut workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook><workbookPr date1904="{}"/><sheets>"#,
        if date1904 { 1 } else { 0 }
    );
    for (index, (name, data)) in sheets.iter().enumerate() {
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{0}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{0}.xml"/>"#,
            index + 1
        ));
        workbook.push_str(&format!(r#"<sheet name="{}" sheetId="{1}" r:id="rId{1}"/>"#, name, index + 1));
        writer.start_file(format!("xl/worksheets/sheet{}.xml", index + 1), options).unwrap();
        write!(writer, "<worksheet><sheetData>{}</sheetData></worksheet>", data).unwrap();
    }
    relationships.push_str("</Relationships>");
    workbook.push_str("</sheets></workbook>");
    for (name, content) in [
        ("xl/_rels/workbook.xml.rels", relationships.as_str()),
        ("xl/workbook.xml", workbook.as_str()),
        ("xl/styles.xml", STYLES),
    ] {
        writer.start_file(name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Writes an xlsx package to a temporary `.xlsx` file.
pub fn xlsx_file(sheets: &[(&str, String)]) -> NamedTempFile {
    write_temp(".xlsx", &xlsx_bytes(sheets, false))
}

/// Writes delimited text to a temporary `.csv` file.
pub fn csv_file(text: &str) -> NamedTempFile {
    write_temp(".csv", text.as_bytes())
}

pub fn write_temp(suffix: &str, bytes: &[u8]) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}
