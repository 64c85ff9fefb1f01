use crate::error::MapperError;
use crate::error::ResultMessage;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::zip::into_entry_reader;
use crate::helpers::zip::ZipEntryReader;
use crate::match_xml_events;
use crate::source::excel;
use crate::source::excel::read_string_value;
use crate::source::number_format::format_serial;
use crate::source::number_format::DateShape;
use crate::source::reference::column_index;
use crate::source::reference::column_name;
use crate::source::HeaderIndex;
use crate::source::RawRow;
use crate::source::RowSource;
use crate::source::SheetSelector;
use quick_xml::events::Event;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use tracing::debug;
use tracing::warn;
use zip::ZipArchive;

// XML tag names for streaming worksheet data
const TAG_SHEET_DATA: &[u8] = b"sheetData";   // Container of all rows
const TAG_ROW: &[u8] = b"row";                // Row in worksheet
const TAG_CELL: &[u8] = b"c";                 // Cell in worksheet
const TAG_INLINE_STRING: &[u8] = b"is";       // Inline string value
const TAG_VALUE: &[u8] = b"v";                // Cell value content

type SheetReader<R> = XmlReader<BufReader<ZipEntryReader<R>>>;

/// Cell value kinds given by the `t` attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellKind {
    Number,
    SharedString,
    InlineString,
    FormulaString,
    Boolean,
    IsoDate,
    Error,
}

impl CellKind {
    fn parse(kind: Option<&str>) -> Self {
        match kind {
            Some("s") => CellKind::SharedString,
            Some("inlineStr") => CellKind::InlineString,
            Some("str") => CellKind::FormulaString,
            Some("b") => CellKind::Boolean,
            Some("d") => CellKind::IsoDate,
            Some("e") => CellKind::Error,
            _ => CellKind::Number,
        }
    }
}

/// Row source over one worksheet of an XLSX/XLSM package.
///
/// Shared strings, cell styles and the sheet list are loaded on construction;
/// the worksheet itself is streamed. Date-formatted numeric cells are rendered
/// as ISO text, see [`DateShape`].
pub struct XlsxRowSource<R: Read + Seek> {
    reader: Option<SheetReader<R>>,
    shared_strings: Vec<String>,
    styles: Vec<Option<DateShape>>,
    is_1904: bool,
    header_index: HeaderIndex,
}

impl<R: Read + Seek> XlsxRowSource<R> {
    /// Opens the package, selects a worksheet (the first when `sheet` is `None`)
    /// and consumes its header row.
    pub fn new(reader: R, sheet: Option<&SheetSelector>) -> Result<Self, MapperError> {
        let mut zip = ZipArchive::new(reader)
            .map_err(MapperError::from)
            .with_prefix("Open spreadsheet package")?;
        let workbook = excel::load_workbook(&mut zip).with_prefix("Read workbook")?;
        let styles = excel::load_styles(&mut zip).with_prefix("Read styles")?;
        let shared_strings = excel::load_shared_strings(&mut zip).with_prefix("Read shared strings")?;

        let (sheet_name, path) = select_sheet(&workbook.sheets, sheet)?;
        debug!(sheet = %sheet_name, %path, shared_strings = shared_strings.len(), "streaming worksheet");
        let entry = into_entry_reader(zip, &path)?;

        let mut source = XlsxRowSource {
            reader: Some(XmlReader::new(BufReader::new(entry))),
            shared_strings,
            styles,
            is_1904: workbook.is_1904,
            header_index: HeaderIndex::default(),
        };
        let header = source.read_row().with_prefix("Read header row")?;
        source.header_index = HeaderIndex::from_row(header.as_ref());
        Ok(source)
    }

    /// Reads up to the next row holding at least one non-empty cell.
    /// `None` once `sheetData` is closed or the document ends.
    fn read_row(&mut self) -> Result<Option<RawRow>, MapperError> {
        let Self { reader, shared_strings, styles, is_1904, .. } = self;
        let Some(reader) = reader.as_mut() else {
            return Ok(None);
        };

        let mut row = RawRow::new();
        let mut next_column = 0usize;
        match_xml_events!(reader => {
            Event::Start(event) if event.local_name().as_ref() == TAG_CELL => {
                let reference = event.get_attribute_value("r")?.map(|r| r.into_owned());
                let kind = CellKind::parse(event.get_attribute_value("t")?.as_deref());
                let style = event.parse_attribute_value::<usize>("s")?;

                let column = match reference {
                    Some(reference) => column_index(&reference).ok_or_else(|| {
                        MapperError::FileFormatError(format!("invalid cell reference '{}'", reference))
                    })?,
                    None => next_column,
                };
                next_column = column + 1;

                let raw = read_cell_value(reader)?;
                if raw.is_empty() {
                    continue;
                }
                let value = match kind {
                    CellKind::SharedString => {
                        let index = raw.trim().parse::<usize>()?;
                        shared_strings.get(index).cloned().ok_or_else(|| {
                            MapperError::FileFormatError(format!("shared string {} does not exist", index))
                        })?
                    }
                    CellKind::Number => {
                        let shape = style.and_then(|style| styles.get(style).copied().flatten());
                        match shape {
                            Some(shape) => format_date_cell(shape, raw, *is_1904),
                            None => raw,
                        }
                    }
                    CellKind::InlineString
                    | CellKind::FormulaString
                    | CellKind::Boolean
                    | CellKind::IsoDate
                    | CellKind::Error => raw,
                };
                if !row.insert(column, value) {
                    Err(MapperError::FileFormatError(format!(
                        "column {} appears more than once in one row",
                        column_name(column)
                    )))?
                }
            }
            Event::End(event) if event.local_name().as_ref() == TAG_ROW => {
                if !row.is_empty() {
                    return Ok(Some(row));
                }
                next_column = 0;
            }
            Event::End(event) if event.local_name().as_ref() == TAG_SHEET_DATA => {
                return Ok(if row.is_empty() { None } else { Some(row) });
            }
        });
        Ok(if row.is_empty() { None } else { Some(row) })
    }
}

impl<R: Read + Seek> Iterator for XlsxRowSource<R> {
    type Item = Result<RawRow, MapperError>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.read_row().transpose();
        match &result {
            Some(Ok(_)) => (),
            Some(Err(_)) | None => self.close(),
        }
        result
    }
}

impl<R: Read + Seek> RowSource for XlsxRowSource<R> {
    fn header_index(&self) -> &HeaderIndex {
        &self.header_index
    }

    fn close(&mut self) {
        if self.reader.take().is_some() {
            debug!("xlsx row source closed");
        }
    }
}

/// Picks the worksheet named by the selector, or the first one.
fn select_sheet(sheets: &[(String, String)], selector: Option<&SheetSelector>) -> Result<(String, String), MapperError> {
    let found = match selector {
        None => sheets.first(),
        Some(selector) => sheets
            .iter()
            .enumerate()
            .find(|(position, (name, _))| selector.accept(*position, name))
            .map(|(_, sheet)| sheet),
    };
    found.cloned().ok_or_else(|| {
        MapperError::SheetNotFound(
            selector
                .map(ToString::to_string)
                .unwrap_or_else(|| "workbook has no sheets".to_owned()),
        )
    })
}

/// Reads the value of the current cell up to its end tag.
fn read_cell_value<B: std::io::BufRead>(reader: &mut XmlReader<B>) -> Result<String, MapperError> {
    let mut value = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.local_name().as_ref() == TAG_CELL => break,
        Event::Start(event) if event.local_name().as_ref() == TAG_VALUE => {
            value = read_string_value(reader, TAG_VALUE, true)?;
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_INLINE_STRING => {
            value = read_string_value(reader, TAG_INLINE_STRING, false)?;
        }
    });
    Ok(value)
}

/// Renders a date-formatted numeric cell, keeping the raw text when it is not a valid serial.
fn format_date_cell(shape: DateShape, raw: String, is_1904: bool) -> String {
    match raw.trim().parse::<f64>().ok().and_then(|serial| format_serial(shape, serial, is_1904)) {
        Some(text) => text,
        None => {
            warn!(value = %raw, ?shape, "cell is not a valid date serial, keeping its raw text");
            raw
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::CompressionMethod;
    use zip::ZipWriter;

    const STYLES: &str = r#"<styleSheet><cellXfs count="4"><xf numFmtId="0"/><xf numFmtId="14"/><xf numFmtId="22"/><xf numFmtId="165"/></cellXfs></styleSheet>"#;
    const SHARED_STRINGS: &str = r#"<sst><si><t>Name</t></si><si><t>Born</t></si><si><t>Ada</t></si></sst>"#;

    fn workbook(sheets: &[(&str, &str)]) -> Cursor<Vec<u8>> {
        let sheets: Vec<(&str, String)> = sheets
            .iter()
            .map(|(name, data)| (*name, format!("<worksheet><sheetData>{}</sheetData></worksheet>", data)))
            .collect();
        package(&sheets)
    }

    /// Builds a package from complete worksheet documents.
    fn package(sheets: &[(&str, String)]) -> Cursor<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut relationships = String::from("<Relationships>");
        let mut entries = String::from("<workbook><sheets>");
        for (index, (name, data)) in sheets.iter().enumerate() {
            relationships.push_str(&format!(
                r#"<Relationship Id="rId{0}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{0}.xml"/>"#,
                index + 1
            ));
            entries.push_str(&format!(r#"<sheet name="{}" sheetId="{1}" r:id="rId{1}"/>"#, name, index + 1));
            writer.start_file(format!("xl/worksheets/sheet{}.xml", index + 1), options).unwrap();
            writer.write_all(data.as_bytes()).unwrap();
        }
        relationships.push_str("</Relationships>");
        entries.push_str("</sheets></workbook>");
        for (name, content) in [
            ("xl/_rels/workbook.xml.rels", relationships.as_str()),
            ("xl/workbook.xml", entries.as_str()),
            ("xl/styles.xml", STYLES),
            ("xl/sharedStrings.xml", SHARED_STRINGS),
        ] {
            writer.start_file(name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        Cursor::new(writer.finish().unwrap().into_inner())
    }

    fn read_all(sheet: &str, selector: Option<&SheetSelector>) -> (HeaderIndex, Vec<RawRow>) {
        let source = XlsxRowSource::new(workbook(&[("Data", sheet)]), selector).unwrap();
        let headers = source.header_index().clone();
        (headers, source.collect::<Result<Vec<_>, _>>().unwrap())
    }

    #[test]
    fn resolves_shared_strings_and_dates() {
        let data = r#"
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
<row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2" s="1"><v>45000</v></c><c r="C2" s="2"><v>45000.5</v></c><c r="D2" s="3"><v>45000</v></c></row>"#;
        let (headers, rows) = read_all(data, None);
        assert_eq!(headers.get("Name"), Some(0));
        assert_eq!(headers.get("Born"), Some(1));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0), Some("Ada"));
        assert_eq!(rows[0].get(1), Some("2023-03-15"));
        assert_eq!(rows[0].get(2), Some("2023-03-15T12:00:00"));
        assert_eq!(rows[0].get(3), Some("45000"));
    }

    #[test]
    fn reads_inline_strings_and_other_kinds() {
        let data = r#"
<row><c t="inlineStr"><is><t>h1</t></is></c><c t="inlineStr"><is><t>h2</t></is></c><c t="inlineStr"><is><t>h3</t></is></c><c t="inlineStr"><is><t>h4</t></is></c></row>
<row><c t="b" s="1"><v>1</v></c><c t="str"><f>A1</f><v>text</v></c><c t="e"><v>#DIV/0!</v></c><c t="d"><v>2024-01-02</v></c></row>"#;
        let (headers, rows) = read_all(data, None);
        assert_eq!(headers.get("h3"), Some(2));
        assert_eq!(rows[0].iter().collect::<Vec<_>>(), vec![(0, "1"), (1, "text"), (2, "#DIV/0!"), (3, "2024-01-02")]);
    }

    #[test]
    fn offset_sheets_keep_column_positions_and_skip_empty_rows() {
        let data = r#"
<row r="3"><c r="C3" t="inlineStr"><is><t>Name</t></is></c><c r="D3" t="inlineStr"><is><t>Age</t></is></c></row>
<row r="4"><c r="C4"/><c r="D4"><v></v></c></row>
<row r="5"><c r="D5"><v>7</v></c></row>"#;
        let (headers, rows) = read_all(data, None);
        assert_eq!(headers.get("Name"), Some(2));
        assert_eq!(headers.get("Age"), Some(3));
        assert_eq!(rows, vec![vec![(3, "7")].into_iter().collect::<RawRow>()]);
    }

    #[test]
    fn duplicate_columns_in_a_row_are_rejected() {
        let data = r#"<row><c r="A1"><v>1</v></c></row><row><c r="B2"><v>1</v></c><c r="B2"><v>2</v></c></row>"#;
        let mut source = XlsxRowSource::new(workbook(&[("Data", data)]), None).unwrap();
        assert!(matches!(source.next(), Some(Err(MapperError::FileFormatError(_)))));
        assert!(source.next().is_none());
    }

    #[test]
    fn selects_sheets_by_index_or_name() {
        let first = r#"<row><c t="inlineStr"><is><t>first</t></is></c></row>"#;
        let second = r#"<row><c t="inlineStr"><is><t>second</t></is></c></row>"#;
        let sheets = [("One", first), ("Two", second)];

        let by_index = XlsxRowSource::new(workbook(&sheets), Some(&SheetSelector::Index(1))).unwrap();
        assert!(by_index.header_index().contains("second"));
        let by_name = XlsxRowSource::new(workbook(&sheets), Some(&SheetSelector::from("One"))).unwrap();
        assert!(by_name.header_index().contains("first"));
        let default = XlsxRowSource::new(workbook(&sheets), None).unwrap();
        assert!(default.header_index().contains("first"));

        for selector in [SheetSelector::Index(2), SheetSelector::from("two")] {
            assert!(matches!(
                XlsxRowSource::new(workbook(&sheets), Some(&selector)),
                Err(MapperError::SheetNotFound(_))
            ));
        }
    }

    #[test]
    fn reads_worksheets_with_namespace_prefixes() {
        let sheet = r#"<x:worksheet xmlns:x="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><x:sheetData>
<x:row r="1"><x:c r="A1" t="inlineStr"><x:is><x:t>Name</x:t></x:is></x:c><x:c r="B1" t="s"><x:v>1</x:v></x:c></x:row>
<x:row r="2"><x:c r="A2" t="inlineStr"><x:is><x:t>Ada</x:t></x:is></x:c><x:c r="B2" s="1"><x:v>45000</x:v></x:c></x:row>
</x:sheetData></x:worksheet>"#;
        let source = XlsxRowSource::new(package(&[("Data", sheet.to_owned())]), None).unwrap();
        assert_eq!(source.header_index().get("Name"), Some(0));
        assert_eq!(source.header_index().get("Born"), Some(1));
        let rows = source.collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(rows, vec![vec![(0, "Ada"), (1, "2023-03-15")].into_iter().collect::<RawRow>()]);
    }

    #[test]
    fn close_is_idempotent_and_ends_iteration_early() {
        let data = r#"
<row><c t="inlineStr"><is><t>n</t></is></c></row>
<row><c><v>1</v></c></row>
<row><c><v>2</v></c></row>
<row><c><v>3</v></c></row>"#;
        let mut source = XlsxRowSource::new(workbook(&[("Data", data)]), None).unwrap();
        assert_eq!(source.next().unwrap().unwrap().get(0), Some("1"));
        source.close();
        source.close();
        assert!(source.next().is_none());
        assert!(source.next().is_none());
        assert_eq!(source.header_index().get("n"), Some(0));
    }

    #[test]
    fn damaged_packages_are_format_errors() {
        let result = XlsxRowSource::new(Cursor::new(b"not a zip archive".to_vec()), None);
        assert!(matches!(result, Err(MapperError::FileFormatError(_))));
    }
}
