//! # Row Sources
//!
//! Streams tabular documents into sparse rows of raw cell text. Every source reads
//! its first row as the header while it is being constructed, so the
//! [`HeaderIndex`] is available before iteration starts and the header row is
//! never yielded as data.
//!
//! Delimited text is read by [`CsvRowSource`], spreadsheet packages by
//! [`XlsxRowSource`]; [`open_row_source`] picks one from a path.

mod csv;
mod excel;
pub mod number_format;
pub mod reference;
mod selector;
mod xlsx;

pub use self::csv::CsvRowSource;
pub use self::selector::SheetSelector;
pub use self::xlsx::XlsxRowSource;

use crate::error::MapperError;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::path::Path;
use tracing::debug;
use tracing::warn;

/// One row of a document: column index to non-empty cell text, in column order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRow(BTreeMap<usize, String>);

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the text at `column`, `None` for empty or missing cells.
    pub fn get(&self, column: usize) -> Option<&str> {
        self.0.get(&column).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.0.iter().map(|(column, value)| (*column, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stores a cell unless its text is empty.
    /// Returns `false` when the column already holds a value, which is left untouched.
    pub(crate) fn insert(&mut self, column: usize, value: String) -> bool {
        if value.is_empty() {
            return true;
        }
        match self.0.entry(column) {
            btree_map::Entry::Vacant(entry) => {
                entry.insert(value);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }
}

impl<S: Into<String>> FromIterator<(usize, S)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (usize, S)>>(iter: I) -> Self {
        let cells = iter
            .into_iter()
            .map(|(column, value)| (column, value.into()))
            .filter(|(_, value)| !value.is_empty())
            .collect();
        RawRow(cells)
    }
}

/// Header name to column index, built from the first row of a document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderIndex(HashMap<String, usize>);

impl HeaderIndex {
    /// Builds the index from the header row; an absent row gives an empty index.
    /// When a name repeats, the lowest column wins.
    pub fn from_row(row: Option<&RawRow>) -> Self {
        let mut headers = HashMap::new();
        for (column, name) in row.into_iter().flat_map(RawRow::iter) {
            if let Some(first) = headers.get(name) {
                warn!(header = name, first = *first, duplicate = column, "duplicate header name, keeping the first column");
            } else {
                headers.insert(name.to_owned(), column);
            }
        }
        HeaderIndex(headers)
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A lazy, single-pass sequence of data rows.
///
/// Implementations read the header row on construction. After [`close`](RowSource::close)
/// the iterator yields nothing and the underlying reader is released.
pub trait RowSource: Iterator<Item = Result<RawRow, MapperError>> {
    fn header_index(&self) -> &HeaderIndex;

    fn close(&mut self);
}

/// Document formats a row source can be opened for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xlsm,
}

impl FileFormat {
    /// Parses a file extension, ignoring case.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            "xlsm" => Some(Self::Xlsm),
            _ => None,
        }
    }

    /// Infers the format from the extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self, MapperError> {
        path.extension()
            .and_then(OsStr::to_str)
            .and_then(Self::from_extension)
            .ok_or_else(|| MapperError::UnsupportedFileType(path.display().to_string()))
    }

    fn is_spreadsheet(self) -> bool {
        matches!(self, Self::Xlsx | Self::Xlsm)
    }
}

/// Opens a row source for the document at `path`.
///
/// The format is taken from `format` when given, otherwise from the extension.
/// The sheet selector applies to spreadsheets only and is ignored for CSV.
pub fn open_row_source(
    path: impl AsRef<Path>,
    format: Option<FileFormat>,
    sheet: Option<&SheetSelector>,
) -> Result<Box<dyn RowSource>, MapperError> {
    let path = path.as_ref();
    let format = match format {
        Some(format) => format,
        None => FileFormat::from_path(path)?,
    };
    debug!(path = %path.display(), ?format, "opening row source");
    let file = File::open(path)?;
    row_source_from_reader(file, format, sheet)
}

/// Opens a row source over any seekable stream in the given format.
pub fn row_source_from_reader<R: Read + Seek + 'static>(
    reader: R,
    format: FileFormat,
    sheet: Option<&SheetSelector>,
) -> Result<Box<dyn RowSource>, MapperError> {
    if format.is_spreadsheet() {
        Ok(Box::new(XlsxRowSource::new(reader, sheet)?))
    } else {
        if let Some(sheet) = sheet {
            warn!(%sheet, "sheet selector is ignored for csv documents");
        }
        Ok(Box::new(CsvRowSource::new(BufReader::new(reader))?))
    }
}
