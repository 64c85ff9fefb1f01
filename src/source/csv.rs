use crate::error::MapperError;
use crate::source::HeaderIndex;
use crate::source::RawRow;
use crate::source::RowSource;
use std::io::BufRead;
use tracing::debug;

const SEPARATOR: char = ',';
const QUOTES: char = '"';
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Row source over comma-separated UTF-8 text.
///
/// Quotes toggle a quoted section and are dropped from the output; there is no
/// doubled-quote escape. Lines holding only separators and whitespace are skipped.
pub struct CsvRowSource<R: BufRead> {
    reader: Option<R>,
    header_index: HeaderIndex,
    line: String,
    first_line: bool,
}

impl<R: BufRead> CsvRowSource<R> {
    /// Wraps `reader` and consumes the header row.
    pub fn new(reader: R) -> Result<Self, MapperError> {
        let mut source = CsvRowSource {
            reader: Some(reader),
            header_index: HeaderIndex::default(),
            line: String::new(),
            first_line: true,
        };
        let header = source.read_row()?;
        source.header_index = HeaderIndex::from_row(header.as_ref());
        Ok(source)
    }

    /// Reads the next non-blank line and splits it, `None` at end of input.
    fn read_row(&mut self) -> Result<Option<RawRow>, MapperError> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        loop {
            self.line.clear();
            if reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            let mut line = self.line.strip_suffix('\n').unwrap_or(&self.line);
            line = line.strip_suffix('\r').unwrap_or(line);
            if self.first_line {
                self.first_line = false;
                line = line.strip_prefix(BYTE_ORDER_MARK).unwrap_or(line);
            }
            if !is_blank(line) {
                let fields = split_line(line);
                return Ok(Some(fields.into_iter().enumerate().collect()));
            }
        }
    }
}

impl<R: BufRead> Iterator for CsvRowSource<R> {
    type Item = Result<RawRow, MapperError>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.read_row().transpose();
        if let Some(Err(_)) = &result {
            self.close();
        }
        result
    }
}

impl<R: BufRead> RowSource for CsvRowSource<R> {
    fn header_index(&self) -> &HeaderIndex {
        &self.header_index
    }

    fn close(&mut self) {
        if self.reader.take().is_some() {
            debug!("csv row source closed");
        }
    }
}

/// Splits one line into fields.
///
/// A separator inside quotes is kept as text. When the line ends inside quotes,
/// the last field is prefixed with one quote character.
pub fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut inside_quotes = false;
    for c in line.chars() {
        match c {
            SEPARATOR if !inside_quotes => fields.push(std::mem::take(&mut field)),
            QUOTES => inside_quotes = !inside_quotes,
            _ => field.push(c),
        }
    }
    if inside_quotes {
        field.insert(0, QUOTES);
    }
    fields.push(field);
    fields
}

fn is_blank(line: &str) -> bool {
    line.chars().all(|c| c == SEPARATOR || c.is_whitespace())
}
