//! ZIP archive helper utilities for the spreadsheet package.
//! Provides lookup of package parts and an owned streaming reader for one part.

use crate::error::MapperError;
use crate::helpers::xml::XmlReader;
use flate2::read::DeflateDecoder;
use flate2::Crc;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Take;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::CompressionMethod;
use zip::ZipArchive;

/// Helper trait for ZIP archive operations with specialized reader creation
pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// Gets a file from the ZIP archive by name (case-insensitive, path separator agnostic)
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, MapperError>;

    /// Creates an XML reader for a file within the ZIP archive
    fn xml_reader(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, MapperError>;
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, MapperError> {
        let pattern = name.replace('\\', "/");
        let path = self
            .file_names()
            .find(|file_name| pattern.eq_ignore_ascii_case(file_name))
            .map(|file_name| file_name.to_owned());
        match path.map(|file_name| self.by_name(&file_name)).transpose() {
            Ok(Some(file)) => Ok(Some(file)),
            Ok(None) | Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn xml_reader(
        &'_ mut self,
        name: &str,
    ) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, MapperError> {
        let reader = self
            .file(name)?
            .map(|file| XmlReader::new(BufReader::new(file)));
        Ok(reader)
    }
}

enum EntryData<R: Read> {
    Stored(Take<R>),
    Deflated(DeflateDecoder<Take<R>>),
}

/// A package part read straight from the underlying stream.
///
/// Unlike [`ZipFile`], it owns the stream, so a row source can keep it open
/// between calls without borrowing the archive. The checksum recorded in the
/// archive is compared once the part's data is exhausted.
pub(crate) struct ZipEntryReader<R: Read> {
    name: String,
    data: EntryData<R>,
    crc: Crc,
    expected_crc: u32,
    verified: bool,
}

impl<R: Read> Read for ZipEntryReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let count = match &mut self.data {
            EntryData::Stored(reader) => reader.read(buf)?,
            EntryData::Deflated(reader) => reader.read(buf)?,
        };
        self.crc.update(&buf[..count]);
        if count == 0 && !buf.is_empty() && !self.verified {
            self.verified = true;
            if self.crc.sum() != self.expected_crc {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!(
                        "package part '{}' fails its checksum: expected {:#010x}, got {:#010x}",
                        self.name,
                        self.expected_crc,
                        self.crc.sum()
                    ),
                ));
            }
        }
        Ok(count)
    }
}

/// Consumes the archive and positions its stream on the data of `name`.
pub(crate) fn into_entry_reader<R: Read + Seek>(
    mut zip: ZipArchive<R>,
    name: &str,
) -> Result<ZipEntryReader<R>, MapperError> {
    let (start, size, method, expected_crc) = {
        let file = zip
            .file(name)?
            .ok_or_else(|| MapperError::FileFormatError(format!("missing package part '{}'", name)))?;
        if file.encrypted() {
            Err(MapperError::FileFormatError(format!("package part '{}' is encrypted", name)))?
        }
        (file.data_start(), file.compressed_size(), file.compression(), file.crc32())
    };

    let mut stream = zip.into_inner();
    stream.seek(SeekFrom::Start(start))?;
    let stream = stream.take(size);
    let data = match method {
        CompressionMethod::Stored => EntryData::Stored(stream),
        CompressionMethod::Deflated => EntryData::Deflated(DeflateDecoder::new(stream)),
        other => {
            return Err(MapperError::FileFormatError(format!(
                "package part '{}' uses unsupported compression {:?}",
                name, other
            )))
        }
    };
    Ok(ZipEntryReader {
        name: name.to_owned(),
        data,
        crc: Crc::new(),
        expected_crc,
        verified: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn archive(method: CompressionMethod) -> ZipArchive<Cursor<Vec<u8>>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(method);
        writer.start_file("xl/first.xml", options).unwrap();
        writer.write_all(b"<a>first</a>").unwrap();
        writer.start_file("xl/Second.xml", options).unwrap();
        writer.write_all("<b>second part with some text</b>".repeat(64).as_bytes()).unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        ZipArchive::new(Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn file_lookup_ignores_case_and_separators() {
        let mut zip = archive(CompressionMethod::Deflated);
        assert!(zip.file("XL\\FIRST.xml").unwrap().is_some());
        assert!(zip.file("xl/second.xml").unwrap().is_some());
        assert!(zip.file("xl/missing.xml").unwrap().is_none());
    }

    #[test]
    fn entry_reader_streams_stored_and_deflated_parts() {
        for method in [CompressionMethod::Stored, CompressionMethod::Deflated] {
            let mut reader = into_entry_reader(archive(method), "xl/second.xml").unwrap();
            let mut text = String::new();
            reader.read_to_string(&mut text).unwrap();
            assert_eq!(text, "<b>second part with some text</b>".repeat(64));
        }
    }

    #[test]
    fn entry_reader_reports_missing_part() {
        let result = into_entry_reader(archive(CompressionMethod::Stored), "xl/nothing.xml");
        assert!(matches!(result, Err(MapperError::FileFormatError(_))));
    }

    #[test]
    fn entry_reader_rejects_parts_that_fail_their_checksum() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file("xl/sheet.xml", options).unwrap();
        writer.write_all(b"<row>intact</row>").unwrap();
        let mut bytes = writer.finish().unwrap().into_inner();
        let at = bytes.windows(6).position(|window| window == b"intact").unwrap();
        bytes[at..at + 6].copy_from_slice(b"broken");

        let zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut reader = into_entry_reader(zip, "xl/sheet.xml").unwrap();
        let mut text = String::new();
        let error = reader.read_to_string(&mut text).unwrap_err();
        assert_eq!(error.kind(), std::io::ErrorKind::InvalidData);
        assert!(error.to_string().contains("xl/sheet.xml"));
    }
}
