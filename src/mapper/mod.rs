//! # Record Mapper
//!
//! Binds a [`RowSource`] to a [`RecordShape`] and yields one typed record per
//! data row. A [`Mapping`] holds the validated shape and the adapter registry;
//! it is immutable and can open any number of independent [`RecordMapper`]s.
//!
//! Every configuration problem (conflicting addressing, malformed references,
//! unknown custom adapters, unsupported target types) is reported when the
//! `Mapping` is built, before a document is opened.

mod field;
mod shape;

pub use self::field::Addressing;
pub use self::field::FieldDescriptor;
pub use self::shape::MapRecord;
pub use self::shape::RecordShape;
pub use self::shape::RecordShapeBuilder;

use crate::adapter::AdapterError;
use crate::adapter::AdapterRegistry;
use crate::error::MapperError;
use crate::source::open_row_source;
use crate::source::row_source_from_reader;
use crate::source::FileFormat;
use crate::source::HeaderIndex;
use crate::source::RawRow;
use crate::source::RowSource;
use std::any::type_name;
use std::fmt;
use std::io::Read;
use std::io::Seek;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use tracing::info;
use tracing::warn;

/// A validated record shape plus the adapters used to fill it.
pub struct Mapping<T> {
    shape: Arc<RecordShape>,
    registry: Arc<AdapterRegistry>,
    record: PhantomData<fn() -> T>,
}

impl<T: MapRecord> Mapping<T> {
    /// Builds a mapping for `T` with the built-in adapters only.
    pub fn new() -> Result<Self, MapperError> {
        Self::with_registry(AdapterRegistry::new())
    }

    /// Builds a mapping for `T` using `registry` for custom adapters.
    pub fn with_registry(registry: AdapterRegistry) -> Result<Self, MapperError> {
        Self::from_parts(T::shape()?, Arc::new(registry))
    }

    /// Builds a mapping from an explicit shape, sharing `registry` with other mappings.
    pub fn from_parts(shape: RecordShape, registry: Arc<AdapterRegistry>) -> Result<Self, MapperError> {
        for field in shape.fields() {
            registry
                .validate(field.target(), field.custom_adapter())
                .map_err(|source| MapperError::UnsupportedAdapterField {
                    field: field.name().to_owned(),
                    source,
                })?;
        }
        Ok(Mapping {
            shape: Arc::new(shape),
            registry,
            record: PhantomData,
        })
    }

    pub fn shape(&self) -> &RecordShape {
        &self.shape
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Opens the document at `path`, choosing the format from its extension.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<RecordMapper<T>, MapperError> {
        let path = path.as_ref();
        info!(path = %path.display(), record = type_name::<T>(), "mapping document");
        Ok(self.map(open_row_source(path, None, self.shape.sheet())?))
    }

    /// Opens the document at `path` in the given format, whatever its extension.
    pub fn open_with_format(&self, path: impl AsRef<Path>, format: FileFormat) -> Result<RecordMapper<T>, MapperError> {
        let path = path.as_ref();
        info!(path = %path.display(), ?format, record = type_name::<T>(), "mapping document");
        Ok(self.map(open_row_source(path, Some(format), self.shape.sheet())?))
    }

    /// Maps a document read from any seekable stream.
    pub fn open_reader<R: Read + Seek + 'static>(&self, reader: R, format: FileFormat) -> Result<RecordMapper<T>, MapperError> {
        info!(?format, record = type_name::<T>(), "mapping stream");
        Ok(self.map(row_source_from_reader(reader, format, self.shape.sheet())?))
    }

    /// Maps the rows of an already opened source. The source's sheet, if any,
    /// is whatever it was opened with.
    pub fn map(&self, source: Box<dyn RowSource>) -> RecordMapper<T> {
        let columns = self
            .shape
            .bound_fields()
            .iter()
            .map(|field| {
                let column = field.addressing.column(source.header_index());
                if let (None, Some(header)) = (column, field.addressing.header_name()) {
                    warn!(field = field.descriptor.name(), header, "header not found, the field will stay unset");
                }
                column
            })
            .collect();
        RecordMapper {
            source,
            shape: self.shape.clone(),
            registry: self.registry.clone(),
            columns,
            row: 0,
            record: PhantomData,
        }
    }
}

impl<T> Clone for Mapping<T> {
    fn clone(&self) -> Self {
        Mapping {
            shape: self.shape.clone(),
            registry: self.registry.clone(),
            record: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Mapping<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("record", &type_name::<T>())
            .field("shape", &self.shape)
            .field("registry", &self.registry)
            .finish()
    }
}

/// Iterator of records mapped from a row source.
///
/// Column positions are resolved once against the header row. A suppressed
/// conversion failure leaves its field at the default value; a strict one
/// fails that record only. Unsupported fields and document errors end the
/// iteration.
pub struct RecordMapper<T> {
    source: Box<dyn RowSource>,
    shape: Arc<RecordShape>,
    registry: Arc<AdapterRegistry>,
    columns: Vec<Option<usize>>,
    row: usize,
    record: PhantomData<fn() -> T>,
}

impl<T: MapRecord> RecordMapper<T> {
    pub fn header_index(&self) -> &HeaderIndex {
        self.source.header_index()
    }

    /// Closes the underlying row source. Further calls to `next` return `None`.
    pub fn close(&mut self) {
        debug!(rows = self.row, record = type_name::<T>(), "closing record mapper");
        self.source.close();
    }

    fn map_row(&self, row: &RawRow) -> Result<T, MapperError> {
        let mut record = T::default();
        for (field, column) in self.shape.bound_fields().iter().zip(&self.columns) {
            let descriptor = &field.descriptor;
            let raw = column.and_then(|column| row.get(column));
            let assigned = self
                .registry
                .convert(descriptor.target(), raw, descriptor.custom_adapter())
                .and_then(|value| {
                    if value.is_absent() {
                        Ok(())
                    } else {
                        record.set_field(descriptor.name(), value)
                    }
                });
            if let Err(error) = assigned {
                self.handle_failure(descriptor, raw, error)?;
            }
        }
        Ok(record)
    }

    fn handle_failure(&self, descriptor: &FieldDescriptor, raw: Option<&str>, error: AdapterError) -> Result<(), MapperError> {
        let field = descriptor.name().to_owned();
        if error.is_unsupported() {
            return Err(MapperError::UnsupportedAdapterField { field, source: error });
        }
        if !descriptor.is_suppressed() {
            return Err(MapperError::ConversionFailure { field, source: error });
        }
        warn!(
            row = self.row,
            field = descriptor.name(),
            value = raw.unwrap_or_default(),
            %error,
            "unable to convert field, leaving it unset"
        );
        Ok(())
    }
}

impl<T: MapRecord> Iterator for RecordMapper<T> {
    type Item = Result<T, MapperError>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.source.next()? {
            Ok(row) => row,
            Err(error) => return Some(Err(error)),
        };
        self.row += 1;
        let record = self.map_row(&row);
        if let Err(error) = &record {
            if error.is_configuration_error() {
                self.close();
            }
        }
        Some(record)
    }
}

impl<T> fmt::Debug for RecordMapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordMapper")
            .field("record", &type_name::<T>())
            .field("columns", &self.columns)
            .field("row", &self.row)
            .finish()
    }
}
