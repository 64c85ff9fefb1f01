use thiserror::Error;

/// Main error type for the mapper.
/// Aggregates errors from the standard library, dependencies and internal modules.
#[derive(Error, Debug)]
pub enum MapperError {
    #[error("Unsupported file type '{0}'")]
    UnsupportedFileType(String),

    #[error("Invalid file format: {0}")]
    FileFormatError(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Invalid sheet selector: {0}")]
    InvalidSheetSelector(String),

    #[error("Invalid addressing of field '{field}': {message}")]
    InvalidFieldAddressing { field: String, message: String },

    #[error("Unsupported adapter field '{field}': {source}")]
    UnsupportedAdapterField {
        field: String,
        #[source]
        source: crate::adapter::AdapterError,
    },

    #[error("Conversion of field '{field}' failed: {source}")]
    ConversionFailure {
        field: String,
        #[source]
        source: crate::adapter::AdapterError,
    },

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),
}

impl MapperError {
    /// Returns true when the error describes a damaged or unreadable document
    /// rather than a configuration mistake.
    pub fn is_file_format_error(&self) -> bool {
        matches!(
            self,
            MapperError::FileFormatError(_)
                | MapperError::ZipError(_)
                | MapperError::XmlError(_)
                | MapperError::XmlEncodingError(_)
                | MapperError::XmlAttributeError(_)
                | MapperError::XmlHelperError(_)
                | MapperError::ParseIntError(_)
        )
    }

    /// Returns true for errors raised by an invalid mapping configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            MapperError::InvalidSheetSelector(_)
                | MapperError::InvalidFieldAddressing { .. }
                | MapperError::UnsupportedAdapterField { .. }
        )
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, MapperError> {
    /// Rewrites document errors into a `FileFormatError` naming the part being read.
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|error| {
            if error.is_file_format_error() {
                MapperError::FileFormatError(format!("{}: {}", message, error))
            } else {
                error
            }
        })
    }
}
