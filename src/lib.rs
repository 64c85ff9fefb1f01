//! # Rusty Mapper
//!
//! Streams CSV and XLSX documents row by row into strongly-typed records.
//!
//! ## Features
//!
//! - **Multi-format support**: Read comma-separated text (`.csv`) and Excel packages
//!   (`.xlsx`, `.xlsm`) from paths or any seekable stream
//! - **Streaming**: Worksheets are inflated and parsed on demand, one row at a time
//! - **Flexible addressing**: Bind fields by header name, column index or cell
//!   reference such as `"C3"`
//! - **Rich data types**: Text, booleans, integers, big integers, floats, decimals,
//!   dates, times, timestamps, instants, enums, patterns, arrays and collections
//! - **Date cells**: Built-in Excel date formats are rendered as ISO text in both the
//!   1900 and 1904 date systems
//! - **Custom adapters**: Register named conversion rules for any field
//! - **Error handling**: Configurable behavior for fields that fail to convert
//!
//! ## Example
//!
//! ```no_run
//! use rusty_mapper::adapter::{AdapterError, FromValue, TypeKey, Value};
//! use rusty_mapper::error::MapperError;
//! use rusty_mapper::mapper::{FieldDescriptor, MapRecord, Mapping, RecordShape};
//!
//! #[derive(Debug, Default)]
//! struct Person {
//!     name: String,
//!     age: i32,
//! }
//!
//! impl MapRecord for Person {
//!     fn shape() -> Result<RecordShape, MapperError> {
//!         RecordShape::builder()
//!             .field(FieldDescriptor::new("name", TypeKey::Text).header("Name"))
//!             .field(FieldDescriptor::new("age", TypeKey::I32).reference("B"))
//!             .build()
//!     }
//!
//!     fn set_field(&mut self, field: &str, value: Value) -> Result<(), AdapterError> {
//!         match field {
//!             "name" => self.name = FromValue::from_value(value)?,
//!             "age" => self.age = FromValue::from_value(value)?,
//!             _ => Err(AdapterError::UnknownField(field.to_owned()))?,
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<(), MapperError> {
//! let mapping = Mapping::<Person>::new()?;
//! for person in mapping.open("people.xlsx")? {
//!     println!("{:?}", person?);
//! }
//! # Ok(())
//! # }
//! ```

mod helpers;

pub mod adapter;
pub mod error;
pub mod mapper;
pub mod source;

pub use crate::adapter::AdapterRegistry;
pub use crate::error::MapperError;
pub use crate::mapper::FieldDescriptor;
pub use crate::mapper::MapRecord;
pub use crate::mapper::Mapping;
pub use crate::mapper::RecordMapper;
pub use crate::mapper::RecordShape;
pub use crate::source::FileFormat;
pub use crate::source::RowSource;
pub use crate::source::SheetSelector;
