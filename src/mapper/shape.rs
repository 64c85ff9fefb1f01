use crate::adapter::AdapterError;
use crate::adapter::Value;
use crate::error::MapperError;
use crate::mapper::field::Addressing;
use crate::mapper::field::FieldDescriptor;
use crate::source::SheetSelector;
use std::collections::HashSet;

/// A record type that rows can be mapped into.
///
/// `shape` declares the fields; `set_field` assigns one converted value, usually
/// through [`FromValue`](crate::adapter::FromValue). Fields whose cell is empty
/// are never assigned and keep their `Default` value.
pub trait MapRecord: Default {
    fn shape() -> Result<RecordShape, MapperError>;

    fn set_field(&mut self, field: &str, value: Value) -> Result<(), AdapterError>;
}

/// A field together with its resolved addressing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BoundField {
    pub(crate) descriptor: FieldDescriptor,
    pub(crate) addressing: Addressing,
}

/// The declared fields of a record type plus the sheet its rows come from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordShape {
    sheet: Option<SheetSelector>,
    fields: Vec<BoundField>,
}

impl RecordShape {
    pub fn builder() -> RecordShapeBuilder {
        RecordShapeBuilder::default()
    }

    /// Worksheet to read; `None` reads the first one.
    pub fn sheet(&self) -> Option<&SheetSelector> {
        self.sheet.as_ref()
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().map(|field| &field.descriptor)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn bound_fields(&self) -> &[BoundField] {
        &self.fields
    }
}

/// Collects field descriptors; [`build`](Self::build) validates them.
#[derive(Clone, Debug, Default)]
pub struct RecordShapeBuilder {
    sheet: Option<SheetSelector>,
    fields: Vec<FieldDescriptor>,
}

impl RecordShapeBuilder {
    pub fn sheet(mut self, sheet: impl Into<SheetSelector>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// Selects the sheet from loose parts, see [`SheetSelector::from_parts`].
    pub fn sheet_parts(mut self, index: Option<usize>, name: Option<&str>) -> Result<Self, MapperError> {
        self.sheet = Some(SheetSelector::from_parts(index, name)?);
        Ok(self)
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Resolves the addressing of every field. Conflicting addressing parts,
    /// malformed references and repeated field names are rejected.
    pub fn build(self) -> Result<RecordShape, MapperError> {
        let mut names = HashSet::new();
        let mut fields = Vec::with_capacity(self.fields.len());
        for descriptor in self.fields {
            if !names.insert(descriptor.name().to_owned()) {
                Err(MapperError::InvalidFieldAddressing {
                    field: descriptor.name().to_owned(),
                    message: "field is declared more than once".to_owned(),
                })?
            }
            let addressing = descriptor.addressing()?;
            fields.push(BoundField { descriptor, addressing });
        }
        Ok(RecordShape { sheet: self.sheet, fields })
    }
}
