use crate::adapter::TargetType;
use crate::error::MapperError;
use crate::source::reference::column_index;
use crate::source::HeaderIndex;

/// One record field: its type, where its column comes from and how failures are handled.
///
/// At most one of [`header`](Self::header), [`index`](Self::index) and
/// [`reference`](Self::reference) may be set. With none set, the column is
/// looked up by the field's own name in the header row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    target: TargetType,
    header: Option<String>,
    index: Option<usize>,
    reference: Option<String>,
    adapter: Option<String>,
    suppress: bool,
}

impl FieldDescriptor {
    /// Declares a field read from the column headed by `name`, suppressing conversion failures.
    pub fn new(name: impl Into<String>, target: impl Into<TargetType>) -> Self {
        FieldDescriptor {
            name: name.into(),
            target: target.into(),
            header: None,
            index: None,
            reference: None,
            adapter: None,
            suppress: true,
        }
    }

    /// Reads the column headed by `name`. An empty name counts as unset.
    pub fn header(mut self, name: impl Into<String>) -> Self {
        self.header = Some(name.into()).filter(|name: &String| !name.is_empty());
        self
    }

    /// Reads the column at a zero-based position.
    pub fn index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Reads the column of a cell reference such as `"C"` or `"C3"`; row digits are ignored.
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into()).filter(|reference: &String| !reference.is_empty());
        self
    }

    /// Converts with the custom adapter registered under `name`.
    pub fn adapter(mut self, name: impl Into<String>) -> Self {
        self.adapter = Some(name.into());
        self
    }

    /// Fails the record on a conversion failure instead of logging it.
    pub fn strict(self) -> Self {
        self.suppress(false)
    }

    pub fn suppress(mut self, suppress: bool) -> Self {
        self.suppress = suppress;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &TargetType {
        &self.target
    }

    pub fn custom_adapter(&self) -> Option<&str> {
        self.adapter.as_deref()
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppress
    }

    /// Resolves the addressing rule, rejecting conflicting parts and malformed references.
    pub fn addressing(&self) -> Result<Addressing, MapperError> {
        match (&self.header, self.index, &self.reference) {
            (None, None, None) => Ok(Addressing::ByDeclaredName(self.name.clone())),
            (Some(header), None, None) => Ok(Addressing::ByName(header.clone())),
            (None, Some(index), None) => Ok(Addressing::ByIndex(index)),
            (None, None, Some(reference)) => match column_index(reference) {
                Some(column) => Ok(Addressing::ByReference { reference: reference.clone(), column }),
                None => Err(MapperError::InvalidFieldAddressing {
                    field: self.name.clone(),
                    message: format!("'{}' is not a cell reference", reference),
                }),
            },
            (header, index, reference) => Err(MapperError::InvalidFieldAddressing {
                field: self.name.clone(),
                message: format!(
                    "only one of header name ({:?}), index ({:?}) or reference ({:?}) can be set",
                    header, index, reference
                ),
            }),
        }
    }
}

/// How a field finds its column in a row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Addressing {
    /// Explicit header name
    ByName(String),
    /// Zero-based column position
    ByIndex(usize),
    /// Decoded cell reference
    ByReference { reference: String, column: usize },
    /// The field's own name used as header name
    ByDeclaredName(String),
}

impl Addressing {
    /// The header this addressing looks up, if it goes through the header row.
    pub fn header_name(&self) -> Option<&str> {
        match self {
            Addressing::ByName(name) | Addressing::ByDeclaredName(name) => Some(name),
            Addressing::ByIndex(_) | Addressing::ByReference { .. } => None,
        }
    }

    /// Resolves the column against the header row; `None` when the header is missing.
    pub fn column(&self, headers: &HeaderIndex) -> Option<usize> {
        match self {
            Addressing::ByIndex(column) | Addressing::ByReference { column, .. } => Some(*column),
            Addressing::ByName(name) | Addressing::ByDeclaredName(name) => headers.get(name),
        }
    }
}
