use crate::error::MapperError;
use std::fmt;

/// Chooses which worksheet of a spreadsheet package is read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SheetSelector {
    /// Zero-based position in workbook order.
    Index(usize),
    /// Exact, case-sensitive sheet name.
    Name(String),
}

impl SheetSelector {
    /// Builds a selector from loosely configured parts.
    /// Exactly one of `index` and `name` must be set; an empty name counts as unset.
    pub fn from_parts(index: Option<usize>, name: Option<&str>) -> Result<Self, MapperError> {
        match (index, name.filter(|name| !name.is_empty())) {
            (Some(index), None) => Ok(Self::Index(index)),
            (None, Some(name)) => Ok(Self::Name(name.to_owned())),
            (Some(index), Some(name)) => Err(MapperError::InvalidSheetSelector(format!(
                "both index {} and name '{}' are set",
                index, name
            ))),
            (None, None) => Err(MapperError::InvalidSheetSelector(
                "neither index nor name is set".to_owned(),
            )),
        }
    }

    /// Checks whether the sheet at `position` named `name` is the selected one.
    pub(crate) fn accept(&self, position: usize, name: &str) -> bool {
        match self {
            Self::Index(index) => *index == position,
            Self::Name(expected) => expected == name,
        }
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "index {}", index),
            Self::Name(name) => write!(f, "name '{}'", name),
        }
    }
}

impl From<usize> for SheetSelector {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for SheetSelector {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}
