//! Low level helpers for reading spreadsheet packages.
pub(crate) mod xml;
pub(crate) mod zip;
