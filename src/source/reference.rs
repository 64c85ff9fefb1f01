//! Conversions between spreadsheet cell references and zero-based column indexes.

use regex::Regex;
use std::sync::LazyLock;

static CELL_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]+)(\d*)$").expect("Hardcode regex pattern"));

/// Decodes the column part of a cell reference into a zero-based index.
///
/// The row digits are optional and ignored, so `"A"` and `"A7"` both give `0`,
/// `"Z"` gives `25` and `"AA"` gives `26`. Letters must be upper case.
/// Returns `None` for anything that is not a reference or overflows.
pub fn column_index(reference: &str) -> Option<usize> {
    let captures = CELL_REFERENCE.captures(reference)?;
    let letters = captures.get(1)?.as_str();
    letters.bytes().try_fold(0usize, |index, letter| {
        index
            .checked_mul(26)?
            .checked_add(usize::from(letter - b'A') + 1)
    })
    .map(|index| index - 1)
}

/// Encodes a zero-based column index as letters (`0` → `"A"`, `26` → `"AA"`).
pub fn column_name(index: usize) -> String {
    let mut column = index + 1;
    let mut name = Vec::new();
    while column > 0 {
        column -= 1;
        name.push(char::from(b'A' + (column % 26) as u8));
        column /= 26;
    }
    name.iter().rev().collect()
}

/// Returns the Excel-style reference of a zero-based (row, column) position.
pub fn cell_reference(row: usize, col: usize) -> String {
    format!("{}{}", column_name(col), row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_single_and_multi_letter_columns() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("B"), Some(1));
        assert_eq!(column_index("Z"), Some(25));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index("AZ"), Some(51));
        assert_eq!(column_index("BA"), Some(52));
        assert_eq!(column_index("XFD"), Some(16_383));
    }

    #[test]
    fn ignores_row_digits() {
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("AA123"), Some(26));
        assert_eq!(column_index("C3"), Some(2));
    }

    #[test]
    fn rejects_malformed_references() {
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("1"), None);
        assert_eq!(column_index("a1"), None);
        assert_eq!(column_index("A1B"), None);
        assert_eq!(column_index(" A"), None);
        assert_eq!(column_index(&"Z".repeat(40)), None);
    }

    #[test]
    fn encodes_names_back() {
        for index in [0, 1, 25, 26, 51, 52, 701, 702, 16_383] {
            assert_eq!(column_index(&column_name(index)), Some(index));
        }
        assert_eq!(column_name(27), "AB");
        assert_eq!(cell_reference(2, 1), "B3");
    }
}
