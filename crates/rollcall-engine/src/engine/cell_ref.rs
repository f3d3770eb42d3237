//! Absolute sheet coordinates.
//!
//! A [`CellRef`] is the zero-indexed column/row position of a single cell in
//! the target sheet. It is what the locator produces and what formatting
//! requests target.
//!
//! # Examples
//!
//! ```ignore
//! let cell = CellRef::new(1, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::range::{RangeError, parse_column_label};

/// A reference to a cell by column and row indices (0-indexed).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CellRef {
    pub col: usize,
    pub row: usize,
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { col, row }
    }

    /// Shift this cell by a within-range offset.
    pub fn offset(self, cols: usize, rows: usize) -> CellRef {
        CellRef::new(self.col + cols, self.row + rows)
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

impl std::str::FromStr for CellRef {
    type Err = RangeError;

    /// Parse a bare single-cell reference such as `B3`. Sheet prefixes and
    /// ranges are rejected; use [`super::parse_range`] for those.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| RangeError::InvalidRangeSyntax(s.to_string()))?;
        let (letters, digits) = s.split_at(split);
        let col = parse_column_label(letters)?;
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RangeError::InvalidRangeSyntax(s.to_string()));
        }
        let row = digits
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .ok_or_else(|| RangeError::InvalidRangeSyntax(s.to_string()))?;
        Ok(CellRef::new(col, row))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}
