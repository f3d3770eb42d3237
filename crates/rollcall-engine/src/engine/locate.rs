//! Name lookup within fetched range values.
//!
//! The spreadsheet service returns each requested range as a list of major
//! dimension slices (rows by default, columns when asked). A cell matches a
//! display name when its text is non-empty and contained in the name, which
//! tolerates decorated nicknames such as `alice [EU]`. The first match wins,
//! in range order then scan order.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::cell_ref::CellRef;
use super::range::{RangeError, parse_range};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    #[error("no cell in the configured ranges matches `{0}`")]
    NoMatchFound(String),

    #[error("fetched range could not be interpreted: {0}")]
    Range(#[from] RangeError),
}

/// Layout of [`FetchedRange::values`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Outer list is rows, inner lists are the cells of each row.
    #[default]
    #[serde(rename = "ROWS")]
    Rows,
    /// Outer list is columns, inner lists are the cells of each column.
    #[serde(rename = "COLUMNS")]
    Columns,
}

impl Orientation {
    /// Anything other than `COLUMNS` is read as rows.
    pub fn from_major_dimension(value: Option<&str>) -> Orientation {
        match value {
            Some(v) if v.eq_ignore_ascii_case("COLUMNS") => Orientation::Columns,
            _ => Orientation::Rows,
        }
    }
}

/// One range's live contents as returned by the spreadsheet service.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchedRange {
    /// A1 range echoed by the service, e.g. `Sheet1!C2:D17`.
    pub range: String,
    pub orientation: Orientation,
    pub values: Vec<Vec<Value>>,
}

impl FetchedRange {
    pub fn new(range: impl Into<String>, orientation: Orientation, values: Vec<Vec<Value>>) -> Self {
        FetchedRange {
            range: range.into(),
            orientation,
            values,
        }
    }
}

/// Where a name was found.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LocatedCell {
    /// Sheet title from the fetched range, if it carried one.
    pub sheet: Option<String>,
    pub cell: CellRef,
}

/// Find the absolute cell holding `name` across `ranges`.
///
/// A fetched range whose `range` field does not parse aborts the lookup with
/// [`LocateError::Range`].
pub fn find_cell_for_name(ranges: &[FetchedRange], name: &str) -> Result<LocatedCell, LocateError> {
    for fetched in ranges {
        let origin = parse_range(&fetched.range)?;

        for (major, slice) in fetched.values.iter().enumerate() {
            for (minor, value) in slice.iter().enumerate() {
                if !cell_matches(value, name) {
                    continue;
                }
                let cell = match fetched.orientation {
                    Orientation::Columns => origin.start().offset(major, minor),
                    Orientation::Rows => origin.start().offset(minor, major),
                };
                return Ok(LocatedCell {
                    sheet: origin.sheet,
                    cell,
                });
            }
        }
    }

    Err(LocateError::NoMatchFound(name.to_string()))
}

fn cell_matches(value: &Value, name: &str) -> bool {
    match value {
        Value::String(text) => !text.is_empty() && name.contains(text.as_str()),
        _ => false,
    }
}
