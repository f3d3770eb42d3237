//! A1 range notation.
//!
//! Parses operator-supplied range descriptors such as `E8`, `C2:D17` or
//! `'My Other Sheet'!AE2:AF357` into zero-indexed coordinates plus a size.
//! The same parser interprets the `range` field the spreadsheet service echoes
//! back with fetched values, which is how locator offsets become absolute
//! sheet coordinates.
//!
//! Whole-column (`A:A`) and whole-row (`1:1`) ranges are not supported.
//!
//! Row handling is asymmetric for two-ended ranges: the start row is converted
//! to 0-based but the end row is used as written, so `C2:D17` has a height of
//! 16. Downstream coordinate math depends on this, keep it.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

use super::cell_ref::CellRef;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("invalid column label `{0}`: expected one or more uppercase letters A-Z")]
    InvalidColumnLabel(String),

    #[error("`{0}` is not a range in A1 notation")]
    InvalidRangeSyntax(String),
}

/// A parsed rectangular range, zero-indexed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeRef {
    /// Sheet title from a `Sheet!` prefix, with surrounding quotes removed.
    pub sheet: Option<String>,
    pub col: usize,
    pub row: usize,
    pub width: usize,
    pub height: usize,
}

impl RangeRef {
    /// Top-left cell of the range.
    pub fn start(&self) -> CellRef {
        CellRef::new(self.col, self.row)
    }
}

const RANGE_BODY: &str = r"(?:(?<sheet>'(?:[^']|'')+'|[\w\s]+)!)?(?<c1>[A-Z]+)(?<r1>[0-9]+)(?::(?<c2>[A-Z]+)(?<r2>[0-9]+))?";

fn range_re() -> &'static Regex {
    static RANGE_RE: OnceLock<Regex> = OnceLock::new();
    RANGE_RE.get_or_init(|| {
        Regex::new(&format!("^{RANGE_BODY}$")).expect("range regex must compile")
    })
}

/// Parse a column label (bijective base 26, `A` = 1) into a zero-based index.
///
/// `A` -> 0, `Z` -> 25, `AA` -> 26, `AE` -> 30.
pub fn parse_column_label(label: &str) -> Result<usize, RangeError> {
    let invalid = || RangeError::InvalidColumnLabel(label.to_string());
    if label.is_empty() {
        return Err(invalid());
    }

    let mut acc = 0usize;
    for b in label.bytes() {
        if !b.is_ascii_uppercase() {
            return Err(invalid());
        }
        let digit = (b - b'A') as usize + 1;
        acc = acc
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(invalid)?;
    }

    Ok(acc - 1)
}

/// Parse a range descriptor. Surrounding whitespace is ignored.
pub fn parse_range(text: &str) -> Result<RangeRef, RangeError> {
    let trimmed = text.trim();
    let syntax = || RangeError::InvalidRangeSyntax(text.to_string());
    let caps = range_re().captures(trimmed).ok_or_else(syntax)?;

    let sheet = caps.name("sheet").map(|m| unquote_sheet(m.as_str()));

    let col = parse_column_label(&caps["c1"]).map_err(|_| syntax())?;
    let row = caps["r1"]
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(syntax)?;

    let (width, height) = match (caps.name("c2"), caps.name("r2")) {
        (Some(end_col), Some(end_row)) => {
            let end_col = parse_column_label(end_col.as_str()).map_err(|_| syntax())?;
            // End row is deliberately not decremented.
            let end_row = end_row.as_str().parse::<usize>().map_err(|_| syntax())?;
            let width = end_col.checked_sub(col).ok_or_else(syntax)?;
            let height = end_row.checked_sub(row).ok_or_else(syntax)?;
            (width.max(1), height.max(1))
        }
        _ => (1, 1),
    };

    Ok(RangeRef {
        sheet,
        col,
        row,
        width,
        height,
    })
}

/// Find every range descriptor in free text such as `"C2:D7 E2:G9 A1:D1"`.
///
/// The text is split on whitespace outside single quotes, so a quoted sheet
/// title may contain spaces but an unquoted one may not. Separating commas
/// and semicolons are ignored. Matches are returned in input order.
pub fn find_ranges(text: &str) -> Vec<&str> {
    split_outside_quotes(text)
        .into_iter()
        .map(|token| token.trim_matches(|c: char| c == ',' || c == ';'))
        .filter(|token| range_re().is_match(token))
        .collect()
}

fn split_outside_quotes(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = None;
    let mut quoted = false;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() && !quoted {
            if let Some(s) = start.take() {
                tokens.push(&text[s..i]);
            }
            continue;
        }
        if c == '\'' {
            quoted = !quoted;
        }
        start.get_or_insert(i);
    }
    if let Some(s) = start {
        tokens.push(&text[s..]);
    }
    tokens
}

fn unquote_sheet(raw: &str) -> String {
    match raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => raw.trim().to_string(),
    }
}
