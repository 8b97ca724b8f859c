//! Grid coordinates.
//!
//! `Coord` is a zero-based (row, column) pair bounded by the usual sheet
//! limits of 1,048,576 rows × 16,384 columns. A1 helpers convert to and from
//! the one-based letter notation used in formulas and test fixtures.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const MAX_ROWS: u32 = 1 << 20;
pub const MAX_COLS: u32 = 1 << 14;

/// Errors returned when constructing coordinates from unchecked inputs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CoordError {
    RowOutOfRange(i64),
    ColOutOfRange(i64),
    Malformed(String),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::RowOutOfRange(row) => write!(f, "row {row} is outside the sheet"),
            CoordError::ColOutOfRange(col) => write!(f, "column {col} is outside the sheet"),
            CoordError::Malformed(s) => write!(f, "'{s}' is not an A1 address"),
        }
    }
}

impl std::error::Error for CoordError {}

/// Zero-based cell position.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: u32,
    pub col: u32,
}

impl Coord {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Checked constructor from signed arithmetic results.
    pub fn try_new(row: i64, col: i64) -> Result<Self, CoordError> {
        if row < 0 || row >= MAX_ROWS as i64 {
            return Err(CoordError::RowOutOfRange(row));
        }
        if col < 0 || col >= MAX_COLS as i64 {
            return Err(CoordError::ColOutOfRange(col));
        }
        Ok(Self::new(row as u32, col as u32))
    }

    /// From one-based (row, column) as written in A1 notation.
    pub fn from_excel(row: u32, col: u32) -> Result<Self, CoordError> {
        Self::try_new(row as i64 - 1, col as i64 - 1)
    }

    pub fn offset(self, drow: i64, dcol: i64) -> Result<Self, CoordError> {
        Self::try_new(self.row as i64 + drow, self.col as i64 + dcol)
    }

    /// Parse `B3`, `$B$3` or `b3`.
    pub fn parse_a1(s: &str) -> Result<Self, CoordError> {
        let malformed = || CoordError::Malformed(s.to_string());
        let cleaned: String = s.trim().chars().filter(|c| *c != '$').collect();
        let split = cleaned
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(malformed)?;
        let (letters, digits) = cleaned.split_at(split);
        let col = letters_to_col(letters).ok_or_else(malformed)?;
        let row: u32 = digits.parse().map_err(|_| malformed())?;
        if row == 0 {
            return Err(malformed());
        }
        Self::try_new(row as i64 - 1, col as i64)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_to_letters(self.col), self.row + 1)
    }
}

/// Zero-based column index to letters (`0 → A`, `27 → AB`).
pub fn col_to_letters(col: u32) -> String {
    let mut n = col as u64 + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        out.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Letters to zero-based column index; `None` for empty or non-letter input.
pub fn letters_to_col(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 3 {
        return None;
    }
    let mut col: u32 = 0;
    for ch in s.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    let col = col - 1;
    (col < MAX_COLS).then_some(col)
}
