//! Resolved cell and range locators.
//!
//! These are the evaluator-side forms of the references found in the
//! expression tree: sheet names are replaced by a [`SheetId`] handed out by
//! the cell source, and rows/columns are zero-based.
//!
//! ```text
//!   ReferenceType::Cell  ──resolve sheet──▶  CellRef  { sheet_id, coord }
//!   ReferenceType::Range ──resolve sheet──▶  RangeRef { sheet_id, start, end }
//! ```

use core::fmt;

use sheetcalc_common::{ExcelError, ExcelErrorKind};

pub use sheetcalc_common::Coord;

pub type SheetId = u16;

/// A single cell on a known sheet.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct CellRef {
    pub sheet_id: SheetId,
    pub coord: Coord,
}

impl CellRef {
    #[inline]
    pub const fn new(sheet_id: SheetId, coord: Coord) -> Self {
        Self { sheet_id, coord }
    }

    #[inline]
    pub fn row(&self) -> u32 {
        self.coord.row
    }

    #[inline]
    pub fn col(&self) -> u32 {
        self.coord.col
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]{}", self.sheet_id, self.coord)
    }
}

/// An inclusive rectangle on one sheet. `start` is always the top-left
/// corner and `end` the bottom-right one.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RangeRef {
    pub sheet_id: SheetId,
    pub start: Coord,
    pub end: Coord,
}

impl RangeRef {
    /// Inverted bounds are rejected with `#REF!` rather than swapped.
    pub fn new(sheet_id: SheetId, start: Coord, end: Coord) -> Result<Self, ExcelError> {
        if start.row > end.row || start.col > end.col {
            return Err(ExcelError::new(ExcelErrorKind::Ref)
                .with_message(format!("inverted range {start}:{end}")));
        }
        Ok(Self {
            sheet_id,
            start,
            end,
        })
    }

    pub fn single(cell: CellRef) -> Self {
        Self {
            sheet_id: cell.sheet_id,
            start: cell.coord,
            end: cell.coord,
        }
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// Exactly one row tall.
    pub fn is_row(&self) -> bool {
        self.start.row == self.end.row
    }

    /// Exactly one column wide.
    pub fn is_column(&self) -> bool {
        self.start.col == self.end.col
    }

    pub fn is_single_cell(&self) -> bool {
        self.is_row() && self.is_column()
    }

    pub fn contains_row(&self, row: u32) -> bool {
        (self.start.row..=self.end.row).contains(&row)
    }

    pub fn contains_col(&self, col: u32) -> bool {
        (self.start.col..=self.end.col).contains(&col)
    }

    /// Cell at a position relative to the top-left corner, if inside.
    pub fn cell_at(&self, rel_row: u32, rel_col: u32) -> Option<CellRef> {
        if rel_row >= self.height() || rel_col >= self.width() {
            return None;
        }
        Some(CellRef::new(
            self.sheet_id,
            Coord::new(self.start.row + rel_row, self.start.col + rel_col),
        ))
    }

    /// New rectangle whose corners are given relative to this range's
    /// top-left cell: rows `first_row + rel_first_row ..= first_row +
    /// rel_last_row`, likewise for columns. The result may extend past the
    /// original range but not off the sheet.
    pub fn offset(
        &self,
        rel_first_row: i64,
        rel_last_row: i64,
        rel_first_col: i64,
        rel_last_col: i64,
    ) -> Result<RangeRef, ExcelError> {
        let off_sheet = |_| ExcelError::new(ExcelErrorKind::Ref);
        let start = self
            .start
            .offset(rel_first_row, rel_first_col)
            .map_err(off_sheet)?;
        let end = self
            .start
            .offset(rel_last_row, rel_last_col)
            .map_err(off_sheet)?;
        RangeRef::new(self.sheet_id, start, end)
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]{}:{}", self.sheet_id, self.start, self.end)
    }
}
