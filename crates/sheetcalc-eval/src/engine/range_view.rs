//! Lazy views over grid cells.
//!
//! A [`RangeView`] is a rectangle plus a handle to the evaluator. Reading a
//! cell through it goes through [`CellEvaluator::evaluate_cell`], so a
//! formula cell is evaluated (or served from the cache) only when it is
//! actually read. Nothing is copied out of the grid up front.

use std::fmt;

use sheetcalc_common::{ExcelError, ExcelErrorKind, LiteralValue};

use crate::reference::{CellRef, RangeRef};
use crate::traits::CellEvaluator;

#[derive(Clone, Copy)]
pub struct RangeView<'e> {
    range: RangeRef,
    evaluator: &'e dyn CellEvaluator,
}

impl fmt::Debug for RangeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RangeView").field(&self.range).finish()
    }
}

impl<'e> RangeView<'e> {
    pub fn new(range: RangeRef, evaluator: &'e dyn CellEvaluator) -> Self {
        Self { range, evaluator }
    }

    pub fn range_ref(&self) -> RangeRef {
        self.range
    }

    pub fn evaluator(&self) -> &'e dyn CellEvaluator {
        self.evaluator
    }

    pub fn width(&self) -> u32 {
        self.range.width()
    }

    pub fn height(&self) -> u32 {
        self.range.height()
    }

    /// (rows, cols)
    pub fn dims(&self) -> (u32, u32) {
        (self.height(), self.width())
    }

    pub fn first_row(&self) -> u32 {
        self.range.start.row
    }

    pub fn first_col(&self) -> u32 {
        self.range.start.col
    }

    pub fn is_row(&self) -> bool {
        self.range.is_row()
    }

    pub fn is_column(&self) -> bool {
        self.range.is_column()
    }

    pub fn contains_row(&self, row: u32) -> bool {
        self.range.contains_row(row)
    }

    pub fn contains_col(&self, col: u32) -> bool {
        self.range.contains_col(col)
    }

    /// Value at a position relative to the top-left corner. Positions
    /// outside the rectangle read as `#REF!`.
    pub fn get_relative(&self, rel_row: u32, rel_col: u32) -> LiteralValue {
        match self.range.cell_at(rel_row, rel_col) {
            Some(cell) => self.evaluator.evaluate_cell(cell),
            None => LiteralValue::Error(
                ExcelError::new(ExcelErrorKind::Ref).with_message(format!(
                    "({rel_row}, {rel_col}) is outside a {}x{} range",
                    self.height(),
                    self.width()
                )),
            ),
        }
    }

    /// Value at an absolute sheet position, which must lie inside the view.
    pub fn get_absolute(&self, row: u32, col: u32) -> LiteralValue {
        if !self.contains_row(row) || !self.contains_col(col) {
            return LiteralValue::error(ExcelErrorKind::Ref);
        }
        self.get_relative(row - self.first_row(), col - self.first_col())
    }

    /// See [`RangeRef::offset`]: corners are relative to this view's
    /// top-left cell.
    pub fn offset(
        &self,
        rel_first_row: i64,
        rel_last_row: i64,
        rel_first_col: i64,
        rel_last_col: i64,
    ) -> Result<RangeView<'e>, ExcelError> {
        let range = self
            .range
            .offset(rel_first_row, rel_last_row, rel_first_col, rel_last_col)?;
        Ok(RangeView::new(range, self.evaluator))
    }

    /// The `index`-th row (0-based) as a 1-row view.
    pub fn row_view(&self, index: u32) -> Result<RangeView<'e>, ExcelError> {
        let last_col = self.width() as i64 - 1;
        self.offset(index as i64, index as i64, 0, last_col)
    }

    /// The `index`-th column (0-based) as a 1-column view.
    pub fn column_view(&self, index: u32) -> Result<RangeView<'e>, ExcelError> {
        let last_row = self.height() as i64 - 1;
        self.offset(0, last_row, index as i64, index as i64)
    }

    /// Number of cells along the single dimension of a row or column view.
    pub fn vector_len(&self) -> Option<u32> {
        if self.is_column() {
            Some(self.height())
        } else if self.is_row() {
            Some(self.width())
        } else {
            None
        }
    }

    /// Element `i` of a row or column view.
    pub fn vector_item(&self, i: u32) -> LiteralValue {
        if self.is_column() {
            self.get_relative(i, 0)
        } else {
            self.get_relative(0, i)
        }
    }

    /// Row-major iteration over every cell.
    pub fn iter(&self) -> impl Iterator<Item = LiteralValue> + '_ {
        let (rows, cols) = self.dims();
        (0..rows).flat_map(move |r| (0..cols).map(move |c| self.get_relative(r, c)))
    }
}

/// A single-cell reference that has not been read yet.
#[derive(Clone, Copy)]
pub struct RefView<'e> {
    cell: CellRef,
    evaluator: &'e dyn CellEvaluator,
}

impl fmt::Debug for RefView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefView").field(&self.cell).finish()
    }
}

impl<'e> RefView<'e> {
    pub fn new(cell: CellRef, evaluator: &'e dyn CellEvaluator) -> Self {
        Self { cell, evaluator }
    }

    pub fn cell(&self) -> CellRef {
        self.cell
    }

    pub fn value(&self) -> LiteralValue {
        self.evaluator.evaluate_cell(self.cell)
    }

    pub fn as_range(&self) -> RangeView<'e> {
        RangeView::new(RangeRef::single(self.cell), self.evaluator)
    }
}
