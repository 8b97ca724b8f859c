//! Functions that build or measure references: `OFFSET`, `ROW`, `COLUMN`,
//! `ROWS`, `COLUMNS`.

use sheetcalc_common::{ExcelError, LiteralValue};

use crate::engine::range_view::{RangeView, RefView};
use crate::function::Function;
use crate::func_caps;
use crate::macros::register_functions;
use crate::traits::{ArgumentHandle, CalcValue, FunctionContext};

/// Relative (first, last) pair along one axis for a shift of `delta` and a
/// signed `extent`. Negative extents grow toward the top or left.
fn span(delta: i64, extent: i64) -> (i64, i64) {
    if extent > 0 {
        (delta, delta + extent - 1)
    } else {
        (delta + extent + 1, delta)
    }
}

fn offset_extent<'a, 'b>(
    args: &[ArgumentHandle<'a, 'b>],
    index: usize,
    default: u32,
) -> Result<i64, ExcelError> {
    let extent = match args.get(index) {
        Some(a) if !a.is_missing() => a.number()?.trunc() as i64,
        _ => default as i64,
    };
    if extent == 0 {
        return Err(ExcelError::new_ref().with_message("OFFSET height and width cannot be 0"));
    }
    Ok(extent)
}

/// `OFFSET(reference, rows, cols, [height], [width])`. Height and width
/// default to the size of `reference`.
#[derive(Debug)]
pub struct OffsetFn;
impl Function for OffsetFn {
    func_caps!(PURE, RETURNS_REFERENCE);
    fn name(&self) -> &'static str {
        "OFFSET"
    }
    fn min_args(&self) -> usize {
        3
    }
    fn max_args(&self) -> Option<usize> {
        Some(5)
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let base = args[0].range_view()?;
        let rows = args[1].number()?.trunc() as i64;
        let cols = args[2].number()?.trunc() as i64;
        let height = offset_extent(args, 3, base.height())?;
        let width = offset_extent(args, 4, base.width())?;

        let (first_row, last_row) = span(rows, height);
        let (first_col, last_col) = span(cols, width);
        let moved = base.offset(first_row, last_row, first_col, last_col)?;
        Ok(as_reference(moved))
    }
}

/// A 1×1 area is returned as a single-cell reference.
fn as_reference(view: RangeView<'_>) -> CalcValue<'_> {
    let range = view.range_ref();
    if range.is_single_cell() {
        let cell = crate::reference::CellRef::new(range.sheet_id, range.start);
        CalcValue::Reference(RefView::new(cell, view.evaluator()))
    } else {
        CalcValue::Range(view)
    }
}

/* ─────────────────────────── ROW() / COLUMN() ─────────────────────── */

/// One-based row (or column) of the top-left cell of the argument, or of
/// the formula's own cell when there is none.
fn position<'a, 'b>(
    args: &[ArgumentHandle<'a, 'b>],
    ctx: &dyn FunctionContext<'b>,
    pick: fn(&RangeView<'b>) -> u32,
    own: fn(&crate::reference::CellRef) -> u32,
) -> Result<CalcValue<'b>, ExcelError> {
    let zero_based = match args.first() {
        Some(a) if !a.is_missing() => pick(&a.range_view()?),
        _ => own(&ctx.current_cell()),
    };
    Ok(CalcValue::number(zero_based as f64 + 1.0))
}

#[derive(Debug)]
pub struct RowFn;
impl Function for RowFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "ROW"
    }
    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        position(args, ctx, |v| v.first_row(), |c| c.row())
    }
}

#[derive(Debug)]
pub struct ColumnFn;
impl Function for ColumnFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "COLUMN"
    }
    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        position(args, ctx, |v| v.first_col(), |c| c.col())
    }
}

/* ─────────────────────────── ROWS() / COLUMNS() ───────────────────── */

/// Size of the argument along one axis. A scalar counts as 1×1.
fn extent<'a, 'b>(
    arg: &ArgumentHandle<'a, 'b>,
    pick: fn(&RangeView<'b>) -> u32,
) -> Result<CalcValue<'b>, ExcelError> {
    match arg.calc() {
        CalcValue::Scalar(LiteralValue::Error(e)) => Err(e),
        CalcValue::Scalar(_) => Ok(CalcValue::number(1.0)),
        view => {
            let n = view.as_range_view().map_or(1, |v| pick(&v));
            Ok(CalcValue::number(n as f64))
        }
    }
}

#[derive(Debug)]
pub struct RowsFn;
impl Function for RowsFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "ROWS"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        extent(&args[0], |v| v.height())
    }
}

#[derive(Debug)]
pub struct ColumnsFn;
impl Function for ColumnsFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "COLUMNS"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        extent(&args[0], |v| v.width())
    }
}

pub fn register_builtins() {
    register_functions!(OffsetFn, RowFn, ColumnFn, RowsFn, ColumnsFn);
}

#[cfg(test)]
mod tests {
    use sheetcalc_common::ExcelErrorKind;
    use sheetcalc_core::ASTNode;

    use crate::test_utils::{eval, eval_with};
    use crate::test_workbook::TestWorkbook;

    use super::*;

    fn grid() -> TestWorkbook {
        // A1:C3 = 1..9 row-major
        let rows = (0..3)
            .map(|r| (1..=3).map(|c| LiteralValue::Number((r * 3 + c) as f64)).collect())
            .collect();
        TestWorkbook::new().with_range("Sheet1", 1, 1, rows)
    }

    fn offset(args: Vec<f64>) -> ASTNode {
        let mut all = vec![ASTNode::cell(1, 1)];
        all.extend(args.into_iter().map(ASTNode::number));
        ASTNode::function("OFFSET", all)
    }

    #[test]
    fn offset_moves_a_cell() {
        assert_eq!(eval_with(grid(), offset(vec![1.0, 2.0])), LiteralValue::Number(6.0));
        assert_eq!(eval_with(grid(), offset(vec![0.0, 0.0])), LiteralValue::Number(1.0));
    }

    #[test]
    fn offset_builds_areas() {
        let sum = |o: ASTNode| eval_with(grid(), ASTNode::function("SUM", vec![o]));
        assert_eq!(sum(offset(vec![0.0, 0.0, 2.0, 2.0])), LiteralValue::Number(12.0));
        // Negative height grows upward from C3.
        let up = ASTNode::function(
            "OFFSET",
            vec![
                ASTNode::cell(3, 3),
                ASTNode::number(0.0),
                ASTNode::number(0.0),
                ASTNode::number(-3.0),
                ASTNode::number(1.0),
            ],
        );
        assert_eq!(sum(up), LiteralValue::Number(18.0));
    }

    #[test]
    fn offset_errors() {
        assert_eq!(
            eval_with(grid(), offset(vec![-1.0, 0.0])),
            LiteralValue::error(ExcelErrorKind::Ref)
        );
        assert_eq!(
            eval_with(grid(), offset(vec![0.0, 0.0, 0.0, 1.0])),
            LiteralValue::error(ExcelErrorKind::Ref)
        );
        let scalar = ASTNode::function(
            "OFFSET",
            vec![ASTNode::number(1.0), ASTNode::number(0.0), ASTNode::number(0.0)],
        );
        assert_eq!(eval(scalar), LiteralValue::error(ExcelErrorKind::Value));
    }

    #[test]
    fn row_column_rows_columns() {
        let call = |name: &str, args: Vec<ASTNode>| eval(ASTNode::function(name, args));
        assert_eq!(call("ROW", vec![ASTNode::range(4, 2, 9, 3)]), LiteralValue::Number(4.0));
        assert_eq!(call("COLUMN", vec![ASTNode::range(4, 2, 9, 3)]), LiteralValue::Number(2.0));
        assert_eq!(call("ROWS", vec![ASTNode::range(4, 2, 9, 3)]), LiteralValue::Number(6.0));
        assert_eq!(call("COLUMNS", vec![ASTNode::range(4, 2, 9, 3)]), LiteralValue::Number(2.0));
        assert_eq!(call("ROWS", vec![ASTNode::number(7.0)]), LiteralValue::Number(1.0));
    }

    #[test]
    fn row_without_argument_is_the_formula_row() {
        let wb = TestWorkbook::new().with_formula_a1("Sheet1", "D7", ASTNode::function("ROW", vec![]));
        let wb = wb.with_formula_a1("Sheet1", "D8", ASTNode::function("COLUMN", vec![]));
        let engine = wb.engine();
        assert_eq!(engine.evaluate("Sheet1", "D7").unwrap(), LiteralValue::Number(7.0));
        assert_eq!(engine.evaluate("Sheet1", "D8").unwrap(), LiteralValue::Number(4.0));
    }
}
