//! Reductions over any mix of scalars, references and ranges.

use sheetcalc_common::{ExcelError, LiteralValue};
use sheetcalc_core::{ASTNode, ASTNodeType};

use super::super::stats::{STDEV, STDEVP, VAR, VARP};
use super::super::utils::{flatten_values, for_each_number, sanitize_numeric_result};
use crate::coercion::{self, parse_double};
use crate::function::Function;
use crate::func_caps;
use crate::macros::register_functions;
use crate::traits::{ArgumentHandle, CalcValue, CellContent, FunctionContext};

/* ─────────────────────────── SUM() ────────────────────────────────── */

#[derive(Debug)]
pub struct SumFn;
impl Function for SumFn {
    func_caps!(PURE, REDUCTION);
    fn name(&self) -> &'static str {
        "SUM"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn max_args(&self) -> Option<usize> {
        None
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let mut total = 0.0;
        for_each_number(args, |n| total += n)?;
        sanitize_numeric_result(total)
    }
}

#[derive(Debug)]
pub struct SumSqFn;
impl Function for SumSqFn {
    func_caps!(PURE, REDUCTION);
    fn name(&self) -> &'static str {
        "SUMSQ"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn max_args(&self) -> Option<usize> {
        None
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let mut total = 0.0;
        for_each_number(args, |n| total += n * n)?;
        sanitize_numeric_result(total)
    }
}

#[derive(Debug)]
pub struct ProductFn;
impl Function for ProductFn {
    func_caps!(PURE, REDUCTION);
    fn name(&self) -> &'static str {
        "PRODUCT"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn max_args(&self) -> Option<usize> {
        None
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let mut product: Option<f64> = None;
        for_each_number(args, |n| product = Some(product.unwrap_or(1.0) * n))?;
        sanitize_numeric_result(product.unwrap_or(0.0))
    }
}

/* ─────────────────────────── MIN() / MAX() ────────────────────────── */

/// Smallest or largest number seen; `0` when there is none.
#[derive(Debug)]
pub struct ExtremumFn {
    name: &'static str,
    pick: fn(f64, f64) -> f64,
}

pub const MIN: ExtremumFn = ExtremumFn {
    name: "MIN",
    pick: f64::min,
};
pub const MAX: ExtremumFn = ExtremumFn {
    name: "MAX",
    pick: f64::max,
};

impl Function for ExtremumFn {
    func_caps!(PURE, REDUCTION);
    fn name(&self) -> &'static str {
        self.name
    }
    fn min_args(&self) -> usize {
        1
    }
    fn max_args(&self) -> Option<usize> {
        None
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let mut best: Option<f64> = None;
        for_each_number(args, |n| {
            best = Some(best.map_or(n, |b| (self.pick)(b, n)));
        })?;
        sanitize_numeric_result(best.unwrap_or(0.0))
    }
}

/* ─────────────────────────── AVERAGE() ────────────────────────────── */

#[derive(Debug)]
pub struct AverageFn;
impl Function for AverageFn {
    func_caps!(PURE, REDUCTION);
    fn name(&self) -> &'static str {
        "AVERAGE"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn max_args(&self) -> Option<usize> {
        None
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let (mut sum, mut count) = (0.0, 0usize);
        for_each_number(args, |n| {
            sum += n;
            count += 1;
        })?;
        if count == 0 {
            return Err(ExcelError::new_div().with_message("AVERAGE of no numbers"));
        }
        sanitize_numeric_result(sum / count as f64)
    }
}

/* ─────────────────────────── COUNT() / COUNTA() ───────────────────── */

/// Counts numbers. Direct arguments also count when they are booleans or
/// numeric text. Errors are never counted and never raised.
#[derive(Debug)]
pub struct CountFn;
impl Function for CountFn {
    func_caps!(PURE, REDUCTION, ERROR_AWARE);
    fn name(&self) -> &'static str {
        "COUNT"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn max_args(&self) -> Option<usize> {
        None
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let mut count = 0usize;
        for arg in args {
            match arg.calc() {
                CalcValue::Scalar(v) => {
                    let counted = match &v {
                        LiteralValue::Number(_) | LiteralValue::Boolean(_) => true,
                        LiteralValue::Text(s) => parse_double(s).is_some(),
                        _ => false,
                    };
                    count += counted as usize;
                }
                view => {
                    if let Some(range) = view.as_range_view() {
                        count += range
                            .iter()
                            .filter(|v| matches!(v, LiteralValue::Number(_)))
                            .count();
                    }
                }
            }
        }
        Ok(CalcValue::number(count as f64))
    }
}

/// Counts every value that is not blank, errors included.
#[derive(Debug)]
pub struct CountAFn;
impl Function for CountAFn {
    func_caps!(PURE, REDUCTION, ERROR_AWARE);
    fn name(&self) -> &'static str {
        "COUNTA"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn max_args(&self) -> Option<usize> {
        None
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let count = flatten_values(args)
            .iter()
            .filter(|v| !v.is_blank())
            .count();
        Ok(CalcValue::number(count as f64))
    }
}

/* ─────────────────────────── SUBTOTAL() ───────────────────────────── */

/// The aggregates `SUBTOTAL` can apply, by function number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subtotal {
    Average,
    Count,
    CountA,
    Max,
    Min,
    Product,
    StDev,
    StDevP,
    Sum,
    Var,
    VarP,
}

impl Subtotal {
    /// `101..=111` only differ in skipping hidden rows, and there are none.
    fn from_code(code: f64) -> Option<Self> {
        let code = code.trunc() as i64;
        let code = if (101..=111).contains(&code) { code - 100 } else { code };
        Some(match code {
            1 => Self::Average,
            2 => Self::Count,
            3 => Self::CountA,
            4 => Self::Max,
            5 => Self::Min,
            6 => Self::Product,
            7 => Self::StDev,
            8 => Self::StDevP,
            9 => Self::Sum,
            10 => Self::Var,
            11 => Self::VarP,
            _ => return None,
        })
    }
}

/// A value `SUBTOTAL` aggregates, tagged with where it came from: direct
/// arguments are coerced, cells are not.
enum Item {
    Direct(LiteralValue),
    Cell(LiteralValue),
}

fn calls_subtotal(node: &ASTNode) -> bool {
    match &node.node_type {
        ASTNodeType::Function { name, args } => {
            name.eq_ignore_ascii_case("SUBTOTAL") || args.iter().any(calls_subtotal)
        }
        ASTNodeType::UnaryOp { expr, .. } => calls_subtotal(expr),
        ASTNodeType::BinaryOp { left, right, .. } => {
            calls_subtotal(left) || calls_subtotal(right)
        }
        ASTNodeType::Literal(_) | ASTNodeType::Reference { .. } | ASTNodeType::Missing => false,
    }
}

/// `SUBTOTAL(function_num, ref1, …)`. Cells whose formula calls `SUBTOTAL`
/// are left out, so stacked subtotals do not count each other twice.
#[derive(Debug)]
pub struct SubtotalFn;

impl SubtotalFn {
    fn gather<'a, 'b>(
        args: &[ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext<'b>,
    ) -> Vec<Item> {
        let source = ctx.evaluator().context();
        let mut items = Vec::new();
        for arg in args {
            if arg.is_missing() {
                continue;
            }
            let view = match arg.calc() {
                CalcValue::Scalar(v) => {
                    items.push(Item::Direct(v));
                    continue;
                }
                other => match other.as_range_view() {
                    Some(view) => view,
                    None => continue,
                },
            };
            let range = view.range_ref();
            for r in 0..range.height() {
                for c in 0..range.width() {
                    let Some(cell) = range.cell_at(r, c) else {
                        continue;
                    };
                    if let CellContent::Formula(ast) =
                        source.lookup(cell.sheet_id, cell.row(), cell.col())
                    {
                        if calls_subtotal(&ast) {
                            continue;
                        }
                    }
                    items.push(Item::Cell(view.get_relative(r, c)));
                }
            }
        }
        items
    }

    fn numbers(items: &[Item]) -> Result<Vec<f64>, ExcelError> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Item::Direct(LiteralValue::Blank) => {}
                Item::Direct(LiteralValue::Error(e)) | Item::Cell(LiteralValue::Error(e)) => {
                    return Err(e.clone());
                }
                Item::Direct(v) => out.push(coercion::coerce_to_number(v)?),
                Item::Cell(LiteralValue::Number(n)) => out.push(*n),
                Item::Cell(_) => {}
            }
        }
        Ok(out)
    }

    fn reduce(op: Subtotal, nums: &[f64]) -> Result<f64, ExcelError> {
        Ok(match op {
            Subtotal::Sum => nums.iter().sum(),
            Subtotal::Product if nums.is_empty() => 0.0,
            Subtotal::Product => nums.iter().product(),
            Subtotal::Max => nums.iter().copied().reduce(f64::max).unwrap_or(0.0),
            Subtotal::Min => nums.iter().copied().reduce(f64::min).unwrap_or(0.0),
            Subtotal::Average if nums.is_empty() => {
                return Err(ExcelError::new_div().with_message("SUBTOTAL of no numbers"));
            }
            Subtotal::Average => nums.iter().sum::<f64>() / nums.len() as f64,
            Subtotal::StDev => STDEV.of(nums)?,
            Subtotal::StDevP => STDEVP.of(nums)?,
            Subtotal::Var => VAR.of(nums)?,
            Subtotal::VarP => VARP.of(nums)?,
            Subtotal::Count | Subtotal::CountA => nums.len() as f64,
        })
    }

    fn count(items: &[Item]) -> usize {
        items
            .iter()
            .filter(|item| match item {
                Item::Direct(LiteralValue::Number(_) | LiteralValue::Boolean(_)) => true,
                Item::Direct(LiteralValue::Text(s)) => parse_double(s).is_some(),
                Item::Cell(v) => matches!(v, LiteralValue::Number(_)),
                Item::Direct(_) => false,
            })
            .count()
    }

    fn count_a(items: &[Item]) -> usize {
        items
            .iter()
            .filter(|item| match item {
                Item::Direct(v) | Item::Cell(v) => !v.is_blank(),
            })
            .count()
    }
}

impl Function for SubtotalFn {
    func_caps!(PURE, REDUCTION);
    fn name(&self) -> &'static str {
        "SUBTOTAL"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn max_args(&self) -> Option<usize> {
        None
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let code = args[0].number()?;
        let op = Subtotal::from_code(code).ok_or_else(|| {
            ExcelError::new_value().with_message(format!("SUBTOTAL: bad function number {code}"))
        })?;
        let items = Self::gather(&args[1..], ctx);
        let result = match op {
            Subtotal::Count => Self::count(&items) as f64,
            Subtotal::CountA => Self::count_a(&items) as f64,
            op => Self::reduce(op, &Self::numbers(&items)?)?,
        };
        sanitize_numeric_result(result)
    }
}

/* ─────────────────── SUMX2MY2() / SUMX2PY2() / SUMXMY2() ──────────── */

/// Sums `term(x, y)` over paired positions of two equally shaped arrays.
/// Pairs where either side is not a number are skipped; errors propagate,
/// and arrays of different shapes are `#N/A`.
#[derive(Debug)]
pub struct PairSumFn {
    name: &'static str,
    term: fn(f64, f64) -> f64,
}

pub const SUMX2MY2: PairSumFn = PairSumFn {
    name: "SUMX2MY2",
    term: |x, y| x * x - y * y,
};
pub const SUMX2PY2: PairSumFn = PairSumFn {
    name: "SUMX2PY2",
    term: |x, y| x * x + y * y,
};
pub const SUMXMY2: PairSumFn = PairSumFn {
    name: "SUMXMY2",
    term: |x, y| (x - y) * (x - y),
};

/// Shape and row-major values of an array argument; a scalar is 1×1.
fn array_arg(
    arg: &ArgumentHandle<'_, '_>,
) -> Result<((u32, u32), Vec<LiteralValue>), ExcelError> {
    match arg.calc() {
        CalcValue::Scalar(LiteralValue::Error(e)) => Err(e),
        CalcValue::Scalar(v) => Ok(((1, 1), vec![v])),
        view => {
            let range = view.as_range_view().ok_or_else(ExcelError::new_value)?;
            Ok((range.dims(), range.iter().collect()))
        }
    }
}

impl Function for PairSumFn {
    func_caps!(PURE, REDUCTION);
    fn name(&self) -> &'static str {
        self.name
    }
    fn min_args(&self) -> usize {
        2
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let (x_dims, xs) = array_arg(&args[0])?;
        let (y_dims, ys) = array_arg(&args[1])?;
        if x_dims != y_dims {
            return Err(ExcelError::new_na()
                .with_message(format!("{}: arrays differ in size", self.name)));
        }
        let mut total = 0.0;
        for (x, y) in xs.iter().zip(&ys) {
            match (x, y) {
                (LiteralValue::Error(e), _) | (_, LiteralValue::Error(e)) => return Err(e.clone()),
                (LiteralValue::Number(x), LiteralValue::Number(y)) => total += (self.term)(*x, *y),
                _ => {}
            }
        }
        sanitize_numeric_result(total)
    }
}

pub fn register_builtins() {
    register_functions!(
        SumFn, SumSqFn, ProductFn, MIN, MAX, AverageFn, CountFn, CountAFn, SubtotalFn, SUMX2MY2,
        SUMX2PY2, SUMXMY2
    );
}

#[cfg(test)]
mod tests {
    use sheetcalc_common::ExcelErrorKind;
    use sheetcalc_core::{ASTNode, BinaryOperator};

    use crate::test_utils::{eval, eval_with};
    use crate::test_workbook::TestWorkbook;

    use super::*;

    /// A1:A5 = 1, "2", TRUE, blank, 4
    fn column() -> TestWorkbook {
        TestWorkbook::new().with_range(
            "Sheet1",
            1,
            1,
            vec![
                vec![LiteralValue::Number(1.0)],
                vec![LiteralValue::text("2")],
                vec![LiteralValue::Boolean(true)],
                vec![LiteralValue::Blank],
                vec![LiteralValue::Number(4.0)],
            ],
        )
    }

    fn over_column(name: &str) -> LiteralValue {
        eval_with(column(), ASTNode::function(name, vec![ASTNode::range(1, 1, 5, 1)]))
    }

    #[test]
    fn range_cells_only_count_numbers() {
        assert_eq!(over_column("SUM"), LiteralValue::Number(5.0));
        assert_eq!(over_column("SUMSQ"), LiteralValue::Number(17.0));
        assert_eq!(over_column("PRODUCT"), LiteralValue::Number(4.0));
        assert_eq!(over_column("AVERAGE"), LiteralValue::Number(2.5));
        assert_eq!(over_column("MIN"), LiteralValue::Number(1.0));
        assert_eq!(over_column("MAX"), LiteralValue::Number(4.0));
        assert_eq!(over_column("COUNT"), LiteralValue::Number(2.0));
        assert_eq!(over_column("COUNTA"), LiteralValue::Number(4.0));
    }

    #[test]
    fn direct_arguments_are_coerced() {
        let sum = ASTNode::function(
            "SUM",
            vec![ASTNode::text("2"), ASTNode::boolean(true), ASTNode::number(3.0)],
        );
        assert_eq!(eval(sum), LiteralValue::Number(6.0));
        let bad = ASTNode::function("SUM", vec![ASTNode::text("two")]);
        assert_eq!(eval(bad), LiteralValue::error(ExcelErrorKind::Value));
        let count = ASTNode::function(
            "COUNT",
            vec![ASTNode::text("2"), ASTNode::text("x"), ASTNode::boolean(false)],
        );
        assert_eq!(eval(count), LiteralValue::Number(2.0));
    }

    #[test]
    fn empty_reductions() {
        let empty = ASTNode::range(10, 10, 12, 10);
        let call = |name: &str| eval(ASTNode::function(name, vec![empty.clone()]));
        assert_eq!(call("MAX"), LiteralValue::Number(0.0));
        assert_eq!(call("MIN"), LiteralValue::Number(0.0));
        assert_eq!(call("AVERAGE"), LiteralValue::error(ExcelErrorKind::Div));
        assert_eq!(call("COUNT"), LiteralValue::Number(0.0));
    }

    #[test]
    fn range_errors_propagate_except_for_count() {
        let wb = column().with_cell_a1("Sheet1", "A6", LiteralValue::error(ExcelErrorKind::Na));
        let range = ASTNode::range(1, 1, 6, 1);
        assert_eq!(
            eval_with(wb.clone(), ASTNode::function("SUM", vec![range.clone()])),
            LiteralValue::error(ExcelErrorKind::Na)
        );
        assert_eq!(
            eval_with(wb.clone(), ASTNode::function("COUNT", vec![range.clone()])),
            LiteralValue::Number(2.0)
        );
        assert_eq!(
            eval_with(wb, ASTNode::function("COUNTA", vec![range])),
            LiteralValue::Number(5.0)
        );
    }

    /* ─────────────── SUBTOTAL ─────────────── */

    fn subtotal(code: f64, args: Vec<ASTNode>) -> ASTNode {
        let mut all = vec![ASTNode::number(code)];
        all.extend(args);
        ASTNode::function("SUBTOTAL", all)
    }

    /// Column B with subtotals stacked on subtotals:
    /// B4 = SUBTOTAL(code, B2:B3), B7 = SUBTOTAL(code, B2:B6)*2+2,
    /// B8 = SUBTOTAL(code, B2:B7), B9 = SUBTOTAL(code, B2, B3, …, B8).
    fn stacked(code: f64, b5: LiteralValue, b6: LiteralValue) -> TestWorkbook {
        let b7 = ASTNode::binary(
            BinaryOperator::Add,
            ASTNode::binary(
                BinaryOperator::Multiply,
                subtotal(code, vec![ASTNode::range(2, 2, 6, 2)]),
                ASTNode::number(2.0),
            ),
            ASTNode::number(2.0),
        );
        TestWorkbook::new()
            .with_cell_a1("Sheet1", "B2", LiteralValue::Number(1.0))
            .with_cell_a1("Sheet1", "B3", LiteralValue::Number(3.0))
            .with_formula_a1("Sheet1", "B4", subtotal(code, vec![ASTNode::range(2, 2, 3, 2)]))
            .with_cell_a1("Sheet1", "B5", b5)
            .with_cell_a1("Sheet1", "B6", b6)
            .with_formula_a1("Sheet1", "B7", b7)
            .with_formula_a1("Sheet1", "B8", subtotal(code, vec![ASTNode::range(2, 2, 7, 2)]))
            .with_formula_a1(
                "Sheet1",
                "B9",
                subtotal(code, (2..=8).map(|row| ASTNode::cell(row, 2)).collect()),
            )
    }

    fn numeric_stack(code: f64) -> [f64; 4] {
        let engine = stacked(code, LiteralValue::Number(1.0), LiteralValue::Number(7.0)).engine();
        ["B4", "B7", "B8", "B9"].map(|addr| match engine.evaluate("Sheet1", addr).unwrap() {
            LiteralValue::Number(n) => n,
            other => panic!("{addr}: expected number, got {other:?}"),
        })
    }

    fn assert_close(actual: [f64; 4], expected: [f64; 4]) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-5, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn stacked_subtotals_are_not_counted_twice() {
        assert_close(numeric_stack(9.0), [4.0, 26.0, 12.0, 12.0]);
        assert_close(numeric_stack(1.0), [2.0, 8.0, 3.0, 3.0]);
        assert_close(numeric_stack(4.0), [3.0, 16.0, 7.0, 7.0]);
        assert_close(numeric_stack(7.0), [1.41421, 7.65685, 2.82842, 2.82842]);
        assert_close(numeric_stack(8.0), [1.0, 6.898979, 2.44949, 2.44949]);
        assert_close(numeric_stack(10.0), [2.0, 18.0, 8.0, 8.0]);
        assert_close(numeric_stack(11.0), [1.0, 14.0, 6.0, 6.0]);
        assert_close(numeric_stack(109.0), [4.0, 26.0, 12.0, 12.0]);
    }

    #[test]
    fn stacked_counts_skip_subtotal_cells() {
        let counts = |code: f64| {
            let engine = stacked(code, LiteralValue::text("POI"), LiteralValue::Blank).engine();
            ["B4", "B7", "B8", "B9"].map(|addr| engine.evaluate("Sheet1", addr).unwrap())
        };
        let n = LiteralValue::Number;
        assert_eq!(counts(2.0), [n(2.0), n(6.0), n(2.0), n(2.0)]);
        assert_eq!(counts(3.0), [n(2.0), n(8.0), n(3.0), n(3.0)]);
    }

    #[test]
    fn subtotal_basics() {
        let rows = (0..5)
            .map(|r| {
                let first = 2.0 * r as f64 + 1.0;
                vec![LiteralValue::Number(first), LiteralValue::Number(first + 1.0)]
            })
            .collect();
        let wb = TestWorkbook::new().with_range("Sheet1", 1, 3, rows);
        let call = |code: f64| {
            eval_with(wb.clone(), subtotal(code, vec![ASTNode::range(1, 3, 5, 4)]))
        };
        assert_eq!(call(9.0), LiteralValue::Number(55.0));
        assert_eq!(call(1.0), LiteralValue::Number(5.5));
        assert_eq!(call(2.0), LiteralValue::Number(10.0));
        assert_eq!(call(4.0), LiteralValue::Number(10.0));
        assert_eq!(call(5.0), LiteralValue::Number(1.0));
        assert_eq!(call(6.0), LiteralValue::Number(3628800.0));
        match call(7.0) {
            LiteralValue::Number(n) => assert!((n - 3.0276503540974917).abs() < 1e-9),
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn subtotal_of_a_single_cell_chain() {
        let engine = TestWorkbook::new()
            .with_cell_a1("Sheet1", "B2", LiteralValue::Number(1.0))
            .with_formula_a1("Sheet1", "B3", subtotal(9.0, vec![ASTNode::cell(2, 2)]))
            .with_formula_a1("Sheet1", "B4", subtotal(9.0, vec![ASTNode::range(2, 2, 3, 2)]))
            .engine();
        assert_eq!(engine.evaluate("Sheet1", "B3").unwrap(), LiteralValue::Number(1.0));
        assert_eq!(engine.evaluate("Sheet1", "B4").unwrap(), LiteralValue::Number(1.0));
    }

    #[test]
    fn subtotal_rejects_bad_function_numbers() {
        let range = || vec![ASTNode::range(1, 1, 5, 1)];
        for code in [0.0, 12.0, 100.0, 112.0] {
            assert_eq!(
                eval_with(column(), subtotal(code, range())),
                LiteralValue::error(ExcelErrorKind::Value),
                "code {code}"
            );
        }
        let one_arg = ASTNode::function("SUBTOTAL", vec![ASTNode::number(9.0)]);
        assert_eq!(eval(one_arg), LiteralValue::error(ExcelErrorKind::Value));
        assert_eq!(eval_with(column(), subtotal(9.0, range())), LiteralValue::Number(5.0));
    }

    /* ─────────────── SUMX2MY2 / SUMX2PY2 / SUMXMY2 ─────────────── */

    /// A1:A10 = 1..=10, B1:B10 = 0..=9
    fn pairs() -> TestWorkbook {
        let rows = (1..=10)
            .map(|i| vec![LiteralValue::Number(i as f64), LiteralValue::Number(i as f64 - 1.0)])
            .collect();
        TestWorkbook::new().with_range("Sheet1", 1, 1, rows)
    }

    fn pair_sum(wb: TestWorkbook, name: &str, x: ASTNode, y: ASTNode) -> LiteralValue {
        eval_with(wb, ASTNode::function(name, vec![x, y]))
    }

    #[test]
    fn pair_sums_over_ranges() {
        let x = || ASTNode::range(1, 1, 10, 1);
        let y = || ASTNode::range(1, 2, 10, 2);
        assert_eq!(pair_sum(pairs(), "SUMX2MY2", x(), y()), LiteralValue::Number(100.0));
        assert_eq!(pair_sum(pairs(), "SUMX2MY2", y(), x()), LiteralValue::Number(-100.0));
        assert_eq!(pair_sum(pairs(), "SUMX2PY2", x(), y()), LiteralValue::Number(670.0));
        assert_eq!(pair_sum(pairs(), "SUMXMY2", x(), y()), LiteralValue::Number(10.0));
        assert_eq!(pair_sum(pairs(), "SUMX2PY2", x(), x()), LiteralValue::Number(770.0));
        assert_eq!(pair_sum(pairs(), "SUMXMY2", x(), x()), LiteralValue::Number(0.0));
    }

    #[test]
    fn pair_sums_of_scalars() {
        let (x, y) = (ASTNode::number(10.0), ASTNode::number(9.0));
        let wb = TestWorkbook::new;
        assert_eq!(pair_sum(wb(), "SUMX2MY2", x.clone(), y.clone()), LiteralValue::Number(19.0));
        assert_eq!(pair_sum(wb(), "SUMX2PY2", x.clone(), y.clone()), LiteralValue::Number(181.0));
        assert_eq!(pair_sum(wb(), "SUMXMY2", x, y), LiteralValue::Number(1.0));
    }

    #[test]
    fn pair_sums_skip_non_numbers_and_check_shape() {
        let wb = pairs()
            .with_cell_a1("Sheet1", "A1", LiteralValue::text("x"))
            .with_cell_a1("Sheet1", "B2", LiteralValue::Blank);
        // Rows 1 and 2 drop out: 100 - (1 - 0) - (4 - 1)
        assert_eq!(
            pair_sum(wb, "SUMX2MY2", ASTNode::range(1, 1, 10, 1), ASTNode::range(1, 2, 10, 2)),
            LiteralValue::Number(96.0)
        );
        assert_eq!(
            pair_sum(pairs(), "SUMXMY2", ASTNode::range(1, 1, 10, 1), ASTNode::range(1, 2, 9, 2)),
            LiteralValue::error(ExcelErrorKind::Na)
        );
        let broken = pairs().with_cell_a1("Sheet1", "B5", LiteralValue::error(ExcelErrorKind::Ref));
        assert_eq!(
            pair_sum(broken, "SUMX2PY2", ASTNode::range(1, 1, 10, 1), ASTNode::range(1, 2, 10, 2)),
            LiteralValue::error(ExcelErrorKind::Ref)
        );
    }
}

