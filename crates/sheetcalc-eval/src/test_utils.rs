//! Helpers for evaluating a single expression in unit tests.

use sheetcalc_common::LiteralValue;
use sheetcalc_core::ASTNode;

use crate::test_workbook::TestWorkbook;

/// Where [`eval_with`] puts the formula: far from the small grids tests
/// build around `A1`, so no implicit intersection applies.
pub const FORMULA_CELL: &str = "AZ500";

/// Evaluate `ast` in an empty workbook.
pub fn eval(ast: ASTNode) -> LiteralValue {
    eval_with(TestWorkbook::new(), ast)
}

/// Evaluate `ast` as the formula of `Sheet1!AZ500` in `wb`.
pub fn eval_with(wb: TestWorkbook, ast: ASTNode) -> LiteralValue {
    let wb = wb.with_formula_a1("Sheet1", FORMULA_CELL, ast);
    wb.engine()
        .evaluate("Sheet1", FORMULA_CELL)
        .expect("Sheet1 exists in every test workbook")
}
