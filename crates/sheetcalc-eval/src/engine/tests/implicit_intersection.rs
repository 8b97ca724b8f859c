//! Ranges used where a single value is expected pick the cell on the
//! formula's row or column.
use sheetcalc_common::{ExcelErrorKind, LiteralValue};
use sheetcalc_core::ASTNode;

use super::common::a1;
use crate::test_workbook::TestWorkbook;

fn column() -> TestWorkbook {
    // A1:A3 = -1, -2, -3
    TestWorkbook::new().with_range(
        "Sheet1",
        1,
        1,
        vec![
            vec![LiteralValue::Number(-1.0)],
            vec![LiteralValue::Number(-2.0)],
            vec![LiteralValue::Number(-3.0)],
        ],
    )
}

#[test]
fn test_column_range_argument_uses_formula_row() {
    let engine = column()
        .with_formula_a1("Sheet1", "B2", ASTNode::function("ABS", vec![ASTNode::range(1, 1, 3, 1)]))
        .engine();
    assert_eq!(a1(&engine, "B2"), LiteralValue::Number(2.0));
}

#[test]
fn test_bare_range_result_is_narrowed() {
    let engine = column()
        .with_formula_a1("Sheet1", "C3", ASTNode::range(1, 1, 3, 1))
        .with_formula_a1("Sheet1", "C9", ASTNode::range(1, 1, 3, 1))
        .engine();
    assert_eq!(a1(&engine, "C3"), LiteralValue::Number(-3.0));
    assert_eq!(a1(&engine, "C9"), LiteralValue::error(ExcelErrorKind::Value));
}

#[test]
fn test_row_range_uses_formula_column() {
    let row = vec![(1..=5).map(|v| LiteralValue::Number(v as f64)).collect()];
    let engine = TestWorkbook::new()
        .with_range("Sheet1", 1, 1, row)
        .with_formula_a1("Sheet1", "C5", ASTNode::range(1, 1, 1, 5))
        .with_formula_a1("Sheet1", "G5", ASTNode::range(1, 1, 1, 5))
        .engine();
    assert_eq!(a1(&engine, "C5"), LiteralValue::Number(3.0));
    assert_eq!(a1(&engine, "G5"), LiteralValue::error(ExcelErrorKind::Value));
}

#[test]
fn test_single_cell_range_works_anywhere() {
    let engine = column()
        .with_formula_a1("Sheet1", "Z99", ASTNode::range(2, 1, 2, 1))
        .engine();
    assert_eq!(a1(&engine, "Z99"), LiteralValue::Number(-2.0));
}

#[test]
fn test_two_dimensional_range_is_value_error() {
    let engine = column()
        .with_formula_a1("Sheet1", "C2", ASTNode::range(1, 1, 3, 2))
        .with_formula_a1(
            "Sheet1",
            "D2",
            ASTNode::unary(sheetcalc_core::UnaryOperator::Minus, ASTNode::range(1, 1, 3, 2)),
        )
        .engine();
    assert_eq!(a1(&engine, "C2"), LiteralValue::error(ExcelErrorKind::Value));
    assert_eq!(a1(&engine, "D2"), LiteralValue::error(ExcelErrorKind::Value));
}

#[test]
fn test_aggregates_see_the_whole_range() {
    let engine = column()
        .with_formula_a1("Sheet1", "B2", ASTNode::function("SUM", vec![ASTNode::range(1, 1, 3, 1)]))
        .engine();
    assert_eq!(a1(&engine, "B2"), LiteralValue::Number(-6.0));
}
