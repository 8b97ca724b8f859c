//! Common test helpers
use sheetcalc_common::{ExcelErrorKind, LiteralValue};
use sheetcalc_core::{ASTNode, BinaryOperator};

use crate::engine::Engine;
use crate::test_workbook::TestWorkbook;

pub fn plus(left: ASTNode, right: ASTNode) -> ASTNode {
    ASTNode::binary(BinaryOperator::Add, left, right)
}

pub fn a1(engine: &Engine<TestWorkbook>, addr: &str) -> LiteralValue {
    engine.evaluate("Sheet1", addr).unwrap()
}

pub fn circ() -> LiteralValue {
    LiteralValue::error(ExcelErrorKind::Circ)
}
