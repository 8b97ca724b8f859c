use sheetcalc_eval::test_workbook::TestWorkbook;

use crate::{ASTNode, EngineError, LiteralValue};

/// Evaluate a formula tree in a one-sheet, in-memory workbook and return
/// the resulting scalar value.
///
/// # Example
///
/// ```rust
/// # use sheetcalc::doc_examples::eval_scalar;
/// use sheetcalc::{ASTNode, LiteralValue};
///
/// let sum = ASTNode::function(
///     "SUM",
///     vec![ASTNode::number(1.0), ASTNode::number(2.0), ASTNode::number(3.0)],
/// );
/// assert_eq!(eval_scalar(sum)?, LiteralValue::Number(6.0));
/// # Ok::<(), sheetcalc::EngineError>(())
/// ```
pub fn eval_scalar(ast: ASTNode) -> Result<LiteralValue, EngineError> {
    TestWorkbook::new()
        .with_formula_a1("Sheet1", "A1", ast)
        .engine()
        .evaluate("Sheet1", "A1")
}
