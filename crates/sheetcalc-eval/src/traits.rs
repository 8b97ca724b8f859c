//! sheetcalc-eval – collaborator traits and argument handles
//!
//! The evaluator talks to the outside world through three object-safe
//! traits, bundled as [`EvaluationContext`]:
//!
//! * [`CellSource`]       – stored values and formulas, keyed by (sheet, row, col)
//! * [`NameResolver`]     – defined names
//! * [`FunctionProvider`] – host-supplied functions
//!
//! Inside the evaluator, intermediate results are [`CalcValue`]s: either an
//! owned scalar or a view that borrows the evaluator and resolves cells
//! lazily.

use std::sync::Arc;

use sheetcalc_common::{ExcelError, ExcelErrorKind, LiteralValue};
use sheetcalc_core::{ASTNode, ASTNodeType};

use crate::coercion;
use crate::engine::named_range::NamedDefinition;
use crate::engine::range_view::{RangeView, RefView};
use crate::function::Function;
use crate::interpreter::Interpreter;
use crate::reference::{CellRef, SheetId};

/* ─────────────────────────── collaborators ─────────────────────────── */

/// What a cell holds before evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Value(LiteralValue),
    Formula(Arc<ASTNode>),
}

impl Default for CellContent {
    fn default() -> Self {
        CellContent::Value(LiteralValue::Blank)
    }
}

pub trait CellSource {
    /// Exact-match sheet lookup.
    fn sheet_id(&self, name: &str) -> Option<SheetId>;

    fn sheet_ids(&self) -> Vec<SheetId>;

    fn sheet_name(&self, id: SheetId) -> Option<&str>;

    /// Rows and columns are zero-based. Absent cells are `Blank`.
    fn lookup(&self, sheet: SheetId, row: u32, col: u32) -> CellContent;
}

pub trait NameResolver {
    /// `sheet` is the sheet of the formula being evaluated, so that
    /// sheet-scoped names can shadow workbook-scoped ones.
    fn resolve_name(&self, name: &str, sheet: SheetId) -> Option<NamedDefinition>;
}

pub trait FunctionProvider {
    /// Host-defined functions. Built-ins take precedence.
    fn get_function(&self, name: &str) -> Option<Arc<dyn Function>>;
}

pub trait EvaluationContext: CellSource + NameResolver + FunctionProvider {}
impl<T> EvaluationContext for T where T: CellSource + NameResolver + FunctionProvider {}

/// Re-entry point for nested cell evaluation. Views call back into this
/// whenever they read a cell.
pub trait CellEvaluator {
    fn evaluate_cell(&self, cell: CellRef) -> LiteralValue;

    fn context(&self) -> &dyn EvaluationContext;

    /// Sheet named in a reference such as `Data!A1`.
    fn resolve_sheet(&self, name: &str) -> Option<SheetId> {
        self.context().sheet_id(name)
    }
}

/* ───────────────────────────── values ──────────────────────────────── */

/// Result of evaluating one node of the tree.
#[derive(Debug, Clone)]
pub enum CalcValue<'e> {
    Scalar(LiteralValue),
    Reference(RefView<'e>),
    Range(RangeView<'e>),
}

impl<'e> CalcValue<'e> {
    pub fn error(kind: ExcelErrorKind) -> Self {
        CalcValue::Scalar(LiteralValue::error(kind))
    }

    pub fn number(n: f64) -> Self {
        CalcValue::Scalar(LiteralValue::from_number(n))
    }

    pub fn is_view(&self) -> bool {
        !matches!(self, CalcValue::Scalar(_))
    }

    /// The value as a rectangle. Single-cell references become 1×1 views;
    /// scalars have no area.
    pub fn as_range_view(&self) -> Option<RangeView<'e>> {
        match self {
            CalcValue::Scalar(_) => None,
            CalcValue::Reference(r) => Some(r.as_range()),
            CalcValue::Range(v) => Some(*v),
        }
    }
}

impl From<LiteralValue> for CalcValue<'_> {
    fn from(v: LiteralValue) -> Self {
        CalcValue::Scalar(v)
    }
}

impl From<ExcelError> for CalcValue<'_> {
    fn from(e: ExcelError) -> Self {
        CalcValue::Scalar(LiteralValue::Error(e))
    }
}

/* ───────────────────────── function context ────────────────────────── */

pub trait FunctionContext<'e> {
    /// The cell whose formula is being evaluated.
    fn current_cell(&self) -> CellRef;

    fn evaluator(&self) -> &'e dyn CellEvaluator;
}

/* ───────────────────────── argument handles ────────────────────────── */

/// A lazily evaluated function argument.
///
/// Nothing is evaluated until the function asks, which is what lets `IF`
/// and `CHOOSE` skip the branches they do not take.
pub struct ArgumentHandle<'a, 'e> {
    node: &'a ASTNode,
    interp: &'a Interpreter<'e>,
}

impl<'a, 'e> ArgumentHandle<'a, 'e> {
    pub(crate) fn new(node: &'a ASTNode, interp: &'a Interpreter<'e>) -> Self {
        Self { node, interp }
    }

    pub fn ast(&self) -> &'a ASTNode {
        self.node
    }

    /// True for an omitted argument such as the middle of `IF(A1,,2)`.
    pub fn is_missing(&self) -> bool {
        matches!(self.node.node_type, ASTNodeType::Missing)
    }

    /// Evaluate without narrowing references or ranges.
    pub fn calc(&self) -> CalcValue<'e> {
        self.interp.evaluate_ast(self.node)
    }

    /// Evaluate and narrow to one scalar using the formula's position.
    /// Error values come back as `Err`.
    pub fn value(&self) -> Result<LiteralValue, ExcelError> {
        let cell = self.interp.current_cell();
        coercion::get_single_value(&self.calc(), cell.row(), cell.col())
    }

    /// Evaluate to an area. Scalars are rejected with `#VALUE!`; an error
    /// scalar is returned as itself.
    pub fn range_view(&self) -> Result<RangeView<'e>, ExcelError> {
        match self.calc() {
            CalcValue::Scalar(LiteralValue::Error(e)) => Err(e),
            CalcValue::Scalar(_) => Err(ExcelError::new(ExcelErrorKind::Value)),
            other => other
                .as_range_view()
                .ok_or_else(|| ExcelError::new(ExcelErrorKind::Value)),
        }
    }

    pub fn number(&self) -> Result<f64, ExcelError> {
        coercion::coerce_to_number(&self.value()?)
    }

    pub fn text(&self) -> Result<String, ExcelError> {
        coercion::coerce_to_text(&self.value()?)
    }

    pub fn int(&self) -> Result<i32, ExcelError> {
        coercion::coerce_to_int(&self.value()?)
    }
}
