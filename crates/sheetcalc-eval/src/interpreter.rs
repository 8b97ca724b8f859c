use std::cell::RefCell;
use std::sync::Arc;

use sheetcalc_common::{Coord, ExcelError, ExcelErrorKind, LiteralValue};
use sheetcalc_core::{ASTNode, ASTNodeType, BinaryOperator, ReferenceType, UnaryOperator};
use smallvec::SmallVec;

use crate::builtins::operators;
use crate::coercion;
use crate::engine::named_range::NamedDefinition;
use crate::engine::range_view::{RangeView, RefView};
use crate::function::{FnCaps, Function};
use crate::function_registry;
use crate::reference::{CellRef, RangeRef, SheetId};
use crate::traits::{ArgumentHandle, CalcValue, CellEvaluator, EvaluationContext, FunctionContext};

/// Walks one formula's tree on behalf of the cell that holds it.
///
/// References come back as views over the evaluator; they are narrowed to
/// scalars only where an operator or a non-reference function needs one.
pub struct Interpreter<'e> {
    evaluator: &'e dyn CellEvaluator,
    cell: CellRef,
    // Names currently being expanded, to stop `X = X + 1` style loops.
    names_in_flight: RefCell<SmallVec<[String; 2]>>,
}

impl<'e> Interpreter<'e> {
    pub fn new(evaluator: &'e dyn CellEvaluator, cell: CellRef) -> Self {
        Self {
            evaluator,
            cell,
            names_in_flight: RefCell::new(SmallVec::new()),
        }
    }

    pub fn current_cell(&self) -> CellRef {
        self.cell
    }

    pub fn context(&self) -> &'e dyn EvaluationContext {
        self.evaluator.context()
    }

    /* ===================  public  =================== */

    pub fn evaluate_ast(&self, node: &ASTNode) -> CalcValue<'e> {
        match &node.node_type {
            ASTNodeType::Literal(v) => CalcValue::Scalar(v.clone()),
            ASTNodeType::Reference { reference, .. } => self
                .eval_reference(reference)
                .unwrap_or_else(CalcValue::from),
            ASTNodeType::UnaryOp { op, expr } => self.eval_unary(*op, expr),
            ASTNodeType::BinaryOp { op, left, right } => self.eval_binary(*op, left, right),
            ASTNodeType::Function { name, args } => self.eval_function(name, args),
            ASTNodeType::Missing => CalcValue::Scalar(LiteralValue::Blank),
        }
    }

    /// Evaluate and narrow to a scalar at the formula's position. Errors
    /// come back as error values.
    pub fn evaluate_scalar(&self, node: &ASTNode) -> LiteralValue {
        self.narrow(&self.evaluate_ast(node))
    }

    fn narrow(&self, value: &CalcValue<'e>) -> LiteralValue {
        coercion::get_single_value(value, self.cell.row(), self.cell.col())
            .unwrap_or_else(LiteralValue::Error)
    }

    /* ===================  reference  =================== */

    fn eval_reference(&self, reference: &ReferenceType) -> Result<CalcValue<'e>, ExcelError> {
        match reference {
            ReferenceType::Cell { sheet, row, col } => {
                let sheet_id = self.sheet_id(sheet.as_deref())?;
                let cell = CellRef::new(sheet_id, one_based(*row, *col)?);
                Ok(CalcValue::Reference(RefView::new(cell, self.evaluator)))
            }
            ReferenceType::Range {
                sheet,
                start_row,
                start_col,
                end_row,
                end_col,
            } => {
                let sheet_id = self.sheet_id(sheet.as_deref())?;
                // `A3:A1` means the same area as `A1:A3`.
                let start = one_based((*start_row).min(*end_row), (*start_col).min(*end_col))?;
                let end = one_based((*start_row).max(*end_row), (*start_col).max(*end_col))?;
                let range = RangeRef::new(sheet_id, start, end)?;
                Ok(CalcValue::Range(RangeView::new(range, self.evaluator)))
            }
            ReferenceType::NamedRange(name) => self.eval_name(name),
        }
    }

    fn sheet_id(&self, sheet: Option<&str>) -> Result<SheetId, ExcelError> {
        match sheet {
            None => Ok(self.cell.sheet_id),
            Some(name) => self.evaluator.resolve_sheet(name).ok_or_else(|| {
                ExcelError::new_ref().with_message(format!("unknown sheet '{name}'"))
            }),
        }
    }

    fn eval_name(&self, name: &str) -> Result<CalcValue<'e>, ExcelError> {
        let definition = self
            .context()
            .resolve_name(name, self.cell.sheet_id)
            .ok_or_else(|| ExcelError::new_name().with_message(format!("undefined name '{name}'")))?;
        match definition {
            NamedDefinition::Cell(cell) => Ok(CalcValue::Reference(RefView::new(cell, self.evaluator))),
            NamedDefinition::Range(range) => Ok(CalcValue::Range(RangeView::new(range, self.evaluator))),
            NamedDefinition::Formula(ast) => self.eval_named_formula(name, &ast),
        }
    }

    fn eval_named_formula(&self, name: &str, ast: &Arc<ASTNode>) -> Result<CalcValue<'e>, ExcelError> {
        let key = name.to_ascii_uppercase();
        if self.names_in_flight.borrow().contains(&key) {
            #[cfg(feature = "tracing")]
            tracing::debug!(name, "name refers to itself");
            return Err(ExcelError::new(ExcelErrorKind::Circ)
                .with_message(format!("name '{name}' refers to itself")));
        }
        self.names_in_flight.borrow_mut().push(key);
        let value = self.evaluate_ast(ast);
        self.names_in_flight.borrow_mut().pop();
        Ok(value)
    }

    /* ===================  operators  =================== */

    fn eval_unary(&self, op: UnaryOperator, expr: &ASTNode) -> CalcValue<'e> {
        CalcValue::Scalar(operators::unary(op, self.evaluate_scalar(expr)))
    }

    fn eval_binary(&self, op: BinaryOperator, left: &ASTNode, right: &ASTNode) -> CalcValue<'e> {
        let l = self.evaluate_scalar(left);
        let r = self.evaluate_scalar(right);
        CalcValue::Scalar(operators::binary(op, l, r))
    }

    /* ===================  function calls  =================== */

    fn lookup_function(&self, name: &str) -> Option<Arc<dyn Function>> {
        function_registry::get(name).or_else(|| self.context().get_function(name))
    }

    fn eval_function(&self, name: &str, args: &[ASTNode]) -> CalcValue<'e> {
        let Some(fun) = self.lookup_function(name) else {
            #[cfg(feature = "tracing")]
            tracing::debug!(name, cell = %self.cell, "unresolved function");
            let kind = if function_registry::is_known_unimplemented(name) {
                ExcelErrorKind::NImpl
            } else {
                ExcelErrorKind::Name
            };
            return ExcelError::new(kind)
                .with_message(format!("function {name}"))
                .into();
        };

        let handles: SmallVec<[ArgumentHandle<'_, 'e>; 8]> =
            args.iter().map(|n| ArgumentHandle::new(n, self)).collect();
        match fun.dispatch(&handles, self) {
            Ok(v) if v.is_view() && !fun.caps().contains(FnCaps::RETURNS_REFERENCE) => {
                CalcValue::Scalar(self.narrow(&v))
            }
            Ok(v) => v,
            Err(e) => e.into(),
        }
    }
}

impl<'e> FunctionContext<'e> for Interpreter<'e> {
    fn current_cell(&self) -> CellRef {
        self.cell
    }

    fn evaluator(&self) -> &'e dyn CellEvaluator {
        self.evaluator
    }
}

/// One-based tree coordinates to a zero-based [`Coord`]. Row or column 0
/// and positions past the sheet edge are `#REF!`.
fn one_based(row: u32, col: u32) -> Result<Coord, ExcelError> {
    Coord::from_excel(row, col).map_err(|e| ExcelError::new_ref().with_message(e.to_string()))
}
