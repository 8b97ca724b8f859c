use sheetcalc_common::{ExcelError, ExcelErrorKind, LiteralValue};

use crate::coercion::get_single_value;
use crate::function::Function;
use crate::func_caps;
use crate::macros::register_functions;
use crate::traits::{ArgumentHandle, CalcValue, FunctionContext};

/// The argument narrowed to one value, with errors kept as values.
fn inspected<'a, 'b>(arg: &ArgumentHandle<'a, 'b>, ctx: &dyn FunctionContext<'b>) -> LiteralValue {
    let here = ctx.current_cell();
    get_single_value(&arg.calc(), here.row(), here.col()).unwrap_or_else(LiteralValue::Error)
}

/// Declares a one-argument `IS*` predicate.
macro_rules! is_function {
    ($ty:ident, $name:literal, |$v:ident| $test:expr) => {
        #[derive(Debug)]
        pub struct $ty;
        impl Function for $ty {
            func_caps!(PURE, ERROR_AWARE);
            fn name(&self) -> &'static str {
                $name
            }
            fn min_args(&self) -> usize {
                1
            }
            fn eval<'a, 'b, 'c>(
                &self,
                args: &'c [ArgumentHandle<'a, 'b>],
                ctx: &dyn FunctionContext<'b>,
            ) -> Result<CalcValue<'b>, ExcelError> {
                let $v = inspected(&args[0], ctx);
                Ok(CalcValue::Scalar(LiteralValue::Boolean($test)))
            }
        }
    };
}

is_function!(IsErrorFn, "ISERROR", |v| v.is_error());
is_function!(IsErrFn, "ISERR", |v| v
    .error_kind()
    .is_some_and(|k| k != ExcelErrorKind::Na));
is_function!(IsNaFn, "ISNA", |v| v.error_kind() == Some(ExcelErrorKind::Na));
is_function!(IsBlankFn, "ISBLANK", |v| v.is_blank());
is_function!(IsNumberFn, "ISNUMBER", |v| matches!(v, LiteralValue::Number(_)));
is_function!(IsTextFn, "ISTEXT", |v| matches!(v, LiteralValue::Text(_)));
is_function!(IsLogicalFn, "ISLOGICAL", |v| matches!(v, LiteralValue::Boolean(_)));

#[derive(Debug)]
pub struct NaFn;
impl Function for NaFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "NA"
    }
    fn eval<'a, 'b, 'c>(
        &self,
        _args: &'c [ArgumentHandle<'a, 'b>],
        _ctx: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        Err(ExcelError::new_na())
    }
}

pub fn register_builtins() {
    register_functions!(
        IsErrorFn,
        IsErrFn,
        IsNaFn,
        IsBlankFn,
        IsNumberFn,
        IsTextFn,
        IsLogicalFn,
        NaFn,
    );
}

#[cfg(test)]
mod tests {
    use sheetcalc_core::{ASTNode, BinaryOperator};

    use crate::test_utils::{eval, eval_with};
    use crate::test_workbook::TestWorkbook;

    use super::*;

    fn is(name: &str, arg: ASTNode) -> LiteralValue {
        eval(ASTNode::function(name, vec![arg]))
    }

    #[test]
    fn error_predicates() {
        let na = ASTNode::function("NA", vec![]);
        let div = ASTNode::binary(BinaryOperator::Divide, ASTNode::number(1.0), ASTNode::number(0.0));
        let t = LiteralValue::Boolean(true);
        let f = LiteralValue::Boolean(false);
        assert_eq!(is("ISERROR", na.clone()), t);
        assert_eq!(is("ISERR", na.clone()), f);
        assert_eq!(is("ISNA", na.clone()), t);
        assert_eq!(is("ISERR", div.clone()), t);
        assert_eq!(is("ISNA", div), f);
        assert_eq!(is("ISNUMBER", na), f);
        assert_eq!(is("ISERROR", ASTNode::number(1.0)), f);
    }

    #[test]
    fn type_predicates() {
        let wb = TestWorkbook::new()
            .with_cell_a1("Sheet1", "A1", LiteralValue::text(""))
            .with_cell_a1("Sheet1", "A2", LiteralValue::Number(4.0));
        let check = |name: &str, arg: ASTNode| eval_with(wb.clone(), ASTNode::function(name, vec![arg]));
        assert_eq!(check("ISBLANK", ASTNode::cell(3, 1)), LiteralValue::Boolean(true));
        assert_eq!(check("ISBLANK", ASTNode::cell(1, 1)), LiteralValue::Boolean(false));
        assert_eq!(check("ISTEXT", ASTNode::cell(1, 1)), LiteralValue::Boolean(true));
        assert_eq!(check("ISNUMBER", ASTNode::cell(2, 1)), LiteralValue::Boolean(true));
        assert_eq!(check("ISLOGICAL", ASTNode::boolean(false)), LiteralValue::Boolean(true));
        assert_eq!(check("ISNUMBER", ASTNode::text("4")), LiteralValue::Boolean(false));
    }
}
