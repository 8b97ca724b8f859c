//! Logical functions: `IF`, `AND`, `OR`, `NOT`, `TRUE`, `FALSE`, `IFERROR`
//! and `CHOOSE`.

use sheetcalc_common::{ExcelError, LiteralValue};

use crate::coercion::{coerce_to_bool, get_single_value};
use crate::function::Function;
use crate::func_caps;
use crate::macros::register_functions;
use crate::traits::{ArgumentHandle, CalcValue, FunctionContext};

/* ─────────────────────────── TRUE() / FALSE() ─────────────────────── */

#[derive(Debug)]
pub struct TrueFn;
impl Function for TrueFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "TRUE"
    }
    fn eval<'a, 'b, 'c>(
        &self,
        _args: &'c [ArgumentHandle<'a, 'b>],
        _ctx: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        Ok(CalcValue::Scalar(LiteralValue::Boolean(true)))
    }
}

#[derive(Debug)]
pub struct FalseFn;
impl Function for FalseFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "FALSE"
    }
    fn eval<'a, 'b, 'c>(
        &self,
        _args: &'c [ArgumentHandle<'a, 'b>],
        _ctx: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        Ok(CalcValue::Scalar(LiteralValue::Boolean(false)))
    }
}

/* ─────────────────────────── IF() ──────────────────────────────────── */

/// Only the branch selected by the condition is evaluated. A blank
/// condition is FALSE; an omitted FALSE branch yields `FALSE`.
#[derive(Debug)]
pub struct IfFn;
impl Function for IfFn {
    func_caps!(PURE, SHORT_CIRCUIT, RETURNS_REFERENCE);
    fn name(&self) -> &'static str {
        "IF"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _ctx: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let cond = coerce_to_bool(&args[0].value()?, false)?.unwrap_or(false);
        if cond {
            Ok(args[1].calc())
        } else if let Some(otherwise) = args.get(2) {
            Ok(otherwise.calc())
        } else {
            Ok(CalcValue::Scalar(LiteralValue::Boolean(false)))
        }
    }
}

/* ─────────────────────────── AND() / OR() ─────────────────────────── */

/// Fold the booleans found in `args`.
///
/// Direct text must read `TRUE`/`FALSE`; text and blanks inside ranges are
/// ignored. No boolean at all is `#VALUE!`. Every argument is visited so
/// that an error anywhere propagates.
fn fold_booleans<'a, 'b>(
    args: &[ArgumentHandle<'a, 'b>],
    init: bool,
    step: fn(bool, bool) -> bool,
) -> Result<bool, ExcelError> {
    let mut acc: Option<bool> = None;
    let mut push = |b: bool| acc = Some(step(acc.unwrap_or(init), b));
    for arg in args {
        match arg.calc() {
            CalcValue::Scalar(v) => {
                if let Some(b) = coerce_to_bool(&v, false)? {
                    push(b);
                }
            }
            view => {
                if let Some(range) = view.as_range_view() {
                    for cell in range.iter() {
                        if let Some(b) = coerce_to_bool(&cell, true)? {
                            push(b);
                        }
                    }
                }
            }
        }
    }
    acc.ok_or_else(|| ExcelError::new_value().with_message("no logical values"))
}

#[derive(Debug)]
pub struct AndFn;
impl Function for AndFn {
    func_caps!(PURE, REDUCTION);
    fn name(&self) -> &'static str {
        "AND"
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
        _ctx: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let all = fold_booleans(args, true, |acc, b| acc && b)?;
        Ok(CalcValue::Scalar(LiteralValue::Boolean(all)))
    }
}

#[derive(Debug)]
pub struct OrFn;
impl Function for OrFn {
    func_caps!(PURE, REDUCTION);
    fn name(&self) -> &'static str {
        "OR"
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
        _ctx: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let any = fold_booleans(args, false, |acc, b| acc || b)?;
        Ok(CalcValue::Scalar(LiteralValue::Boolean(any)))
    }
}

/* ─────────────────────────── NOT() ─────────────────────────────────── */

#[derive(Debug)]
pub struct NotFn;
impl Function for NotFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "NOT"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _ctx: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let b = coerce_to_bool(&args[0].value()?, false)?.unwrap_or(false);
        Ok(CalcValue::Scalar(LiteralValue::Boolean(!b)))
    }
}

/* ─────────────────────────── IFERROR() ────────────────────────────── */

#[derive(Debug)]
pub struct IfErrorFn;
impl Function for IfErrorFn {
    func_caps!(PURE, SHORT_CIRCUIT, ERROR_AWARE);
    fn name(&self) -> &'static str {
        "IFERROR"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let here = ctx.current_cell();
        match get_single_value(&args[0].calc(), here.row(), here.col()) {
            Ok(v) => Ok(CalcValue::Scalar(v)),
            Err(_) => Ok(args[1].calc()),
        }
    }
}

/* ─────────────────────────── CHOOSE() ─────────────────────────────── */

#[derive(Debug)]
pub struct ChooseFn;
impl Function for ChooseFn {
    func_caps!(PURE, SHORT_CIRCUIT, RETURNS_REFERENCE);
    fn name(&self) -> &'static str {
        "CHOOSE"
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
        _ctx: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let index = args[0].number()?.trunc();
        if index < 1.0 || index >= args.len() as f64 {
            return Err(ExcelError::new_value()
                .with_message(format!("CHOOSE index {index} out of range")));
        }
        Ok(args[index as usize].calc())
    }
}

pub fn register_builtins() {
    register_functions!(TrueFn, FalseFn, IfFn, AndFn, OrFn, NotFn, IfErrorFn, ChooseFn);
}

#[cfg(test)]
mod tests {
    use sheetcalc_common::ExcelErrorKind;
    use sheetcalc_core::ASTNode;

    use crate::test_utils::{eval, eval_with};
    use crate::test_workbook::TestWorkbook;

    use super::*;

    fn f(name: &str, args: Vec<ASTNode>) -> ASTNode {
        ASTNode::function(name, args)
    }

    #[test]
    fn if_selects_branch() {
        let yes = f("IF", vec![ASTNode::boolean(true), ASTNode::number(1.0), ASTNode::number(2.0)]);
        assert_eq!(eval(yes), LiteralValue::Number(1.0));
        let no = f("IF", vec![ASTNode::number(0.0), ASTNode::number(1.0)]);
        assert_eq!(eval(no), LiteralValue::Boolean(false));
        let text = f("IF", vec![ASTNode::text("maybe"), ASTNode::number(1.0)]);
        assert_eq!(eval(text), LiteralValue::error(ExcelErrorKind::Value));
    }

    #[test]
    fn if_does_not_evaluate_the_other_branch() {
        // B1 refers to itself; only touching it would produce #CIRC!.
        let wb = TestWorkbook::new().with_formula_a1("Sheet1", "B1", ASTNode::cell(1, 2));
        let ast = f(
            "IF",
            vec![ASTNode::boolean(true), ASTNode::text("safe"), ASTNode::cell(1, 2)],
        );
        assert_eq!(eval_with(wb, ast), LiteralValue::text("safe"));
    }

    #[test]
    fn if_blank_condition_is_false() {
        let ast = f("IF", vec![ASTNode::cell(1, 1), ASTNode::number(1.0), ASTNode::number(2.0)]);
        assert_eq!(eval(ast), LiteralValue::Number(2.0));
    }

    #[test]
    fn and_or_over_ranges() {
        let wb = TestWorkbook::new().with_range(
            "Sheet1",
            1,
            1,
            vec![vec![
                LiteralValue::Boolean(true),
                LiteralValue::text("ignored"),
                LiteralValue::Number(1.0),
            ]],
        );
        let range = ASTNode::range(1, 1, 1, 3);
        assert_eq!(
            eval_with(wb.clone(), f("AND", vec![range.clone()])),
            LiteralValue::Boolean(true)
        );
        assert_eq!(
            eval_with(wb, f("OR", vec![range, ASTNode::boolean(false)])),
            LiteralValue::Boolean(true)
        );
        assert_eq!(
            eval(f("AND", vec![ASTNode::cell(9, 9)])),
            LiteralValue::error(ExcelErrorKind::Value)
        );
        assert_eq!(
            eval(f("OR", vec![ASTNode::text("true"), ASTNode::boolean(false)])),
            LiteralValue::Boolean(true)
        );
    }

    #[test]
    fn iferror_and_choose() {
        let div = ASTNode::binary(
            sheetcalc_core::BinaryOperator::Divide,
            ASTNode::number(1.0),
            ASTNode::number(0.0),
        );
        assert_eq!(
            eval(f("IFERROR", vec![div, ASTNode::text("oops")])),
            LiteralValue::text("oops")
        );
        assert_eq!(
            eval(f("IFERROR", vec![ASTNode::number(3.0), ASTNode::text("oops")])),
            LiteralValue::Number(3.0)
        );
        let choose = |i: f64| {
            eval(f(
                "CHOOSE",
                vec![ASTNode::number(i), ASTNode::text("a"), ASTNode::text("b")],
            ))
        };
        assert_eq!(choose(2.9), LiteralValue::text("b"));
        assert_eq!(choose(0.0), LiteralValue::error(ExcelErrorKind::Value));
        assert_eq!(choose(3.0), LiteralValue::error(ExcelErrorKind::Value));
        assert_eq!(eval(f("NOT", vec![ASTNode::cell(5, 5)])), LiteralValue::Boolean(true));
    }
}
