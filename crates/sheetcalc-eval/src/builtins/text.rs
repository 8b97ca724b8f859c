//! Text functions. Lengths and positions count characters, not bytes.

use sheetcalc_common::{ExcelError, LiteralValue};

use super::utils::{optional_number, value_error};
use crate::coercion::parse_double;
use crate::function::Function;
use crate::func_caps;
use crate::macros::register_functions;
use crate::traits::{ArgumentHandle, CalcValue, FunctionContext};

/// Longest string a cell can hold.
const MAX_TEXT_LEN: usize = 32_767;

fn text_result<'b>(s: String) -> Result<CalcValue<'b>, ExcelError> {
    Ok(CalcValue::Scalar(LiteralValue::Text(s)))
}

/// Character count argument; negative counts are `#VALUE!`.
fn count_arg<'a, 'b>(
    args: &[ArgumentHandle<'a, 'b>],
    index: usize,
    func: &str,
) -> Result<usize, ExcelError> {
    let n = optional_number(args, index, 1.0)?.trunc();
    if n < 0.0 {
        return Err(value_error(func, "count cannot be negative"));
    }
    Ok(n.min(MAX_TEXT_LEN as f64) as usize)
}

/* ─────────────────────────── LEN / LEFT / RIGHT / MID ─────────────── */

#[derive(Debug)]
pub struct LenFn;
impl Function for LenFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "LEN"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let s = args[0].text()?;
        Ok(CalcValue::number(s.chars().count() as f64))
    }
}

#[derive(Debug)]
pub struct LeftFn;
impl Function for LeftFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "LEFT"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let s = args[0].text()?;
        let n = count_arg(args, 1, "LEFT")?;
        text_result(s.chars().take(n).collect())
    }
}

#[derive(Debug)]
pub struct RightFn;
impl Function for RightFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "RIGHT"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let s = args[0].text()?;
        let n = count_arg(args, 1, "RIGHT")?;
        let len = s.chars().count();
        text_result(s.chars().skip(len.saturating_sub(n)).collect())
    }
}

#[derive(Debug)]
pub struct MidFn;
impl Function for MidFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "MID"
    }
    fn min_args(&self) -> usize {
        3
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let s = args[0].text()?;
        let start = args[1].number()?.trunc();
        if start < 1.0 {
            return Err(value_error("MID", "start must be at least 1"));
        }
        let n = count_arg(args, 2, "MID")?;
        let skip = (start as usize).saturating_sub(1);
        text_result(s.chars().skip(skip).take(n).collect())
    }
}

/* ─────────────────────────── case and spacing ─────────────────────── */

#[derive(Debug)]
pub struct UpperFn;
impl Function for UpperFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "UPPER"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        text_result(args[0].text()?.to_uppercase())
    }
}

#[derive(Debug)]
pub struct LowerFn;
impl Function for LowerFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "LOWER"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        text_result(args[0].text()?.to_lowercase())
    }
}

/// Strips leading and trailing spaces and collapses inner runs to one.
#[derive(Debug)]
pub struct TrimFn;
impl Function for TrimFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "TRIM"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let s = args[0].text()?;
        let words: Vec<&str> = s.split(' ').filter(|w| !w.is_empty()).collect();
        text_result(words.join(" "))
    }
}

/* ─────────────────────────── joining and comparing ────────────────── */

#[derive(Debug)]
pub struct ConcatenateFn;
impl Function for ConcatenateFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "CONCATENATE"
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
        let mut out = String::new();
        for arg in args {
            out.push_str(&arg.text()?);
        }
        text_result(out)
    }
}

/// Case-sensitive equality.
#[derive(Debug)]
pub struct ExactFn;
impl Function for ExactFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "EXACT"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let a = args[0].text()?;
        let b = args[1].text()?;
        Ok(CalcValue::Scalar(LiteralValue::Boolean(a == b)))
    }
}

#[derive(Debug)]
pub struct ReptFn;
impl Function for ReptFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "REPT"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let s = args[0].text()?;
        let times = args[1].number()?.trunc();
        if times < 0.0 {
            return Err(value_error("REPT", "count cannot be negative"));
        }
        if s.chars().count() as f64 * times > MAX_TEXT_LEN as f64 {
            return Err(value_error("REPT", "result is too long"));
        }
        text_result(s.repeat(times as usize))
    }
}

/// Text to number. Numbers pass through, blanks are 0, booleans are
/// `#VALUE!`.
#[derive(Debug)]
pub struct ValueFn;
impl Function for ValueFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "VALUE"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        match args[0].value()? {
            LiteralValue::Number(n) => Ok(CalcValue::number(n)),
            LiteralValue::Blank => Ok(CalcValue::number(0.0)),
            LiteralValue::Text(s) => parse_double(&s)
                .map(CalcValue::number)
                .ok_or_else(|| value_error("VALUE", format!("'{s}' is not a number"))),
            other => Err(value_error("VALUE", format!("cannot convert {}", other.type_name()))),
        }
    }
}

pub fn register_builtins() {
    register_functions!(
        LenFn,
        LeftFn,
        RightFn,
        MidFn,
        UpperFn,
        LowerFn,
        TrimFn,
        ConcatenateFn,
        ExactFn,
        ReptFn,
        ValueFn,
    );
}

#[cfg(test)]
mod tests {
    use sheetcalc_common::ExcelErrorKind;
    use sheetcalc_core::ASTNode;

    use crate::test_utils::eval;

    use super::*;

    fn call(name: &str, args: Vec<ASTNode>) -> LiteralValue {
        eval(ASTNode::function(name, args))
    }

    fn s(text: &str) -> ASTNode {
        ASTNode::text(text)
    }

    fn n(v: f64) -> ASTNode {
        ASTNode::number(v)
    }

    #[test]
    fn slicing() {
        assert_eq!(call("LEN", vec![s("héllo")]), LiteralValue::Number(5.0));
        assert_eq!(call("LEN", vec![n(12.5)]), LiteralValue::Number(4.0));
        assert_eq!(call("LEFT", vec![s("héllo")]), LiteralValue::text("h"));
        assert_eq!(call("LEFT", vec![s("héllo"), n(2.0)]), LiteralValue::text("hé"));
        assert_eq!(call("RIGHT", vec![s("héllo"), n(10.0)]), LiteralValue::text("héllo"));
        assert_eq!(call("MID", vec![s("spreadsheet"), n(7.0), n(5.0)]), LiteralValue::text("sheet"));
        assert_eq!(call("MID", vec![s("abc"), n(9.0), n(1.0)]), LiteralValue::text(""));
        assert_eq!(
            call("MID", vec![s("abc"), n(0.0), n(1.0)]),
            LiteralValue::error(ExcelErrorKind::Value)
        );
        assert_eq!(
            call("LEFT", vec![s("abc"), n(-1.0)]),
            LiteralValue::error(ExcelErrorKind::Value)
        );
    }

    #[test]
    fn case_trim_and_join() {
        assert_eq!(call("UPPER", vec![s("abc")]), LiteralValue::text("ABC"));
        assert_eq!(call("LOWER", vec![ASTNode::boolean(true)]), LiteralValue::text("true"));
        assert_eq!(call("TRIM", vec![s("  a   b  c ")]), LiteralValue::text("a b c"));
        assert_eq!(
            call("CONCATENATE", vec![s("a"), n(1.0), ASTNode::boolean(false)]),
            LiteralValue::text("a1FALSE")
        );
        assert_eq!(call("EXACT", vec![s("Abc"), s("abc")]), LiteralValue::Boolean(false));
        assert_eq!(call("EXACT", vec![n(1.0), s("1")]), LiteralValue::Boolean(true));
        assert_eq!(call("REPT", vec![s("ab"), n(3.0)]), LiteralValue::text("ababab"));
        assert_eq!(
            call("REPT", vec![s("ab"), n(20000.0)]),
            LiteralValue::error(ExcelErrorKind::Value)
        );
    }

    #[test]
    fn value_conversion() {
        assert_eq!(call("VALUE", vec![s(" 1e3 ")]), LiteralValue::Number(1000.0));
        assert_eq!(call("VALUE", vec![s("1,000")]), LiteralValue::error(ExcelErrorKind::Value));
        assert_eq!(
            call("VALUE", vec![ASTNode::boolean(true)]),
            LiteralValue::error(ExcelErrorKind::Value)
        );
    }
}
