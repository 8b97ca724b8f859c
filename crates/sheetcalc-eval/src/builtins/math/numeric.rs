use sheetcalc_common::{ExcelError, LiteralValue};

use super::super::utils::{
    RoundMode, binary_numeric_args, normalize_zero, optional_number, round_to_digits,
    sanitize_numeric_result, unary_numeric_arg,
};
use crate::coercion::{checked, to_excel_precision};
use crate::function::Function;
use crate::func_caps;
use crate::macros::register_functions;
use crate::traits::{ArgumentHandle, CalcValue, FunctionContext};

/* ─────────────────────────── ABS / SIGN / INT ─────────────────────── */

#[derive(Debug)]
pub struct AbsFn;
impl Function for AbsFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "ABS"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        sanitize_numeric_result(unary_numeric_arg(args)?.abs())
    }
}

#[derive(Debug)]
pub struct SignFn;
impl Function for SignFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "SIGN"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let x = unary_numeric_arg(args)?;
        let sign = if x > 0.0 {
            1.0
        } else if x < 0.0 {
            -1.0
        } else {
            0.0
        };
        Ok(CalcValue::number(sign))
    }
}

#[derive(Debug)]
pub struct IntFn;
impl Function for IntFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "INT"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        sanitize_numeric_result(normalize_zero(unary_numeric_arg(args)?.floor()))
    }
}

/* ─────────────────────────── rounding ─────────────────────────────── */

fn digits_arg(n: f64) -> i32 {
    n.trunc().clamp(-400.0, 400.0) as i32
}

#[derive(Debug)]
pub struct TruncFn;
impl Function for TruncFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "TRUNC"
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
        let x = args[0].number()?;
        let digits = digits_arg(optional_number(args, 1, 0.0)?);
        sanitize_numeric_result(round_to_digits(x, digits, RoundMode::Down))
    }
}

/// `ROUND`, `ROUNDUP` and `ROUNDDOWN` differ only in the rounding mode.
#[derive(Debug)]
pub struct RoundFn {
    name: &'static str,
    mode: RoundMode,
}

pub const ROUND: RoundFn = RoundFn {
    name: "ROUND",
    mode: RoundMode::Nearest,
};
pub const ROUNDUP: RoundFn = RoundFn {
    name: "ROUNDUP",
    mode: RoundMode::Up,
};
pub const ROUNDDOWN: RoundFn = RoundFn {
    name: "ROUNDDOWN",
    mode: RoundMode::Down,
};

impl Function for RoundFn {
    func_caps!(PURE);
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
        let (x, digits) = binary_numeric_args(args)?;
        sanitize_numeric_result(round_to_digits(x, digits_arg(digits), self.mode))
    }
}

/* ─────────────────────────── MOD / FLOOR / CEILING ────────────────── */

#[derive(Debug)]
pub struct ModFn;
impl Function for ModFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "MOD"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let (n, d) = binary_numeric_args(args)?;
        if d == 0.0 {
            return Err(ExcelError::new_div());
        }
        // Result takes the sign of the divisor.
        let mut r = n % d;
        if r != 0.0 && (r < 0.0) != (d < 0.0) {
            r += d;
        }
        sanitize_numeric_result(normalize_zero(r))
    }
}

/// Shared checks for `FLOOR` and `CEILING`: a positive number with a
/// negative significance is `#NUM!`.
fn snap_to_multiple(x: f64, significance: f64, op: fn(f64) -> f64) -> Result<f64, ExcelError> {
    if x > 0.0 && significance < 0.0 {
        return Err(ExcelError::new_num()
            .with_message("number and significance must have the same sign"));
    }
    let steps = op(to_excel_precision(x / significance));
    checked(normalize_zero(to_excel_precision(steps * significance)))
}

#[derive(Debug)]
pub struct FloorFn;
impl Function for FloorFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "FLOOR"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let (x, s) = binary_numeric_args(args)?;
        if s == 0.0 {
            return if x == 0.0 {
                Ok(CalcValue::number(0.0))
            } else {
                Err(ExcelError::new_div())
            };
        }
        snap_to_multiple(x, s, f64::floor).map(CalcValue::number)
    }
}

#[derive(Debug)]
pub struct CeilingFn;
impl Function for CeilingFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "CEILING"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let (x, s) = binary_numeric_args(args)?;
        if s == 0.0 {
            return Err(ExcelError::new_div());
        }
        snap_to_multiple(x, s, f64::ceil).map(CalcValue::number)
    }
}

/* ─────────────────────────── powers and logs ──────────────────────── */

#[derive(Debug)]
pub struct PowerFn;
impl Function for PowerFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "POWER"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let (base, exp) = binary_numeric_args(args)?;
        sanitize_numeric_result(normalize_zero(base.powf(exp)))
    }
}

#[derive(Debug)]
pub struct SqrtFn;
impl Function for SqrtFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "SQRT"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let x = unary_numeric_arg(args)?;
        if x < 0.0 {
            return Err(ExcelError::new_num());
        }
        sanitize_numeric_result(x.sqrt())
    }
}

#[derive(Debug)]
pub struct ExpFn;
impl Function for ExpFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "EXP"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        sanitize_numeric_result(unary_numeric_arg(args)?.exp())
    }
}

#[derive(Debug)]
pub struct LnFn;
impl Function for LnFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "LN"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let x = unary_numeric_arg(args)?;
        if x <= 0.0 {
            return Err(ExcelError::new_num());
        }
        sanitize_numeric_result(x.ln())
    }
}

#[derive(Debug)]
pub struct LogFn;
impl Function for LogFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "LOG"
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
        let x = args[0].number()?;
        let base = optional_number(args, 1, 10.0)?;
        if x <= 0.0 || base <= 0.0 {
            return Err(ExcelError::new_num());
        }
        if base == 1.0 {
            return Err(ExcelError::new_div());
        }
        sanitize_numeric_result(x.ln() / base.ln())
    }
}

#[derive(Debug)]
pub struct Log10Fn;
impl Function for Log10Fn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "LOG10"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let x = unary_numeric_arg(args)?;
        if x <= 0.0 {
            return Err(ExcelError::new_num());
        }
        sanitize_numeric_result(x.log10())
    }
}

#[derive(Debug)]
pub struct PiFn;
impl Function for PiFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "PI"
    }
    fn eval<'a, 'b, 'c>(
        &self,
        _args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        Ok(CalcValue::number(std::f64::consts::PI))
    }
}

/* ─────────────────────────── combinatorics ────────────────────────── */

#[derive(Debug)]
pub struct FactFn;
impl Function for FactFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "FACT"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let n = unary_numeric_arg(args)?.trunc();
        if n < 0.0 {
            return Err(ExcelError::new_num());
        }
        // 171! overflows; stop early instead of looping.
        if n > 170.0 {
            return Err(ExcelError::new_num());
        }
        let fact = (2..=n as u32).fold(1.0_f64, |acc, k| acc * k as f64);
        sanitize_numeric_result(fact)
    }
}

#[derive(Debug)]
pub struct CombinFn;
impl Function for CombinFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "COMBIN"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let (n, k) = binary_numeric_args(args)?;
        let (n, k) = (n.trunc(), k.trunc());
        if n < 0.0 || k < 0.0 || n < k {
            return Err(ExcelError::new_num());
        }
        let k = k.min(n - k);
        let mut acc = 1.0_f64;
        let mut i = 1.0;
        while i <= k {
            acc = acc * (n - k + i) / i;
            if !acc.is_finite() {
                return Err(ExcelError::new_num());
            }
            i += 1.0;
        }
        sanitize_numeric_result(acc.round())
    }
}

#[derive(Debug)]
pub struct EvenFn;
impl Function for EvenFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "EVEN"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let x = unary_numeric_arg(args)?;
        let even = ((x.abs() / 2.0).ceil() * 2.0).copysign(x);
        sanitize_numeric_result(normalize_zero(even))
    }
}

#[derive(Debug)]
pub struct OddFn;
impl Function for OddFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "ODD"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let x = unary_numeric_arg(args)?;
        let odd = ((x.abs() + 1.0) / 2.0).ceil() * 2.0 - 1.0;
        let odd = if x < 0.0 { -odd } else { odd };
        sanitize_numeric_result(odd)
    }
}

/* ─────────────────────────── ROMAN ────────────────────────────────── */

const ROMAN_DIGITS: [(u32, &str); 13] = [
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

/// Rewrites applied in order to reach each more concise form. Each entry
/// applies to forms `>= min_form` (and `<= max_form`).
const ROMAN_REWRITES: &[(u8, u8, &str, &str)] = &[
    (1, 4, "XLV", "VL"),
    (1, 4, "XCV", "VC"),
    (1, 4, "CDL", "LD"),
    (1, 4, "CML", "LM"),
    (1, 4, "CMVC", "LMVL"),
    (1, 1, "CDXC", "LDXL"),
    (1, 1, "CDVC", "LDVL"),
    (1, 1, "CMXC", "LMXL"),
    (1, 1, "XCIX", "VCIV"),
    (1, 1, "XLIX", "VLIV"),
    (2, 4, "XLIX", "IL"),
    (2, 4, "XCIX", "IC"),
    (2, 4, "CDXC", "XD"),
    (2, 4, "CDVC", "XDV"),
    (2, 4, "CDIC", "XDIX"),
    (2, 4, "LMVL", "XMV"),
    (2, 4, "CMIC", "XMIX"),
    (2, 4, "CMXC", "XM"),
    (3, 4, "XDV", "VD"),
    (3, 4, "XDIX", "VDIV"),
    (3, 4, "XMV", "VM"),
    (3, 4, "XMIX", "VMIV"),
    (4, 4, "VDIV", "ID"),
    (4, 4, "VMIV", "IM"),
];

/// Roman numeral for `0..=3999` in conciseness form `0..=4`.
pub fn to_roman(number: u32, form: u8) -> String {
    let mut rest = number;
    let mut out = String::new();
    for (value, digits) in ROMAN_DIGITS {
        while rest >= value {
            out.push_str(digits);
            rest -= value;
        }
    }
    for &(min_form, max_form, from, to) in ROMAN_REWRITES {
        if (min_form..=max_form).contains(&form) {
            out = out.replace(from, to);
        }
    }
    out
}

#[derive(Debug)]
pub struct RomanFn;
impl Function for RomanFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "ROMAN"
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
        let number = args[0].number()?.trunc();
        if !(0.0..=3999.0).contains(&number) {
            return Err(ExcelError::new_value()
                .with_message(format!("ROMAN: {number} is outside 0..3999")));
        }
        let form = match args.get(1) {
            None => 0.0,
            Some(a) if a.is_missing() => 0.0,
            Some(a) => match a.value()? {
                LiteralValue::Boolean(true) => 0.0,
                LiteralValue::Boolean(false) => 4.0,
                other => crate::coercion::coerce_to_number(&other)?.trunc(),
            },
        };
        if !(0.0..=4.0).contains(&form) {
            return Err(ExcelError::new_value().with_message(format!("ROMAN: form {form}")));
        }
        Ok(CalcValue::Scalar(LiteralValue::Text(to_roman(
            number as u32,
            form as u8,
        ))))
    }
}

pub fn register_builtins() {
    register_functions!(
        AbsFn, SignFn, IntFn, TruncFn, ROUND, ROUNDUP, ROUNDDOWN, ModFn, FloorFn, CeilingFn,
        PowerFn, SqrtFn, ExpFn, LnFn, LogFn, Log10Fn, PiFn, FactFn, CombinFn, EvenFn, OddFn,
        RomanFn,
    );
}
