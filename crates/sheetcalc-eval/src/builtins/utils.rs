use sheetcalc_common::{ExcelError, ExcelErrorKind, LiteralValue};

use crate::coercion::{self, to_excel_precision};
use crate::traits::{ArgumentHandle, CalcValue};

/// Small epsilon used to detect near-zero denominators in trig/hyperbolic functions.
pub const EPSILON_NEAR_ZERO: f64 = 1e-12;

/// Get a single numeric argument.
pub fn unary_numeric_arg<'a, 'b>(
    args: &[ArgumentHandle<'a, 'b>],
) -> Result<f64, ExcelError> {
    match args.first() {
        Some(a) => a.number(),
        None => Err(ExcelError::new_value().with_message("expected 1 argument, got 0")),
    }
}

/// Get two numeric arguments, left to right.
pub fn binary_numeric_args<'a, 'b>(
    args: &[ArgumentHandle<'a, 'b>],
) -> Result<(f64, f64), ExcelError> {
    if args.len() < 2 {
        return Err(ExcelError::new_value()
            .with_message(format!("expected 2 arguments, got {}", args.len())));
    }
    Ok((args[0].number()?, args[1].number()?))
}

/// Optional numeric argument; omitted and missing arguments take `default`.
pub fn optional_number<'a, 'b>(
    args: &[ArgumentHandle<'a, 'b>],
    index: usize,
    default: f64,
) -> Result<f64, ExcelError> {
    match args.get(index) {
        Some(a) if !a.is_missing() => a.number(),
        _ => Ok(default),
    }
}

/// Convert NaN/±Inf to `#NUM!` and wrap the number.
pub fn sanitize_numeric_result<'b>(n: f64) -> Result<CalcValue<'b>, ExcelError> {
    coercion::checked(n).map(|n| CalcValue::Scalar(LiteralValue::Number(n)))
}

/// `-0.0` becomes `+0.0`; everything else is unchanged.
#[inline]
pub fn normalize_zero(x: f64) -> f64 {
    if x == 0.0 { 0.0 } else { x }
}

/// How [`round_to_digits`] treats the discarded part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundMode {
    /// Half away from zero.
    Nearest,
    /// Away from zero.
    Up,
    /// Toward zero.
    Down,
}

/// Rounding shared by `ROUND`, `ROUNDUP` and `ROUNDDOWN`. The scaled value is
/// first cut to 15 significant digits so that `ROUND(2.675, 2)` sees
/// `267.5` rather than `267.49999999999997`.
pub fn round_to_digits(x: f64, digits: i32, mode: RoundMode) -> f64 {
    if !x.is_finite() || x == 0.0 {
        return normalize_zero(x);
    }
    if digits > 300 {
        return x;
    }
    if digits < -300 {
        return 0.0;
    }
    let factor = 10f64.powi(digits.abs());
    let scaled = if digits >= 0 { x * factor } else { x / factor };
    let scaled = to_excel_precision(scaled);
    let rounded = match mode {
        RoundMode::Nearest => scaled.abs().round().copysign(scaled),
        RoundMode::Up => scaled.abs().ceil().copysign(scaled),
        RoundMode::Down => scaled.trunc(),
    };
    let out = if digits >= 0 {
        rounded / factor
    } else {
        rounded * factor
    };
    normalize_zero(to_excel_precision(out))
}

/// Visit the numbers an aggregate (`SUM`, `MAX`, …) sees.
///
/// Inside references and ranges only numeric cells count; text, booleans
/// and blanks are skipped and errors propagate. Direct scalar arguments are
/// coerced: booleans are 1/0, text must parse, blanks and omitted arguments
/// are skipped.
pub fn for_each_number<'a, 'b>(
    args: &[ArgumentHandle<'a, 'b>],
    mut f: impl FnMut(f64),
) -> Result<(), ExcelError> {
    for arg in args {
        match arg.calc() {
            CalcValue::Scalar(v) => match v {
                LiteralValue::Blank => {}
                LiteralValue::Error(e) => return Err(e),
                other => f(coercion::coerce_to_number(&other)?),
            },
            view => {
                let Some(range) = view.as_range_view() else {
                    continue;
                };
                for cell in range.iter() {
                    match cell {
                        LiteralValue::Number(n) => f(n),
                        LiteralValue::Error(e) => return Err(e),
                        _ => {}
                    }
                }
            }
        }
    }
    Ok(())
}

/// Collect every value of every argument, flattening views row-major.
/// Missing arguments contribute nothing.
pub fn flatten_values<'a, 'b>(args: &[ArgumentHandle<'a, 'b>]) -> Vec<LiteralValue> {
    let mut out = Vec::new();
    for arg in args {
        if arg.is_missing() {
            continue;
        }
        match arg.calc() {
            CalcValue::Scalar(v) => out.push(v),
            view => {
                if let Some(range) = view.as_range_view() {
                    out.extend(range.iter());
                }
            }
        }
    }
    out
}

/// `#VALUE!` with a message naming the function.
pub fn value_error(func: &str, msg: impl std::fmt::Display) -> ExcelError {
    ExcelError::new(ExcelErrorKind::Value).with_message(format!("{func}: {msg}"))
}
