//! Operand resolution: narrowing views to scalars and converting scalars to
//! the primitive an operator or function wants.
//!
//! Every function here is total. Malformed input comes back as `None` or as
//! an `Err(ExcelError)`; an `Ok` never wraps an error value.

use std::cmp::Ordering;

use sheetcalc_common::{ExcelError, ExcelErrorKind, LiteralValue};

use crate::engine::range_view::RangeView;
use crate::traits::CalcValue;

/// Narrow `value` to a scalar for a formula located at (`src_row`, `src_col`).
///
/// * scalars pass through;
/// * a single-cell reference or 1×1 range yields its cell, wherever the
///   formula is;
/// * a one-column range yields the cell on the formula's row, a one-row
///   range the cell in the formula's column;
/// * anything else, or a formula outside the range's span, is `#VALUE!`.
pub fn get_single_value(
    value: &CalcValue<'_>,
    src_row: u32,
    src_col: u32,
) -> Result<LiteralValue, ExcelError> {
    let v = match value {
        CalcValue::Scalar(v) => v.clone(),
        CalcValue::Reference(r) => r.value(),
        CalcValue::Range(view) => choose_single_element(view, src_row, src_col)?,
    };
    match v {
        LiteralValue::Error(e) => Err(e),
        v => Ok(v),
    }
}

fn choose_single_element(
    view: &RangeView<'_>,
    src_row: u32,
    src_col: u32,
) -> Result<LiteralValue, ExcelError> {
    let no_intersection = || {
        ExcelError::new(ExcelErrorKind::Value).with_message(format!(
            "no implicit intersection of {} with row {src_row}, column {src_col}",
            view.range_ref()
        ))
    };
    match (view.is_row(), view.is_column()) {
        (true, true) => Ok(view.get_relative(0, 0)),
        (false, true) if view.contains_row(src_row) => {
            Ok(view.get_absolute(src_row, view.first_col()))
        }
        (true, false) if view.contains_col(src_col) => {
            Ok(view.get_absolute(view.first_row(), src_col))
        }
        _ => Err(no_intersection()),
    }
}

/// Number coercion: Blank is 0, booleans are 1/0, text must parse.
pub fn coerce_to_number(value: &LiteralValue) -> Result<f64, ExcelError> {
    match value {
        LiteralValue::Number(n) => Ok(*n),
        LiteralValue::Blank => Ok(0.0),
        LiteralValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        LiteralValue::Text(s) => parse_double(s).ok_or_else(|| {
            ExcelError::new(ExcelErrorKind::Value)
                .with_message(format!("cannot convert '{s}' to a number"))
        }),
        LiteralValue::Error(e) => Err(e.clone()),
    }
}

/// Strict decimal parser.
///
/// Accepts surrounding whitespace, an optional sign, digits with an optional
/// decimal point (`.1`, `1.`), and an optional exponent (`1E4`, `2e-3`).
/// Rejects everything else, including a lone sign, thousands separators,
/// `Infinity`, `NaN` and values that overflow.
pub fn parse_double(text: &str) -> Option<f64> {
    let s = text.trim();
    let bytes = s.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_digits = count_digits(&bytes[i..]);
    i += int_digits;

    let mut frac_digits = 0;
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        frac_digits = count_digits(&bytes[i..]);
        i += frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exp_digits = count_digits(&bytes[i..]);
        if exp_digits == 0 {
            return None;
        }
        i += exp_digits;
    }

    if i != bytes.len() {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Text coercion: numbers use general formatting, booleans `TRUE`/`FALSE`,
/// Blank is the empty string.
pub fn coerce_to_text(value: &LiteralValue) -> Result<String, ExcelError> {
    match value {
        LiteralValue::Text(s) => Ok(s.clone()),
        LiteralValue::Number(n) => Ok(number_to_text(*n)),
        LiteralValue::Boolean(true) => Ok("TRUE".to_string()),
        LiteralValue::Boolean(false) => Ok("FALSE".to_string()),
        LiteralValue::Blank => Ok(String::new()),
        LiteralValue::Error(e) => Err(e.clone()),
    }
}

/// General number format: up to 15 significant digits, no trailing zeros,
/// scientific notation (`1E+21`, `1.5E-10`) for very large or small
/// magnitudes.
pub fn number_to_text(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    let abs = n.abs();
    if (1e-9..1e21).contains(&abs) {
        return format!("{}", to_excel_precision(n));
    }
    let sci = format!("{n:.14e}");
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    let exp: i32 = exponent.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}E{sign}{:02}", exp.abs())
}

/// Boolean coercion. Blank gives `None`. Text is parsed as `TRUE`/`FALSE`
/// unless `strings_are_blank`, in which case it is ignored like a blank.
pub fn coerce_to_bool(
    value: &LiteralValue,
    strings_are_blank: bool,
) -> Result<Option<bool>, ExcelError> {
    match value {
        LiteralValue::Blank => Ok(None),
        LiteralValue::Boolean(b) => Ok(Some(*b)),
        LiteralValue::Number(n) => Ok(Some(*n != 0.0)),
        LiteralValue::Text(_) if strings_are_blank => Ok(None),
        LiteralValue::Text(s) => {
            if s.eq_ignore_ascii_case("TRUE") {
                Ok(Some(true))
            } else if s.eq_ignore_ascii_case("FALSE") {
                Ok(Some(false))
            } else {
                Err(ExcelError::new(ExcelErrorKind::Value)
                    .with_message(format!("cannot convert '{s}' to a boolean")))
            }
        }
        LiteralValue::Error(e) => Err(e.clone()),
    }
}

/// Integer coercion, truncating toward zero.
pub fn coerce_to_int(value: &LiteralValue) -> Result<i32, ExcelError> {
    let n = coerce_to_number(value)?.trunc();
    if n < i32::MIN as f64 || n > i32::MAX as f64 {
        return Err(ExcelError::new(ExcelErrorKind::Num));
    }
    Ok(n as i32)
}

/// Reject NaN and infinities with `#NUM!`.
#[inline]
pub fn checked(n: f64) -> Result<f64, ExcelError> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(ExcelError::new(ExcelErrorKind::Num))
    }
}

/// Round to 15 significant digits, the precision a spreadsheet displays and
/// compares at.
pub fn to_excel_precision(x: f64) -> f64 {
    if x == 0.0 || !x.is_finite() {
        return x;
    }
    format!("{x:.14e}").parse().unwrap_or(x)
}

/// Numeric ordering used by comparison operators and lookups.
///
/// `-0.0` orders before `+0.0`; other values compare at 15 significant
/// digits.
pub fn compare_numbers(a: f64, b: f64) -> Ordering {
    if a == 0.0 && b == 0.0 {
        return b.is_sign_negative().cmp(&a.is_sign_negative());
    }
    to_excel_precision(a)
        .partial_cmp(&to_excel_precision(b))
        .unwrap_or(Ordering::Equal)
}

/// Case-insensitive text ordering.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    if a.is_ascii() && b.is_ascii() {
        let a = a.bytes().map(|c| c.to_ascii_lowercase());
        let b = b.bytes().map(|c| c.to_ascii_lowercase());
        return a.cmp(b);
    }
    a.to_lowercase().cmp(&b.to_lowercase())
}
