//! Base conversions between decimal and binary, octal or hexadecimal.
//!
//! Non-decimal values are at most 10 digits. A 10-digit value whose leading
//! digit has its high bit set is negative (two's complement over 10
//! digits).

use sheetcalc_common::ExcelError;

use super::utils::optional_number;
use crate::coercion::coerce_to_text;
use crate::function::Function;
use crate::func_caps;
use crate::macros::register_functions;
use crate::traits::{ArgumentHandle, CalcValue, FunctionContext};

const MAX_DIGITS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Binary,
    Octal,
    Hex,
}

impl Radix {
    fn base(self) -> u32 {
        match self {
            Radix::Binary => 2,
            Radix::Octal => 8,
            Radix::Hex => 16,
        }
    }

    /// `base^10`, the modulus of the two's-complement encoding.
    fn modulus(self) -> i64 {
        (self.base() as i64).pow(MAX_DIGITS)
    }

    fn format(self, n: u64) -> String {
        match self {
            Radix::Binary => format!("{n:b}"),
            Radix::Octal => format!("{n:o}"),
            Radix::Hex => format!("{n:X}"),
        }
    }
}

/// Decode a value of up to 10 digits.
pub fn to_decimal(text: &str, radix: Radix) -> Result<f64, ExcelError> {
    if text.is_empty() {
        return Ok(0.0);
    }
    let len = text.chars().count();
    if len > MAX_DIGITS as usize {
        return Err(ExcelError::new_num()
            .with_message(format!("'{text}' has more than {MAX_DIGITS} digits")));
    }
    let mut value: i64 = 0;
    let mut leading = 0;
    for (i, ch) in text.chars().enumerate() {
        let digit = ch.to_digit(radix.base()).ok_or_else(|| {
            ExcelError::new_num().with_message(format!("'{ch}' is not a base-{} digit", radix.base()))
        })?;
        if i == 0 {
            leading = digit;
        }
        value = value * radix.base() as i64 + digit as i64;
    }
    if len == MAX_DIGITS as usize && leading >= radix.base() / 2 {
        value -= radix.modulus();
    }
    Ok(value as f64)
}

/// Encode `n`, padding non-negative results to `places` digits.
pub fn from_decimal(n: f64, places: Option<f64>, radix: Radix) -> Result<String, ExcelError> {
    let half = radix.modulus() / 2;
    let n = n.trunc();
    if n < -(half as f64) || n > (half - 1) as f64 {
        return Err(ExcelError::new_num()
            .with_message(format!("{n} is out of range for base {}", radix.base())));
    }
    let n = n as i64;
    if n < 0 {
        return Ok(radix.format((radix.modulus() + n) as u64));
    }
    let digits = radix.format(n as u64);
    let Some(places) = places else {
        return Ok(digits);
    };
    let places = places.trunc();
    if places < 0.0 || places > MAX_DIGITS as f64 || (places as usize) < digits.len() {
        return Err(ExcelError::new_num()
            .with_message(format!("{digits} does not fit in {places} places")));
    }
    Ok(format!("{digits:0>width$}", width = places as usize))
}

/// `BIN2DEC`, `OCT2DEC`, `HEX2DEC`.
#[derive(Debug)]
pub struct ToDecimalFn {
    name: &'static str,
    radix: Radix,
}

pub const BIN2DEC: ToDecimalFn = ToDecimalFn {
    name: "BIN2DEC",
    radix: Radix::Binary,
};
pub const OCT2DEC: ToDecimalFn = ToDecimalFn {
    name: "OCT2DEC",
    radix: Radix::Octal,
};
pub const HEX2DEC: ToDecimalFn = ToDecimalFn {
    name: "HEX2DEC",
    radix: Radix::Hex,
};

impl Function for ToDecimalFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        self.name
    }
    fn min_args(&self) -> usize {
        1
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let text = coerce_to_text(&args[0].value()?)?;
        to_decimal(&text, self.radix).map(CalcValue::number)
    }
}

/// `DEC2BIN`, `DEC2OCT`, `DEC2HEX`.
#[derive(Debug)]
pub struct FromDecimalFn {
    name: &'static str,
    radix: Radix,
}

pub const DEC2BIN: FromDecimalFn = FromDecimalFn {
    name: "DEC2BIN",
    radix: Radix::Binary,
};
pub const DEC2OCT: FromDecimalFn = FromDecimalFn {
    name: "DEC2OCT",
    radix: Radix::Octal,
};
pub const DEC2HEX: FromDecimalFn = FromDecimalFn {
    name: "DEC2HEX",
    radix: Radix::Hex,
};

impl Function for FromDecimalFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        self.name
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
        let n = args[0].number()?;
        let places = match args.get(1) {
            Some(a) if !a.is_missing() => Some(optional_number(args, 1, 0.0)?),
            _ => None,
        };
        let text = from_decimal(n, places, self.radix)?;
        Ok(CalcValue::Scalar(sheetcalc_common::LiteralValue::Text(text)))
    }
}

pub fn register_builtins() {
    register_functions!(BIN2DEC, OCT2DEC, HEX2DEC, DEC2BIN, DEC2OCT, DEC2HEX);
}
