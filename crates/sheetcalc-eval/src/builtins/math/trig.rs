use sheetcalc_common::ExcelError;

use super::super::utils::{
    EPSILON_NEAR_ZERO, binary_numeric_args, normalize_zero, sanitize_numeric_result,
    unary_numeric_arg,
};
use crate::function::Function;
use crate::func_caps;
use crate::macros::register_functions;
use crate::traits::{ArgumentHandle, CalcValue, FunctionContext};

/// One-argument function over `f64`. Non-finite results become `#NUM!`.
macro_rules! unary_trig {
    ($ty:ident, $name:literal, $f:expr) => {
        #[derive(Debug)]
        pub struct $ty;
        impl Function for $ty {
            func_caps!(PURE);
            fn name(&self) -> &'static str {
                $name
            }
            fn min_args(&self) -> usize {
                1
            }
            fn eval<'a, 'b, 'c>(
                &self,
                args: &'c [ArgumentHandle<'a, 'b>],
                _: &dyn FunctionContext<'b>,
            ) -> Result<CalcValue<'b>, ExcelError> {
                let f: fn(f64) -> f64 = $f;
                sanitize_numeric_result(normalize_zero(f(unary_numeric_arg(args)?)))
            }
        }
    };
}

/* ─────────────────────────── circular ─────────────────────────────── */

unary_trig!(SinFn, "SIN", f64::sin);
unary_trig!(CosFn, "COS", f64::cos);
unary_trig!(TanFn, "TAN", f64::tan);
unary_trig!(AsinFn, "ASIN", f64::asin);
unary_trig!(AcosFn, "ACOS", f64::acos);
unary_trig!(AtanFn, "ATAN", f64::atan);

/// `ATAN2(x, y)`: the angle of the point (x, y).
#[derive(Debug)]
pub struct Atan2Fn;
impl Function for Atan2Fn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "ATAN2"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let (x, y) = binary_numeric_args(args)?;
        if x == 0.0 && y == 0.0 {
            return Err(ExcelError::new_div());
        }
        sanitize_numeric_result(y.atan2(x))
    }
}

/* ─────────────────────────── hyperbolic ───────────────────────────── */

unary_trig!(SinhFn, "SINH", f64::sinh);
unary_trig!(CoshFn, "COSH", f64::cosh);
unary_trig!(TanhFn, "TANH", f64::tanh);
unary_trig!(AsinhFn, "ASINH", f64::asinh);
unary_trig!(AcoshFn, "ACOSH", f64::acosh);

#[derive(Debug)]
pub struct AtanhFn;
impl Function for AtanhFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "ATANH"
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
        if (1.0 - x.abs()) < EPSILON_NEAR_ZERO {
            return Err(ExcelError::new_num());
        }
        sanitize_numeric_result(normalize_zero(x.atanh()))
    }
}

/* ─────────────────────────── angle units ──────────────────────────── */

unary_trig!(DegreesFn, "DEGREES", f64::to_degrees);
unary_trig!(RadiansFn, "RADIANS", f64::to_radians);

pub fn register_builtins() {
    register_functions!(
        SinFn, CosFn, TanFn, AsinFn, AcosFn, AtanFn, Atan2Fn, SinhFn, CoshFn, TanhFn, AsinhFn,
        AcoshFn, AtanhFn, DegreesFn, RadiansFn,
    );
}
