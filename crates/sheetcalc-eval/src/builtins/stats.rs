use sheetcalc_common::ExcelError;

use super::utils::{for_each_number, sanitize_numeric_result};
use crate::coercion::coerce_to_bool;
use crate::function::Function;
use crate::func_caps;
use crate::macros::register_functions;
use crate::traits::{ArgumentHandle, CalcValue, FunctionContext};

/// Poisson probability of exactly `x` events (or at most `x` when
/// `cumulative`) for a mean of `mean`. Terms are built iteratively in log
/// space, so neither `x!` nor `e^-mean` underflows for large inputs.
pub fn poisson(x: u64, mean: f64, cumulative: bool) -> f64 {
    if mean == 0.0 {
        return if cumulative || x == 0 { 1.0 } else { 0.0 };
    }
    let ln_mean = mean.ln();
    let mut ln_term = -mean;
    let mut total = ln_term.exp();
    for i in 1..=x {
        ln_term += ln_mean - (i as f64).ln();
        // Past the mode the terms only shrink; stop once they vanish.
        if i as f64 > mean && ln_term < -745.0 {
            return if cumulative { total } else { 0.0 };
        }
        if cumulative {
            total += ln_term.exp();
        }
    }
    if cumulative { total } else { ln_term.exp() }
}

/// `POISSON(x, mean, cumulative)`, also registered as `POISSON.DIST`.
#[derive(Debug)]
pub struct PoissonFn;
impl Function for PoissonFn {
    func_caps!(PURE);
    fn name(&self) -> &'static str {
        "POISSON"
    }
    fn aliases(&self) -> &'static [&'static str] {
        &["POISSON.DIST"]
    }
    fn min_args(&self) -> usize {
        3
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let x = args[0].number()?.trunc();
        let mean = args[1].number()?;
        let cumulative = coerce_to_bool(&args[2].value()?, false)?.unwrap_or(false);
        if x < 0.0 || mean < 0.0 {
            return Err(ExcelError::new_num());
        }
        // Degenerate distribution at zero.
        if x == 0.0 && mean == 0.0 {
            return Ok(CalcValue::number(1.0));
        }
        sanitize_numeric_result(poisson(x as u64, mean, cumulative))
    }
}

/* ─────────────────── STDEV / STDEVP / VAR / VARP ──────────────────── */

/// Variance around the mean. The sample form divides by `n - 1` and needs
/// two values; the population form needs one.
pub fn variance(values: &[f64], sample: bool) -> Option<f64> {
    let n = values.len();
    let divisor = if sample { n.checked_sub(1)? } else { n };
    if divisor == 0 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let squares: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some(squares / divisor as f64)
}

/// Spread of the numbers the arguments hold, read the way `SUM` reads them.
#[derive(Debug)]
pub struct VarianceFn {
    name: &'static str,
    alias: &'static [&'static str],
    sample: bool,
    root: bool,
}

pub const STDEV: VarianceFn = VarianceFn {
    name: "STDEV",
    alias: &["STDEV.S"],
    sample: true,
    root: true,
};
pub const STDEVP: VarianceFn = VarianceFn {
    name: "STDEVP",
    alias: &["STDEV.P"],
    sample: false,
    root: true,
};
pub const VAR: VarianceFn = VarianceFn {
    name: "VAR",
    alias: &["VAR.S"],
    sample: true,
    root: false,
};
pub const VARP: VarianceFn = VarianceFn {
    name: "VARP",
    alias: &["VAR.P"],
    sample: false,
    root: false,
};

impl VarianceFn {
    pub fn of(&self, values: &[f64]) -> Result<f64, ExcelError> {
        let v = variance(values, self.sample).ok_or_else(|| {
            ExcelError::new_div().with_message(format!("{} needs more numbers", self.name))
        })?;
        Ok(if self.root { v.sqrt() } else { v })
    }
}

impl Function for VarianceFn {
    func_caps!(PURE, REDUCTION);
    fn name(&self) -> &'static str {
        self.name
    }
    fn aliases(&self) -> &'static [&'static str] {
        self.alias
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
        let mut values = Vec::new();
        for_each_number(args, |n| values.push(n))?;
        sanitize_numeric_result(self.of(&values)?)
    }
}

pub fn register_builtins() {
    register_functions!(PoissonFn, STDEV, STDEVP, VAR, VARP);
}

#[cfg(test)]
mod tests {
    use sheetcalc_common::{ExcelErrorKind, LiteralValue};
    use sheetcalc_core::ASTNode;

    use crate::test_utils::{eval, eval_with};
    use crate::test_workbook::TestWorkbook;

    use super::*;

    fn call(name: &str, x: f64, mean: f64, cumulative: bool) -> LiteralValue {
        eval(ASTNode::function(
            name,
            vec![ASTNode::number(x), ASTNode::number(mean), ASTNode::boolean(cumulative)],
        ))
    }

    fn approx(v: LiteralValue, expected: f64) {
        match v {
            LiteralValue::Number(n) => assert!((n - expected).abs() < 1e-9, "{n} != {expected}"),
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn probability_mass_and_cumulative() {
        approx(call("POISSON", 2.0, 5.0, false), 0.084224337488);
        approx(call("POISSON.DIST", 2.0, 5.0, true), 0.124652019483);
        approx(call("POISSON", 2.9, 5.0, false), 0.084224337488);
        approx(call("POISSON", 0.0, 0.0, false), 1.0);
        approx(call("POISSON", 3.0, 0.0, false), 0.0);
    }

    #[test]
    fn negative_arguments_are_num() {
        assert_eq!(call("POISSON", -1.0, 5.0, false), LiteralValue::error(ExcelErrorKind::Num));
        assert_eq!(call("POISSON", 1.0, -5.0, true), LiteralValue::error(ExcelErrorKind::Num));
    }

    #[test]
    fn large_counts_do_not_overflow() {
        let p = poisson(1000, 1000.0, false);
        assert!(p > 0.0 && p < 0.02);
    }

    /// C1:D5 holds 1..=10, row by row.
    fn one_to_ten() -> TestWorkbook {
        let rows = (0..5)
            .map(|r| {
                let first = 2.0 * r as f64 + 1.0;
                vec![LiteralValue::Number(first), LiteralValue::Number(first + 1.0)]
            })
            .collect();
        TestWorkbook::new().with_range("Sheet1", 1, 3, rows)
    }

    fn spread(name: &str) -> LiteralValue {
        eval_with(one_to_ten(), ASTNode::function(name, vec![ASTNode::range(1, 3, 5, 4)]))
    }

    #[test]
    fn sample_and_population_spread() {
        approx(spread("STDEV"), 3.0276503540974917);
        approx(spread("STDEVP"), 2.8722813232690143);
        approx(spread("VAR"), 9.166666666666666);
        approx(spread("VARP"), 8.25);
        approx(spread("STDEV.S"), 3.0276503540974917);
    }

    #[test]
    fn too_few_numbers_is_div() {
        let one = |name: &str| eval(ASTNode::function(name, vec![ASTNode::number(4.0)]));
        assert_eq!(one("STDEV"), LiteralValue::error(ExcelErrorKind::Div));
        assert_eq!(one("VAR"), LiteralValue::error(ExcelErrorKind::Div));
        approx(one("STDEVP"), 0.0);
        approx(one("VARP"), 0.0);
        let empty = eval(ASTNode::function("VARP", vec![ASTNode::range(20, 20, 22, 20)]));
        assert_eq!(empty, LiteralValue::error(ExcelErrorKind::Div));
    }

    #[test]
    fn direct_arguments_are_coerced_like_sum() {
        let call = ASTNode::function(
            "VAR",
            vec![ASTNode::number(1.0), ASTNode::text("3"), ASTNode::boolean(true)],
        );
        approx(eval(call), 4.0 / 3.0);
        let bad = ASTNode::function("STDEV", vec![ASTNode::number(1.0), ASTNode::text("x")]);
        assert_eq!(eval(bad), LiteralValue::error(ExcelErrorKind::Value));
    }
}
