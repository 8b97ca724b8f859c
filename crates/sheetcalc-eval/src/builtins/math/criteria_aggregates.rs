//! Conditional aggregates: `SUMIF`, `COUNTIF`, `AVERAGEIF` and the
//! multi-criteria `-IFS` family.

use sheetcalc_common::{ExcelError, LiteralValue};

use super::super::utils::sanitize_numeric_result;
use crate::args::{CriteriaOp, CriteriaPredicate, parse_criteria};
use crate::engine::range_view::RangeView;
use crate::function::Function;
use crate::func_caps;
use crate::macros::register_functions;
use crate::traits::{ArgumentHandle, CalcValue, FunctionContext};

/// Predicate for a criteria argument. An error criteria matches cells
/// holding the same error.
fn criteria_predicate<'a, 'b>(arg: &ArgumentHandle<'a, 'b>) -> Option<CriteriaPredicate> {
    match arg.value() {
        Ok(v) => parse_criteria(&v),
        Err(e) => Some(CriteriaPredicate::Error {
            op: CriteriaOp::None,
            kind: e.kind,
        }),
    }
}

/// The area to aggregate: the optional third argument re-anchored to the
/// criteria range's shape, else the criteria range itself.
fn target_area<'a, 'b>(
    criteria_range: &RangeView<'b>,
    args: &[ArgumentHandle<'a, 'b>],
    index: usize,
) -> Result<RangeView<'b>, ExcelError> {
    match args.get(index) {
        Some(arg) if !arg.is_missing() => {
            let (h, w) = criteria_range.dims();
            arg.range_view()?
                .offset(0, h as i64 - 1, 0, w as i64 - 1)
        }
        _ => Ok(*criteria_range),
    }
}

/// Visit the target cell at every position whose criteria cell matches.
fn for_each_match<'b>(
    criteria_range: &RangeView<'b>,
    predicate: &CriteriaPredicate,
    target: &RangeView<'b>,
    mut f: impl FnMut(LiteralValue),
) {
    let (h, w) = criteria_range.dims();
    for r in 0..h {
        for c in 0..w {
            if predicate.matches(&criteria_range.get_relative(r, c)) {
                f(target.get_relative(r, c));
            }
        }
    }
}

/* ─────────────────────────── SUMIF() ──────────────────────────────── */

/// `SUMIF(range, criteria, [sum_range])`. Matched cells that are not
/// numbers add nothing.
#[derive(Debug)]
pub struct SumIfFn;
impl Function for SumIfFn {
    func_caps!(PURE, REDUCTION, CRITERIA);
    fn name(&self) -> &'static str {
        "SUMIF"
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
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let range = args[0].range_view()?;
        let Some(predicate) = criteria_predicate(&args[1]) else {
            return Ok(CalcValue::number(0.0));
        };
        let target = target_area(&range, args, 2)?;
        let mut total = 0.0;
        for_each_match(&range, &predicate, &target, |v| {
            if let LiteralValue::Number(n) = v {
                total += n;
            }
        });
        sanitize_numeric_result(total)
    }
}

#[derive(Debug)]
pub struct CountIfFn;
impl Function for CountIfFn {
    func_caps!(PURE, REDUCTION, CRITERIA);
    fn name(&self) -> &'static str {
        "COUNTIF"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let range = args[0].range_view()?;
        let Some(predicate) = criteria_predicate(&args[1]) else {
            return Ok(CalcValue::number(0.0));
        };
        let mut count = 0usize;
        for_each_match(&range, &predicate, &range, |_| count += 1);
        Ok(CalcValue::number(count as f64))
    }
}

#[derive(Debug)]
pub struct AverageIfFn;
impl Function for AverageIfFn {
    func_caps!(PURE, REDUCTION, CRITERIA);
    fn name(&self) -> &'static str {
        "AVERAGEIF"
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
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let range = args[0].range_view()?;
        let predicate = criteria_predicate(&args[1]);
        let target = target_area(&range, args, 2)?;
        let (mut sum, mut count) = (0.0, 0usize);
        if let Some(predicate) = predicate {
            for_each_match(&range, &predicate, &target, |v| {
                if let LiteralValue::Number(n) = v {
                    sum += n;
                    count += 1;
                }
            });
        }
        if count == 0 {
            return Err(ExcelError::new_div().with_message("AVERAGEIF matched no numbers"));
        }
        sanitize_numeric_result(sum / count as f64)
    }
}

/* ─────────────────────────── -IFS family ──────────────────────────── */

/// Positions (relative row, column) where every (range, criteria) pair
/// matches. Argument pairs start at `first`.
///
/// Pairs must be complete and every range must share one shape; otherwise
/// `#VALUE!`. An error criteria is returned as the result. A blank criteria
/// matches nothing.
fn ifs_matches<'a, 'b>(
    args: &[ArgumentHandle<'a, 'b>],
    first: usize,
    shape: Option<(u32, u32)>,
) -> Result<(Vec<(u32, u32)>, (u32, u32)), ExcelError> {
    if args.len() < first + 2 || (args.len() - first) % 2 != 0 {
        return Err(ExcelError::new_value()
            .with_message("criteria ranges and criteria must come in pairs"));
    }
    let mut pairs = Vec::with_capacity((args.len() - first) / 2);
    let mut dims = shape;
    for pair in args[first..].chunks(2) {
        let range = pair[0].range_view()?;
        match dims {
            Some(d) if d != range.dims() => {
                return Err(ExcelError::new_value()
                    .with_message("criteria ranges must have the same size"));
            }
            _ => dims = Some(range.dims()),
        }
        let predicate = criteria_predicate(&pair[1]);
        if let Some(CriteriaPredicate::Error { kind, .. }) = predicate {
            return Err(ExcelError::new(kind));
        }
        pairs.push((range, predicate));
    }
    let (h, w) = dims.unwrap_or((0, 0));

    let mut hits = Vec::new();
    if pairs.iter().any(|(_, p)| p.is_none()) {
        return Ok((hits, (h, w)));
    }
    for r in 0..h {
        for c in 0..w {
            let all = pairs.iter().all(|(range, predicate)| {
                predicate
                    .as_ref()
                    .is_some_and(|p| p.matches(&range.get_relative(r, c)))
            });
            if all {
                hits.push((r, c));
            }
        }
    }
    Ok((hits, (h, w)))
}

/// Sum and count of the numeric target cells at `hits`. Errors propagate.
fn sum_at(target: &RangeView<'_>, hits: &[(u32, u32)]) -> Result<(f64, usize), ExcelError> {
    let (mut sum, mut count) = (0.0, 0usize);
    for &(r, c) in hits {
        match target.get_relative(r, c) {
            LiteralValue::Number(n) => {
                sum += n;
                count += 1;
            }
            LiteralValue::Error(e) => return Err(e),
            _ => {}
        }
    }
    Ok((sum, count))
}

#[derive(Debug)]
pub struct SumIfsFn;
impl Function for SumIfsFn {
    func_caps!(PURE, REDUCTION, CRITERIA);
    fn name(&self) -> &'static str {
        "SUMIFS"
    }
    fn min_args(&self) -> usize {
        3
    }
    fn max_args(&self) -> Option<usize> {
        None
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let target = args[0].range_view()?;
        let (hits, _) = ifs_matches(args, 1, Some(target.dims()))?;
        let (sum, _) = sum_at(&target, &hits)?;
        sanitize_numeric_result(sum)
    }
}

#[derive(Debug)]
pub struct CountIfsFn;
impl Function for CountIfsFn {
    func_caps!(PURE, REDUCTION, CRITERIA);
    fn name(&self) -> &'static str {
        "COUNTIFS"
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
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let (hits, _) = ifs_matches(args, 0, None)?;
        Ok(CalcValue::number(hits.len() as f64))
    }
}

#[derive(Debug)]
pub struct AverageIfsFn;
impl Function for AverageIfsFn {
    func_caps!(PURE, REDUCTION, CRITERIA);
    fn name(&self) -> &'static str {
        "AVERAGEIFS"
    }
    fn min_args(&self) -> usize {
        3
    }
    fn max_args(&self) -> Option<usize> {
        None
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let target = args[0].range_view()?;
        let (hits, _) = ifs_matches(args, 1, Some(target.dims()))?;
        let (sum, count) = sum_at(&target, &hits)?;
        if count == 0 {
            return Err(ExcelError::new_div().with_message("AVERAGEIFS matched no numbers"));
        }
        sanitize_numeric_result(sum / count as f64)
    }
}

pub fn register_builtins() {
    register_functions!(
        SumIfFn,
        CountIfFn,
        AverageIfFn,
        SumIfsFn,
        CountIfsFn,
        AverageIfsFn
    );
}
