//! `MATCH`, `VLOOKUP`, `HLOOKUP` and `INDEX`.

use sheetcalc_common::{ExcelError, ExcelErrorKind, LiteralValue};

use super::lookup_utils::{
    LookupCmp, LookupComparer, binary_search_le, find_exact, resolve_index_arg, vector_values,
};
use crate::coercion::parse_double;
use crate::engine::range_view::{RangeView, RefView};
use crate::function::Function;
use crate::func_caps;
use crate::macros::register_functions;
use crate::traits::{ArgumentHandle, CalcValue, FunctionContext};

/* ─────────────────────────── MATCH() ──────────────────────────────── */

/// `match_type` as a raw number: `> 0` is "largest value <=", `0` exact,
/// `< 0` "smallest value >=". Any error or non-numeric text is `#REF!`.
fn match_type_arg<'a, 'b>(args: &[ArgumentHandle<'a, 'b>]) -> Result<f64, ExcelError> {
    let Some(arg) = args.get(2) else {
        return Ok(1.0);
    };
    let bad = || ExcelError::new(ExcelErrorKind::Ref).with_message("MATCH: invalid match_type");
    match arg.value().map_err(|_| bad())? {
        LiteralValue::Number(n) => Ok(n),
        LiteralValue::Boolean(b) => Ok(if b { 1.0 } else { 0.0 }),
        LiteralValue::Blank => Ok(0.0),
        LiteralValue::Text(s) => parse_double(&s).ok_or_else(bad),
        LiteralValue::Error(_) => Err(bad()),
    }
}

/// The values `MATCH` searches. Only a row or column qualifies; a bare
/// number or boolean is `#N/A`, bare text is `#N/A` when numeric and
/// `#VALUE!` otherwise.
fn match_vector<'a, 'b>(arg: &ArgumentHandle<'a, 'b>) -> Result<Vec<LiteralValue>, ExcelError> {
    match arg.calc() {
        CalcValue::Scalar(v) => Err(match v {
            LiteralValue::Error(e) => e,
            LiteralValue::Text(s) if parse_double(&s).is_none() => ExcelError::new_value(),
            _ => ExcelError::new_na().with_message("MATCH: lookup_array is not a range"),
        }),
        view => match view.as_range_view() {
            Some(range) => vector_values(&range),
            None => Err(ExcelError::new_na()),
        },
    }
}

/// Zero-based position of `comparer` in `items` under `match_type`.
pub fn match_position(comparer: &LookupComparer, items: &[LiteralValue], match_type: f64) -> Option<usize> {
    if match_type == 0.0 {
        return find_exact(comparer, items);
    }
    if match_type > 0.0 {
        // Ascending data: scan from the end for the first item <= lookup.
        return (0..items.len()).rev().find(|&i| {
            let cmp = comparer.compare(&items[i]);
            cmp != LookupCmp::TypeMismatch && cmp != LookupCmp::Less
        });
    }
    // Descending data: stop at an equal item, or one past the last item
    // >= lookup.
    for (i, item) in items.iter().enumerate() {
        match comparer.compare(item) {
            LookupCmp::TypeMismatch | LookupCmp::Less => continue,
            LookupCmp::Equal => return Some(i),
            LookupCmp::Greater => return i.checked_sub(1),
        }
    }
    items.len().checked_sub(1)
}

#[derive(Debug)]
pub struct MatchFn;
impl Function for MatchFn {
    func_caps!(PURE, LOOKUP);
    fn name(&self) -> &'static str {
        "MATCH"
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
        let match_type = match_type_arg(args)?;
        let lookup = args[0].value()?;
        let items = match_vector(&args[1])?;
        let comparer = LookupComparer::new(&lookup, match_type == 0.0)?;
        match match_position(&comparer, &items, match_type) {
            Some(i) => Ok(CalcValue::number((i + 1) as f64)),
            None => Err(ExcelError::new_na()),
        }
    }
}

/* ─────────────────────────── VLOOKUP() / HLOOKUP() ────────────────── */

/// Fourth argument of `VLOOKUP`/`HLOOKUP`. Absent means approximate;
/// omitted-but-present or blank means exact.
fn range_lookup_arg<'a, 'b>(args: &[ArgumentHandle<'a, 'b>]) -> Result<bool, ExcelError> {
    let Some(arg) = args.get(3) else {
        return Ok(true);
    };
    match arg.value()? {
        LiteralValue::Blank => Ok(false),
        LiteralValue::Boolean(b) => Ok(b),
        LiteralValue::Number(n) => Ok(n != 0.0),
        LiteralValue::Text(s) if s.eq_ignore_ascii_case("TRUE") => Ok(true),
        LiteralValue::Text(s) if s.eq_ignore_ascii_case("FALSE") => Ok(false),
        LiteralValue::Text(s) => Err(ExcelError::new_value()
            .with_message(format!("range_lookup '{s}' is not a boolean"))),
        LiteralValue::Error(e) => Err(e),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    /// Keys in the first column, results from a column (`VLOOKUP`).
    Vertical,
    /// Keys in the first row, results from a row (`HLOOKUP`).
    Horizontal,
}

fn table_lookup<'a, 'b>(
    args: &[ArgumentHandle<'a, 'b>],
    orientation: Orientation,
) -> Result<LiteralValue, ExcelError> {
    let lookup = args[0].value()?;
    let table = args[1].range_view()?;
    let approximate = range_lookup_arg(args)?;

    let keys = match orientation {
        Orientation::Vertical => table.column_view(0)?,
        Orientation::Horizontal => table.row_view(0)?,
    };
    let items = vector_values(&keys)?;
    let comparer = LookupComparer::new(&lookup, !approximate)?;
    let found = if approximate {
        binary_search_le(&comparer, &items)
    } else {
        find_exact(&comparer, &items)
    };
    let position = found.ok_or_else(ExcelError::new_na)? as u32;

    let index = resolve_index_arg(args[2].value())?;
    let value = match orientation {
        Orientation::Vertical => {
            if index >= table.width() {
                return Err(ExcelError::new_ref());
            }
            table.get_relative(position, index)
        }
        Orientation::Horizontal => {
            if index >= table.height() {
                return Err(ExcelError::new_ref());
            }
            table.get_relative(index, position)
        }
    };
    Ok(value)
}

#[derive(Debug)]
pub struct VLookupFn;
impl Function for VLookupFn {
    func_caps!(PURE, LOOKUP);
    fn name(&self) -> &'static str {
        "VLOOKUP"
    }
    fn min_args(&self) -> usize {
        3
    }
    fn max_args(&self) -> Option<usize> {
        Some(4)
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        table_lookup(args, Orientation::Vertical).map(CalcValue::Scalar)
    }
}

#[derive(Debug)]
pub struct HLookupFn;
impl Function for HLookupFn {
    func_caps!(PURE, LOOKUP);
    fn name(&self) -> &'static str {
        "HLOOKUP"
    }
    fn min_args(&self) -> usize {
        3
    }
    fn max_args(&self) -> Option<usize> {
        Some(4)
    }
    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        _: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        table_lookup(args, Orientation::Horizontal).map(CalcValue::Scalar)
    }
}

/* ─────────────────────────── INDEX() ──────────────────────────────── */

/// One-based index argument; omitted means 0 (the whole row or column).
fn index_arg<'a, 'b>(args: &[ArgumentHandle<'a, 'b>], i: usize) -> Result<u32, ExcelError> {
    let Some(arg) = args.get(i) else {
        return Ok(0);
    };
    if arg.is_missing() {
        return Ok(0);
    }
    let n = arg.number()?.trunc();
    if n < 0.0 {
        return Err(ExcelError::new_value().with_message("INDEX: negative index"));
    }
    if n > u32::MAX as f64 {
        return Err(ExcelError::new_ref());
    }
    Ok(n as u32)
}

/// `INDEX(reference, row_num, [column_num])`, returning a reference.
///
/// With only `row_num`, a one-row area is indexed by column. A zero index
/// selects the whole row or column.
#[derive(Debug)]
pub struct IndexFn;
impl Function for IndexFn {
    func_caps!(PURE, LOOKUP, RETURNS_REFERENCE);
    fn name(&self) -> &'static str {
        "INDEX"
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
        let area = args[0].range_view()?;
        let first = index_arg(args, 1)?;
        let (row, col) = if args.len() < 3 {
            match (area.height(), area.width()) {
                (1, w) if w > 1 => (1, first),
                (_, 1) => (first, 1),
                _ => {
                    return Err(ExcelError::new_ref()
                        .with_message("INDEX on a 2-D area needs a column number"));
                }
            }
        } else {
            (first, index_arg(args, 2)?)
        };
        if row > area.height() || col > area.width() {
            return Err(ExcelError::new_ref().with_message(format!(
                "INDEX ({row}, {col}) outside a {}x{} area",
                area.height(),
                area.width()
            )));
        }
        select(&area, row, col)
    }
}

fn select<'b>(area: &RangeView<'b>, row: u32, col: u32) -> Result<CalcValue<'b>, ExcelError> {
    Ok(match (row, col) {
        (0, 0) => CalcValue::Range(*area),
        (0, c) => CalcValue::Range(area.column_view(c - 1)?),
        (r, 0) => CalcValue::Range(area.row_view(r - 1)?),
        (r, c) => {
            let cell = area
                .range_ref()
                .cell_at(r - 1, c - 1)
                .ok_or_else(ExcelError::new_ref)?;
            CalcValue::Reference(RefView::new(cell, area.evaluator()))
        }
    })
}

pub fn register_builtins() {
    register_functions!(MatchFn, VLookupFn, HLookupFn, IndexFn);
}
