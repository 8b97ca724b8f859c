//! Shared lookup helpers: wildcard matching, the lookup comparer and the
//! binary search used by approximate `VLOOKUP`/`HLOOKUP`.

use std::cmp::Ordering;

use sheetcalc_common::{ExcelError, ExcelErrorKind, LiteralValue};

use crate::coercion::{compare_numbers, compare_text, parse_double};
use crate::engine::range_view::RangeView;

/// Spreadsheet wildcard match, case-insensitive. `*` matches any run, `?`
/// any single character, and `~` escapes the next character.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    #[derive(Clone, Copy, PartialEq)]
    enum Tok {
        AnySeq,
        AnyChar,
        Lit(char),
    }

    let mut toks = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars().flat_map(char::to_lowercase);
    while let Some(ch) = chars.next() {
        match ch {
            '~' => match chars.next() {
                Some(next) => toks.push(Tok::Lit(next)),
                None => toks.push(Tok::Lit('~')),
            },
            '*' => {
                if toks.last() != Some(&Tok::AnySeq) {
                    toks.push(Tok::AnySeq);
                }
            }
            '?' => toks.push(Tok::AnyChar),
            c => toks.push(Tok::Lit(c)),
        }
    }
    let text: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();

    // Greedy match with single-star backtracking.
    let (mut t, mut p) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        match toks.get(p) {
            Some(Tok::AnyChar) => {
                t += 1;
                p += 1;
            }
            Some(Tok::Lit(c)) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            Some(Tok::AnySeq) => {
                star = Some((p, t));
                p += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }
    toks[p..].iter().all(|tok| *tok == Tok::AnySeq)
}

pub fn has_wildcards(pattern: &str) -> bool {
    pattern.contains(['*', '?', '~'])
}

/// Outcome of comparing the lookup value against one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupCmp {
    /// Candidate has a different type and is skipped.
    TypeMismatch,
    /// The lookup value is less than the candidate.
    Less,
    Equal,
    /// The lookup value is greater than the candidate.
    Greater,
}

impl From<Ordering> for LookupCmp {
    fn from(o: Ordering) -> Self {
        match o {
            Ordering::Less => LookupCmp::Less,
            Ordering::Equal => LookupCmp::Equal,
            Ordering::Greater => LookupCmp::Greater,
        }
    }
}

/// Compares a fixed lookup value against candidates of the same type.
/// Numbers, text and booleans never compare equal to each other; a blank
/// lookup value behaves like the number 0.
#[derive(Debug, Clone)]
pub enum LookupComparer {
    Number(f64),
    Text { value: String, wildcard: bool },
    Boolean(bool),
}

impl LookupComparer {
    /// `wildcards` enables `*`/`?` patterns for text lookups.
    pub fn new(lookup: &LiteralValue, wildcards: bool) -> Result<Self, ExcelError> {
        Ok(match lookup {
            LiteralValue::Blank => LookupComparer::Number(0.0),
            LiteralValue::Number(n) => LookupComparer::Number(*n),
            LiteralValue::Boolean(b) => LookupComparer::Boolean(*b),
            LiteralValue::Text(s) => LookupComparer::Text {
                wildcard: wildcards && has_wildcards(s),
                value: s.clone(),
            },
            LiteralValue::Error(e) => return Err(e.clone()),
        })
    }

    pub fn compare(&self, candidate: &LiteralValue) -> LookupCmp {
        match (self, candidate) {
            (LookupComparer::Number(a), LiteralValue::Number(b)) => compare_numbers(*a, *b).into(),
            (LookupComparer::Boolean(a), LiteralValue::Boolean(b)) => a.cmp(b).into(),
            (LookupComparer::Text { value, wildcard }, LiteralValue::Text(b)) => {
                if *wildcard {
                    if wildcard_match(value, b) {
                        LookupCmp::Equal
                    } else {
                        // A pattern has no order; treat a miss as "after".
                        LookupCmp::Greater
                    }
                } else {
                    compare_text(value, b).into()
                }
            }
            _ => LookupCmp::TypeMismatch,
        }
    }
}

/// First index whose candidate compares equal.
pub fn find_exact(comparer: &LookupComparer, items: &[LiteralValue]) -> Option<usize> {
    items
        .iter()
        .position(|v| comparer.compare(v) == LookupCmp::Equal)
}

/// Approximate lookup over an ascending vector: the last index whose value
/// is `<=` the lookup value, skipping candidates of another type. `None`
/// when every comparable value is greater.
pub fn binary_search_le(comparer: &LookupComparer, items: &[LiteralValue]) -> Option<usize> {
    // Exclusive bounds: the answer lies in (low, high).
    let mut low: isize = -1;
    let mut high: isize = items.len() as isize;

    loop {
        if high - low < 2 {
            return (low >= 0).then_some(low as usize);
        }
        let mut mid = (low + high) / 2;
        let mut cmp = comparer.compare(&items[mid as usize]);

        if cmp == LookupCmp::TypeMismatch {
            match skip_mismatched(comparer, items, mid, &mut low, &mut high) {
                Some(found) => {
                    mid = found;
                    cmp = comparer.compare(&items[mid as usize]);
                }
                None => continue,
            }
        }

        match cmp {
            LookupCmp::Equal => return Some(last_in_equal_run(comparer, items, mid, high)),
            LookupCmp::Less => high = mid,
            _ => low = mid,
        }
    }
}

/// Walk right from a mismatched midpoint to the next comparable value.
/// Either narrows the bounds and returns `None`, or returns the index of an
/// equal value.
fn skip_mismatched(
    comparer: &LookupComparer,
    items: &[LiteralValue],
    mid: isize,
    low: &mut isize,
    high: &mut isize,
) -> Option<isize> {
    let mut next = mid;
    loop {
        next += 1;
        if next == *high {
            // Everything from mid up to high has the wrong type.
            *high = mid;
            return None;
        }
        let cmp = comparer.compare(&items[next as usize]);
        if cmp == LookupCmp::Less && next == *high - 1 {
            *high = mid;
            return None;
        }
        match cmp {
            LookupCmp::TypeMismatch => continue,
            LookupCmp::Equal => return Some(next),
            LookupCmp::Less => {
                *high = next;
                return None;
            }
            LookupCmp::Greater => {
                *low = next;
                return None;
            }
        }
    }
}

fn last_in_equal_run(
    comparer: &LookupComparer,
    items: &[LiteralValue],
    first: isize,
    high: isize,
) -> usize {
    let mut i = first + 1;
    while i < high {
        if comparer.compare(&items[i as usize]) != LookupCmp::Equal {
            return (i - 1) as usize;
        }
        i += 1;
    }
    (high - 1) as usize
}

/// Materialise a row or column view. 2-D views are `#N/A`.
pub fn vector_values(view: &RangeView<'_>) -> Result<Vec<LiteralValue>, ExcelError> {
    let len = view
        .vector_len()
        .ok_or_else(|| ExcelError::new(ExcelErrorKind::Na).with_message("lookup range must be 1-D"))?;
    Ok((0..len).map(|i| view.vector_item(i)).collect())
}

/// One-based row/column index argument of `VLOOKUP`/`HLOOKUP`, returned
/// zero-based. Errors and non-numeric text are `#REF!`; indexes below 1
/// are `#VALUE!`.
pub fn resolve_index_arg(value: Result<LiteralValue, ExcelError>) -> Result<u32, ExcelError> {
    let value = value.map_err(|_| ExcelError::new(ExcelErrorKind::Ref))?;
    if let LiteralValue::Text(s) = &value {
        if parse_double(s).is_none() {
            return Err(ExcelError::new(ExcelErrorKind::Ref));
        }
    }
    let index = crate::coercion::coerce_to_int(&value)?;
    if index < 1 {
        return Err(ExcelError::new(ExcelErrorKind::Value));
    }
    Ok(index as u32 - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(v: &[f64]) -> Vec<LiteralValue> {
        v.iter().map(|n| LiteralValue::Number(*n)).collect()
    }

    #[test]
    fn wildcards() {
        assert!(wildcard_match("a*e", "Apple"));
        assert!(wildcard_match("?pple", "apple"));
        assert!(!wildcard_match("?pple", "pple"));
        assert!(wildcard_match("*", ""));
        assert!(wildcard_match("a*b*c", "aXXbYYc"));
        assert!(!wildcard_match("a*b*c", "aXXbYY"));
        assert!(wildcard_match("what~?", "What?"));
        assert!(!wildcard_match("what~?", "whats"));
        assert!(wildcard_match("100~*", "100*"));
    }

    #[test]
    fn comparer_reports_type_mismatch() {
        let c = LookupComparer::new(&LiteralValue::Number(2.0), false).unwrap();
        assert_eq!(c.compare(&LiteralValue::text("2")), LookupCmp::TypeMismatch);
        assert_eq!(c.compare(&LiteralValue::Blank), LookupCmp::TypeMismatch);
        assert_eq!(c.compare(&LiteralValue::Number(3.0)), LookupCmp::Less);

        let blank = LookupComparer::new(&LiteralValue::Blank, false).unwrap();
        assert_eq!(blank.compare(&LiteralValue::Number(0.0)), LookupCmp::Equal);
    }

    #[test]
    fn binary_search_finds_last_le() {
        let items = nums(&[1.0, 3.0, 5.0, 7.0]);
        let find = |n: f64| {
            binary_search_le(&LookupComparer::new(&LiteralValue::Number(n), false).unwrap(), &items)
        };
        assert_eq!(find(0.5), None);
        assert_eq!(find(1.0), Some(0));
        assert_eq!(find(4.0), Some(1));
        assert_eq!(find(7.0), Some(3));
        assert_eq!(find(100.0), Some(3));
    }

    #[test]
    fn binary_search_returns_end_of_equal_run_and_skips_text() {
        let items = nums(&[1.0, 2.0, 2.0, 2.0, 9.0]);
        let c = LookupComparer::new(&LiteralValue::Number(2.0), false).unwrap();
        assert_eq!(binary_search_le(&c, &items), Some(3));

        let mixed = vec![
            LiteralValue::Number(1.0),
            LiteralValue::text("x"),
            LiteralValue::text("y"),
            LiteralValue::Number(4.0),
            LiteralValue::Number(6.0),
        ];
        let c = LookupComparer::new(&LiteralValue::Number(5.0), false).unwrap();
        assert_eq!(binary_search_le(&c, &mixed), Some(3));
    }

    #[test]
    fn index_arg_errors() {
        assert_eq!(resolve_index_arg(Ok(LiteralValue::Number(2.9))), Ok(1));
        assert_eq!(
            resolve_index_arg(Ok(LiteralValue::text("two"))).unwrap_err().kind,
            ExcelErrorKind::Ref
        );
        assert_eq!(
            resolve_index_arg(Err(ExcelError::new(ExcelErrorKind::Na))).unwrap_err().kind,
            ExcelErrorKind::Ref
        );
        assert_eq!(
            resolve_index_arg(Ok(LiteralValue::Number(0.0))).unwrap_err().kind,
            ExcelErrorKind::Value
        );
    }
}
