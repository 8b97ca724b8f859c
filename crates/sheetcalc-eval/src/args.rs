//! Criteria predicates for the conditional aggregates (`SUMIF`, `COUNTIFS`,
//! …).
//!
//! A criteria argument is turned into a [`CriteriaPredicate`] once, then
//! tested against every cell of the criteria range.

use std::cmp::Ordering;

use sheetcalc_common::{ExcelErrorKind, LiteralValue};

use crate::builtins::lookup::lookup_utils::{has_wildcards, wildcard_match};
use crate::coercion::{compare_numbers, compare_text, parse_double};

/// Comparison prefix of a text criteria. `None` means no prefix was given,
/// which behaves like `=` except for a few empty-string cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriteriaOp {
    None,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CriteriaOp {
    /// Split a leading operator off `s`.
    fn split(s: &str) -> (CriteriaOp, &str) {
        for (prefix, op) in [
            ("<>", CriteriaOp::Ne),
            ("<=", CriteriaOp::Le),
            (">=", CriteriaOp::Ge),
            ("=", CriteriaOp::Eq),
            ("<", CriteriaOp::Lt),
            (">", CriteriaOp::Gt),
        ] {
            if let Some(rest) = s.strip_prefix(prefix) {
                return (op, rest);
            }
        }
        (CriteriaOp::None, s)
    }

    fn eval(self, ord: Ordering) -> bool {
        match self {
            CriteriaOp::None | CriteriaOp::Eq => ord == Ordering::Equal,
            CriteriaOp::Ne => ord != Ordering::Equal,
            CriteriaOp::Lt => ord == Ordering::Less,
            CriteriaOp::Le => ord != Ordering::Greater,
            CriteriaOp::Gt => ord == Ordering::Greater,
            CriteriaOp::Ge => ord != Ordering::Less,
        }
    }

    fn is_equality(self) -> bool {
        matches!(self, CriteriaOp::None | CriteriaOp::Eq)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaPredicate {
    Number { op: CriteriaOp, value: f64 },
    Boolean { op: CriteriaOp, value: bool },
    Error { op: CriteriaOp, kind: ExcelErrorKind },
    Text { op: CriteriaOp, value: String, wildcard: bool },
}

/// Build a predicate from an already narrowed criteria value.
///
/// Blank criteria give `None`: there is nothing to match and the
/// aggregate is 0. Text is examined in order for an operator prefix, then
/// `TRUE`/`FALSE`, a number, an error literal, and finally plain text.
pub fn parse_criteria(criteria: &LiteralValue) -> Option<CriteriaPredicate> {
    let op = CriteriaOp::None;
    Some(match criteria {
        LiteralValue::Blank => return None,
        LiteralValue::Number(n) => CriteriaPredicate::Number { op, value: *n },
        LiteralValue::Boolean(b) => CriteriaPredicate::Boolean { op, value: *b },
        LiteralValue::Error(e) => CriteriaPredicate::Error { op, kind: e.kind },
        LiteralValue::Text(s) => {
            let (op, rest) = CriteriaOp::split(s);
            if rest.eq_ignore_ascii_case("TRUE") {
                CriteriaPredicate::Boolean { op, value: true }
            } else if rest.eq_ignore_ascii_case("FALSE") {
                CriteriaPredicate::Boolean { op, value: false }
            } else if let Some(n) = parse_double(rest) {
                CriteriaPredicate::Number { op, value: n }
            } else if let Some(kind) = ExcelErrorKind::try_parse(rest).filter(|_| rest.starts_with('#')) {
                CriteriaPredicate::Error { op, kind }
            } else {
                // Patterns only apply to (in)equality.
                let wildcard = matches!(op, CriteriaOp::None | CriteriaOp::Eq | CriteriaOp::Ne)
                    && has_wildcards(rest);
                CriteriaPredicate::Text {
                    op,
                    value: rest.to_string(),
                    wildcard,
                }
            }
        }
    })
}

impl CriteriaPredicate {
    pub fn matches(&self, cell: &LiteralValue) -> bool {
        match self {
            CriteriaPredicate::Number { op, value } => match cell {
                LiteralValue::Number(n) => op.eval(compare_numbers(*n, *value)),
                // Numeric text only matches on equality; `<>` matches any text.
                LiteralValue::Text(s) => match op {
                    CriteriaOp::Ne => true,
                    op if op.is_equality() => parse_double(s).is_some_and(|n| n == *value),
                    _ => false,
                },
                LiteralValue::Blank => *op == CriteriaOp::Ne,
                _ => false,
            },
            CriteriaPredicate::Boolean { op, value } => match cell {
                LiteralValue::Boolean(b) => op.eval(b.cmp(value)),
                LiteralValue::Blank | LiteralValue::Number(_) => *op == CriteriaOp::Ne,
                _ => false,
            },
            CriteriaPredicate::Error { op, kind } => match cell {
                LiteralValue::Error(e) => match op {
                    CriteriaOp::Ne => e.kind != *kind,
                    op if op.is_equality() => e.kind == *kind,
                    _ => false,
                },
                _ => false,
            },
            CriteriaPredicate::Text {
                op,
                value,
                wildcard,
            } => match cell {
                // `=""` style criteria match blank cells; `<>""` does not.
                LiteralValue::Blank => match op {
                    op if op.is_equality() => value.is_empty(),
                    CriteriaOp::Ne => !value.is_empty(),
                    _ => false,
                },
                LiteralValue::Text(s) => {
                    if s.is_empty() && value.is_empty() {
                        return matches!(op, CriteriaOp::None | CriteriaOp::Ne);
                    }
                    if *wildcard {
                        let hit = wildcard_match(value, s);
                        if *op == CriteriaOp::Ne { !hit } else { hit }
                    } else {
                        op.eval(compare_text(s, value))
                    }
                }
                // Numbers, booleans and errors are never equal to text.
                _ => *op == CriteriaOp::Ne,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pred(c: impl Into<LiteralValue>) -> CriteriaPredicate {
        parse_criteria(&c.into()).unwrap()
    }

    #[test]
    fn blank_criteria_has_no_predicate() {
        assert_eq!(parse_criteria(&LiteralValue::Blank), None);
    }

    #[test]
    fn operator_prefixes_parse() {
        assert_eq!(
            pred(">1"),
            CriteriaPredicate::Number {
                op: CriteriaOp::Gt,
                value: 1.0
            }
        );
        assert_eq!(
            pred("<>true"),
            CriteriaPredicate::Boolean {
                op: CriteriaOp::Ne,
                value: true
            }
        );
        assert_eq!(
            pred("=#N/A"),
            CriteriaPredicate::Error {
                op: CriteriaOp::Eq,
                kind: ExcelErrorKind::Na
            }
        );
        assert!(matches!(pred("<=b"), CriteriaPredicate::Text { op: CriteriaOp::Le, wildcard: false, .. }));
        assert!(matches!(pred("a*"), CriteriaPredicate::Text { wildcard: true, .. }));
        assert!(matches!(pred(">a*"), CriteriaPredicate::Text { wildcard: false, .. }));
    }

    #[test]
    fn numeric_predicates() {
        let gt = pred(">1");
        assert!(gt.matches(&LiteralValue::Number(2.0)));
        assert!(!gt.matches(&LiteralValue::Number(1.0)));
        assert!(!gt.matches(&LiteralValue::text("5")));
        assert!(!gt.matches(&LiteralValue::Blank));

        let eq = pred(5.0);
        assert!(eq.matches(&LiteralValue::text("5")));
        assert!(!eq.matches(&LiteralValue::Boolean(true)));

        let ne = pred("<>5");
        assert!(ne.matches(&LiteralValue::text("abc")));
        assert!(ne.matches(&LiteralValue::Blank));
        assert!(!ne.matches(&LiteralValue::Number(5.0)));
    }

    #[test]
    fn text_predicates() {
        let apples = pred("apples");
        assert!(apples.matches(&LiteralValue::text("APPLES")));
        assert!(!apples.matches(&LiteralValue::Number(1.0)));
        assert!(pred("<>apples").matches(&LiteralValue::Number(1.0)));

        let wild = pred("a?p*");
        assert!(wild.matches(&LiteralValue::text("Apple")));
        assert!(!wild.matches(&LiteralValue::text("banana")));

        let not_wild = pred("<>a*");
        assert!(not_wild.matches(&LiteralValue::text("banana")));
        assert!(!not_wild.matches(&LiteralValue::text("avocado")));

        let lt = pred("<m");
        assert!(lt.matches(&LiteralValue::text("apple")));
        assert!(!lt.matches(&LiteralValue::text("zebra")));
    }

    #[test]
    fn empty_string_criteria() {
        let eq_empty = pred("=");
        assert!(eq_empty.matches(&LiteralValue::Blank));
        assert!(!eq_empty.matches(&LiteralValue::text("")));

        let ne_empty = pred("<>");
        assert!(!ne_empty.matches(&LiteralValue::Blank));
        assert!(ne_empty.matches(&LiteralValue::text("")));
        assert!(ne_empty.matches(&LiteralValue::text("x")));

        let bare = pred("");
        assert!(bare.matches(&LiteralValue::Blank));
        assert!(bare.matches(&LiteralValue::text("")));
    }

    #[test]
    fn boolean_and_error_predicates() {
        let t = pred(true);
        assert!(t.matches(&LiteralValue::Boolean(true)));
        assert!(!t.matches(&LiteralValue::text("TRUE")));
        assert!(!t.matches(&LiteralValue::Number(1.0)));

        let na = pred(LiteralValue::error(ExcelErrorKind::Na));
        assert!(na.matches(&LiteralValue::error(ExcelErrorKind::Na)));
        assert!(!na.matches(&LiteralValue::error(ExcelErrorKind::Div)));
    }
}
