//! Arithmetic, concatenation and comparison operators.
//!
//! Operands arrive already narrowed to scalars. An error operand is
//! returned as the result, left operand first.

use std::cmp::Ordering;

use sheetcalc_common::{ExcelError, ExcelErrorKind, LiteralValue};
use sheetcalc_core::{BinaryOperator, UnaryOperator};

use super::utils::normalize_zero;
use crate::coercion::{coerce_to_number, coerce_to_text, compare_numbers, compare_text};

pub fn unary(op: UnaryOperator, operand: LiteralValue) -> LiteralValue {
    if let LiteralValue::Error(_) = operand {
        return operand;
    }
    // Unary plus leaves text alone and keeps the sign of zero.
    if op == UnaryOperator::Plus {
        if let LiteralValue::Text(_) = operand {
            return operand;
        }
    }
    let x = match coerce_to_number(&operand) {
        Ok(x) => x,
        Err(e) => return LiteralValue::Error(e),
    };
    match op {
        UnaryOperator::Plus => LiteralValue::from_number(x),
        UnaryOperator::Minus => LiteralValue::from_number(normalize_zero(-x)),
        UnaryOperator::Percent => LiteralValue::from_number(normalize_zero(x / 100.0)),
    }
}

pub fn binary(op: BinaryOperator, left: LiteralValue, right: LiteralValue) -> LiteralValue {
    for operand in [&left, &right] {
        if let LiteralValue::Error(e) = operand {
            return LiteralValue::Error(e.clone());
        }
    }
    let result = match op {
        BinaryOperator::Concat => concat(&left, &right),
        op if op.is_comparison() => Ok(LiteralValue::Boolean(compare(op, &left, &right))),
        op => arithmetic(op, &left, &right).map(LiteralValue::from_number),
    };
    result.unwrap_or_else(LiteralValue::Error)
}

fn arithmetic(op: BinaryOperator, left: &LiteralValue, right: &LiteralValue) -> Result<f64, ExcelError> {
    let a = coerce_to_number(left)?;
    let b = coerce_to_number(right)?;
    Ok(match op {
        // IEEE results: `-0 - 0` stays negative, `-0 + 0` is positive.
        BinaryOperator::Add => a + b,
        BinaryOperator::Subtract => a - b,
        BinaryOperator::Multiply => normalize_zero(a * b),
        BinaryOperator::Divide => {
            if b == 0.0 {
                return Err(ExcelError::new_div());
            }
            normalize_zero(a / b)
        }
        BinaryOperator::Power => normalize_zero(a.powf(b)),
        other => {
            return Err(ExcelError::new(ExcelErrorKind::Value)
                .with_message(format!("{other:?} is not an arithmetic operator")));
        }
    })
}

fn concat(left: &LiteralValue, right: &LiteralValue) -> Result<LiteralValue, ExcelError> {
    let mut s = coerce_to_text(left)?;
    s.push_str(&coerce_to_text(right)?);
    Ok(LiteralValue::Text(s))
}

fn compare(op: BinaryOperator, left: &LiteralValue, right: &LiteralValue) -> bool {
    let ord = compare_values(left, right);
    match op {
        BinaryOperator::Eq => ord == Ordering::Equal,
        BinaryOperator::Ne => ord != Ordering::Equal,
        BinaryOperator::Lt => ord == Ordering::Less,
        BinaryOperator::Le => ord != Ordering::Greater,
        BinaryOperator::Gt => ord == Ordering::Greater,
        BinaryOperator::Ge => ord != Ordering::Less,
        _ => false,
    }
}

/// Total order over non-error scalars: every number sorts before every
/// boolean, and every boolean before every text. A blank takes the role of
/// `0`, `FALSE` or `""` depending on the other operand.
pub fn compare_values(left: &LiteralValue, right: &LiteralValue) -> Ordering {
    let (left, right) = match (left, right) {
        (LiteralValue::Blank, LiteralValue::Blank) => return Ordering::Equal,
        (LiteralValue::Blank, other) => (blank_as(other), other.clone()),
        (other, LiteralValue::Blank) => (other.clone(), blank_as(other)),
        (l, r) => (l.clone(), r.clone()),
    };
    match (&left, &right) {
        (LiteralValue::Number(a), LiteralValue::Number(b)) => compare_numbers(*a, *b),
        (LiteralValue::Text(a), LiteralValue::Text(b)) => compare_text(a, b),
        (LiteralValue::Boolean(a), LiteralValue::Boolean(b)) => a.cmp(b),
        (l, r) => type_rank(l).cmp(&type_rank(r)),
    }
}

fn blank_as(other: &LiteralValue) -> LiteralValue {
    match other {
        LiteralValue::Text(_) => LiteralValue::Text(String::new()),
        LiteralValue::Boolean(_) => LiteralValue::Boolean(false),
        _ => LiteralValue::Number(0.0),
    }
}

fn type_rank(v: &LiteralValue) -> u8 {
    match v {
        LiteralValue::Blank | LiteralValue::Number(_) => 0,
        LiteralValue::Boolean(_) => 1,
        LiteralValue::Text(_) => 2,
        LiteralValue::Error(_) => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> LiteralValue {
        LiteralValue::Number(n)
    }

    fn as_num(v: LiteralValue) -> f64 {
        match v {
            LiteralValue::Number(n) => n,
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn signed_zero_rules() {
        let sub = as_num(binary(BinaryOperator::Subtract, num(-0.0), num(0.0)));
        assert!(sub == 0.0 && sub.is_sign_negative());
        let add = as_num(binary(BinaryOperator::Add, num(-0.0), num(0.0)));
        assert!(add == 0.0 && add.is_sign_positive());

        let plus = as_num(unary(UnaryOperator::Plus, num(-0.0)));
        assert!(plus.is_sign_negative());
        for v in [
            unary(UnaryOperator::Minus, num(0.0)),
            unary(UnaryOperator::Percent, num(-0.0)),
            binary(BinaryOperator::Multiply, num(-0.0), num(5.0)),
            binary(BinaryOperator::Divide, num(-0.0), num(5.0)),
            binary(BinaryOperator::Power, num(-0.0), num(3.0)),
        ] {
            assert!(as_num(v).is_sign_positive());
        }
    }

    #[test]
    fn arithmetic_errors() {
        assert_eq!(
            binary(BinaryOperator::Divide, num(1.0), LiteralValue::Blank),
            LiteralValue::error(ExcelErrorKind::Div)
        );
        assert_eq!(
            binary(BinaryOperator::Power, num(-8.0), num(0.5)),
            LiteralValue::error(ExcelErrorKind::Num)
        );
        assert_eq!(
            binary(BinaryOperator::Multiply, num(1e200), num(1e200)),
            LiteralValue::error(ExcelErrorKind::Num)
        );
        assert_eq!(
            binary(BinaryOperator::Add, LiteralValue::text("abc"), num(1.0)),
            LiteralValue::error(ExcelErrorKind::Value)
        );
        assert_eq!(binary(BinaryOperator::Power, num(0.0), num(0.0)), num(1.0));
        assert_eq!(binary(BinaryOperator::Add, LiteralValue::text(" 2 "), num(1.0)), num(3.0));
    }

    #[test]
    fn left_error_wins() {
        let l = LiteralValue::error(ExcelErrorKind::Na);
        let r = LiteralValue::error(ExcelErrorKind::Div);
        assert_eq!(binary(BinaryOperator::Add, l.clone(), r.clone()), l);
        assert_eq!(binary(BinaryOperator::Eq, r.clone(), l), r);
    }

    #[test]
    fn concatenation_formats_operands() {
        assert_eq!(
            binary(BinaryOperator::Concat, LiteralValue::text("x"), num(1.5)),
            LiteralValue::text("x1.5")
        );
        assert_eq!(
            binary(BinaryOperator::Concat, LiteralValue::Boolean(true), LiteralValue::Blank),
            LiteralValue::text("TRUE")
        );
    }

    #[test]
    fn comparison_type_order() {
        let t = LiteralValue::Boolean(true);
        assert_eq!(binary(BinaryOperator::Gt, LiteralValue::text("a"), t.clone()), t);
        assert_eq!(binary(BinaryOperator::Gt, LiteralValue::Boolean(false), num(1e9)), t);
        assert_eq!(binary(BinaryOperator::Eq, LiteralValue::text("ABC"), LiteralValue::text("abc")), t);
        assert_eq!(binary(BinaryOperator::Eq, LiteralValue::Blank, LiteralValue::text("")), t);
        assert_eq!(binary(BinaryOperator::Eq, LiteralValue::Blank, num(0.0)), t);
        assert_eq!(binary(BinaryOperator::Eq, LiteralValue::Blank, LiteralValue::Boolean(false)), t);
        assert_eq!(binary(BinaryOperator::Lt, num(-0.0), num(0.0)), t);
        assert_eq!(binary(BinaryOperator::Ne, num(-0.0), num(0.0)), t);
        assert_eq!(binary(BinaryOperator::Eq, num(0.1 + 0.2), num(0.3)), t);
    }
}
