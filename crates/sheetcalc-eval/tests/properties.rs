use proptest::prelude::*;
use sheetcalc_common::{ExcelErrorKind, LiteralValue};
use sheetcalc_core::{ASTNode, UnaryOperator};
use sheetcalc_eval::coercion::{compare_numbers, parse_double};
use sheetcalc_eval::test_workbook::TestWorkbook;

fn formula_result(wb: TestWorkbook, at: &str, ast: ASTNode) -> LiteralValue {
    wb.with_formula_a1("Sheet1", at, ast)
        .engine()
        .evaluate("Sheet1", at)
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn parse_double_never_panics(text in ".{0,40}") {
        let parsed = std::panic::catch_unwind(|| parse_double(&text));
        prop_assert!(parsed.is_ok());
    }

    #[test]
    fn parse_double_reads_what_display_writes(x in -1e300f64..1e300) {
        prop_assert_eq!(parse_double(&x.to_string()), Some(x));
    }

    #[test]
    fn unary_plus_is_identity(x in any::<f64>().prop_filter("finite", |x| x.is_finite())) {
        let out = formula_result(
            TestWorkbook::new(),
            "A1",
            ASTNode::unary(UnaryOperator::Plus, ASTNode::number(x)),
        );
        let LiteralValue::Number(y) = out else {
            return Err(TestCaseError::fail(format!("{out:?}")));
        };
        prop_assert_eq!(x.to_bits(), y.to_bits());
    }

    #[test]
    fn double_negation_is_identity_except_for_signed_zero(x in -1e12f64..1e12) {
        let ast = ASTNode::unary(
            UnaryOperator::Minus,
            ASTNode::unary(UnaryOperator::Minus, ASTNode::number(x)),
        );
        let expected = if x == 0.0 { 0.0 } else { x };
        prop_assert_eq!(formula_result(TestWorkbook::new(), "A1", ast), LiteralValue::Number(expected));
    }

    #[test]
    fn compare_numbers_is_antisymmetric(a in any::<f64>(), b in any::<f64>()) {
        prop_assume!(!a.is_nan() && !b.is_nan());
        prop_assert_eq!(compare_numbers(a, b), compare_numbers(b, a).reverse());
    }

    #[test]
    fn one_cell_range_narrows_from_anywhere(
        v in -1e9f64..1e9,
        row in 1u32..50,
        col in 1u32..20,
    ) {
        let wb = TestWorkbook::new().with_cell("Sheet1", 7, 3, LiteralValue::Number(v));
        let at = format!("{}{}", sheetcalc_common::col_to_letters(col + 20), row);
        let out = formula_result(wb, &at, ASTNode::range(7, 3, 7, 3));
        prop_assert_eq!(out, LiteralValue::Number(v));
    }

    #[test]
    fn column_range_narrows_to_the_formula_row(len in 1u32..30, row in 1u32..40) {
        let data = (1..=len).map(|r| vec![LiteralValue::Number(r as f64)]).collect();
        let wb = TestWorkbook::new().with_range("Sheet1", 1, 1, data);
        let out = formula_result(wb, &format!("C{row}"), ASTNode::range(1, 1, len, 1));
        if row <= len {
            prop_assert_eq!(out, LiteralValue::Number(row as f64));
        } else {
            prop_assert_eq!(out, LiteralValue::error(ExcelErrorKind::Value));
        }
    }
}
