use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sheetcalc_common::LiteralValue;
use sheetcalc_core::{ASTNode, BinaryOperator};
use sheetcalc_eval::test_workbook::TestWorkbook;

/// A1 = 1, A(n) = A(n-1) * 1.0001 + B(n), with B a column of constants.
fn chain(len: u32) -> TestWorkbook {
    let mut wb = TestWorkbook::new().with_cell("Sheet1", 1, 1, LiteralValue::Number(1.0));
    for row in 2..=len {
        let scaled = ASTNode::binary(
            BinaryOperator::Multiply,
            ASTNode::cell(row - 1, 1),
            ASTNode::number(1.0001),
        );
        wb = wb
            .with_cell("Sheet1", row, 2, LiteralValue::Number(row as f64))
            .with_formula("Sheet1", row, 1, ASTNode::binary(BinaryOperator::Add, scaled, ASTNode::cell(row, 2)));
    }
    wb
}

fn bench_chain(c: &mut Criterion) {
    sheetcalc_eval::telemetry::init_tracing();

    let mut group = c.benchmark_group("Chain");

    for len in [100u32, 500] {
        let wb = chain(len);
        let last = format!("A{len}");

        // Cold: every formula in the chain is evaluated.
        group.bench_with_input(BenchmarkId::new("Cold", len), &len, |b, _| {
            b.iter_batched(
                || wb.engine(),
                |engine| black_box(engine.evaluate("Sheet1", &last)),
                BatchSize::SmallInput,
            )
        });

        // Warm: the tail is already cached.
        let engine = wb.engine();
        let _ = engine.evaluate("Sheet1", &last);
        group.bench_with_input(BenchmarkId::new("Warm", len), &len, |b, _| {
            b.iter(|| black_box(engine.evaluate("Sheet1", &last)))
        });
    }

    let totals = chain(500).with_formula_a1(
        "Sheet1",
        "C1",
        ASTNode::function("SUM", vec![ASTNode::range(1, 1, 500, 2)]),
    );
    group.bench_function("SumOverChain", |b| {
        b.iter_batched(
            || totals.engine(),
            |engine| black_box(engine.evaluate("Sheet1", "C1")),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_chain);
criterion_main!(benches);
