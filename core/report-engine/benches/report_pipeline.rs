use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use report_engine::{
    calculate_report, AggregationOp, ColumnStateMap, FieldFilter, NumberRange, Pagination,
    Record, ReportSchema, ReportState, SortOrder, SortState,
};

const STATES: [&str; 6] = ["California", "Texas", "Florida", "New York", "Ohio", "Washington"];
const CATEGORIES: [&str; 4] = ["Electronics", "Home", "Outdoors", "Toys"];

fn records(n: usize) -> Vec<Record> {
    let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default();
    (0..n)
        .map(|i| {
            Record::new(format!("r{}", i))
                .with_text("state", STATES[i % STATES.len()])
                .with_text("category", CATEGORIES[(i / 3) % CATEGORIES.len()])
                .with_number("totalSales", ((i * 7919) % 10_000) as f64 / 3.0)
                .with_number("orders", (i % 97) as f64)
                .with_date("lastOrderDate", base + chrono::Duration::days((i % 365) as i64))
        })
        .collect()
}

fn bench_flat(c: &mut Criterion) {
    let schema = ReportSchema::sales_demo();
    let columns_state = ColumnStateMap::new();
    let columns = schema.visible_columns(&columns_state);

    let mut state = ReportState::new();
    state.filters.set("orders", Some(FieldFilter::Number(NumberRange::at_least(10.0))));
    state.aggregations.set("totalSales", AggregationOp::Sum);
    state.sorter = Some(SortState::new("totalSales", SortOrder::Descend));

    let mut group = c.benchmark_group("flat_sorted");
    for n in [1_000usize, 10_000, 100_000] {
        let data = records(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &data, |b, data| {
            b.iter(|| {
                calculate_report(
                    &schema,
                    black_box(data),
                    &state,
                    &columns,
                    Pagination::default(),
                )
            })
        });
    }
    group.finish();
}

fn bench_grouped(c: &mut Criterion) {
    let schema = ReportSchema::sales_demo();
    let columns_state = ColumnStateMap::new();
    let columns = schema.visible_columns(&columns_state);

    let mut state = ReportState::new();
    state.group_spec.add("state");
    state.group_spec.add("category");
    state.aggregations.set("totalSales", AggregationOp::Avg);
    state.aggregations.set("orders", AggregationOp::Max);

    let mut group = c.benchmark_group("grouped_two_keys");
    for n in [1_000usize, 10_000, 100_000] {
        let data = records(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &data, |b, data| {
            b.iter(|| {
                calculate_report(
                    &schema,
                    black_box(data),
                    &state,
                    &columns,
                    Pagination::default(),
                )
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_flat, bench_grouped);
criterion_main!(benches);
