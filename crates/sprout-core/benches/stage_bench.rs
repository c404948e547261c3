//! # Stage Benchmarks
//!
//! Performance benchmarks for classification and guidance assembly.
//!
//! Run with: `cargo bench -p sprout-core`

use chrono::{DateTime, Duration, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use sprout_core::{ContentTable, Guidance, Stage, classify_stage};
use std::hint::black_box;

fn birth() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).expect("valid timestamp")
}

/// A table with `rows_per_stage` rows for every stage.
fn create_table(rows_per_stage: usize) -> ContentTable {
    let mut text = String::from("Age/Timeframe,Motor,Motor Images,Language\n");
    for stage in Stage::ORDER {
        for i in 0..rows_per_stage {
            text.push_str(&format!("{},motor {},img/{}.png,words {}\n", stage, i, i, i));
        }
    }
    ContentTable::from_csv_str(&text).expect("parse")
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify_stage");

    for days in [3i64, 45, 200, 700, 1500].iter() {
        let now = birth() + Duration::days(*days);
        group.bench_with_input(BenchmarkId::from_parameter(days), days, |b, _| {
            b.iter(|| black_box(classify_stage(black_box(birth()), black_box(now))));
        });
    }

    group.finish();
}

fn bench_content_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("content_parse");

    for rows in [1usize, 10, 50].iter() {
        let table = create_table(*rows);
        let text = {
            let mut out = String::from("Age/Timeframe,Motor\n");
            for row in table.rows() {
                out.push_str(&format!("{},{}\n", row.stage, row.entries[0].description));
            }
            out
        };
        group.bench_with_input(BenchmarkId::from_parameter(rows), &text, |b, text| {
            b.iter(|| black_box(ContentTable::from_csv_str(text)));
        });
    }

    group.finish();
}

fn bench_guidance(c: &mut Criterion) {
    let mut group = c.benchmark_group("guidance_assemble");

    for rows in [1usize, 10, 50].iter() {
        let table = create_table(*rows);
        let now = birth() + Duration::days(200);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &table, |b, table| {
            b.iter(|| black_box(Guidance::assemble(birth(), now, table)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classify, bench_content_parse, bench_guidance);

criterion_main!(benches);
