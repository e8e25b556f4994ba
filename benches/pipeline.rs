//! Benchmarks for loading and reconciling gene tables.
//!
//! Run with: cargo bench
//!
//! Results are saved to `target/criterion/` with HTML reports.
#![allow(clippy::expect_used, clippy::cast_precision_loss)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fcheat::assemble::{assemble, AssemblyOptions};
use fcheat::loader::load_table;
use fcheat::reconcile::reconcile;
use fcheat::{Delimiter, SheetSelection, SpreadsheetSource};

/// CSV text for `rows` genes; every third gene has no symbol.
fn gene_csv(rows: usize, offset: usize) -> Vec<u8> {
    let mut text = String::from("gene_id,gene_symbol,logFC,padj\n");
    for i in 0..rows {
        let id = i + offset;
        let symbol = if id % 3 == 0 { String::new() } else { format!("SYM{id}") };
        let fold_change = ((id * 37) % 200) as f64 / 20.0 - 5.0;
        text.push_str(&format!("AT{id:07},{symbol},{fold_change},0.01\n"));
    }
    text.into_bytes()
}

fn load(data: &[u8], role: &str) -> fcheat::GeneTable {
    let mut source = SpreadsheetSource::from_delimited(data, Delimiter::Comma);
    load_table(&mut source, &SheetSelection::Default, role).expect("Failed to load")
}

/// Benchmark loading a single table
fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");
    for rows in [1_000usize, 10_000] {
        let data = gene_csv(rows, 0);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &data, |b, data| {
            b.iter(|| load(black_box(data), "first"))
        });
    }
    group.finish();
}

/// Benchmark the left join of two half-overlapping tables
fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    for rows in [1_000usize, 10_000] {
        let first = load(&gene_csv(rows, 0), "first");
        let second = load(&gene_csv(rows, rows / 2), "second");
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(rows),
            &(first, second),
            |b, (first, second)| {
                b.iter(|| reconcile(black_box(first), Some(black_box(second))).expect("merge"))
            },
        );
    }
    group.finish();
}

/// Benchmark sorting and assembling the matrix
fn bench_assemble(c: &mut Criterion) {
    let first = load(&gene_csv(10_000, 0), "first");
    let second = load(&gene_csv(10_000, 5_000), "second");
    let table = reconcile(&first, Some(&second)).expect("merge");
    let options = AssemblyOptions::default();

    c.bench_function("assemble_10000", |b| {
        b.iter(|| assemble(black_box(&table), black_box(&options)))
    });
}

criterion_group!(benches, bench_load, bench_reconcile, bench_assemble);
criterion_main!(benches);
