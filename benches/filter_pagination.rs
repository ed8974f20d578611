use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use debtor_core::core::services::{paginate, FilterBounds, FilterService, PageSize};
use debtor_core::domain::{Debtor, NewDebtor};
use debtor_core::storage::{DebtorStore, SqliteStore};
use rust_decimal::Decimal;

fn sample_records(count: usize) -> Vec<NewDebtor> {
    (0..count)
        .map(|idx| {
            NewDebtor::new(
                format!("Debtor {idx:05}"),
                Decimal::new(1_000 + (idx as i64 % 5_000) * 37, 2),
                (idx % 400) as u32,
            )
            .with_external_id(format!("P-{idx}"))
        })
        .collect()
}

fn sample_debtors(count: usize) -> Vec<Debtor> {
    sample_records(count)
        .into_iter()
        .enumerate()
        .map(|(idx, record)| Debtor::pending(idx as i64 + 1, record))
        .collect()
}

fn bench_filter_and_paginate(c: &mut Criterion) {
    let debtors = sample_debtors(black_box(10_000));
    let bounds = FilterBounds::observe(&debtors);
    let criteria = bounds
        .unrestricted()
        .with_search("debtor 04")
        .with_overdue_range(30, 120);
    let size = PageSize::items(25).unwrap_or_default();

    c.bench_function("filter_10k", |b| {
        b.iter(|| black_box(FilterService::apply(&debtors, &criteria)))
    });

    let filtered = FilterService::apply(&debtors, &criteria);
    c.bench_function("paginate_filtered", |b| {
        b.iter(|| black_box(paginate(&filtered, 3, size).items.len()))
    });
}

fn bench_bulk_insert(c: &mut Criterion) {
    let records = sample_records(1_000);
    c.bench_function("sqlite_create_many_1k", |b| {
        b.iter_batched(
            || SqliteStore::open_in_memory().expect("in-memory store"),
            |store| {
                store.create_many(&records).expect("bulk insert");
                black_box(store);
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_filter_and_paginate, bench_bulk_insert);
criterion_main!(benches);
