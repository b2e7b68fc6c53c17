use std::sync::Arc;

use carryover::carryover_core::{
    BudgetLifecycleManager, BudgetStore, FixedClock, ImpactRecalculator, InMemoryStore,
    PassScope, RecordingAlertSink, TransactionJournal,
};
use carryover::carryover_domain::{CycleType, NewBudget, TransactionRecord};
use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use uuid::Uuid;

struct Fixture {
    recalculator: Arc<ImpactRecalculator>,
    budget_id: Uuid,
}

fn build_fixture(cycle: CycleType, start_day: u32, txn_count: usize) -> Fixture {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let today = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
    let store: Arc<dyn BudgetStore> = Arc::new(InMemoryStore::new());
    let journal = Arc::new(TransactionJournal::new());
    let recalculator = Arc::new(ImpactRecalculator::new(
        store,
        journal.clone(),
        Arc::new(FixedClock::at_date(today)),
        Arc::new(RecordingAlertSink::new()),
    ));
    let lifecycle = BudgetLifecycleManager::new(Arc::clone(&recalculator));
    let budget = lifecycle
        .create_budget(
            NewBudget::monthly(Uuid::new_v4(), "Bench", 1500.0, start)
                .with_cycle(cycle, start_day)
                .with_rollover(true),
        )
        .expect("create budget");

    for idx in 0..txn_count {
        let day = start + Duration::days((idx % 730) as i64);
        journal
            .record(
                TransactionRecord::new(day, 10.0 + (idx % 90) as f64),
                &[budget.id],
            )
            .expect("record transaction");
    }

    Fixture {
        recalculator,
        budget_id: budget.id,
    }
}

fn bench_backtracking(c: &mut Criterion) {
    let monthly = build_fixture(CycleType::Month, 1, 5_000);
    c.bench_function("rebuild_24_months_5k", |b| {
        b.iter(|| {
            let report = monthly
                .recalculator
                .recalculate(black_box(monthly.budget_id), PassScope::Rebuild)
                .expect("pass");
            black_box(report);
        })
    });

    let weekly = build_fixture(CycleType::Week, 1, 5_000);
    c.bench_function("backtrack_weekly_from_mid_2025", |b| {
        let from = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        b.iter(|| {
            let report = weekly
                .recalculator
                .recalculate(weekly.budget_id, PassScope::FromDate(black_box(from)))
                .expect("pass");
            black_box(report);
        })
    });
}

criterion_group!(benches, bench_backtracking);
criterion_main!(benches);
