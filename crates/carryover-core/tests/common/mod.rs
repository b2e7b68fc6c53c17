#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use uuid::Uuid;

use carryover_core::{
    BudgetLifecycleManager, BudgetStore, CoreError, FixedClock, ImpactRecalculator,
    InMemoryStore, RecordingAlertSink, TransactionJournal, TransactionSource,
};
use carryover_domain::{ImpactEvent, PeriodWindow, TransactionRecord};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Journal wrapper that can be told to fail queries covering a given day.
#[derive(Default)]
pub struct FlakySource {
    pub journal: TransactionJournal,
    fail_on: Mutex<Option<NaiveDate>>,
}

impl FlakySource {
    pub fn fail_on(&self, day: Option<NaiveDate>) {
        *self.fail_on.lock().unwrap() = day;
    }
}

impl TransactionSource for FlakySource {
    fn sum_for_budget(&self, budget_id: Uuid, window: PeriodWindow) -> Result<f64, CoreError> {
        if let Some(day) = *self.fail_on.lock().unwrap() {
            if window.contains(day) {
                return Err(CoreError::TransactionSource(format!(
                    "ledger unavailable for {window}"
                )));
            }
        }
        self.journal.sum_for_budget(budget_id, window)
    }
}

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub source: Arc<FlakySource>,
    pub clock: Arc<FixedClock>,
    pub alerts: Arc<RecordingAlertSink>,
    pub recalculator: Arc<ImpactRecalculator>,
    pub lifecycle: BudgetLifecycleManager,
    pub user: Uuid,
}

impl Harness {
    pub fn at(today: NaiveDate) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let source = Arc::new(FlakySource::default());
        let clock = Arc::new(FixedClock::at_date(today));
        let alerts = Arc::new(RecordingAlertSink::new());
        let dyn_store: Arc<dyn BudgetStore> = store.clone();
        let recalculator = Arc::new(ImpactRecalculator::new(
            dyn_store,
            source.clone(),
            clock.clone(),
            alerts.clone(),
        ));
        let lifecycle = BudgetLifecycleManager::new(Arc::clone(&recalculator));
        Self {
            store,
            source,
            clock,
            alerts,
            recalculator,
            lifecycle,
            user: Uuid::new_v4(),
        }
    }

    /// Records a transaction and returns the impact events it raised.
    pub fn spend(&self, budget_id: Uuid, day: NaiveDate, amount: f64) -> Vec<ImpactEvent> {
        self.source
            .journal
            .record(TransactionRecord::new(day, amount), &[budget_id])
            .expect("record transaction")
    }
}
