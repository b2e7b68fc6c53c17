#![allow(dead_code)]

use std::{path::PathBuf, sync::{Arc, Mutex}};

use carryover::{
    carryover_core::{
        BudgetStore, CategoryTree, FixedClock, InMemoryStore, RecordingAlertSink,
        TransactionJournal,
    },
    carryover_domain::{CategoryNode, TransactionRecord},
    BudgetDefaults, BudgetEngine,
};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use tempfile::TempDir;
use uuid::Uuid;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a unique directory that outlives the test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Category tree with one root, one main category and one sub-category.
pub struct Categories {
    pub tree: Arc<CategoryTree>,
    pub root: CategoryNode,
    pub main: CategoryNode,
    pub sub: CategoryNode,
}

pub fn categories() -> Categories {
    let root = CategoryNode::root("Expenses");
    let main = CategoryNode::child_of(&root, "Food");
    let sub = CategoryNode::child_of(&main, "Restaurants");
    let tree = Arc::new(CategoryTree::new(vec![root.clone(), main.clone(), sub.clone()]));
    Categories {
        tree,
        root,
        main,
        sub,
    }
}

/// In-memory engine with a pinned clock.
pub struct TestEngine {
    pub engine: BudgetEngine,
    pub journal: Arc<TransactionJournal>,
    pub clock: Arc<FixedClock>,
    pub alerts: Arc<RecordingAlertSink>,
    pub categories: Categories,
    pub user: Uuid,
}

impl TestEngine {
    pub fn at(today: NaiveDate) -> Self {
        let journal = Arc::new(TransactionJournal::new());
        let clock = Arc::new(FixedClock::at_date(today));
        let alerts = Arc::new(RecordingAlertSink::new());
        let categories = categories();
        let store: Arc<dyn BudgetStore> = Arc::new(InMemoryStore::new());
        let engine = BudgetEngine::new(
            store,
            journal.clone(),
            categories.tree.clone(),
            clock.clone(),
            alerts.clone(),
            BudgetDefaults::default(),
        );
        Self {
            engine,
            journal,
            clock,
            alerts,
            categories,
            user: Uuid::new_v4(),
        }
    }

    /// Records a transaction and feeds its impact events to the engine.
    pub fn spend(&self, budget_id: Uuid, day: NaiveDate, amount: f64) -> Uuid {
        let txn = TransactionRecord::new(day, amount);
        let id = txn.id;
        let events = self
            .journal
            .record(txn, &[budget_id])
            .expect("record transaction");
        self.engine.apply_impacts(&events).expect("apply impacts");
        id
    }
}
