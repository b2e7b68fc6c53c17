//! carryover-core
//!
//! Period accounting for budgets: backtracking recalculation, rollover, usage alerts,
//! sub-allocations and budget edits. Depends on carryover-domain. Persistence sits
//! behind the traits in [`storage`].

pub mod alerts;
pub mod allocation;
pub mod catalog;
pub mod error;
pub mod lifecycle;
pub mod locks;
pub mod memory_store;
pub mod recalculation;
pub mod rollover;
pub mod storage;
pub mod time;
pub mod transactions;

pub use alerts::{AlertSink, RecordingAlertSink, TracingAlertSink};
pub use allocation::BudgetCategoryAllocator;
pub use catalog::{CategoryCatalog, CategoryTree};
pub use error::{CoreError, ErrorKind};
pub use lifecycle::{BudgetLifecycleManager, BudgetUpdate};
pub use locks::BudgetLocks;
pub use memory_store::InMemoryStore;
pub use recalculation::{ImpactRecalculator, PassScope, RecalculationReport};
pub use rollover::rollover_out;
pub use storage::{load_owned_budget, BudgetRepository, BudgetStore, PassCommit, SnapshotStore};
pub use time::{Clock, FixedClock, SystemClock};
pub use transactions::{TransactionChange, TransactionJournal, TransactionSource};
