use chrono::NaiveDate;
use uuid::Uuid;

use carryover_domain::{Budget, BudgetCategory, BudgetPeriodSnapshot};

use crate::CoreError;

/// Budget rows and their category sub-allocations.
pub trait BudgetRepository: Send + Sync {
    fn budget(&self, id: Uuid) -> Result<Option<Budget>, CoreError>;
    fn budgets_for_user(&self, user_id: Uuid) -> Result<Vec<Budget>, CoreError>;
    fn save_budget(&self, budget: &Budget) -> Result<(), CoreError>;
    /// Deletes the budget with its sub-allocations and snapshots. Returns `false` when absent.
    fn delete_budget(&self, id: Uuid) -> Result<bool, CoreError>;
    /// Durably flips the in-flight recalculation flag.
    fn set_recalculating(&self, id: Uuid, flag: bool) -> Result<(), CoreError>;

    fn budget_categories(&self, budget_id: Uuid) -> Result<Vec<BudgetCategory>, CoreError>;
    fn budget_category(&self, budget_id: Uuid, id: Uuid)
        -> Result<Option<BudgetCategory>, CoreError>;
    fn save_budget_category(&self, row: &BudgetCategory) -> Result<(), CoreError>;
    fn delete_budget_category(&self, budget_id: Uuid, id: Uuid) -> Result<bool, CoreError>;
}

/// One snapshot per `(budget_id, period_start)`.
pub trait SnapshotStore: Send + Sync {
    fn snapshot(
        &self,
        budget_id: Uuid,
        period_start: NaiveDate,
    ) -> Result<Option<BudgetPeriodSnapshot>, CoreError>;
    /// Snapshots ordered by `period_start`.
    fn snapshots(&self, budget_id: Uuid) -> Result<Vec<BudgetPeriodSnapshot>, CoreError>;
    /// Latest snapshot whose period starts before `date`.
    fn snapshot_before(
        &self,
        budget_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<BudgetPeriodSnapshot>, CoreError>;
    fn upsert_snapshot(&self, snapshot: &BudgetPeriodSnapshot) -> Result<(), CoreError>;
}

/// All writes of a recalculation pass, committed together or not at all.
#[derive(Debug, Clone)]
pub struct PassCommit {
    /// Budget row as it must look after the pass (lock released, stamps applied).
    pub budget: Budget,
    /// Snapshots in increasing `period_start` order.
    pub snapshots: Vec<BudgetPeriodSnapshot>,
    /// Drop every existing snapshot of the budget before writing.
    pub replace_existing: bool,
}

/// Storage backend the engine runs against.
pub trait BudgetStore: BudgetRepository + SnapshotStore {
    /// Applies a whole pass atomically. Readers observe either none or all of it.
    fn commit_pass(&self, commit: PassCommit) -> Result<(), CoreError>;
}

/// Loads a budget and checks that `user_id` owns it.
pub fn load_owned_budget<R>(repo: &R, id: Uuid, user_id: Uuid) -> Result<Budget, CoreError>
where
    R: BudgetRepository + ?Sized,
{
    repo.budget(id)?
        .filter(|budget| budget.is_owned_by(user_id))
        .ok_or(CoreError::BudgetNotFound(id))
}
