//! Process-local [`BudgetStore`] backed by a [`BudgetBook`].

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use carryover_domain::{Budget, BudgetBook, BudgetCategory, BudgetPeriodSnapshot};

use crate::{
    storage::{BudgetRepository, BudgetStore, PassCommit, SnapshotStore},
    CoreError,
};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    book: RwLock<BudgetBook>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_book(book: BudgetBook) -> Self {
        Self {
            book: RwLock::new(book),
        }
    }

    /// Copy of the whole state, for inspection.
    pub fn book(&self) -> Result<BudgetBook, CoreError> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BudgetBook>, CoreError> {
        self.book
            .read()
            .map_err(|_| CoreError::Storage("budget book lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BudgetBook>, CoreError> {
        let mut guard = self
            .book
            .write()
            .map_err(|_| CoreError::Storage("budget book lock poisoned".into()))?;
        guard.updated_at = Some(Utc::now());
        Ok(guard)
    }
}

impl BudgetRepository for InMemoryStore {
    fn budget(&self, id: Uuid) -> Result<Option<Budget>, CoreError> {
        Ok(self.read()?.budget(id).cloned())
    }

    fn budgets_for_user(&self, user_id: Uuid) -> Result<Vec<Budget>, CoreError> {
        Ok(self.read()?.budgets_for_user(user_id))
    }

    fn save_budget(&self, budget: &Budget) -> Result<(), CoreError> {
        self.write()?.upsert_budget(budget.clone());
        Ok(())
    }

    fn delete_budget(&self, id: Uuid) -> Result<bool, CoreError> {
        Ok(self.write()?.remove_budget(id))
    }

    fn set_recalculating(&self, id: Uuid, flag: bool) -> Result<(), CoreError> {
        if self.write()?.set_recalculating(id, flag) {
            Ok(())
        } else {
            Err(CoreError::BudgetNotFound(id))
        }
    }

    fn budget_categories(&self, budget_id: Uuid) -> Result<Vec<BudgetCategory>, CoreError> {
        Ok(self.read()?.budget_categories(budget_id))
    }

    fn budget_category(
        &self,
        budget_id: Uuid,
        id: Uuid,
    ) -> Result<Option<BudgetCategory>, CoreError> {
        Ok(self.read()?.budget_category(budget_id, id).cloned())
    }

    fn save_budget_category(&self, row: &BudgetCategory) -> Result<(), CoreError> {
        self.write()?.upsert_budget_category(row.clone());
        Ok(())
    }

    fn delete_budget_category(&self, budget_id: Uuid, id: Uuid) -> Result<bool, CoreError> {
        Ok(self.write()?.remove_budget_category(budget_id, id))
    }
}

impl SnapshotStore for InMemoryStore {
    fn snapshot(
        &self,
        budget_id: Uuid,
        period_start: NaiveDate,
    ) -> Result<Option<BudgetPeriodSnapshot>, CoreError> {
        Ok(self.read()?.snapshot(budget_id, period_start).cloned())
    }

    fn snapshots(&self, budget_id: Uuid) -> Result<Vec<BudgetPeriodSnapshot>, CoreError> {
        Ok(self.read()?.snapshots_for(budget_id))
    }

    fn snapshot_before(
        &self,
        budget_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<BudgetPeriodSnapshot>, CoreError> {
        Ok(self.read()?.snapshot_before(budget_id, date).cloned())
    }

    fn upsert_snapshot(&self, snapshot: &BudgetPeriodSnapshot) -> Result<(), CoreError> {
        self.write()?.upsert_snapshot(snapshot.clone());
        Ok(())
    }
}

impl BudgetStore for InMemoryStore {
    fn commit_pass(&self, commit: PassCommit) -> Result<(), CoreError> {
        let mut book = self.write()?;
        if book.budget(commit.budget.id).is_none() {
            return Err(CoreError::BudgetNotFound(commit.budget.id));
        }
        book.apply_pass(commit.budget, commit.snapshots, commit.replace_existing);
        Ok(())
    }
}
