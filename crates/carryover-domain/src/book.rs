//! Persisted state shape shared by the storage backends.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{budget::Budget, category::BudgetCategory, snapshot::BudgetPeriodSnapshot};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Every budget, sub-allocation and period snapshot a store owns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetBook {
    #[serde(default = "BudgetBook::default_schema_version")]
    pub schema_version: u8,
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub budget_categories: Vec<BudgetCategory>,
    #[serde(default)]
    pub snapshots: Vec<BudgetPeriodSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for BudgetBook {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            budgets: Vec::new(),
            budget_categories: Vec::new(),
            snapshots: Vec::new(),
            updated_at: None,
        }
    }
}

impl BudgetBook {
    fn default_schema_version() -> u8 {
        CURRENT_SCHEMA_VERSION
    }

    pub fn budget(&self, id: Uuid) -> Option<&Budget> {
        self.budgets.iter().find(|budget| budget.id == id)
    }

    pub fn budget_mut(&mut self, id: Uuid) -> Option<&mut Budget> {
        self.budgets.iter_mut().find(|budget| budget.id == id)
    }

    pub fn budgets_for_user(&self, user_id: Uuid) -> Vec<Budget> {
        self.budgets
            .iter()
            .filter(|budget| budget.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Inserts or replaces the budget with the same id.
    pub fn upsert_budget(&mut self, budget: Budget) {
        match self.budget_mut(budget.id) {
            Some(existing) => *existing = budget,
            None => self.budgets.push(budget),
        }
    }

    /// Removes a budget together with its sub-allocations and snapshots.
    pub fn remove_budget(&mut self, id: Uuid) -> bool {
        let before = self.budgets.len();
        self.budgets.retain(|budget| budget.id != id);
        if self.budgets.len() == before {
            return false;
        }
        self.budget_categories.retain(|row| row.budget_id != id);
        self.snapshots.retain(|snapshot| snapshot.budget_id != id);
        true
    }

    pub fn set_recalculating(&mut self, id: Uuid, flag: bool) -> bool {
        match self.budget_mut(id) {
            Some(budget) => {
                budget.is_recalculating = flag;
                true
            }
            None => false,
        }
    }

    pub fn budget_categories(&self, budget_id: Uuid) -> Vec<BudgetCategory> {
        self.budget_categories
            .iter()
            .filter(|row| row.budget_id == budget_id)
            .cloned()
            .collect()
    }

    pub fn budget_category(&self, budget_id: Uuid, id: Uuid) -> Option<&BudgetCategory> {
        self.budget_categories
            .iter()
            .find(|row| row.budget_id == budget_id && row.id == id)
    }

    pub fn upsert_budget_category(&mut self, row: BudgetCategory) {
        match self.budget_categories.iter_mut().find(|r| r.id == row.id) {
            Some(existing) => *existing = row,
            None => self.budget_categories.push(row),
        }
    }

    pub fn remove_budget_category(&mut self, budget_id: Uuid, id: Uuid) -> bool {
        let before = self.budget_categories.len();
        self.budget_categories
            .retain(|row| !(row.budget_id == budget_id && row.id == id));
        self.budget_categories.len() != before
    }

    pub fn snapshot(&self, budget_id: Uuid, period_start: NaiveDate) -> Option<&BudgetPeriodSnapshot> {
        self.snapshots
            .iter()
            .find(|s| s.budget_id == budget_id && s.period_start == period_start)
    }

    /// Snapshots of one budget ordered by `period_start`.
    pub fn snapshots_for(&self, budget_id: Uuid) -> Vec<BudgetPeriodSnapshot> {
        let mut rows: Vec<_> = self
            .snapshots
            .iter()
            .filter(|s| s.budget_id == budget_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.period_start);
        rows
    }

    /// Latest snapshot of the budget whose period starts strictly before `date`.
    pub fn snapshot_before(&self, budget_id: Uuid, date: NaiveDate) -> Option<&BudgetPeriodSnapshot> {
        self.snapshots
            .iter()
            .filter(|s| s.budget_id == budget_id && s.period_start < date)
            .max_by_key(|s| s.period_start)
    }

    /// Writes a snapshot keyed on `(budget_id, period_start)`, keeping the stored id.
    pub fn upsert_snapshot(&mut self, mut snapshot: BudgetPeriodSnapshot) {
        match self.snapshots.iter_mut().find(|s| s.is_same_slot(&snapshot)) {
            Some(existing) => {
                snapshot.id = existing.id;
                *existing = snapshot;
            }
            None => self.snapshots.push(snapshot),
        }
    }

    /// Applies the writes of one recalculation pass.
    ///
    /// With `replace_existing` every stored snapshot of the budget is dropped first.
    pub fn apply_pass(
        &mut self,
        budget: Budget,
        snapshots: Vec<BudgetPeriodSnapshot>,
        replace_existing: bool,
    ) {
        if replace_existing {
            let id = budget.id;
            self.snapshots.retain(|s| s.budget_id != id);
        }
        for snapshot in snapshots {
            self.upsert_snapshot(snapshot);
        }
        self.upsert_budget(budget);
    }
}
