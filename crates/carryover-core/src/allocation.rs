//! Category-level quotas declared inside a budget.
//!
//! Allocations are declarative: nothing checks that they add up to the budget's
//! amount, and no per-category spend is tracked.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use carryover_domain::{
    AllocationSummary, BudgetCategory, BudgetCategoryPatch, NewBudgetCategory,
};

use crate::{
    catalog::CategoryCatalog,
    locks::{hold, BudgetLocks},
    storage::{load_owned_budget, BudgetRepository, BudgetStore},
    CoreError,
};

pub struct BudgetCategoryAllocator {
    store: Arc<dyn BudgetStore>,
    catalog: Arc<dyn CategoryCatalog>,
    locks: Arc<BudgetLocks>,
}

impl BudgetCategoryAllocator {
    /// `locks` must be the set the recalculator uses so edits and passes on one budget
    /// never interleave.
    pub fn new(
        store: Arc<dyn BudgetStore>,
        catalog: Arc<dyn CategoryCatalog>,
        locks: Arc<BudgetLocks>,
    ) -> Self {
        Self {
            store,
            catalog,
            locks,
        }
    }

    pub fn list(&self, user_id: Uuid, budget_id: Uuid) -> Result<Vec<BudgetCategory>, CoreError> {
        load_owned_budget(self.store.as_ref(), budget_id, user_id)?;
        self.store.budget_categories(budget_id)
    }

    pub fn add(&self, user_id: Uuid, input: NewBudgetCategory) -> Result<BudgetCategory, CoreError> {
        let slot = self.locks.slot(input.budget_id);
        let _guard = hold(&slot);

        load_owned_budget(self.store.as_ref(), input.budget_id, user_id)?;
        if !self.catalog.is_main_category(input.category_id)? {
            return Err(CoreError::NotMainCategory(input.category_id));
        }
        let duplicate = self
            .store
            .budget_categories(input.budget_id)?
            .iter()
            .any(|row| row.category_id == input.category_id);
        if duplicate {
            return Err(CoreError::AlreadyExists(format!(
                "budget {} already allocates category {}",
                input.budget_id, input.category_id
            )));
        }
        validate_amount(input.amount)?;

        let row = BudgetCategory::new(input);
        self.store.save_budget_category(&row)?;
        info!(budget_id = %row.budget_id, category_id = %row.category_id, "budget category added");
        Ok(row)
    }

    pub fn update(
        &self,
        user_id: Uuid,
        budget_id: Uuid,
        id: Uuid,
        patch: BudgetCategoryPatch,
    ) -> Result<BudgetCategory, CoreError> {
        let slot = self.locks.slot(budget_id);
        let _guard = hold(&slot);

        load_owned_budget(self.store.as_ref(), budget_id, user_id)?;
        let mut row = self
            .store
            .budget_category(budget_id, id)?
            .ok_or(CoreError::BudgetCategoryNotFound(id))?;
        if let Some(amount) = patch.amount {
            validate_amount(amount)?;
        }
        row.apply(&patch);
        self.store.save_budget_category(&row)?;
        Ok(row)
    }

    pub fn delete(&self, user_id: Uuid, budget_id: Uuid, id: Uuid) -> Result<(), CoreError> {
        let slot = self.locks.slot(budget_id);
        let _guard = hold(&slot);

        load_owned_budget(self.store.as_ref(), budget_id, user_id)?;
        if !self.store.delete_budget_category(budget_id, id)? {
            return Err(CoreError::BudgetCategoryNotFound(id));
        }
        info!(%budget_id, budget_category_id = %id, "budget category deleted");
        Ok(())
    }

    /// How much of the budget's amount the non-excluded rows claim.
    pub fn summary(&self, user_id: Uuid, budget_id: Uuid) -> Result<AllocationSummary, CoreError> {
        let budget = load_owned_budget(self.store.as_ref(), budget_id, user_id)?;
        let rows = self.store.budget_categories(budget_id)?;
        Ok(AllocationSummary::from_rows(budget.amount, &rows))
    }
}

fn validate_amount(amount: f64) -> Result<(), CoreError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(CoreError::Validation(format!(
            "allocation amount must be a non-negative number, got {amount}"
        )));
    }
    Ok(())
}
