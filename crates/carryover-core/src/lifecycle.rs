//! Budget creation, edits and deletion, plus the current-usage read model.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use carryover_domain::{
    next_period, previous_period, Budget, BudgetPatch, CurrentUsage, EffectiveFrom, NewBudget,
};

use crate::{
    locks::hold,
    recalculation::{ImpactRecalculator, PassScope, RecalculationReport},
    storage::{load_owned_budget, BudgetRepository, SnapshotStore},
    time::Clock,
    transactions::TransactionSource,
    CoreError,
};

/// Result of [`BudgetLifecycleManager::update_budget`].
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetUpdate {
    pub budget: Budget,
    /// Present when the edit required re-deriving snapshots.
    pub recalculation: Option<RecalculationReport>,
}

pub struct BudgetLifecycleManager {
    recalculator: Arc<ImpactRecalculator>,
}

impl BudgetLifecycleManager {
    pub fn new(recalculator: Arc<ImpactRecalculator>) -> Self {
        Self { recalculator }
    }

    /// Creates a budget and derives the snapshot of its current period.
    pub fn create_budget(&self, input: NewBudget) -> Result<Budget, CoreError> {
        validate_name(&input.name)?;
        validate_amount(input.amount)?;
        let budget = Budget::new(input, self.recalculator.clock().now());
        validate_cycle(&budget)?;

        self.recalculator.store().save_budget(&budget)?;
        info!(budget_id = %budget.id, cycle = %budget.cycle_type, "budget created");
        self.recalculator
            .recalculate(budget.id, PassScope::CurrentPeriod)?;
        self.recalculator
            .store()
            .budget(budget.id)?
            .ok_or(CoreError::BudgetNotFound(budget.id))
    }

    pub fn budget(&self, id: Uuid, user_id: Uuid) -> Result<Budget, CoreError> {
        load_owned_budget(self.recalculator.store().as_ref(), id, user_id)
    }

    pub fn list_budgets(&self, user_id: Uuid) -> Result<Vec<Budget>, CoreError> {
        self.recalculator.store().budgets_for_user(user_id)
    }

    /// Applies `patch` to a budget owned by `user_id`.
    ///
    /// With [`EffectiveFrom::NextPeriod`] a new amount is parked in `pending_amount` until
    /// the next period boundary; the live amount and current snapshot are left alone.
    pub fn update_budget(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: BudgetPatch,
        effective_from: EffectiveFrom,
    ) -> Result<BudgetUpdate, CoreError> {
        let store = self.recalculator.store();
        let clock = self.recalculator.clock();
        let slot = self.recalculator.locks().slot(id);
        let _guard = hold(&slot);

        let original = load_owned_budget(store.as_ref(), id, user_id)?;
        let mut budget = original.clone();

        if let Some(name) = patch.name {
            validate_name(&name)?;
            budget.name = name;
        }
        if let Some(description) = patch.description {
            budget.description = description;
        }
        if let Some(cycle_type) = patch.cycle_type {
            budget.cycle_type = cycle_type;
        }
        if let Some(start_day) = patch.cycle_start_day {
            budget.cycle_start_day = start_day;
        }
        let cycle_changed = budget.cycle() != original.cycle();
        if cycle_changed {
            validate_cycle(&budget)?;
            // The boundary a deferred amount was waiting for no longer exists.
            budget.clear_pending();
        }
        if let Some(rollover) = patch.rollover {
            budget.rollover = rollover;
        }
        if let Some(active) = patch.is_active {
            budget.is_active = active;
        }

        let mut amount_changed = false;
        if let Some(amount) = patch.amount {
            validate_amount(amount)?;
            match effective_from {
                EffectiveFrom::Immediate => {
                    amount_changed = amount != budget.amount || budget.pending_amount.is_some();
                    budget.amount = amount;
                    budget.clear_pending();
                }
                EffectiveFrom::NextPeriod => {
                    if !budget.is_recurring {
                        return Err(CoreError::Validation(
                            "a one-off budget has no next period".into(),
                        ));
                    }
                    let current = budget.active_period(clock.today());
                    let effective = next_period(&budget.cycle(), &current);
                    budget.pending_amount = Some(amount);
                    budget.pending_effective_from = Some(effective.start);
                    debug!(budget_id = %id, pending = amount, from = %effective.start, "amount deferred");
                }
            }
        }
        budget.updated_at = clock.now();

        let scope = if cycle_changed {
            Some(PassScope::Rebuild)
        } else if budget.rollover != original.rollover || (budget.is_active && !original.is_active)
        {
            // Carry-over depends on the flag from the first period onward, and impacts
            // skipped while inactive may touch any period.
            Some(PassScope::FromDate(budget.first_period().start))
        } else if amount_changed {
            Some(PassScope::CurrentPeriod)
        } else {
            None
        };
        // The edited row is written by the pass itself, so a failed pass keeps the old one.
        let recalculation = match scope {
            Some(scope) if budget.is_active => {
                Some(self.recalculator.run_pass(budget, scope)?)
            }
            _ => {
                store.save_budget(&budget)?;
                None
            }
        };
        info!(budget_id = %id, %effective_from, "budget updated");
        let budget = store.budget(id)?.ok_or(CoreError::BudgetNotFound(id))?;
        Ok(BudgetUpdate {
            budget,
            recalculation,
        })
    }

    /// Deletes a budget with its sub-allocations and snapshots.
    pub fn delete_budget(&self, id: Uuid, user_id: Uuid) -> Result<(), CoreError> {
        let locks = self.recalculator.locks();
        {
            let slot = locks.slot(id);
            let _guard = hold(&slot);
            load_owned_budget(self.recalculator.store().as_ref(), id, user_id)?;
            if !self.recalculator.store().delete_budget(id)? {
                return Err(CoreError::BudgetNotFound(id));
            }
        }
        locks.forget(id);
        info!(budget_id = %id, "budget deleted");
        Ok(())
    }

    /// Spend figures of the budget's current period.
    ///
    /// Reads the committed snapshot; a period that has no snapshot yet is derived on the
    /// fly without writing anything.
    pub fn current_usage(&self, id: Uuid) -> Result<CurrentUsage, CoreError> {
        let store = self.recalculator.store();
        let budget = store.budget(id)?.ok_or(CoreError::BudgetNotFound(id))?;
        let period = budget.active_period(self.recalculator.clock().today());

        if let Some(snapshot) = store.snapshot(id, period.start)? {
            return Ok(CurrentUsage::from_parts(
                snapshot.spent_amount,
                snapshot.available(),
            ));
        }

        let rollover_in = if budget.rollover && period.start > budget.first_period().start {
            let previous = previous_period(&budget.cycle(), period.start);
            store
                .snapshot(id, previous.start)?
                .map_or(0.0, |snapshot| snapshot.rollover_out)
        } else {
            0.0
        };
        let spent = self
            .recalculator
            .transactions()
            .sum_for_budget(id, period)?
            .max(0.0);
        let available = budget.amount_for_period(period.start) + rollover_in;
        Ok(CurrentUsage::from_parts(spent, available))
    }

    /// Re-derives the current period, promoting a due deferred amount.
    pub fn refresh(&self, id: Uuid) -> Result<RecalculationReport, CoreError> {
        self.recalculator.recalculate(id, PassScope::CurrentPeriod)
    }
}

fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("budget name cannot be empty".into()));
    }
    Ok(())
}

fn validate_amount(amount: f64) -> Result<(), CoreError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(CoreError::Validation(format!(
            "budget amount must be a non-negative number, got {amount}"
        )));
    }
    Ok(())
}

fn validate_cycle(budget: &Budget) -> Result<(), CoreError> {
    if budget.cycle().has_valid_start_day() {
        return Ok(());
    }
    Err(CoreError::Validation(format!(
        "cycle start day {} is out of range for a {} cycle",
        budget.cycle_start_day, budget.cycle_type
    )))
}
