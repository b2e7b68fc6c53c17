//! Facade over the accounting core: the operations the API layer calls.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use carryover_config::Config;
use carryover_core::{
    AlertSink, BudgetCategoryAllocator, BudgetLifecycleManager, BudgetRepository, BudgetStore,
    BudgetUpdate, CategoryCatalog, Clock, CoreError, ImpactRecalculator, RecalculationReport, SnapshotStore, SystemClock,
    TracingAlertSink, TransactionSource,
};
use carryover_domain::{
    AllocationSummary, Budget, BudgetCategory, BudgetCategoryPatch, BudgetPatch,
    BudgetPeriodSnapshot, CurrentUsage, CycleType, EffectiveFrom, ImpactEvent, NewBudget,
    NewBudgetCategory,
};
use carryover_storage_json::JsonBudgetStore;

use crate::{errors::Result, utils::storage_paths};

/// Cycle settings applied by [`BudgetEngine::create_budget_with_defaults`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetDefaults {
    pub cycle_type: CycleType,
    pub cycle_start_day: u32,
    pub rollover: bool,
}

impl Default for BudgetDefaults {
    fn default() -> Self {
        Self {
            cycle_type: CycleType::Month,
            cycle_start_day: 1,
            rollover: false,
        }
    }
}

impl BudgetDefaults {
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cycle_type: config.cycle_type()?,
            cycle_start_day: config.default_cycle_start_day,
            rollover: config.default_rollover,
        })
    }
}

pub struct BudgetEngine {
    recalculator: Arc<ImpactRecalculator>,
    lifecycle: BudgetLifecycleManager,
    allocator: BudgetCategoryAllocator,
    defaults: BudgetDefaults,
    /// Display currency reported alongside amounts. Nothing is converted.
    currency: String,
}

impl BudgetEngine {
    pub fn new(
        store: Arc<dyn BudgetStore>,
        transactions: Arc<dyn TransactionSource>,
        catalog: Arc<dyn CategoryCatalog>,
        clock: Arc<dyn Clock>,
        alerts: Arc<dyn AlertSink>,
        defaults: BudgetDefaults,
    ) -> Self {
        let recalculator = Arc::new(ImpactRecalculator::new(
            Arc::clone(&store),
            transactions,
            clock,
            alerts,
        ));
        let allocator =
            BudgetCategoryAllocator::new(store, catalog, Arc::clone(recalculator.locks()));
        let lifecycle = BudgetLifecycleManager::new(Arc::clone(&recalculator));
        Self {
            recalculator,
            lifecycle,
            allocator,
            defaults,
            currency: Config::default().currency,
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Engine persisting to the JSON store under the config's data directory, using the
    /// system clock and logging alerts through tracing.
    pub fn open(
        config: &Config,
        transactions: Arc<dyn TransactionSource>,
        catalog: Arc<dyn CategoryCatalog>,
    ) -> Result<Self> {
        let defaults = BudgetDefaults::from_config(config)?;
        crate::init_with(config);
        let paths = storage_paths(config);
        info!(
            data_root = %paths.data_root.display(),
            currency = %config.currency,
            "opening budget engine"
        );
        let store = JsonBudgetStore::with_retention(paths, config.backup_retention)?;
        Ok(Self::new(
            Arc::new(store),
            transactions,
            catalog,
            Arc::new(SystemClock),
            Arc::new(TracingAlertSink),
            defaults,
        )
        .with_currency(config.currency.clone()))
    }

    pub fn defaults(&self) -> BudgetDefaults {
        self.defaults
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn create_budget(&self, input: NewBudget) -> Result<Budget> {
        Ok(self.lifecycle.create_budget(input)?)
    }

    /// Creates a recurring budget using the configured cycle and rollover defaults.
    pub fn create_budget_with_defaults(
        &self,
        user_id: Uuid,
        name: &str,
        amount: f64,
        start_date: NaiveDate,
    ) -> Result<Budget> {
        let input = NewBudget::monthly(user_id, name, amount, start_date)
            .with_cycle(self.defaults.cycle_type, self.defaults.cycle_start_day)
            .with_rollover(self.defaults.rollover);
        self.create_budget(input)
    }

    pub fn budget(&self, id: Uuid, user_id: Uuid) -> Result<Budget> {
        Ok(self.lifecycle.budget(id, user_id)?)
    }

    pub fn list_budgets(&self, user_id: Uuid) -> Result<Vec<Budget>> {
        Ok(self.lifecycle.list_budgets(user_id)?)
    }

    pub fn update_budget(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: BudgetPatch,
        effective_from: EffectiveFrom,
    ) -> Result<BudgetUpdate> {
        Ok(self
            .lifecycle
            .update_budget(id, user_id, patch, effective_from)?)
    }

    pub fn delete_budget(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        Ok(self.lifecycle.delete_budget(id, user_id)?)
    }

    pub fn get_current_usage(&self, budget_id: Uuid) -> Result<CurrentUsage> {
        Ok(self.lifecycle.current_usage(budget_id)?)
    }

    pub fn get_budget_categories(
        &self,
        user_id: Uuid,
        budget_id: Uuid,
    ) -> Result<Vec<BudgetCategory>> {
        Ok(self.allocator.list(user_id, budget_id)?)
    }

    pub fn create_budget_category(
        &self,
        user_id: Uuid,
        input: NewBudgetCategory,
    ) -> Result<BudgetCategory> {
        Ok(self.allocator.add(user_id, input)?)
    }

    pub fn update_budget_category(
        &self,
        user_id: Uuid,
        budget_id: Uuid,
        budget_category_id: Uuid,
        patch: BudgetCategoryPatch,
    ) -> Result<BudgetCategory> {
        Ok(self
            .allocator
            .update(user_id, budget_id, budget_category_id, patch)?)
    }

    pub fn delete_budget_category(
        &self,
        user_id: Uuid,
        budget_id: Uuid,
        budget_category_id: Uuid,
    ) -> Result<()> {
        Ok(self.allocator.delete(user_id, budget_id, budget_category_id)?)
    }

    pub fn allocation_summary(&self, user_id: Uuid, budget_id: Uuid) -> Result<AllocationSummary> {
        Ok(self.allocator.summary(user_id, budget_id)?)
    }

    /// Re-derives the snapshots invalidated by transaction changes.
    pub fn apply_impacts(&self, events: &[ImpactEvent]) -> Result<Vec<RecalculationReport>> {
        Ok(self.recalculator.process(events)?)
    }

    /// Re-derives the current period, e.g. after a period boundary was crossed.
    pub fn refresh_budget(&self, budget_id: Uuid) -> Result<RecalculationReport> {
        Ok(self.lifecycle.refresh(budget_id)?)
    }

    /// Stored snapshots of a budget, oldest period first.
    pub fn snapshots(&self, budget_id: Uuid) -> Result<Vec<BudgetPeriodSnapshot>> {
        let store = self.recalculator.store();
        if store.budget(budget_id)?.is_none() {
            return Err(CoreError::BudgetNotFound(budget_id).into());
        }
        Ok(store.snapshots(budget_id)?)
    }
}
