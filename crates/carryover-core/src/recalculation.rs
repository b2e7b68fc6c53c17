//! Backtracking recalculation of period snapshots after transaction changes.
//!
//! A pass re-derives every snapshot from the earliest invalidated period up to the
//! budget's current period, threading rollover forward one period at a time. All
//! writes of a pass, the alert stamps and the lock release are committed together
//! through [`BudgetStore::commit_pass`]; a failed pass commits nothing.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use carryover_domain::{
    current_period, next_period, periods_through, previous_period, usage_rate, AlertEvent,
    Budget, BudgetPeriodSnapshot, CycleConfig, ImpactEvent, PeriodWindow,
};

use crate::{
    alerts::{self, AlertSink},
    locks::{hold, BudgetLocks},
    rollover::rollover_out,
    storage::{BudgetRepository, BudgetStore, PassCommit, SnapshotStore},
    time::Clock,
    transactions::TransactionSource,
    CoreError,
};

/// Which periods a pass re-derives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassScope {
    /// From the period containing the date through the current period.
    FromDate(NaiveDate),
    /// The current period only.
    CurrentPeriod,
    /// Every period from the budget's first one, discarding stored snapshots.
    Rebuild,
}

/// Outcome of one budget's pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RecalculationReport {
    pub budget_id: Uuid,
    /// Periods written, oldest first.
    pub periods: Vec<PeriodWindow>,
    pub alerts: Vec<AlertEvent>,
    /// Deferred amount moved into `amount` by this pass.
    pub promoted_amount: Option<f64>,
    /// Set when the budget is inactive and nothing was written.
    pub skipped: bool,
}

impl RecalculationReport {
    fn skipped(budget_id: Uuid) -> Self {
        Self {
            budget_id,
            periods: Vec::new(),
            alerts: Vec::new(),
            promoted_amount: None,
            skipped: true,
        }
    }
}

pub struct ImpactRecalculator {
    store: Arc<dyn BudgetStore>,
    transactions: Arc<dyn TransactionSource>,
    clock: Arc<dyn Clock>,
    alerts: Arc<dyn AlertSink>,
    locks: Arc<BudgetLocks>,
}

impl ImpactRecalculator {
    pub fn new(
        store: Arc<dyn BudgetStore>,
        transactions: Arc<dyn TransactionSource>,
        clock: Arc<dyn Clock>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            store,
            transactions,
            clock,
            alerts,
            locks: Arc::new(BudgetLocks::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn BudgetStore> {
        &self.store
    }

    pub fn transactions(&self) -> &Arc<dyn TransactionSource> {
        &self.transactions
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn locks(&self) -> &Arc<BudgetLocks> {
        &self.locks
    }

    /// Runs one pass per distinct budget, starting at the earliest impacted date.
    ///
    /// Budgets are independent: a failure for one does not stop the others. The first
    /// failure is returned once every budget has been attempted.
    pub fn process(&self, events: &[ImpactEvent]) -> Result<Vec<RecalculationReport>, CoreError> {
        let mut earliest: BTreeMap<Uuid, NaiveDate> = BTreeMap::new();
        for event in events {
            earliest
                .entry(event.budget_id)
                .and_modify(|date| *date = (*date).min(event.date))
                .or_insert(event.date);
        }

        let mut reports = Vec::with_capacity(earliest.len());
        let mut first_error = None;
        for (budget_id, date) in earliest {
            match self.recalculate(budget_id, PassScope::FromDate(date)) {
                Ok(report) => reports.push(report),
                Err(err) => {
                    warn!(%budget_id, error = %err, "impact event not applied");
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(reports),
        }
    }

    /// Runs a pass for one budget, waiting for any in-flight pass on it to finish.
    pub fn recalculate(
        &self,
        budget_id: Uuid,
        scope: PassScope,
    ) -> Result<RecalculationReport, CoreError> {
        let slot = self.locks.slot(budget_id);
        let _guard = hold(&slot);
        self.recalculate_locked(budget_id, scope)
    }

    /// Runs a pass over the stored row; the caller must hold the budget's slot.
    fn recalculate_locked(
        &self,
        budget_id: Uuid,
        scope: PassScope,
    ) -> Result<RecalculationReport, CoreError> {
        let budget = self
            .store
            .budget(budget_id)?
            .ok_or(CoreError::BudgetNotFound(budget_id))?;
        self.run_pass(budget, scope)
    }

    /// Runs a pass for `budget` as given rather than as stored, committing the row
    /// together with its snapshots. The caller must hold the budget's slot.
    ///
    /// On failure the stored row is left as it was, apart from the released flag.
    pub(crate) fn run_pass(
        &self,
        budget: Budget,
        scope: PassScope,
    ) -> Result<RecalculationReport, CoreError> {
        let budget_id = budget.id;
        if !budget.is_active {
            debug!(%budget_id, "skipping inactive budget");
            return Ok(RecalculationReport::skipped(budget_id));
        }

        self.store.set_recalculating(budget_id, true)?;
        let now = self.clock.now();
        let outcome = self.derive(&budget, scope, now).and_then(|(commit, report)| {
            self.store.commit_pass(commit)?;
            Ok(report)
        });

        match outcome {
            Ok(report) => {
                for alert in &report.alerts {
                    self.alerts.deliver(alert);
                }
                info!(
                    %budget_id,
                    periods = report.periods.len(),
                    alerts = report.alerts.len(),
                    "budget snapshots recalculated"
                );
                Ok(report)
            }
            Err(err) => {
                warn!(%budget_id, error = %err, "recalculation pass aborted");
                if let Err(release) = self.store.set_recalculating(budget_id, false) {
                    warn!(%budget_id, error = %release, "could not release recalculation flag");
                }
                Err(CoreError::RecalculationFailed {
                    budget_id,
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Computes every write of the pass without touching the store's state.
    fn derive(
        &self,
        budget: &Budget,
        scope: PassScope,
        now: DateTime<Utc>,
    ) -> Result<(PassCommit, RecalculationReport), CoreError> {
        let cycle = budget.cycle();
        let floor = budget.first_period();
        let target = budget.active_period(now.date_naive());
        let replace_existing = scope == PassScope::Rebuild;

        let requested = match scope {
            PassScope::FromDate(date) => current_period(&cycle, date),
            PassScope::CurrentPeriod => target,
            PassScope::Rebuild => floor,
        };
        let requested = if requested.start < floor.start {
            floor
        } else if requested.start > target.start {
            target
        } else {
            requested
        };

        let (first, carried) = if replace_existing {
            (floor, 0.0)
        } else {
            self.chain_start(budget.id, &cycle, requested, floor)?
        };
        // Snapshots stored while rollover was enabled may still carry a balance.
        let mut rollover_in = if budget.rollover { carried } else { 0.0 };

        let periods = periods_through(&cycle, first, target.start);
        let mut snapshots = Vec::with_capacity(periods.len());
        for period in &periods {
            let stored = if replace_existing || period.start >= target.start {
                None
            } else {
                self.store.snapshot(budget.id, period.start)?
            };
            let budget_amount = stored
                .map(|snapshot| snapshot.budget_amount)
                .unwrap_or_else(|| budget.amount_for_period(period.start));
            let spent = self
                .transactions
                .sum_for_budget(budget.id, *period)?
                .max(0.0);

            let mut snapshot = BudgetPeriodSnapshot::new(budget.id, *period, now);
            snapshot.budget_amount = budget_amount;
            snapshot.spent_amount = spent;
            snapshot.rollover_in = rollover_in;
            snapshot.rollover_out = rollover_out(budget_amount, spent, rollover_in, budget.rollover);
            debug!(
                budget_id = %budget.id,
                period = %period,
                spent,
                rollover_in,
                rollover_out = snapshot.rollover_out,
                "period derived"
            );
            rollover_in = snapshot.rollover_out;
            snapshots.push(snapshot);
        }

        let mut updated = budget.clone();
        let mut fired = Vec::new();
        if let Some(current) = snapshots.last().filter(|s| s.period_start == target.start) {
            if let Some(rate) = usage_rate(current.spent_amount, current.available()) {
                let triggers = alerts::evaluate(
                    rate,
                    budget.alert_80_sent_at,
                    budget.alert_100_sent_at,
                    target.start,
                );
                alerts::stamp(&mut updated, &triggers, now);
                fired = triggers
                    .into_iter()
                    .map(|kind| AlertEvent {
                        budget_id: budget.id,
                        kind,
                        usage_rate: rate,
                    })
                    .collect();
            }
        }
        let promoted_amount = updated.promote_pending(target.start);
        updated.is_recalculating = false;
        updated.last_recalculated_at = Some(now);

        let report = RecalculationReport {
            budget_id: budget.id,
            periods,
            alerts: fired,
            promoted_amount,
            skipped: false,
        };
        let commit = PassCommit {
            budget: updated,
            snapshots,
            replace_existing,
        };
        Ok((commit, report))
    }

    /// First period of the pass and the rollover carried into it.
    ///
    /// Reads the stored snapshot just before `requested`. When that period was never
    /// derived, the pass is widened back to the period after the latest stored
    /// snapshot (or to the budget's first period) so the rollover chain has no holes.
    fn chain_start(
        &self,
        budget_id: Uuid,
        cycle: &CycleConfig,
        requested: PeriodWindow,
        floor: PeriodWindow,
    ) -> Result<(PeriodWindow, f64), CoreError> {
        if requested.start <= floor.start {
            return Ok((floor, 0.0));
        }
        let previous = previous_period(cycle, requested.start);
        if let Some(snapshot) = self.store.snapshot(budget_id, previous.start)? {
            return Ok((requested, snapshot.rollover_out));
        }
        match self.store.snapshot_before(budget_id, requested.start)? {
            Some(snapshot) if snapshot.period_start >= floor.start => {
                let resume = next_period(cycle, &snapshot.window());
                debug!(%budget_id, from = %resume.start, "widening pass over missing periods");
                Ok((resume, snapshot.rollover_out))
            }
            _ => Ok((floor, 0.0)),
        }
    }
}
