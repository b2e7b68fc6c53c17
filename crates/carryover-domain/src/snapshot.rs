//! Per-period derived ledger rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::period::PeriodWindow;

/// Allotment, spend and rollover recorded for one budget period.
///
/// Snapshots are a cache: they can always be discarded and re-derived from
/// transaction history and budget configuration. At most one exists per
/// `(budget_id, period_start)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetPeriodSnapshot {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub budget_amount: f64,
    pub spent_amount: f64,
    pub rollover_in: f64,
    pub rollover_out: f64,
    pub last_recalculated_at: DateTime<Utc>,
}

impl BudgetPeriodSnapshot {
    pub fn new(budget_id: Uuid, window: PeriodWindow, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            budget_id,
            period_start: window.start,
            period_end: window.end,
            budget_amount: 0.0,
            spent_amount: 0.0,
            rollover_in: 0.0,
            rollover_out: 0.0,
            last_recalculated_at: now,
        }
    }

    pub fn window(&self) -> PeriodWindow {
        PeriodWindow::new(self.period_start, self.period_end)
    }

    /// Allotment plus carried-in rollover.
    pub fn available(&self) -> f64 {
        self.budget_amount + self.rollover_in
    }

    pub fn is_same_slot(&self, other: &BudgetPeriodSnapshot) -> bool {
        self.budget_id == other.budget_id && self.period_start == other.period_start
    }
}
