//! Budget definitions and the edit payloads applied to them.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    cycle::{CycleConfig, CycleType},
    period::{current_period, PeriodWindow},
};

/// An amount allotted to a user for every period of a cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub amount: f64,
    pub cycle_type: CycleType,
    pub cycle_start_day: u32,
    pub start_date: NaiveDate,
    pub is_recurring: bool,
    pub rollover: bool,
    pub is_active: bool,
    /// Amount waiting for the next period boundary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_amount: Option<f64>,
    /// First period start that is allotted `pending_amount`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_effective_from: Option<NaiveDate>,
    #[serde(default)]
    pub alert_80_sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub alert_100_sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_recalculating: bool,
    #[serde(default)]
    pub last_recalculated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    pub fn new(input: NewBudget, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            name: input.name,
            description: input.description,
            amount: input.amount,
            cycle_type: input.cycle_type,
            cycle_start_day: input.cycle_start_day,
            start_date: input.start_date,
            is_recurring: input.is_recurring,
            rollover: input.rollover,
            is_active: true,
            pending_amount: None,
            pending_effective_from: None,
            alert_80_sent_at: None,
            alert_100_sent_at: None,
            is_recalculating: false,
            last_recalculated_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn cycle(&self) -> CycleConfig {
        CycleConfig::new(self.cycle_type, self.cycle_start_day, self.start_date)
    }

    /// The period containing `start_date`; nothing is tracked before it.
    pub fn first_period(&self) -> PeriodWindow {
        current_period(&self.cycle(), self.start_date)
    }

    /// The period that is current on `today`.
    ///
    /// One-off budgets only ever have their first period, and a budget that has not
    /// started yet reports its first period as well.
    pub fn active_period(&self, today: NaiveDate) -> PeriodWindow {
        let first = self.first_period();
        if !self.is_recurring {
            return first;
        }
        let current = current_period(&self.cycle(), today);
        if current.start < first.start {
            first
        } else {
            current
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Amount allotted to the period starting at `period_start`, honouring a deferred change.
    pub fn amount_for_period(&self, period_start: NaiveDate) -> f64 {
        match (self.pending_amount, self.pending_effective_from) {
            (Some(pending), Some(effective)) if period_start >= effective => pending,
            _ => self.amount,
        }
    }

    /// Moves a due pending amount into `amount`. Returns the promoted value.
    pub fn promote_pending(&mut self, period_start: NaiveDate) -> Option<f64> {
        let effective = self.pending_effective_from?;
        if period_start < effective {
            return None;
        }
        let promoted = self.pending_amount.take();
        self.pending_effective_from = None;
        if let Some(amount) = promoted {
            self.amount = amount;
        }
        promoted
    }

    pub fn clear_pending(&mut self) {
        self.pending_amount = None;
        self.pending_effective_from = None;
    }
}

/// Input used to create a [`Budget`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBudget {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub amount: f64,
    pub cycle_type: CycleType,
    pub cycle_start_day: u32,
    pub start_date: NaiveDate,
    pub is_recurring: bool,
    pub rollover: bool,
}

impl NewBudget {
    /// A recurring monthly budget starting on the first of each month.
    pub fn monthly(
        user_id: Uuid,
        name: impl Into<String>,
        amount: f64,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            user_id,
            name: name.into(),
            description: None,
            amount,
            cycle_type: CycleType::Month,
            cycle_start_day: 1,
            start_date,
            is_recurring: true,
            rollover: false,
        }
    }

    pub fn with_cycle(mut self, cycle_type: CycleType, cycle_start_day: u32) -> Self {
        self.cycle_type = cycle_type;
        self.cycle_start_day = cycle_start_day;
        self
    }

    pub fn with_rollover(mut self, rollover: bool) -> Self {
        self.rollover = rollover;
        self
    }

    pub fn one_off(mut self) -> Self {
        self.is_recurring = false;
        self
    }
}

/// Partial update applied by `updateBudget`. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BudgetPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub amount: Option<f64>,
    pub cycle_type: Option<CycleType>,
    pub cycle_start_day: Option<u32>,
    pub rollover: Option<bool>,
    pub is_active: Option<bool>,
}

impl BudgetPatch {
    pub fn amount(amount: f64) -> Self {
        Self {
            amount: Some(amount),
            ..Self::default()
        }
    }
}

/// When an amount edit takes effect.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EffectiveFrom {
    #[default]
    Immediate,
    NextPeriod,
}

impl fmt::Display for EffectiveFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EffectiveFrom::Immediate => "immediate",
            EffectiveFrom::NextPeriod => "nextPeriod",
        };
        f.write_str(label)
    }
}
