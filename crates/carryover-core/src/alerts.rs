//! Usage-threshold alerts with per-period de-duplication.

use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::info;

use carryover_domain::{AlertEvent, AlertKind, Budget};

/// Thresholds crossed by `usage_rate` that have not fired yet in the period starting at
/// `period_start`.
///
/// A stored `*_sent_at` older than the period start no longer blocks the alert, so every
/// new period resets eligibility.
pub fn evaluate(
    usage_rate: f64,
    alert_80_sent_at: Option<DateTime<Utc>>,
    alert_100_sent_at: Option<DateTime<Utc>>,
    period_start: NaiveDate,
) -> Vec<AlertKind> {
    let boundary = period_start_instant(period_start);
    let eligible = |sent_at: Option<DateTime<Utc>>| sent_at.map_or(true, |at| at < boundary);

    let mut triggers = Vec::new();
    if usage_rate >= AlertKind::Usage80.threshold() && eligible(alert_80_sent_at) {
        triggers.push(AlertKind::Usage80);
    }
    if usage_rate >= AlertKind::Usage100.threshold() && eligible(alert_100_sent_at) {
        triggers.push(AlertKind::Usage100);
    }
    triggers
}

/// Stamps the budget for every trigger so the period never re-fires it.
pub fn stamp(budget: &mut Budget, triggers: &[AlertKind], now: DateTime<Utc>) {
    for kind in triggers {
        match kind {
            AlertKind::Usage80 => budget.alert_80_sent_at = Some(now),
            AlertKind::Usage100 => budget.alert_100_sent_at = Some(now),
        }
    }
}

fn period_start_instant(period_start: NaiveDate) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(period_start.and_time(NaiveTime::default()), Utc)
}

/// Receives alert events once the pass that produced them has committed.
pub trait AlertSink: Send + Sync {
    fn deliver(&self, event: &AlertEvent);
}

/// Writes alerts to the tracing pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn deliver(&self, event: &AlertEvent) {
        info!(
            budget_id = %event.budget_id,
            kind = %event.kind,
            usage_rate = event.usage_rate,
            "budget usage alert"
        );
    }
}

/// Keeps every delivered alert in memory.
#[derive(Debug, Default)]
pub struct RecordingAlertSink {
    events: Mutex<Vec<AlertEvent>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AlertEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn take(&self) -> Vec<AlertEvent> {
        std::mem::take(
            &mut *self
                .events
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

impl AlertSink for RecordingAlertSink {
    fn deliver(&self, event: &AlertEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}
