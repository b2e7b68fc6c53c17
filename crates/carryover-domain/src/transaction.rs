//! Transaction-side records the engine reacts to.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimal view of a transaction: when it happened and how much it moved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub date: NaiveDate,
    pub amount: f64,
}

impl TransactionRecord {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            amount,
        }
    }
}

/// Links a transaction to a budget it counts against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TransactionBudget {
    pub transaction_id: Uuid,
    pub budget_id: Uuid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ImpactKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ImpactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ImpactKind::Create => "create",
            ImpactKind::Update => "update",
            ImpactKind::Delete => "delete",
        };
        f.write_str(label)
    }
}

/// Signal that spend for `budget_id` may have changed on `date`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ImpactEvent {
    pub budget_id: Uuid,
    pub date: NaiveDate,
    pub kind: ImpactKind,
}

impl ImpactEvent {
    pub fn new(budget_id: Uuid, date: NaiveDate, kind: ImpactKind) -> Self {
        Self {
            budget_id,
            date,
            kind,
        }
    }
}
