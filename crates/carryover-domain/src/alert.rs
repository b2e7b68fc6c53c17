//! Usage alert payloads handed to the notification collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AlertKind {
    #[serde(rename = "USAGE_80")]
    Usage80,
    #[serde(rename = "USAGE_100")]
    Usage100,
}

impl AlertKind {
    /// Usage percentage at which the alert fires.
    pub fn threshold(self) -> f64 {
        match self {
            AlertKind::Usage80 => 80.0,
            AlertKind::Usage100 => 100.0,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AlertKind::Usage80 => "USAGE_80",
            AlertKind::Usage100 => "USAGE_100",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertEvent {
    pub budget_id: Uuid,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub usage_rate: f64,
}

/// Usage figures for a budget's current period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrentUsage {
    pub spent: f64,
    pub available: f64,
    pub remaining: f64,
    /// Percentage of `available` spent; absent when nothing is available.
    pub usage_rate: Option<f64>,
}

impl CurrentUsage {
    pub fn from_parts(spent: f64, available: f64) -> Self {
        Self {
            spent,
            available,
            remaining: available - spent,
            usage_rate: usage_rate(spent, available),
        }
    }
}

/// `spent / available` as a percentage. `None` when `available` is not positive.
pub fn usage_rate(spent: f64, available: f64) -> Option<f64> {
    if available > f64::EPSILON {
        Some(spent / available * 100.0)
    } else {
        None
    }
}
