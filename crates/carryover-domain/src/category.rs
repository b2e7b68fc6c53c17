//! Category catalog entries and budget sub-allocations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A node of the external category catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryNode {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
}

impl CategoryNode {
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            parent_id: None,
        }
    }

    pub fn child_of(parent: &CategoryNode, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            parent_id: Some(parent.id),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Category-level quota declared inside a budget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetCategory {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub category_id: Uuid,
    pub amount: f64,
    /// Excluded rows stay on record but drop out of aggregate rollups.
    #[serde(default)]
    pub is_excluded: bool,
}

impl BudgetCategory {
    pub fn new(input: NewBudgetCategory) -> Self {
        Self {
            id: Uuid::new_v4(),
            budget_id: input.budget_id,
            category_id: input.category_id,
            amount: input.amount,
            is_excluded: input.is_excluded,
        }
    }

    pub fn apply(&mut self, patch: &BudgetCategoryPatch) {
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(excluded) = patch.is_excluded {
            self.is_excluded = excluded;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBudgetCategory {
    pub budget_id: Uuid,
    pub category_id: Uuid,
    pub amount: f64,
    pub is_excluded: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BudgetCategoryPatch {
    pub amount: Option<f64>,
    pub is_excluded: Option<bool>,
}

/// Declared allocation totals for one budget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationSummary {
    pub budget_amount: f64,
    pub allocated: f64,
    pub unallocated: f64,
    pub excluded_count: usize,
}

impl AllocationSummary {
    pub fn from_rows(budget_amount: f64, rows: &[BudgetCategory]) -> Self {
        let allocated: f64 = rows
            .iter()
            .filter(|row| !row.is_excluded)
            .map(|row| row.amount)
            .sum();
        Self {
            budget_amount,
            allocated,
            unallocated: budget_amount - allocated,
            excluded_count: rows.iter().filter(|row| row.is_excluded).count(),
        }
    }
}
