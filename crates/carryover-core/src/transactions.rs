//! Transaction collaborator: spend sums per budget window and the impact events
//! raised when joined transactions change.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use uuid::Uuid;

use carryover_domain::{ImpactEvent, ImpactKind, PeriodWindow, TransactionBudget, TransactionRecord};

use crate::CoreError;

/// Spend queries the recalculator issues.
pub trait TransactionSource: Send + Sync {
    /// Sum of amounts of transactions joined to `budget_id` dated inside `window` (inclusive).
    fn sum_for_budget(&self, budget_id: Uuid, window: PeriodWindow) -> Result<f64, CoreError>;
}

/// Changes applied to an existing transaction. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionChange {
    pub date: Option<NaiveDate>,
    pub amount: Option<f64>,
    /// Full replacement of the budgets the transaction counts against.
    pub budget_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Default)]
struct JournalState {
    transactions: Vec<TransactionRecord>,
    links: Vec<TransactionBudget>,
}

impl JournalState {
    fn transaction(&self, id: Uuid) -> Result<&TransactionRecord, CoreError> {
        self.transactions
            .iter()
            .find(|txn| txn.id == id)
            .ok_or(CoreError::TransactionNotFound(id))
    }

    fn budgets_of(&self, transaction_id: Uuid) -> Vec<Uuid> {
        self.links
            .iter()
            .filter(|link| link.transaction_id == transaction_id)
            .map(|link| link.budget_id)
            .collect()
    }

    fn replace_links(&mut self, transaction_id: Uuid, budget_ids: &[Uuid]) {
        self.links.retain(|link| link.transaction_id != transaction_id);
        for budget_id in budget_ids {
            let link = TransactionBudget {
                transaction_id,
                budget_id: *budget_id,
            };
            if !self.links.contains(&link) {
                self.links.push(link);
            }
        }
    }
}

/// In-memory transaction store with `TransactionBudget` joins.
#[derive(Debug, Default)]
pub struct TransactionJournal {
    state: RwLock<JournalState>,
}

impl TransactionJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a transaction tagged to `budget_ids`.
    pub fn record(
        &self,
        transaction: TransactionRecord,
        budget_ids: &[Uuid],
    ) -> Result<Vec<ImpactEvent>, CoreError> {
        let mut state = self.write()?;
        if state.transactions.iter().any(|txn| txn.id == transaction.id) {
            return Err(CoreError::AlreadyExists(format!(
                "transaction {}",
                transaction.id
            )));
        }
        state.replace_links(transaction.id, budget_ids);
        let events = impacts(&state.budgets_of(transaction.id), transaction.date, ImpactKind::Create);
        state.transactions.push(transaction);
        Ok(events)
    }

    /// Amends a transaction. Budgets it used to count against are notified for the old
    /// date, budgets it counts against now for the new date.
    pub fn amend(&self, id: Uuid, change: TransactionChange) -> Result<Vec<ImpactEvent>, CoreError> {
        let mut state = self.write()?;
        let old_date = state.transaction(id)?.date;
        let old_budgets = state.budgets_of(id);

        if let Some(budget_ids) = change.budget_ids.as_deref() {
            state.replace_links(id, budget_ids);
        }
        let new_budgets = state.budgets_of(id);

        let txn = state
            .transactions
            .iter_mut()
            .find(|txn| txn.id == id)
            .ok_or(CoreError::TransactionNotFound(id))?;
        if let Some(date) = change.date {
            txn.date = date;
        }
        if let Some(amount) = change.amount {
            txn.amount = amount;
        }
        let new_date = txn.date;

        let mut events = impacts(&old_budgets, old_date, ImpactKind::Update);
        for event in impacts(&new_budgets, new_date, ImpactKind::Update) {
            if !events.contains(&event) {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Deletes a transaction and its budget joins.
    pub fn remove(&self, id: Uuid) -> Result<Vec<ImpactEvent>, CoreError> {
        let mut state = self.write()?;
        let date = state.transaction(id)?.date;
        let budgets = state.budgets_of(id);
        state.transactions.retain(|txn| txn.id != id);
        state.links.retain(|link| link.transaction_id != id);
        Ok(impacts(&budgets, date, ImpactKind::Delete))
    }

    /// Tags an existing transaction to another budget.
    pub fn link(&self, transaction_id: Uuid, budget_id: Uuid) -> Result<Vec<ImpactEvent>, CoreError> {
        let mut state = self.write()?;
        let date = state.transaction(transaction_id)?.date;
        let link = TransactionBudget {
            transaction_id,
            budget_id,
        };
        if state.links.contains(&link) {
            return Ok(Vec::new());
        }
        state.links.push(link);
        Ok(impacts(&[budget_id], date, ImpactKind::Update))
    }

    /// Clears the tag between a transaction and a budget.
    pub fn unlink(&self, transaction_id: Uuid, budget_id: Uuid) -> Result<Vec<ImpactEvent>, CoreError> {
        let mut state = self.write()?;
        let date = state.transaction(transaction_id)?.date;
        let before = state.links.len();
        state
            .links
            .retain(|link| !(link.transaction_id == transaction_id && link.budget_id == budget_id));
        if state.links.len() == before {
            return Ok(Vec::new());
        }
        Ok(impacts(&[budget_id], date, ImpactKind::Update))
    }

    pub fn budgets_for(&self, transaction_id: Uuid) -> Result<Vec<Uuid>, CoreError> {
        Ok(self.read()?.budgets_of(transaction_id))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, JournalState>, CoreError> {
        self.state
            .read()
            .map_err(|_| CoreError::TransactionSource("journal lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, JournalState>, CoreError> {
        self.state
            .write()
            .map_err(|_| CoreError::TransactionSource("journal lock poisoned".into()))
    }
}

impl TransactionSource for TransactionJournal {
    fn sum_for_budget(&self, budget_id: Uuid, window: PeriodWindow) -> Result<f64, CoreError> {
        let state = self.read()?;
        let total: f64 = state
            .transactions
            .iter()
            .filter(|txn| window.contains(txn.date))
            .filter(|txn| {
                state
                    .links
                    .iter()
                    .any(|link| link.transaction_id == txn.id && link.budget_id == budget_id)
            })
            .map(|txn| txn.amount)
            .sum();
        Ok(total)
    }
}

fn impacts(budget_ids: &[Uuid], date: NaiveDate, kind: ImpactKind) -> Vec<ImpactEvent> {
    budget_ids
        .iter()
        .map(|budget_id| ImpactEvent::new(*budget_id, date, kind))
        .collect()
}
