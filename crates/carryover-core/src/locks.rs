//! Per-budget single-writer serialization.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use uuid::Uuid;

/// Hands out one mutex per budget id. Passes and edits for the same budget
/// run one after another; different budgets never contend.
#[derive(Debug, Default)]
pub struct BudgetLocks {
    slots: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl BudgetLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mutex guarding `budget_id`. Lock it with [`hold`].
    pub fn slot(&self, budget_id: Uuid) -> Arc<Mutex<()>> {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(slots.entry(budget_id).or_default())
    }

    /// Drops the slot of a deleted budget.
    pub fn forget(&self, budget_id: Uuid) {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&budget_id);
    }
}

/// Blocks until the slot is free. A panic in an earlier holder does not wedge the budget.
pub fn hold(slot: &Mutex<()>) -> MutexGuard<'_, ()> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
        time::Duration,
    };

    #[test]
    fn same_budget_is_serialized() {
        let locks = Arc::new(BudgetLocks::new());
        let budget = Uuid::new_v4();
        let inside = Arc::new(AtomicUsize::new(0));
        let overlap = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let overlap = Arc::clone(&overlap);
                thread::spawn(move || {
                    let slot = locks.slot(budget);
                    let _guard = hold(&slot);
                    if inside.fetch_add(1, Ordering::SeqCst) > 0 {
                        overlap.fetch_add(1, Ordering::SeqCst);
                    }
                    thread::sleep(Duration::from_millis(5));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(overlap.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn distinct_budgets_get_distinct_slots() {
        let locks = BudgetLocks::new();
        let a = locks.slot(Uuid::new_v4());
        let b = locks.slot(Uuid::new_v4());
        assert!(!Arc::ptr_eq(&a, &b));
        let _a = hold(&a);
        let _b = hold(&b);
    }
}
