//! carryover-domain
//!
//! Pure domain models (Budget, BudgetCategory, period snapshots, impact events)
//! and the period calculator. No I/O, no storage, no clock access.

pub mod alert;
pub mod book;
pub mod budget;
pub mod category;
pub mod cycle;
pub mod period;
pub mod snapshot;
pub mod transaction;

pub use alert::*;
pub use book::*;
pub use budget::*;
pub use category::*;
pub use cycle::*;
pub use period::*;
pub use snapshot::*;
pub use transaction::*;
