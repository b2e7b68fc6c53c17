#![doc(test(attr(deny(warnings))))]

//! Carryover keeps a per-period ledger for every budget: what was allotted, what was
//! spent and what rolled over, re-derived whenever a past transaction changes.

pub mod config;
pub mod engine;
pub mod errors;
pub mod utils;

pub use carryover_config;
pub use carryover_core;
pub use carryover_domain;
pub use engine::{BudgetDefaults, BudgetEngine};
pub use errors::{ApiError, EngineError, Result};

use std::sync::Once;

use carryover_config::Config;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing with the default filter and emits a startup info log.
pub fn init() {
    init_tracing_once(utils::DEFAULT_LOG_FILTER);
}

/// Like [`init`], filtering with the configured `log_filter` directive.
pub fn init_with(config: &Config) {
    init_tracing_once(&config.log_filter);
}

fn init_tracing_once(directive: &str) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(directive);
        tracing::info!(filter = directive, "Carryover tracing initialized.");
    });
}
