//! Fuel accounting (spec.md Sec. 5 "Fuel accounting", Sec. 8 property 8 "Fuel
//! monotonicity"). Every emitted flake and every produced solution increments
//! a shared, per-query counter; exceeding `max_fuel` raises
//! [`QueryError::ExceededCost`] and is meant to cancel the owning task group —
//! in this single-threaded-stream re-architecture, that cancellation is just
//! the `Err` propagating out of the combinator chain and dropping the stream.

use crate::error::QueryError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A shared counter, cloned into every combinator spawned for one query
/// execution (spec.md Sec. 9: "process-wide-per-query counter").
#[derive(Clone, Debug)]
pub struct FuelCounter {
    spent: Arc<AtomicU64>,
    budget: Option<u64>,
}

impl FuelCounter {
    pub fn new(budget: Option<u64>) -> Self {
        Self { spent: Arc::new(AtomicU64::new(0)), budget }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Increments the counter by `units` and fails once the budget is exceeded.
    pub fn spend(&self, units: u64) -> Result<(), QueryError> {
        let spent = self.spent.fetch_add(units, Ordering::Relaxed) + units;
        match self.budget {
            Some(budget) if spent > budget => Err(QueryError::ExceededCost { spent, budget }),
            _ => Ok(()),
        }
    }

    pub fn spent(&self) -> u64 {
        self.spent.load(Ordering::Relaxed)
    }
}
