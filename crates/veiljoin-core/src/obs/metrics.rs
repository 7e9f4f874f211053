use crate::{
    error::{ErrorClass, InternalError},
    obs::{OpOutcome, trace::JoinOp},
};
use serde::Serialize;
use std::cell::RefCell;

///
/// MetricsReport
/// Ephemeral, in-memory counters for join operations on this thread.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct MetricsReport {
    pub preprocess: OpCounters,
    pub collect_boundary: OpCounters,
    pub apply_boundary: OpCounters,
    pub oblivious_merge: OpCounters,
    pub compact_merge: OpCounters,

    // Failure taxonomy
    pub integrity_failures: u64,
    pub capacity_failures: u64,

    // Non-oblivious merges only
    pub matches_released: u64,
}

impl MetricsReport {
    fn counters_mut(&mut self, op: JoinOp) -> &mut OpCounters {
        match op {
            JoinOp::Preprocess => &mut self.preprocess,
            JoinOp::CollectBoundary => &mut self.collect_boundary,
            JoinOp::ApplyBoundary => &mut self.apply_boundary,
            JoinOp::ObliviousMerge => &mut self.oblivious_merge,
            JoinOp::CompactMerge => &mut self.compact_merge,
        }
    }

    #[must_use]
    pub const fn counters(&self, op: JoinOp) -> &OpCounters {
        match op {
            JoinOp::Preprocess => &self.preprocess,
            JoinOp::CollectBoundary => &self.collect_boundary,
            JoinOp::ApplyBoundary => &self.apply_boundary,
            JoinOp::ObliviousMerge => &self.oblivious_merge,
            JoinOp::CompactMerge => &self.compact_merge,
        }
    }
}

///
/// OpCounters
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct OpCounters {
    pub calls: u64,
    pub failures: u64,
    pub rows_in: u64,
    pub rows_out: u64,
    pub bytes_written: u64,
}

thread_local! {
    static METRICS: RefCell<MetricsReport> = RefCell::new(MetricsReport::default());
}

fn with_state_mut<R>(f: impl FnOnce(&mut MetricsReport) -> R) -> R {
    METRICS.with(|m| f(&mut m.borrow_mut()))
}

pub(crate) fn record_success(op: JoinOp, rows_in: u32, outcome: OpOutcome) {
    with_state_mut(|m| {
        if let Some(matches) = outcome.matches {
            m.matches_released = m.matches_released.saturating_add(matches);
        }

        let c = m.counters_mut(op);
        c.calls = c.calls.saturating_add(1);
        c.rows_in = c.rows_in.saturating_add(u64::from(rows_in));
        c.rows_out = c.rows_out.saturating_add(outcome.rows_out);
        c.bytes_written = c.bytes_written.saturating_add(outcome.bytes_written);
    });
}

pub(crate) fn record_failure(op: JoinOp, err: &InternalError) {
    with_state_mut(|m| {
        match err.class {
            ErrorClass::Integrity => {
                m.integrity_failures = m.integrity_failures.saturating_add(1);
            }
            ErrorClass::Capacity => {
                m.capacity_failures = m.capacity_failures.saturating_add(1);
            }
            _ => {}
        }

        let c = m.counters_mut(op);
        c.calls = c.calls.saturating_add(1);
        c.failures = c.failures.saturating_add(1);
    });
}

/// Snapshot the current thread's counters.
#[must_use]
pub fn metrics_report() -> MetricsReport {
    METRICS.with(|m| m.borrow().clone())
}

/// Reset all counters (useful in tests).
pub fn metrics_reset() {
    with_state_mut(|m| *m = MetricsReport::default());
}
