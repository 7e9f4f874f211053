//! Observability: injected trace sinks and process-local metrics.
//!
//! Nothing recorded here may depend on which rows matched, except in the
//! non-oblivious merge whose match count is already a deliberate release.

pub(crate) mod metrics;
pub(crate) mod trace;

#[cfg(test)]
mod tests;

use crate::{error::InternalError, join::policy::PolicyFingerprint};

// re-exports
pub use metrics::{MetricsReport, OpCounters, metrics_report, metrics_reset};
pub use trace::{JoinOp, JoinTraceEvent, JoinTraceSink};

///
/// OpOutcome
///
/// Data-independent summary of one completed operation.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct OpOutcome {
    pub rows_out: u64,
    pub bytes_written: u64,
    pub matches: Option<u64>,
}

impl OpOutcome {
    pub(crate) fn new(rows_out: usize, bytes_written: usize) -> Self {
        Self {
            rows_out: rows_out as u64,
            bytes_written: bytes_written as u64,
            matches: None,
        }
    }

    #[must_use]
    pub(crate) const fn with_matches(mut self, matches: u64) -> Self {
        self.matches = Some(matches);
        self
    }
}

/// Run one operation body, reporting its outcome to metrics and the sink.
pub(crate) fn observe<T>(
    sink: Option<&'static dyn JoinTraceSink>,
    op: JoinOp,
    policy: Option<PolicyFingerprint>,
    rows_in: u32,
    run: impl FnOnce() -> Result<(T, OpOutcome), InternalError>,
) -> Result<T, InternalError> {
    let scope = trace::start_trace(sink, op, policy, rows_in);

    match run() {
        Ok((value, outcome)) => {
            metrics::record_success(op, rows_in, outcome);
            if let Some(scope) = scope {
                scope.finish(outcome);
            }
            Ok(value)
        }
        Err(err) => {
            metrics::record_failure(op, &err);
            if let Some(scope) = scope {
                scope.error(&err);
            }
            Err(err)
        }
    }
}
