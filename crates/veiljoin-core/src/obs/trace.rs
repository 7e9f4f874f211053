//! Join tracing boundary.
//!
//! Tracing is optional, injected by the caller, and must not affect execution semantics.

use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    join::policy::PolicyFingerprint,
    obs::OpOutcome,
};

///
/// JoinTraceSink
///

pub trait JoinTraceSink: Send + Sync {
    fn on_event(&self, event: JoinTraceEvent);
}

///
/// JoinOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinOp {
    Preprocess,
    CollectBoundary,
    ApplyBoundary,
    ObliviousMerge,
    CompactMerge,
}

impl JoinOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preprocess => "preprocess",
            Self::CollectBoundary => "collect_boundary",
            Self::ApplyBoundary => "apply_boundary",
            Self::ObliviousMerge => "oblivious_merge",
            Self::CompactMerge => "compact_merge",
        }
    }
}

///
/// JoinTraceEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinTraceEvent {
    Start {
        op: JoinOp,
        policy: Option<PolicyFingerprint>,
        rows_in: u64,
    },
    Finish {
        op: JoinOp,
        policy: Option<PolicyFingerprint>,
        rows_in: u64,
        rows_out: u64,
        bytes_written: u64,
        // only populated by the non-oblivious merge
        matches: Option<u64>,
    },
    Error {
        op: JoinOp,
        policy: Option<PolicyFingerprint>,
        class: ErrorClass,
        origin: ErrorOrigin,
    },
}

///
/// TraceScope
///

pub(crate) struct TraceScope {
    sink: &'static dyn JoinTraceSink,
    op: JoinOp,
    policy: Option<PolicyFingerprint>,
    rows_in: u64,
}

impl TraceScope {
    fn new(
        sink: &'static dyn JoinTraceSink,
        op: JoinOp,
        policy: Option<PolicyFingerprint>,
        rows_in: u64,
    ) -> Self {
        sink.on_event(JoinTraceEvent::Start {
            op,
            policy,
            rows_in,
        });
        Self {
            sink,
            op,
            policy,
            rows_in,
        }
    }

    pub(crate) fn finish(self, outcome: OpOutcome) {
        self.sink.on_event(JoinTraceEvent::Finish {
            op: self.op,
            policy: self.policy,
            rows_in: self.rows_in,
            rows_out: outcome.rows_out,
            bytes_written: outcome.bytes_written,
            matches: outcome.matches,
        });
    }

    pub(crate) fn error(self, err: &InternalError) {
        self.sink.on_event(JoinTraceEvent::Error {
            op: self.op,
            policy: self.policy,
            class: err.class,
            origin: err.origin,
        });
    }
}

pub(crate) fn start_trace(
    sink: Option<&'static dyn JoinTraceSink>,
    op: JoinOp,
    policy: Option<PolicyFingerprint>,
    rows_in: u32,
) -> Option<TraceScope> {
    let sink = sink?;
    Some(TraceScope::new(sink, op, policy, u64::from(rows_in)))
}
