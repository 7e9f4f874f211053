use crate::{
    codec::stream::stream_layout,
    error::{ErrorClass, ErrorOrigin},
    join::policy::{JoinPolicy, KeyColumnsPolicy},
    model::record::JoinRecord,
    obs::{JoinOp, JoinTraceEvent, JoinTraceSink, MetricsReport, metrics_report, metrics_reset},
    test_support::{kv, run_compact, run_oblivious, schema_engine, single_record, sorted_join_stream},
};
use std::sync::Mutex;

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<JoinTraceEvent>>,
}

impl RecordingSink {
    fn leak() -> &'static Self {
        Box::leak(Box::new(Self::default()))
    }

    fn events(&self) -> Vec<JoinTraceEvent> {
        self.events.lock().expect("sink lock").clone()
    }
}

impl JoinTraceSink for RecordingSink {
    fn on_event(&self, event: JoinTraceEvent) {
        self.events.lock().expect("sink lock").push(event);
    }
}

#[test]
fn oblivious_merge_traces_start_and_finish_without_matches() {
    let sink = RecordingSink::leak();
    let engine = schema_engine().with_trace(sink);
    let policy = KeyColumnsPolicy::single(0);
    let stream = sorted_join_stream(&engine, &policy, &[kv(1, "A")], &[kv(1, "X"), kv(2, "Y")]);
    let seed = single_record(&engine, JoinRecord::Dummy, stream_layout(&stream.bytes).unwrap());

    let before = sink.events().len();
    run_oblivious(&engine, &policy, &stream, &seed).expect("merge");
    let events = sink.events().split_off(before);

    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0],
        JoinTraceEvent::Start {
            op: JoinOp::ObliviousMerge,
            policy: Some(policy.fingerprint()),
            rows_in: 3,
        }
    );
    let JoinTraceEvent::Finish {
        op,
        rows_out,
        matches,
        ..
    } = events[1]
    else {
        panic!("expected finish event, got {:?}", events[1]);
    };
    assert_eq!(op, JoinOp::ObliviousMerge);
    assert_eq!(rows_out, 3);
    assert_eq!(matches, None);
}

#[test]
fn compact_merge_traces_match_count() {
    let sink = RecordingSink::leak();
    let engine = schema_engine().with_trace(sink);
    let policy = KeyColumnsPolicy::single(0);
    let stream = sorted_join_stream(&engine, &policy, &[kv(1, "A")], &[kv(1, "X"), kv(2, "Y")]);

    run_compact(&engine, &policy, &stream).expect("merge");

    let last = sink.events().pop().expect("events recorded");
    assert!(matches!(
        last,
        JoinTraceEvent::Finish {
            op: JoinOp::CompactMerge,
            rows_out: 1,
            matches: Some(1),
            ..
        }
    ));
}

#[test]
fn failures_trace_class_and_origin() {
    let sink = RecordingSink::leak();
    let engine = schema_engine().with_trace(sink);
    let policy = KeyColumnsPolicy::single(0);
    let stream = sorted_join_stream(&engine, &policy, &[kv(1, "A"), kv(1, "B")], &[]);

    run_compact(&engine, &policy, &stream).expect_err("duplicate primary");

    let last = sink.events().pop().expect("events recorded");
    assert_eq!(
        last,
        JoinTraceEvent::Error {
            op: JoinOp::CompactMerge,
            policy: Some(policy.fingerprint()),
            class: ErrorClass::Integrity,
            origin: ErrorOrigin::Merge,
        }
    );
}

#[test]
fn metrics_count_calls_failures_and_released_matches() {
    metrics_reset();
    let engine = schema_engine();
    let policy = KeyColumnsPolicy::single(0);

    let good = sorted_join_stream(&engine, &policy, &[kv(1, "A")], &[kv(1, "X"), kv(1, "Y")]);
    let bad = sorted_join_stream(&engine, &policy, &[kv(1, "A"), kv(1, "B")], &[]);
    run_compact(&engine, &policy, &good).expect("merge");
    run_compact(&engine, &policy, &bad).expect_err("duplicate primary");

    let report = metrics_report();
    let compact = report.counters(JoinOp::CompactMerge);
    assert_eq!(compact.calls, 2);
    assert_eq!(compact.failures, 1);
    assert_eq!(compact.rows_in, 3);
    assert_eq!(compact.rows_out, 2);
    assert_eq!(report.matches_released, 2);
    assert_eq!(report.integrity_failures, 1);

    // two preprocess calls built the fixtures
    assert_eq!(report.counters(JoinOp::Preprocess).calls, 2);
    assert_eq!(report.counters(JoinOp::ObliviousMerge).calls, 0);

    metrics_reset();
    assert_eq!(metrics_report(), MetricsReport::default());
}
