//! Shared fixtures for join tests: key/label rows, sorted join streams, and
//! thin wrappers that size output buffers and decode results.

use crate::{
    codec::{
        CborRowCodec,
        frame::FrameLayout,
        stream::{
            EncodedStream, decode_join_records, decode_output_records, encode_join_records,
            encode_rows, stream_layout,
        },
    },
    error::InternalError,
    join::{JoinEngine, UpperBound, merge::MergeSummary, policy::JoinPolicy},
    model::{
        record::{JoinRecord, OutputRecord},
        row::Row,
        schema::{ColumnDef, Schema},
    },
    value::Value,
};
use veiljoin_primitives::ColumnKind;

pub(crate) fn kv_schema(name: &str) -> Schema {
    Schema::new(
        name,
        vec![
            ColumnDef::new("key", ColumnKind::Int),
            ColumnDef::new("label", ColumnKind::Text),
        ],
    )
}

pub(crate) fn kv(key: i32, label: &str) -> Row {
    Row::new(vec![Value::Int(key), Value::from(label)])
}

/// Engine sized from key/label schemas so empty inputs are accepted.
pub(crate) fn schema_engine() -> JoinEngine {
    JoinEngine::new(CborRowCodec::default()).with_upper_bound(UpperBound::Schema {
        primary: kv_schema("primary"),
        foreign: kv_schema("foreign"),
    })
}

pub(crate) fn preprocess_rows(
    engine: &JoinEngine,
    primary: &[Row],
    foreign: &[Row],
) -> Result<EncodedStream, InternalError> {
    let p = encode_rows(engine.codec(), primary)?;
    let f = encode_rows(engine.codec(), foreign)?;

    let len = engine.preprocess_output_len(&p.bytes, p.count, &f.bytes, f.count)?;
    let mut out = vec![0u8; len];
    let written = engine.preprocess(&p.bytes, p.count, &f.bytes, f.count, &mut out)?;
    out.truncate(written);

    Ok(EncodedStream {
        bytes: out,
        count: p.count + f.count,
    })
}

/// Preprocess, then order records by (join attribute, primary first).
pub(crate) fn sorted_join_stream<P: JoinPolicy>(
    engine: &JoinEngine,
    policy: &P,
    primary: &[Row],
    foreign: &[Row],
) -> EncodedStream {
    let stream = preprocess_rows(engine, primary, foreign).expect("preprocess");
    let layout = stream_layout(&stream.bytes).expect("layout");
    let mut records =
        decode_join_records(engine.codec(), &stream.bytes, stream.count).expect("decode");

    records.sort_by_cached_key(|record| match record {
        JoinRecord::Real { side, row } => (
            Some(policy.join_attribute(*side, row).expect("attribute")),
            side.group_rank(),
        ),
        JoinRecord::Dummy => (None, u8::MAX),
    });

    encode_join_records(engine.codec(), &records, layout).expect("encode")
}

pub(crate) fn single_record(
    engine: &JoinEngine,
    record: JoinRecord,
    layout: FrameLayout,
) -> EncodedStream {
    encode_join_records(engine.codec(), &[record], layout).expect("encode single record")
}

pub(crate) fn run_oblivious<P: JoinPolicy>(
    engine: &JoinEngine,
    policy: &P,
    stream: &EncodedStream,
    seed: &EncodedStream,
) -> Result<Vec<OutputRecord>, InternalError> {
    let mut out = vec![0u8; engine.merge_output_len(&stream.bytes, stream.count)?];
    let written = engine.oblivious_merge(policy, &stream.bytes, stream.count, &seed.bytes, &mut out)?;
    assert_eq!(written, out.len(), "oblivious output length is fixed");

    decode_output_records(engine.codec(), &out, stream.count)
}

pub(crate) fn run_compact<P: JoinPolicy>(
    engine: &JoinEngine,
    policy: &P,
    stream: &EncodedStream,
) -> Result<(MergeSummary, Vec<OutputRecord>), InternalError> {
    let mut out = vec![0u8; engine.merge_output_len(&stream.bytes, stream.count)?];
    let summary = engine.non_oblivious_merge(policy, &stream.bytes, stream.count, &mut out)?;
    let records =
        decode_output_records(engine.codec(), &out[..summary.bytes_written], summary.matches)?;

    Ok((summary, records))
}

pub(crate) fn merged_rows(records: Vec<OutputRecord>) -> Vec<Row> {
    records.into_iter().filter_map(OutputRecord::into_row).collect()
}
