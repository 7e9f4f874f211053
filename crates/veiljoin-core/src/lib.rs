//! Sort-merge join execution for confidential rows: a tagger, the
//! cross-partition boundary protocol, and oblivious and compact merges over
//! framed, caller-owned buffers.

pub mod codec;
pub mod config;
pub mod error;
pub mod join;
pub mod model;
pub mod obs;
pub mod orchestrate;
pub mod serialize;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Join vocabulary only. Codecs, errors, and stream helpers stay in their
/// modules.
///

pub mod prelude {
    pub use crate::{
        join::{
            JoinEngine,
            policy::{JoinPolicy, KeyColumnsPolicy},
        },
        model::{
            record::{JoinRecord, OutputRecord, TableSide},
            row::Row,
            schema::Schema,
        },
        orchestrate::{MergeMode, PartitionedJoin},
        value::Value,
    };
}
