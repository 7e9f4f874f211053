//! Sequential reference driver for partitioned joins.
//!
//! Real deployments schedule partitions across workers; this driver runs the
//! same protocol in one thread so the boundary contract can be exercised end
//! to end:
//!
//! 1. collect each partition's last primary;
//! 2. apply a dummy carried record over the collected records, giving the
//!    running primary at the start of every partition;
//! 3. merge each partition from its seed and concatenate the outputs.

use crate::{
    codec::{
        CborRowCodec, RowCodec,
        stream::{
            EncodedStream, concat_streams, decode_output_records, encode_join_records,
            split_stream, stream_layout,
        },
    },
    error::InternalError,
    join::{
        JoinEngine,
        policy::{JoinPolicy, KeyColumnsPolicy},
    },
    model::record::{JoinRecord, OutputRecord},
};

///
/// MergeMode
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MergeMode {
    #[default]
    Oblivious,
    /// Compact output; releases the match count.
    NonOblivious,
}

///
/// PartitionedOutput
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PartitionedOutput {
    pub partitions: Vec<EncodedStream>,
    /// Total matches; only reported by non-oblivious runs.
    pub matches: Option<u64>,
}

impl PartitionedOutput {
    /// All partition outputs as one stream.
    pub fn concat(&self) -> Result<EncodedStream, InternalError> {
        concat_streams(&self.partitions)
    }

    pub fn records<C: RowCodec + ?Sized>(
        &self,
        codec: &C,
    ) -> Result<Vec<OutputRecord>, InternalError> {
        let mut out = Vec::new();
        for part in &self.partitions {
            out.extend(decode_output_records(codec, &part.bytes, part.count)?);
        }

        Ok(out)
    }
}

///
/// PartitionedJoin
///

pub struct PartitionedJoin<'a, C = CborRowCodec, P: ?Sized = KeyColumnsPolicy> {
    engine: &'a JoinEngine<C>,
    policy: &'a P,
    partitions: usize,
}

impl<'a, C: RowCodec, P: JoinPolicy + ?Sized> PartitionedJoin<'a, C, P> {
    #[must_use]
    pub const fn new(engine: &'a JoinEngine<C>, policy: &'a P, partitions: usize) -> Self {
        Self {
            engine,
            policy,
            partitions,
        }
    }

    /// Join a sorted join-record stream across the configured partitions.
    pub fn run(
        &self,
        input: &[u8],
        num_rows: u32,
        mode: MergeMode,
    ) -> Result<PartitionedOutput, InternalError> {
        let parts = split_stream(input, num_rows, self.partitions)?;
        let seeds = self.boundary_seeds(&parts)?;

        let mut outputs = Vec::with_capacity(parts.len());
        let mut matches = 0u64;
        for (part, seed) in parts.iter().zip(&seeds) {
            let mut out = vec![0u8; self.engine.merge_output_len(&part.bytes, part.count)?];

            let count = match mode {
                MergeMode::Oblivious => {
                    let written = self.engine.oblivious_merge(
                        self.policy,
                        &part.bytes,
                        part.count,
                        &seed.bytes,
                        &mut out,
                    )?;
                    out.truncate(written);
                    part.count
                }
                MergeMode::NonOblivious => {
                    let summary = self.engine.non_oblivious_merge_seeded(
                        self.policy,
                        &part.bytes,
                        part.count,
                        Some(&seed.bytes),
                        &mut out,
                    )?;
                    out.truncate(summary.bytes_written);
                    matches += u64::from(summary.matches);
                    summary.matches
                }
            };

            outputs.push(EncodedStream { bytes: out, count });
        }

        Ok(PartitionedOutput {
            partitions: outputs,
            matches: (mode == MergeMode::NonOblivious).then_some(matches),
        })
    }

    /// One-record seed streams, one per partition, holding the running
    /// primary at each partition's start.
    pub fn boundary_seeds(
        &self,
        parts: &[EncodedStream],
    ) -> Result<Vec<EncodedStream>, InternalError> {
        let mut collected = Vec::with_capacity(parts.len());
        for part in parts {
            let mut out = vec![0u8; self.engine.collect_output_len(&part.bytes)?];
            let written = self
                .engine
                .collect_boundary(&part.bytes, part.count, &mut out)?;
            out.truncate(written);
            collected.push(EncodedStream {
                bytes: out,
                count: 1,
            });
        }
        let collected = concat_streams(&collected)?;

        let layout = stream_layout(&collected.bytes)?;
        let dummy = encode_join_records(self.engine.codec(), &[JoinRecord::Dummy], layout)?;

        let mut states =
            vec![0u8; self.engine.apply_output_len(&collected.bytes, collected.count)?];
        let written = self.engine.apply_boundary(
            &collected.bytes,
            collected.count,
            &dummy.bytes,
            &mut states,
        )?;
        states.truncate(written);

        // the final state only matters to a following batch
        let mut seeds = split_stream(&states, collected.count + 1, parts.len() + 1)?;
        seeds.pop();

        Ok(seeds)
    }
}

///
/// TESTS
///
