//! Sort-merge over a sorted join-record stream.
//!
//! Both modes walk the stream once, tracking the most recent primary row.
//! A foreign row whose join attribute equals that primary's produces one
//! merged row.
//!
//! The oblivious mode writes exactly one fixed-width output frame per input
//! record and always computes a merge candidate when a primary is known, so
//! output size and write pattern are independent of which rows matched.
//! Codec and comparison timing still vary with row contents.
//!
//! The compact mode writes matches only and returns their count. It
//! releases the join cardinality and must only be used where that is
//! acceptable.

use crate::{
    codec::{
        RowCodec,
        frame::{FrameLayout, fixed_frame},
        record::{RecordReader, RecordWriter, encode_output_record, merged_frame_width},
    },
    error::{ErrorOrigin, InternalError},
    join::{
        JoinEngine,
        policy::{JoinAttribute, JoinPolicy},
        select::select_frame,
    },
    model::{
        record::{JoinRecord, OutputRecord, TableSide},
        row::Row,
    },
    obs::{self, JoinOp, OpOutcome},
};

///
/// MergeSummary
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MergeSummary {
    pub bytes_written: usize,
    pub matches: u32,
}

///
/// RunningPrimary
///
/// The most recent primary row and its join attribute.
///

struct RunningPrimary {
    current: Option<(Row, JoinAttribute)>,
}

impl RunningPrimary {
    // Seed from a carried record already checked to be dummy or primary.
    fn seed<P: JoinPolicy + ?Sized>(
        policy: &P,
        record: JoinRecord,
    ) -> Result<Self, InternalError> {
        let current = match record {
            JoinRecord::Real { side, row } => {
                let attr = policy.join_attribute(side, &row)?;
                Some((row, attr))
            }
            JoinRecord::Dummy => None,
        };

        Ok(Self { current })
    }

    // Replace the running primary. Two consecutive primaries with one join
    // attribute break the unique-key contract of the primary table.
    fn advance(&mut self, row: Row, attr: JoinAttribute) -> Result<(), InternalError> {
        if matches!(&self.current, Some((_, prev)) if *prev == attr) {
            return Err(InternalError::integrity(
                ErrorOrigin::Merge,
                "primary table holds more than one row for a join attribute",
            ));
        }
        self.current = Some((row, attr));

        Ok(())
    }

    fn row(&self) -> Option<&Row> {
        self.current.as_ref().map(|(row, _)| row)
    }

    fn matches(&self, attr: &JoinAttribute) -> bool {
        self.current.as_ref().is_some_and(|(_, prev)| prev == attr)
    }
}

impl<C: RowCodec> JoinEngine<C> {
    /// Output length of [`Self::oblivious_merge`], and an upper bound for
    /// the compact merge over the same input.
    pub fn merge_output_len(&self, input: &[u8], num_rows: u32) -> Result<usize, InternalError> {
        let width = merged_frame_width(self.fixed_width(ErrorOrigin::Merge, input)?);

        FrameLayout::Fixed(width)
            .stream_len(num_rows as usize)
            .ok_or_else(|| InternalError::capacity(ErrorOrigin::Merge, "output length overflows"))
    }

    /// Merge a sorted join-record stream, writing exactly one output record
    /// per input record: a merged row for each matching foreign record and
    /// a dummy everywhere else.
    ///
    /// `join_row` is a one-record stream holding the running primary at the
    /// start of this partition (a dummy for the first partition).
    pub fn oblivious_merge<P: JoinPolicy + ?Sized>(
        &self,
        policy: &P,
        input: &[u8],
        num_rows: u32,
        join_row: &[u8],
        out: &mut [u8],
    ) -> Result<usize, InternalError> {
        let fingerprint = Some(policy.fingerprint());

        obs::observe(self.trace, JoinOp::ObliviousMerge, fingerprint, num_rows, || {
            self.check_row_count(ErrorOrigin::Merge, u64::from(num_rows))?;
            let width = self.fixed_width(ErrorOrigin::Merge, input)?;
            if self.verify_sorted {
                self.verify_sorted(policy, input, num_rows)?;
            }

            let seed = self.decode_carried(ErrorOrigin::Merge, join_row)?;
            let mut running = RunningPrimary::seed(policy, seed)?;

            let out_width = merged_frame_width(width);
            let dummy = self.output_frame(out_width, &OutputRecord::Dummy)?;

            let mut writer = RecordWriter::new(&self.codec, out, FrameLayout::Fixed(out_width))?;
            for record in RecordReader::new(&self.codec, input, num_rows)? {
                let slot = match record? {
                    JoinRecord::Dummy => dummy.clone(),
                    JoinRecord::Real {
                        side: TableSide::Primary,
                        row,
                    } => {
                        let attr = policy.join_attribute(TableSide::Primary, &row)?;
                        running.advance(row, attr)?;
                        dummy.clone()
                    }
                    JoinRecord::Real {
                        side: TableSide::Foreign,
                        row,
                    } => {
                        let attr = policy.join_attribute(TableSide::Foreign, &row)?;
                        let matched = running.matches(&attr);
                        let candidate = match running.row() {
                            Some(primary) => {
                                let merged = policy.merge(primary, &row)?;
                                self.output_frame(out_width, &OutputRecord::Merged(merged))?
                            }
                            None => dummy.clone(),
                        };

                        let mut chosen = vec![0u8; out_width];
                        select_frame(matched, &candidate, &dummy, &mut chosen);
                        chosen
                    }
                };

                writer.frames_mut().write_frame(&slot)?;
            }

            let frames = writer.frames_written();
            let written = writer.finish();

            Ok((written, OpOutcome::new(frames, written)))
        })
    }

    /// Merge a sorted join-record stream, writing merged rows only.
    pub fn non_oblivious_merge<P: JoinPolicy + ?Sized>(
        &self,
        policy: &P,
        input: &[u8],
        num_rows: u32,
        out: &mut [u8],
    ) -> Result<MergeSummary, InternalError> {
        self.non_oblivious_merge_seeded(policy, input, num_rows, None, out)
    }

    /// [`Self::non_oblivious_merge`] starting from a carried primary, for
    /// partitions after the first.
    pub fn non_oblivious_merge_seeded<P: JoinPolicy + ?Sized>(
        &self,
        policy: &P,
        input: &[u8],
        num_rows: u32,
        join_row: Option<&[u8]>,
        out: &mut [u8],
    ) -> Result<MergeSummary, InternalError> {
        let fingerprint = Some(policy.fingerprint());

        obs::observe(self.trace, JoinOp::CompactMerge, fingerprint, num_rows, || {
            self.check_row_count(ErrorOrigin::Merge, u64::from(num_rows))?;
            if self.verify_sorted {
                self.verify_sorted(policy, input, num_rows)?;
            }

            let seed = match join_row {
                Some(bytes) => self.decode_carried(ErrorOrigin::Merge, bytes)?,
                None => JoinRecord::Dummy,
            };
            let mut running = RunningPrimary::seed(policy, seed)?;

            let mut matches = 0u32;
            let mut writer = RecordWriter::new(&self.codec, out, FrameLayout::Variable)?;
            for record in RecordReader::new(&self.codec, input, num_rows)? {
                let JoinRecord::Real { side, row } = record? else {
                    continue;
                };
                let attr = policy.join_attribute(side, &row)?;

                match side {
                    TableSide::Primary => running.advance(row, attr)?,
                    TableSide::Foreign => {
                        if let Some(primary) = running.row().filter(|_| running.matches(&attr)) {
                            let merged = policy.merge(primary, &row)?;
                            writer.write_output(&OutputRecord::Merged(merged))?;
                            matches += 1;
                        }
                    }
                }
            }

            let written = writer.finish();
            let outcome = OpOutcome::new(matches as usize, written).with_matches(u64::from(matches));

            Ok((
                MergeSummary {
                    bytes_written: written,
                    matches,
                },
                outcome,
            ))
        })
    }

    fn output_frame(&self, width: usize, record: &OutputRecord) -> Result<Vec<u8>, InternalError> {
        let payload = encode_output_record(&self.codec, record)?;
        let frame = fixed_frame(width, &payload)
            .map_err(|err| InternalError::from(err).with_origin(ErrorOrigin::Merge))?;

        Ok(frame)
    }
}
