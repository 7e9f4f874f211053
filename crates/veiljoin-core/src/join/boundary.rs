//! Cross-partition join state.
//!
//! A sorted join-record stream may be cut anywhere, so a foreign record at
//! the start of one partition can belong to a primary that sits in an
//! earlier one. The collector reports each partition's last primary; the
//! applier turns a sequence of records plus a carried record into the
//! running primary state at every position.
//!
//! Both operations work on raw fixed-width frames and update their state by
//! masked selection, so every input record costs the same work whichever
//! table it came from.

use crate::{
    codec::{
        RowCodec,
        frame::{FrameLayout, fixed_frame},
        record::{RecordReader, RecordWriter, encode_join_record, frame_is_primary},
    },
    error::{ErrorOrigin, InternalError},
    join::{JoinEngine, select::FrameState},
    model::record::JoinRecord,
    obs::{self, JoinOp, OpOutcome},
};

impl<C: RowCodec> JoinEngine<C> {
    /// Output length of [`Self::collect_boundary`]: one record.
    pub fn collect_output_len(&self, input: &[u8]) -> Result<usize, InternalError> {
        let width = self.fixed_width(ErrorOrigin::Boundary, input)?;

        stream_len(width, 1)
    }

    /// Output length of [`Self::apply_boundary`]: `num_rows + 1` records.
    pub fn apply_output_len(&self, input: &[u8], num_rows: u32) -> Result<usize, InternalError> {
        let width = self.fixed_width(ErrorOrigin::Boundary, input)?;

        stream_len(width, num_rows as usize + 1)
    }

    /// Write the last primary record of a partition, or a dummy when the
    /// partition holds none, as a one-record stream in the input layout.
    pub fn collect_boundary(
        &self,
        input: &[u8],
        num_rows: u32,
        out: &mut [u8],
    ) -> Result<usize, InternalError> {
        obs::observe(self.trace, JoinOp::CollectBoundary, None, num_rows, || {
            self.check_row_count(ErrorOrigin::Boundary, u64::from(num_rows))?;
            let width = self.fixed_width(ErrorOrigin::Boundary, input)?;

            let mut state = FrameState::new(self.state_frame(width, &JoinRecord::Dummy)?);
            let mut reader = RecordReader::new(&self.codec, input, num_rows)?;
            while let Some(frame) = reader.next_raw_frame() {
                let frame = frame?;
                state.assign_if(frame_is_primary(frame)?, frame);
            }

            let mut writer = RecordWriter::new(&self.codec, out, FrameLayout::Fixed(width))?;
            writer.frames_mut().write_frame(state.as_bytes())?;
            let written = writer.finish();

            Ok((written, OpOutcome::new(1, written)))
        })
    }

    /// Propagate a carried record through a partition.
    ///
    /// Writes `num_rows + 1` records: the carried record, then for each input
    /// record the most recent primary seen so far (the record itself when it
    /// is primary). Record 0 seeds a merge of this partition; the final
    /// record is the state to carry into the next.
    pub fn apply_boundary(
        &self,
        input: &[u8],
        num_rows: u32,
        carried: &[u8],
        out: &mut [u8],
    ) -> Result<usize, InternalError> {
        obs::observe(self.trace, JoinOp::ApplyBoundary, None, num_rows, || {
            self.check_row_count(ErrorOrigin::Boundary, u64::from(num_rows))?;
            let width = self.fixed_width(ErrorOrigin::Boundary, input)?;

            let carried = self.decode_carried(ErrorOrigin::Boundary, carried)?;
            let mut state = FrameState::new(self.state_frame(width, &carried)?);

            let mut writer = RecordWriter::new(&self.codec, out, FrameLayout::Fixed(width))?;
            writer.frames_mut().write_frame(state.as_bytes())?;

            let mut reader = RecordReader::new(&self.codec, input, num_rows)?;
            while let Some(frame) = reader.next_raw_frame() {
                let frame = frame?;
                state.assign_if(frame_is_primary(frame)?, frame);
                writer.frames_mut().write_frame(state.as_bytes())?;
            }

            let frames = writer.frames_written();
            let written = writer.finish();

            Ok((written, OpOutcome::new(frames, written)))
        })
    }

    // Encode one record as a frame of the stream's width.
    fn state_frame(&self, width: usize, record: &JoinRecord) -> Result<Vec<u8>, InternalError> {
        let payload = encode_join_record(&self.codec, record)?;
        let frame = fixed_frame(width, &payload)
            .map_err(|err| InternalError::from(err).with_origin(ErrorOrigin::Boundary))?;

        Ok(frame)
    }
}

fn stream_len(width: usize, frames: usize) -> Result<usize, InternalError> {
    FrameLayout::Fixed(width)
        .stream_len(frames)
        .ok_or_else(|| InternalError::capacity(ErrorOrigin::Boundary, "output length overflows"))
}

// Typed forms of the two boundary operations, for callers holding decoded records.

/// Last primary record in `records`, or a dummy.
pub fn collect_last_primary(records: impl IntoIterator<Item = JoinRecord>) -> JoinRecord {
    records
        .into_iter()
        .filter(JoinRecord::is_primary)
        .last()
        .unwrap_or_default()
}

/// `carried` followed by the running primary state after each record.
pub fn propagate_boundary(
    carried: JoinRecord,
    records: impl IntoIterator<Item = JoinRecord>,
) -> Vec<JoinRecord> {
    let mut state = carried;
    let mut out = vec![state.clone()];
    for record in records {
        if record.is_primary() {
            state = record;
        }
        out.push(state.clone());
    }

    out
}
