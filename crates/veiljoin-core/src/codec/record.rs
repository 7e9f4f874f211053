use crate::{
    codec::{
        RowCodec,
        frame::{FRAME_PREFIX_BYTES, FrameLayout, FrameReader, FrameWriter},
    },
    error::{ErrorOrigin, InternalError},
    model::record::{JoinRecord, OutputRecord, TableSide},
};
use veiljoin_primitives::{ColumnKind, DUMMY_TAG};

/// Leading tag byte of every record payload.
pub const RECORD_TAG_BYTES: usize = 1;

const TAG_DUMMY: u8 = DUMMY_TAG;
const TAG_PRIMARY: u8 = 1;
const TAG_FOREIGN: u8 = 2;
const TAG_MERGED: u8 = 3;

// A merged row re-uses both inputs' value encodings under one new header.
const MERGE_FRAME_SLACK: usize = 16;

/// Payload bound of a join record wrapping a row with these column kinds.
pub fn join_record_bound<C: RowCodec + ?Sized>(codec: &C, kinds: &[ColumnKind]) -> usize {
    RECORD_TAG_BYTES + codec.max_encoded_size(kinds)
}

/// Frame width of merge output derived from the input frame width alone.
///
/// A merged row holds at most every value of one primary and one foreign
/// record, each of which fit an input frame.
#[must_use]
pub const fn merged_frame_width(input_width: usize) -> usize {
    2 * input_width + MERGE_FRAME_SLACK
}

pub fn encode_join_record<C: RowCodec + ?Sized>(
    codec: &C,
    record: &JoinRecord,
) -> Result<Vec<u8>, InternalError> {
    match record {
        JoinRecord::Dummy => Ok(vec![TAG_DUMMY]),
        JoinRecord::Real { side, row } => {
            let tag = match side {
                TableSide::Primary => TAG_PRIMARY,
                TableSide::Foreign => TAG_FOREIGN,
            };
            tagged(tag, &codec.encode_row(row)?)
        }
    }
}

pub fn decode_join_record<C: RowCodec + ?Sized>(
    codec: &C,
    bytes: &[u8],
) -> Result<JoinRecord, InternalError> {
    let (tag, body) = split_tag(bytes)?;
    match tag {
        TAG_DUMMY => Ok(JoinRecord::Dummy),
        TAG_PRIMARY => Ok(JoinRecord::primary(codec.decode_row(body)?)),
        TAG_FOREIGN => Ok(JoinRecord::foreign(codec.decode_row(body)?)),
        other => Err(unexpected_tag(other, "join record")),
    }
}

pub fn encode_output_record<C: RowCodec + ?Sized>(
    codec: &C,
    record: &OutputRecord,
) -> Result<Vec<u8>, InternalError> {
    match record {
        OutputRecord::Dummy => Ok(vec![TAG_DUMMY]),
        OutputRecord::Merged(row) => tagged(TAG_MERGED, &codec.encode_merged_row(row)?),
    }
}

pub fn decode_output_record<C: RowCodec + ?Sized>(
    codec: &C,
    bytes: &[u8],
) -> Result<OutputRecord, InternalError> {
    let (tag, body) = split_tag(bytes)?;
    match tag {
        TAG_DUMMY => Ok(OutputRecord::Dummy),
        TAG_MERGED => Ok(OutputRecord::Merged(codec.decode_merged_row(body)?)),
        other => Err(unexpected_tag(other, "output record")),
    }
}

/// Whether a complete fixed-width frame holds a primary join record.
///
/// Reads only the tag byte so boundary scans can treat rows as opaque.
pub fn frame_is_primary(frame: &[u8]) -> Result<bool, InternalError> {
    let tag = frame.get(FRAME_PREFIX_BYTES).copied().ok_or_else(|| {
        InternalError::corruption(ErrorOrigin::Codec, "frame too short to hold a record tag")
    })?;

    match tag {
        TAG_DUMMY | TAG_FOREIGN => Ok(false),
        TAG_PRIMARY => Ok(true),
        other => Err(unexpected_tag(other, "join record")),
    }
}

fn tagged(tag: u8, body: &[u8]) -> Result<Vec<u8>, InternalError> {
    let mut out = Vec::with_capacity(RECORD_TAG_BYTES + body.len());
    out.push(tag);
    out.extend_from_slice(body);

    Ok(out)
}

fn split_tag(bytes: &[u8]) -> Result<(u8, &[u8]), InternalError> {
    bytes
        .split_first()
        .map(|(tag, body)| (*tag, body))
        .ok_or_else(|| InternalError::corruption(ErrorOrigin::Codec, "empty record payload"))
}

fn unexpected_tag(tag: u8, what: &str) -> InternalError {
    InternalError::corruption(
        ErrorOrigin::Codec,
        format!("unexpected {what} tag: {tag:#04x}"),
    )
}

///
/// RecordReader
///
/// Decodes exactly the declared number of join records from a framed stream.
///

pub struct RecordReader<'a, C: ?Sized> {
    codec: &'a C,
    frames: FrameReader<'a>,
    remaining: u32,
}

impl<'a, C: RowCodec + ?Sized> RecordReader<'a, C> {
    pub fn new(codec: &'a C, input: &'a [u8], count: u32) -> Result<Self, InternalError> {
        Ok(Self {
            codec,
            frames: FrameReader::new(input)?,
            remaining: count,
        })
    }

    #[must_use]
    pub const fn layout(&self) -> FrameLayout {
        self.frames.layout()
    }

    /// Read the next record's raw frame without decoding it.
    pub fn next_raw_frame(&mut self) -> Option<Result<&'a [u8], InternalError>> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        Some(self.frames.next_frame().map_err(InternalError::from))
    }
}

impl<C: RowCodec + ?Sized> Iterator for RecordReader<'_, C> {
    type Item = Result<JoinRecord, InternalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let item = self
            .frames
            .next_payload()
            .map_err(InternalError::from)
            .and_then(|payload| decode_join_record(self.codec, payload));

        Some(item)
    }
}

///
/// RecordWriter
///

pub struct RecordWriter<'a, C: ?Sized> {
    codec: &'a C,
    frames: FrameWriter<'a>,
}

impl<'a, C: RowCodec + ?Sized> RecordWriter<'a, C> {
    pub fn new(codec: &'a C, out: &'a mut [u8], layout: FrameLayout) -> Result<Self, InternalError> {
        Ok(Self {
            codec,
            frames: FrameWriter::new(out, layout)?,
        })
    }

    pub fn write_join(&mut self, record: &JoinRecord) -> Result<(), InternalError> {
        let payload = encode_join_record(self.codec, record)?;
        self.frames.write(&payload)?;

        Ok(())
    }

    pub fn write_output(&mut self, record: &OutputRecord) -> Result<(), InternalError> {
        let payload = encode_output_record(self.codec, record)?;
        self.frames.write(&payload)?;

        Ok(())
    }

    pub fn frames_mut(&mut self) -> &mut FrameWriter<'a> {
        &mut self.frames
    }

    #[must_use]
    pub const fn frames_written(&self) -> usize {
        self.frames.frames_written()
    }

    #[must_use]
    pub fn finish(self) -> usize {
        self.frames.finish()
    }
}
