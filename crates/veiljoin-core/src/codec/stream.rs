//! Whole-stream helpers for callers that build or inspect buffers.

use crate::{
    codec::{
        RowCodec,
        frame::{FRAME_PREFIX_BYTES, FrameLayout, FrameReader, FrameWriter, STREAM_HEADER_BYTES},
        record::{RecordReader, decode_output_record, encode_join_record},
    },
    error::{ErrorOrigin, InternalError},
    model::{
        record::{JoinRecord, OutputRecord},
        row::Row,
    },
};

///
/// EncodedStream
///
/// An owned framed buffer plus the number of frames it holds.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncodedStream {
    pub bytes: Vec<u8>,
    pub count: u32,
}

impl EncodedStream {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Report the frame layout declared by a stream header.
pub fn stream_layout(input: &[u8]) -> Result<FrameLayout, InternalError> {
    Ok(FrameReader::new(input)?.layout())
}

/// Encode raw rows as a variable-width row stream.
pub fn encode_rows<C: RowCodec + ?Sized>(
    codec: &C,
    rows: &[Row],
) -> Result<EncodedStream, InternalError> {
    let payloads = rows
        .iter()
        .map(|row| codec.encode_row(row))
        .collect::<Result<Vec<_>, _>>()?;

    write_payloads(&payloads, FrameLayout::Variable)
}

/// Decode `count` raw rows from a row stream.
pub fn decode_rows<C: RowCodec + ?Sized>(
    codec: &C,
    input: &[u8],
    count: u32,
) -> Result<Vec<Row>, InternalError> {
    let mut frames = FrameReader::new(input)?;
    (0..count)
        .map(|_| {
            let payload = frames.next_payload()?;
            codec.decode_row(payload)
        })
        .collect()
}

/// Encode join records under `layout`.
pub fn encode_join_records<C: RowCodec + ?Sized>(
    codec: &C,
    records: &[JoinRecord],
    layout: FrameLayout,
) -> Result<EncodedStream, InternalError> {
    let payloads = records
        .iter()
        .map(|record| encode_join_record(codec, record))
        .collect::<Result<Vec<_>, _>>()?;

    write_payloads(&payloads, layout)
}

/// Decode `count` join records.
pub fn decode_join_records<C: RowCodec + ?Sized>(
    codec: &C,
    input: &[u8],
    count: u32,
) -> Result<Vec<JoinRecord>, InternalError> {
    RecordReader::new(codec, input, count)?.collect()
}

/// Decode `count` merge-output records.
pub fn decode_output_records<C: RowCodec + ?Sized>(
    codec: &C,
    input: &[u8],
    count: u32,
) -> Result<Vec<OutputRecord>, InternalError> {
    let mut frames = FrameReader::new(input)?;
    (0..count)
        .map(|_| {
            let payload = frames.next_payload()?;
            decode_output_record(codec, payload)
        })
        .collect()
}

/// Split a stream into `parts` consecutive partitions, copying frames
/// verbatim. Leading partitions take the remainder; trailing partitions may
/// be empty when `parts` exceeds `count`.
pub fn split_stream(
    input: &[u8],
    count: u32,
    parts: usize,
) -> Result<Vec<EncodedStream>, InternalError> {
    if parts == 0 {
        return Err(InternalError::precondition(
            ErrorOrigin::Orchestrate,
            "cannot split a stream into zero partitions",
        ));
    }

    let mut reader = FrameReader::new(input)?;
    let layout = reader.layout();
    let total = count as usize;
    let base = total / parts;
    let extra = total % parts;

    let mut out = Vec::with_capacity(parts);
    for part in 0..parts {
        let size = base + usize::from(part < extra);
        let mut payloads = Vec::with_capacity(size);
        for _ in 0..size {
            payloads.push(reader.next_payload()?.to_vec());
        }
        out.push(write_payloads(&payloads, layout)?);
    }

    Ok(out)
}

/// Concatenate streams sharing one layout into a single stream.
pub fn concat_streams(streams: &[EncodedStream]) -> Result<EncodedStream, InternalError> {
    let Some(first) = streams.first() else {
        return write_payloads(&[], FrameLayout::Variable);
    };
    let layout = stream_layout(&first.bytes)?;

    let mut payloads = Vec::new();
    for stream in streams {
        if stream_layout(&stream.bytes)? != layout {
            return Err(InternalError::precondition(
                ErrorOrigin::Orchestrate,
                "cannot concatenate streams with different frame layouts",
            ));
        }
        let mut reader = FrameReader::new(&stream.bytes)?;
        for _ in 0..stream.count {
            payloads.push(reader.next_payload()?.to_vec());
        }
    }

    write_payloads(&payloads, layout)
}

// Allocate exactly enough room and write every payload as one frame.
fn write_payloads(payloads: &[Vec<u8>], layout: FrameLayout) -> Result<EncodedStream, InternalError> {
    let body: usize = match layout {
        FrameLayout::Fixed(width) => width * payloads.len(),
        FrameLayout::Variable => payloads.iter().map(|p| FRAME_PREFIX_BYTES + p.len()).sum(),
    };
    let count = u32::try_from(payloads.len()).map_err(|_| {
        InternalError::capacity(ErrorOrigin::Codec, "stream holds more than u32::MAX frames")
    })?;

    let mut bytes = vec![0u8; STREAM_HEADER_BYTES + body];
    let mut writer = FrameWriter::new(&mut bytes, layout)?;
    for payload in payloads {
        writer.write(payload)?;
    }
    let written = writer.finish();
    bytes.truncate(written);

    Ok(EncodedStream { bytes, count })
}
