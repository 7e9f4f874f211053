//! Row and record codecs.
//!
//! Format logic lives in `crate::serialize`; this module owns the row
//! encoding policy (size limits, per-kind bounds) and the framed
//! join-record wire format.

pub mod frame;
pub mod record;
pub mod stream;


use crate::{
    error::{ErrorOrigin, InternalError},
    model::row::Row,
    serialize::{deserialize_bounded, serialize},
};
use veiljoin_primitives::{ColumnFamily, ColumnKind};

// re-exports
pub use frame::{FrameError, FrameLayout, FrameReader, FrameWriter};
pub use record::{RecordReader, RecordWriter};

/// Default cap on one encoded row.
pub const DEFAULT_MAX_ROW_BYTES: usize = 64 * 1024;

// CBOR major-type headers never exceed 9 bytes.
const CBOR_HEADER_MAX: usize = 9;

///
/// RowCodec
///
/// Row encoding capability the join core orchestrates but never interprets.
///

pub trait RowCodec {
    fn decode_row(&self, bytes: &[u8]) -> Result<Row, InternalError>;

    fn encode_row(&self, row: &Row) -> Result<Vec<u8>, InternalError>;

    /// Decode a merged output row, which may hold the values of two rows.
    fn decode_merged_row(&self, bytes: &[u8]) -> Result<Row, InternalError> {
        self.decode_row(bytes)
    }

    /// Encode a merged output row, which may hold the values of two rows.
    fn encode_merged_row(&self, row: &Row) -> Result<Vec<u8>, InternalError> {
        self.encode_row(row)
    }

    /// Largest encoding any row with these column kinds can produce.
    fn max_encoded_size(&self, kinds: &[ColumnKind]) -> usize;

    /// Largest encoding any row shaped like `row` can produce.
    fn row_upper_bound(&self, row: &Row) -> usize {
        self.max_encoded_size(&row.kinds())
    }
}

///
/// CborRowCodec
///
/// Rows as CBOR arrays of externally tagged values.
///

#[derive(Clone, Copy, Debug)]
pub struct CborRowCodec {
    max_row_bytes: usize,
}

impl CborRowCodec {
    #[must_use]
    pub const fn new(max_row_bytes: usize) -> Self {
        Self { max_row_bytes }
    }

    #[must_use]
    pub const fn max_row_bytes(&self) -> usize {
        self.max_row_bytes
    }

    /// Cap on a merged row. Its values come from two rows within
    /// `max_row_bytes`, under one array header.
    #[must_use]
    pub const fn max_merged_row_bytes(&self) -> usize {
        self.max_row_bytes.saturating_mul(2)
    }

    fn decode_bounded(bytes: &[u8], limit: usize) -> Result<Row, InternalError> {
        let row: Row = deserialize_bounded(bytes, limit).map_err(|err| {
            InternalError::corruption(
                ErrorOrigin::Codec,
                format!("row decode failed: {}", err.kind()),
            )
        })?;

        for value in row.iter() {
            value.validate().map_err(|err| {
                InternalError::corruption(ErrorOrigin::Codec, format!("row decode failed: {err}"))
            })?;
        }

        Ok(row)
    }

    fn encode_bounded(row: &Row, limit: usize) -> Result<Vec<u8>, InternalError> {
        for value in row.iter() {
            value
                .validate()
                .map_err(|err| InternalError::codec_unsupported(err.to_string()))?;
        }

        let bytes = serialize(row)?;
        if bytes.len() > limit {
            return Err(InternalError::capacity(
                ErrorOrigin::Codec,
                format!(
                    "encoded row exceeds max size: {} bytes (limit {limit})",
                    bytes.len()
                ),
            ));
        }

        Ok(bytes)
    }

    // Map header + variant-name text + payload.
    fn value_bound(kind: ColumnKind) -> usize {
        let envelope = 2 + kind.as_str().len();
        let payload = match kind.family() {
            ColumnFamily::Numeric => CBOR_HEADER_MAX,
            ColumnFamily::Textual => CBOR_HEADER_MAX + kind.max_payload_bytes(),
        };

        envelope + payload
    }
}

impl Default for CborRowCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROW_BYTES)
    }
}

impl RowCodec for CborRowCodec {
    fn decode_row(&self, bytes: &[u8]) -> Result<Row, InternalError> {
        Self::decode_bounded(bytes, self.max_row_bytes)
    }

    fn encode_row(&self, row: &Row) -> Result<Vec<u8>, InternalError> {
        Self::encode_bounded(row, self.max_row_bytes)
    }

    fn decode_merged_row(&self, bytes: &[u8]) -> Result<Row, InternalError> {
        Self::decode_bounded(bytes, self.max_merged_row_bytes())
    }

    fn encode_merged_row(&self, row: &Row) -> Result<Vec<u8>, InternalError> {
        Self::encode_bounded(row, self.max_merged_row_bytes())
    }

    fn max_encoded_size(&self, kinds: &[ColumnKind]) -> usize {
        CBOR_HEADER_MAX + kinds.iter().copied().map(Self::value_bound).sum::<usize>()
    }
}
