//! Sort-merge join execution over framed join-record streams.
//!
//! Each public operation on [`JoinEngine`] is one synchronous pass over
//! caller-owned buffers. The engine keeps no state between calls; the only
//! state that crosses a partition boundary is the carried record the caller
//! threads through explicitly.

pub mod boundary;
pub mod merge;
pub mod policy;
pub mod preprocess;
pub mod verify;

mod select;


use crate::{
    codec::{
        CborRowCodec, RowCodec,
        frame::{FrameLayout, FrameReader},
        record::decode_join_record,
    },
    config::{JoinConfig, Limits, UpperBoundMode},
    error::{ErrorOrigin, InternalError},
    model::{record::JoinRecord, schema::Schema},
    obs::JoinTraceSink,
};

///
/// UpperBound
///
/// Source of the fixed record width chosen by the preprocessor.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum UpperBound {
    /// Probe the first row of each non-empty input.
    #[default]
    Sample,
    /// Derive the width from table schemas; inputs may be empty.
    Schema { primary: Schema, foreign: Schema },
}

///
/// JoinEngine
///

pub struct JoinEngine<C = CborRowCodec> {
    codec: C,
    limits: Limits,
    upper_bound: UpperBound,
    verify_sorted: bool,
    trace: Option<&'static dyn JoinTraceSink>,
}

impl JoinEngine<CborRowCodec> {
    /// Build an engine with the CBOR codec from a validated configuration.
    pub fn from_config(config: &JoinConfig) -> Result<Self, InternalError> {
        config.validate()?;

        let upper_bound = match (config.upper_bound, config.schemas()?) {
            (UpperBoundMode::Schema, Some((primary, foreign))) => {
                UpperBound::Schema { primary, foreign }
            }
            _ => UpperBound::Sample,
        };
        let codec = CborRowCodec::new(config.limits.max_frame_bytes);

        Ok(Self::new(codec)
            .with_limits(config.limits)
            .with_upper_bound(upper_bound)
            .with_sort_verification(config.verify_sorted))
    }
}

impl<C: RowCodec> JoinEngine<C> {
    pub fn new(codec: C) -> Self {
        Self {
            codec,
            limits: Limits::default(),
            upper_bound: UpperBound::Sample,
            verify_sorted: false,
            trace: None,
        }
    }

    #[must_use]
    pub const fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn with_upper_bound(mut self, upper_bound: UpperBound) -> Self {
        self.upper_bound = upper_bound;
        self
    }

    /// Check input ordering before every merge.
    #[must_use]
    pub const fn with_sort_verification(mut self, enabled: bool) -> Self {
        self.verify_sorted = enabled;
        self
    }

    #[must_use]
    pub const fn with_trace(mut self, sink: &'static dyn JoinTraceSink) -> Self {
        self.trace = Some(sink);
        self
    }

    #[must_use]
    pub const fn codec(&self) -> &C {
        &self.codec
    }

    #[must_use]
    pub const fn limits(&self) -> &Limits {
        &self.limits
    }

    #[must_use]
    pub const fn upper_bound(&self) -> &UpperBound {
        &self.upper_bound
    }

    // Reject calls declaring more rows than one invocation may process.
    fn check_row_count(&self, origin: ErrorOrigin, count: u64) -> Result<(), InternalError> {
        let max = u64::from(self.limits.max_rows_per_call);
        if count > max {
            return Err(InternalError::precondition(
                origin,
                format!("call declares {count} rows (limit {max})"),
            ));
        }

        Ok(())
    }

    // Reject frame widths beyond the configured cap.
    fn check_frame_width(&self, origin: ErrorOrigin, width: usize) -> Result<(), InternalError> {
        if width > self.limits.max_frame_bytes {
            return Err(InternalError::capacity(
                origin,
                format!(
                    "record width {width} exceeds max frame size {}",
                    self.limits.max_frame_bytes
                ),
            ));
        }

        Ok(())
    }

    // Open a fixed-width record stream; variable streams cannot be processed
    // obliviously.
    fn fixed_width(&self, origin: ErrorOrigin, input: &[u8]) -> Result<usize, InternalError> {
        match FrameReader::new(input)?.layout() {
            FrameLayout::Fixed(width) => {
                self.check_frame_width(origin, width)?;
                Ok(width)
            }
            FrameLayout::Variable => Err(InternalError::precondition(
                origin,
                "operation requires a fixed-width join-record stream",
            )),
        }
    }

    // Decode the single record of a carried/seed buffer.
    //
    // The record must be a dummy or a primary; anything else is an integrity
    // violation and an undecodable buffer is corruption.
    fn decode_carried(&self, origin: ErrorOrigin, bytes: &[u8]) -> Result<JoinRecord, InternalError> {
        let record = FrameReader::new(bytes)
            .and_then(|mut frames| frames.next_payload())
            .map_err(InternalError::from)
            .and_then(|payload| decode_join_record(&self.codec, payload))
            .map_err(|err| {
                InternalError::corruption(origin, format!("malformed carried join row: {err}"))
            })?;

        if !record.is_dummy() && !record.is_primary() {
            return Err(InternalError::integrity(
                origin,
                "carried join row must be a dummy or marked as primary",
            ));
        }

        Ok(record)
    }
}
