//! Framed byte streams.
//!
//! Every buffer crossing the call boundary starts with a 4-byte little-endian
//! header holding the frame width. A width of zero marks a variable-width
//! stream. Each frame is a 4-byte little-endian payload length followed by the
//! payload; fixed-width frames are zero-padded to exactly `width` bytes so a
//! stream's size depends only on its frame count.

use crate::error::{ErrorOrigin, InternalError};
use thiserror::Error as ThisError;

pub const STREAM_HEADER_BYTES: usize = 4;
pub const FRAME_PREFIX_BYTES: usize = 4;

///
/// FrameError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum FrameError {
    #[error("output capacity exceeded: need {needed} bytes, capacity {capacity}")]
    CapacityExceeded { needed: usize, capacity: usize },

    #[error("payload of {len} bytes exceeds frame payload width {max}")]
    PayloadTooWide { len: usize, max: usize },

    #[error("frame of {len} bytes does not match stream frame width {width}")]
    FrameWidthMismatch { len: usize, width: usize },

    #[error("stream truncated at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("frame length {len} exceeds frame payload width {max}")]
    CorruptLength { len: usize, max: usize },

    #[error("frame width {width} cannot hold the {FRAME_PREFIX_BYTES}-byte frame prefix")]
    InvalidWidth { width: usize },
}

impl From<FrameError> for InternalError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::CapacityExceeded { .. }
            | FrameError::PayloadTooWide { .. }
            | FrameError::FrameWidthMismatch { .. } => {
                Self::capacity(ErrorOrigin::Codec, err.to_string())
            }
            FrameError::Truncated { .. } => Self::precondition(
                ErrorOrigin::Codec,
                format!("declared row count exceeds buffer contents: {err}"),
            ),
            FrameError::CorruptLength { .. } | FrameError::InvalidWidth { .. } => {
                Self::corruption(ErrorOrigin::Codec, err.to_string())
            }
        }
    }
}

///
/// FrameLayout
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FrameLayout {
    /// Every frame occupies exactly `width` bytes, prefix included.
    Fixed(usize),
    Variable,
}

impl FrameLayout {
    /// Fixed layout whose frames hold payloads up to `max_payload` bytes.
    #[must_use]
    pub const fn for_payload(max_payload: usize) -> Self {
        Self::Fixed(max_payload + FRAME_PREFIX_BYTES)
    }

    #[must_use]
    pub const fn width(self) -> Option<usize> {
        match self {
            Self::Fixed(width) => Some(width),
            Self::Variable => None,
        }
    }

    /// Total stream length for `frames` fixed-width frames.
    #[must_use]
    pub const fn stream_len(self, frames: usize) -> Option<usize> {
        match self {
            Self::Fixed(width) => match width.checked_mul(frames) {
                Some(body) => body.checked_add(STREAM_HEADER_BYTES),
                None => None,
            },
            Self::Variable => None,
        }
    }

    fn header(self) -> Result<[u8; STREAM_HEADER_BYTES], FrameError> {
        let raw = match self {
            Self::Fixed(width) => {
                if width <= FRAME_PREFIX_BYTES {
                    return Err(FrameError::InvalidWidth { width });
                }
                u32::try_from(width).map_err(|_| FrameError::InvalidWidth { width })?
            }
            Self::Variable => 0,
        };

        Ok(raw.to_le_bytes())
    }

    fn from_header(raw: u32) -> Result<Self, FrameError> {
        let width = raw as usize;
        match width {
            0 => Ok(Self::Variable),
            w if w <= FRAME_PREFIX_BYTES => Err(FrameError::InvalidWidth { width: w }),
            w => Ok(Self::Fixed(w)),
        }
    }
}

// Read a little-endian u32 at `offset`, or report how far short the input is.
fn read_u32(input: &[u8], offset: usize) -> Result<u32, FrameError> {
    let end = offset + 4;
    let bytes = input.get(offset..end).ok_or(FrameError::Truncated {
        offset,
        needed: 4,
        available: input.len().saturating_sub(offset),
    })?;

    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    Ok(u32::from_le_bytes(buf))
}

/// Build one complete fixed-width frame around `payload`.
pub fn fixed_frame(width: usize, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let max = width
        .checked_sub(FRAME_PREFIX_BYTES)
        .ok_or(FrameError::InvalidWidth { width })?;
    if payload.len() > max {
        return Err(FrameError::PayloadTooWide {
            len: payload.len(),
            max,
        });
    }

    let mut frame = vec![0u8; width];
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooWide {
        len: payload.len(),
        max,
    })?;
    frame[..FRAME_PREFIX_BYTES].copy_from_slice(&len.to_le_bytes());
    frame[FRAME_PREFIX_BYTES..FRAME_PREFIX_BYTES + payload.len()].copy_from_slice(payload);

    Ok(frame)
}

///
/// FrameWriter
///
/// Writes frames into a caller-owned buffer. The buffer length is the hard
/// capacity: a write that would not fit fails and leaves the buffer
/// untouched past the last complete frame.
///

pub struct FrameWriter<'a> {
    out: &'a mut [u8],
    layout: FrameLayout,
    pos: usize,
    frames: usize,
}

impl<'a> FrameWriter<'a> {
    pub fn new(out: &'a mut [u8], layout: FrameLayout) -> Result<Self, FrameError> {
        let header = layout.header()?;
        if out.len() < STREAM_HEADER_BYTES {
            return Err(FrameError::CapacityExceeded {
                needed: STREAM_HEADER_BYTES,
                capacity: out.len(),
            });
        }
        out[..STREAM_HEADER_BYTES].copy_from_slice(&header);

        Ok(Self {
            out,
            layout,
            pos: STREAM_HEADER_BYTES,
            frames: 0,
        })
    }

    #[must_use]
    pub const fn layout(&self) -> FrameLayout {
        self.layout
    }

    /// Append one frame carrying `payload`.
    pub fn write(&mut self, payload: &[u8]) -> Result<(), FrameError> {
        match self.layout {
            FrameLayout::Fixed(width) => {
                let frame = fixed_frame(width, payload)?;
                self.write_frame(&frame)
            }
            FrameLayout::Variable => {
                let len = u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooWide {
                    len: payload.len(),
                    max: u32::MAX as usize,
                })?;
                let needed = self.pos + FRAME_PREFIX_BYTES + payload.len();
                self.ensure_capacity(needed)?;

                let body = self.pos + FRAME_PREFIX_BYTES;
                self.out[self.pos..body].copy_from_slice(&len.to_le_bytes());
                self.out[body..needed].copy_from_slice(payload);
                self.pos = needed;
                self.frames += 1;

                Ok(())
            }
        }
    }

    /// Append an already assembled fixed-width frame.
    pub fn write_frame(&mut self, frame: &[u8]) -> Result<(), FrameError> {
        let FrameLayout::Fixed(width) = self.layout else {
            return Err(FrameError::FrameWidthMismatch {
                len: frame.len(),
                width: 0,
            });
        };
        if frame.len() != width {
            return Err(FrameError::FrameWidthMismatch {
                len: frame.len(),
                width,
            });
        }

        let needed = self.pos + width;
        self.ensure_capacity(needed)?;
        self.out[self.pos..needed].copy_from_slice(frame);
        self.pos = needed;
        self.frames += 1;

        Ok(())
    }

    /// Mutable view of the next fixed-width frame slot, reserved and counted.
    pub fn reserve_frame(&mut self) -> Result<&mut [u8], FrameError> {
        let FrameLayout::Fixed(width) = self.layout else {
            return Err(FrameError::FrameWidthMismatch { len: 0, width: 0 });
        };

        let start = self.pos;
        let needed = start + width;
        self.ensure_capacity(needed)?;
        self.pos = needed;
        self.frames += 1;

        Ok(&mut self.out[start..needed])
    }

    #[must_use]
    pub const fn bytes_written(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub const fn frames_written(&self) -> usize {
        self.frames
    }

    /// Finish the stream and return the total bytes written.
    #[must_use]
    pub fn finish(self) -> usize {
        self.pos
    }

    fn ensure_capacity(&self, needed: usize) -> Result<(), FrameError> {
        if needed > self.out.len() {
            return Err(FrameError::CapacityExceeded {
                needed,
                capacity: self.out.len(),
            });
        }

        Ok(())
    }
}

///
/// FrameReader
///

pub struct FrameReader<'a> {
    input: &'a [u8],
    layout: FrameLayout,
    pos: usize,
}

impl<'a> FrameReader<'a> {
    pub fn new(input: &'a [u8]) -> Result<Self, FrameError> {
        let layout = FrameLayout::from_header(read_u32(input, 0)?)?;

        Ok(Self {
            input,
            layout,
            pos: STREAM_HEADER_BYTES,
        })
    }

    #[must_use]
    pub const fn layout(&self) -> FrameLayout {
        self.layout
    }

    /// Read the next frame's payload.
    pub fn next_payload(&mut self) -> Result<&'a [u8], FrameError> {
        let (start, end) = self.next_span()?;
        let body = start + FRAME_PREFIX_BYTES;
        let len = read_u32(self.input, start)? as usize;

        Ok(&self.input[body..body + len.min(end - body)])
    }

    /// Read the next complete frame, prefix and padding included.
    pub fn next_frame(&mut self) -> Result<&'a [u8], FrameError> {
        let (start, end) = self.next_span()?;

        Ok(&self.input[start..end])
    }

    // Validate and consume the next frame, returning its byte span.
    fn next_span(&mut self) -> Result<(usize, usize), FrameError> {
        let start = self.pos;
        let len = read_u32(self.input, start)? as usize;
        let available = self.input.len().saturating_sub(start);

        let end = match self.layout {
            FrameLayout::Fixed(width) => {
                let max = width - FRAME_PREFIX_BYTES;
                if len > max {
                    return Err(FrameError::CorruptLength { len, max });
                }
                if width > available {
                    return Err(FrameError::Truncated {
                        offset: start,
                        needed: width,
                        available,
                    });
                }
                start + width
            }
            FrameLayout::Variable => {
                let needed = FRAME_PREFIX_BYTES + len;
                if needed > available {
                    return Err(FrameError::Truncated {
                        offset: start,
                        needed,
                        available,
                    });
                }
                start + needed
            }
        };
        self.pos = end;

        Ok((start, end))
    }
}
