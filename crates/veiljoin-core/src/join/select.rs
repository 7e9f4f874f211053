//! Masked frame selection.
//!
//! Output frames are chosen by combining both candidates under a byte mask
//! instead of branching on the choice, so every slot is written with the
//! same number of byte operations whichever candidate wins. This fixes the
//! write pattern only; it does not make the surrounding codec calls
//! constant-time.

use std::hint::black_box;

/// Copy `when_true` or `when_false` into `out` according to `choice`.
///
/// All three slices must have the same length.
pub(crate) fn select_frame(choice: bool, when_true: &[u8], when_false: &[u8], out: &mut [u8]) {
    debug_assert_eq!(when_true.len(), out.len());
    debug_assert_eq!(when_false.len(), out.len());

    let mask = black_box(0u8.wrapping_sub(u8::from(choice)));
    for ((slot, t), f) in out.iter_mut().zip(when_true).zip(when_false) {
        *slot = (t & mask) | (f & !mask);
    }
}

///
/// FrameState
///
/// One fixed-width frame of running state, updated by masked selection.
///

pub(crate) struct FrameState {
    frame: Vec<u8>,
    scratch: Vec<u8>,
}

impl FrameState {
    pub(crate) fn new(initial: Vec<u8>) -> Self {
        let scratch = vec![0u8; initial.len()];

        Self {
            frame: initial,
            scratch,
        }
    }

    /// Replace the state with `candidate` iff `take`, touching every byte.
    pub(crate) fn assign_if(&mut self, take: bool, candidate: &[u8]) {
        self.scratch.copy_from_slice(&self.frame);
        select_frame(take, candidate, &self.scratch, &mut self.frame);
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.frame
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_picks_requested_candidate() {
        let mut out = [0u8; 3];
        select_frame(true, &[1, 2, 3], &[9, 9, 9], &mut out);
        assert_eq!(out, [1, 2, 3]);

        select_frame(false, &[1, 2, 3], &[9, 8, 7], &mut out);
        assert_eq!(out, [9, 8, 7]);
    }

    #[test]
    fn frame_state_only_changes_when_taken() {
        let mut state = FrameState::new(vec![0, 0]);
        state.assign_if(false, &[5, 5]);
        assert_eq!(state.as_bytes(), &[0, 0]);

        state.assign_if(true, &[5, 6]);
        assert_eq!(state.as_bytes(), &[5, 6]);
    }
}
