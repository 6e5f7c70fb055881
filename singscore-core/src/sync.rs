//! Frame synchronizer: the live session's cursor into the reference track.
//!
//! Alignment is purely positional. Every captured block advances the cursor
//! by exactly one frame, usable or not, and nothing ever re-aligns it. This
//! assumes capture and backing playback start together and share one clock;
//! drift between the two devices is not corrected.

use std::sync::Arc;

use serde::Serialize;

use crate::reference::ReferenceTrack;

/// The reference values for one live frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceFrame {
    pub index: usize,
    /// Reference pitch; `0.0` when unvoiced or past the end of the track.
    pub pitch_hz: f32,
    pub loudness: f32,
    /// True once the cursor has run past the last reference frame.
    pub exhausted: bool,
}

#[derive(Debug, Clone)]
pub struct FrameSynchronizer {
    reference: Arc<ReferenceTrack>,
    current_frame_index: usize,
}

impl FrameSynchronizer {
    pub fn new(reference: Arc<ReferenceTrack>) -> Self {
        Self {
            reference,
            current_frame_index: 0,
        }
    }

    /// Fetches the reference frame at the cursor, then moves the cursor one
    /// frame forward. Past the end of the track the silent sentinel is
    /// returned for every call.
    pub fn advance(&mut self) -> ReferenceFrame {
        let index = self.current_frame_index;
        let exhausted = index >= self.reference.len();
        let frame = ReferenceFrame {
            index,
            pitch_hz: self.reference.pitch_at(index),
            loudness: self.reference.loudness_at(index),
            exhausted,
        };
        self.current_frame_index += 1;
        frame
    }

    /// Number of frames processed so far.
    pub fn current_frame_index(&self) -> usize {
        self.current_frame_index
    }

    pub fn is_exhausted(&self) -> bool {
        self.current_frame_index >= self.reference.len()
    }

    /// Frames processed after the reference ran out.
    pub fn frames_past_end(&self) -> usize {
        self.current_frame_index.saturating_sub(self.reference.len())
    }

    /// Session time at the cursor: `current_frame_index * hop / rate`.
    pub fn elapsed_secs(&self) -> f64 {
        self.current_frame_index as f64 * self.reference.frame_duration_secs()
    }

    pub fn reference(&self) -> &Arc<ReferenceTrack> {
        &self.reference
    }
}
