//! Error types for the scoring engine.
//!
//! Only setup and device failures surface as errors. Per-frame anomalies
//! (low confidence, out-of-range pitch, exhausted reference) are absorbed by
//! the scoring gate and never abort a session.

use thiserror::Error;

use crate::session::SessionPhase;

/// Which side of the audio device a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ScoreError {
    // Device acquisition errors (fatal to a session attempt)
    #[error("No {direction} audio device available")]
    NoDevice { direction: Direction },

    #[error("No usable {direction} stream format: {message}")]
    UnsupportedFormat { direction: Direction, message: String },

    #[error("Sample rate mismatch: expected {expected} Hz, got {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },

    #[error("Audio stream error: {message}")]
    Stream { message: String },

    // Session lifecycle errors
    #[error("Reference track has not been analyzed and armed yet")]
    ReferenceNotAnalyzed,

    #[error("Cannot {action} while session is {phase}")]
    InvalidTransition {
        phase: SessionPhase,
        action: &'static str,
    },

    // Rejected inputs
    #[error("Invalid reference track: {message}")]
    InvalidReference { message: String },

    #[error("Invalid lyric timeline: {message}")]
    InvalidLyrics { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScoreError {
    /// True for the failures grouped as "device unavailable": missing device,
    /// unusable format, or a sample rate the session cannot run at.
    pub fn is_device_unavailable(&self) -> bool {
        matches!(
            self,
            ScoreError::NoDevice { .. }
                | ScoreError::UnsupportedFormat { .. }
                | ScoreError::SampleRateMismatch { .. }
        )
    }

    #[cfg(feature = "cpal-audio")]
    pub(crate) fn stream(err: impl std::fmt::Display) -> Self {
        ScoreError::Stream {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScoreError>;
