// singscore-core/src/lib.rs

//! The core logic for the karaoke-style vocal scorer.
//! This crate is responsible for reference analysis, live pitch detection,
//! frame alignment, lyric tracking and scoring. It is completely headless
//! and contains no terminal or display code.

pub mod audio;
pub mod capture;
pub mod error;
pub mod fft;
pub mod lyrics;
pub mod notes;
pub mod pitch;
pub mod reference;
pub mod scoring;
pub mod session;
pub mod sync;

pub use audio::{AudioBackend, MonoAudio, StreamFormat};
#[cfg(feature = "cpal-audio")]
pub use audio::CpalBackend;
pub use error::{Result, ScoreError};
pub use lyrics::{LyricSegment, LyricTimeline};
pub use pitch::{LiveFrame, PitchEstimator, YinEstimator};
pub use reference::{AnalysisConfig, ReferenceAnalyzer, ReferenceTrack};
pub use scoring::{ScoringConfig, ScoringPolicy};
pub use session::{FrameReport, SessionConfig, SessionController, SessionPhase, SessionSummary};
