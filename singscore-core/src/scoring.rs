//! # Scoring Module
//!
//! Turns a (live pitch, reference pitch) pair into a bounded per-frame
//! score and keeps the session's score history.
//!
//! ## Policies
//! - **Percentage distance** (default): `100 * (1 - |ref - live| / ref)`,
//!   clamped at 0. Any silent side scores 0.
//! - **Semitone tolerance**: `100 * (1 - |Δmidi| / tolerance)`, clamped at
//!   0. Only used when selected explicitly; the two are never mixed within a
//!   session.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};
use crate::notes;
use crate::pitch::{LiveFrame, UsabilityGate};

/// Highest per-frame and aggregate score.
pub const MAX_SCORE: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    #[default]
    PercentageDistance,
    SemitoneTolerance,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub policy: ScoringPolicy,
    /// Distance in semitones at which the tolerance policy reaches 0.
    pub tolerance_semitones: f32,
    pub gate: UsabilityGate,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            policy: ScoringPolicy::default(),
            tolerance_semitones: 2.0,
            gate: UsabilityGate::default(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        self.gate.validate()?;
        if !(self.tolerance_semitones.is_finite() && self.tolerance_semitones > 0.0) {
            return Err(ScoreError::InvalidConfig {
                message: format!(
                    "tolerance of {} semitones must be positive",
                    self.tolerance_semitones
                ),
            });
        }
        Ok(())
    }

    /// Scores one pitch pair with the configured policy.
    pub fn score(&self, reference_hz: f32, live_hz: f32) -> f32 {
        match self.policy {
            ScoringPolicy::PercentageDistance => percentage_distance_score(reference_hz, live_hz),
            ScoringPolicy::SemitoneTolerance => {
                semitone_tolerance_score(reference_hz, live_hz, self.tolerance_semitones)
            }
        }
    }
}

/// Relative frequency error expressed as a 0..100 score.
///
/// Identical positive pitches score exactly 100; the score falls linearly
/// with the absolute difference and never goes below 0.
pub fn percentage_distance_score(reference_hz: f32, live_hz: f32) -> f32 {
    if reference_hz > 0.0 && live_hz > 0.0 {
        let relative = (reference_hz - live_hz).abs() / reference_hz;
        (MAX_SCORE * (1.0 - relative)).max(0.0)
    } else {
        0.0
    }
}

/// Musical distance in semitones expressed as a 0..100 score.
pub fn semitone_tolerance_score(reference_hz: f32, live_hz: f32, tolerance_semitones: f32) -> f32 {
    match (notes::hz_to_midi(reference_hz), notes::hz_to_midi(live_hz)) {
        (Some(reference_midi), Some(live_midi)) => {
            let diff = (live_midi - reference_midi).abs();
            (MAX_SCORE * (1.0 - diff / tolerance_semitones)).max(0.0)
        }
        _ => 0.0,
    }
}

/// What happened to one frame at the scoring gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameOutcome {
    /// The live estimate failed the usability gate; nothing was scored.
    Unusable,
    /// A score was computed. `recorded` is false when it repeated the
    /// previously recorded score and was skipped by deduplication.
    Scored { score: f32, recorded: bool },
}

impl FrameOutcome {
    pub fn score(&self) -> Option<f32> {
        match self {
            FrameOutcome::Unusable => None,
            FrameOutcome::Scored { score, .. } => Some(*score),
        }
    }
}

/// Running per-session scoring state.
///
/// The history is append-only. Consecutive identical scores are recorded
/// once; only usable frames are scored at all.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: ScoringConfig,
    score_history: Vec<f32>,
    previous_accuracy: Option<f32>,
    usable_frames: u64,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self::with_capacity(config, 0)
    }

    /// Reserves room for `capacity` recorded scores up front. Sized to the
    /// reference length (plus one), the history never reallocates: after
    /// the reference ends every score is 0 and deduplicates to one entry.
    pub fn with_capacity(config: ScoringConfig, capacity: usize) -> Self {
        Self {
            config,
            score_history: Vec::with_capacity(capacity),
            previous_accuracy: None,
            usable_frames: 0,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Gates, scores and (possibly) records one frame.
    pub fn record(&mut self, live: LiveFrame, reference_hz: f32) -> FrameOutcome {
        if !self.config.gate.is_usable(&live) {
            return FrameOutcome::Unusable;
        }
        self.usable_frames += 1;

        let score = self.config.score(reference_hz, live.pitch_hz);
        let recorded = self.previous_accuracy != Some(score);
        if recorded {
            self.score_history.push(score);
            self.previous_accuracy = Some(score);
        }
        FrameOutcome::Scored { score, recorded }
    }

    pub fn score_history(&self) -> &[f32] {
        &self.score_history
    }

    pub fn previous_accuracy(&self) -> Option<f32> {
        self.previous_accuracy
    }

    pub fn usable_frames(&self) -> u64 {
        self.usable_frames
    }

    /// Mean of the recorded scores; 0 for a session with no usable frame.
    pub fn final_score(&self) -> f32 {
        if self.score_history.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.score_history.iter().map(|&s| s as f64).sum();
        (sum / self.score_history.len() as f64) as f32
    }

    pub fn into_history(self) -> Vec<f32> {
        self.score_history
    }
}
