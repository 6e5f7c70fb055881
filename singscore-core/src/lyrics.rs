//! Lyric timeline: maps playback time to the active lyric segment.
//!
//! Segments come from an external transcription step and are read-only for
//! the whole session. The cursor into them only ever moves forward.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricSegment {
    #[serde(alias = "start")]
    pub start_time: f64,
    #[serde(alias = "end")]
    pub end_time: f64,
    pub text: String,
}

impl LyricSegment {
    pub fn new(start_time: f64, end_time: f64, text: impl Into<String>) -> Self {
        Self {
            start_time,
            end_time,
            text: text.into(),
        }
    }
}

/// Transcription output is either a bare array or wrapped in `segments`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LyricsFile {
    Bare(Vec<LyricSegment>),
    Wrapped { segments: Vec<LyricSegment> },
}

/// Time-ordered, validated lyric segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricTimeline {
    segments: Vec<LyricSegment>,
}

impl LyricTimeline {
    /// Validates and wraps `segments`.
    ///
    /// Every segment needs finite times with `start_time < end_time`, and
    /// start times must be non-decreasing.
    pub fn new(segments: Vec<LyricSegment>) -> Result<Self> {
        let mut previous_start = f64::NEG_INFINITY;
        for (idx, segment) in segments.iter().enumerate() {
            if !segment.start_time.is_finite() || !segment.end_time.is_finite() {
                return Err(ScoreError::InvalidLyrics {
                    message: format!("segment {} has a non-finite time", idx),
                });
            }
            if segment.start_time >= segment.end_time {
                return Err(ScoreError::InvalidLyrics {
                    message: format!(
                        "segment {} ends at {} before it starts at {}",
                        idx, segment.end_time, segment.start_time
                    ),
                });
            }
            if segment.start_time < previous_start {
                return Err(ScoreError::InvalidLyrics {
                    message: format!("segment {} starts before segment {}", idx, idx - 1),
                });
            }
            previous_start = segment.start_time;
        }
        Ok(Self { segments })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let segments = match serde_json::from_str(json)? {
            LyricsFile::Bare(segments) => segments,
            LyricsFile::Wrapped { segments } => segments,
        };
        Self::new(segments)
    }

    pub fn segments(&self) -> &[LyricSegment] {
        &self.segments
    }

    pub fn get(&self, index: usize) -> Option<&LyricSegment> {
        self.segments.get(index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Moves `cursor` forward past every segment that ended before
    /// `current_time` and returns the segment it lands on. `None` only when
    /// the cursor is outside the timeline (e.g. no lyrics at all).
    ///
    /// The last segment stays active once reached, so the final line remains
    /// on screen after it ends. The cursor never moves backward, so an
    /// earlier `current_time` keeps the current segment. Amortized O(1) over
    /// a session.
    pub fn advance(&self, cursor: &mut usize, current_time: f64) -> Option<&LyricSegment> {
        while *cursor + 1 < self.segments.len() && current_time > self.segments[*cursor].end_time {
            *cursor += 1;
        }
        self.segments.get(*cursor)
    }
}
