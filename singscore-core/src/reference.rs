//! # Reference Analysis Module
//!
//! Offline pass over the isolated reference vocal. Produces one pitch and
//! one loudness value per hop, which the synchronizer later walks through
//! frame by frame during a live session.
//!
//! The analysis window of frame `i` ends where hop `i` ends, which is the
//! same geometry the live capture pipeline uses: after `i + 1` captured
//! blocks its sliding window covers exactly those samples.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};
use crate::fft;
use crate::pitch::{PitchEstimator, YinConfig, YinEstimator, MAX_VOCAL_HZ, MIN_VOCAL_HZ};

/// Settings shared by reference analysis and live capture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Samples between consecutive frames; fixes the session frame rate.
    pub hop_size: usize,
    /// Minimum samples per pitch analysis window. May exceed the hop; grown
    /// at high sample rates so two periods of `min_pitch_hz` always fit.
    pub window_size: usize,
    pub yin_threshold: f32,
    pub silence_rms: f32,
    /// Reference hops below this confidence are stored as unvoiced.
    pub reference_min_confidence: f32,
    pub min_pitch_hz: f32,
    pub max_pitch_hz: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            hop_size: 512,
            window_size: 2048,
            yin_threshold: 0.15,
            silence_rms: 1e-4,
            reference_min_confidence: 0.7,
            min_pitch_hz: MIN_VOCAL_HZ,
            max_pitch_hz: MAX_VOCAL_HZ,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hop_size == 0 {
            return Err(ScoreError::InvalidConfig {
                message: "hop size must be positive".to_string(),
            });
        }
        if !(self.min_pitch_hz > 0.0 && self.min_pitch_hz < self.max_pitch_hz) {
            return Err(ScoreError::InvalidConfig {
                message: format!(
                    "pitch range {}..{} Hz is empty",
                    self.min_pitch_hz, self.max_pitch_hz
                ),
            });
        }
        if self.window_size < self.hop_size {
            return Err(ScoreError::InvalidConfig {
                message: format!(
                    "window size {} is shorter than hop size {}",
                    self.window_size, self.hop_size
                ),
            });
        }
        Ok(())
    }

    /// Analysis window at `sample_rate`: the configured size, or the next
    /// power of two holding two periods of `min_pitch_hz` if that is longer.
    pub fn window_for(&self, sample_rate: u32) -> usize {
        let min_period = (sample_rate as f32 / self.min_pitch_hz).ceil() as usize;
        (2 * min_period)
            .next_power_of_two()
            .max(self.window_size)
            .max(self.hop_size)
    }

    /// YIN settings for a stream at `sample_rate`.
    pub fn yin_config(&self, sample_rate: u32) -> YinConfig {
        let mut yin = YinConfig::new(sample_rate, self.window_for(sample_rate));
        yin.threshold = self.yin_threshold;
        yin.silence_rms = self.silence_rms;
        yin
    }
}

/// The pre-analyzed reference vocal: one pitch and one RMS value per hop.
///
/// Unvoiced hops hold `0.0`; no frame is ever NaN. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ReferenceTrackData")]
pub struct ReferenceTrack {
    hop_size: usize,
    sample_rate: u32,
    pitch_frames: Vec<f32>,
    loudness_frames: Vec<f32>,
}

/// Unvalidated on-disk form of a [`ReferenceTrack`].
#[derive(Deserialize)]
struct ReferenceTrackData {
    hop_size: usize,
    sample_rate: u32,
    pitch_frames: Vec<f32>,
    loudness_frames: Vec<f32>,
}

impl TryFrom<ReferenceTrackData> for ReferenceTrack {
    type Error = ScoreError;

    fn try_from(data: ReferenceTrackData) -> Result<Self> {
        ReferenceTrack::from_frames(
            data.hop_size,
            data.sample_rate,
            data.pitch_frames,
            data.loudness_frames,
        )
    }
}

impl ReferenceTrack {
    /// Builds a track from precomputed frames.
    ///
    /// Invalid pitches (NaN, infinite, negative) are normalized to the
    /// unvoiced value; mismatched frame counts are rejected.
    pub fn from_frames(
        hop_size: usize,
        sample_rate: u32,
        mut pitch_frames: Vec<f32>,
        mut loudness_frames: Vec<f32>,
    ) -> Result<Self> {
        if hop_size == 0 || sample_rate == 0 {
            return Err(ScoreError::InvalidReference {
                message: "hop size and sample rate must be positive".to_string(),
            });
        }
        if pitch_frames.len() != loudness_frames.len() {
            return Err(ScoreError::InvalidReference {
                message: format!(
                    "{} pitch frames but {} loudness frames",
                    pitch_frames.len(),
                    loudness_frames.len()
                ),
            });
        }
        for pitch in pitch_frames.iter_mut() {
            if !pitch.is_finite() || *pitch < 0.0 {
                *pitch = 0.0;
            }
        }
        for loudness in loudness_frames.iter_mut() {
            if !loudness.is_finite() || *loudness < 0.0 {
                *loudness = 0.0;
            }
        }
        Ok(Self {
            hop_size,
            sample_rate,
            pitch_frames,
            loudness_frames,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.pitch_frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitch_frames.is_empty()
    }

    pub fn pitch_frames(&self) -> &[f32] {
        &self.pitch_frames
    }

    pub fn loudness_frames(&self) -> &[f32] {
        &self.loudness_frames
    }

    /// Pitch at `index`, or `0.0` past the end of the track.
    pub fn pitch_at(&self, index: usize) -> f32 {
        self.pitch_frames.get(index).copied().unwrap_or(0.0)
    }

    /// Loudness at `index`, or `0.0` past the end of the track.
    pub fn loudness_at(&self, index: usize) -> f32 {
        self.loudness_frames.get(index).copied().unwrap_or(0.0)
    }

    /// Seconds covered by one frame.
    pub fn frame_duration_secs(&self) -> f64 {
        self.hop_size as f64 / self.sample_rate as f64
    }

    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 * self.frame_duration_secs()
    }

    /// Share of frames with a voiced reference pitch.
    pub fn voiced_ratio(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let voiced = self.pitch_frames.iter().filter(|&&p| p > 0.0).count();
        voiced as f32 / self.len() as f32
    }
}

/// Runs the offline pitch and loudness pass over a reference vocal.
#[derive(Debug, Clone)]
pub struct ReferenceAnalyzer {
    config: AnalysisConfig,
}

impl ReferenceAnalyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyzes `samples` (mono, at `sample_rate`) into a [`ReferenceTrack`]
    /// of `floor(samples.len() / hop_size)` frames.
    ///
    /// Frames are independent, so the pass is spread across the rayon pool
    /// with one estimator per worker.
    pub fn analyze(&self, samples: &[f32], sample_rate: u32) -> Result<ReferenceTrack> {
        let hop = self.config.hop_size;
        let yin_config = self.config.yin_config(sample_rate);
        let window = yin_config.window_size;
        // Fail on bad settings before spawning any work.
        YinEstimator::new(yin_config)?;

        let total_frames = samples.len() / hop;
        log::info!(
            "Analyzing reference vocal: {} samples at {} Hz, {} frames (hop {}, window {})",
            samples.len(),
            sample_rate,
            total_frames,
            hop,
            window
        );

        let frames: Vec<(f32, f32)> = (0..total_frames)
            .into_par_iter()
            .map_init(
                || {
                    (
                        YinEstimator::new(yin_config).ok(),
                        vec![0.0_f32; window],
                    )
                },
                |(estimator, buffer), frame_idx| {
                    let hop_end = (frame_idx + 1) * hop;
                    let loudness = fft::rms(&samples[hop_end - hop..hop_end]);

                    // Window ends at the hop end; zero padded before the track start.
                    let start = hop_end as isize - window as isize;
                    buffer.fill(0.0);
                    let src_start = start.max(0) as usize;
                    let dst_start = (src_start as isize - start) as usize;
                    buffer[dst_start..].copy_from_slice(&samples[src_start..hop_end]);

                    let pitch = match estimator.as_mut() {
                        Some(estimator) => {
                            let frame = estimator.estimate(buffer.as_slice());
                            if frame.confidence >= self.config.reference_min_confidence
                                && frame.pitch_hz >= self.config.min_pitch_hz
                                && frame.pitch_hz <= self.config.max_pitch_hz
                            {
                                frame.pitch_hz
                            } else {
                                0.0
                            }
                        }
                        None => 0.0,
                    };
                    (pitch, loudness)
                },
            )
            .collect();

        let (pitch_frames, loudness_frames): (Vec<f32>, Vec<f32>) = frames.into_iter().unzip();
        let track = ReferenceTrack::from_frames(hop, sample_rate, pitch_frames, loudness_frames)?;
        log::info!(
            "Reference analysis complete: {:.1}s, {:.0}% voiced",
            track.duration_secs(),
            track.voiced_ratio() * 100.0
        );
        Ok(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_wave(freq_hz: f32, len: usize, sample_rate: u32) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                0.5 * (2.0 * std::f32::consts::PI * freq_hz * t).sin()
            })
            .collect()
    }

    #[test]
    fn frame_count_is_floor_of_length_over_hop() {
        let analyzer = ReferenceAnalyzer::new(AnalysisConfig::default()).unwrap();
        let track = analyzer.analyze(&vec![0.0; 512 * 10 + 300], 44100).unwrap();
        assert_eq!(track.len(), 10);
        assert_eq!(track.loudness_frames().len(), 10);
        assert!(track.pitch_frames().iter().all(|&p| p == 0.0));
    }

    #[test]
    fn sine_reference_is_voiced_after_first_window() {
        let sr = 44100;
        let analyzer = ReferenceAnalyzer::new(AnalysisConfig::default()).unwrap();
        let samples = sine_wave(220.0, sr as usize, sr);
        let track = analyzer.analyze(&samples, sr).unwrap();

        // From frame 3 on the window is fully inside the signal.
        for &pitch in &track.pitch_frames()[3..] {
            assert!((pitch - 220.0).abs() < 2.0, "pitch {}", pitch);
        }
        for &loudness in track.loudness_frames() {
            assert!((loudness - 0.5 / 2f32.sqrt()).abs() < 0.02);
        }
    }

    #[test]
    fn out_of_range_reference_is_unvoiced() {
        let sr = 44100;
        let analyzer = ReferenceAnalyzer::new(AnalysisConfig::default()).unwrap();
        let track = analyzer.analyze(&sine_wave(900.0, 8192, sr), sr).unwrap();
        assert!(track.pitch_frames().iter().all(|&p| p == 0.0));
    }

    #[test]
    fn from_frames_normalizes_nan_and_checks_lengths() {
        let track =
            ReferenceTrack::from_frames(512, 44100, vec![440.0, f32::NAN], vec![0.1, 0.2]).unwrap();
        assert_eq!(track.pitch_frames(), &[440.0, 0.0]);

        let mismatch = ReferenceTrack::from_frames(512, 44100, vec![440.0], vec![]);
        assert!(matches!(mismatch, Err(ScoreError::InvalidReference { .. })));
    }

    #[test]
    fn lookups_past_the_end_are_silent() {
        let track = ReferenceTrack::from_frames(512, 44100, vec![440.0], vec![0.3]).unwrap();
        assert_eq!(track.pitch_at(0), 440.0);
        assert_eq!(track.pitch_at(1), 0.0);
        assert_eq!(track.loudness_at(99), 0.0);
    }

    #[test]
    fn json_round_trip_validates() {
        let track =
            ReferenceTrack::from_frames(512, 44100, vec![440.0, 0.0], vec![0.2, 0.0]).unwrap();
        let json = track.to_json_string().unwrap();
        assert_eq!(ReferenceTrack::from_json_str(&json).unwrap(), track);

        let bad = r#"{"hop_size":512,"sample_rate":44100,
            "pitch_frames":[1.0],"loudness_frames":[]}"#;
        assert!(ReferenceTrack::from_json_str(bad).is_err());
    }

    #[test]
    fn window_grows_to_cover_the_lowest_pitch() {
        let config = AnalysisConfig::default();
        assert_eq!(config.window_for(44100), 2048);
        assert_eq!(config.window_for(48000), 2048);
        assert_eq!(config.window_for(96000), 4096);
        assert_eq!(config.window_for(192000), 8192);
        assert_eq!(config.window_for(8000), 2048);
    }

    #[test]
    fn low_voice_is_voiced_at_96k() {
        let sr = 96000;
        let analyzer = ReferenceAnalyzer::new(AnalysisConfig::default()).unwrap();
        let track = analyzer.analyze(&sine_wave(70.0, sr as usize, sr), sr).unwrap();
        assert_eq!(track.len(), 187);

        // The 4096-sample window is inside the signal from frame 7 on.
        for &pitch in &track.pitch_frames()[8..] {
            assert!((pitch - 70.0).abs() < 1.0, "pitch {}", pitch);
        }
    }

    #[test]
    fn rejects_empty_pitch_range() {
        let config = AnalysisConfig {
            min_pitch_hz: 0.0,
            ..AnalysisConfig::default()
        };
        assert!(ReferenceAnalyzer::new(config).is_err());
    }

    #[test]
    fn rejects_window_shorter_than_hop() {
        let config = AnalysisConfig {
            hop_size: 1024,
            window_size: 512,
            ..AnalysisConfig::default()
        };
        assert!(ReferenceAnalyzer::new(config).is_err());
    }
}
