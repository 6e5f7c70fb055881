//! # Pitch Estimation Module
//!
//! Monophonic pitch tracking for the reference analyzer and the live
//! capture path. The estimator contract is small: a fixed-length window of
//! mono samples goes in, a [`LiveFrame`] of `(pitch_hz, confidence)` comes
//! out. Callers never see a non-finite value; anything the algorithm cannot
//! resolve is reported as the unvoiced frame.
//!
//! ## Features
//! - YIN pitch detection with an FFT-based difference function
//! - Amplitude gating to filter out silence
//! - Parabolic interpolation for sub-sample accuracy
//! - Preallocated buffers, safe to call from an audio callback

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};
use crate::fft::{self, Autocorrelator};

/// Lowest pitch accepted as sung, in Hz.
pub const MIN_VOCAL_HZ: f32 = 50.0;
/// Highest pitch accepted as sung, in Hz.
pub const MAX_VOCAL_HZ: f32 = 600.0;
/// Confidence an estimate must exceed to be used.
pub const CONFIDENCE_THRESHOLD: f32 = 0.8;

/// One pitch estimate. `pitch_hz == 0.0` means no pitch was found.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LiveFrame {
    pub pitch_hz: f32,
    pub confidence: f32,
}

impl LiveFrame {
    pub const UNVOICED: LiveFrame = LiveFrame {
        pitch_hz: 0.0,
        confidence: 0.0,
    };

    /// Builds a frame, normalizing invalid estimates to the unvoiced
    /// sentinel: a non-finite or negative pitch becomes 0, a non-finite
    /// confidence becomes 0, and confidence is clamped to [0, 1].
    pub fn new(pitch_hz: f32, confidence: f32) -> Self {
        let pitch_hz = if pitch_hz.is_finite() && pitch_hz > 0.0 {
            pitch_hz
        } else {
            0.0
        };
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            pitch_hz,
            confidence,
        }
    }

    pub fn is_voiced(&self) -> bool {
        self.pitch_hz > 0.0
    }
}

/// Decides whether a live estimate is good enough to be scored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsabilityGate {
    pub min_pitch_hz: f32,
    pub max_pitch_hz: f32,
    /// Confidence must be strictly greater than this.
    pub min_confidence: f32,
}

impl Default for UsabilityGate {
    fn default() -> Self {
        Self {
            min_pitch_hz: MIN_VOCAL_HZ,
            max_pitch_hz: MAX_VOCAL_HZ,
            min_confidence: CONFIDENCE_THRESHOLD,
        }
    }
}

impl UsabilityGate {
    /// A frame is usable iff its pitch lies in the inclusive vocal range and
    /// its confidence exceeds the threshold. A zero pitch and a low
    /// confidence are rejected the same way.
    pub fn is_usable(&self, frame: &LiveFrame) -> bool {
        frame.pitch_hz >= self.min_pitch_hz
            && frame.pitch_hz <= self.max_pitch_hz
            && frame.confidence > self.min_confidence
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_pitch_hz > 0.0 && self.min_pitch_hz < self.max_pitch_hz) {
            return Err(ScoreError::InvalidConfig {
                message: format!(
                    "pitch range {}..{} Hz is empty",
                    self.min_pitch_hz, self.max_pitch_hz
                ),
            });
        }
        if !(0.0..1.0).contains(&self.min_confidence) {
            return Err(ScoreError::InvalidConfig {
                message: format!("confidence threshold {} outside [0, 1)", self.min_confidence),
            });
        }
        Ok(())
    }
}

/// A monophonic pitch tracker over fixed-size windows.
///
/// Implementations must tolerate windows of the wrong length (pad or
/// truncate) and must return normalized frames.
pub trait PitchEstimator {
    /// Number of samples the estimator analyzes per call.
    fn window_size(&self) -> usize;

    /// Estimates the fundamental of `window`.
    fn estimate(&mut self, window: &[f32]) -> LiveFrame;
}

/// Parameters of the YIN estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YinConfig {
    pub sample_rate: u32,
    pub window_size: usize,
    /// Absolute threshold on the normalized difference function.
    pub threshold: f32,
    /// Windows quieter than this RMS are treated as silence.
    pub silence_rms: f32,
    /// Search band. Wider than the vocal gate so out-of-range singing is
    /// reported as such rather than folded into range.
    pub min_frequency: f32,
    pub max_frequency: f32,
}

impl YinConfig {
    pub fn new(sample_rate: u32, window_size: usize) -> Self {
        Self {
            sample_rate,
            window_size,
            threshold: 0.15,
            silence_rms: 1e-4,
            min_frequency: 40.0,
            max_frequency: 1200.0,
        }
    }
}

/// YIN pitch detection (de Cheveigné & Kawahara, 2002).
///
/// Confidence is `1 - d'(τ)` at the chosen lag, so a clean periodic signal
/// reports close to 1.0 and noise reports low values.
pub struct YinEstimator {
    config: YinConfig,
    autocorrelator: Autocorrelator,
    work: Vec<f32>,
    prefix_sq: Vec<f32>,
    cmnd: Vec<f32>,
    tau_min: usize,
    tau_max: usize,
}

impl YinEstimator {
    pub fn new(config: YinConfig) -> Result<Self> {
        if config.sample_rate == 0 {
            return Err(ScoreError::InvalidConfig {
                message: "sample rate must be positive".to_string(),
            });
        }
        if config.window_size < 8 {
            return Err(ScoreError::InvalidConfig {
                message: format!("window size {} is too small", config.window_size),
            });
        }
        if !(config.min_frequency > 0.0 && config.min_frequency < config.max_frequency) {
            return Err(ScoreError::InvalidConfig {
                message: "YIN search band is empty".to_string(),
            });
        }

        let n = config.window_size;
        let sr = config.sample_rate as f32;
        let tau_max = ((sr / config.min_frequency).ceil() as usize).min(n / 2);
        let tau_min = ((sr / config.max_frequency).floor() as usize).max(2);
        if tau_min + 2 >= tau_max {
            return Err(ScoreError::InvalidConfig {
                message: format!(
                    "window of {} samples at {} Hz cannot resolve {}..{} Hz",
                    n, config.sample_rate, config.min_frequency, config.max_frequency
                ),
            });
        }

        Ok(Self {
            config,
            autocorrelator: Autocorrelator::new(n),
            work: vec![0.0; n],
            prefix_sq: vec![0.0; n + 1],
            cmnd: vec![1.0; tau_max + 1],
            tau_min,
            tau_max,
        })
    }

    pub fn config(&self) -> &YinConfig {
        &self.config
    }

    /// Difference function d(τ) from the autocorrelation:
    /// d(τ) = Σ x_j² (j < n-τ) + Σ x_j² (j ≥ τ) - 2·r(τ),
    /// followed in place by the cumulative mean normalization d'(τ).
    fn compute_cmnd(&mut self) {
        let n = self.work.len();
        self.prefix_sq[0] = 0.0;
        for (idx, &sample) in self.work.iter().enumerate() {
            self.prefix_sq[idx + 1] = self.prefix_sq[idx] + sample * sample;
        }

        let autocorr = self.autocorrelator.process(&self.work);

        self.cmnd[0] = 1.0;
        let mut running_sum = 0.0;
        for tau in 1..=self.tau_max {
            let sum_head = self.prefix_sq[n - tau];
            let sum_tail = self.prefix_sq[n] - self.prefix_sq[tau];
            // FFT round-off can push tiny differences below zero.
            let diff = (sum_head + sum_tail - 2.0 * autocorr[tau]).max(0.0);
            running_sum += diff;
            self.cmnd[tau] = if running_sum > 0.0 {
                diff * tau as f32 / running_sum
            } else {
                1.0
            };
        }
    }

    /// First lag under the threshold, walked down to its local minimum.
    /// Falls back to the global minimum of the search band.
    fn pick_period(&self) -> usize {
        let mut tau = self.tau_min;
        while tau < self.tau_max {
            if self.cmnd[tau] < self.config.threshold {
                while tau + 1 < self.tau_max && self.cmnd[tau + 1] < self.cmnd[tau] {
                    tau += 1;
                }
                return tau;
            }
            tau += 1;
        }

        (self.tau_min..self.tau_max)
            .min_by(|&a, &b| {
                self.cmnd[a]
                    .partial_cmp(&self.cmnd[b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(self.tau_min)
    }

    fn parabolic_interpolation(&self, tau: usize) -> f32 {
        if tau == 0 || tau + 1 > self.tau_max {
            return tau as f32;
        }
        let y1 = self.cmnd[tau - 1];
        let y2 = self.cmnd[tau];
        let y3 = self.cmnd[tau + 1];
        let denom = y1 - 2.0 * y2 + y3;
        if denom.abs() < 1e-12 {
            return tau as f32;
        }
        let shift = 0.5 * (y1 - y3) / denom;
        if shift.abs() > 1.0 {
            return tau as f32;
        }
        tau as f32 + shift
    }
}

impl PitchEstimator for YinEstimator {
    fn window_size(&self) -> usize {
        self.config.window_size
    }

    fn estimate(&mut self, window: &[f32]) -> LiveFrame {
        let n = window.len().min(self.work.len());
        self.work[..n].copy_from_slice(&window[..n]);
        self.work[n..].fill(0.0);

        // --- Noise Gate: silence has no pitch ---
        if fft::rms(&self.work) < self.config.silence_rms {
            return LiveFrame::UNVOICED;
        }
        fft::remove_dc_offset(&mut self.work);

        self.compute_cmnd();
        let tau = self.pick_period();
        let confidence = 1.0 - self.cmnd[tau];
        let period = self.parabolic_interpolation(tau);
        if period <= 0.0 {
            return LiveFrame::UNVOICED;
        }

        LiveFrame::new(self.config.sample_rate as f32 / period, confidence)
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
    fn normalizes_invalid_estimates() {
        assert_eq!(LiveFrame::new(f32::NAN, 0.9), LiveFrame::new(0.0, 0.9));
        assert_eq!(LiveFrame::new(f32::INFINITY, 0.9).pitch_hz, 0.0);
        assert_eq!(LiveFrame::new(-3.0, 0.9).pitch_hz, 0.0);
        assert_eq!(LiveFrame::new(220.0, f32::NAN).confidence, 0.0);
        assert_eq!(LiveFrame::new(220.0, 1.7).confidence, 1.0);
    }

    #[test]
    fn gate_bounds_are_inclusive_and_confidence_strict() {
        let gate = UsabilityGate::default();
        assert!(gate.is_usable(&LiveFrame::new(50.0, 0.9)));
        assert!(gate.is_usable(&LiveFrame::new(600.0, 0.9)));
        assert!(!gate.is_usable(&LiveFrame::new(49.9, 0.9)));
        assert!(!gate.is_usable(&LiveFrame::new(600.1, 0.9)));
        assert!(!gate.is_usable(&LiveFrame::new(440.0, 0.8)));
        assert!(!gate.is_usable(&LiveFrame::new(0.0, 0.99)));
        assert!(!gate.is_usable(&LiveFrame::UNVOICED));
    }

    #[test]
    fn yin_tracks_vocal_sines() {
        let sr = 44100;
        let mut yin = YinEstimator::new(YinConfig::new(sr, 2048)).unwrap();
        for &freq in &[110.0, 220.0, 440.0, 523.25] {
            let frame = yin.estimate(&sine_wave(freq, 2048, sr));
            let error = (frame.pitch_hz - freq).abs() / freq;
            assert!(error < 0.01, "{} Hz estimated as {}", freq, frame.pitch_hz);
            assert!(frame.confidence > 0.9, "confidence {}", frame.confidence);
        }
    }

    #[test]
    fn low_voice_is_usable_at_high_sample_rates() {
        let analysis = crate::reference::AnalysisConfig::default();
        for sr in [44100, 96000] {
            let config = analysis.yin_config(sr);
            let mut yin = YinEstimator::new(config).unwrap();
            let frame = yin.estimate(&sine_wave(70.0, config.window_size, sr));
            assert!((frame.pitch_hz - 70.0).abs() < 1.0, "{} Hz: got {}", sr, frame.pitch_hz);
            assert!(UsabilityGate::default().is_usable(&frame), "{} Hz: {:?}", sr, frame);
        }
    }

    #[test]
    fn yin_reports_silence_as_unvoiced() {
        let mut yin = YinEstimator::new(YinConfig::new(44100, 2048)).unwrap();
        assert_eq!(yin.estimate(&vec![0.0; 2048]), LiveFrame::UNVOICED);
    }

    #[test]
    fn yin_pads_short_windows() {
        let sr = 44100;
        let mut yin = YinEstimator::new(YinConfig::new(sr, 2048)).unwrap();
        let frame = yin.estimate(&sine_wave(330.0, 1800, sr));
        assert!((frame.pitch_hz - 330.0).abs() < 5.0, "got {}", frame.pitch_hz);
    }

    #[test]
    fn rejects_windows_that_cannot_resolve_the_band() {
        let config = YinConfig::new(44100, 16);
        assert!(YinEstimator::new(config).is_err());
        let mut zero_rate = YinConfig::new(44100, 2048);
        zero_rate.sample_rate = 0;
        assert!(YinEstimator::new(zero_rate).is_err());
    }
}
