//! # Capture Processing Module
//!
//! Turns one captured audio block into one pitch estimate. Blocks arrive
//! interleaved with any channel count; each is downmixed to mono, padded or
//! truncated to exactly one hop, and shifted into a sliding analysis window
//! that the estimator reads. The window can be longer than a hop, so the
//! estimator sees the most recent `window_size` samples.
//!
//! Every buffer is sized at construction, so processing a block never
//! allocates.

use crate::error::{Result, ScoreError};
use crate::pitch::{LiveFrame, PitchEstimator};

pub struct LiveCapturePipeline<E: PitchEstimator> {
    estimator: E,
    hop_size: usize,
    channels: usize,
    /// Most recent samples, oldest first.
    window: Vec<f32>,
}

impl<E: PitchEstimator> LiveCapturePipeline<E> {
    pub fn new(estimator: E, hop_size: usize, channels: u16) -> Result<Self> {
        if hop_size == 0 {
            return Err(ScoreError::InvalidConfig {
                message: "hop size must be positive".to_string(),
            });
        }
        if channels == 0 {
            return Err(ScoreError::InvalidConfig {
                message: "capture stream has no channels".to_string(),
            });
        }
        let window_size = estimator.window_size().max(hop_size);
        Ok(Self {
            estimator,
            hop_size,
            channels: channels as usize,
            window: vec![0.0; window_size],
        })
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of interleaved samples in one full block.
    pub fn block_len(&self) -> usize {
        self.hop_size * self.channels
    }

    /// Analyzes one block. Exactly one [`LiveFrame`] per call.
    pub fn process_block(&mut self, interleaved: &[f32]) -> LiveFrame {
        let hop = self.hop_size;
        let keep = self.window.len() - hop;
        self.window.copy_within(hop.., 0);

        let frames = interleaved.len() / self.channels;
        let take = frames.min(hop);
        let tail = &mut self.window[keep..];
        if self.channels == 1 {
            tail[..take].copy_from_slice(&interleaved[..take]);
        } else {
            let scale = 1.0 / self.channels as f32;
            for (slot, frame) in tail[..take]
                .iter_mut()
                .zip(interleaved.chunks_exact(self.channels))
            {
                *slot = frame.iter().sum::<f32>() * scale;
            }
        }
        tail[take..].fill(0.0);

        self.estimator.estimate(&self.window)
    }

    /// Clears the analysis history, e.g. before reusing the pipeline.
    pub fn reset(&mut self) {
        self.window.fill(0.0);
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }
}
