//! # Audio Device Module
//!
//! The scoring core depends on the audio subsystem only through the
//! [`AudioBackend`] capability: the backend negotiates a capture format,
//! opens a capture stream that pushes fixed-size blocks into a registered
//! handler, and opens a playback stream for the backing track. Streams are
//! opened paused; the session controller starts them together.
//!
//! The CPAL implementation lives here as well (feature `cpal-audio`).
//! Tests drive the same handler with synthetic blocks.
//!
//! ## Features
//! - Block assembly: arbitrary device buffers regrouped into hop-sized blocks
//! - Mono backing-track playback with a shared position counter
//! - Linear resampling of decoded tracks to the device rate

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::Result;

/// Handler invoked once per captured block of interleaved samples.
///
/// Runs on the audio callback thread: it must not block, allocate or log.
pub type BlockHandler = Box<dyn FnMut(&[f32]) + Send + 'static>;

/// Negotiated capture stream format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// A stream handle owned by the control context.
pub trait ActiveStream {
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
}

/// The audio subsystem as seen by the session controller.
pub trait AudioBackend {
    /// Selects the capture device and format, preferring `preferred_sample_rate`.
    ///
    /// Fails with a device-unavailable error when there is no input device
    /// or no usable format.
    fn capture_format(&mut self, preferred_sample_rate: u32) -> Result<StreamFormat>;

    /// Opens a paused capture stream. `handler` must receive blocks of
    /// exactly `block_frames * format.channels` interleaved samples.
    fn open_capture(
        &mut self,
        format: StreamFormat,
        block_frames: usize,
        handler: BlockHandler,
    ) -> Result<Box<dyn ActiveStream>>;

    /// Opens a paused playback stream for a mono track at `sample_rate`.
    /// Fails with a sample-rate mismatch when the output device cannot run
    /// at the capture rate.
    fn open_playback(
        &mut self,
        sample_rate: u32,
        track: PlaybackTrack,
    ) -> Result<Box<dyn ActiveStream>>;
}

/// Decoded mono PCM at a known sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct MonoAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl MonoAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Returns the audio at `sample_rate`, resampling only if needed.
    pub fn resampled_to(&self, sample_rate: u32) -> MonoAudio {
        if sample_rate == self.sample_rate {
            return self.clone();
        }
        log::info!(
            "Resampling {:.1}s of audio from {} Hz to {} Hz",
            self.duration_secs(),
            self.sample_rate,
            sample_rate
        );
        MonoAudio {
            samples: resample_linear(&self.samples, self.sample_rate, sample_rate),
            sample_rate,
        }
    }
}

/// Simple linear interpolation resampling.
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || from_rate == 0 || to_rate == 0 || samples.is_empty() {
        return samples.to_vec();
    }

    // Positions stay in integer units of 1/to_rate source samples.
    let (from, to) = (from_rate as u64, to_rate as u64);
    let output_len = (samples.len() as u64 * to / from) as usize;
    let last = samples.len() - 1;

    (0..output_len as u64)
        .map(|i| {
            let position = i * from;
            let idx = (position / to) as usize;
            let frac = (position % to) as f32 / to as f32;
            let a = samples[idx.min(last)];
            let b = samples[(idx + 1).min(last)];
            a + (b - a) * frac
        })
        .collect()
}

/// Regroups device buffers of any length into blocks of a fixed length.
///
/// The pending buffer is allocated once; pushing never reallocates.
pub struct BlockAssembler {
    block_len: usize,
    pending: Vec<f32>,
}

impl BlockAssembler {
    pub fn new(block_len: usize) -> Self {
        let block_len = block_len.max(1);
        Self {
            block_len,
            pending: Vec::with_capacity(block_len),
        }
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Appends `data` and calls `emit` for every completed block.
    pub fn push(&mut self, mut data: &[f32], mut emit: impl FnMut(&[f32])) {
        while !data.is_empty() {
            if self.pending.is_empty() && data.len() >= self.block_len {
                let (block, rest) = data.split_at(self.block_len);
                emit(block);
                data = rest;
                continue;
            }
            let take = (self.block_len - self.pending.len()).min(data.len());
            self.pending.extend_from_slice(&data[..take]);
            data = &data[take..];
            if self.pending.len() == self.block_len {
                emit(&self.pending);
                self.pending.clear();
            }
        }
    }

    /// Samples waiting for the next block.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// A mono backing track shared between the playback callback and the
/// control context. Only the playback callback advances the position.
#[derive(Debug, Clone)]
pub struct PlaybackTrack {
    samples: Arc<[f32]>,
    position: Arc<AtomicUsize>,
}

impl PlaybackTrack {
    pub fn new(samples: Vec<f32>) -> Self {
        Self {
            samples: samples.into(),
            position: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples played so far.
    pub fn position(&self) -> usize {
        self.position.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.position() >= self.samples.len()
    }

    /// Writes the next frames into an interleaved output buffer, copying the
    /// mono sample to every channel. Silence once the track has ended.
    /// Returns the number of track samples consumed.
    pub fn fill(&self, out: &mut [f32], channels: usize) -> usize {
        let channels = channels.max(1);
        let pos = self.position.load(Ordering::Relaxed);
        let frames = out.len() / channels;
        let available = self.samples.len().saturating_sub(pos).min(frames);

        out.fill(0.0);
        for (frame, &sample) in out
            .chunks_exact_mut(channels)
            .zip(self.samples[pos..pos + available].iter())
        {
            frame.fill(sample);
        }
        self.position.store(pos + available, Ordering::Relaxed);
        available
    }
}

#[cfg(feature = "cpal-audio")]
pub use self::cpal_backend::CpalBackend;

#[cfg(feature = "cpal-audio")]
mod cpal_backend {
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::SupportedStreamConfigRange;

    use super::{
        ActiveStream, AudioBackend, BlockAssembler, BlockHandler, PlaybackTrack, StreamFormat,
    };
    use crate::error::{Direction, Result, ScoreError};

    struct CpalStream(cpal::Stream);

    impl ActiveStream for CpalStream {
        fn play(&mut self) -> Result<()> {
            self.0.play().map_err(ScoreError::stream)
        }

        fn pause(&mut self) -> Result<()> {
            self.0.pause().map_err(ScoreError::stream)
        }
    }

    /// Default host input and output devices through CPAL.
    pub struct CpalBackend {
        host: cpal::Host,
    }

    impl Default for CpalBackend {
        fn default() -> Self {
            Self::new()
        }
    }

    impl CpalBackend {
        pub fn new() -> Self {
            Self {
                host: cpal::default_host(),
            }
        }

        fn input_device(&self) -> Result<cpal::Device> {
            self.host.default_input_device().ok_or(ScoreError::NoDevice {
                direction: Direction::Input,
            })
        }

        fn output_device(&self) -> Result<cpal::Device> {
            self.host.default_output_device().ok_or(ScoreError::NoDevice {
                direction: Direction::Output,
            })
        }
    }

    /// Finds the best f32 configuration for the target sample rate.
    ///
    /// Prefers ranges containing the rate exactly, then fewer channels.
    /// Returns the range together with the rate to open it at.
    fn find_supported_config(
        configs: Vec<SupportedStreamConfigRange>,
        target_rate: u32,
    ) -> Option<(SupportedStreamConfigRange, u32)> {
        configs
            .into_iter()
            .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
            .map(|c| {
                let rate = target_rate.clamp(c.min_sample_rate().0, c.max_sample_rate().0);
                (c, rate)
            })
            .min_by_key(|(c, rate)| ((*rate as i64 - target_rate as i64).abs(), c.channels()))
    }

    impl AudioBackend for CpalBackend {
        fn capture_format(&mut self, preferred_sample_rate: u32) -> Result<StreamFormat> {
            let device = self.input_device()?;
            log::info!(
                "Using audio input device: {}",
                device.name().unwrap_or_else(|_| "<unnamed>".to_string())
            );

            let configs = device
                .supported_input_configs()
                .map_err(|e| ScoreError::UnsupportedFormat {
                    direction: Direction::Input,
                    message: e.to_string(),
                })?
                .collect::<Vec<_>>();
            let (range, sample_rate) = find_supported_config(configs, preferred_sample_rate)
                .ok_or_else(|| ScoreError::UnsupportedFormat {
                    direction: Direction::Input,
                    message: "no f32 input format".to_string(),
                })?;

            log::info!(
                "Selected capture format: {} Hz, {} channel(s)",
                sample_rate,
                range.channels()
            );
            Ok(StreamFormat {
                sample_rate,
                channels: range.channels(),
            })
        }

        fn open_capture(
            &mut self,
            format: StreamFormat,
            block_frames: usize,
            mut handler: BlockHandler,
        ) -> Result<Box<dyn ActiveStream>> {
            let device = self.input_device()?;
            let config = cpal::StreamConfig {
                channels: format.channels,
                sample_rate: cpal::SampleRate(format.sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };

            let mut assembler = BlockAssembler::new(block_frames * format.channels as usize);
            let err_fn = |err| log::error!("An error occurred on the capture stream: {}", err);

            let stream = device
                .build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        assembler.push(data, |block| handler(block));
                    },
                    err_fn,
                    None,
                )
                .map_err(ScoreError::stream)?;

            // Some hosts start streams on creation.
            if let Err(e) = stream.pause() {
                log::debug!("Capture stream could not be paused after build: {}", e);
            }
            Ok(Box::new(CpalStream(stream)))
        }

        fn open_playback(
            &mut self,
            sample_rate: u32,
            track: PlaybackTrack,
        ) -> Result<Box<dyn ActiveStream>> {
            let device = self.output_device()?;
            log::info!(
                "Using audio output device: {}",
                device.name().unwrap_or_else(|_| "<unnamed>".to_string())
            );

            let configs = device
                .supported_output_configs()
                .map_err(|e| ScoreError::UnsupportedFormat {
                    direction: Direction::Output,
                    message: e.to_string(),
                })?
                .collect::<Vec<_>>();
            let (range, rate) = find_supported_config(configs, sample_rate).ok_or_else(|| {
                ScoreError::UnsupportedFormat {
                    direction: Direction::Output,
                    message: "no f32 output format".to_string(),
                }
            })?;
            if rate != sample_rate {
                return Err(ScoreError::SampleRateMismatch {
                    expected: sample_rate,
                    actual: rate,
                });
            }

            let channels = range.channels() as usize;
            let config = cpal::StreamConfig {
                channels: range.channels(),
                sample_rate: cpal::SampleRate(sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };
            let err_fn = |err| log::error!("An error occurred on the playback stream: {}", err);

            let stream = device
                .build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        track.fill(data, channels);
                    },
                    err_fn,
                    None,
                )
                .map_err(ScoreError::stream)?;

            if let Err(e) = stream.pause() {
                log::debug!("Playback stream could not be paused after build: {}", e);
            }
            Ok(Box::new(CpalStream(stream)))
        }
    }
}
