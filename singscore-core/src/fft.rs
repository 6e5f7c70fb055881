//! # Fast Fourier Transform (FFT) Module
//!
//! FFT helpers for the pitch estimator. The autocorrelation plan and its
//! buffers are created once and reused, so processing a window on the
//! capture path performs no allocation.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Removes the DC offset from a signal by making its average value zero.
///
/// # Arguments
/// * `signal` - Audio signal to process (modified in-place)
pub fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 {
        return;
    }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Root-mean-square amplitude of a block. Empty blocks are silent.
pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|&s| s * s).sum::<f32>() / signal.len() as f32).sqrt()
}

/// Linear autocorrelation r(τ) of a fixed-length window, computed through a
/// zero-padded FFT (Wiener-Khinchin) instead of the O(N·τ) direct sum.
pub struct Autocorrelator {
    window_size: usize,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    output: Vec<f32>,
}

impl Autocorrelator {
    pub fn new(window_size: usize) -> Self {
        let fft_len = (window_size.max(1) * 2).next_power_of_two();
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_len);
        let ifft = planner.plan_fft_inverse(fft_len);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());

        Self {
            window_size,
            fft,
            ifft,
            buffer: vec![Complex { re: 0.0, im: 0.0 }; fft_len],
            scratch: vec![Complex { re: 0.0, im: 0.0 }; scratch_len],
            output: vec![0.0; window_size],
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Computes r(τ) for τ in `0..window_size`. Input longer than the window
    /// is truncated, shorter input is zero padded.
    pub fn process(&mut self, signal: &[f32]) -> &[f32] {
        let n = signal.len().min(self.window_size);
        for (slot, &sample) in self.buffer.iter_mut().zip(signal[..n].iter()) {
            *slot = Complex { re: sample, im: 0.0 };
        }
        for slot in self.buffer[n..].iter_mut() {
            *slot = Complex { re: 0.0, im: 0.0 };
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
        for value in self.buffer.iter_mut() {
            let power = value.re * value.re + value.im * value.im;
            *value = Complex { re: power, im: 0.0 };
        }
        self.ifft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        let scale = 1.0 / self.buffer.len() as f32;
        for (out, value) in self.output.iter_mut().zip(self.buffer.iter()) {
            *out = value.re * scale;
        }
        &self.output
    }
}
