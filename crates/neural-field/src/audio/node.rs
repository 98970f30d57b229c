//! FFT analysis node.
//!
//! Turns a window of time-domain samples into a normalized frequency
//! snapshot: Blackman window, magnitude per bin, temporal smoothing, then a
//! decibel mapping into 0-1.

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Default FFT size. At 44.1kHz this gives ~21.5 Hz bins, enough to resolve
/// the 20-250 Hz bass band.
pub const FFT_SIZE: usize = 2048;

/// Bottom of the decibel range mapped to 0.0
const MIN_DECIBELS: f32 = -100.0;
/// Top of the decibel range mapped to 1.0
const MAX_DECIBELS: f32 = -30.0;

pub struct AnalysisNode {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    fft_buffer: Vec<Complex<f32>>,
    window: Vec<f32>,
    /// Smoothed linear magnitude per bin
    magnitudes: Vec<f32>,
    /// Normalized output per bin (0-1)
    frequency_data: Vec<f32>,
    smoothing: f32,
}

impl AnalysisNode {
    pub fn new(fft_size: usize, smoothing: f32) -> Self {
        let fft_size = fft_size.max(32).next_power_of_two();
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        let window = (0..fft_size)
            .map(|i| {
                let t = i as f32 / fft_size as f32;
                0.42 - 0.5 * (std::f32::consts::TAU * t).cos()
                    + 0.08 * (2.0 * std::f32::consts::TAU * t).cos()
            })
            .collect();

        let bins = fft_size / 2;
        Self {
            fft,
            fft_size,
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            window,
            magnitudes: vec![0.0; bins],
            frequency_data: vec![0.0; bins],
            smoothing: smoothing.clamp(0.0, 0.99),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Last computed snapshot (0-1 per bin)
    pub fn frequency_data(&self) -> &[f32] {
        &self.frequency_data
    }

    /// Analyze the most recent `fft_size` samples. Shorter input is
    /// left-padded with silence.
    pub fn process(&mut self, samples: &[f32]) -> &[f32] {
        let take = samples.len().min(self.fft_size);
        let recent = &samples[samples.len() - take..];
        let pad = self.fft_size - take;

        for (i, slot) in self.fft_buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { recent[i - pad] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.fft_buffer);

        let scale = 1.0 / self.fft_size as f32;
        let range = MAX_DECIBELS - MIN_DECIBELS;
        for (bin, c) in self.fft_buffer[..self.fft_size / 2].iter().enumerate() {
            let magnitude = c.norm() * scale;
            let smoothed =
                self.smoothing * self.magnitudes[bin] + (1.0 - self.smoothing) * magnitude;
            self.magnitudes[bin] = smoothed;

            let db = 20.0 * (smoothed + 1e-12).log10();
            self.frequency_data[bin] = ((db - MIN_DECIBELS) / range).clamp(0.0, 1.0);
        }

        &self.frequency_data
    }
}

/// FFT bin ranges for the three perceptual bands, `[start, end)`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BandRanges {
    pub bass: (usize, usize),
    pub mid: (usize, usize),
    pub treble: (usize, usize),
}

impl BandRanges {
    /// Bass 20-250 Hz, mid 250-2000 Hz, treble 2000-20000 Hz.
    /// Adjacent bands share their boundary bin index.
    pub fn new(sample_rate: f32, bin_count: usize) -> Self {
        let nyquist = sample_rate / 2.0;
        let bin_width = (nyquist / bin_count.max(1) as f32).max(f32::EPSILON);
        let bin = |hz: f32| ((hz / bin_width).floor() as usize).min(bin_count);

        let bass = (bin(20.0), bin(250.0));
        let mid = (bass.1, bin(2000.0));
        let treble = (mid.1, bin(20000.0));

        Self { bass, mid, treble }
    }

    /// Mean of `data[start..end)`, 0 for an empty or out-of-range span
    pub fn average(data: &[f32], (start, end): (usize, usize)) -> f32 {
        let end = end.min(data.len());
        if end <= start {
            return 0.0;
        }
        data[start..end].iter().sum::<f32>() / (end - start) as f32
    }

    pub fn levels(&self, data: &[f32]) -> [f32; 3] {
        [
            Self::average(data, self.bass),
            Self::average(data, self.mid),
            Self::average(data, self.treble),
        ]
    }
}
