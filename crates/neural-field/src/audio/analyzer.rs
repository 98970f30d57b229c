//! Audio feature extraction.
//!
//! Pulls one frequency snapshot per tick from the analysis node and reduces it
//! to three smoothed bands (bass, mid, treble), a decaying impact signal for
//! percussive hits, and an adaptive-threshold beat detector with tempo
//! estimation.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use neural_field_api::MusicState;
use tracing::{debug, info, warn};

use super::node::{AnalysisNode, BandRanges, FFT_SIZE};
use crate::error::AudioError;

/// Sample rate assumed when spectra are fed in directly without an input
const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

/// Per-band smoothing factors. Bass reacts fastest so visuals feel lively on
/// kicks without jittering on hi-hats.
const BASS_SMOOTHING: f32 = 0.3;
const MID_SMOOTHING: f32 = 0.2;
const TREBLE_SMOOTHING: f32 = 0.2;

/// Slow average that the beat threshold adapts to
const AVG_BASS_SMOOTHING: f32 = 0.05;
/// Bass must exceed the running average by this ratio to count as a beat
const BEAT_RATIO: f32 = 1.4;
/// Absolute bass floor for a beat, so quiet passages never trigger
const BEAT_FLOOR: f32 = 0.3;
/// Impact multiplier applied every tick
const IMPACT_DECAY: f32 = 0.92;
/// Inter-beat intervals kept for tempo estimation
const MAX_BEAT_HISTORY: usize = 8;
/// Intervals required before a tempo is reported
const MIN_BPM_SAMPLES: usize = 4;

/// Live audio signal the extractor analyzes
pub trait AudioInput {
    /// Sample rate of the delivered signal, or an error when no stream is open
    fn sample_rate(&self) -> Result<f32, AudioError>;

    /// Replace `out` with the most recent mono samples
    fn read_samples(&mut self, out: &mut Vec<f32>) -> Result<(), AudioError>;

    fn resume(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Tunables for the extractor
#[derive(Clone, Debug)]
pub struct ExtractorConfig {
    pub fft_size: usize,
    /// Temporal smoothing of per-bin magnitudes (0-1)
    pub smoothing: f32,
    /// Rise in smoothed bass within one tick that counts as an impact
    pub impact_threshold: f32,
    /// Level above which audio is considered audible
    pub min_level: f32,
    /// Minimum time between two beats
    pub refractory: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            fft_size: FFT_SIZE,
            smoothing: 0.75,
            impact_threshold: 0.15,
            min_level: 0.05,
            refractory: Duration::from_millis(300),
        }
    }
}

pub struct AudioFeatureExtractor {
    config: ExtractorConfig,
    input: Option<Box<dyn AudioInput>>,
    node: Option<AnalysisNode>,
    bands: Option<BandRanges>,
    /// Reused sample window
    samples: Vec<f32>,

    state: MusicState,
    prev_bass: f32,
    avg_bass: f32,
    last_beat: Option<Duration>,
    /// Inter-beat intervals in milliseconds
    beat_intervals: VecDeque<f32>,

    epoch: Instant,
}

impl AudioFeatureExtractor {
    pub fn new(input: Box<dyn AudioInput>, config: ExtractorConfig) -> Self {
        let mut extractor = Self::detached(config);
        extractor.input = Some(input);
        extractor
    }

    /// Extractor with no audio input. `initialize()` fails and features stay
    /// zeroed unless spectra are fed in directly.
    pub fn detached(config: ExtractorConfig) -> Self {
        Self {
            config,
            input: None,
            node: None,
            bands: None,
            samples: Vec::with_capacity(FFT_SIZE),
            state: MusicState::SILENT,
            prev_bass: 0.0,
            avg_bass: 0.0,
            last_beat: None,
            beat_intervals: VecDeque::with_capacity(MAX_BEAT_HISTORY + 1),
            epoch: Instant::now(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.node.is_some()
    }

    /// Connect the analysis node to the input. Safe to call repeatedly.
    ///
    /// Returns `false` when audio analysis is unavailable; the caller keeps
    /// running with zeroed features.
    pub fn initialize(&mut self) -> bool {
        if self.node.is_some() {
            return true;
        }

        let Some(input) = self.input.as_ref() else {
            warn!("Audio analysis unavailable: no input attached");
            return false;
        };

        match input.sample_rate() {
            Ok(sample_rate) => {
                let node = AnalysisNode::new(self.config.fft_size, self.config.smoothing);
                let bands = BandRanges::new(sample_rate, node.bin_count());
                info!(
                    sample_rate,
                    fft_size = node.fft_size(),
                    ?bands,
                    "Audio analysis initialized"
                );
                self.node = Some(node);
                self.bands = Some(bands);
                true
            }
            Err(e) => {
                warn!("Audio analysis unavailable: {}", e);
                false
            }
        }
    }

    /// Analyze the latest audio window. A no-op until initialized.
    pub fn update(&mut self) -> Result<(), AudioError> {
        let now = self.epoch.elapsed();
        self.update_at(now)
    }

    /// `update` with an explicit timestamp measured from any fixed origin
    pub fn update_at(&mut self, now: Duration) -> Result<(), AudioError> {
        let (Some(input), Some(node), Some(bands)) =
            (self.input.as_mut(), self.node.as_mut(), self.bands)
        else {
            return Ok(());
        };

        input.read_samples(&mut self.samples)?;
        let levels = bands.levels(node.process(&self.samples));
        self.process_bands(levels, now);
        Ok(())
    }

    /// Feed a normalized frequency snapshot (0-1 per bin) directly
    pub fn process_spectrum(&mut self, spectrum: &[f32], now: Duration) {
        let bands = self
            .bands
            .unwrap_or_else(|| BandRanges::new(DEFAULT_SAMPLE_RATE, spectrum.len()));
        self.process_bands(bands.levels(spectrum), now);
    }

    /// Feed raw (unsmoothed) band levels `[bass, mid, treble]` directly
    pub fn process_bands(&mut self, raw: [f32; 3], now: Duration) {
        let [bass, mid, treble] = raw.map(|v| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 });

        let s = &mut self.state;
        s.bass += (bass - s.bass) * BASS_SMOOTHING;
        s.mid += (mid - s.mid) * MID_SMOOTHING;
        s.treble += (treble - s.treble) * TREBLE_SMOOTHING;
        s.level = (s.bass + s.mid + s.treble) / 3.0;

        self.avg_bass += (s.bass - self.avg_bass) * AVG_BASS_SMOOTHING;

        // Decay first so a fresh hit reads as a full 1.0 on its own tick
        s.impact *= IMPACT_DECAY;
        if s.bass - self.prev_bass > self.config.impact_threshold {
            s.impact = 1.0;
        }

        self.state.beat = self.detect_beat(now);
        self.prev_bass = self.state.bass;
    }

    fn detect_beat(&mut self, now: Duration) -> bool {
        let bass = self.state.bass;
        let above_threshold = bass > self.avg_bass * BEAT_RATIO && bass > BEAT_FLOOR;
        if !above_threshold {
            return false;
        }

        let since_last = self.last_beat.map(|t| now.saturating_sub(t));
        if since_last.is_some_and(|d| d <= self.config.refractory) {
            return false;
        }

        if let Some(interval) = since_last {
            self.beat_intervals
                .push_back(interval.as_secs_f32() * 1000.0);
            if self.beat_intervals.len() > MAX_BEAT_HISTORY {
                self.beat_intervals.pop_front();
            }

            if self.beat_intervals.len() >= MIN_BPM_SAMPLES {
                let avg_interval =
                    self.beat_intervals.iter().sum::<f32>() / self.beat_intervals.len() as f32;
                if avg_interval > 0.0 {
                    self.state.bpm = (60000.0 / avg_interval).round();
                }
            }
        }

        self.last_beat = Some(now);
        debug!(bass, bpm = self.state.bpm, "Beat");
        true
    }

    /// Snapshot of the current features
    pub fn state(&self) -> MusicState {
        self.state
    }

    /// Whether the signal is loud enough to be considered playing
    pub fn is_playing(&self) -> bool {
        self.state.level > self.config.min_level
    }

    /// Last frequency snapshot, empty before the first update
    pub fn raw_frequency_data(&self) -> &[f32] {
        self.node
            .as_ref()
            .map(|n| n.frequency_data())
            .unwrap_or(&[])
    }

    /// Frequency snapshot averaged into `bar_count` equal bars
    pub fn spectrum(&self, bar_count: usize) -> Vec<f32> {
        let data = self.raw_frequency_data();
        if bar_count == 0 {
            return Vec::new();
        }
        let per_bar = data.len() / bar_count;
        if per_bar == 0 {
            return vec![0.0; bar_count];
        }

        data.chunks(per_bar)
            .take(bar_count)
            .map(|chunk| chunk.iter().sum::<f32>() / per_bar as f32)
            .collect()
    }

    /// Resume the underlying input, e.g. after a user gesture
    pub fn resume(&mut self) {
        if let Some(input) = self.input.as_mut() {
            if let Err(e) = input.resume() {
                warn!("Failed to resume audio input: {}", e);
            }
        }
    }

    pub fn pause(&mut self) {
        if let Some(input) = self.input.as_mut() {
            if let Err(e) = input.pause() {
                warn!("Failed to pause audio input: {}", e);
            }
        }
    }

    /// Disconnect the analysis node and forget all history.
    /// `initialize()` can reconnect afterwards.
    pub fn shutdown(&mut self) {
        self.pause();
        self.node = None;
        self.bands = None;
        self.state = MusicState::SILENT;
        self.prev_bass = 0.0;
        self.avg_bass = 0.0;
        self.last_beat = None;
        self.beat_intervals.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f64 = 1.0 / 60.0;

    fn at(frame: u32) -> Duration {
        Duration::from_secs_f64(frame as f64 * FRAME)
    }

    struct FixedInput {
        rate: Result<f32, ()>,
        samples: Vec<f32>,
    }

    impl AudioInput for FixedInput {
        fn sample_rate(&self) -> Result<f32, AudioError> {
            self.rate.map_err(|_| AudioError::NoDevice)
        }

        fn read_samples(&mut self, out: &mut Vec<f32>) -> Result<(), AudioError> {
            out.clear();
            out.extend_from_slice(&self.samples);
            Ok(())
        }
    }

    #[test]
    fn test_initialize_without_input_fails_softly() {
        let mut extractor = AudioFeatureExtractor::detached(ExtractorConfig::default());
        assert!(!extractor.initialize());
        assert!(extractor.update().is_ok());
        assert_eq!(extractor.state(), MusicState::SILENT);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let input = FixedInput {
            rate: Ok(48000.0),
            samples: vec![0.0; FFT_SIZE],
        };
        let mut extractor = AudioFeatureExtractor::new(Box::new(input), ExtractorConfig::default());
        assert!(extractor.initialize());
        assert!(extractor.initialize());
        assert!(extractor.is_initialized());
    }

    #[test]
    fn test_initialize_fails_when_device_missing() {
        let input = FixedInput {
            rate: Err(()),
            samples: Vec::new(),
        };
        let mut extractor = AudioFeatureExtractor::new(Box::new(input), ExtractorConfig::default());
        assert!(!extractor.initialize());
        assert!(!extractor.is_initialized());
    }

    #[test]
    fn test_bands_smooth_at_distinct_rates() {
        let mut extractor = AudioFeatureExtractor::detached(ExtractorConfig::default());
        extractor.process_bands([1.0, 1.0, 1.0], at(0));
        let s = extractor.state();
        assert!((s.bass - 0.3).abs() < 1e-6);
        assert!((s.mid - 0.2).abs() < 1e-6);
        assert!((s.treble - 0.2).abs() < 1e-6);
        assert!((s.level - (0.7 / 3.0)).abs() < 1e-6);
    }

    #[test]
    fn test_impact_jumps_then_decays() {
        let mut extractor = AudioFeatureExtractor::detached(ExtractorConfig::default());
        for f in 0..30 {
            extractor.process_bands([0.0, 0.0, 0.0], at(f));
        }
        extractor.process_bands([1.0, 0.0, 0.0], at(30));
        assert_eq!(extractor.state().impact, 1.0);

        extractor.process_bands([1.0, 0.0, 0.0], at(31));
        let second = extractor.state().impact;
        // Bass rose by 0.21 on the second tick too, still above 0.15
        assert_eq!(second, 1.0);

        for f in 32..40 {
            extractor.process_bands([1.0, 0.0, 0.0], at(f));
        }
        let decayed = extractor.state().impact;
        assert!(decayed < 1.0 && decayed > 0.0);
    }

    #[test]
    fn test_no_beat_on_silence() {
        let mut extractor = AudioFeatureExtractor::detached(ExtractorConfig::default());
        for f in 0..300 {
            extractor.process_bands([0.0, 0.0, 0.0], at(f));
            assert!(!extractor.state().beat);
        }
        assert_eq!(extractor.state().bpm, 0.0);
    }

    #[test]
    fn test_periodic_bass_spikes_estimate_tempo() {
        let mut extractor = AudioFeatureExtractor::detached(ExtractorConfig::default());
        let mut beats = Vec::new();

        // Spike for 3 frames every 30 frames (500ms at 60fps) for 10 seconds
        for f in 0..600u32 {
            let bass = if f % 30 < 3 { 1.0 } else { 0.05 };
            extractor.process_bands([bass, 0.1, 0.1], at(f));
            if extractor.state().beat {
                beats.push(at(f));
            }
        }

        assert!(beats.len() >= 10, "expected regular beats, got {}", beats.len());
        for pair in beats.windows(2) {
            assert!(pair[1] - pair[0] > Duration::from_millis(300));
        }

        let bpm = extractor.state().bpm;
        assert!((115.0..=125.0).contains(&bpm), "bpm {bpm} not near 120");
    }

    #[test]
    fn test_refractory_suppresses_double_triggers() {
        let mut extractor = AudioFeatureExtractor::detached(ExtractorConfig::default());
        let mut last_beat: Option<u32> = None;

        // Spikes every 6 frames (100ms) are faster than the refractory period
        for f in 0..240u32 {
            let bass = if f % 6 < 2 { 1.0 } else { 0.0 };
            extractor.process_bands([bass, 0.0, 0.0], at(f));
            if extractor.state().beat {
                if let Some(prev) = last_beat {
                    assert!(at(f) - at(prev) > Duration::from_millis(300));
                }
                last_beat = Some(f);
            }
        }
    }

    #[test]
    fn test_update_reads_input_through_fft() {
        let sample_rate = 44100.0;
        let samples: Vec<f32> = (0..FFT_SIZE)
            .map(|i| (std::f32::consts::TAU * 80.0 * i as f32 / sample_rate).sin() * 0.8)
            .collect();
        let input = FixedInput {
            rate: Ok(sample_rate),
            samples,
        };
        let mut extractor = AudioFeatureExtractor::new(Box::new(input), ExtractorConfig::default());
        assert!(extractor.initialize());

        for f in 0..30 {
            extractor.update_at(at(f)).unwrap();
        }
        let s = extractor.state();
        assert!(s.bass > s.treble);
        assert!(extractor.is_playing());
        assert_eq!(extractor.raw_frequency_data().len(), FFT_SIZE / 2);
    }

    #[test]
    fn test_spectrum_bars() {
        let mut extractor = AudioFeatureExtractor::detached(ExtractorConfig::default());
        assert_eq!(extractor.spectrum(32), vec![0.0; 32]);
        assert!(extractor.spectrum(0).is_empty());

        extractor.process_bands([1.0, 1.0, 1.0], at(0));
        extractor.shutdown();
        assert_eq!(extractor.state(), MusicState::SILENT);
    }
}
