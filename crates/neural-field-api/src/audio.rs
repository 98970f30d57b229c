//! Per-tick music feature snapshot

/// Smoothed audio features for the current tick.
///
/// Produced by value so a consumer can never mutate the extractor's state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MusicState {
    /// Smoothed 20-250 Hz energy (0-1)
    pub bass: f32,
    /// Smoothed 250-2000 Hz energy (0-1)
    pub mid: f32,
    /// Smoothed 2-20 kHz energy (0-1)
    pub treble: f32,
    /// Mean of bass, mid and treble
    pub level: f32,
    /// Decaying percussive transient (jumps to 1, decays geometrically)
    pub impact: f32,
    /// True for exactly the tick on which a beat fired
    pub beat: bool,
    /// Estimated tempo, 0 until enough beats were seen
    pub bpm: f32,
}

impl MusicState {
    /// Zeroed features, used whenever audio is unavailable.
    pub const SILENT: MusicState = MusicState {
        bass: 0.0,
        mid: 0.0,
        treble: 0.0,
        level: 0.0,
        impact: 0.0,
        beat: false,
        bpm: 0.0,
    };
}
