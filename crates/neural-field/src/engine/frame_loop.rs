//! Per-frame driver.
//!
//! Pulls one music snapshot and one color field, then advances the engine.
//! Collaborator failures never escape a tick: the last good music state (or
//! silence) and "no color update" stand in for whatever failed.

use std::fmt::Display;

use neural_field_api::{ColorField, MusicState};
use tracing::{debug, info, warn};

use super::ParticleEngine;
use crate::audio::AudioFeatureExtractor;
use crate::error::{AudioError, FrameError};
use crate::video::SpatialColorSampler;

/// Something that produces a fresh music snapshot each tick
pub trait MusicFeed {
    fn pull(&mut self) -> Result<MusicState, AudioError>;
}

/// Something that produces the color field for this tick, if any
pub trait ColorFeed {
    fn pull(&mut self) -> Result<Option<ColorField<'_>>, FrameError>;
}

impl MusicFeed for AudioFeatureExtractor {
    fn pull(&mut self) -> Result<MusicState, AudioError> {
        self.update()?;
        Ok(self.state())
    }
}

impl ColorFeed for SpatialColorSampler {
    fn pull(&mut self) -> Result<Option<ColorField<'_>>, FrameError> {
        self.try_pixel_data()
    }
}

/// Running without video: particles keep their colors
impl<T: ColorFeed> ColorFeed for Option<T> {
    fn pull(&mut self) -> Result<Option<ColorField<'_>>, FrameError> {
        match self {
            Some(feed) => feed.pull(),
            None => Ok(None),
        }
    }
}

/// Consecutive failures of one collaborator.
/// Only the first failure of a streak is logged at warn level.
#[derive(Debug)]
struct FailureStreak {
    source: &'static str,
    count: u64,
}

impl FailureStreak {
    const fn new(source: &'static str) -> Self {
        Self { source, count: 0 }
    }

    fn fail(&mut self, err: &dyn Display) {
        if self.count == 0 {
            warn!("{} failed, using defaults: {}", self.source, err);
        } else {
            debug!("{} still failing ({}): {}", self.source, self.count + 1, err);
        }
        self.count += 1;
    }

    fn recover(&mut self) {
        if self.count > 0 {
            info!("{} recovered after {} failed ticks", self.source, self.count);
            self.count = 0;
        }
    }
}

#[derive(Debug)]
pub struct FrameLoop {
    running: bool,
    last_music: MusicState,
    audio: FailureStreak,
    video: FailureStreak,
    ticks: u64,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            running: true,
            last_music: MusicState::SILENT,
            audio: FailureStreak::new("Audio feed"),
            video: FailureStreak::new("Color feed"),
            ticks: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Do not run further ticks. A tick in progress always completes.
    pub fn stop(&mut self) {
        if self.running {
            info!("Frame loop stopped after {} ticks", self.ticks);
        }
        self.running = false;
    }

    /// Music state the engine saw on the last tick
    pub fn last_music(&self) -> MusicState {
        self.last_music
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one frame. Returns `false` once the loop has been stopped.
    pub fn tick(
        &mut self,
        music: &mut dyn MusicFeed,
        colors: &mut dyn ColorFeed,
        engine: &mut ParticleEngine,
    ) -> bool {
        if !self.running {
            return false;
        }

        match music.pull() {
            Ok(state) => {
                self.audio.recover();
                self.last_music = state;
            }
            Err(e) => {
                self.audio.fail(&e);
                // A stale beat must not fire again
                self.last_music.beat = false;
            }
        }

        let field = match colors.pull() {
            Ok(field) => {
                self.video.recover();
                field
            }
            Err(e) => {
                self.video.fail(&e);
                None
            }
        };

        engine.update(&self.last_music, field.as_ref());
        self.ticks += 1;
        true
    }
}
