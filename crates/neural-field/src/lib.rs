//! Audio-reactive particle field composited over video.
//!
//! The [`audio`] extractor and the [`video`] sampler feed the
//! [`engine::ParticleEngine`] once per frame through an
//! [`engine::FrameLoop`]; [`render`] draws the result with nannou.

pub mod audio;
pub mod engine;
pub mod error;
pub mod render;
pub mod ui;
pub mod utils;
pub mod video;
