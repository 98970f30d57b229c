//! Error types for the collaborators feeding the engine.
//!
//! None of these are fatal: the frame loop logs them and substitutes a
//! neutral default for the tick.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio device available")]
    NoDevice,
    #[error("audio device config unavailable: {0}")]
    Config(String),
    #[error("failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
    #[error("failed to pause audio stream: {0}")]
    PauseStream(#[from] cpal::PauseStreamError),
    #[error("sample buffer poisoned by a panicked audio callback")]
    Poisoned,
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("no frames found at {0}")]
    Empty(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: nannou::image::ImageError,
    },
    #[error("frame buffer is {actual} bytes, expected {expected}")]
    BadLength { expected: usize, actual: usize },
}
