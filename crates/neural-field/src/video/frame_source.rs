//! Decoded video frames.
//!
//! `FrameSource` is what the sampler and the host read from. `ImageSequence`
//! plays a directory of still frames (or a single image) at a fixed rate.

use nannou::image::{self, RgbaImage};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::FrameError;

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];
/// Playback rate used when none (or a non-positive one) is given
pub const DEFAULT_FPS: f32 = 30.0;

/// One decoded RGBA frame, rows tightly packed
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u8],
    /// Position of the frame in the stream, changes whenever the image does
    pub index: usize,
}

/// A playing video as seen by the sampler
pub trait FrameSource {
    /// Whether a frame can be read right now
    fn is_ready(&self) -> bool;

    fn is_playing(&self) -> bool;

    /// Resolution of the current frame
    fn resolution(&self) -> Option<(u32, u32)>;

    /// Decode (if needed) and return the frame for the current playback position
    fn current_frame(&mut self) -> Result<Frame<'_>, FrameError>;

    fn play(&mut self) {}

    fn pause(&mut self) {}
}

/// Plays still images as a looping video
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    fps: f32,
    /// Playback position accumulated up to the last pause
    position: Duration,
    /// Set while playing
    resumed_at: Option<Instant>,
    current: Option<(usize, RgbaImage)>,
}

impl ImageSequence {
    /// Open a single image or a directory of frames sorted by file name.
    /// The first frame is decoded eagerly so the source is ready at once.
    pub fn open(path: &Path, fps: f32) -> Result<Self, FrameError> {
        let paths = if path.is_dir() {
            Self::collect_frames(path)?
        } else {
            vec![path.to_path_buf()]
        };

        if paths.is_empty() {
            return Err(FrameError::Empty(path.to_path_buf()));
        }

        let mut sequence = Self {
            paths,
            fps: if fps > 0.0 { fps } else { DEFAULT_FPS },
            position: Duration::ZERO,
            resumed_at: Some(Instant::now()),
            current: None,
        };
        sequence.load(0)?;

        info!(
            "Opened {} frame(s) from {} at {} fps",
            sequence.paths.len(),
            path.display(),
            sequence.fps
        );
        Ok(sequence)
    }

    fn collect_frames(dir: &Path) -> Result<Vec<PathBuf>, FrameError> {
        let io_err = |source| FrameError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(io_err)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            })
            .collect();
        paths.sort();
        Ok(paths)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Current playback position
    pub fn position(&self) -> Duration {
        match self.resumed_at {
            Some(t) => self.position + t.elapsed(),
            None => self.position,
        }
    }

    fn frame_index(&self) -> usize {
        let frame = (self.position().as_secs_f64() * self.fps as f64) as usize;
        frame % self.paths.len()
    }

    fn load(&mut self, index: usize) -> Result<(), FrameError> {
        let path = &self.paths[index];
        let image = image::open(path).map_err(|source| FrameError::Decode {
            path: path.clone(),
            source,
        })?;
        debug!("Decoded frame {} ({})", index, path.display());
        self.current = Some((index, image.to_rgba8()));
        Ok(())
    }
}

impl FrameSource for ImageSequence {
    fn is_ready(&self) -> bool {
        self.current.is_some()
    }

    fn is_playing(&self) -> bool {
        self.resumed_at.is_some()
    }

    fn resolution(&self) -> Option<(u32, u32)> {
        self.current.as_ref().map(|(_, img)| img.dimensions())
    }

    fn current_frame(&mut self) -> Result<Frame<'_>, FrameError> {
        let index = self.frame_index();
        if self.current.as_ref().map(|(i, _)| *i) != Some(index) {
            self.load(index)?;
        }

        match self.current.as_ref() {
            Some((index, img)) => Ok(Frame {
                width: img.width(),
                height: img.height(),
                pixels: img.as_raw(),
                index: *index,
            }),
            None => Err(FrameError::Empty(self.paths[0].clone())),
        }
    }

    fn play(&mut self) {
        if self.resumed_at.is_none() {
            self.resumed_at = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        if let Some(t) = self.resumed_at.take() {
            self.position += t.elapsed();
        }
    }
}
