//! Spatial color sampler.
//!
//! Redraws the current video frame into a small RGBA grid once per tick so
//! the particle engine can look up the color behind each particle without
//! touching the full-resolution frame.

use neural_field_api::ColorField;
use tracing::debug;

use super::frame_source::{Frame, FrameSource};
use crate::error::FrameError;

/// Fraction of the source resolution kept in the grid
pub const DEFAULT_SAMPLE_SCALE: f32 = 0.20;

pub struct SpatialColorSampler {
    source: Box<dyn FrameSource>,
    scale: f32,
    /// Source resolution the grid was last sized for
    source_size: Option<(u32, u32)>,
    width: usize,
    height: usize,
    buffer: Vec<u8>,
}

impl SpatialColorSampler {
    pub fn new(source: Box<dyn FrameSource>, scale: f32) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale.min(1.0)
        } else {
            DEFAULT_SAMPLE_SCALE
        };

        Self {
            source,
            scale,
            source_size: None,
            width: 0,
            height: 0,
            buffer: Vec::new(),
        }
    }

    pub fn source_mut(&mut self) -> &mut dyn FrameSource {
        self.source.as_mut()
    }

    /// Downsampled view of the current frame, `None` when the source is not
    /// ready, paused, or failed to produce a frame.
    pub fn pixel_data(&mut self) -> Option<ColorField<'_>> {
        match self.try_pixel_data() {
            Ok(field) => field,
            Err(e) => {
                debug!("Color sample skipped: {}", e);
                None
            }
        }
    }

    /// Like `pixel_data` but surfaces frame errors to the caller
    pub fn try_pixel_data(&mut self) -> Result<Option<ColorField<'_>>, FrameError> {
        if !self.source.is_ready() || !self.source.is_playing() {
            return Ok(None);
        }
        let Some(resolution) = self.source.resolution() else {
            return Ok(None);
        };

        if self.source_size != Some(resolution) {
            self.resize_grid(resolution);
        }
        if self.width == 0 || self.height == 0 {
            return Ok(None);
        }

        let frame = self.source.current_frame()?;
        downsample(&frame, self.width, self.height, &mut self.buffer)?;

        Ok(Some(ColorField::new(self.width, self.height, &self.buffer)))
    }

    fn resize_grid(&mut self, (src_w, src_h): (u32, u32)) {
        self.source_size = Some((src_w, src_h));
        self.width = (src_w as f32 * self.scale).floor() as usize;
        self.height = (src_h as f32 * self.scale).floor() as usize;
        self.buffer.resize(self.width * self.height * 4, 0);
        debug!(
            "Color grid resized to {}x{} for {}x{} source",
            self.width, self.height, src_w, src_h
        );
    }
}

/// Nearest-neighbour resample of `frame` into a `width` x `height` grid,
/// sampling each cell at its center.
fn downsample(
    frame: &Frame<'_>,
    width: usize,
    height: usize,
    out: &mut [u8],
) -> Result<(), FrameError> {
    let (fw, fh) = (frame.width as usize, frame.height as usize);
    let expected = fw * fh * 4;
    if frame.pixels.len() < expected || fw == 0 || fh == 0 {
        return Err(FrameError::BadLength {
            expected,
            actual: frame.pixels.len(),
        });
    }

    let x_ratio = fw as f32 / width as f32;
    let y_ratio = fh as f32 / height as f32;

    for (y, row) in out.chunks_exact_mut(width * 4).take(height).enumerate() {
        let sy = (((y as f32 + 0.5) * y_ratio) as usize).min(fh - 1);
        for (x, cell) in row.chunks_exact_mut(4).enumerate() {
            let sx = (((x as f32 + 0.5) * x_ratio) as usize).min(fw - 1);
            let idx = (sy * fw + sx) * 4;
            cell.copy_from_slice(&frame.pixels[idx..idx + 4]);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Solid-color source whose resolution can change between reads
    struct SolidSource {
        size: (u32, u32),
        color: [u8; 4],
        pixels: Vec<u8>,
        ready: bool,
        playing: bool,
    }

    impl SolidSource {
        fn new(w: u32, h: u32, color: [u8; 4]) -> Self {
            let mut source = Self {
                size: (w, h),
                color,
                pixels: Vec::new(),
                ready: true,
                playing: true,
            };
            source.fill();
            source
        }

        fn fill(&mut self) {
            let (w, h) = self.size;
            self.pixels = self.color.repeat((w * h) as usize);
        }
    }

    impl FrameSource for SolidSource {
        fn is_ready(&self) -> bool {
            self.ready
        }

        fn is_playing(&self) -> bool {
            self.playing
        }

        fn resolution(&self) -> Option<(u32, u32)> {
            Some(self.size)
        }

        fn current_frame(&mut self) -> Result<Frame<'_>, FrameError> {
            Ok(Frame {
                width: self.size.0,
                height: self.size.1,
                pixels: &self.pixels,
                index: 0,
            })
        }

        fn pause(&mut self) {
            self.playing = false;
        }
    }

    #[test]
    fn test_grid_is_scaled_from_source() {
        let source = SolidSource::new(100, 50, [200, 100, 50, 255]);
        let mut sampler = SpatialColorSampler::new(Box::new(source), DEFAULT_SAMPLE_SCALE);

        let field = sampler.pixel_data().unwrap();
        assert_eq!((field.width, field.height), (20, 10));
        assert_eq!(field.pixels.len(), 20 * 10 * 4);
        assert_eq!(field.sample(0.5, 0.5), Some([200, 100, 50]));
    }

    #[test]
    fn test_paused_source_yields_none() {
        let source = SolidSource::new(100, 50, [0, 0, 0, 255]);
        let mut sampler = SpatialColorSampler::new(Box::new(source), DEFAULT_SAMPLE_SCALE);
        sampler.source_mut().pause();
        assert!(sampler.pixel_data().is_none());
    }

    #[test]
    fn test_unready_source_yields_none() {
        let mut source = SolidSource::new(100, 50, [0, 0, 0, 255]);
        source.ready = false;
        let mut sampler = SpatialColorSampler::new(Box::new(source), DEFAULT_SAMPLE_SCALE);
        assert!(sampler.pixel_data().is_none());
    }

    #[test]
    fn test_tiny_source_yields_none() {
        // 4x4 at 0.2 scale floors to an empty grid
        let source = SolidSource::new(4, 4, [0, 0, 0, 255]);
        let mut sampler = SpatialColorSampler::new(Box::new(source), DEFAULT_SAMPLE_SCALE);
        assert!(sampler.pixel_data().is_none());
    }

    #[test]
    fn test_downsample_picks_cell_centers() {
        // 4x1 frame: red, green, blue, white -> 2x1 grid picks columns 1 and 3
        let pixels = [
            255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255, 255, 255, 255, 255,
        ];
        let frame = Frame {
            width: 4,
            height: 1,
            pixels: &pixels,
            index: 0,
        };
        let mut out = vec![0; 2 * 4];
        downsample(&frame, 2, 1, &mut out).unwrap();
        assert_eq!(&out[..4], &[0, 255, 0, 255]);
        assert_eq!(&out[4..], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_short_frame_is_rejected() {
        let pixels = [0u8; 8];
        let frame = Frame {
            width: 4,
            height: 4,
            pixels: &pixels,
            index: 0,
        };
        let mut out = vec![0; 4];
        assert!(matches!(
            downsample(&frame, 1, 1, &mut out),
            Err(FrameError::BadLength { .. })
        ));
    }
}
