//! GPU copy of the current video frame, drawn under the particle field.

use nannou::image::{DynamicImage, RgbaImage};
use nannou::prelude::*;
use nannou::wgpu;
use tracing::debug;

use crate::error::FrameError;
use crate::video::FrameSource;

#[derive(Default)]
pub struct Backdrop {
    texture: Option<wgpu::Texture>,
    /// Frame index the texture was uploaded from
    frame_index: Option<usize>,
}

impl Backdrop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texture(&self) -> Option<&wgpu::Texture> {
        self.texture.as_ref()
    }

    /// Upload the source's current frame when it changed since the last call.
    /// A paused source keeps showing its last frame.
    pub fn refresh(&mut self, app: &App, source: &mut dyn FrameSource) -> Result<(), FrameError> {
        if !source.is_ready() {
            return Ok(());
        }

        let frame = source.current_frame()?;
        if self.frame_index == Some(frame.index) && self.texture.is_some() {
            return Ok(());
        }

        let expected = frame.width as usize * frame.height as usize * 4;
        let image = RgbaImage::from_raw(frame.width, frame.height, frame.pixels.to_vec()).ok_or(
            FrameError::BadLength {
                expected,
                actual: frame.pixels.len(),
            },
        )?;

        let texture = wgpu::Texture::from_image(app, &DynamicImage::ImageRgba8(image));
        self.texture = Some(texture);
        self.frame_index = Some(frame.index);
        debug!("Backdrop uploaded frame {}", frame.index);
        Ok(())
    }
}
