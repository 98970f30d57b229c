//! Downsampled video color grid

/// Borrowed view of the sampler's RGBA buffer for one tick.
///
/// Rows are tightly packed, 4 bytes per pixel.
#[derive(Clone, Copy, Debug)]
pub struct ColorField<'a> {
    pub width: usize,
    pub height: usize,
    pub pixels: &'a [u8],
}

impl<'a> ColorField<'a> {
    pub fn new(width: usize, height: usize, pixels: &'a [u8]) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    /// RGB at grid cell (x, y).
    ///
    /// Returns `None` for any read that would fall outside the buffer, which
    /// happens when the declared size and the buffer disagree after a
    /// resolution change.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 4;
        let px = self.pixels.get(idx..idx + 3)?;
        Some([px[0], px[1], px[2]])
    }

    /// RGB at normalized coordinates (0-1 on both axes, top-left origin)
    pub fn sample(&self, u: f32, v: f32) -> Option<[u8; 3]> {
        if self.is_empty() || !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return None;
        }
        let x = (u * self.width as f32).floor() as usize;
        let y = (v * self.height as f32).floor() as usize;
        self.pixel(x, y)
    }
}
