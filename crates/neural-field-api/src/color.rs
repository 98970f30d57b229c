//! Color types

/// 8-bit-range RGB with float channels (0.0-255.0).
///
/// Particles keep their color in this form so interpolation does not
/// accumulate rounding error.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(255.0, 255.0, 255.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn splat(v: f32) -> Self {
        Self { r: v, g: v, b: v }
    }

    pub fn from_bytes(rgb: [u8; 3]) -> Self {
        Self::new(rgb[0] as f32, rgb[1] as f32, rgb[2] as f32)
    }

    /// Clamp every channel into 0-255. NaN becomes 0.
    pub fn clamped(self) -> Self {
        self.map(|c| if c.is_nan() { 0.0 } else { c.clamp(0.0, 255.0) })
    }

    pub fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Self::new(f(self.r), f(self.g), f(self.b))
    }

    /// Mean of the three channels (0-255)
    pub fn brightness(&self) -> f32 {
        (self.r + self.g + self.b) / 3.0
    }

    /// Sum of absolute per-channel differences
    pub fn manhattan(&self, other: &Rgb) -> f32 {
        (self.r - other.r).abs() + (self.g - other.g).abs() + (self.b - other.b).abs()
    }

    /// Linear interpolation toward `target` by `amount` (0-1)
    pub fn lerp(self, target: Rgb, amount: f32) -> Self {
        let t = amount.clamp(0.0, 1.0);
        Self::new(
            self.r + (target.r - self.r) * t,
            self.g + (target.g - self.g) * t,
            self.b + (target.b - self.b) * t,
        )
    }

    /// Convert to a normalized drawing color with the given alpha
    pub fn with_alpha(self, alpha: f32) -> Color {
        Color::rgba(
            self.r / 255.0,
            self.g / 255.0,
            self.b / 255.0,
            alpha.clamp(0.0, 1.0),
        )
    }
}

/// Drawing color (RGBA, 0.0-1.0 range)
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}
