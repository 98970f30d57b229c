//! Short-lived status text, e.g. after a setting changed from the keyboard.

use nannou::prelude::*;

/// ~3 seconds at 60fps
const NOTIFICATION_FRAMES: u32 = 180;
/// Frames over which the text fades out at the end
const FADE_FRAMES: u32 = 30;

#[derive(Debug, Default)]
pub struct Notification {
    text: Option<String>,
    frames: u32,
}

impl Notification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows a notification message for 3 seconds
    pub fn show(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
        self.frames = NOTIFICATION_FRAMES;
    }

    /// Count down one frame
    pub fn tick(&mut self) {
        if self.frames > 0 {
            self.frames -= 1;
            if self.frames == 0 {
                self.text = None;
            }
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    fn alpha(&self) -> f32 {
        (self.frames as f32 / FADE_FRAMES as f32).min(1.0)
    }

    pub fn draw(&self, draw: &Draw, bounds: Rect) {
        let Some(text) = self.text.as_deref() else {
            return;
        };
        let alpha = self.alpha();
        let y = bounds.bottom() + 40.0;

        draw.rect()
            .x_y(bounds.x(), y)
            .w_h(bounds.w().min(520.0), 36.0)
            .color(srgba(0.0, 0.0, 0.0, 0.6 * alpha));
        draw.text(text)
            .x_y(bounds.x(), y)
            .w(bounds.w().min(500.0))
            .font_size(18)
            .color(srgba(1.0, 1.0, 1.0, alpha));
    }
}
