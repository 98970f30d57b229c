//! Debug overlay.
//!
//! Shows the audio features the engine reacts to (band levels, impact, beat,
//! tempo), the spectrum, frame rate and the live engine settings in a green
//! terminal style.

use std::time::Instant;

use nannou::prelude::*;
use neural_field_api::MusicState;

/// Base font size for numbers
const FONT_SIZE: u32 = 18;
/// Update numbers every N frames (reduces flicker)
const UPDATE_INTERVAL: u32 = 3;
/// Beat flash decay per frame
const BEAT_FLASH_DECAY: f32 = 0.85;
/// Bars in the spectrum strip
pub const SPECTRUM_BARS: usize = 48;

/// Engine numbers shown alongside the audio features
#[derive(Clone, Debug, Default)]
pub struct EngineStats {
    pub particles: usize,
    pub edges: usize,
    pub connection_distance: f32,
    pub max_connections: usize,
    pub color_policy: &'static str,
}

pub struct DebugOverlay {
    visible: bool,
    frame_count: u32,
    /// Last frame time for FPS calculation
    last_frame_time: Option<Instant>,
    /// Smoothed FPS display value
    display_fps: f32,
    /// Cached display values (updated every UPDATE_INTERVAL frames)
    display: MusicState,
    spectrum: Vec<f32>,
    /// 1.0 on a beat, decays every frame
    beat_flash: f32,
}

impl DebugOverlay {
    pub fn new(visible: bool) -> Self {
        Self {
            visible,
            frame_count: 0,
            last_frame_time: None,
            display_fps: 0.0,
            display: MusicState::SILENT,
            spectrum: vec![0.0; SPECTRUM_BARS],
            beat_flash: 0.0,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn fps(&self) -> f32 {
        self.display_fps
    }

    pub fn update(&mut self, music: &MusicState, spectrum: &[f32]) {
        self.update_at(Instant::now(), music, spectrum);
    }

    pub fn update_at(&mut self, now: Instant, music: &MusicState, spectrum: &[f32]) {
        self.frame_count = self.frame_count.wrapping_add(1);

        if let Some(last) = self.last_frame_time {
            let delta = now.duration_since(last).as_secs_f32();
            if delta > 0.0 {
                // Smooth FPS with exponential moving average
                self.display_fps = self.display_fps * 0.9 + (1.0 / delta) * 0.1;
            }
        }
        self.last_frame_time = Some(now);

        // Beats last one tick, so catch them every frame
        if music.beat {
            self.beat_flash = 1.0;
        } else {
            self.beat_flash *= BEAT_FLASH_DECAY;
        }

        if self.frame_count % UPDATE_INTERVAL == 0 {
            self.display = *music;
            self.spectrum.clear();
            self.spectrum.extend_from_slice(spectrum);
        }
    }

    /// Get color based on value: gray -> green -> yellow -> red (0.0 -> 1.0)
    fn value_color(value: f32, alpha: f32) -> Srgba<u8> {
        let clamped = value.clamp(0.0, 1.0);

        let (r, g, b) = if clamped < 0.25 {
            let t = clamped / 0.25;
            let gray = 0.4;
            (gray * (1.0 - t), gray * (1.0 - t) + 0.8 * t, gray * (1.0 - t))
        } else if clamped < 0.5 {
            (0.0, 0.8, 0.0)
        } else if clamped < 0.75 {
            let t = (clamped - 0.5) / 0.25;
            (0.9 * t, 0.8, 0.0)
        } else {
            let t = (clamped - 0.75) / 0.25;
            (0.9, 0.8 * (1.0 - t), 0.0)
        };

        srgba(
            (r * 255.0) as u8,
            (g * 255.0) as u8,
            (b * 255.0) as u8,
            alpha.clamp(0.0, 255.0) as u8,
        )
    }

    fn phosphor(alpha: u8) -> Srgba<u8> {
        srgba(40, 230, 60, alpha)
    }

    pub fn draw(&self, draw: &Draw, bounds: Rect, stats: &EngineStats) {
        if !self.visible {
            return;
        }

        let panel_w = 320.0;
        let row = 26.0;
        let left = bounds.left() + 20.0;
        let top = bounds.top() - 20.0;
        let indicator_width = 140.0;

        draw.rect()
            .x_y(left + panel_w / 2.0 - 10.0, top - 190.0)
            .w_h(panel_w, 400.0)
            .color(srgba(0u8, 0u8, 0u8, 170u8));

        let s = &self.display;
        let meters = [
            ("Bass", s.bass),
            ("Mid", s.mid),
            ("Treble", s.treble),
            ("Level", s.level),
            ("Impact", s.impact),
        ];

        for (i, (label, value)) in meters.iter().enumerate() {
            let y = top - row * i as f32;
            draw.text(&format!("{:<7}{:.2}", label, value))
                .x_y(left + 60.0, y)
                .w(120.0)
                .left_justify()
                .font_size(FONT_SIZE)
                .color(Self::value_color(*value, 255.0));

            // Background track, then the value bar
            let bar_x = left + 140.0;
            draw.line()
                .start(pt2(bar_x, y))
                .end(pt2(bar_x + indicator_width, y))
                .weight(1.0)
                .color(srgba(80u8, 80u8, 80u8, 100u8));
            draw.line()
                .start(pt2(bar_x, y))
                .end(pt2(bar_x + value.clamp(0.0, 1.0) * indicator_width, y))
                .weight(3.0)
                .color(Self::value_color(*value, 220.0));
        }

        let mut y = top - row * meters.len() as f32;

        // Beat flash with tempo
        let flash = (self.beat_flash * 255.0) as u8;
        draw.ellipse()
            .x_y(left + 8.0, y)
            .w_h(14.0, 14.0)
            .color(srgba(255u8, 60u8, 60u8, flash.max(40)));
        let bpm = if s.bpm > 0.0 {
            format!("BPM  {:.0}", s.bpm)
        } else {
            "BPM  --".to_string()
        };
        draw.text(&bpm)
            .x_y(left + 80.0, y)
            .w(120.0)
            .left_justify()
            .font_size(FONT_SIZE)
            .color(Self::phosphor(230));

        y -= row;
        let lines = [
            format!("FPS  {:.0}", self.display_fps),
            format!("Particles  {}", stats.particles),
            format!("Edges  {}", stats.edges),
            format!(
                "Reach  {:.0}px  max {}",
                stats.connection_distance, stats.max_connections
            ),
            format!("Color  {}", stats.color_policy),
        ];
        for line in &lines {
            draw.text(line)
                .x_y(left + 130.0, y)
                .w(panel_w - 20.0)
                .left_justify()
                .font_size(FONT_SIZE)
                .color(Self::phosphor(200));
            y -= row;
        }

        // Spectrum strip
        let strip_w = panel_w - 20.0;
        let bar_w = strip_w / self.spectrum.len().max(1) as f32;
        let base = y - 50.0;
        for (i, value) in self.spectrum.iter().enumerate() {
            let h = value.clamp(0.0, 1.0) * 60.0;
            draw.rect()
                .x_y(left + bar_w * (i as f32 + 0.5), base + h / 2.0)
                .w_h((bar_w - 1.0).max(1.0), h.max(1.0))
                .color(Self::value_color(*value, 200.0));
        }
    }
}
