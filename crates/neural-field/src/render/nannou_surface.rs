//! `Surface` over a nannou `Draw`.
//!
//! Engine coordinates have a top-left origin with y pointing down; nannou's
//! are centered with y pointing up. Every call scopes its own blend state on
//! a derived `Draw`, so nothing leaks into later primitives.

use nannou::prelude::*;
use nannou::wgpu::{self, BlendComponent, BlendFactor, BlendOperation};
use neural_field_api::{BlendMode, Color, Point, Surface};

/// Source-over alpha blending
const BLEND_OVER: BlendComponent = BlendComponent {
    src_factor: BlendFactor::SrcAlpha,
    dst_factor: BlendFactor::OneMinusSrcAlpha,
    operation: BlendOperation::Add,
};

/// Additive light
const BLEND_LIGHTER: BlendComponent = BlendComponent {
    src_factor: BlendFactor::SrcAlpha,
    dst_factor: BlendFactor::One,
    operation: BlendOperation::Add,
};

/// Concentric rings used to fake a radial gradient
const GLOW_RINGS: usize = 8;

pub struct NannouSurface<'a> {
    draw: &'a Draw,
    bounds: Rect,
    backdrop: Option<&'a wgpu::Texture>,
}

impl<'a> NannouSurface<'a> {
    pub fn new(draw: &'a Draw, bounds: Rect) -> Self {
        Self {
            draw,
            bounds,
            backdrop: None,
        }
    }

    /// Texture painted under everything on `clear`
    pub fn with_backdrop(mut self, texture: Option<&'a wgpu::Texture>) -> Self {
        self.backdrop = texture;
        self
    }

    fn to_world(&self, p: Point) -> Point2 {
        pt2(self.bounds.left() + p.x, self.bounds.top() - p.y)
    }

    fn blended(&self, blend: BlendMode) -> Draw {
        let component = match blend {
            BlendMode::Normal => BLEND_OVER,
            BlendMode::Additive => BLEND_LIGHTER,
        };
        self.draw.color_blend(component)
    }
}

fn rgba(c: Color) -> Srgba {
    srgba(c.r, c.g, c.b, c.a)
}

impl Surface for NannouSurface<'_> {
    fn clear(&mut self) {
        self.draw.background().color(BLACK);
        if let Some(texture) = self.backdrop {
            self.draw
                .texture(texture)
                .xy(self.bounds.xy())
                .wh(self.bounds.wh());
        }
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color, blend: BlendMode) {
        let d = radius * 2.0;
        self.blended(blend)
            .ellipse()
            .xy(self.to_world(center))
            .w_h(d, d)
            .color(rgba(color));
    }

    fn radial_glow(&mut self, center: Point, radius: f32, color: Color, blend: BlendMode) {
        let draw = self.blended(blend);
        let xy = self.to_world(center);
        // Stacked rings: the center accumulates roughly `color.a`, the rim fades out
        let ring_alpha = color.a / GLOW_RINGS as f32;
        for i in 0..GLOW_RINGS {
            let t = i as f32 / GLOW_RINGS as f32;
            let d = radius * 2.0 * (1.0 - t);
            draw.ellipse()
                .xy(xy)
                .w_h(d, d)
                .color(srgba(color.r, color.g, color.b, ring_alpha));
        }
    }

    fn gradient_line(
        &mut self,
        start: Point,
        end: Point,
        weight: f32,
        start_color: Color,
        end_color: Color,
        blend: BlendMode,
    ) {
        let points = [
            (self.to_world(start), rgba(start_color)),
            (self.to_world(end), rgba(end_color)),
        ];
        self.blended(blend)
            .polyline()
            .weight(weight)
            .caps_round()
            .points_colored(points);
    }

    fn polyline(
        &mut self,
        points: &mut dyn Iterator<Item = Point>,
        weight: f32,
        color: Color,
        blend: BlendMode,
    ) {
        self.blended(blend)
            .polyline()
            .weight(weight)
            .caps_round()
            .join_round()
            .points(points.map(|p| self.to_world(p)))
            .color(rgba(color));
    }
}
