//! Drawing surface contract
//!
//! Every primitive takes its composition mode explicitly. There is no
//! ambient "current blend mode" on the surface, so one component's drawing
//! can never leak its mode into another's.

use serde::{Deserialize, Serialize};

use crate::{Color, Point};

/// How a primitive composites onto what is already drawn
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Standard alpha blending (source-over)
    #[default]
    Normal,
    /// Additive blending, brightens overlapping glows
    Additive,
}

/// A 2D raster target covering the viewport.
///
/// Coordinates are pixels with a top-left origin and y pointing down.
pub trait Surface {
    /// Wipe the surface before a new frame
    fn clear(&mut self);

    /// Solid filled circle
    fn fill_circle(&mut self, center: Point, radius: f32, color: Color, blend: BlendMode);

    /// Radial gradient from `color` at the center to fully transparent at `radius`
    fn radial_glow(&mut self, center: Point, radius: f32, color: Color, blend: BlendMode);

    /// Straight line whose color goes from `start_color` to `end_color`
    fn gradient_line(
        &mut self,
        start: Point,
        end: Point,
        weight: f32,
        start_color: Color,
        end_color: Color,
        blend: BlendMode,
    );

    /// Connected line segments with round caps. Points are streamed so
    /// callers can pass ring-buffer contents without collecting them.
    fn polyline(
        &mut self,
        points: &mut dyn Iterator<Item = Point>,
        weight: f32,
        color: Color,
        blend: BlendMode,
    );
}

/// One recorded primitive
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear,
    Circle {
        center: Point,
        radius: f32,
        color: Color,
        blend: BlendMode,
    },
    Glow {
        center: Point,
        radius: f32,
        color: Color,
        blend: BlendMode,
    },
    Line {
        start: Point,
        end: Point,
        weight: f32,
        start_color: Color,
        end_color: Color,
        blend: BlendMode,
    },
    Polyline {
        points: Vec<Point>,
        weight: f32,
        color: Color,
        blend: BlendMode,
    },
}

/// Surface that records primitives instead of rasterizing them.
///
/// Used for headless runs and tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn circles(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { .. }))
    }

    pub fn lines(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color, blend: BlendMode) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
            blend,
        });
    }

    fn radial_glow(&mut self, center: Point, radius: f32, color: Color, blend: BlendMode) {
        self.commands.push(DrawCommand::Glow {
            center,
            radius,
            color,
            blend,
        });
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
        self.commands.push(DrawCommand::Line {
            start,
            end,
            weight,
            start_color,
            end_color,
            blend,
        });
    }

    fn polyline(
        &mut self,
        points: &mut dyn Iterator<Item = Point>,
        weight: f32,
        color: Color,
        blend: BlendMode,
    ) {
        self.commands.push(DrawCommand::Polyline {
            points: points.collect(),
            weight,
            color,
            blend,
        });
    }
}
