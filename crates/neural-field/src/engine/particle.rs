//! A single particle and the perspective it is seen through.

use std::collections::VecDeque;

use neural_field_api::{Point, Rgb, Viewport};
use rand::Rng;

use super::policy::SpawnDistribution;

/// Particles outside the view by more than this factor are recycled
const LATERAL_MARGIN: f32 = 1.2;
/// Respawned particles land in the far third of the depth range
const RESPAWN_DEPTH_FRACTION: f32 = 1.0 / 3.0;

/// Pinhole projection from world space onto the viewport
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub viewport: Viewport,
}

impl Projection {
    /// Size multiplier at depth `z`
    pub fn scale_at(&self, z: f32) -> f32 {
        self.fov / (self.fov + z)
    }

    pub fn project(&self, x: f32, y: f32, z: f32) -> (Point, f32) {
        let scale = self.scale_at(z);
        let center = self.viewport.center();
        (Point::new(x * scale + center.x, y * scale + center.y), scale)
    }

    /// Fade with distance: fully opaque at the eye, invisible at the far plane
    pub fn depth_alpha(&self, z: f32) -> f32 {
        (1.0 - z / self.far).max(0.0).powf(1.5)
    }
}

#[derive(Clone, Debug)]
pub struct Particle {
    /// Depth, distance from the viewer
    pub z: f32,
    /// Lateral world position
    pub x: f32,
    pub y: f32,
    /// Depth speed before the bass multiplier
    pub speed: f32,
    /// Lateral heading in radians
    pub angle: f32,
    pub base_size: f32,
    pub color: Rgb,
    /// Last projected position
    pub screen: Point,
    /// Last projection scale
    pub scale: f32,
    trail: VecDeque<Point>,
    trail_capacity: usize,
}

impl Particle {
    /// A fresh particle anywhere in the depth range
    pub(crate) fn spawn(
        rng: &mut impl Rng,
        projection: &Projection,
        spawn: SpawnDistribution,
        trail_capacity: usize,
    ) -> Self {
        let mut particle = Self {
            z: projection.far,
            x: 0.0,
            y: 0.0,
            speed: 0.0,
            angle: 0.0,
            base_size: 0.0,
            color: Rgb::WHITE,
            screen: projection.viewport.center(),
            scale: projection.scale_at(projection.far),
            trail: VecDeque::with_capacity(trail_capacity),
            trail_capacity,
        };

        // Anywhere in (near, far] so the field looks populated at once
        let depth = projection.far - projection.near;
        let z = projection.far - rng.random_range(0.0..depth);
        particle.respawn(rng, projection, spawn, z);
        particle
    }

    /// Send the particle back near the far plane. Color is kept.
    pub(crate) fn recycle(
        &mut self,
        rng: &mut impl Rng,
        projection: &Projection,
        spawn: SpawnDistribution,
    ) {
        let band = (projection.far - projection.near) * RESPAWN_DEPTH_FRACTION;
        let z = projection.far - rng.random_range(0.0..band);
        self.respawn(rng, projection, spawn, z);
    }

    fn respawn(
        &mut self,
        rng: &mut impl Rng,
        projection: &Projection,
        spawn: SpawnDistribution,
        z: f32,
    ) {
        let scale = projection.scale_at(z);
        let (u, v) = spawn.sample(rng);

        self.z = z;
        self.x = u * projection.viewport.width / scale;
        self.y = v * projection.viewport.height / scale;
        self.speed = rng.random_range(0.5..2.0);
        self.angle = rng.random_range(0.0..std::f32::consts::TAU);
        self.base_size = rng.random_range(0.6..2.0);
        self.trail.clear();
    }

    /// Move one tick: forward with bass, wandering sideways with mids
    pub(crate) fn step(&mut self, rng: &mut impl Rng, bass: f32, mid: f32) {
        self.z -= self.speed * (1.0 + bass * 3.0);

        self.angle += (rng.random::<f32>() - 0.5) * 0.1 * (1.0 + mid);
        let lateral = 0.5 * (1.0 + mid * 2.0);
        self.x += self.angle.cos() * lateral;
        self.y += self.angle.sin() * lateral;
    }

    /// Whether the particle crossed the near plane or drifted out of view
    pub(crate) fn out_of_bounds(&self, projection: &Projection) -> bool {
        if self.z.is_nan() || self.z < projection.near {
            return true;
        }
        let scale = projection.scale_at(self.z);
        let half_w = projection.viewport.width * 0.5 / scale * LATERAL_MARGIN;
        let half_h = projection.viewport.height * 0.5 / scale * LATERAL_MARGIN;
        self.x.abs() > half_w || self.y.abs() > half_h
    }

    pub(crate) fn project(&mut self, projection: &Projection) {
        let (screen, scale) = projection.project(self.x, self.y, self.z);
        self.screen = screen;
        self.scale = scale;
    }

    pub(crate) fn push_trail(&mut self) {
        if self.trail_capacity == 0 {
            return;
        }
        while self.trail.len() >= self.trail_capacity {
            self.trail.pop_front();
        }
        self.trail.push_back(self.screen);
    }

    /// Recent screen positions, oldest first, ending at the current one
    pub fn trail(&self) -> &VecDeque<Point> {
        &self.trail
    }
}
