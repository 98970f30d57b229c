//! Particle simulation and rendering.
//!
//! `ParticleEngine::update` advances physics, recycles particles that left
//! the view, projects them, syncs their color with the video and rebuilds
//! the connection graph. `draw` is read-only and composites the result
//! far-to-near onto any [`Surface`].

mod frame_loop;
mod graph;
mod particle;
mod policy;

pub use frame_loop::{ColorFeed, FrameLoop, MusicFeed};
pub use graph::{ConnectionGraph, Edge};
pub use particle::{Particle, Projection};
pub use policy::{apply_floor, ColorPolicy, ConnectionPolicy, SpawnDistribution};

use neural_field_api::{BlendMode, ColorField, MusicState, Point, Rgb, Surface, Viewport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

/// No connections are drawn below this loudness
const CONNECTION_MIN_LEVEL: f32 = 0.1;
/// Bass widens the connection reach by up to this factor
const REACH_BASS_GAIN: f32 = 1.8;
/// Edges fainter than this are not drawn
const MIN_EDGE_ALPHA: f32 = 0.05;
/// Glow is only drawn above this loudness
const GLOW_MIN_LEVEL: f32 = 0.2;
const GLOW_RADIUS_FACTOR: f32 = 4.0;
/// Particles fainter than this are skipped entirely
const MIN_DEPTH_ALPHA: f32 = 0.01;
/// Trails need more points than this to be drawn
const MIN_TRAIL_POINTS: usize = 2;
/// Longest trail a config may ask for
const MAX_TRAIL_LENGTH: usize = 64;

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub particle_count: usize,
    /// Base connection distance in pixels before the bass multiplier
    pub connection_distance: f32,
    /// Maximum outgoing edges per particle
    pub max_connections: usize,
    /// Screen positions kept per particle
    pub trail_length: usize,
    pub fov: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub color_policy: ColorPolicy,
    pub brightness_boost: f32,
    /// Minimum brightness (0-255) of any target color
    pub brightness_floor: f32,
    /// Combined channel delta that counts as a scene cut
    pub scene_cut_threshold: f32,
    pub fast_color_rate: f32,
    pub slow_color_rate: f32,
    pub spawn_distribution: SpawnDistribution,
    pub connection_policy: ConnectionPolicy,
    pub glow_blend: BlendMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            particle_count: 80,
            connection_distance: 130.0,
            max_connections: 4,
            trail_length: 10,
            fov: 400.0,
            near_plane: 10.0,
            far_plane: 1200.0,
            color_policy: ColorPolicy::Boosted,
            brightness_boost: 1.3,
            brightness_floor: 40.0,
            scene_cut_threshold: 50.0,
            fast_color_rate: 0.55,
            slow_color_rate: 0.08,
            spawn_distribution: SpawnDistribution::Uniform,
            connection_policy: ConnectionPolicy::Forward,
            glow_blend: BlendMode::Normal,
        }
    }
}

impl EngineConfig {
    /// Replace values that would break the projection or the color math
    /// with defaults
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let valid = |v: f32| v.is_finite() && v > 0.0;
        let non_negative = |v: f32| v.is_finite() && v >= 0.0;

        if !valid(self.fov) {
            self.fov = defaults.fov;
        }
        if !valid(self.near_plane) {
            self.near_plane = defaults.near_plane;
        }
        if !valid(self.far_plane) || self.far_plane <= self.near_plane {
            self.near_plane = defaults.near_plane;
            self.far_plane = defaults.far_plane;
        }
        if !self.connection_distance.is_finite() {
            self.connection_distance = defaults.connection_distance;
        }
        self.fast_color_rate = sanitize_rate(self.fast_color_rate, defaults.fast_color_rate);
        self.slow_color_rate = sanitize_rate(self.slow_color_rate, defaults.slow_color_rate);

        if !non_negative(self.brightness_boost) {
            self.brightness_boost = defaults.brightness_boost;
        }
        if !non_negative(self.brightness_floor) {
            self.brightness_floor = defaults.brightness_floor;
        }
        self.brightness_floor = self.brightness_floor.min(255.0);
        if !non_negative(self.scene_cut_threshold) {
            self.scene_cut_threshold = defaults.scene_cut_threshold;
        }
        self.trail_length = self.trail_length.min(MAX_TRAIL_LENGTH);
        self
    }
}

fn sanitize_rate(rate: f32, fallback: f32) -> f32 {
    if rate.is_finite() {
        rate.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

pub struct ParticleEngine {
    config: EngineConfig,
    projection: Projection,
    particles: Vec<Particle>,
    graph: ConnectionGraph,
    /// Particle indices sorted far to near
    draw_order: Vec<usize>,
    /// Screen positions handed to the graph, reused every tick
    screen_points: Vec<Point>,
    /// Count change applied on the next update
    pending_count: Option<usize>,
    rng: StdRng,
}

impl ParticleEngine {
    pub fn new(config: EngineConfig, viewport: Viewport) -> Self {
        Self::with_rng(config, viewport, StdRng::from_os_rng())
    }

    /// Deterministic engine for tests and replays
    pub fn with_seed(config: EngineConfig, viewport: Viewport, seed: u64) -> Self {
        Self::with_rng(config, viewport, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: EngineConfig, viewport: Viewport, rng: StdRng) -> Self {
        let config = config.sanitized();
        let projection = Projection {
            fov: config.fov,
            near: config.near_plane,
            far: config.far_plane,
            viewport,
        };

        let mut engine = Self {
            projection,
            particles: Vec::new(),
            graph: ConnectionGraph::new(),
            draw_order: Vec::new(),
            screen_points: Vec::new(),
            pending_count: None,
            rng,
            config,
        };
        engine.rebuild_pool(engine.config.particle_count);
        engine
    }

    fn rebuild_pool(&mut self, count: usize) {
        self.config.particle_count = count;
        self.particles = (0..count)
            .map(|_| {
                let mut p = Particle::spawn(
                    &mut self.rng,
                    &self.projection,
                    self.config.spawn_distribution,
                    self.config.trail_length,
                );
                p.project(&self.projection);
                p
            })
            .collect();
        self.graph.clear();
        self.draw_order.clear();
        self.draw_order.extend(0..count);
        self.sort_draw_order();
        debug!("Particle pool rebuilt with {} particles", count);
    }

    /// Advance one tick. `colors` is `None` when no video frame is available;
    /// particles then keep their current colors.
    pub fn update(&mut self, music: &MusicState, colors: Option<&ColorField<'_>>) {
        if let Some(count) = self.pending_count.take() {
            self.rebuild_pool(count);
        }

        let bass = finite_or_zero(music.bass);
        let mid = finite_or_zero(music.mid);
        let level = finite_or_zero(music.level);
        let projection = self.projection;
        let viewport = projection.viewport;

        for p in &mut self.particles {
            p.step(&mut self.rng, bass, mid);
            if p.out_of_bounds(&projection) {
                p.recycle(&mut self.rng, &projection, self.config.spawn_distribution);
            }
            p.project(&projection);

            if let Some(field) = colors {
                Self::sync_color(&self.config, p, field, viewport);
            }

            p.push_trail();
        }

        self.sort_draw_order();

        if level < CONNECTION_MIN_LEVEL {
            self.graph.clear();
        } else {
            self.screen_points.clear();
            self.screen_points.extend(self.particles.iter().map(|p| p.screen));
            let reach = self.config.connection_distance * (1.0 + bass * REACH_BASS_GAIN);
            self.graph.rebuild(
                &self.screen_points,
                reach,
                self.config.max_connections,
                self.config.connection_policy,
            );
        }
    }

    /// Move `p.color` toward the video color behind it
    fn sync_color(
        config: &EngineConfig,
        p: &mut Particle,
        field: &ColorField<'_>,
        viewport: Viewport,
    ) {
        if !viewport.contains(p.screen) {
            return;
        }
        let u = p.screen.x / viewport.width;
        let v = p.screen.y / viewport.height;
        let Some(sample) = field.sample(u, v) else {
            return;
        };

        let target = config.color_policy.target(
            Rgb::from_bytes(sample),
            config.brightness_boost,
            config.brightness_floor,
        );
        let rate = if p.color.manhattan(&target) >= config.scene_cut_threshold {
            config.fast_color_rate
        } else {
            config.slow_color_rate
        };
        p.color = p.color.lerp(target, rate).clamped();
    }

    fn sort_draw_order(&mut self) {
        if self.draw_order.len() != self.particles.len() {
            self.draw_order.clear();
            self.draw_order.extend(0..self.particles.len());
        }
        let particles = &self.particles;
        self.draw_order
            .sort_by(|&a, &b| particles[b].z.total_cmp(&particles[a].z));
    }

    /// Composite the field onto `surface`: connections first, then particles
    /// far to near.
    pub fn draw(&self, surface: &mut dyn Surface, music: &MusicState) {
        surface.clear();

        let bass = finite_or_zero(music.bass);
        let level = finite_or_zero(music.level);

        if level >= CONNECTION_MIN_LEVEL {
            self.draw_connections(surface, bass, level);
        }

        for &idx in &self.draw_order {
            let Some(p) = self.particles.get(idx) else {
                continue;
            };
            self.draw_particle(surface, p, bass, level);
        }
    }

    fn draw_connections(&self, surface: &mut dyn Surface, bass: f32, level: f32) {
        let reach = self.graph.reach();
        if reach <= 0.0 {
            return;
        }

        for edge in self.graph.edges() {
            let (Some(a), Some(b)) = (self.particles.get(edge.from), self.particles.get(edge.to))
            else {
                continue;
            };
            let closeness = 1.0 - edge.distance / reach;
            let alpha = closeness * level * 0.8;
            if alpha <= MIN_EDGE_ALPHA {
                continue;
            }
            surface.gradient_line(
                a.screen,
                b.screen,
                (0.5 + bass) * closeness,
                a.color.with_alpha(alpha),
                b.color.with_alpha(alpha),
                BlendMode::Normal,
            );
        }
    }

    fn draw_particle(&self, surface: &mut dyn Surface, p: &Particle, bass: f32, level: f32) {
        let depth_alpha = self.projection.depth_alpha(p.z);
        if depth_alpha < MIN_DEPTH_ALPHA {
            return;
        }
        let alpha = depth_alpha * (0.6 + level * 0.4);

        let trail = p.trail();
        if trail.len() > MIN_TRAIL_POINTS {
            surface.polyline(
                &mut trail.iter().copied(),
                p.base_size * p.scale * 0.8,
                p.color.with_alpha(alpha * 0.5),
                BlendMode::Normal,
            );
        }

        let size = (p.base_size * p.scale * (1.0 + bass)).max(0.5);

        if level > GLOW_MIN_LEVEL {
            surface.radial_glow(
                p.screen,
                size * GLOW_RADIUS_FACTOR,
                p.color.with_alpha(alpha),
                self.config.glow_blend,
            );
        }

        surface.fill_circle(p.screen, size, p.color.with_alpha(alpha), BlendMode::Normal);
    }

    /// Adopt a new viewport. Particles keep their world positions; later
    /// projections use the new center.
    pub fn resize(&mut self, viewport: Viewport) {
        self.projection.viewport = viewport;
        for p in &mut self.particles {
            p.project(&self.projection);
        }
        debug!("Viewport resized to {}x{}", viewport.width, viewport.height);
    }

    /// Rebuild the pool with `count` particles on the next update
    pub fn set_particle_count(&mut self, count: usize) {
        self.pending_count = Some(count);
    }

    pub fn set_connection_distance(&mut self, distance: f32) {
        if distance.is_finite() {
            self.config.connection_distance = distance.max(0.0);
        }
    }

    pub fn set_max_connections(&mut self, max: usize) {
        self.config.max_connections = max;
    }

    pub fn set_color_policy(&mut self, policy: ColorPolicy) {
        self.config.color_policy = policy;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Particle count including a change not applied yet
    pub fn particle_count(&self) -> usize {
        self.pending_count.unwrap_or(self.particles.len())
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn graph(&self) -> &ConnectionGraph {
        &self.graph
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
