use neural_field::engine::{ColorPolicy, ConnectionPolicy, EngineConfig, ParticleEngine};
use neural_field_api::{ColorField, DrawCommand, MusicState, RecordingSurface, Rgb, Viewport};
use proptest::prelude::*;

fn music(bass: f32, mid: f32, treble: f32, level: f32) -> MusicState {
    MusicState {
        bass,
        mid,
        treble,
        level,
        ..MusicState::SILENT
    }
}

fn solid_pixels(width: usize, height: usize, rgb: [u8; 3]) -> Vec<u8> {
    (0..width * height)
        .flat_map(|_| [rgb[0], rgb[1], rgb[2], 255])
        .collect()
}

/// Any f32, NaN and infinities included
fn any_level() -> impl Strategy<Value = f32> {
    prop_oneof![
        4 => 0.0f32..=1.0,
        1 => proptest::num::f32::ANY,
    ]
}

fn any_music() -> impl Strategy<Value = MusicState> {
    (any_level(), any_level(), any_level(), any_level())
        .prop_map(|(bass, mid, treble, level)| music(bass, mid, treble, level))
}

fn instant_colors() -> EngineConfig {
    EngineConfig {
        fast_color_rate: 1.0,
        slow_color_rate: 1.0,
        ..Default::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn particles_stay_between_the_planes(
        count in 0usize..150,
        seed in any::<u64>(),
        width in 1.0f32..3000.0,
        height in 1.0f32..3000.0,
        states in proptest::collection::vec(any_music(), 1..40),
    ) {
        let config = EngineConfig { particle_count: count, ..Default::default() };
        let mut engine = ParticleEngine::with_seed(config, Viewport::new(width, height), seed);
        let (near, far) = (engine.projection().near, engine.projection().far);

        for state in &states {
            engine.update(state, None);
            prop_assert_eq!(engine.particles().len(), count);
            for p in engine.particles() {
                prop_assert!(p.z >= near && p.z <= far, "z {} outside [{}, {}]", p.z, near, far);
                prop_assert!(p.screen.x.is_finite() && p.screen.y.is_finite());
            }
        }
    }

    #[test]
    fn degree_and_reach_are_bounded(
        count in 2usize..120,
        max_connections in 0usize..8,
        distance in 0.0f32..400.0,
        bass in 0.0f32..=1.0,
        level in 0.0f32..=1.0,
        mutual in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let config = EngineConfig {
            particle_count: count,
            max_connections,
            connection_distance: distance,
            connection_policy: if mutual { ConnectionPolicy::Mutual } else { ConnectionPolicy::Forward },
            ..Default::default()
        };
        let mut engine = ParticleEngine::with_seed(config, Viewport::new(800.0, 600.0), seed);
        engine.update(&music(bass, 0.0, 0.0, level), None);

        let graph = engine.graph();
        if level < 0.1 {
            prop_assert!(graph.edges().is_empty());
        }
        for node in 0..count {
            prop_assert!(graph.out_degree(node) <= max_connections);
        }
        for edge in graph.edges() {
            prop_assert!(edge.from != edge.to);
            prop_assert!(edge.distance < graph.reach());
        }
    }

    #[test]
    fn colors_move_monotonically_toward_a_still_frame(
        rgb in any::<[u8; 3]>(),
        policy_idx in 0usize..4,
        seed in any::<u64>(),
    ) {
        let policy = ColorPolicy::ALL[policy_idx];
        let config = EngineConfig {
            particle_count: 60,
            color_policy: policy,
            ..Default::default()
        };
        let target = policy.target(Rgb::from_bytes(rgb), config.brightness_boost, config.brightness_floor);
        let mut engine = ParticleEngine::with_seed(config, Viewport::new(320.0, 240.0), seed);
        let pixels = solid_pixels(8, 6, rgb);
        let field = ColorField::new(8, 6, &pixels);

        let mut previous: Vec<f32> = engine.particles().iter().map(|p| p.color.manhattan(&target)).collect();
        for _ in 0..60 {
            engine.update(&MusicState::SILENT, Some(&field));
            for (p, before) in engine.particles().iter().zip(previous.iter_mut()) {
                let now = p.color.manhattan(&target);
                prop_assert!(now <= *before + 1e-3, "distance grew from {} to {}", before, now);
                *before = now;
            }
        }
    }

    #[test]
    fn resize_keeps_the_pool(
        count in 0usize..100,
        width in 1.0f32..4000.0,
        height in 1.0f32..4000.0,
        seed in any::<u64>(),
    ) {
        let config = EngineConfig { particle_count: count, ..Default::default() };
        let mut engine = ParticleEngine::with_seed(config, Viewport::default(), seed);
        let depths: Vec<f32> = engine.particles().iter().map(|p| p.z).collect();

        engine.resize(Viewport::new(width, height));
        let resized: Vec<f32> = engine.particles().iter().map(|p| p.z).collect();
        prop_assert_eq!(depths, resized);
        prop_assert_eq!(engine.projection().viewport, Viewport::new(width, height));

        engine.update(&music(0.5, 0.5, 0.5, 0.5), None);
        prop_assert_eq!(engine.particles().len(), count);
    }

    #[test]
    fn draw_commands_are_well_formed(
        count in 0usize..80,
        states in proptest::collection::vec(any_music(), 1..10),
        seed in any::<u64>(),
    ) {
        let config = EngineConfig { particle_count: count, ..Default::default() };
        let mut engine = ParticleEngine::with_seed(config, Viewport::new(640.0, 480.0), seed);
        let mut surface = RecordingSurface::new();

        for state in &states {
            engine.update(state, None);
            engine.draw(&mut surface, state);

            prop_assert_eq!(surface.commands.first(), Some(&DrawCommand::Clear));
            for cmd in &surface.commands {
                match cmd {
                    DrawCommand::Circle { radius, color, .. } | DrawCommand::Glow { radius, color, .. } => {
                        prop_assert!(radius.is_finite() && *radius > 0.0);
                        prop_assert!((0.0..=1.0).contains(&color.a));
                    }
                    DrawCommand::Line { weight, start_color, .. } => {
                        prop_assert!(weight.is_finite() && *weight >= 0.0);
                        prop_assert!(start_color.a > 0.05 && start_color.a <= 1.0);
                    }
                    DrawCommand::Polyline { points, color, .. } => {
                        prop_assert!(points.len() > 2);
                        prop_assert!((0.0..=1.0).contains(&color.a));
                    }
                    DrawCommand::Clear => {}
                }
            }
        }
    }
}

#[test]
fn black_frame_still_lifts_particles_to_the_floor() {
    let config = EngineConfig {
        particle_count: 100,
        ..instant_colors()
    };
    let floor = config.brightness_floor;
    let viewport = Viewport::new(400.0, 300.0);
    let mut engine = ParticleEngine::with_seed(config, viewport, 11);
    let pixels = solid_pixels(4, 3, [0, 0, 0]);
    let field = ColorField::new(4, 3, &pixels);

    engine.update(&MusicState::SILENT, Some(&field));

    let mut synced = 0;
    for p in engine.particles() {
        if viewport.contains(p.screen) {
            assert!((p.color.brightness() - floor).abs() < 1.0, "{:?}", p.color);
            synced += 1;
        }
    }
    assert!(synced > 0);
}

#[test]
fn instant_rates_adopt_the_frame_color() {
    let viewport = Viewport::new(400.0, 300.0);
    let mut engine = ParticleEngine::with_seed(
        EngineConfig {
            particle_count: 50,
            color_policy: ColorPolicy::Direct,
            ..instant_colors()
        },
        viewport,
        3,
    );
    let pixels = solid_pixels(4, 3, [200, 40, 90]);
    let field = ColorField::new(4, 3, &pixels);

    engine.update(&MusicState::SILENT, Some(&field));

    let target = Rgb::new(200.0, 40.0, 90.0);
    for p in engine.particles() {
        if viewport.contains(p.screen) {
            assert!(p.color.manhattan(&target) < 1.0, "{:?}", p.color);
        }
    }
}

#[test]
fn default_rates_settle_on_a_still_frame() {
    let viewport = Viewport::new(400.0, 300.0);
    let mut engine = ParticleEngine::with_seed(
        EngineConfig {
            particle_count: 200,
            color_policy: ColorPolicy::Direct,
            ..Default::default()
        },
        viewport,
        5,
    );
    let pixels = solid_pixels(4, 3, [200, 40, 90]);
    let field = ColorField::new(4, 3, &pixels);
    let target = Rgb::new(200.0, 40.0, 90.0);

    // Consecutive ticks each particle spent on screen, where colors sync
    let mut synced = vec![0usize; 200];
    for _ in 0..200 {
        engine.update(&MusicState::SILENT, Some(&field));
        for (p, ticks) in engine.particles().iter().zip(synced.iter_mut()) {
            *ticks = if viewport.contains(p.screen) { *ticks + 1 } else { 0 };
        }
    }

    let mut settled = 0;
    for (p, &ticks) in engine.particles().iter().zip(&synced) {
        if ticks < 100 {
            continue;
        }
        for (got, want) in [(p.color.r, target.r), (p.color.g, target.g), (p.color.b, target.b)] {
            assert!((got - want).abs() <= 1.0, "{:?} after {} ticks", p.color, ticks);
        }
        settled += 1;
    }
    assert!(settled > 0);
}
