//! Keyboard bindings and input handling.
//!
//! Centralizes all keyboard shortcuts and how the engine settings they touch
//! are stepped and clamped.

use nannou::prelude::*;

use crate::engine::ParticleEngine;

/// Particles added or removed per key press
const COUNT_STEP: usize = 10;
const MAX_PARTICLES: usize = 2000;
/// Pixels added or removed from the connection distance per key press
const DISTANCE_STEP: f32 = 10.0;
const MAX_DISTANCE: f32 = 600.0;
const MAX_CONNECTIONS: usize = 12;

/// Actions that can be triggered by key presses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // App-level
    Quit,
    TogglePause,
    ToggleDebug,

    // Engine settings
    MoreParticles,
    FewerParticles,
    LongerReach,
    ShorterReach,
    MoreConnections,
    FewerConnections,
    CycleColorPolicy,
}

/// Parse a key into an action
pub fn parse_key(key: Key) -> Option<Action> {
    match key {
        Key::Q => Some(Action::Quit),
        Key::Space => Some(Action::TogglePause),
        Key::D => Some(Action::ToggleDebug),
        Key::Up => Some(Action::MoreParticles),
        Key::Down => Some(Action::FewerParticles),
        Key::Right => Some(Action::LongerReach),
        Key::Left => Some(Action::ShorterReach),
        Key::RBracket => Some(Action::MoreConnections),
        Key::LBracket => Some(Action::FewerConnections),
        Key::C => Some(Action::CycleColorPolicy),
        _ => None,
    }
}

/// Apply a settings action to the engine.
///
/// Returns the notification text for actions that changed a setting, `None`
/// for actions the engine does not handle.
pub fn apply_to_engine(action: Action, engine: &mut ParticleEngine) -> Option<String> {
    match action {
        Action::MoreParticles | Action::FewerParticles => {
            let current = engine.particle_count();
            let count = if action == Action::MoreParticles {
                (current + COUNT_STEP).min(MAX_PARTICLES)
            } else {
                current.saturating_sub(COUNT_STEP)
            };
            engine.set_particle_count(count);
            Some(format!("Particles: {}", count))
        }
        Action::LongerReach | Action::ShorterReach => {
            let current = engine.config().connection_distance;
            let distance = if action == Action::LongerReach {
                (current + DISTANCE_STEP).min(MAX_DISTANCE)
            } else {
                (current - DISTANCE_STEP).max(0.0)
            };
            engine.set_connection_distance(distance);
            Some(format!("Connection distance: {:.0}px", distance))
        }
        Action::MoreConnections | Action::FewerConnections => {
            let current = engine.config().max_connections;
            let max = if action == Action::MoreConnections {
                (current + 1).min(MAX_CONNECTIONS)
            } else {
                current.saturating_sub(1)
            };
            engine.set_max_connections(max);
            Some(format!("Max connections: {}", max))
        }
        Action::CycleColorPolicy => {
            let policy = engine.config().color_policy.next();
            engine.set_color_policy(policy);
            Some(format!("Color: {}", policy.name()))
        }
        Action::Quit | Action::TogglePause | Action::ToggleDebug => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ColorPolicy, EngineConfig};
    use neural_field_api::Viewport;

    fn engine(count: usize) -> ParticleEngine {
        let config = EngineConfig {
            particle_count: count,
            ..Default::default()
        };
        ParticleEngine::with_seed(config, Viewport::default(), 4)
    }

    #[test]
    fn test_parse_key_mapping() {
        assert_eq!(parse_key(Key::Q), Some(Action::Quit));
        assert_eq!(parse_key(Key::LBracket), Some(Action::FewerConnections));
        assert_eq!(parse_key(Key::C), Some(Action::CycleColorPolicy));
        assert_eq!(parse_key(Key::Z), None);
    }

    #[test]
    fn test_particle_count_steps_and_floors_at_zero() {
        let mut engine = engine(5);
        let msg = apply_to_engine(Action::FewerParticles, &mut engine);
        assert_eq!(msg.as_deref(), Some("Particles: 0"));
        assert_eq!(engine.particle_count(), 0);

        apply_to_engine(Action::MoreParticles, &mut engine);
        apply_to_engine(Action::MoreParticles, &mut engine);
        assert_eq!(engine.particle_count(), 20);
    }

    #[test]
    fn test_reach_and_degree_are_clamped() {
        let mut engine = engine(0);
        for _ in 0..100 {
            apply_to_engine(Action::LongerReach, &mut engine);
            apply_to_engine(Action::MoreConnections, &mut engine);
        }
        assert_eq!(engine.config().connection_distance, MAX_DISTANCE);
        assert_eq!(engine.config().max_connections, MAX_CONNECTIONS);

        for _ in 0..100 {
            apply_to_engine(Action::ShorterReach, &mut engine);
            apply_to_engine(Action::FewerConnections, &mut engine);
        }
        assert_eq!(engine.config().connection_distance, 0.0);
        assert_eq!(engine.config().max_connections, 0);
    }

    #[test]
    fn test_color_policy_cycles() {
        let mut engine = engine(0);
        let msg = apply_to_engine(Action::CycleColorPolicy, &mut engine);
        assert_eq!(engine.config().color_policy, ColorPolicy::Direct);
        assert_eq!(msg.as_deref(), Some("Color: direct"));
    }

    #[test]
    fn test_app_actions_are_not_engine_settings() {
        let mut engine = engine(0);
        assert!(apply_to_engine(Action::TogglePause, &mut engine).is_none());
    }
}
