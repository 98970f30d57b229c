//! Configuration file management.
//!
//! Loads user preferences from `~/.neural-field.toml` (or the path given with
//! `--config`). Every key is optional; missing keys fall back to the engine
//! and extractor defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use neural_field_api::BlendMode;

use crate::audio::ExtractorConfig;
use crate::engine::{ColorPolicy, ConnectionPolicy, EngineConfig, SpawnDistribution};
use crate::video::{DEFAULT_FPS, DEFAULT_SAMPLE_SCALE};

const CONFIG_FILE: &str = ".neural-field.toml";
const DEFAULT_DEVICE_TIMEOUT_SECS: u64 = 3;

const CONFIG_TEMPLATE: &str = r#"# neural-field configuration file

# =============================================================================
# Particles
# =============================================================================

# particle_count = 80
# trail_length = 10              # Screen positions kept per particle
# spawn_distribution = "uniform" # uniform | centered | ring

# Pseudo-3D projection
# fov = 400
# near_plane = 10
# far_plane = 1200

# =============================================================================
# Connections
# =============================================================================

# connection_distance = 130      # Pixels, widened by bass
# max_connections = 4            # Outgoing edges per particle
# connection_policy = "forward"  # forward | mutual

# =============================================================================
# Color
# =============================================================================

# color_policy = "boosted"       # boosted | direct | inverted | invert_bright
# brightness_boost = 1.3
# brightness_floor = 40          # 0-255
# scene_cut_threshold = 50       # Channel delta that snaps colors faster
# fast_color_rate = 0.55
# slow_color_rate = 0.08
# glow_blend = "normal"          # normal | additive

# =============================================================================
# Video
# =============================================================================

# sample_scale = 0.2             # Color grid resolution relative to the video
# frames_fps = 30                # Playback rate of image sequences

# =============================================================================
# Audio
# =============================================================================

# audio_device = "Device Name"
# device_timeout_secs = 3        # Timeout when querying a device config
# impact_threshold = 0.15        # Bass rise per tick that counts as a hit
# min_level = 0.05               # Level above which audio counts as playing
"#;

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    // Engine
    pub particle_count: Option<usize>,
    pub connection_distance: Option<f32>,
    pub max_connections: Option<usize>,
    pub trail_length: Option<usize>,
    pub fov: Option<f32>,
    pub near_plane: Option<f32>,
    pub far_plane: Option<f32>,
    pub color_policy: Option<ColorPolicy>,
    pub brightness_boost: Option<f32>,
    pub brightness_floor: Option<f32>,
    pub scene_cut_threshold: Option<f32>,
    pub fast_color_rate: Option<f32>,
    pub slow_color_rate: Option<f32>,
    pub spawn_distribution: Option<SpawnDistribution>,
    pub connection_policy: Option<ConnectionPolicy>,
    pub glow_blend: Option<BlendMode>,

    // Video
    pub sample_scale: Option<f32>,
    pub frames_fps: Option<f32>,

    // Audio
    pub impact_threshold: Option<f32>,
    pub min_level: Option<f32>,
    pub audio_device: Option<String>,
    pub device_timeout_secs: Option<u64>,
}

impl Config {
    fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_FILE))
    }

    /// Load from `path`, or the default location when `None`.
    pub fn load(path: Option<&Path>) -> Self {
        match path {
            Some(p) => Self::load_from(p),
            None => match Self::default_path() {
                Some(p) => Self::load_from(&p),
                None => {
                    warn!("No home directory, using default settings");
                    Self::default()
                }
            },
        }
    }

    /// Load a config file, writing the commented template first when it is
    /// missing. Unreadable or invalid files yield the defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            match fs::write(path, CONFIG_TEMPLATE) {
                Ok(()) => info!("Created config template at {:?}", path),
                Err(e) => warn!("Could not write config template to {:?}: {}", path, e),
            }
        }

        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Could not read config {:?}: {}", path, e);
                return Self::default();
            }
        };

        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("Invalid config {:?}, using defaults: {}", path, e);
                Self::default()
            }
        }
    }

    /// Engine settings with defaults for every missing key
    pub fn engine(&self) -> EngineConfig {
        let d = EngineConfig::default();
        EngineConfig {
            particle_count: self.particle_count.unwrap_or(d.particle_count),
            connection_distance: self.connection_distance.unwrap_or(d.connection_distance),
            max_connections: self.max_connections.unwrap_or(d.max_connections),
            trail_length: self.trail_length.unwrap_or(d.trail_length),
            fov: self.fov.unwrap_or(d.fov),
            near_plane: self.near_plane.unwrap_or(d.near_plane),
            far_plane: self.far_plane.unwrap_or(d.far_plane),
            color_policy: self.color_policy.unwrap_or(d.color_policy),
            brightness_boost: self.brightness_boost.unwrap_or(d.brightness_boost),
            brightness_floor: self.brightness_floor.unwrap_or(d.brightness_floor),
            scene_cut_threshold: self.scene_cut_threshold.unwrap_or(d.scene_cut_threshold),
            fast_color_rate: self.fast_color_rate.unwrap_or(d.fast_color_rate),
            slow_color_rate: self.slow_color_rate.unwrap_or(d.slow_color_rate),
            spawn_distribution: self.spawn_distribution.unwrap_or(d.spawn_distribution),
            connection_policy: self.connection_policy.unwrap_or(d.connection_policy),
            glow_blend: self.glow_blend.unwrap_or(d.glow_blend),
        }
    }

    pub fn extractor(&self) -> ExtractorConfig {
        let d = ExtractorConfig::default();
        ExtractorConfig {
            impact_threshold: self.impact_threshold.unwrap_or(d.impact_threshold),
            min_level: self.min_level.unwrap_or(d.min_level),
            ..d
        }
    }

    pub fn sample_scale(&self) -> f32 {
        self.sample_scale.unwrap_or(DEFAULT_SAMPLE_SCALE)
    }

    pub fn frames_fps(&self) -> f32 {
        self.frames_fps.unwrap_or(DEFAULT_FPS)
    }

    pub fn audio_device(&self) -> Option<&str> {
        self.audio_device.as_deref()
    }

    pub fn device_timeout(&self) -> Duration {
        Duration::from_secs(
            self.device_timeout_secs
                .unwrap_or(DEFAULT_DEVICE_TIMEOUT_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_writes_template_and_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load_from(&path);
        assert_eq!(config, Config::default());
        assert!(path.exists());

        // The template itself parses: every key is commented out
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, CONFIG_TEMPLATE);
        assert_eq!(config.engine(), EngineConfig::default());
    }

    #[test]
    fn test_keys_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
particle_count = 200
color_policy = "invert_bright"
spawn_distribution = "ring"
connection_policy = "mutual"
glow_blend = "additive"
impact_threshold = 0.3
sample_scale = 0.1
audio_device = "pulse"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path);
        let engine = config.engine();
        assert_eq!(engine.particle_count, 200);
        assert_eq!(engine.color_policy, ColorPolicy::InvertBright);
        assert_eq!(engine.spawn_distribution, SpawnDistribution::Ring);
        assert_eq!(engine.connection_policy, ConnectionPolicy::Mutual);
        assert_eq!(engine.glow_blend, BlendMode::Additive);
        assert_eq!(engine.max_connections, EngineConfig::default().max_connections);

        assert_eq!(config.extractor().impact_threshold, 0.3);
        assert_eq!(config.sample_scale(), 0.1);
        assert_eq!(config.audio_device(), Some("pulse"));
        assert_eq!(config.frames_fps(), DEFAULT_FPS);
    }

    #[test]
    fn test_invalid_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "particle_count = \"lots\"\n").unwrap();

        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_unknown_policy_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "color_policy = \"sepia\"\nparticle_count = 5\n").unwrap();

        assert_eq!(Config::load_from(&path).engine(), EngineConfig::default());
    }

    #[test]
    fn test_device_timeout_default() {
        assert_eq!(Config::default().device_timeout(), Duration::from_secs(3));
    }
}
