//! Pluggable strategies for color, spawning and connections.

use neural_field_api::Rgb;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Above this brightness `InvertBright` switches to the negative
const INVERT_BRIGHTNESS: f32 = 180.0;
/// Darkening applied to the negative of bright samples
const INVERT_DARKEN: f32 = 0.8;
/// Contrast stretch around mid-grey for `Inverted`
const INVERT_CONTRAST: f32 = 1.5;
const MID_GREY: f32 = 128.0;

/// How a sampled video color becomes a particle's target color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorPolicy {
    /// Multiply by the brightness boost
    #[default]
    Boosted,
    /// Use the sample as-is
    Direct,
    /// Photographic negative with a contrast stretch
    Inverted,
    /// Negative on bright backgrounds, boosted everywhere else
    InvertBright,
}

impl ColorPolicy {
    pub const ALL: [ColorPolicy; 4] = [
        ColorPolicy::Boosted,
        ColorPolicy::Direct,
        ColorPolicy::Inverted,
        ColorPolicy::InvertBright,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ColorPolicy::Boosted => "boosted",
            ColorPolicy::Direct => "direct",
            ColorPolicy::Inverted => "inverted",
            ColorPolicy::InvertBright => "invert_bright",
        }
    }

    /// Next policy in cycle order
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Transform a sample into a target color, then lift it to `floor`
    pub fn target(self, sample: Rgb, boost: f32, floor: f32) -> Rgb {
        let color = match self {
            ColorPolicy::Boosted => sample.map(|c| c * boost),
            ColorPolicy::Direct => sample,
            ColorPolicy::Inverted => {
                sample.map(|c| (255.0 - c - MID_GREY) * INVERT_CONTRAST + MID_GREY)
            }
            ColorPolicy::InvertBright => {
                if sample.brightness() > INVERT_BRIGHTNESS {
                    sample.map(|c| (255.0 - c) * INVERT_DARKEN)
                } else {
                    sample.map(|c| c * boost)
                }
            }
        };
        apply_floor(color.clamped(), floor)
    }
}

/// Raise a too-dark color so its brightness reaches `floor`, preserving hue
/// offsets between channels.
pub fn apply_floor(color: Rgb, floor: f32) -> Rgb {
    let lift = floor.clamp(0.0, 255.0) - color.brightness();
    if lift <= 0.0 {
        return color;
    }
    color.map(|c| c + lift).clamped()
}

/// Where new particles appear laterally
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnDistribution {
    /// Anywhere in the view frustum
    #[default]
    Uniform,
    /// Triangular, denser near the optical axis
    Centered,
    /// Annulus around the center
    Ring,
}

impl SpawnDistribution {
    /// Normalized lateral offset, each axis in [-0.5, 0.5]
    pub fn sample(self, rng: &mut impl Rng) -> (f32, f32) {
        match self {
            SpawnDistribution::Uniform => {
                (rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5)
            }
            SpawnDistribution::Centered => {
                let mut tri = || (rng.random::<f32>() + rng.random::<f32>()) * 0.5 - 0.5;
                (tri(), tri())
            }
            SpawnDistribution::Ring => {
                let theta = rng.random_range(0.0..std::f32::consts::TAU);
                let radius = rng.random_range(0.3..0.5);
                (theta.cos() * radius, theta.sin() * radius)
            }
        }
    }
}

/// How neighbor candidates are gathered for the connection graph
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPolicy {
    /// Each particle only looks at later particles in the pool
    #[default]
    Forward,
    /// Each particle looks at every other particle; a pair is linked once
    Mutual,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_boost_clamps_to_255() {
        let out = ColorPolicy::Boosted.target(Rgb::new(200.0, 100.0, 50.0), 1.3, 0.0);
        assert_eq!(out.r, 255.0);
        assert!((out.g - 130.0).abs() < 1e-3);
        assert!((out.b - 65.0).abs() < 1e-3);
    }

    #[test]
    fn test_invert_bright_turns_white_dark() {
        let out = ColorPolicy::InvertBright.target(Rgb::splat(250.0), 1.3, 0.0);
        assert!((out.r - 4.0).abs() < 1e-4);

        // Dark samples get the boost instead
        let out = ColorPolicy::InvertBright.target(Rgb::splat(100.0), 1.3, 0.0);
        assert!((out.r - 130.0).abs() < 1e-4);
    }

    #[test]
    fn test_inverted_stretches_contrast() {
        // 255 - 28 = 227 -> (227 - 128) * 1.5 + 128 = 276.5 -> clamped
        let out = ColorPolicy::Inverted.target(Rgb::splat(28.0), 1.3, 0.0);
        assert_eq!(out, Rgb::WHITE);

        // Mid-grey stays mid-grey-ish
        let out = ColorPolicy::Inverted.target(Rgb::splat(127.0), 1.3, 0.0);
        assert!((out.r - 128.0).abs() < 1e-4);
    }

    #[test]
    fn test_floor_applies_after_every_policy() {
        for policy in ColorPolicy::ALL {
            let out = policy.target(Rgb::BLACK, 1.3, 40.0);
            assert!(out.brightness() >= 40.0 - 1e-4, "{policy:?} gave {out:?}");
        }
    }

    #[test]
    fn test_floor_keeps_bright_colors() {
        let c = Rgb::new(90.0, 60.0, 30.0);
        assert_eq!(apply_floor(c, 40.0), c);
    }

    #[test]
    fn test_policy_cycle_wraps() {
        let mut p = ColorPolicy::default();
        for _ in 0..ColorPolicy::ALL.len() {
            p = p.next();
        }
        assert_eq!(p, ColorPolicy::default());
    }

    #[test]
    fn test_spawn_offsets_stay_in_unit_box() {
        let mut rng = StdRng::seed_from_u64(7);
        for dist in [
            SpawnDistribution::Uniform,
            SpawnDistribution::Centered,
            SpawnDistribution::Ring,
        ] {
            for _ in 0..500 {
                let (u, v) = dist.sample(&mut rng);
                assert!((-0.5..=0.5).contains(&u) && (-0.5..=0.5).contains(&v));
            }
        }
    }

    #[test]
    fn test_ring_avoids_center() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let (u, v) = SpawnDistribution::Ring.sample(&mut rng);
            assert!((u * u + v * v).sqrt() >= 0.3 - 1e-5);
        }
    }
}
