//! Intensity classification: continuous signal in, presentation tiers out.
//!
//! Every observer runs the same pure function over the replicated intensity,
//! so two replicas holding the same value always agree on the rain level,
//! the fog density, and the resource key the renderer/audio side looks up.

use serde::{Deserialize, Serialize};

use crate::storm::{MAX_INTENSITY, MIN_INTENSITY};

/// Fog lift added to the intensity before squaring, so even a barely-active
/// storm produces a trace of haze.
pub const FOG_EPSILON: f32 = 0.01;

/// Scale applied to the squared lifted intensity to obtain fog density.
pub const FOG_SCALE: f32 = 0.13;

/// Upper bound (exclusive) of the `Calm` tier.
pub const CALM_MAX: f32 = 0.1;

/// Upper bound (exclusive) of the `Light` tier.
pub const LIGHT_MAX: f32 = 0.33;

/// Upper bound (exclusive) of the `Normal` tier.
pub const NORMAL_MAX: f32 = 0.66;

/// Discrete rain tiers derived from the continuous intensity signal.
///
/// The ordering `None < Calm < Light < Normal < Heavy` is part of the
/// contract: classification is monotonic in intensity. `Disabled` sits below
/// all of them as the "partition not managed, use stock behavior" sentinel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RainLevel {
    /// Weather simulation does not manage this partition.
    Disabled,
    /// No rain.
    None,
    /// A drizzle barely worth an umbrella.
    Calm,
    Light,
    Normal,
    /// Downpour.
    Heavy,
}

impl RainLevel {
    /// Human-readable name for logs and UI.
    pub fn name(self) -> &'static str {
        match self {
            RainLevel::Disabled => "Disabled",
            RainLevel::None => "None",
            RainLevel::Calm => "Calm",
            RainLevel::Light => "Light",
            RainLevel::Normal => "Normal",
            RainLevel::Heavy => "Heavy",
        }
    }

    /// Key the presentation collaborators use to select textures and sound
    /// banks. A pure function of the tier alone.
    pub fn resource_key(self) -> &'static str {
        match self {
            RainLevel::Disabled => "disabled",
            RainLevel::None => "rain_none",
            RainLevel::Calm => "rain_calm",
            RainLevel::Light => "rain_light",
            RainLevel::Normal => "rain_normal",
            RainLevel::Heavy => "rain_heavy",
        }
    }
}

/// Presentation state derived from one intensity sample. Never persisted:
/// always recomputed from the replicated intensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub level: RainLevel,
    /// Fog density, `(intensity + 0.01)^2 * 0.13`, always `>= 0`.
    pub fog_density: f32,
    /// Texture/sound lookup key, a pure function of `level`.
    pub resource_key: &'static str,
}

impl Default for Classification {
    fn default() -> Self {
        classify(0.0, false)
    }
}

/// Classify an intensity sample into presentation state.
///
/// Pure and deterministic: no hidden state, so every observer computes the
/// same result from the same inputs. `disabled` is the "partition not
/// managed" sentinel and short-circuits to the `Disabled` tier with zero fog.
/// Out-of-domain intensities are clamped; NaN collapses to zero.
pub fn classify(intensity: f32, disabled: bool) -> Classification {
    if disabled {
        return Classification {
            level: RainLevel::Disabled,
            fog_density: 0.0,
            resource_key: RainLevel::Disabled.resource_key(),
        };
    }

    let intensity = if intensity.is_nan() {
        0.0
    } else {
        intensity.clamp(MIN_INTENSITY, MAX_INTENSITY)
    };

    let lifted = intensity + FOG_EPSILON;
    let fog_density = lifted * lifted * FOG_SCALE;

    let level = if intensity <= 0.0 {
        RainLevel::None
    } else if intensity < CALM_MAX {
        RainLevel::Calm
    } else if intensity < LIGHT_MAX {
        RainLevel::Light
    } else if intensity < NORMAL_MAX {
        RainLevel::Normal
    } else {
        RainLevel::Heavy
    };

    Classification {
        level,
        fog_density,
        resource_key: level.resource_key(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_exactness() {
        assert_eq!(classify(0.0, false).level, RainLevel::None);
        assert_eq!(classify(0.09999, false).level, RainLevel::Calm);
        assert_eq!(classify(0.1, false).level, RainLevel::Light);
        assert_eq!(classify(0.32999, false).level, RainLevel::Light);
        assert_eq!(classify(0.33, false).level, RainLevel::Normal);
        assert_eq!(classify(0.65999, false).level, RainLevel::Normal);
        assert_eq!(classify(0.66, false).level, RainLevel::Heavy);
    }

    #[test]
    fn classification_is_monotonic() {
        let mut prev = classify(0.0, false).level;
        for step in 1..=1000 {
            let level = classify(step as f32 / 1000.0, false).level;
            assert!(
                level >= prev,
                "level regressed at intensity {}: {:?} < {:?}",
                step as f32 / 1000.0,
                level,
                prev
            );
            prev = level;
        }
        assert_eq!(prev, RainLevel::Heavy);
    }

    #[test]
    fn every_tier_is_reachable() {
        let levels: Vec<RainLevel> = [0.0, 0.05, 0.2, 0.5, 0.9]
            .iter()
            .map(|&i| classify(i, false).level)
            .collect();
        assert_eq!(
            levels,
            vec![
                RainLevel::None,
                RainLevel::Calm,
                RainLevel::Light,
                RainLevel::Normal,
                RainLevel::Heavy
            ]
        );
    }

    #[test]
    fn fog_density_formula() {
        for &i in &[0.0_f32, 0.1, 0.33, 0.5, 0.66, 1.0] {
            let expected = (i + 0.01) * (i + 0.01) * 0.13;
            let got = classify(i, false).fog_density;
            assert!(
                (got - expected).abs() < 1e-6,
                "fog({}) = {}, expected {}",
                i,
                got,
                expected
            );
        }
    }

    #[test]
    fn disabled_sentinel() {
        let c = classify(0.75, true);
        assert_eq!(c.level, RainLevel::Disabled);
        assert_eq!(c.fog_density, 0.0);
        assert_eq!(c.resource_key, "disabled");
    }

    #[test]
    fn out_of_domain_intensity_is_clamped() {
        assert_eq!(classify(1.5, false).level, RainLevel::Heavy);
        assert_eq!(classify(-0.5, false).level, RainLevel::None);
        let top = classify(1.5, false).fog_density;
        let exact = classify(1.0, false).fog_density;
        assert!((top - exact).abs() < 1e-6);
    }

    #[test]
    fn non_finite_intensity_is_sanitized() {
        assert_eq!(classify(f32::NAN, false).level, RainLevel::None);
        assert_eq!(classify(f32::INFINITY, false).level, RainLevel::Heavy);
        assert_eq!(classify(f32::NEG_INFINITY, false).level, RainLevel::None);
    }

    #[test]
    fn resource_keys_follow_tier() {
        assert_eq!(RainLevel::None.resource_key(), "rain_none");
        assert_eq!(RainLevel::Calm.resource_key(), "rain_calm");
        assert_eq!(RainLevel::Light.resource_key(), "rain_light");
        assert_eq!(RainLevel::Normal.resource_key(), "rain_normal");
        assert_eq!(RainLevel::Heavy.resource_key(), "rain_heavy");
        for &i in &[0.2_f32, 0.5, 0.9] {
            let c = classify(i, false);
            assert_eq!(c.resource_key, c.level.resource_key());
        }
    }

    #[test]
    fn default_classification_is_quiet() {
        let c = Classification::default();
        assert_eq!(c.level, RainLevel::None);
        assert!(c.fog_density < 0.001);
    }
}
