//! Easing curves for tweens and sweeps.

use serde::{Deserialize, Serialize};

/// Easing applied to a linear factor in `0..=1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    #[default]
    Linear,
    Smoothstep,
    QuadIn,
    QuadOut,
    QuadInOut,
    SineInOut,
    CubicOut,
}

impl Ease {
    /// Apply easing to `t` (clamped to `0..=1`)
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Smoothstep => t * t * (3.0 - 2.0 * t),
            Self::QuadIn => t * t,
            Self::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::SineInOut => -((std::f32::consts::PI * t).cos() - 1.0) / 2.0,
            Self::CubicOut => 1.0 - (1.0 - t).powi(3),
        }
    }
}
