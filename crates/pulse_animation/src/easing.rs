//! Easing curves
//!
//! Every curve maps progress in 0.0..=1.0 to an eased value, with
//! `apply(0.0) == 0.0` and `apply(1.0) == 1.0` for the built-in variants.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Progress-to-value curve used for pulse opacity and scale
///
/// Serialized as a snake_case name (`"ease_in"`) or, for the parameterized
/// variants, a single-key table (`{ accelerate = 1.5 }`).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Constant rate
    #[default]
    Linear,
    /// Quadratic acceleration (`t²`)
    EaseIn,
    /// Quadratic deceleration
    EaseOut,
    /// Slow start and end, fast middle (cosine curve)
    EaseInOut,
    /// Cubic acceleration (`t³`)
    EaseInCubic,
    /// Cubic deceleration
    EaseOutCubic,
    /// `t^(2 * factor)`; a factor of 1.0 matches [`Easing::EaseIn`]
    Accelerate(f32),
    /// `1 - (1 - t)^(2 * factor)`; a factor of 1.0 matches [`Easing::EaseOut`]
    Decelerate(f32),
    /// Caller-supplied curve (not serializable)
    #[serde(skip)]
    Custom(fn(f32) -> f32),
}

impl Easing {
    /// Evaluate the curve at `t`
    ///
    /// `t` is not clamped here; callers decide how to treat out-of-range
    /// progress.
    pub fn apply(&self, t: f32) -> f32 {
        match *self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => ((t + 1.0) * PI).cos() / 2.0 + 0.5,
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
            Easing::Accelerate(factor) => {
                if factor == 1.0 {
                    t * t
                } else {
                    t.powf(2.0 * factor)
                }
            }
            Easing::Decelerate(factor) => {
                if factor == 1.0 {
                    1.0 - (1.0 - t) * (1.0 - t)
                } else {
                    1.0 - (1.0 - t).powf(2.0 * factor)
                }
            }
            Easing::Custom(f) => f(t),
        }
    }
}
