// ─────────────────────────────────────────────────────────────────────
// Rotor Choreography — Units & Conversion
// ─────────────────────────────────────────────────────────────────────
//! Pure conversions between rad/s, motor steps/s and cumulative step
//! position, plus the angle helpers the integrator depends on.
//!
//! Everything here is stateless and deterministic.

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

/// Saturate `v` into `[lo, hi]`.
///
/// Unlike `f64::clamp` this never panics on an inverted window; a NaN
/// input resolves to `hi` and then `lo`.
#[inline]
pub fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.min(hi).max(lo)
}

/// Reduce an angle into `[0, 2π)`.
#[inline]
pub fn wrap_angle(x: f64) -> f64 {
    let mut r = x % TAU;
    if r < 0.0 {
        r += TAU;
    }
    // -ε + 2π can round up to exactly 2π
    if r >= TAU {
        r = 0.0;
    }
    r
}

/// Minimal-magnitude phase difference `new - old`, unwrapped into `(-π, π]`.
#[inline]
pub fn signed_angular_delta(new: f64, old: f64) -> f64 {
    let mut d = (new - old) % TAU;
    if !d.is_finite() {
        return d;
    }
    while d > PI {
        d -= TAU;
    }
    while d <= -PI {
        d += TAU;
    }
    d
}

#[inline]
pub fn rad_per_sec_to_steps_per_sec(w: f64, steps_per_revolution: f64) -> f64 {
    (w * steps_per_revolution) / TAU
}

#[inline]
pub fn steps_per_sec_to_rad_per_sec(sps: f64, steps_per_revolution: f64) -> f64 {
    (sps * TAU) / steps_per_revolution
}

/// Steps travelled during one tick at a constant `sps`.
#[inline]
pub fn steps_per_sec_to_delta_steps(sps: f64, step_size: f64) -> f64 {
    sps * step_size
}

/// Cumulative step position folded into `[0, steps_per_revolution)`.
/// Display only; the cumulative value stays authoritative.
#[inline]
pub fn wrap_steps(pos: f64, steps_per_revolution: f64) -> f64 {
    let mut x = pos % steps_per_revolution;
    if x < 0.0 {
        x += steps_per_revolution;
    }
    if x >= steps_per_revolution {
        x = 0.0;
    }
    x
}

/// C¹ ease: `t²(3 − 2t)` with `t` clamped to `[0, 1]`.
#[inline]
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = clamp((x - edge0) / (edge1 - edge0), 0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Linear map of `x` from `[in_min, in_max]` onto `[out_min, out_max]`,
/// saturating at both ends.
#[inline]
pub fn map_range(x: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    let u = clamp((x - in_min) / (in_max - in_min), 0.0, 1.0);
    out_min + u * (out_max - out_min)
}

/// Radians → motor steps policy: steps/rev, global speed scale and the
/// signed speed window.
///
/// The integrator and the output projection both go through
/// [`MotorMapping::motor_sps`], so the clamp is applied identically.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorMapping {
    pub steps_per_revolution: f64,
    pub min_steps_per_sec: f64,
    pub max_steps_per_sec: f64,
    pub speed_scale: f64,
}

impl Default for MotorMapping {
    fn default() -> Self {
        Self {
            steps_per_revolution: 3200.0,
            min_steps_per_sec: -5200.0,
            max_steps_per_sec: 5200.0,
            speed_scale: 1.0,
        }
    }
}

impl MotorMapping {
    /// Signed, scaled and clamped motor speed for an angular velocity.
    #[inline]
    pub fn motor_sps(&self, omega: f64) -> f64 {
        let sps = rad_per_sec_to_steps_per_sec(omega, self.steps_per_revolution) * self.speed_scale;
        clamp(sps, self.min_steps_per_sec, self.max_steps_per_sec)
    }

    #[inline]
    pub fn wrap(&self, pos: f64) -> f64 {
        wrap_steps(pos, self.steps_per_revolution)
    }
}
