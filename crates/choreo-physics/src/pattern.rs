// ─────────────────────────────────────────────────────────────────────
// Rotor Choreography — Pattern Engine
// ─────────────────────────────────────────────────────────────────────
//! Maps (time, pattern, frequency source) to the natural-frequency
//! vector Ω_i fed into the next integration step.
//!
//!   UNISON           Ω_i = Ω_b
//!   FAN_SYMMETRIC    Ω_i = Ω_b + d_i·Ω_spread,   d_i = (i − mid)/mid
//!   GROUPS_2         Ω_i = Ω_b ± Ω_k              (even +, odd −)
//!   WAVE_PHASE       Ω_i = Ω_b + Ω_amp·sin(2π f_w t + 2π i/N)
//!   CHASE            Ω_idx = Ω_b + Ω_c,  others Ω_b − 0.2·Ω_c
//!   RENDEZVOUS_LOCK  Ω_i = Ω_b + clamp(1.2·Δ(0, θ_i), ±Ω_s(t))
//!
//! Both deployment variants run through the same formulas; the only
//! difference is how [`PatternAmplitudes`] are resolved from the
//! [`FrequencySource`].

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use choreo_types::{clamp_control, FrequencySource, Pattern};

use crate::units::{
    clamp, map_range, signed_angular_delta, smoothstep, steps_per_sec_to_rad_per_sec, wrap_angle,
};

/// Seconds the CHASE highlight dwells on one unit.
pub const CHASE_DWELL_S: f64 = 0.25;
/// Share of the CHASE boost subtracted from the non-highlighted units.
pub const CHASE_TRAIL_RATIO: f64 = 0.2;
/// RENDEZVOUS_LOCK window length.
pub const RENDEZVOUS_PERIOD_S: f64 = 5.0;
/// Window fraction where the correction ramp starts and saturates.
pub const RENDEZVOUS_RAMP: (f64, f64) = (0.65, 1.0);
/// Proportional gain on the phase error toward 0.
pub const RENDEZVOUS_GAIN: f64 = 1.2;

/// Pattern amplitudes in motor units (steps/s), wave rate in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternAmplitudes {
    pub base_sps: f64,
    pub fan_spread_sps: f64,
    pub groups_sps: f64,
    pub wave_amp_sps: f64,
    pub wave_hz: f64,
    pub chase_amp_sps: f64,
    pub rendezvous_sps: f64,
}

impl PatternAmplitudes {
    /// Literal amplitudes of the fixed-base variant.
    pub fn fixed(base_sps: f64) -> Self {
        Self {
            base_sps,
            fan_spread_sps: 1200.0,
            groups_sps: 1000.0,
            wave_amp_sps: 800.0,
            wave_hz: 0.35,
            chase_amp_sps: 1400.0,
            rendezvous_sps: 900.0,
        }
    }

    /// Amplitudes interpolated from a control value P ∈ [0, 100].
    pub fn from_control(p: f64) -> Self {
        let p = clamp_control(p);
        let lerp = |lo: f64, hi: f64| map_range(p, 0.0, 100.0, lo, hi);
        Self {
            base_sps: lerp(2200.0, 4200.0),
            fan_spread_sps: lerp(0.0, 1400.0),
            groups_sps: lerp(0.0, 1200.0),
            wave_amp_sps: lerp(0.0, 900.0),
            wave_hz: lerp(0.15, 0.8),
            chase_amp_sps: lerp(400.0, 1600.0),
            rendezvous_sps: 900.0,
        }
    }

    pub fn resolve(source: &FrequencySource) -> Self {
        match *source {
            FrequencySource::ControlDriven { control } => Self::from_control(control),
            FrequencySource::FixedBase { base_sps } => Self::fixed(base_sps),
        }
    }
}

/// Stateless natural-frequency generator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PatternEngine {
    pub pattern: Pattern,
    pub source: FrequencySource,
}

impl PatternEngine {
    pub fn new(pattern: Pattern, source: FrequencySource) -> Self {
        Self { pattern, source }
    }

    pub fn amplitudes(&self) -> PatternAmplitudes {
        PatternAmplitudes::resolve(&self.source)
    }

    /// Base angular frequency Ω_b (rad/s).
    pub fn base_omega(&self, steps_per_revolution: f64) -> f64 {
        steps_per_sec_to_rad_per_sec(self.amplitudes().base_sps, steps_per_revolution)
    }

    /// RENDEZVOUS_LOCK correction ceiling (rad/s) at time `t`.
    pub fn rendezvous_strength(&self, t: f64, steps_per_revolution: f64) -> f64 {
        let window = (t % RENDEZVOUS_PERIOD_S) / RENDEZVOUS_PERIOD_S;
        let ramp = smoothstep(RENDEZVOUS_RAMP.0, RENDEZVOUS_RAMP.1, window);
        steps_per_sec_to_rad_per_sec(ramp * self.amplitudes().rendezvous_sps, steps_per_revolution)
    }

    /// Index currently highlighted by CHASE.
    pub fn chase_index(t: f64, n: usize) -> usize {
        ((t / CHASE_DWELL_S) % n as f64).floor().max(0.0) as usize
    }

    /// Fill `out` with Ω_i at time `t`.
    ///
    /// `phases` is only read by RENDEZVOUS_LOCK. `out.len()` sets N.
    pub fn apply(&self, t: f64, phases: &[f64], steps_per_revolution: f64, out: &mut [f64]) {
        let n = out.len();
        if n == 0 {
            return;
        }
        let amps = self.amplitudes();
        let to_omega = |sps: f64| steps_per_sec_to_rad_per_sec(sps, steps_per_revolution);
        let base = to_omega(amps.base_sps);

        match self.pattern {
            Pattern::Unison => out.iter_mut().for_each(|w| *w = base),

            Pattern::FanSymmetric => {
                let spread = to_omega(amps.fan_spread_sps);
                let mid = (n as f64 - 1.0) / 2.0;
                for (i, w) in out.iter_mut().enumerate() {
                    // a single unit has no fan to spread
                    let d = if mid > 0.0 { (i as f64 - mid) / mid } else { 0.0 };
                    *w = base + d * spread;
                }
            }

            Pattern::Groups2 => {
                let k = to_omega(amps.groups_sps);
                for (i, w) in out.iter_mut().enumerate() {
                    *w = if i % 2 == 0 { base + k } else { base - k };
                }
            }

            Pattern::WavePhase => {
                let amp = to_omega(amps.wave_amp_sps);
                let omega_t = TAU * amps.wave_hz;
                for (i, w) in out.iter_mut().enumerate() {
                    let offset = (TAU * i as f64) / n as f64;
                    *w = base + amp * (omega_t * t + offset).sin();
                }
            }

            Pattern::Chase => {
                let boost = to_omega(amps.chase_amp_sps);
                let idx = Self::chase_index(t, n);
                for (i, w) in out.iter_mut().enumerate() {
                    *w = if i == idx {
                        base + boost
                    } else {
                        base - boost * CHASE_TRAIL_RATIO
                    };
                }
            }

            Pattern::RendezvousLock => {
                let strength = self.rendezvous_strength(t, steps_per_revolution);
                for (i, w) in out.iter_mut().enumerate() {
                    let theta = phases.get(i).copied().unwrap_or(0.0);
                    let err = signed_angular_delta(0.0, wrap_angle(theta));
                    *w = base + clamp(err * RENDEZVOUS_GAIN, -strength, strength);
                }
            }
        }
    }

    /// Convenience wrapper returning a fresh vector.
    pub fn frequencies(&self, t: f64, phases: &[f64], steps_per_revolution: f64) -> Vec<f64> {
        let mut out = vec![0.0; phases.len()];
        self.apply(t, phases, steps_per_revolution, &mut out);
        out
    }
}
