// ─────────────────────────────────────────────────────────────────────
// Rotor Choreography — Kuramoto Tick Integrator
// ─────────────────────────────────────────────────────────────────────
//! Fixed-step explicit Euler integrator for the driven Kuramoto network:
//!
//!   dθ_i/dt = Ω_i(t) + (1/N) Σ_j K_ij sin(θ_j − θ_i)
//!
//! followed by the motor pipeline:
//!
//!   ω_i   = Δ(θ_i', θ_i) / dt            (unwrapped, signed)
//!   α_i   = (ω_i − ω_i_prev) / dt
//!   sps_i = clamp(ω_i · spr/2π · scale, min, max)
//!   pos_i += sps_i · dt
//!
//! Coupling terms read a pre-step snapshot of the phases (Jacobi
//! update), so unit ordering never affects the result.

use serde::{Deserialize, Serialize};

use choreo_types::{ChoreoError, ChoreoResult};

use crate::network::OscillatorNetwork;
use crate::pattern::PatternEngine;
use crate::units::{signed_angular_delta, steps_per_sec_to_delta_steps, wrap_angle, MotorMapping};

/// Single-tick integrator. Owns the scratch snapshot only; all
/// simulation state lives in [`OscillatorNetwork`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integrator {
    /// Fixed time step (s).
    pub step_size: f64,
    pub motor: MotorMapping,
    #[serde(skip)]
    old_phase: Vec<f64>,
}

impl Integrator {
    pub fn new(step_size: f64, motor: MotorMapping) -> Self {
        Self {
            step_size,
            motor,
            old_phase: Vec::new(),
        }
    }

    /// Default parameters: dt = 0.025 s, 3200 steps/rev, ±5200 steps/s.
    pub fn default_params() -> Self {
        Self::new(0.025, MotorMapping::default())
    }

    /// Advance the network by one tick.
    ///
    /// Refuses to run, without touching any state, when the coupling
    /// matrix or a per-unit array does not match the network size.
    pub fn step(&mut self, net: &mut OscillatorNetwork, engine: &PatternEngine) -> ChoreoResult<()> {
        let n = net.size;
        if !net.coupling_matches() {
            return Err(ChoreoError::ConfigurationMismatch {
                expected: n,
                found: net.coupling.dim(),
            });
        }
        if !net.arrays_consistent() {
            return Err(ChoreoError::ConfigurationMismatch {
                expected: n,
                found: net.phase.len(),
            });
        }

        let dt = self.step_size;
        let spr = self.motor.steps_per_revolution;

        // 1. Pattern → Ω(t), evaluated at the pre-increment clock
        engine.apply(net.time, &net.phase, spr, &mut net.natural_frequency);

        // 2. Snapshot
        self.old_phase.clear();
        self.old_phase.extend_from_slice(&net.phase);
        let old = &self.old_phase;
        let n_f = n as f64;

        for i in 0..n {
            // 3. Kuramoto coupling against the snapshot
            let mut derivative = net.natural_frequency[i];
            for (j, &k) in net.coupling.row(i).iter().enumerate() {
                if k != 0.0 {
                    derivative += (k * (old[j] - old[i]).sin()) / n_f;
                }
            }
            net.phase[i] = wrap_angle(net.phase[i] + dt * derivative);

            // 4-5. Observed velocity and acceleration
            let omega = signed_angular_delta(net.phase[i], old[i]) / dt;
            net.velocity[i] = omega;
            net.acceleration[i] = (omega - net.previous_velocity[i]) / dt;
            net.previous_velocity[i] = omega;

            // 6. Motor steps, clamped speed, unclamped position
            let sps = self.motor.motor_sps(omega);
            net.motor_step_position[i] += steps_per_sec_to_delta_steps(sps, dt);
        }

        // 7. Clock
        net.time += dt;
        net.step_count += 1;
        Ok(())
    }

    /// Run multiple ticks, stopping at the first refusal.
    pub fn run(
        &mut self,
        net: &mut OscillatorNetwork,
        engine: &PatternEngine,
        n_steps: u64,
    ) -> ChoreoResult<()> {
        for _ in 0..n_steps {
            self.step(net, engine)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::CouplingMatrix;
    use crate::units::rad_per_sec_to_steps_per_sec;
    use choreo_types::{FrequencySource, Pattern};
    use std::f64::consts::{PI, TAU};

    fn unison(p: f64) -> PatternEngine {
        PatternEngine::new(Pattern::Unison, FrequencySource::control_driven(p))
    }

    #[test]
    fn test_uncoupled_unison_single_step() {
        let mut net = OscillatorNetwork::new(4, 0.0);
        let mut integ = Integrator::default_params();
        let before = net.phases().to_vec();
        integ.step(&mut net, &unison(0.0)).unwrap();

        let base = 2200.0 * TAU / 3200.0;
        assert!((base - 4.3197).abs() < 1e-4);
        for i in 0..4 {
            let advanced = net.phases()[i] - before[i];
            assert!((advanced - 0.025 * base).abs() < 1e-9, "unit {i}: {advanced}");
            assert!((net.velocities()[i] - base).abs() < 1e-6);
            assert!((net.natural_frequencies()[i] - base).abs() < 1e-12);
        }
        assert!((net.time() - 0.025).abs() < 1e-12);
        assert_eq!(net.step_count(), 1);
    }

    #[test]
    fn test_first_step_acceleration_from_rest() {
        let mut net = OscillatorNetwork::new(2, 0.0);
        let mut integ = Integrator::default_params();
        integ.step(&mut net, &unison(0.0)).unwrap();
        let base = 2200.0 * TAU / 3200.0;
        assert!((net.accelerations()[0] - base / 0.025).abs() < 1e-3);
        integ.step(&mut net, &unison(0.0)).unwrap();
        assert!(net.accelerations()[0].abs() < 1e-3);
        assert_eq!(net.previous_velocities(), net.velocities());
    }

    #[test]
    fn test_phases_bounded_over_many_steps() {
        let mut net = OscillatorNetwork::new(7, 3.0);
        let mut integ = Integrator::default_params();
        for pattern in Pattern::ALL {
            let engine = PatternEngine::new(pattern, FrequencySource::control_driven(80.0));
            integ.run(&mut net, &engine, 400).unwrap();
            assert!(net.phases().iter().all(|&th| (0.0..TAU).contains(&th)));
        }
    }

    #[test]
    fn test_in_phase_units_stay_locked() {
        let mut net = OscillatorNetwork::new(2, 2.0);
        net.override_phases(&[1.0]).unwrap();
        let mut integ = Integrator::default_params();
        integ.run(&mut net, &unison(40.0), 2000).unwrap();
        let d = signed_angular_delta(net.phases()[0], net.phases()[1]);
        assert!(d.abs() < 1e-9, "phase drift {d}");
    }

    #[test]
    fn test_coupling_pulls_units_together() {
        let mut net = OscillatorNetwork::new(6, 4.0);
        let mut integ = Integrator::default_params();
        let r0 = net.order_parameter();
        integ.run(&mut net, &unison(0.0), 400).unwrap();
        assert!(net.order_parameter() > r0, "R should rise: {r0} → {}", net.order_parameter());
    }

    #[test]
    fn test_velocity_unwrapped_across_zero() {
        let mut net = OscillatorNetwork::new(1, 0.0);
        net.override_phases(&[TAU - 0.01]).unwrap();
        let mut integ = Integrator::default_params();
        integ.step(&mut net, &unison(0.0)).unwrap();
        assert!(net.phases()[0] < 1.0, "phase wrapped past 0");
        let base = 2200.0 * TAU / 3200.0;
        assert!((net.velocities()[0] - base).abs() < 1e-6);
    }

    #[test]
    fn test_motor_speed_clamped_and_position_accumulates() {
        let mut net = OscillatorNetwork::new(3, 0.0);
        let mut integ = Integrator::new(
            0.025,
            MotorMapping {
                speed_scale: 10.0,
                ..MotorMapping::default()
            },
        );
        let engine = unison(100.0);
        let mut expected = [0.0; 3];
        for _ in 0..20 {
            integ.step(&mut net, &engine).unwrap();
            for (i, e) in expected.iter_mut().enumerate() {
                let sps = integ.motor.motor_sps(net.velocities()[i]);
                assert!((-5200.0..=5200.0).contains(&sps));
                *e += sps * 0.025;
            }
        }
        for i in 0..3 {
            assert!((net.motor_step_positions()[i] - expected[i]).abs() < 1e-6);
        }
        // 4200 sps × 10 saturates at 5200 → 130 steps per tick
        assert!((net.motor_step_positions()[0] - 20.0 * 130.0).abs() < 1e-6);
    }

    #[test]
    fn test_position_not_wrapped() {
        let mut net = OscillatorNetwork::new(1, 0.0);
        let mut integ = Integrator::default_params();
        let engine = PatternEngine::new(Pattern::Unison, FrequencySource::fixed_base(3200.0));
        integ.run(&mut net, &engine, 120).unwrap();
        // 3 s at one revolution per second
        let expected = rad_per_sec_to_steps_per_sec(TAU, 3200.0) * 3.0;
        assert!((net.motor_step_positions()[0] - expected).abs() < 1e-3);
        assert!(net.motor_step_positions()[0] > 3200.0);
    }

    #[test]
    fn test_mismatched_coupling_refused_without_mutation() {
        let mut net = OscillatorNetwork::new(4, 1.0);
        net.set_coupling_matrix(CouplingMatrix::uniform(3, 1.0));
        let snapshot = net.clone();
        let mut integ = Integrator::default_params();
        let err = integ.step(&mut net, &unison(10.0)).unwrap_err();
        assert_eq!(
            err,
            ChoreoError::ConfigurationMismatch {
                expected: 4,
                found: 3
            }
        );
        assert_eq!(net.phases(), snapshot.phases());
        assert_eq!(net.natural_frequencies(), snapshot.natural_frequencies());
        assert_eq!(net.time(), 0.0);
        assert_eq!(net.step_count(), 0);
    }

    #[test]
    fn test_update_order_independent() {
        // Reversing unit order must reverse the result exactly.
        let phases = [0.1, 1.4, 2.9, 4.2];
        let rows = vec![
            vec![0.0, 1.0, 0.5, 2.0],
            vec![1.0, 0.0, 0.3, 0.0],
            vec![0.5, 0.3, 0.0, 1.2],
            vec![2.0, 0.0, 1.2, 0.0],
        ];
        let reversed_rows: Vec<Vec<f64>> = rows
            .iter()
            .rev()
            .map(|r| r.iter().rev().copied().collect())
            .collect();
        let mut reversed_phases = phases;
        reversed_phases.reverse();

        let mut a = OscillatorNetwork::new(4, 0.0);
        a.override_phases(&phases).unwrap();
        a.set_coupling_matrix(CouplingMatrix::from_rows(&rows).unwrap());
        let mut b = OscillatorNetwork::new(4, 0.0);
        b.override_phases(&reversed_phases).unwrap();
        b.set_coupling_matrix(CouplingMatrix::from_rows(&reversed_rows).unwrap());

        let mut integ = Integrator::default_params();
        integ.step(&mut a, &unison(0.0)).unwrap();
        integ.step(&mut b, &unison(0.0)).unwrap();
        for i in 0..4 {
            assert!((a.phases()[i] - b.phases()[3 - i]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_asymmetric_coupling_one_way_pull() {
        // Unit 0 listens to unit 1, unit 1 ignores unit 0.
        let mut net = OscillatorNetwork::new(2, 0.0);
        net.override_phases(&[0.0, PI / 2.0]).unwrap();
        net.set_coupling_matrix(CouplingMatrix::from_rows(&[vec![0.0, 4.0], vec![0.0, 0.0]]).unwrap());
        let mut integ = Integrator::default_params();
        let engine = unison(0.0);
        integ.step(&mut net, &engine).unwrap();
        let base = 2200.0 * TAU / 3200.0;
        assert!((net.velocities()[1] - base).abs() < 1e-6);
        assert!((net.velocities()[0] - (base + 4.0 / 2.0)).abs() < 1e-6);
    }
}
