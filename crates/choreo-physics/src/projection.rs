// ─────────────────────────────────────────────────────────────────────
// Rotor Choreography — Output Projection
// ─────────────────────────────────────────────────────────────────────
//! Per-tick egress derived from post-integration state. Pure: reading
//! a frame never mutates the network.
//!
//! Channels, each ordered by unit index 0..N:
//!   - phases (rad, wrapped)
//!   - visualization points (x, y, z, rgb)
//!   - velocity (rad/s) and acceleration (rad/s²)
//!   - motor speed (steps/s, scaled + clamped)
//!   - motor position (cumulative, wrapped, per-tick delta)

use serde::{Deserialize, Serialize};

use crate::network::OscillatorNetwork;
use crate::units::{clamp, steps_per_sec_to_delta_steps, MotorMapping};

/// Blue channel of every visualization colour.
pub const VIZ_BLUE: u8 = 128;

/// Display parameters for the visualization channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VizParams {
    pub radius: f64,
    /// |α| at which the colour saturates to full red.
    pub accel_color_divisor: f64,
}

impl Default for VizParams {
    fn default() -> Self {
        Self {
            radius: 0.3,
            accel_color_divisor: 50.0,
        }
    }
}

/// One unit's point on the display ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VizPoint {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl VizPoint {
    pub fn new(index: usize, phase: f64, acceleration: f64, viz: &VizParams) -> Self {
        let (r, g, b) = accel_color(acceleration, viz.accel_color_divisor);
        Self {
            index,
            x: phase.cos() * viz.radius * 2.0,
            y: phase.sin() * viz.radius * 2.0,
            z: 0.0,
            r,
            g,
            b,
        }
    }
}

/// Green at rest, red at or above `divisor`.
pub fn accel_color(acceleration: f64, divisor: f64) -> (u8, u8, u8) {
    let normalized = clamp(acceleration.abs() / divisor, 0.0, 1.0);
    let r = (normalized * 255.0).round() as u8;
    let g = ((1.0 - normalized) * 255.0).round() as u8;
    (r, g, VIZ_BLUE)
}

/// Motor position report: three vectors of length N.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MotorPositionReport {
    /// Authoritative cumulative position (steps).
    pub cumulative: Vec<f64>,
    /// Cumulative position folded into `[0, steps_per_revolution)`.
    pub wrapped: Vec<f64>,
    /// Steps travelled during the last tick.
    pub delta: Vec<f64>,
}

impl MotorPositionReport {
    /// `[cumulative…, wrapped…, delta…]` as one flat list.
    pub fn concatenated(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.cumulative.len() * 3);
        out.extend_from_slice(&self.cumulative);
        out.extend_from_slice(&self.wrapped);
        out.extend_from_slice(&self.delta);
        out
    }
}

/// Everything one tick emits.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TickFrame {
    pub step: u64,
    pub time: f64,
    pub order_parameter: f64,
    pub phases: Vec<f64>,
    pub points: Vec<VizPoint>,
    pub velocity: Vec<f64>,
    pub acceleration: Vec<f64>,
    pub motor_sps: Vec<f64>,
    pub motor_position: MotorPositionReport,
}

/// Derive the egress frame from the current network state.
///
/// Motor speed is recomputed from velocity through `motor`, not cached
/// from the integrator, so the scale/clamp policy matches exactly.
pub fn project(
    net: &OscillatorNetwork,
    motor: &MotorMapping,
    step_size: f64,
    viz: &VizParams,
) -> TickFrame {
    let n = net.size();
    let phases = net.phases();
    let accel = net.accelerations();

    let points = (0..n)
        .map(|i| VizPoint::new(i, phases[i], accel[i], viz))
        .collect();

    let motor_sps: Vec<f64> = net.velocities().iter().map(|&w| motor.motor_sps(w)).collect();
    let delta = motor_sps
        .iter()
        .map(|&sps| steps_per_sec_to_delta_steps(sps, step_size))
        .collect();
    let cumulative = net.motor_step_positions().to_vec();
    let wrapped = cumulative.iter().map(|&p| motor.wrap(p)).collect();

    TickFrame {
        step: net.step_count(),
        time: net.time(),
        order_parameter: net.order_parameter(),
        phases: phases.to_vec(),
        points,
        velocity: net.velocities().to_vec(),
        acceleration: accel.to_vec(),
        motor_sps,
        motor_position: MotorPositionReport {
            cumulative,
            wrapped,
            delta,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::Integrator;
    use crate::pattern::PatternEngine;
    use choreo_types::{FrequencySource, Pattern};
    use std::f64::consts::PI;

    #[test]
    fn test_color_scale() {
        assert_eq!(accel_color(0.0, 50.0), (0, 255, 128));
        assert_eq!(accel_color(-50.0, 50.0), (255, 0, 128));
        assert_eq!(accel_color(1e9, 50.0), (255, 0, 128));
        assert_eq!(accel_color(25.0, 50.0), (128, 128, 128));
    }

    #[test]
    fn test_point_on_ring() {
        let viz = VizParams::default();
        let p = VizPoint::new(3, PI / 2.0, 0.0, &viz);
        assert_eq!(p.index, 3);
        assert!(p.x.abs() < 1e-12);
        assert!((p.y - 0.6).abs() < 1e-12);
        assert_eq!(p.z, 0.0);
    }

    #[test]
    fn test_projection_shapes_and_order() {
        let mut net = OscillatorNetwork::new(5, 1.5);
        let mut integ = Integrator::default_params();
        let engine = PatternEngine::new(Pattern::FanSymmetric, FrequencySource::control_driven(60.0));
        integ.step(&mut net, &engine).unwrap();

        let frame = project(&net, &integ.motor, integ.step_size, &VizParams::default());
        assert_eq!(frame.phases, net.phases());
        assert_eq!(frame.velocity, net.velocities());
        assert_eq!(frame.acceleration, net.accelerations());
        assert_eq!(frame.points.len(), 5);
        assert!(frame.points.iter().enumerate().all(|(i, p)| p.index == i));
        assert_eq!(frame.motor_sps.len(), 5);
        assert_eq!(frame.motor_position.concatenated().len(), 15);
        assert_eq!(frame.step, 1);
    }

    #[test]
    fn test_projection_is_pure() {
        let mut net = OscillatorNetwork::new(3, 0.5);
        let mut integ = Integrator::default_params();
        integ.step(&mut net, &PatternEngine::default()).unwrap();
        let before = net.clone();
        let a = project(&net, &integ.motor, integ.step_size, &VizParams::default());
        let b = project(&net, &integ.motor, integ.step_size, &VizParams::default());
        assert_eq!(a, b);
        assert_eq!(before.phases(), net.phases());
        assert_eq!(before.motor_step_positions(), net.motor_step_positions());
    }

    #[test]
    fn test_delta_sums_to_cumulative() {
        let mut net = OscillatorNetwork::new(4, 2.0);
        let mut integ = Integrator::default_params();
        let engine = PatternEngine::new(Pattern::WavePhase, FrequencySource::control_driven(90.0));
        let mut sums = vec![0.0; 4];
        for _ in 0..200 {
            integ.step(&mut net, &engine).unwrap();
            let frame = project(&net, &integ.motor, integ.step_size, &VizParams::default());
            for (s, d) in sums.iter_mut().zip(&frame.motor_position.delta) {
                *s += d;
            }
            assert!(frame
                .motor_sps
                .iter()
                .all(|&sps| (-5200.0..=5200.0).contains(&sps)));
        }
        for i in 0..4 {
            assert!((net.motor_step_positions()[i] - sums[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_wrapped_position_range() {
        let mut net = OscillatorNetwork::new(2, 0.0);
        let mut integ = Integrator::default_params();
        let engine = PatternEngine::new(Pattern::Groups2, FrequencySource::control_driven(100.0));
        integ.run(&mut net, &engine, 100).unwrap();
        let frame = project(&net, &integ.motor, integ.step_size, &VizParams::default());
        for (&cum, &wr) in frame
            .motor_position
            .cumulative
            .iter()
            .zip(&frame.motor_position.wrapped)
        {
            assert!((0.0..3200.0).contains(&wr));
            assert!(((cum - wr) / 3200.0 - ((cum - wr) / 3200.0).round()).abs() < 1e-9);
        }
    }
}
