// ─────────────────────────────────────────────────────────────────────
// Rotor Choreography — Oscillator Physics Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Coupled phase-oscillator core for stepper-rotor choreography:
//! unit conversions, network state, pattern engine, Kuramoto tick
//! integrator and per-tick output projection.

pub mod integrator;
pub mod network;
pub mod pattern;
pub mod projection;
pub mod units;

pub use integrator::Integrator;
pub use network::{CouplingMatrix, OscillatorNetwork};
pub use pattern::{PatternAmplitudes, PatternEngine};
pub use projection::{project, MotorPositionReport, TickFrame, VizParams, VizPoint};
pub use units::MotorMapping;
