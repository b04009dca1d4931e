// ─────────────────────────────────────────────────────────────────────
// Rotor Choreography — Choreo Kernel Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! choreography kernel that drives a fleet of stepper rotors.

pub mod config;
pub mod control;
pub mod error;

pub use config::ChoreoConfig;
pub use control::{clamp_control, FrequencySource, Pattern, DEFAULT_BASE_SPS};
pub use error::{ChoreoError, ChoreoResult};
