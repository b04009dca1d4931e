// ─────────────────────────────────────────────────────────────────────
// Rotor Choreography — Choreo Kernel Core
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Control surface and tick driving for a fleet of stepper rotors
//! following Kuramoto-generated choreography.
//!
//! # Invariants
//!
//! 1. **One owner per network**: all state lives in a `Choreographer`.
//!    There are no process-wide singletons; every control operation
//!    takes an explicit `&mut` to it.
//!
//! 2. **Refusal is atomic**: a tick refused for a coupling/size mismatch
//!    mutates nothing, and the refusal is returned to the caller (or to
//!    the sink's `refused` hook when driven by the `Metronome`).
//!
//! 3. **Simulated time is exact**: `time` advances by `step_size` per
//!    tick regardless of wall-clock scheduling.
//!
//! 4. **Ticks and control are serialized**: the periodic driver and the
//!    control path share one mutex around the choreographer.

pub mod choreographer;
pub mod metronome;
pub mod sink;

pub use choreographer::Choreographer;
pub use metronome::{shared, Metronome, SharedChoreographer};
pub use sink::{CallbackSink, FrameRecorder, FrameSink};
