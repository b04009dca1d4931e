// ─────────────────────────────────────────────────────────────────────
// Rotor Choreography — Oscillator Network State
// ─────────────────────────────────────────────────────────────────────
//! Owned state of the coupled-oscillator network: per-unit parallel
//! arrays plus the coupling matrix.
//!
//! Invariants held by every mutator:
//!   - every per-unit array has length `size`
//!   - `phase[i] ∈ [0, 2π)` (wrap-on-write)
//!   - `motor_step_position` is cumulative and never wrapped
//!
//! The coupling matrix is the one piece that may go stale: it can be
//! replaced with a matrix of another dimension, and the integrator
//! refuses to step until it matches again.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use choreo_types::{ChoreoError, ChoreoResult};

use crate::units::wrap_angle;

/// Square coupling matrix, row-major. `K[i][j]` weights the pull of
/// unit `j` on unit `i`; asymmetric matrices are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCouplingMatrix")]
pub struct CouplingMatrix {
    dim: usize,
    data: Vec<f64>,
}

/// Unchecked wire form; `data` must hold exactly `dim * dim` entries.
#[derive(Deserialize)]
struct RawCouplingMatrix {
    dim: usize,
    data: Vec<f64>,
}

impl TryFrom<RawCouplingMatrix> for CouplingMatrix {
    type Error = ChoreoError;

    fn try_from(raw: RawCouplingMatrix) -> ChoreoResult<Self> {
        let expected = raw.dim.checked_mul(raw.dim).ok_or_else(|| {
            ChoreoError::Config(format!("coupling dimension {} overflows", raw.dim))
        })?;
        if raw.data.len() != expected {
            return Err(ChoreoError::ConfigurationMismatch {
                expected,
                found: raw.data.len(),
            });
        }
        Ok(Self {
            dim: raw.dim,
            data: raw.data,
        })
    }
}

impl CouplingMatrix {
    /// Every entry, diagonal included, set to `k`.
    pub fn uniform(dim: usize, k: f64) -> Self {
        Self {
            dim,
            data: vec![k; dim * dim],
        }
    }

    /// Build from explicit rows. Ragged input is a shape error.
    pub fn from_rows(rows: &[Vec<f64>]) -> ChoreoResult<Self> {
        let dim = rows.len();
        let mut data = Vec::with_capacity(dim * dim);
        for row in rows {
            if row.len() != dim {
                return Err(ChoreoError::ConfigurationMismatch {
                    expected: dim,
                    found: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self { dim, data })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.dim + j]
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Overwrite every entry with `k`.
    pub fn fill(&mut self, k: f64) {
        self.data.iter_mut().for_each(|v| *v = k);
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.dim).all(|i| ((i + 1)..self.dim).all(|j| self.get(i, j) == self.get(j, i)))
    }
}

/// The coupled phase-oscillator network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OscillatorNetwork {
    pub(crate) size: usize,
    pub(crate) time: f64,
    pub(crate) step_count: u64,
    pub(crate) phase: Vec<f64>,
    pub(crate) natural_frequency: Vec<f64>,
    pub(crate) velocity: Vec<f64>,
    pub(crate) acceleration: Vec<f64>,
    pub(crate) previous_velocity: Vec<f64>,
    pub(crate) motor_step_position: Vec<f64>,
    pub(crate) coupling: CouplingMatrix,
}

impl OscillatorNetwork {
    /// Fresh network of `size` units (at least one) with uniform coupling `k`.
    ///
    /// Initial phases are spread over the upper half circle:
    /// `phase[i] = i·π/size`.
    pub fn new(size: usize, k: f64) -> Self {
        let size = size.max(1);
        let phase = (0..size)
            .map(|i| wrap_angle(i as f64 * PI / size as f64))
            .collect();
        Self {
            size,
            time: 0.0,
            step_count: 0,
            phase,
            natural_frequency: vec![0.0; size],
            velocity: vec![0.0; size],
            acceleration: vec![0.0; size],
            previous_velocity: vec![0.0; size],
            motor_step_position: vec![0.0; size],
            coupling: CouplingMatrix::uniform(size, k),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn phases(&self) -> &[f64] {
        &self.phase
    }

    pub fn natural_frequencies(&self) -> &[f64] {
        &self.natural_frequency
    }

    pub fn velocities(&self) -> &[f64] {
        &self.velocity
    }

    pub fn accelerations(&self) -> &[f64] {
        &self.acceleration
    }

    pub fn previous_velocities(&self) -> &[f64] {
        &self.previous_velocity
    }

    pub fn motor_step_positions(&self) -> &[f64] {
        &self.motor_step_position
    }

    pub fn coupling(&self) -> &CouplingMatrix {
        &self.coupling
    }

    /// Whether the coupling matrix matches the unit count.
    pub fn coupling_matches(&self) -> bool {
        self.coupling.dim() == self.size
    }

    /// Fill the whole coupling matrix with one scalar.
    ///
    /// A stale matrix is rebuilt at the current size.
    pub fn set_coupling(&mut self, k: f64) {
        if self.coupling_matches() {
            self.coupling.fill(k);
        } else {
            self.coupling = CouplingMatrix::uniform(self.size, k);
        }
    }

    /// Install an explicit, possibly heterogeneous, coupling matrix.
    ///
    /// The dimension is not checked here; `Integrator::step` refuses to
    /// run while it differs from `size`.
    pub fn set_coupling_matrix(&mut self, matrix: CouplingMatrix) {
        self.coupling = matrix;
    }

    /// Replace phases from a vector of `size` values or a single
    /// broadcast value. Values are wrapped into `[0, 2π)`.
    pub fn override_phases(&mut self, values: &[f64]) -> ChoreoResult<()> {
        self.check_arity(values.len())?;
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ChoreoError::Numerical(
                "phase override contains NaN or Inf".to_string(),
            ));
        }
        broadcast_into(&mut self.phase, values, wrap_angle);
        Ok(())
    }

    /// Replace natural frequencies (rad/s) from `size` values or one
    /// broadcast value. The next step re-derives them from the pattern.
    pub fn override_frequencies(&mut self, values: &[f64]) -> ChoreoResult<()> {
        self.check_arity(values.len())?;
        broadcast_into(&mut self.natural_frequency, values, |v| v);
        Ok(())
    }

    /// Zero the cumulative motor positions, leaving the dynamics untouched.
    pub fn reset_motor_positions(&mut self) {
        self.motor_step_position.iter_mut().for_each(|p| *p = 0.0);
    }

    /// Kuramoto order parameter R = |⟨e^{iθ}⟩| ∈ [0, 1].
    pub fn order_parameter(&self) -> f64 {
        let n = self.phase.len() as f64;
        if n < 1.0 {
            return 0.0;
        }
        let (sum_sin, sum_cos) = self
            .phase
            .iter()
            .fold((0.0, 0.0), |(s, c), &th| (s + th.sin(), c + th.cos()));
        let r = ((sum_sin / n).powi(2) + (sum_cos / n).powi(2)).sqrt();
        r.clamp(0.0, 1.0)
    }

    /// Every per-unit array has length `size`.
    pub fn arrays_consistent(&self) -> bool {
        let n = self.size;
        self.phase.len() == n
            && self.natural_frequency.len() == n
            && self.velocity.len() == n
            && self.acceleration.len() == n
            && self.previous_velocity.len() == n
            && self.motor_step_position.len() == n
    }

    fn check_arity(&self, found: usize) -> ChoreoResult<()> {
        if found == 1 || found == self.size {
            Ok(())
        } else {
            Err(ChoreoError::InvalidOverrideArity {
                expected: self.size,
                found,
            })
        }
    }
}

fn broadcast_into(dst: &mut [f64], values: &[f64], f: impl Fn(f64) -> f64) {
    if let [single] = values {
        let v = f(*single);
        dst.iter_mut().for_each(|d| *d = v);
    } else {
        for (d, &v) in dst.iter_mut().zip(values) {
            *d = f(v);
        }
    }
}
