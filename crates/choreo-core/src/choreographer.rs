// ─────────────────────────────────────────────────────────────────────
// Rotor Choreography — Choreographer (Control Surface)
// ─────────────────────────────────────────────────────────────────────
//! Owns one oscillator network together with its integrator and
//! pattern engine, and exposes the control vocabulary: pattern and
//! frequency-source selection, coupling, overrides, motor mapping,
//! resize/reset and the single-tick `step`.
//!
//! Holds no timer; periodic ticking is driven from outside (see
//! [`crate::metronome`]). Control calls and ticks take `&mut self`, so
//! they are serialized by construction.

use choreo_physics::units::rad_per_sec_to_steps_per_sec;
use choreo_physics::{
    project, CouplingMatrix, Integrator, MotorMapping, OscillatorNetwork, PatternEngine,
    TickFrame, VizParams,
};
use choreo_types::{clamp_control, ChoreoConfig, ChoreoResult, FrequencySource, Pattern};

/// Control surface over a single oscillator network.
pub struct Choreographer {
    config: ChoreoConfig,
    network: OscillatorNetwork,
    integrator: Integrator,
    engine: PatternEngine,
}

impl Choreographer {
    /// Validate `config` and build an initialized network from it.
    pub fn new(config: ChoreoConfig) -> ChoreoResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Default parameters: 10 units, 25 ms ticks, coupling 1.5, P = 0.
    pub fn default_params() -> Self {
        Self::build(ChoreoConfig::default())
    }

    fn build(config: ChoreoConfig) -> Self {
        let c = Self {
            integrator: Integrator::new(config.step_size, motor_mapping(&config)),
            engine: PatternEngine::new(config.pattern, config.frequency_source),
            network: OscillatorNetwork::new(config.network_size, config.coupling),
            config,
        };
        c.log_initialized();
        c
    }

    pub fn from_json(json: &str) -> ChoreoResult<Self> {
        Self::new(ChoreoConfig::from_json(json)?)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn config(&self) -> &ChoreoConfig {
        &self.config
    }

    pub fn network(&self) -> &OscillatorNetwork {
        &self.network
    }

    pub fn pattern(&self) -> Pattern {
        self.engine.pattern
    }

    pub fn frequency_source(&self) -> FrequencySource {
        self.engine.source
    }

    /// Current base angular frequency (rad/s).
    pub fn base_omega(&self) -> f64 {
        self.engine.base_omega(self.config.steps_per_revolution)
    }

    pub fn motor_mapping(&self) -> MotorMapping {
        self.integrator.motor
    }

    /// Project the current state without stepping.
    pub fn frame(&self) -> TickFrame {
        project(
            &self.network,
            &self.integrator.motor,
            self.integrator.step_size,
            &self.viz_params(),
        )
    }

    // ------------------------------------------------------------------
    // Ticking
    // ------------------------------------------------------------------

    /// Advance one tick and return the egress frame.
    ///
    /// A refused tick leaves the network untouched.
    pub fn step(&mut self) -> ChoreoResult<TickFrame> {
        if let Err(e) = self.integrator.step(&mut self.network, &self.engine) {
            log::error!("step refused: {e}");
            return Err(e);
        }
        Ok(self.frame())
    }

    /// Advance `n` ticks, returning the frame after the last one.
    pub fn run(&mut self, n: u64) -> ChoreoResult<TickFrame> {
        if let Err(e) = self.integrator.run(&mut self.network, &self.engine, n) {
            log::error!("run refused after {} steps: {e}", self.network.step_count());
            return Err(e);
        }
        Ok(self.frame())
    }

    // ------------------------------------------------------------------
    // Pattern / frequency source
    // ------------------------------------------------------------------

    /// Select a pattern by protocol index, clamping out-of-range input.
    pub fn set_pattern(&mut self, index: i64) -> Pattern {
        let pattern = Pattern::from_index_clamped(index);
        if pattern.index() as i64 != index {
            log::warn!("pattern index {index} out of range, clamped to {pattern}");
        }
        self.select_pattern(pattern);
        pattern
    }

    pub fn select_pattern(&mut self, pattern: Pattern) {
        self.engine.pattern = pattern;
        self.config.pattern = pattern;
        log::info!("Pattern set to {pattern}");
    }

    /// Set the control value P (clamped to [0, 100]) and switch to the
    /// control-driven frequency source.
    pub fn set_control_value(&mut self, value: f64) {
        let control = clamp_control(value);
        if control != value && !value.is_nan() {
            log::warn!("control value {value} clamped to {control}");
        }
        if !matches!(self.engine.source, FrequencySource::ControlDriven { .. }) {
            log::info!("Frequency source switched to control-driven");
        }
        self.set_frequency_source(FrequencySource::ControlDriven { control });
    }

    /// Set the fixed base speed (steps/s) and switch to the fixed-base
    /// frequency source.
    pub fn set_base_speed(&mut self, steps_per_sec: f64) {
        self.set_frequency_source(FrequencySource::FixedBase {
            base_sps: steps_per_sec,
        });
        log::info!(
            "Base speed set to {steps_per_sec} steps/s (baseOmega={:.4})",
            self.base_omega()
        );
    }

    /// Set the fixed base speed from an angular frequency (rad/s).
    ///
    /// Stored as steps/s, so a later steps-per-revolution change keeps
    /// the motor speed rather than the angular rate.
    pub fn set_base_omega(&mut self, omega: f64) {
        let sps = rad_per_sec_to_steps_per_sec(omega, self.config.steps_per_revolution);
        self.set_base_speed(sps);
    }

    pub fn set_frequency_source(&mut self, source: FrequencySource) {
        self.engine.source = source;
        self.config.frequency_source = source;
    }

    // ------------------------------------------------------------------
    // Coupling / overrides
    // ------------------------------------------------------------------

    /// Write `k` into every coupling entry.
    pub fn set_coupling(&mut self, k: f64) {
        self.config.coupling = k;
        self.network.set_coupling(k);
        log::info!("Coupling set to {k}");
    }

    /// Install a heterogeneous coupling matrix given as rows.
    ///
    /// Ragged rows are rejected. A square matrix of the wrong size is
    /// accepted but makes `step` refuse until coupling is reset.
    pub fn set_coupling_matrix(&mut self, rows: &[Vec<f64>]) -> ChoreoResult<()> {
        let matrix = CouplingMatrix::from_rows(rows)?;
        if matrix.dim() != self.network.size() {
            log::warn!(
                "coupling matrix is {0}x{0} but network has {1} units; ticks will be refused",
                matrix.dim(),
                self.network.size()
            );
        }
        self.network.set_coupling_matrix(matrix);
        Ok(())
    }

    pub fn override_phases(&mut self, values: &[f64]) -> ChoreoResult<()> {
        self.network.override_phases(values).map_err(|e| {
            log::error!("phase override rejected: {e}");
            e
        })
    }

    pub fn override_frequencies(&mut self, values: &[f64]) -> ChoreoResult<()> {
        self.network.override_frequencies(values).map_err(|e| {
            log::error!("frequency override rejected: {e}");
            e
        })
    }

    // ------------------------------------------------------------------
    // Motor mapping
    // ------------------------------------------------------------------

    pub fn set_speed_scale(&mut self, scale: f64) {
        self.config.speed_scale = scale;
        self.integrator.motor.speed_scale = scale;
        log::info!("speedScale={scale}");
    }

    pub fn set_steps_per_revolution(&mut self, steps: f64) {
        self.config.steps_per_revolution = steps;
        self.integrator.motor.steps_per_revolution = steps;
        log::info!("stepsPerRev={steps} baseOmega={:.4}", self.base_omega());
    }

    pub fn reset_motor_positions(&mut self) {
        self.network.reset_motor_positions();
    }

    /// Record the periodic driver interval (ms, at least 1).
    pub fn set_tick_interval_ms(&mut self, ms: u64) {
        self.config.tick_interval_ms = ms.max(1);
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Rebuild the network with `n` units (at least one).
    pub fn resize(&mut self, n: usize) {
        self.config.network_size = n.max(1);
        self.reset();
    }

    /// Reinitialize at the current size: clock, phases, motion and
    /// motor positions reset, coupling refilled from the scalar.
    pub fn reset(&mut self) {
        self.network = OscillatorNetwork::new(self.config.network_size, self.config.coupling);
        self.log_initialized();
    }

    fn viz_params(&self) -> VizParams {
        VizParams {
            radius: self.config.radius,
            accel_color_divisor: self.config.accel_color_divisor,
        }
    }

    fn log_initialized(&self) {
        log::info!(
            "Network initialized: N={} stepSize={}s pattern={} baseOmega={:.4} rad/s",
            self.network.size(),
            self.integrator.step_size,
            self.engine.pattern,
            self.base_omega()
        );
    }
}

impl Default for Choreographer {
    fn default() -> Self {
        Self::default_params()
    }
}

fn motor_mapping(config: &ChoreoConfig) -> MotorMapping {
    MotorMapping {
        steps_per_revolution: config.steps_per_revolution,
        min_steps_per_sec: config.min_steps_per_sec,
        max_steps_per_sec: config.max_steps_per_sec,
        speed_scale: config.speed_scale,
    }
}
