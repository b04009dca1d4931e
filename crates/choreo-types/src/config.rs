// ─────────────────────────────────────────────────────────────────────
// Rotor Choreography — Choreo Kernel Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::control::{FrequencySource, Pattern};
use crate::error::{ChoreoError, ChoreoResult};

/// Runtime configuration for the choreography kernel.
///
/// Every field can also be changed at runtime through the control
/// surface; `validate` only guards configuration documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoreoConfig {
    /// Number of rotors / oscillators. Default: 10.
    pub network_size: usize,

    /// Integration step in seconds. Default: 0.025 (one 25 ms tick).
    pub step_size: f64,

    /// Global coupling scalar written into every matrix entry. Default: 1.5.
    pub coupling: f64,

    /// Visualization radius; points are drawn at 2·radius. Default: 0.3.
    pub radius: f64,

    /// Motor steps per full revolution. Default: 3200.
    pub steps_per_revolution: f64,

    /// Signed motor speed floor (steps/s). Default: -5200.
    pub min_steps_per_sec: f64,

    /// Signed motor speed ceiling (steps/s). Default: 5200.
    pub max_steps_per_sec: f64,

    /// Global multiplier applied before the motor speed clamp. Default: 1.0.
    pub speed_scale: f64,

    /// Periodic driver interval in milliseconds. Default: 25.
    pub tick_interval_ms: u64,

    /// |acceleration| that saturates the visualization colour. Default: 50.0.
    pub accel_color_divisor: f64,

    /// Initially selected pattern. Default: UNISON.
    pub pattern: Pattern,

    /// Base frequency source. Default: control-driven with P = 0.
    pub frequency_source: FrequencySource,
}

impl Default for ChoreoConfig {
    fn default() -> Self {
        Self {
            network_size: 10,
            step_size: 0.025,
            coupling: 1.5,
            radius: 0.3,
            steps_per_revolution: 3200.0,
            min_steps_per_sec: -5200.0,
            max_steps_per_sec: 5200.0,
            speed_scale: 1.0,
            tick_interval_ms: 25,
            accel_color_divisor: 50.0,
            pattern: Pattern::Unison,
            frequency_source: FrequencySource::default(),
        }
    }
}

impl ChoreoConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> ChoreoResult<()> {
        if self.network_size < 1 {
            return Err(ChoreoError::Config(format!(
                "network_size must be >= 1, got {}",
                self.network_size
            )));
        }
        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            return Err(ChoreoError::Config(format!(
                "step_size must be finite and > 0, got {}",
                self.step_size
            )));
        }
        if self.steps_per_revolution.is_nan() || self.steps_per_revolution <= 0.0 {
            return Err(ChoreoError::Config(format!(
                "steps_per_revolution must be > 0, got {}",
                self.steps_per_revolution
            )));
        }
        if self.min_steps_per_sec > self.max_steps_per_sec {
            return Err(ChoreoError::Config(format!(
                "min_steps_per_sec ({}) must not exceed max_steps_per_sec ({})",
                self.min_steps_per_sec, self.max_steps_per_sec
            )));
        }
        if self.accel_color_divisor.is_nan() || self.accel_color_divisor <= 0.0 {
            return Err(ChoreoError::Config(format!(
                "accel_color_divisor must be > 0, got {}",
                self.accel_color_divisor
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(ChoreoError::Config(
                "tick_interval_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> ChoreoResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| ChoreoError::Config(format!("JSON parse error: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ChoreoConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_units_rejected() {
        let cfg = ChoreoConfig {
            network_size: 0,
            ..ChoreoConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ChoreoError::Config(_))));
    }

    #[test]
    fn test_non_positive_step_rejected() {
        for dt in [0.0, -0.025, f64::NAN, f64::INFINITY] {
            let cfg = ChoreoConfig {
                step_size: dt,
                ..ChoreoConfig::default()
            };
            assert!(cfg.validate().is_err(), "step_size={dt} accepted");
        }
    }

    #[test]
    fn test_inverted_speed_window_rejected() {
        let cfg = ChoreoConfig {
            min_steps_per_sec: 100.0,
            max_steps_per_sec: -100.0,
            ..ChoreoConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let cfg = ChoreoConfig::from_json(
            r#"{
                "network_size": 4,
                "pattern": "CHASE",
                "frequency_source": {"kind": "fixed_base", "base_sps": 2800.0}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.network_size, 4);
        assert_eq!(cfg.pattern, Pattern::Chase);
        assert_eq!(cfg.frequency_source, FrequencySource::FixedBase { base_sps: 2800.0 });
        assert!((cfg.step_size - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(ChoreoConfig::from_json("{not json").is_err());
        assert!(ChoreoConfig::from_json(r#"{"tick_interval_ms": 0}"#).is_err());
    }
}
