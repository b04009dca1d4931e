// ─────────────────────────────────────────────────────────────────────
// Rotor Choreography — Control Enums
// ─────────────────────────────────────────────────────────────────────
//! Closed control vocabulary shared by the physics engine and the
//! control surface: the six choreography patterns and the source of
//! the base rotation frequency.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ChoreoError, ChoreoResult};

/// Lower bound of the normalised control value.
pub const CONTROL_MIN: f64 = 0.0;
/// Upper bound of the normalised control value.
pub const CONTROL_MAX: f64 = 100.0;

/// Default base speed of the fixed variant: one revolution per second
/// at 3200 steps/rev.
pub const DEFAULT_BASE_SPS: f64 = 3200.0;

/// Choreography pattern. Index order is part of the control protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Pattern {
    #[default]
    Unison,
    FanSymmetric,
    #[serde(rename = "GROUPS_2")]
    Groups2,
    WavePhase,
    Chase,
    RendezvousLock,
}

impl Pattern {
    pub const ALL: [Pattern; 6] = [
        Pattern::Unison,
        Pattern::FanSymmetric,
        Pattern::Groups2,
        Pattern::WavePhase,
        Pattern::Chase,
        Pattern::RendezvousLock,
    ];

    /// Strict lookup by protocol index.
    pub fn from_index(index: i64) -> ChoreoResult<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(ChoreoError::InvalidIndex {
                index,
                max: Self::ALL.len() - 1,
            })
    }

    /// Saturating lookup: out-of-range selectors land on the nearest
    /// valid pattern.
    pub fn from_index_clamped(index: i64) -> Self {
        let max = (Self::ALL.len() - 1) as i64;
        Self::ALL[index.clamp(0, max) as usize]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Pattern::Unison => "UNISON",
            Pattern::FanSymmetric => "FAN_SYMMETRIC",
            Pattern::Groups2 => "GROUPS_2",
            Pattern::WavePhase => "WAVE_PHASE",
            Pattern::Chase => "CHASE",
            Pattern::RendezvousLock => "RENDEZVOUS_LOCK",
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Pattern {
    type Err = ChoreoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ChoreoError::Config(format!("unknown pattern name {wanted:?}")))
    }
}

/// Where the base rotation speed comes from.
///
/// `ControlDriven` interpolates every pattern amplitude from a single
/// control value in [0, 100]; `FixedBase` uses a configured base speed
/// and literal amplitudes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrequencySource {
    ControlDriven { control: f64 },
    FixedBase { base_sps: f64 },
}

impl FrequencySource {
    pub fn control_driven(control: f64) -> Self {
        FrequencySource::ControlDriven {
            control: clamp_control(control),
        }
    }

    pub fn fixed_base(base_sps: f64) -> Self {
        FrequencySource::FixedBase { base_sps }
    }
}

impl Default for FrequencySource {
    fn default() -> Self {
        FrequencySource::ControlDriven { control: 0.0 }
    }
}

/// Clamp a control value into [0, 100]. NaN maps to the lower bound.
#[inline]
pub fn clamp_control(value: f64) -> f64 {
    if value.is_nan() {
        log::warn!("clamp_control: NaN control value, using {CONTROL_MIN}");
        return CONTROL_MIN;
    }
    value.clamp(CONTROL_MIN, CONTROL_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip_order() {
        for (i, p) in Pattern::ALL.iter().enumerate() {
            assert_eq!(p.index(), i);
            assert_eq!(Pattern::from_index(i as i64).unwrap(), *p);
        }
    }

    #[test]
    fn test_strict_index_rejects_out_of_range() {
        assert_eq!(
            Pattern::from_index(6),
            Err(ChoreoError::InvalidIndex { index: 6, max: 5 })
        );
        assert!(Pattern::from_index(-1).is_err());
    }

    #[test]
    fn test_clamped_index() {
        assert_eq!(Pattern::from_index_clamped(-3), Pattern::Unison);
        assert_eq!(Pattern::from_index_clamped(42), Pattern::RendezvousLock);
        assert_eq!(Pattern::from_index_clamped(3), Pattern::WavePhase);
    }

    #[test]
    fn test_name_parse() {
        assert_eq!("groups_2".parse::<Pattern>().unwrap(), Pattern::Groups2);
        assert_eq!(" CHASE ".parse::<Pattern>().unwrap(), Pattern::Chase);
        assert!("spiral".parse::<Pattern>().is_err());
        assert_eq!(Pattern::RendezvousLock.to_string(), "RENDEZVOUS_LOCK");
    }

    #[test]
    fn test_control_clamped() {
        assert_eq!(clamp_control(-5.0), 0.0);
        assert_eq!(clamp_control(140.0), 100.0);
        assert_eq!(clamp_control(f64::NAN), 0.0);
        assert_eq!(
            FrequencySource::control_driven(250.0),
            FrequencySource::ControlDriven { control: 100.0 }
        );
    }

    #[test]
    fn test_serde_tags() {
        let json = serde_json::to_string(&FrequencySource::fixed_base(3200.0)).unwrap();
        assert_eq!(json, r#"{"kind":"fixed_base","base_sps":3200.0}"#);
        let p: Pattern = serde_json::from_str(r#""WAVE_PHASE""#).unwrap();
        assert_eq!(p, Pattern::WavePhase);
    }
}
