//! Match settings
//!
//! Everything a host may tune before a match starts. Loaded from JSON on
//! native targets; every field has a default so partial files are fine.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{POWERUP_INTERVAL_SECS, TURN_TIME_SECS};
use crate::sim::UnitClass;

/// Fixed map layouts (deterministic, never randomized)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MapVariant {
    #[default]
    Plains,
    Fortress,
    Canyon,
}

impl MapVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            MapVariant::Plains => "Plains",
            MapVariant::Fortress => "Fortress",
            MapVariant::Canyon => "Canyon",
        }
    }

    /// Step budget per turn
    pub fn max_steps(&self) -> u32 {
        match self {
            MapVariant::Plains => 10,
            MapVariant::Fortress => 9,
            MapVariant::Canyon => 8,
        }
    }

    /// Roster fielded by each team, in unit-index order
    pub fn roster(&self) -> &'static [UnitClass] {
        match self {
            MapVariant::Plains | MapVariant::Fortress => &[
                UnitClass::Soldier,
                UnitClass::Sniper,
                UnitClass::Heavy,
                UnitClass::Medic,
            ],
            MapVariant::Canyon => &[UnitClass::Soldier, UnitClass::Sniper, UnitClass::Heavy],
        }
    }
}

impl FromStr for MapVariant {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plains" => Ok(MapVariant::Plains),
            "fortress" | "fort" => Ok(MapVariant::Fortress),
            "canyon" => Ok(MapVariant::Canyon),
            _ => Err(SettingsError::UnknownMap(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unknown map '{0}' (expected plains, fortress or canyon)")]
    UnknownMap(String),
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Match settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    /// Seed for wind and power-up placement
    pub seed: u64,
    pub map: MapVariant,
    /// Wall-clock budget per turn
    pub turn_time_secs: f32,
    /// Interval between power-up spawns
    pub powerup_interval_secs: f32,
    /// CPU policy also drives team A (demo mode)
    pub autopilot: bool,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            seed: 0x7e44_17a1,
            map: MapVariant::Plains,
            turn_time_secs: TURN_TIME_SECS,
            powerup_interval_secs: POWERUP_INTERVAL_SECS,
            autopilot: false,
        }
    }
}

impl MatchSettings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded match settings from {}", path.as_ref().display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replace non-positive or non-finite timings with defaults
    fn sanitized(mut self) -> Self {
        if !self.turn_time_secs.is_finite() || self.turn_time_secs <= 0.0 {
            log::warn!("turn_time_secs {} invalid, using default", self.turn_time_secs);
            self.turn_time_secs = TURN_TIME_SECS;
        }
        if !self.powerup_interval_secs.is_finite() || self.powerup_interval_secs <= 0.0 {
            log::warn!(
                "powerup_interval_secs {} invalid, using default",
                self.powerup_interval_secs
            );
            self.powerup_interval_secs = POWERUP_INTERVAL_SECS;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = MatchSettings::from_json(r#"{ "seed": 7, "map": "canyon" }"#).unwrap();
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.map, MapVariant::Canyon);
        assert_eq!(settings.turn_time_secs, TURN_TIME_SECS);
        assert!(!settings.autopilot);
    }

    #[test]
    fn test_invalid_timings_are_replaced() {
        let settings = MatchSettings::from_json(r#"{ "turn_time_secs": -3.0 }"#).unwrap();
        assert_eq!(settings.turn_time_secs, TURN_TIME_SECS);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(matches!(
            MatchSettings::from_json("{ seed: }"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_variant_step_budgets() {
        assert_eq!(MapVariant::Plains.max_steps(), 10);
        assert_eq!(MapVariant::Fortress.max_steps(), 9);
        assert_eq!(MapVariant::Canyon.max_steps(), 8);
        assert_eq!(MapVariant::Canyon.roster().len(), 3);
        assert_eq!("FORT".parse::<MapVariant>().unwrap(), MapVariant::Fortress);
        assert!("swamp".parse::<MapVariant>().is_err());
    }
}
