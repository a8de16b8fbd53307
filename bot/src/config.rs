use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DriverError;

/// Gravitational acceleration in m/s².
pub const G: f32 = 9.81;

/// Tuning constants for a [`crate::Driver`]. Every field has a default, so a
/// TOML file only needs the values it overrides.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DriverConfig {
    /// Heading errors below this count as "aligned enough" to be stuck.
    #[serde(default = "default_max_unstuck_angle_deg")]
    pub max_unstuck_angle_deg: f32,
    /// Time spent slow and off-centre before recovery kicks in, in seconds.
    #[serde(default = "default_unstuck_time_limit")]
    pub unstuck_time_limit: f32,
    #[serde(default = "default_max_unstuck_speed")]
    pub max_unstuck_speed: f32,
    #[serde(default = "default_min_unstuck_dist")]
    pub min_unstuck_dist: f32,
    /// Full throttle while the allowed speed exceeds the current one by this much.
    #[serde(default = "default_full_accel_margin")]
    pub full_accel_margin: f32,
    #[serde(default = "default_lookahead_const")]
    pub lookahead_const: f32,
    #[serde(default = "default_lookahead_factor")]
    pub lookahead_factor: f32,
    /// Track-keeping tolerance is `width / width_div` either side of the centre.
    #[serde(default = "default_width_div")]
    pub width_div: f32,
    #[serde(default = "default_drive_gear")]
    pub drive_gear: i32,
    #[serde(default = "default_recovery_throttle")]
    pub recovery_throttle: f32,
    /// Host tick period in seconds.
    #[serde(default = "default_tick_period")]
    pub tick_period: f32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_unstuck_angle_deg: default_max_unstuck_angle_deg(),
            unstuck_time_limit: default_unstuck_time_limit(),
            max_unstuck_speed: default_max_unstuck_speed(),
            min_unstuck_dist: default_min_unstuck_dist(),
            full_accel_margin: default_full_accel_margin(),
            lookahead_const: default_lookahead_const(),
            lookahead_factor: default_lookahead_factor(),
            width_div: default_width_div(),
            drive_gear: default_drive_gear(),
            recovery_throttle: default_recovery_throttle(),
            tick_period: default_tick_period(),
        }
    }
}

fn default_max_unstuck_angle_deg() -> f32 {
    30.0
}

fn default_unstuck_time_limit() -> f32 {
    2.0
}

fn default_max_unstuck_speed() -> f32 {
    5.0
}

fn default_min_unstuck_dist() -> f32 {
    3.0
}

fn default_full_accel_margin() -> f32 {
    1.0
}

fn default_lookahead_const() -> f32 {
    17.0
}

fn default_lookahead_factor() -> f32 {
    0.33
}

fn default_width_div() -> f32 {
    4.0
}

fn default_drive_gear() -> i32 {
    4
}

fn default_recovery_throttle() -> f32 {
    0.5
}

fn default_tick_period() -> f32 {
    0.02
}

impl DriverConfig {
    /// Load a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, DriverError> {
        let text = std::fs::read_to_string(path).map_err(|source| DriverError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, DriverError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DriverError> {
        let positive = [
            ("unstuck_time_limit", self.unstuck_time_limit),
            ("tick_period", self.tick_period),
            ("width_div", self.width_div),
            ("max_unstuck_angle_deg", self.max_unstuck_angle_deg),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(DriverError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.recovery_throttle) {
            return Err(DriverError::InvalidConfig(format!(
                "recovery_throttle must be within [0, 1], got {}",
                self.recovery_throttle
            )));
        }
        if self.drive_gear < 1 {
            return Err(DriverError::InvalidConfig(format!(
                "drive_gear must be a forward gear, got {}",
                self.drive_gear
            )));
        }
        Ok(())
    }

    pub fn max_unstuck_angle(&self) -> f32 {
        self.max_unstuck_angle_deg.to_radians()
    }

    /// Number of ticks the car may spend stuck before recovering.
    pub fn max_unstuck_count(&self) -> u32 {
        (self.unstuck_time_limit / self.tick_period) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_give_hundred_tick_limit() {
        let config = DriverConfig::default();
        assert_eq!(config.max_unstuck_count(), 100);
        assert!((config.max_unstuck_angle() - 0.5236).abs() < 1e-3);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = DriverConfig::from_toml("lookahead_const = 20.0\ndrive_gear = 3\n").unwrap();
        assert_eq!(config.lookahead_const, 20.0);
        assert_eq!(config.drive_gear, 3);
        assert_eq!(config.lookahead_factor, 0.33);
        assert_eq!(config.min_unstuck_dist, 3.0);
    }

    #[test]
    fn rejects_zero_tick_period() {
        let err = DriverConfig::from_toml("tick_period = 0.0").unwrap_err();
        assert!(matches!(err, DriverError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_reverse_drive_gear() {
        let err = DriverConfig::from_toml("drive_gear = -1").unwrap_err();
        assert!(matches!(err, DriverError::InvalidConfig(_)));
    }

    #[test]
    fn parse_errors_surface() {
        let err = DriverConfig::from_toml("lookahead_const = \"far\"").unwrap_err();
        assert!(matches!(err, DriverError::ConfigParse(_)));
    }
}
