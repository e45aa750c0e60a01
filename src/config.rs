//! Simulation configuration
//!
//! One `SimConfig` is built at startup and shared as `Arc<SimConfig>`.
//! Every simulated wait reads the acceleration factor through it.

use std::time::Duration;
use thiserror::Error;

/// Characters per second consumed while "reading" others' messages
pub const DEFAULT_READ_SPEED: f64 = 30.0;

/// Characters per second produced while "typing" a reply
pub const DEFAULT_WRITE_SPEED: f64 = 5.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Acceleration factor must be a finite number >= 0, got {0}")]
    InvalidAcceleration(f64),
    #[error("{name} must be a finite number > 0, got {value}")]
    InvalidSpeed { name: &'static str, value: f64 },
    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Timing and mode configuration shared by every participant
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Divisor applied to every simulated wait. 0 disables waiting entirely.
    pub acceleration_factor: f64,
    pub read_speed: f64,
    pub write_speed: f64,
    /// Upper bound on simulated time between leaving IDLE and replying
    pub max_response: Option<Duration>,
    /// Bypass the completion provider and reply with a placeholder
    pub offline: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            acceleration_factor: 1.0,
            read_speed: DEFAULT_READ_SPEED,
            write_speed: DEFAULT_WRITE_SPEED,
            max_response: None,
            offline: false,
        }
    }
}

impl SimConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(factor) = env_f64("CHATROOM_SPEEDUP")? {
            config.acceleration_factor = factor;
        }
        if let Some(speed) = env_f64("CHATROOM_READ_SPEED")? {
            config.read_speed = speed;
        }
        if let Some(speed) = env_f64("CHATROOM_WRITE_SPEED")? {
            config.write_speed = speed;
        }
        if let Some(secs) = env_f64("CHATROOM_MAX_RESPONSE_SECS")? {
            config.max_response = Some(duration_from_secs("CHATROOM_MAX_RESPONSE_SECS", secs)?);
        }
        if let Ok(value) = std::env::var("CHATROOM_OFFLINE") {
            config.offline = parse_flag("CHATROOM_OFFLINE", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.acceleration_factor.is_finite() || self.acceleration_factor < 0.0 {
            return Err(ConfigError::InvalidAcceleration(self.acceleration_factor));
        }
        for (name, value) in [
            ("read_speed", self.read_speed),
            ("write_speed", self.write_speed),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidSpeed { name, value });
            }
        }
        Ok(())
    }

    /// Simulated time needed to read `chars` characters
    pub fn reading_time(&self, chars: usize) -> Duration {
        chars_to_duration(chars, self.read_speed)
    }

    /// Simulated time needed to type `chars` characters
    pub fn writing_time(&self, chars: usize) -> Duration {
        chars_to_duration(chars, self.write_speed)
    }
}

#[allow(clippy::cast_precision_loss)] // message lengths are far below 2^52
fn chars_to_duration(chars: usize, speed: f64) -> Duration {
    Duration::try_from_secs_f64(chars as f64 / speed).unwrap_or(Duration::MAX)
}

fn env_f64(var: &'static str) -> Result<Option<f64>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
        Err(_) => Ok(None),
    }
}

fn duration_from_secs(var: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidEnv {
        var,
        value: secs.to_string(),
    })
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            var,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.offline);
        assert!(config.max_response.is_none());
    }

    #[test]
    fn test_rejects_negative_acceleration() {
        let config = SimConfig {
            acceleration_factor: -1.0,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAcceleration(_))
        ));
    }

    #[test]
    fn test_zero_acceleration_is_allowed() {
        let config = SimConfig {
            acceleration_factor: 0.0,
            ..SimConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_speed() {
        let config = SimConfig {
            write_speed: 0.0,
            ..SimConfig::default()
        };
        match config.validate() {
            Err(ConfigError::InvalidSpeed { name, .. }) => assert_eq!(name, "write_speed"),
            other => panic!("Expected InvalidSpeed, got {other:?}"),
        }
    }

    #[test]
    fn test_reading_and_writing_time() {
        let config = SimConfig::default();
        assert_eq!(config.reading_time(30), Duration::from_secs(1));
        assert_eq!(config.writing_time(10), Duration::from_secs(2));
        assert_eq!(config.reading_time(0), Duration::ZERO);
    }

    #[test]
    fn test_overflowing_time_saturates() {
        let config = SimConfig {
            read_speed: f64::MIN_POSITIVE,
            write_speed: f64::MIN_POSITIVE,
            ..SimConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.reading_time(10), Duration::MAX);
        assert_eq!(config.writing_time(10), Duration::MAX);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("X", "true").unwrap());
        assert!(parse_flag("X", "1").unwrap());
        assert!(!parse_flag("X", "off").unwrap());
        assert!(parse_flag("X", "maybe").is_err());
    }
}
