//! Configuration for the Beamguard controller.
//!
//! This module handles parsing configuration from environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `BEAMGUARD_EVIDENCE_DIR` | No | `~/.beamguard/evidence` | Evidence directory root |
//! | `BEAMGUARD_PORT` | No | 8000 | Evidence publisher HTTP port |
//! | `BEAMGUARD_SAMPLE_SETTLE_MS` | No | 50 | Settling delay before each sensor read (ms, >= 1) |
//! | `BEAMGUARD_DEBOUNCE_THRESHOLD` | No | 10 | Consecutive hazard samples before the beam-break signal is trusted (>= 1) |
//! | `BEAMGUARD_LASER_PIN` | No | 5 | BCM pin of the beam-break detector |
//! | `BEAMGUARD_PIR_PIN` | No | 27 | BCM pin of the PIR motion detector |
//! | `BEAMGUARD_BUZZER_PIN` | No | 26 | BCM pin of the buzzer |
//! | `BEAMGUARD_EMITTER_PIN` | No | (none) | BCM pin of a pulsed laser emitter |
//! | `BEAMGUARD_BUZZER_ACTIVE_LOW` | No | true | Buzzer sounds when the line is driven low |
//! | `BEAMGUARD_VIDEO_FPS` | No | 10 | Recording frame rate |
//!
//! The debounce threshold is expressed in sample counts: changing the
//! settling delay changes the effective debounce latency.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use directories::BaseDirs;
use thiserror::Error;

/// Default evidence directory relative to home.
const DEFAULT_EVIDENCE_DIR: &str = ".beamguard/evidence";

/// Default publisher port.
const DEFAULT_PORT: u16 = 8000;

/// Default per-read settling delay in milliseconds.
const DEFAULT_SETTLE_MS: u64 = 50;

/// Default debounce threshold in sample counts.
const DEFAULT_DEBOUNCE_THRESHOLD: u32 = 10;

/// Default BCM pin assignments.
const DEFAULT_LASER_PIN: u8 = 5;
const DEFAULT_PIR_PIN: u8 = 27;
const DEFAULT_BUZZER_PIN: u8 = 26;

/// Default recording frame rate.
const DEFAULT_VIDEO_FPS: f64 = 10.0;

/// Errors that can occur during configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to determine home directory.
    #[error("failed to determine home directory")]
    NoHomeDirectory,
}

/// Configuration for the Beamguard controller.
#[derive(Debug, Clone)]
pub struct Config {
    /// Evidence directory root (photos, videos, event log).
    pub evidence_dir: PathBuf,

    /// Port the evidence publisher binds to.
    pub port: u16,

    /// Settling delay enforced before each sensor read.
    pub sample_settle: Duration,

    /// Consecutive hazard samples required before the beam-break signal
    /// is trusted.
    pub debounce_threshold: u32,

    /// BCM pin of the beam-break detector input.
    pub laser_pin: u8,

    /// BCM pin of the PIR motion detector input.
    pub pir_pin: u8,

    /// BCM pin of the buzzer output.
    pub buzzer_pin: u8,

    /// BCM pin of a pulsed laser emitter, if the sensor variant needs
    /// one asserted around each read.
    pub emitter_pin: Option<u8>,

    /// Whether the buzzer sounds on a low line level.
    pub buzzer_active_low: bool,

    /// Frame rate for recording sessions.
    pub video_fps: f64,
}

impl Config {
    /// Creates a new `Config` by parsing environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if any `BEAMGUARD_*` variable is set to a
    /// value that does not parse or fails validation, or if the home
    /// directory cannot be determined for the default evidence path.
    pub fn from_env() -> Result<Self, ConfigError> {
        let evidence_dir = match env::var("BEAMGUARD_EVIDENCE_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => {
                let base_dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDirectory)?;
                base_dirs.home_dir().join(DEFAULT_EVIDENCE_DIR)
            }
        };

        let port = parse_var("BEAMGUARD_PORT", DEFAULT_PORT)?;

        let settle_ms: u64 = parse_var("BEAMGUARD_SAMPLE_SETTLE_MS", DEFAULT_SETTLE_MS)?;
        if settle_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "BEAMGUARD_SAMPLE_SETTLE_MS".to_string(),
                message: "settling delay must be at least 1 ms".to_string(),
            });
        }

        let debounce_threshold: u32 =
            parse_var("BEAMGUARD_DEBOUNCE_THRESHOLD", DEFAULT_DEBOUNCE_THRESHOLD)?;
        if debounce_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                key: "BEAMGUARD_DEBOUNCE_THRESHOLD".to_string(),
                message: "debounce threshold must be at least 1".to_string(),
            });
        }

        let laser_pin = parse_var("BEAMGUARD_LASER_PIN", DEFAULT_LASER_PIN)?;
        let pir_pin = parse_var("BEAMGUARD_PIR_PIN", DEFAULT_PIR_PIN)?;
        let buzzer_pin = parse_var("BEAMGUARD_BUZZER_PIN", DEFAULT_BUZZER_PIN)?;

        let emitter_pin = match env::var("BEAMGUARD_EMITTER_PIN") {
            Ok(val) => Some(val.parse::<u8>().map_err(|_| ConfigError::InvalidValue {
                key: "BEAMGUARD_EMITTER_PIN".to_string(),
                message: format!("expected BCM pin number, got '{val}'"),
            })?),
            Err(_) => None,
        };

        let buzzer_active_low = match env::var("BEAMGUARD_BUZZER_ACTIVE_LOW") {
            Ok(val) => match val.to_ascii_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "BEAMGUARD_BUZZER_ACTIVE_LOW".to_string(),
                        message: format!("expected true/false, got '{val}'"),
                    })
                }
            },
            Err(_) => true,
        };

        let video_fps: f64 = parse_var("BEAMGUARD_VIDEO_FPS", DEFAULT_VIDEO_FPS)?;
        if !video_fps.is_finite() || video_fps <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "BEAMGUARD_VIDEO_FPS".to_string(),
                message: "frame rate must be a positive number".to_string(),
            });
        }

        Ok(Self {
            evidence_dir,
            port,
            sample_settle: Duration::from_millis(settle_ms),
            debounce_threshold,
            laser_pin,
            pir_pin,
            buzzer_pin,
            emitter_pin,
            buzzer_active_low,
            video_fps,
        })
    }
}

/// Parses an optional environment variable, falling back to `default`.
fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(val) => val.parse::<T>().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("could not parse '{val}'"),
        }),
        Err(_) => Ok(default),
    }
}
