//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the transit-config.toml file.
//! It provides a centralized way to configure the power schedule, the transit stop and
//! route, the clock source, and the LED matrix layout.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Default configuration file, relative to the working directory.
pub const CONFIG_FILE: &str = "transit-config.toml";

/// Application configuration loaded from transit-config.toml
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Power window, restart hour, feature toggles and loop timing
    pub schedule: ScheduleConfig,
    /// Transit stop and route to show
    pub transit: TransitConfig,
    /// Where the current time comes from
    pub clock: ClockConfig,
    /// LED matrix geometry and palette
    pub display: DisplayConfig,
}

/// Immutable loop schedule. Hours are UTC.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// First hour the panel is lit
    pub on_hour: u8,
    /// First hour the panel is dark; may be smaller than `on_hour` for overnight windows
    pub off_hour: u8,
    /// Hour at which the process exits so a supervisor can restart it
    pub restart_hour: u8,
    /// Emit per-cycle diagnostics
    pub verbose: bool,
    /// Show the alert marker when the route has a posted alert
    pub show_alert: bool,
    /// Blink the live marker while data is fresh
    pub show_live: bool,
    /// Delay between animation ticks
    pub tick_latency_seconds: f32,
    /// Ticks between live marker toggles
    pub live_blink_period_ticks: u32,
    /// Wait between clock polls while the panel is dark
    pub idle_interval_seconds: u64,
    /// Wait before retrying when nothing has ever been shown
    pub setup_retry_seconds: u64,
    /// Restart when available memory drops below this many bytes
    pub low_memory_threshold_bytes: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            on_hour: 12,
            off_hour: 3,
            restart_hour: 4,
            verbose: false,
            show_alert: true,
            show_live: true,
            tick_latency_seconds: 0.06,
            live_blink_period_ticks: 6,
            idle_interval_seconds: 10,
            setup_retry_seconds: 5,
            low_memory_threshold_bytes: 1000,
        }
    }
}

/// Transit stop and route served by the Transiter API
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct TransitConfig {
    /// Stop identifier (e.g., "Q04" for 86th Street)
    pub stop_id: String,
    /// Route identifier used for alerts and the badge placeholder
    pub route_id: String,
    /// Transiter system endpoint, without trailing slash
    pub base_url: String,
    /// Accepted direction labels, compared case-insensitively
    pub directions: Vec<String>,
}

impl Default for TransitConfig {
    fn default() -> Self {
        TransitConfig {
            stop_id: "Q04".to_string(),
            route_id: "Q".to_string(),
            base_url: "https://demo.transiter.dev/systems/us-ny-subway".to_string(),
            directions: vec![
                "downtown and brooklyn".to_string(),
                "downtown".to_string(),
                "brooklyn".to_string(),
            ],
        }
    }
}

/// Clock source configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Remote time service returning `YYYY:MM:DD:HH:MM:SS` (UTC).
    /// When unset the host clock is used.
    pub url: Option<String>,
}

/// LED matrix layout and colors (0xRRGGBB)
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Matrix width in pixels
    pub width: u32,
    /// Matrix height in pixels
    pub height: u32,
    /// Advance width of one glyph in pixels
    pub char_width: u32,
    /// Left edge of the text column
    pub text_x: i32,
    /// Width of the visible text column
    pub text_column_width: u32,
    pub background: u32,
    pub route_badge: u32,
    pub text: u32,
    pub alert: u32,
    pub live: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            width: 64,
            height: 32,
            char_width: 6,
            text_x: 25,
            text_column_width: 36,
            background: 0x000000,
            route_badge: 0xFCB80A,
            text: 0x919492,
            alert: 0xB22222,
            live: 0x919492,
        }
    }
}

/// Reasons a loaded configuration is rejected
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be an hour in 0..=23, got {value}")]
    HourOutOfRange { field: &'static str, value: u8 },

    #[error("display.char_width must be positive")]
    ZeroCharWidth,

    #[error("text column ({x} + {width}) does not fit a {display}px wide display")]
    TextColumnOverflow { x: i32, width: u32, display: u32 },

    #[error("schedule.tick_latency_seconds must be a non-negative number")]
    InvalidLatency,

    #[error("display of {width}x{height} pixels is too large")]
    DisplayTooLarge { width: u32, height: u32 },
}

impl Config {
    /// Load configuration from transit-config.toml file
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => match config.validate() {
                    Ok(()) => {
                        info!(
                            stop = %config.transit.stop_id,
                            route = %config.transit.route_id,
                            "loaded configuration"
                        );
                        config
                    }
                    Err(e) => {
                        warn!("invalid configuration in {}: {e}; using defaults", path.display());
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!("invalid config file format: {e}; using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!("no config file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Save current configuration as pretty TOML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!("configuration saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.schedule;
        for (field, value) in [
            ("schedule.on_hour", s.on_hour),
            ("schedule.off_hour", s.off_hour),
            ("schedule.restart_hour", s.restart_hour),
        ] {
            if value > 23 {
                return Err(ConfigError::HourOutOfRange { field, value });
            }
        }
        if !(s.tick_latency_seconds >= 0.0 && s.tick_latency_seconds.is_finite()) {
            return Err(ConfigError::InvalidLatency);
        }

        let d = &self.display;
        if d.char_width == 0 {
            return Err(ConfigError::ZeroCharWidth);
        }
        if d.width.checked_mul(d.height).is_none() {
            return Err(ConfigError::DisplayTooLarge {
                width: d.width,
                height: d.height,
            });
        }
        let column_end = u32::try_from(d.text_x)
            .ok()
            .and_then(|x| x.checked_add(d.text_column_width));
        if column_end.map_or(true, |end| end > d.width) {
            return Err(ConfigError::TextColumnOverflow {
                x: d.text_x,
                width: d.text_column_width,
                display: d.width,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.transit.stop_id, "Q04");
        assert_eq!(config.transit.route_id, "Q");
        assert_eq!(config.schedule.on_hour, 12);
        assert_eq!(config.schedule.off_hour, 3);
        assert_eq!(config.schedule.restart_hour, 4);
        assert_eq!(config.display.width, 64);
        assert!(config.clock.url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.transit.stop_id = "R20".to_string();
        config.schedule.verbose = true;
        config.save(file.path()).unwrap();

        let loaded = Config::load_from_path(file.path());
        assert_eq!(loaded.transit.stop_id, "R20");
        assert!(loaded.schedule.verbose);
        assert_eq!(loaded.transit.directions, config.transit.directions);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[schedule]\non_hour = 8\noff_hour = 22").unwrap();

        let config = Config::load_from_path(file.path());
        assert_eq!(config.schedule.on_hour, 8);
        assert_eq!(config.schedule.off_hour, 22);
        assert_eq!(config.schedule.restart_hour, 4);
        assert_eq!(config.display.route_badge, 0xFCB80A);
    }

    #[test]
    fn test_out_of_range_hour_falls_back() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[schedule]\non_hour = 24").unwrap();

        let config = Config::load_from_path(file.path());
        assert_eq!(config.schedule.on_hour, 12);
    }

    #[test]
    fn test_validate_rejects_bad_layout() {
        let mut config = Config::default();
        config.display.char_width = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroCharWidth));

        let mut config = Config::default();
        config.display.text_column_width = 60;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TextColumnOverflow { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_overflowing_sizes() {
        let mut config = Config::default();
        config.display.text_column_width = u32::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TextColumnOverflow { .. })
        ));

        let mut config = Config::default();
        config.display.width = u32::MAX;
        config.display.height = 2;
        assert_eq!(
            config.validate(),
            Err(ConfigError::DisplayTooLarge {
                width: u32::MAX,
                height: 2
            })
        );
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.transit.stop_id, "Q04");
    }
}
