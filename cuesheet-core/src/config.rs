//! Configuration types

use crate::{ConfigError, CuesheetError, CuesheetResult};
use serde::{Deserialize, Serialize};

/// Lower zoom bound in pixels per time unit.
pub const MIN_ZOOM: f64 = 10.0;
/// Upper zoom bound in pixels per time unit.
pub const MAX_ZOOM: f64 = 200.0;
/// Smallest grid division and smallest unsnapped clip duration.
pub const MIN_GRID_DIVISION: f64 = 0.1;

/// Scheduler policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Skip clips on muted tracks, or on non-solo tracks while any track is soloed
    pub respect_track_flags: bool,
    /// Cap on new dispatches per tick; eligible clips over the cap wait for the next tick
    pub max_dispatches_per_tick: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            respect_track_flags: true,
            max_dispatches_per_tick: None,
        }
    }
}

/// Initial timeline presentation and tempo parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineDefaults {
    /// Pixels per time unit
    pub zoom: f64,
    pub grid_division: f64,
    pub snap_to_grid: bool,
    /// When set, timeline values are beats at this tempo
    pub bpm: Option<f64>,
    /// Total timeline length; playback stops here unless a loop region wraps first
    pub length: f64,
}

impl Default for TimelineDefaults {
    fn default() -> Self {
        Self {
            zoom: 50.0,
            grid_division: 1.0,
            snap_to_grid: true,
            bpm: None,
            length: 300.0,
        }
    }
}

/// Master configuration struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub scheduler: SchedulerConfig,
    pub timeline: TimelineDefaults,
}

impl EngineConfig {
    /// Parse a TOML document. Missing keys fall back to defaults.
    pub fn from_toml_str(input: &str) -> CuesheetResult<Self> {
        let config: Self = toml::from_str(input).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `CUESHEET_RESPECT_TRACK_FLAGS`: apply mute/solo (default: true)
    /// - `CUESHEET_MAX_DISPATCHES_PER_TICK`: dispatch cap per tick (default: unlimited)
    /// - `CUESHEET_ZOOM`: initial zoom (default: 50)
    /// - `CUESHEET_GRID_DIVISION`: grid division (default: 1.0)
    /// - `CUESHEET_SNAP_TO_GRID`: snap edits to the grid (default: true)
    /// - `CUESHEET_BPM`: tempo; enables beat units (default: unset)
    /// - `CUESHEET_TIMELINE_LENGTH`: timeline length (default: 300)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            scheduler: SchedulerConfig {
                respect_track_flags: env_parse("CUESHEET_RESPECT_TRACK_FLAGS")
                    .unwrap_or(defaults.scheduler.respect_track_flags),
                max_dispatches_per_tick: env_parse("CUESHEET_MAX_DISPATCHES_PER_TICK")
                    .or(defaults.scheduler.max_dispatches_per_tick),
            },
            timeline: TimelineDefaults {
                zoom: env_parse("CUESHEET_ZOOM").unwrap_or(defaults.timeline.zoom),
                grid_division: env_parse("CUESHEET_GRID_DIVISION")
                    .unwrap_or(defaults.timeline.grid_division),
                snap_to_grid: env_parse("CUESHEET_SNAP_TO_GRID")
                    .unwrap_or(defaults.timeline.snap_to_grid),
                bpm: env_parse("CUESHEET_BPM").or(defaults.timeline.bpm),
                length: env_parse("CUESHEET_TIMELINE_LENGTH").unwrap_or(defaults.timeline.length),
            },
        }
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - zoom in [MIN_ZOOM, MAX_ZOOM]
    /// - grid_division >= MIN_GRID_DIVISION
    /// - bpm > 0 when set
    /// - length > 0
    /// - max_dispatches_per_tick > 0 when set
    pub fn validate(&self) -> CuesheetResult<()> {
        let timeline = &self.timeline;

        if !(MIN_ZOOM..=MAX_ZOOM).contains(&timeline.zoom) {
            return Err(invalid(
                "timeline.zoom",
                timeline.zoom,
                format!("zoom must be between {MIN_ZOOM} and {MAX_ZOOM}"),
            ));
        }

        if !timeline.grid_division.is_finite() || timeline.grid_division < MIN_GRID_DIVISION {
            return Err(invalid(
                "timeline.grid_division",
                timeline.grid_division,
                format!("grid_division must be at least {MIN_GRID_DIVISION}"),
            ));
        }

        if let Some(bpm) = timeline.bpm {
            if !bpm.is_finite() || bpm <= 0.0 {
                return Err(invalid("timeline.bpm", bpm, "bpm must be positive".to_string()));
            }
        }

        if !timeline.length.is_finite() || timeline.length <= 0.0 {
            return Err(invalid(
                "timeline.length",
                timeline.length,
                "length must be positive".to_string(),
            ));
        }

        if self.scheduler.max_dispatches_per_tick == Some(0) {
            return Err(invalid(
                "scheduler.max_dispatches_per_tick",
                0,
                "max_dispatches_per_tick must be positive when set".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

fn invalid(field: &str, value: impl ToString, reason: String) -> CuesheetError {
    CuesheetError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zoom_out_of_range() {
        let mut config = EngineConfig::default();
        config.timeline.zoom = 500.0;
        match config.validate() {
            Err(CuesheetError::Config(ConfigError::InvalidValue { field, .. })) => {
                assert_eq!(field, "timeline.zoom");
            }
            other => panic!("expected zoom error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_zero_bpm() {
        let mut config = EngineConfig::default();
        config.timeline.bpm = Some(0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_dispatch_cap() {
        let mut config = EngineConfig::default();
        config.scheduler.max_dispatches_per_tick = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_partial_document() {
        let config = EngineConfig::from_toml_str(
            r#"
            [scheduler]
            max_dispatches_per_tick = 4

            [timeline]
            bpm = 120.0
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.scheduler.max_dispatches_per_tick, Some(4));
        assert!(config.scheduler.respect_track_flags);
        assert_eq!(config.timeline.bpm, Some(120.0));
        assert_eq!(config.timeline.zoom, 50.0);
    }

    #[test]
    fn test_from_toml_reports_parse_errors() {
        let result = EngineConfig::from_toml_str("[timeline\nzoom = ");
        assert!(matches!(
            result,
            Err(CuesheetError::Config(ConfigError::Parse { .. }))
        ));
    }

    #[test]
    fn test_from_toml_validates() {
        let result = EngineConfig::from_toml_str("[timeline]\ngrid_division = 0.01\n");
        assert!(result.is_err());
    }
}
