//! Playhead and timeline playback state.
//!
//! Playback is advanced explicitly through [`TimelineState::tick`], so the
//! scheduler can be driven deterministically by tests or by any clock.

use crate::config::{TimelineDefaults, MAX_ZOOM, MIN_GRID_DIVISION, MIN_ZOOM};
use crate::{beats_to_seconds, seconds_to_beats, ConfigError};
use serde::{Deserialize, Serialize};

/// Replay region. Playback that reaches `end` jumps back to `start`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopRegion {
    pub start: f64,
    pub end: f64,
}

/// Result of advancing the playhead by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Advance {
    pub from: f64,
    pub to: f64,
    /// The loop region wrapped during this tick
    pub looped: bool,
    /// Playback hit the end of the timeline and stopped
    pub stopped: bool,
}

/// Process-local playback state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineState {
    pub position: f64,
    pub playing: bool,
    pub loop_region: Option<LoopRegion>,
    pub zoom: f64,
    pub grid_division: f64,
    pub snap_to_grid: bool,
    /// When set, all time values on this timeline are beats
    pub bpm: Option<f64>,
    pub length: f64,
}

impl Default for TimelineState {
    fn default() -> Self {
        Self::from_defaults(&TimelineDefaults::default())
    }
}

impl TimelineState {
    /// Build a stopped timeline at position zero.
    pub fn from_defaults(defaults: &TimelineDefaults) -> Self {
        Self {
            position: 0.0,
            playing: false,
            loop_region: None,
            zoom: defaults.zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            grid_division: defaults.grid_division.max(MIN_GRID_DIVISION),
            snap_to_grid: defaults.snap_to_grid,
            bpm: defaults.bpm,
            length: defaults.length,
        }
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn toggle(&mut self) {
        self.playing = !self.playing;
    }

    /// Move the playhead. Negative positions clamp to zero.
    pub fn seek(&mut self, position: f64) {
        self.position = if position.is_finite() { position.max(0.0) } else { 0.0 };
    }

    /// Set the loop region. Requires `0 <= start < end`.
    pub fn set_loop(&mut self, start: f64, end: f64) -> Result<(), ConfigError> {
        if !(start.is_finite() && end.is_finite()) || start < 0.0 || start >= end {
            return Err(ConfigError::InvalidValue {
                field: "loop_region".to_string(),
                value: format!("{start}..{end}"),
                reason: "loop start must be non-negative and before loop end".to_string(),
            });
        }
        self.loop_region = Some(LoopRegion { start, end });
        Ok(())
    }

    pub fn clear_loop(&mut self) {
        self.loop_region = None;
    }

    /// Set zoom, clamped to [MIN_ZOOM, MAX_ZOOM].
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Set the grid division, never below MIN_GRID_DIVISION.
    pub fn set_grid_division(&mut self, division: f64) {
        self.grid_division = division.max(MIN_GRID_DIVISION);
    }

    /// Set or clear the tempo.
    pub fn set_bpm(&mut self, bpm: Option<f64>) {
        self.bpm = bpm.filter(|b| b.is_finite() && *b > 0.0);
    }

    /// Convert a wall-clock delta in seconds to timeline units.
    pub fn seconds_to_units(&self, seconds: f64) -> f64 {
        match self.bpm {
            Some(bpm) => seconds_to_beats(seconds, bpm),
            None => seconds,
        }
    }

    /// Convert timeline units to seconds.
    pub fn units_to_seconds(&self, units: f64) -> f64 {
        match self.bpm {
            Some(bpm) => beats_to_seconds(units, bpm),
            None => units,
        }
    }

    /// Advance the playhead by `delta` timeline units.
    ///
    /// Does nothing while paused. Reaching the loop end wraps to the loop
    /// start; reaching the timeline length without a loop stops playback.
    pub fn tick(&mut self, delta: f64) -> Advance {
        let from = self.position;
        if !self.playing || !delta.is_finite() || delta <= 0.0 {
            return Advance {
                from,
                to: from,
                looped: false,
                stopped: false,
            };
        }

        let mut to = from + delta;
        let mut looped = false;
        let mut stopped = false;

        match self.loop_region {
            Some(region) if from <= region.end && to >= region.end => {
                to = region.start;
                looped = true;
            }
            _ => {
                if to >= self.length {
                    to = self.length;
                    self.playing = false;
                    stopped = true;
                }
            }
        }

        self.position = to;
        Advance {
            from,
            to,
            looped,
            stopped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing() -> TimelineState {
        let mut state = TimelineState::default();
        state.play();
        state
    }

    #[test]
    fn test_tick_paused_is_noop() {
        let mut state = TimelineState::default();
        let advance = state.tick(1.0);
        assert_eq!(advance.to, 0.0);
        assert_eq!(state.position, 0.0);
    }

    #[test]
    fn test_tick_advances() {
        let mut state = playing();
        state.tick(0.5);
        let advance = state.tick(0.25);
        assert_eq!(advance.from, 0.5);
        assert_eq!(state.position, 0.75);
        assert!(!advance.looped);
    }

    #[test]
    fn test_tick_ignores_negative_delta() {
        let mut state = playing();
        state.seek(3.0);
        state.tick(-1.0);
        assert_eq!(state.position, 3.0);
    }

    #[test]
    fn test_loop_wraps_at_end() {
        let mut state = playing();
        state.set_loop(2.0, 4.0).expect("valid loop");
        state.seek(3.5);

        let advance = state.tick(0.5);
        assert!(advance.looped);
        assert_eq!(state.position, 2.0);
        assert!(state.playing);
    }

    #[test]
    fn test_playhead_past_loop_end_does_not_wrap() {
        let mut state = playing();
        state.set_loop(2.0, 4.0).expect("valid loop");
        state.seek(10.0);

        let advance = state.tick(1.0);
        assert!(!advance.looped);
        assert_eq!(state.position, 11.0);
    }

    #[test]
    fn test_stops_at_timeline_end() {
        let mut state = playing();
        state.seek(299.5);
        let advance = state.tick(1.0);
        assert!(advance.stopped);
        assert_eq!(state.position, 300.0);
        assert!(!state.playing);
    }

    #[test]
    fn test_set_loop_rejects_inverted_region() {
        let mut state = TimelineState::default();
        assert!(state.set_loop(5.0, 5.0).is_err());
        assert!(state.set_loop(6.0, 5.0).is_err());
        assert!(state.loop_region.is_none());
    }

    #[test]
    fn test_seek_clamps_to_zero() {
        let mut state = TimelineState::default();
        state.seek(-4.0);
        assert_eq!(state.position, 0.0);
    }

    #[test]
    fn test_view_controls_clamp() {
        let mut state = TimelineState::default();
        state.set_zoom(1000.0);
        assert_eq!(state.zoom, MAX_ZOOM);
        state.set_zoom(1.0);
        assert_eq!(state.zoom, MIN_ZOOM);
        state.set_grid_division(0.0);
        assert_eq!(state.grid_division, MIN_GRID_DIVISION);
    }

    #[test]
    fn test_units_follow_tempo() {
        let mut state = TimelineState::default();
        assert_eq!(state.seconds_to_units(2.0), 2.0);
        state.set_bpm(Some(120.0));
        assert_eq!(state.seconds_to_units(2.0), 4.0);
        assert_eq!(state.units_to_seconds(4.0), 2.0);
        state.set_bpm(Some(-1.0));
        assert!(state.bpm.is_none());
    }
}
