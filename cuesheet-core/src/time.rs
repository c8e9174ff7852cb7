//! Time-unit helpers for the timeline axis

/// Convert seconds to beats at `bpm`.
pub fn seconds_to_beats(seconds: f64, bpm: f64) -> f64 {
    seconds * bpm / 60.0
}

/// Convert beats to seconds at `bpm`.
pub fn beats_to_seconds(beats: f64, bpm: f64) -> f64 {
    beats * 60.0 / bpm
}

/// Round `value` to the nearest multiple of `grid`. A non-positive grid
/// leaves the value untouched.
pub fn snap_to_grid(value: f64, grid: f64) -> f64 {
    if grid <= 0.0 || !grid.is_finite() {
        return value;
    }
    (value / grid).round() * grid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beat_conversion_at_120_bpm() {
        assert_eq!(seconds_to_beats(30.0, 120.0), 60.0);
        assert_eq!(beats_to_seconds(60.0, 120.0), 30.0);
    }

    #[test]
    fn test_snap_to_grid() {
        assert_eq!(snap_to_grid(2.4, 1.0), 2.0);
        assert_eq!(snap_to_grid(2.6, 1.0), 3.0);
        assert_eq!(snap_to_grid(7.0, 4.0), 8.0);
        assert_eq!(snap_to_grid(2.4, 0.0), 2.4);
    }
}
