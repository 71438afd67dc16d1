//! Engine time base.
//!
//! Positions, durations and timer deadlines are expressed in ticks of 100 ns,
//! the unit platform media engines report. Host-facing APIs convert to
//! milliseconds at the edge.

/// Signed presentation time in 100 ns units.
pub type Ticks = i64;

pub const TICKS_PER_MILLISECOND: Ticks = 10_000;
pub const TICKS_PER_SECOND: Ticks = 1_000 * TICKS_PER_MILLISECOND;

/// Converts fractional milliseconds to ticks, rounding to the nearest tick.
pub fn ticks_from_millis(millis: f64) -> Ticks {
    (millis * TICKS_PER_MILLISECOND as f64).round() as Ticks
}

/// Converts ticks to fractional milliseconds.
pub fn ticks_to_millis(ticks: Ticks) -> f64 {
    ticks as f64 / TICKS_PER_MILLISECOND as f64
}

/// Converts a `Duration` to ticks, saturating at `Ticks::MAX`.
pub fn ticks_from_duration(duration: std::time::Duration) -> Ticks {
    Ticks::try_from(duration.as_nanos() / 100).unwrap_or(Ticks::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_conversions() {
        assert_eq!(ticks_from_millis(200.0), 2_000_000);
        assert_eq!(ticks_from_millis(0.04), 400);
        assert_eq!(ticks_to_millis(1_000_000), 100.0);
    }

    #[test]
    fn test_duration_conversions() {
        let third = std::time::Duration::from_millis(333);
        assert_eq!(ticks_from_duration(third), 3_330_000);
        assert_eq!(ticks_from_duration(std::time::Duration::MAX), Ticks::MAX);
    }
}
