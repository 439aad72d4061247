//! Gear shift schedule with a hysteresis band.

use serde::{Deserialize, Serialize};

/// Speed band for gear selection, as fractions of each mover's `rpmMax`.
///
/// A gear is usable while its load (highest `speed / max_speed` over the
/// movers geared through the shift gearbox) stays at or below `upshift`.
/// A downshift is only taken when the lower gear lands at or below
/// `downshift`, which keeps the schedule from hunting across the band edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftSchedule {
    pub upshift: f64,
    pub downshift: f64,
}

impl Default for ShiftSchedule {
    fn default() -> Self {
        Self {
            upshift: 0.95,
            downshift: 0.85,
        }
    }
}

impl ShiftSchedule {
    /// Pick the gear for the next step.
    ///
    /// `load(gear)` is the speed fraction the movers would run at in `gear`.
    pub fn select(&self, current: usize, gear_count: usize, load: impl Fn(usize) -> f64) -> usize {
        if gear_count <= 1 {
            return 0;
        }
        let current = current.min(gear_count - 1);

        if load(current) > self.upshift {
            return (0..gear_count)
                .find(|g| load(*g) <= self.upshift)
                .unwrap_or(gear_count - 1);
        }

        (0..current)
            .find(|g| load(*g) <= self.downshift)
            .unwrap_or(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Load falls with gear index, like a real gearbox at fixed road speed.
    fn loads(v: f64) -> impl Fn(usize) -> f64 {
        let ratios = [4.0, 2.0, 1.0];
        move |g| v * ratios[g] / 40.0
    }

    #[test]
    fn launches_in_first() {
        let s = ShiftSchedule::default();
        assert_eq!(s.select(0, 3, loads(0.0)), 0);
    }

    #[test]
    fn upshifts_past_band() {
        let s = ShiftSchedule::default();
        // First gear at 1.0, second at 0.5.
        assert_eq!(s.select(0, 3, loads(10.0)), 1);
    }

    #[test]
    fn overspeed_everywhere_takes_top_gear() {
        let s = ShiftSchedule::default();
        assert_eq!(s.select(0, 3, loads(100.0)), 2);
    }

    #[test]
    fn hysteresis_blocks_downshift() {
        let s = ShiftSchedule::default();
        // First gear would sit at 0.9: inside the band but above 0.85.
        assert_eq!(s.select(1, 3, loads(9.0)), 1);
        // At 0.8 the downshift is taken.
        assert_eq!(s.select(1, 3, loads(8.0)), 0);
    }

    #[test]
    fn single_gear() {
        let s = ShiftSchedule::default();
        assert_eq!(s.select(4, 1, |_| 2.0), 0);
    }
}
