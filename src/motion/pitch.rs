//! View pitch accumulator with hard bounds

/// Accumulated view pitch in degrees, always within `[min, max]`
#[derive(Debug, Clone)]
pub struct PitchAccumulator {
    current: f32,
    min: f32,
    max: f32,
}

impl PitchAccumulator {
    /// Create a level accumulator. Swapped bounds are reordered.
    pub fn new(min: f32, max: f32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            current: 0.0_f32.clamp(min, max),
            min,
            max,
        }
    }

    /// Add `delta` degrees and clamp. Non-finite deltas are ignored.
    pub fn apply(&mut self, delta: f32) -> f32 {
        if delta.is_finite() {
            self.current = (self.current + delta).clamp(self.min, self.max);
        }
        self.current
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_within_bounds() {
        let mut pitch = PitchAccumulator::new(-80.0, 80.0);
        assert_eq!(pitch.apply(10.0), 10.0);
        assert_eq!(pitch.apply(-25.0), -15.0);
    }

    #[test]
    fn test_clamps_large_deltas() {
        let mut pitch = PitchAccumulator::new(-80.0, 80.0);
        assert_eq!(pitch.apply(1e9), 80.0);
        assert_eq!(pitch.apply(f32::MAX), 80.0);
        assert_eq!(pitch.apply(-1e9), -80.0);
    }

    #[test]
    fn test_ignores_non_finite() {
        let mut pitch = PitchAccumulator::new(-80.0, 80.0);
        pitch.apply(5.0);
        assert_eq!(pitch.apply(f32::NAN), 5.0);
        assert_eq!(pitch.apply(f32::INFINITY), 5.0);
    }

    #[test]
    fn test_never_leaves_bounds_for_any_sequence() {
        let mut pitch = PitchAccumulator::new(-80.0, 80.0);
        // Deterministic pseudo-random walk with large steps in both directions
        let mut state: u32 = 0x9e37_79b9;
        for _ in 0..10_000 {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let up = state & 1 == 0;
            let magnitude = (state >> 8) as f32 / 1000.0;
            let value = pitch.apply(if up { -magnitude } else { magnitude });
            assert!((-80.0..=80.0).contains(&value));
        }
    }

    #[test]
    fn test_swapped_bounds_are_reordered() {
        let pitch = PitchAccumulator::new(30.0, -30.0);
        assert_eq!(pitch.bounds(), (-30.0, 30.0));
    }

    #[test]
    fn test_start_level_clamped_into_bounds() {
        let pitch = PitchAccumulator::new(10.0, 20.0);
        assert_eq!(pitch.current(), 10.0);
    }
}
