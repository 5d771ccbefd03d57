// Ramp - slewed gain applied to the mixed output
//
// The value moves toward the goal by a fraction of the remaining distance
// proportional to elapsed time, so it never jumps and never overshoots.

/// Smoothed scalar (value, goal, slew rate per second)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    pub value: f32,
    pub goal: f32,
    pub slew: f32,
}

impl Ramp {
    pub fn new(value: f32, goal: f32, slew: f32) -> Self {
        Self {
            value,
            goal,
            slew: slew.max(0.0),
        }
    }

    /// Set a new goal, keeping the slew rate
    pub fn update(&mut self, goal: f32) {
        self.goal = goal;
    }

    /// Set a new goal and slew rate
    pub fn update_with_slew(&mut self, goal: f32, slew: f32) {
        self.goal = goal;
        self.slew = slew.max(0.0);
    }

    /// Advance by `delta` seconds
    #[inline]
    pub fn interp(&mut self, delta: f32) {
        let step = (self.slew * delta).clamp(0.0, 1.0);
        self.value += (self.goal - self.value) * step;
    }

    /// Jump straight to a value (no smoothing)
    pub fn reset(&mut self, value: f32) {
        self.value = value;
        self.goal = value;
    }

    pub fn is_settled(&self) -> bool {
        (self.goal - self.value).abs() < 1e-6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_approaches_goal() {
        let mut ramp = Ramp::new(1.0, 1.0, 2.0);
        ramp.update(0.0);

        let mut previous = ramp.value;
        for _ in 0..200 {
            ramp.interp(512.0 / 44100.0);
            assert!(ramp.value <= previous);
            assert!(ramp.value >= 0.0);
            previous = ramp.value;
        }
        assert!(ramp.value < 0.01);
    }

    #[test]
    fn test_ramp_never_overshoots_large_step() {
        let mut ramp = Ramp::new(0.0, 1.0, 2.0);
        ramp.interp(10.0);
        assert_eq!(ramp.value, 1.0);
    }

    #[test]
    fn test_zero_delta_holds() {
        let mut ramp = Ramp::new(0.5, 1.0, 1.0);
        ramp.interp(0.0);
        assert_eq!(ramp.value, 0.5);
    }

    #[test]
    fn test_reset() {
        let mut ramp = Ramp::new(0.2, 1.0, 1.0);
        ramp.reset(0.7);
        assert!(ramp.is_settled());
        assert_eq!(ramp.goal, 0.7);
    }
}
