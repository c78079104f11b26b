/// Level Tracker - windowed maximum of peak estimates plus exponential average
///
/// The window maximum rejects single-sample transients; the exponential
/// average follows sustained loudness changes.
use super::ring::SlidingMax;

#[derive(Debug, Clone)]
pub struct LevelTracker {
    history: SlidingMax,
    short_history: SlidingMax,
    average_level: f32,
    initial_level: f32,
    smoothing: f32,
    short_term_weight: f32,
}

impl LevelTracker {
    /// # Arguments
    /// * `window_samples` - Length of the long-term level history
    /// * `short_window_samples` - Length of the short-term window
    /// * `initial_level` - Value the windows and the average start from
    /// * `smoothing` - Exponential smoothing factor in (0, 1]
    /// * `short_term_weight` - Blend of the short-term level in [0, 1]
    pub fn new(
        window_samples: usize,
        short_window_samples: usize,
        initial_level: f32,
        smoothing: f32,
        short_term_weight: f32,
    ) -> Self {
        let mut tracker = Self {
            history: SlidingMax::new(window_samples),
            short_history: SlidingMax::new(short_window_samples),
            average_level: initial_level,
            initial_level,
            smoothing,
            short_term_weight,
        };
        tracker.reset();
        tracker
    }

    /// Slide the windows by one peak estimate and update the running average
    #[inline]
    pub fn update(&mut self, peak: f32) -> f32 {
        self.history.push(peak);
        self.short_history.push(peak);

        let level = self.short_term_weight * self.short_history.max()
            + (1.0 - self.short_term_weight) * self.history.max();
        self.average_level = (1.0 - self.smoothing) * self.average_level + self.smoothing * level;
        self.average_level
    }

    /// Maximum over the whole level history
    pub fn long_term_level(&self) -> f32 {
        self.history.max()
    }

    pub fn short_term_level(&self) -> f32 {
        self.short_history.max()
    }

    pub fn average_level(&self) -> f32 {
        self.average_level
    }

    pub fn window_len(&self) -> usize {
        self.history.len()
    }

    /// Change the level the windows start from; takes effect on the next reset
    pub fn set_initial_level(&mut self, level: f32) {
        self.initial_level = level;
    }

    /// Refill both windows with the initial level and restart the average there
    pub fn reset(&mut self) {
        self.history.fill(self.initial_level);
        self.short_history.fill(self.initial_level);
        self.average_level = self.initial_level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_initial_level() {
        let tracker = LevelTracker::new(10, 2, 0.5, 0.1, 0.0);
        assert_eq!(tracker.average_level(), 0.5);
        assert_eq!(tracker.long_term_level(), 0.5);
        assert_eq!(tracker.window_len(), 10);
    }

    #[test]
    fn test_window_length_is_constant() {
        let mut tracker = LevelTracker::new(10, 2, 0.5, 0.1, 0.0);
        for _ in 0..25 {
            tracker.update(0.2);
            assert_eq!(tracker.window_len(), 10);
        }
    }

    #[test]
    fn test_single_transient_is_held_then_released() {
        let mut tracker = LevelTracker::new(4, 2, 0.1, 0.1, 0.0);
        tracker.update(0.9);
        assert_eq!(tracker.long_term_level(), 0.9);

        for _ in 0..3 {
            tracker.update(0.1);
        }
        assert_eq!(tracker.long_term_level(), 0.9);

        tracker.update(0.1);
        assert_eq!(tracker.long_term_level(), 0.1);
    }

    #[test]
    fn test_exponential_average_step() {
        let mut tracker = LevelTracker::new(1, 1, 1.0, 0.1, 0.0);
        let avg = tracker.update(0.0);
        assert!((avg - 0.9).abs() < 1e-6);
        let avg = tracker.update(0.0);
        assert!((avg - 0.81).abs() < 1e-6);
    }

    #[test]
    fn test_converges_to_sustained_level() {
        let mut tracker = LevelTracker::new(50, 10, 0.7, 0.1, 0.0);
        for _ in 0..1000 {
            tracker.update(0.25);
        }
        assert!((tracker.average_level() - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_short_term_blend_reacts_sooner() {
        let mut long_only = LevelTracker::new(1000, 10, 1.0, 0.1, 0.0);
        let mut blended = LevelTracker::new(1000, 10, 1.0, 0.1, 0.7);

        for _ in 0..200 {
            long_only.update(0.1);
            blended.update(0.1);
        }

        assert!((long_only.average_level() - 1.0).abs() < 1e-5);
        // 0.7 * 0.1 + 0.3 * 1.0
        assert!((blended.average_level() - 0.37).abs() < 1e-3);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut tracker = LevelTracker::new(10, 2, 0.5, 0.1, 0.0);
        for _ in 0..30 {
            tracker.update(0.01);
        }
        tracker.reset();
        assert_eq!(tracker.average_level(), 0.5);
        assert_eq!(tracker.long_term_level(), 0.5);
    }
}
