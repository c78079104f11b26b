/// Peak Estimator - short look-ahead window of sample magnitudes
use super::ring::SlidingMax;

#[derive(Debug, Clone)]
pub struct PeakEstimator {
    window: SlidingMax,
}

impl PeakEstimator {
    /// `look_ahead_samples` is the window capacity (at least one sample)
    pub fn new(look_ahead_samples: usize) -> Self {
        Self {
            window: SlidingMax::new(look_ahead_samples),
        }
    }

    /// Append the magnitude of one sample, evicting the oldest when full
    #[inline]
    pub fn push(&mut self, sample_abs: f32) {
        self.window.push(sample_abs.abs());
    }

    /// Largest buffered magnitude; 0.0 when nothing has been pushed
    #[inline]
    pub fn peak(&self) -> f32 {
        self.window.max()
    }

    pub fn capacity(&self) -> usize {
        self.window.capacity()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}
