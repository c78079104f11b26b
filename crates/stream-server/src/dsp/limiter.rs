/// Limiter - soft-knee output stage
///
/// Identity up to the threshold, then a smooth curve that saturates at
/// `threshold + knee_width / 2` instead of clipping. Both curves have unit
/// slope where they leave the threshold, so there is no corner in the
/// transfer function.
use sdrcast_core::{LimiterCurve, LimiterSettings};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limiter {
    curve: LimiterCurve,
    threshold: f32,
    knee_width: f32,
}

impl Limiter {
    /// Create a limiter; `threshold` and `knee_width` are linear and assumed validated
    pub fn new(curve: LimiterCurve, threshold: f32, knee_width: f32) -> Self {
        Self {
            curve,
            threshold,
            knee_width,
        }
    }

    pub fn from_settings(settings: &LimiterSettings) -> Self {
        Self::new(settings.curve, settings.threshold, settings.knee_width)
    }

    pub fn curve(&self) -> LimiterCurve {
        self.curve
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Amount the output may rise above the threshold
    pub fn margin(&self) -> f32 {
        self.knee_width * 0.5
    }

    /// Largest output magnitude the limiter can produce
    pub fn ceiling(&self) -> f32 {
        self.threshold + self.margin()
    }

    /// Process audio buffer (in-place)
    pub fn process(&self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Process a single sample
    #[inline]
    pub fn process_sample(&self, x: f32) -> f32 {
        let magnitude = x.abs();
        if magnitude <= self.threshold {
            return x;
        }

        let over = magnitude - self.threshold;
        let shaped = match self.curve {
            LimiterCurve::Tanh => {
                let margin = self.margin();
                self.threshold + margin * (over / margin).tanh()
            }
            LimiterCurve::Quadratic => {
                if over >= self.knee_width {
                    self.ceiling()
                } else {
                    magnitude - over * over / (2.0 * self.knee_width)
                }
            }
        };

        // Rounding must not push the result past the ceiling
        shaped.min(self.ceiling()).copysign(x)
    }
}

impl Default for Limiter {
    fn default() -> Self {
        Self::from_settings(&LimiterSettings::default())
    }
}
