use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convert dB to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10_f32.powf(db / 20.0)
}

/// Longest window any buffer may span
pub const MAX_WINDOW_MS: f32 = 10_000.0;

/// Highest accepted sample rate in Hz
pub const MAX_SAMPLE_RATE: u32 = 768_000;

/// Convert a duration in milliseconds to a whole number of samples (at least one)
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: u32) -> usize {
    ((ms as f64 * sample_rate as f64 / 1000.0) as usize).max(1)
}

/// Rejected AGC configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("sample rate must be greater than zero")]
    InvalidSampleRate,

    #[error("{field} must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },

    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("min_gain ({min}) must not exceed max_gain ({max})")]
    GainBounds { min: f32, max: f32 },
}

/// Output curve applied above the limiter threshold
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimiterCurve {
    /// Hyperbolic tangent saturation
    #[default]
    Tanh,
    /// Quadratic knee that flattens out at threshold + knee_width / 2
    Quadratic,
}

/// How the level detector sees the signal
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detection {
    /// Sliding per-sample look-ahead window
    #[default]
    LookAhead,
    /// One peak per fixed-size block (block size = look-ahead length)
    Block,
}

/// Whether the audio is delayed to line up with the look-ahead window
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookAheadMode {
    /// Gain is applied to the newest sample, no output delay
    #[default]
    Concurrent,
    /// Output is delayed by the look-ahead length
    Delayed,
}

/// Soft-knee limiter settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimiterSettings {
    pub curve: LimiterCurve,
    /// Linear threshold below which samples pass untouched
    pub threshold: f32,
    /// Knee width (linear); the output never exceeds threshold + knee_width / 2
    pub knee_width: f32,
}

impl Default for LimiterSettings {
    fn default() -> Self {
        Self {
            curve: LimiterCurve::Tanh,
            threshold: 0.9,
            knee_width: 0.1,
        }
    }
}

/// Adaptive gain control settings for one audio stream
///
/// Times are in milliseconds, levels in dBFS. Everything that varied between
/// tunings of the algorithm (exponent, smoothing, window lengths, limiter curve)
/// lives here rather than in the processor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgcSettings {
    pub target_level_db: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
    pub look_ahead_ms: f32,
    pub sample_rate: u32,

    /// Length of the long-term level history
    pub level_window_ms: f32,
    /// Length of the short-term window blended in by `short_term_weight`
    pub short_window_ms: f32,
    /// Weight of the short-term level in the averaged level (0 = long-term only)
    pub short_term_weight: f32,
    /// Exponential smoothing factor of the average level (beta)
    pub smoothing: f32,

    /// Exponent of the inverse-power gain law
    pub gain_exponent: f32,
    pub min_gain: f32,
    pub max_gain: f32,

    /// Multipliers on the attack/release time constants
    pub attack_scale: f32,
    pub release_scale: f32,

    pub limiter: LimiterSettings,
    pub detection: Detection,
    pub look_ahead_mode: LookAheadMode,
}

impl Default for AgcSettings {
    fn default() -> Self {
        Self {
            target_level_db: -3.0,
            attack_ms: 5.0,
            release_ms: 50.0,
            look_ahead_ms: 5.0,
            sample_rate: 44100,
            level_window_ms: 50.0,
            short_window_ms: 10.0,
            short_term_weight: 0.0,
            smoothing: 0.1,
            gain_exponent: 1.0,
            min_gain: 0.001,
            max_gain: 100.0,
            attack_scale: 1.0,
            release_scale: 1.0,
            limiter: LimiterSettings::default(),
            detection: Detection::LookAhead,
            look_ahead_mode: LookAheadMode::Concurrent,
        }
    }
}

impl AgcSettings {
    /// Settings with the four user-facing parameters and defaults for everything else
    pub fn new(
        target_level_db: f32,
        attack_ms: f32,
        release_ms: f32,
        look_ahead_ms: f32,
        sample_rate: u32,
    ) -> Self {
        Self {
            target_level_db,
            attack_ms,
            release_ms,
            look_ahead_ms,
            sample_rate,
            ..Default::default()
        }
    }

    /// Check every field, returning the first violation found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        if self.sample_rate > MAX_SAMPLE_RATE {
            return Err(ConfigError::OutOfRange {
                field: "sample_rate",
                value: self.sample_rate as f32,
                min: 1.0,
                max: MAX_SAMPLE_RATE as f32,
            });
        }
        finite("target_level_db", self.target_level_db)?;
        positive("attack_ms", self.attack_ms)?;
        positive("release_ms", self.release_ms)?;
        positive("look_ahead_ms", self.look_ahead_ms)?;
        positive("level_window_ms", self.level_window_ms)?;
        positive("short_window_ms", self.short_window_ms)?;
        // Buffers are sized from these, so they must stay allocatable
        in_range("look_ahead_ms", self.look_ahead_ms, 0.0, MAX_WINDOW_MS)?;
        in_range("level_window_ms", self.level_window_ms, 0.0, MAX_WINDOW_MS)?;
        in_range("short_window_ms", self.short_window_ms, 0.0, MAX_WINDOW_MS)?;
        positive("attack_scale", self.attack_scale)?;
        positive("release_scale", self.release_scale)?;

        in_range("short_term_weight", self.short_term_weight, 0.0, 1.0)?;
        positive("smoothing", self.smoothing)?;
        in_range("smoothing", self.smoothing, 0.0, 1.0)?;
        positive("gain_exponent", self.gain_exponent)?;
        in_range("gain_exponent", self.gain_exponent, 0.0, 1.0)?;

        positive("min_gain", self.min_gain)?;
        positive("max_gain", self.max_gain)?;
        if self.min_gain > self.max_gain {
            return Err(ConfigError::GainBounds {
                min: self.min_gain,
                max: self.max_gain,
            });
        }

        positive("limiter.threshold", self.limiter.threshold)?;
        in_range("limiter.threshold", self.limiter.threshold, 0.0, 1.0)?;
        positive("limiter.knee_width", self.limiter.knee_width)?;

        Ok(())
    }

    /// Linear target amplitude
    pub fn target_level(&self) -> f32 {
        db_to_linear(self.target_level_db)
    }

    pub fn look_ahead_samples(&self) -> usize {
        ms_to_samples(self.look_ahead_ms, self.sample_rate)
    }

    pub fn level_window_samples(&self) -> usize {
        ms_to_samples(self.level_window_ms, self.sample_rate)
    }

    /// Short-term window length, never longer than the level history
    pub fn short_window_samples(&self) -> usize {
        ms_to_samples(self.short_window_ms, self.sample_rate).min(self.level_window_samples())
    }
}

/// Finite, any sign
pub fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

/// Strictly positive and finite
pub fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
