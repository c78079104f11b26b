//! DSP (Digital Signal Processing) modules
//!
//! Contains the adaptive gain control chain applied to every outgoing stream:
//! - Ring: Fixed-capacity ring buffer and sliding-window maximum
//! - Peak: Short look-ahead peak estimator
//! - Level: Long-term level tracker with exponential averaging
//! - Gain: Inverse-power gain computer and asymmetric gain smoother
//! - Limiter: Soft-knee output limiter
//! - AGC: The per-stream processor tying the stages together
pub mod agc;
pub mod gain;
pub mod level;
pub mod limiter;
pub mod peak;
pub mod ring;

// Re-export commonly used types for convenience
pub use agc::Agc;
pub use gain::{GainComputer, GainSmoother};
pub use level::LevelTracker;
pub use limiter::Limiter;
pub use peak::PeakEstimator;
pub use ring::{RingBuffer, SlidingMax};
