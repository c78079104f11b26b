//! Gain Computer and Gain Smoother
//!
//! The computer maps the averaged level to a target gain with an inverse-power
//! law; the smoother follows that target with a one-pole filter whose time
//! constant depends on the direction of travel.

/// Guards the level division on silence
pub const LEVEL_EPSILON: f32 = 1e-6;

/// One-pole coefficient for a time constant in seconds
#[inline]
pub fn one_pole_coeff(time_constant_s: f32, sample_rate: f32) -> f32 {
    1.0 - (-1.0 / (time_constant_s * sample_rate)).exp()
}

/// Maps the average level to a clamped target gain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainComputer {
    target_level: f32,
    exponent: f32,
    min_gain: f32,
    max_gain: f32,
}

impl GainComputer {
    pub fn new(target_level: f32, exponent: f32, min_gain: f32, max_gain: f32) -> Self {
        Self {
            target_level,
            exponent,
            min_gain,
            max_gain,
        }
    }

    /// `(target_level / (average_level + eps)) ^ exponent`, clamped to the gain bounds
    #[inline]
    pub fn target_gain(&self, average_level: f32) -> f32 {
        let ratio = self.target_level / (average_level + LEVEL_EPSILON);
        ratio.powf(self.exponent).clamp(self.min_gain, self.max_gain)
    }

    pub fn target_level(&self) -> f32 {
        self.target_level
    }

    pub fn set_target_level(&mut self, target_level: f32) {
        self.target_level = target_level;
    }

    pub fn min_gain(&self) -> f32 {
        self.min_gain
    }

    pub fn max_gain(&self) -> f32 {
        self.max_gain
    }
}

/// Asymmetric one-pole smoothing of the applied gain
///
/// Attack governs falling gain (the input got louder), release governs rising
/// gain (the input got quieter).
#[derive(Debug, Clone)]
pub struct GainSmoother {
    gain: f32,
    sample_rate: f32,
    attack_s: f32,
    release_s: f32,
    attack_scale: f32,
    release_scale: f32,
    attack_coeff: f32,
    release_coeff: f32,
    min_gain: f32,
    max_gain: f32,
}

impl GainSmoother {
    /// Times are in seconds; the scales multiply them before the coefficient is derived
    pub fn new(
        sample_rate: f32,
        attack_s: f32,
        release_s: f32,
        attack_scale: f32,
        release_scale: f32,
        min_gain: f32,
        max_gain: f32,
    ) -> Self {
        let mut smoother = Self {
            gain: 1.0,
            sample_rate,
            attack_s,
            release_s,
            attack_scale,
            release_scale,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            min_gain,
            max_gain,
        };
        smoother.update_coeffs();
        smoother
    }

    fn update_coeffs(&mut self) {
        self.attack_coeff = one_pole_coeff(self.attack_s * self.attack_scale, self.sample_rate);
        self.release_coeff = one_pole_coeff(self.release_s * self.release_scale, self.sample_rate);
    }

    /// Move one sample toward `target_gain` and return the new gain
    #[inline]
    pub fn step(&mut self, target_gain: f32) -> f32 {
        let coeff = if target_gain < self.gain {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.gain += coeff * (target_gain - self.gain);
        self.gain = self.gain.clamp(self.min_gain, self.max_gain);
        self.gain
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn attack_coeff(&self) -> f32 {
        self.attack_coeff
    }

    pub fn release_coeff(&self) -> f32 {
        self.release_coeff
    }

    pub fn set_attack_time(&mut self, attack_s: f32) {
        self.attack_s = attack_s;
        self.update_coeffs();
    }

    pub fn set_release_time(&mut self, release_s: f32) {
        self.release_s = release_s;
        self.update_coeffs();
    }

    /// Back to unity gain
    pub fn reset(&mut self) {
        self.gain = 1.0;
    }
}
