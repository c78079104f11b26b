/// Automatic Gain Control for one audio stream
///
/// Every sample runs through five stages: peak estimation over a short
/// look-ahead window, level tracking over a longer history, an inverse-power
/// gain law, asymmetric gain smoothing, and a soft-knee limiter.
///
/// By default the gain computed from a window that already contains the
/// current sample is applied to that same sample, so there is no output delay.
/// `LookAheadMode::Delayed` holds the audio back until the sample is the oldest
/// entry of the window, which makes the window a true look-ahead.
///
/// An `Agc` belongs to exactly one stream and is not internally synchronized.
use super::gain::{GainComputer, GainSmoother};
use super::level::LevelTracker;
use super::limiter::Limiter;
use super::peak::PeakEstimator;
use super::ring::RingBuffer;
use sdrcast_core::{
    db_to_linear, positive, AgcSettings, ConfigError, Detection, LookAheadMode,
};

#[derive(Debug, Clone)]
pub struct Agc {
    settings: AgcSettings,
    look_ahead_samples: usize,
    peak: PeakEstimator,
    level: LevelTracker,
    computer: GainComputer,
    smoother: GainSmoother,
    limiter: Limiter,
    delay: Option<RingBuffer<f32>>,
}

impl Agc {
    /// Build an AGC from validated settings
    pub fn new(settings: AgcSettings) -> Result<Self, ConfigError> {
        settings.validate()?;

        let sample_rate = settings.sample_rate as f32;
        let target_level = settings.target_level();
        let look_ahead_samples = settings.look_ahead_samples();

        let delay = match (settings.detection, settings.look_ahead_mode) {
            (Detection::LookAhead, LookAheadMode::Delayed) if look_ahead_samples > 1 => {
                let mut line = RingBuffer::new(look_ahead_samples - 1);
                line.fill(0.0);
                Some(line)
            }
            _ => None,
        };

        Ok(Self {
            look_ahead_samples,
            peak: PeakEstimator::new(look_ahead_samples),
            level: LevelTracker::new(
                settings.level_window_samples(),
                settings.short_window_samples(),
                target_level,
                settings.smoothing,
                settings.short_term_weight,
            ),
            computer: GainComputer::new(
                target_level,
                settings.gain_exponent,
                settings.min_gain,
                settings.max_gain,
            ),
            smoother: GainSmoother::new(
                sample_rate,
                settings.attack_ms / 1000.0,
                settings.release_ms / 1000.0,
                settings.attack_scale,
                settings.release_scale,
                settings.min_gain,
                settings.max_gain,
            ),
            limiter: Limiter::from_settings(&settings.limiter),
            delay,
            settings,
        })
    }

    /// Build an AGC from the four user-facing parameters, defaults for the rest
    pub fn with_params(
        target_level_db: f32,
        attack_ms: f32,
        release_ms: f32,
        look_ahead_ms: f32,
        sample_rate: u32,
    ) -> Result<Self, ConfigError> {
        Self::new(AgcSettings::new(
            target_level_db,
            attack_ms,
            release_ms,
            look_ahead_ms,
            sample_rate,
        ))
    }

    /// Process audio buffer (in-place)
    ///
    /// May be called with consecutive slices of one continuous stream.
    pub fn process(&mut self, samples: &mut [f32]) {
        match self.settings.detection {
            Detection::LookAhead => {
                for sample in samples.iter_mut() {
                    *sample = self.process_sample(*sample);
                }
            }
            Detection::Block => self.process_blocks(samples),
        }
    }

    /// Process a single sample
    #[inline]
    fn process_sample(&mut self, x: f32) -> f32 {
        self.peak.push(x.abs());
        let input = match self.delay.as_mut() {
            Some(line) => line.push(x).unwrap_or(0.0),
            None => x,
        };
        let gain = self.advance(self.peak.peak());
        self.limiter.process_sample(input * gain)
    }

    /// Each block of look-ahead length is driven by its own peak
    fn process_blocks(&mut self, samples: &mut [f32]) {
        for block in samples.chunks_mut(self.look_ahead_samples) {
            let peak = block.iter().fold(0.0f32, |m, s| m.max(s.abs()));
            for sample in block.iter_mut() {
                let gain = self.advance(peak);
                *sample = self.limiter.process_sample(*sample * gain);
            }
        }
    }

    /// Level tracker -> gain computer -> smoother
    #[inline]
    fn advance(&mut self, peak: f32) -> f32 {
        let average_level = self.level.update(peak);
        let target_gain = self.computer.target_gain(average_level);
        self.smoother.step(target_gain)
    }

    /// Restore gain, average level and all buffers to their initial values
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.level.reset();
        self.peak.reset();
        if let Some(line) = self.delay.as_mut() {
            line.fill(0.0);
        }
    }

    /// Current smoothed linear gain
    pub fn gain(&self) -> f32 {
        self.smoother.gain()
    }

    /// Current gain in dB
    pub fn gain_db(&self) -> f32 {
        20.0 * self.smoother.gain().log10()
    }

    /// Current smoothed long-term level estimate (linear)
    pub fn average_level(&self) -> f32 {
        self.level.average_level()
    }

    /// Linear target amplitude
    pub fn target_level(&self) -> f32 {
        self.computer.target_level()
    }

    pub fn min_gain(&self) -> f32 {
        self.computer.min_gain()
    }

    pub fn max_gain(&self) -> f32 {
        self.computer.max_gain()
    }

    pub fn look_ahead_samples(&self) -> usize {
        self.look_ahead_samples
    }

    /// Samples of output delay introduced by the look-ahead mode
    pub fn latency_samples(&self) -> usize {
        self.delay.as_ref().map_or(0, |line| line.capacity())
    }

    pub fn limiter(&self) -> &Limiter {
        &self.limiter
    }

    pub fn settings(&self) -> &AgcSettings {
        &self.settings
    }

    /// Change the target level; the level history restarts from it on the next reset
    pub fn set_target_level(&mut self, target_level_db: f32) -> Result<(), ConfigError> {
        if !target_level_db.is_finite() {
            return Err(ConfigError::NotFinite {
                field: "target_level_db",
                value: target_level_db,
            });
        }
        let target_level = db_to_linear(target_level_db);
        self.settings.target_level_db = target_level_db;
        self.computer.set_target_level(target_level);
        self.level.set_initial_level(target_level);
        Ok(())
    }

    pub fn set_attack_time(&mut self, attack_ms: f32) -> Result<(), ConfigError> {
        positive("attack_ms", attack_ms)?;
        self.settings.attack_ms = attack_ms;
        self.smoother.set_attack_time(attack_ms / 1000.0);
        Ok(())
    }

    pub fn set_release_time(&mut self, release_ms: f32) -> Result<(), ConfigError> {
        positive("release_ms", release_ms)?;
        self.settings.release_ms = release_ms;
        self.smoother.set_release_time(release_ms / 1000.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdrcast_core::LimiterCurve;
    use std::f32::consts::PI;

    const SR: u32 = 44100;

    fn default_agc() -> Agc {
        Agc::with_params(-3.0, 5.0, 50.0, 5.0, SR).unwrap()
    }

    fn constant(amplitude: f32, seconds: f32) -> Vec<f32> {
        vec![amplitude; (SR as f32 * seconds) as usize]
    }

    fn sine(amplitude: f32, freq: f32, seconds: f32) -> Vec<f32> {
        (0..(SR as f32 * seconds) as usize)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    /// Deterministic noise with occasional loud bursts and silent gaps
    fn wild_input(len: usize) -> Vec<f32> {
        let mut state: u32 = 0x1234_5678;
        (0..len)
            .map(|i| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                let noise = (state >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
                match (i / 4000) % 4 {
                    0 => noise * 0.001,
                    1 => noise * 3.0,
                    2 => 0.0,
                    _ => noise * 0.3,
                }
            })
            .collect()
    }

    #[test]
    fn test_initial_state() {
        let agc = default_agc();
        assert_eq!(agc.gain(), 1.0);
        assert_eq!(agc.average_level(), agc.target_level());
        assert!((agc.target_level() - 0.70795).abs() < 1e-4);
        assert_eq!(agc.look_ahead_samples(), 220);
        assert_eq!(agc.latency_samples(), 0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(Agc::with_params(-3.0, 5.0, 50.0, 5.0, 0).is_err());
        assert!(Agc::with_params(-3.0, 0.0, 50.0, 5.0, SR).is_err());
        assert!(Agc::with_params(-3.0, 5.0, -50.0, 5.0, SR).is_err());
        assert!(Agc::with_params(-3.0, 5.0, 50.0, 0.0, SR).is_err());
    }

    #[test]
    fn test_gain_stays_within_bounds() {
        let mut agc = default_agc();
        let input = wild_input(64_000);
        for chunk in input.chunks(333) {
            let mut block = chunk.to_vec();
            agc.process(&mut block);
            assert!(agc.gain() >= agc.min_gain());
            assert!(agc.gain() <= agc.max_gain());
            assert!(agc.gain().is_finite());
        }
    }

    #[test]
    fn test_output_never_exceeds_limiter_ceiling() {
        let mut agc = default_agc();
        let mut samples = wild_input(64_000);
        agc.process(&mut samples);
        let ceiling = agc.limiter().ceiling();
        assert!(samples.iter().all(|s| s.abs() <= ceiling));
    }

    #[test]
    fn test_converges_on_sine() {
        let mut agc = default_agc();
        let mut samples = sine(0.2, 1000.0, 2.0);
        agc.process(&mut samples);

        assert!((agc.average_level() - 0.2).abs() < 0.01);
        let expected = agc.target_level() / 0.2;
        assert!((agc.gain() - expected).abs() / expected < 0.05);
    }

    #[test]
    fn test_converged_gain_respects_exponent() {
        let settings = AgcSettings {
            gain_exponent: 0.6,
            ..AgcSettings::default()
        };
        let mut agc = Agc::new(settings).unwrap();
        let mut samples = constant(0.1, 2.0);
        agc.process(&mut samples);

        let expected = (agc.target_level() / 0.1).powf(0.6);
        assert!((agc.gain() - expected).abs() / expected < 0.02);
    }

    #[test]
    fn test_gain_clamped_on_quiet_input() {
        let mut agc = default_agc();
        let mut samples = constant(0.0001, 2.0);
        agc.process(&mut samples);
        assert!((agc.gain() - agc.max_gain()).abs() < 0.5);
        assert!(agc.gain() <= agc.max_gain());
    }

    #[test]
    fn test_step_change_is_monotonic() {
        let mut agc = default_agc();
        let mut settle = constant(0.1, 1.0);
        agc.process(&mut settle);

        // Louder input: gain falls without undershooting the new target
        let target = agc.target_level() / 0.5;
        let mut prev = agc.gain();
        for _ in 0..SR {
            let mut s = [0.5f32];
            agc.process(&mut s);
            assert!(agc.gain() <= prev + 1e-6);
            assert!(agc.gain() >= target - 1e-3);
            prev = agc.gain();
        }
        assert!((agc.gain() - target).abs() / target < 0.05);

        // Quieter input: gain rises without overshooting
        let target = agc.target_level() / 0.05;
        for _ in 0..SR {
            let mut s = [0.05f32];
            agc.process(&mut s);
            assert!(agc.gain() >= prev - 1e-6);
            assert!(agc.gain() <= target + 1e-3);
            prev = agc.gain();
        }
    }

    #[test]
    fn test_silence_in_silence_out() {
        let mut agc = default_agc();
        let mut samples = vec![0.0f32; SR as usize];
        agc.process(&mut samples);
        assert!(samples.iter().all(|&s| s == 0.0));
        assert!(agc.gain().is_finite());
        assert!(agc.gain() <= agc.max_gain());
        assert!(agc.average_level().is_finite());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut agc = default_agc();
        let mut samples = wild_input(20_000);
        agc.process(&mut samples);

        agc.reset();
        assert_eq!(agc.gain(), 1.0);
        assert_eq!(agc.average_level(), agc.target_level());

        let mut once = sine(0.3, 440.0, 0.2);
        let mut twice = once.clone();
        let mut fresh = default_agc();
        fresh.process(&mut once);

        agc.reset();
        agc.process(&mut twice);
        assert_eq!(once, twice);
        assert_eq!(agc.gain(), fresh.gain());
    }

    #[test]
    fn test_split_calls_match_single_call() {
        let input = wild_input(10_000);

        let mut whole = input.clone();
        let mut agc = default_agc();
        agc.process(&mut whole);

        let mut pieces = input.clone();
        let mut split = default_agc();
        for chunk in pieces.chunks_mut(97) {
            split.process(chunk);
        }

        assert_eq!(whole, pieces);
        assert_eq!(agc.gain(), split.gain());
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut agc = Agc::with_params(-3.0, 5.0, 50.0, 5.0, 44100).unwrap();

        let mut loud = constant(0.1, 1.0);
        agc.process(&mut loud);
        let expected = 10f32.powf(-3.0 / 20.0) / 0.1;
        assert!((agc.gain() - expected).abs() / expected < 0.1);
        let settled = agc.gain();

        // First 50 ms of the quieter passage
        let new_target = 10f32.powf(-3.0 / 20.0) / 0.01;
        let mut quiet = constant(0.01, 0.05);
        agc.process(&mut quiet);
        assert!(agc.gain() >= settled - 1e-3);
        assert!(agc.gain() < new_target * 0.5);

        let mut rest = constant(0.01, 0.95);
        agc.process(&mut rest);
        assert!(agc.gain() > settled * 5.0);
        assert!((agc.gain() - new_target).abs() / new_target < 0.1);
    }

    #[test]
    fn test_block_detection() {
        let settings = AgcSettings {
            detection: Detection::Block,
            ..AgcSettings::default()
        };
        let mut agc = Agc::new(settings).unwrap();
        let mut samples = sine(0.1, 500.0, 1.5);
        agc.process(&mut samples);

        let expected = agc.target_level() / 0.1;
        assert!((agc.gain() - expected).abs() / expected < 0.1);
        let ceiling = agc.limiter().ceiling();
        assert!(samples.iter().all(|s| s.abs() <= ceiling));
    }

    #[test]
    fn test_delayed_look_ahead() {
        let settings = AgcSettings {
            look_ahead_mode: LookAheadMode::Delayed,
            ..AgcSettings::default()
        };
        let mut agc = Agc::new(settings).unwrap();
        let latency = agc.latency_samples();
        assert_eq!(latency, agc.look_ahead_samples() - 1);

        let mut samples = vec![0.0f32; 1000];
        samples[0] = 0.05;
        agc.process(&mut samples);

        // The impulse appears after the delay line
        assert!(samples[..latency].iter().all(|&s| s == 0.0));
        assert!(samples[latency] > 0.0);
        assert!(samples[latency + 1..].iter().all(|&s| s == 0.0));

        agc.reset();
        assert_eq!(agc.gain(), 1.0);
    }

    #[test]
    fn test_delayed_mode_ignored_for_block_detection() {
        let settings = AgcSettings {
            detection: Detection::Block,
            look_ahead_mode: LookAheadMode::Delayed,
            ..AgcSettings::default()
        };
        let agc = Agc::new(settings).unwrap();
        assert_eq!(agc.latency_samples(), 0);
    }

    #[test]
    fn test_quadratic_limiter_curve() {
        let settings = AgcSettings {
            limiter: sdrcast_core::LimiterSettings {
                curve: LimiterCurve::Quadratic,
                threshold: 0.8,
                knee_width: 0.1,
            },
            ..AgcSettings::default()
        };
        let mut agc = Agc::new(settings).unwrap();
        let mut samples = wild_input(30_000);
        agc.process(&mut samples);
        assert!(samples.iter().all(|s| s.abs() <= 0.85 + 1e-6));
    }

    #[test]
    fn test_setters() {
        let mut agc = default_agc();

        agc.set_target_level(-6.0).unwrap();
        assert!((agc.target_level() - 0.50119).abs() < 1e-4);
        agc.reset();
        assert_eq!(agc.average_level(), agc.target_level());

        agc.set_attack_time(10.0).unwrap();
        agc.set_release_time(200.0).unwrap();
        assert_eq!(agc.settings().attack_ms, 10.0);
        assert_eq!(agc.settings().release_ms, 200.0);

        assert!(agc.set_attack_time(0.0).is_err());
        assert!(agc.set_release_time(-1.0).is_err());
        assert!(agc.set_target_level(f32::NAN).is_err());
        assert_eq!(agc.settings().attack_ms, 10.0);
    }

    #[test]
    fn test_gain_db() {
        let mut agc = default_agc();
        assert_eq!(agc.gain_db(), 0.0);
        let mut samples = constant(0.1, 1.0);
        agc.process(&mut samples);
        assert!((agc.gain_db() - 17.0).abs() < 1.0);
    }
}
