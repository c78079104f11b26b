use crate::dsp::Agc;
use sdrcast_core::{finite, positive, ConfigError, ConnectionId};
use serde::{Deserialize, Serialize};

/// Mono 32-bit float samples normalized to [-1, 1]
#[derive(Debug)]
pub struct AudioBlock<'a> {
    /// Samples, processed in place
    pub samples: &'a mut [f32],
    /// Sample rate in Hz (e.g., 44100, 48000)
    pub sample_rate: u32,
}

impl<'a> AudioBlock<'a> {
    /// Create a new AudioBlock
    pub fn new(samples: &'a mut [f32], sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of the block in milliseconds
    pub fn duration_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 * 1000.0 / self.sample_rate as f64
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }
}

/// Read-only view of one stream's AGC state, for metering
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgcSnapshot {
    pub stream: ConnectionId,
    pub gain: f32,
    pub gain_db: f32,
    pub average_level: f32,
    pub target_level: f32,
    pub samples_processed: u64,
}

impl AgcSnapshot {
    pub fn capture(stream: ConnectionId, agc: &Agc, samples_processed: u64) -> Self {
        Self {
            stream,
            gain: agc.gain(),
            gain_db: agc.gain_db(),
            average_level: agc.average_level(),
            target_level: agc.target_level(),
            samples_processed,
        }
    }
}

/// Live adjustment of a stream's AGC; absent fields are left unchanged
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_level_db: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_ms: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_ms: Option<f32>,
}

impl Tuning {
    /// Check every present field without touching any stream
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(db) = self.target_level_db {
            finite("target_level_db", db)?;
        }
        if let Some(ms) = self.attack_ms {
            positive("attack_ms", ms)?;
        }
        if let Some(ms) = self.release_ms {
            positive("release_ms", ms)?;
        }
        Ok(())
    }

    /// Apply every present field; a rejected tuning leaves `agc` unchanged
    pub fn apply(&self, agc: &mut Agc) -> Result<(), ConfigError> {
        self.validate()?;
        if let Some(db) = self.target_level_db {
            agc.set_target_level(db)?;
        }
        if let Some(ms) = self.attack_ms {
            agc.set_attack_time(ms)?;
        }
        if let Some(ms) = self.release_ms {
            agc.set_release_time(ms)?;
        }
        Ok(())
    }
}
