use crate::dsp::Agc;
use crate::types::{AgcSnapshot, AudioBlock, Tuning};
use anyhow::{anyhow, Result};
use sdrcast_core::{AgcSettings, ConnectionId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Owns one AGC per connected stream
pub struct StreamManager {
    settings: AgcSettings,
    streams: HashMap<ConnectionId, StreamEntry>,
}

struct StreamEntry {
    agc: Agc,
    samples_processed: u64,
}

impl StreamManager {
    /// Create a manager whose streams all start from `settings`
    pub fn new(settings: AgcSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            streams: HashMap::new(),
        })
    }

    pub fn settings(&self) -> &AgcSettings {
        &self.settings
    }

    /// Get the number of open streams
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.streams.contains_key(&id)
    }

    /// Open a stream with a fresh AGC instance
    pub fn open_stream(&mut self, id: ConnectionId) -> Result<()> {
        if self.streams.contains_key(&id) {
            return Err(anyhow!("Stream {} already open", id));
        }

        let agc = Agc::new(self.settings.clone())?;
        self.streams.insert(
            id,
            StreamEntry {
                agc,
                samples_processed: 0,
            },
        );
        info!("Opened stream {} ({} open)", id, self.streams.len());
        Ok(())
    }

    /// Close a stream and drop its AGC. Returns false if it was not open.
    pub fn close_stream(&mut self, id: ConnectionId) -> bool {
        let removed = self.streams.remove(&id).is_some();
        if removed {
            info!("Closed stream {} ({} open)", id, self.streams.len());
        }
        removed
    }

    /// Run a stream's AGC over the samples in place
    pub fn process(&mut self, id: ConnectionId, samples: &mut [f32]) -> Result<()> {
        let entry = self
            .streams
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Stream {} not found", id))?;

        entry.agc.process(samples);
        entry.samples_processed += samples.len() as u64;
        Ok(())
    }

    /// Run a stream's AGC over an audio block, checking its sample rate
    pub fn process_block(&mut self, id: ConnectionId, block: AudioBlock<'_>) -> Result<()> {
        if block.sample_rate != self.settings.sample_rate {
            return Err(anyhow!(
                "Block sample rate {} does not match stream rate {}",
                block.sample_rate,
                self.settings.sample_rate
            ));
        }
        self.process(id, block.samples)
    }

    /// Reset a stream's AGC, e.g. after a reconnect or a silence gap
    pub fn reset(&mut self, id: ConnectionId) -> Result<()> {
        let entry = self
            .streams
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Stream {} not found", id))?;

        entry.agc.reset();
        debug!("Reset AGC for stream {}", id);
        Ok(())
    }

    /// Adjust target level and time constants of a running stream
    pub fn retune(&mut self, id: ConnectionId, tuning: &Tuning) -> Result<()> {
        let entry = self
            .streams
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Stream {} not found", id))?;

        tuning.apply(&mut entry.agc)?;
        info!("Retuned stream {}: {:?}", id, tuning);
        Ok(())
    }

    /// Diagnostics for one stream
    pub fn snapshot(&self, id: ConnectionId) -> Option<AgcSnapshot> {
        self.streams
            .get(&id)
            .map(|entry| AgcSnapshot::capture(id, &entry.agc, entry.samples_processed))
    }

    /// Diagnostics for every open stream, ordered by id
    pub fn snapshots(&self) -> Vec<AgcSnapshot> {
        let mut snapshots: Vec<_> = self
            .streams
            .iter()
            .map(|(id, entry)| AgcSnapshot::capture(*id, &entry.agc, entry.samples_processed))
            .collect();
        snapshots.sort_by_key(|s| s.stream);
        snapshots
    }
}

/// Thread-safe wrapper for StreamManager
pub type SharedStreamManager = Arc<RwLock<StreamManager>>;

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> StreamManager {
        StreamManager::new(AgcSettings::default()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let settings = AgcSettings {
            sample_rate: 0,
            ..Default::default()
        };
        assert!(StreamManager::new(settings).is_err());
    }

    #[test]
    fn test_open_and_close_streams() {
        let mut manager = manager();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        manager.open_stream(a).unwrap();
        manager.open_stream(b).unwrap();
        assert_eq!(manager.stream_count(), 2);
        assert!(manager.open_stream(a).is_err());

        assert!(manager.close_stream(a));
        assert!(!manager.close_stream(a));
        assert_eq!(manager.stream_count(), 1);
        assert!(manager.contains(b));
    }

    #[test]
    fn test_process_unknown_stream() {
        let mut manager = manager();
        let mut samples = vec![0.1; 64];
        assert!(manager.process(ConnectionId::new(), &mut samples).is_err());
        assert!(manager.reset(ConnectionId::new()).is_err());
    }

    #[test]
    fn test_streams_have_independent_state() {
        let mut manager = manager();
        let loud = ConnectionId::new();
        let quiet = ConnectionId::new();
        manager.open_stream(loud).unwrap();
        manager.open_stream(quiet).unwrap();

        let mut a = vec![0.5f32; 44100];
        let mut b = vec![0.05f32; 44100];
        manager.process(loud, &mut a).unwrap();
        manager.process(quiet, &mut b).unwrap();

        let loud_gain = manager.snapshot(loud).unwrap().gain;
        let quiet_gain = manager.snapshot(quiet).unwrap().gain;
        assert!(quiet_gain > loud_gain * 5.0);
        assert_eq!(manager.snapshot(loud).unwrap().samples_processed, 44100);
    }

    #[test]
    fn test_reset_stream() {
        let mut manager = manager();
        let id = ConnectionId::new();
        manager.open_stream(id).unwrap();

        let mut samples = vec![0.05f32; 10_000];
        manager.process(id, &mut samples).unwrap();
        assert_ne!(manager.snapshot(id).unwrap().gain, 1.0);

        manager.reset(id).unwrap();
        let snapshot = manager.snapshot(id).unwrap();
        assert_eq!(snapshot.gain, 1.0);
        assert_eq!(snapshot.average_level, snapshot.target_level);
    }

    #[test]
    fn test_process_block_checks_rate() {
        let mut manager = manager();
        let id = ConnectionId::new();
        manager.open_stream(id).unwrap();

        let mut samples = vec![0.1f32; 441];
        assert!(manager
            .process_block(id, AudioBlock::new(&mut samples, 48000))
            .is_err());
        assert!(manager
            .process_block(id, AudioBlock::new(&mut samples, 44100))
            .is_ok());
    }

    #[test]
    fn test_retune_stream() {
        let mut manager = manager();
        let id = ConnectionId::new();
        manager.open_stream(id).unwrap();

        let tuning = Tuning {
            target_level_db: Some(-6.0),
            ..Default::default()
        };
        manager.retune(id, &tuning).unwrap();
        manager.reset(id).unwrap();
        let snapshot = manager.snapshot(id).unwrap();
        assert!((snapshot.target_level - 0.50119).abs() < 1e-4);
        assert_eq!(snapshot.average_level, snapshot.target_level);

        assert!(manager.retune(ConnectionId::new(), &tuning).is_err());
    }

    #[test]
    fn test_snapshots_sorted() {
        let mut manager = manager();
        for _ in 0..5 {
            manager.open_stream(ConnectionId::new()).unwrap();
        }
        let snapshots = manager.snapshots();
        assert_eq!(snapshots.len(), 5);
        assert!(snapshots.windows(2).all(|w| w[0].stream < w[1].stream));
    }

    #[tokio::test]
    async fn test_shared_manager() {
        let shared: SharedStreamManager = Arc::new(RwLock::new(manager()));
        let id = ConnectionId::new();
        shared.write().await.open_stream(id).unwrap();

        let mut samples = vec![0.2f32; 256];
        shared.write().await.process(id, &mut samples).unwrap();
        assert_eq!(shared.read().await.snapshots().len(), 1);
    }
}
