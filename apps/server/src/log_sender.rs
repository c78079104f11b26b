use anyhow::Result;
use async_trait::async_trait;
use sdrcast_core::{ConnectionId, PacketSender};
use tracing::debug;

/// Packet sink for running without a network transport; packets go to the log
#[derive(Debug, Default)]
pub struct LogSender;

#[async_trait]
impl PacketSender for LogSender {
    async fn send_text(&self, conn: ConnectionId, text: &str) -> Result<()> {
        debug!("-> {}: {}", conn, text.trim_end());
        Ok(())
    }
}
