use crate::models::ConnectionId;
use anyhow::Result;
use async_trait::async_trait;

/// Transport seam for delivering text packets to a connected client
#[async_trait]
pub trait PacketSender: Send + Sync {
    /// Send one text packet to the given connection
    async fn send_text(&self, conn: ConnectionId, text: &str) -> Result<()>;
}
