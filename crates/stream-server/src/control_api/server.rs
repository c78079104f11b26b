/// Control API Server implementation
use super::routes::{create_router, AppState};
use crate::chat::ChatRegistry;
use crate::manager::SharedStreamManager;
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// HTTP Control API Server
pub struct ControlServer {
    addr: SocketAddr,
    streams: SharedStreamManager,
    chat: Arc<ChatRegistry>,
    server_handle: Option<JoinHandle<()>>,
}

impl ControlServer {
    /// Create a new control server
    ///
    /// # Arguments
    /// * `addr` - Address to bind to (e.g., "127.0.0.1:8090")
    /// * `streams` - Shared stream manager
    /// * `chat` - Chat registry shared with the connection handlers
    pub fn new(addr: SocketAddr, streams: SharedStreamManager, chat: Arc<ChatRegistry>) -> Self {
        Self {
            addr,
            streams,
            chat,
            server_handle: None,
        }
    }

    /// Start the control server
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting Control API server on {}", self.addr);

        let state = AppState {
            streams: self.streams.clone(),
            chat: self.chat.clone(),
        };
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        // Port 0 binds an ephemeral port; report the real one
        self.addr = listener.local_addr()?;
        info!("Control API listening on {}", self.addr);

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Control API server error: {}", e);
            }
        });

        self.server_handle = Some(handle);

        Ok(())
    }

    /// Stop the control server
    pub async fn stop(&mut self) {
        if let Some(handle) = self.server_handle.take() {
            info!("Stopping Control API server");
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.server_handle.is_some()
    }

    /// Get the server address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
        }
    }
}
