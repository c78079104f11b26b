/// Chat session registry
///
/// Relays text messages between connected listeners and keeps a bounded
/// history that is replayed to anyone who joins. The server owns one registry
/// and hands an `Arc<ChatRegistry>` to every connection handler.
use anyhow::Result;
use chrono::{DateTime, Local};
use sdrcast_core::{ChatMessage, ChatSettings, ConnectionId, PacketSender};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Header sent before the replayed history
pub const HISTORY_HEADER: &str = "Chat history:\n";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct ChatRegistry {
    settings: ChatSettings,
    sender: Arc<dyn PacketSender>,
    state: RwLock<ChatState>,
    // Held from a state change until its packets are sent, so a joiner always
    // gets its replay before any live line and never a line twice
    delivery: Mutex<()>,
}

#[derive(Default)]
struct ChatState {
    connections: BTreeSet<ConnectionId>,
    history: VecDeque<String>,
    usernames: HashMap<String, String>,
}

impl ChatRegistry {
    pub fn new(settings: ChatSettings, sender: Arc<dyn PacketSender>) -> Result<Self> {
        settings.validate()?;
        let history = VecDeque::with_capacity(settings.history_capacity);
        Ok(Self {
            settings,
            sender,
            state: RwLock::new(ChatState {
                history,
                ..Default::default()
            }),
            delivery: Mutex::new(()),
        })
    }

    /// Register a connection and replay the history to it
    pub async fn join(&self, conn: ConnectionId) -> Result<()> {
        let _delivery = self.delivery.lock().await;
        let replay = {
            let mut state = self.state.write().await;
            state.connections.insert(conn);
            debug!("Chat join {} ({} connected)", conn, state.connections.len());

            if state.history.is_empty() {
                None
            } else {
                let mut text = String::from(HISTORY_HEADER);
                for line in state.history.iter() {
                    text.push_str(line);
                    text.push('\n');
                }
                Some(text)
            }
        };

        if let Some(text) = replay {
            self.sender.send_text(conn, &text).await?;
        }
        Ok(())
    }

    /// Unregister a connection. Unknown connections are ignored.
    pub async fn leave(&self, conn: ConnectionId) {
        let mut state = self.state.write().await;
        if state.connections.remove(&conn) {
            debug!("Chat leave {} ({} connected)", conn, state.connections.len());
        }
    }

    /// Post a message from `conn` on behalf of `user_id`
    ///
    /// The formatted line is stored in the history and delivered to the other
    /// connections. A failed delivery to one recipient is logged and skipped.
    pub async fn post(&self, conn: ConnectionId, user_id: &str, text: &str) -> Result<ChatMessage> {
        self.post_at(conn, user_id, text, Local::now()).await
    }

    async fn post_at(
        &self,
        conn: ConnectionId,
        user_id: &str,
        text: &str,
        now: DateTime<Local>,
    ) -> Result<ChatMessage> {
        let _delivery = self.delivery.lock().await;
        let (message, line, recipients) = {
            let mut state = self.state.write().await;
            let username = state
                .usernames
                .entry(user_id.to_string())
                .or_insert_with(|| generate_username(user_id))
                .clone();

            let message = ChatMessage {
                timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
                username,
                text: text.to_string(),
            };
            let line = message.formatted();

            if self.settings.history_capacity > 0 {
                if state.history.len() >= self.settings.history_capacity {
                    state.history.pop_front();
                }
                state.history.push_back(line.clone());
            }

            let recipients: Vec<ConnectionId> = state
                .connections
                .iter()
                .copied()
                .filter(|c| self.settings.echo_to_sender || *c != conn)
                .collect();

            (message, line, recipients)
        };

        for recipient in recipients {
            if let Err(e) = self.sender.send_text(recipient, &line).await {
                warn!("Failed to deliver chat message to {}: {}", recipient, e);
            }
        }

        Ok(message)
    }

    /// Stored lines, oldest first
    pub async fn history(&self) -> Vec<String> {
        self.state.read().await.history.iter().cloned().collect()
    }

    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }

    /// Username assigned to `user_id`, if it has posted
    pub async fn username(&self, user_id: &str) -> Option<String> {
        self.state.read().await.usernames.get(user_id).cloned()
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }
}

/// `user` followed by the first six digits of the id's hash
fn generate_username(user_id: &str) -> String {
    let mut hasher = DefaultHasher::new();
    user_id.hash(&mut hasher);
    let digits = hasher.finish().to_string();
    format!("user{}", &digits[..digits.len().min(6)])
}
