//! Client struct definition
//!
//! Represents one registered session: its display name, naming state and
//! the outbound channel drained by the connection's writer task. The
//! channel is unbounded; a peer that stops reading is evicted by its
//! writer's write timeout, not by dropping lines.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::{ServerMessage, DEFAULT_NAME};
use crate::types::ClientId;

/// Connected client information
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for this client
    pub id: ClientId,
    /// Display name ("Anonymous" until named)
    pub display_name: String,
    /// Set once the first non-empty line has been consumed as the name
    pub named: bool,
    /// Registration order, used for stable enumeration
    pub seq: u64,
    /// Server → Client message channel
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

impl Client {
    /// Create a new unnamed client
    pub fn new(id: ClientId, seq: u64, sender: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self {
            id,
            display_name: DEFAULT_NAME.to_string(),
            named: false,
            seq,
            sender,
        }
    }

    /// Queue a message for this client without waiting
    ///
    /// Fails only once the connection's writer has gone away.
    pub fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender
            .send(msg)
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Get the display name for this client
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Set the display name
    pub fn set_display_name(&mut self, name: String) {
        self.display_name = name;
    }
}
