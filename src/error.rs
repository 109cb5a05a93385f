//! Error types for the chat server
//!
//! Defines application-level errors and per-recipient delivery errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::types::ClientId;

/// Application-level errors
///
/// None of these are fatal to the process: each one is handled where it
/// occurs (reject one connection, ignore one query, end one session).
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error on a connection
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (the ChatServer actor is gone)
    #[error("Channel send error")]
    ChannelSend,

    /// Registry already holds the configured maximum of sessions
    #[error("Capacity exceeded: at most {max} clients")]
    CapacityExceeded { max: usize },

    /// No live session for the given handle
    #[error("Client not found: {0}")]
    NotFound(ClientId),

    /// A session with this handle is already registered
    #[error("Client already registered: {0}")]
    AlreadyRegistered(ClientId),

    /// The server is shutting down and accepts no new sessions
    #[error("Server is shutting down")]
    ShuttingDown,
}

/// Message delivery errors
///
/// Occurs when queueing a line for one recipient fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
