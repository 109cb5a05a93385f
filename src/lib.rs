//! Line-oriented TCP Chat Server Library
//!
//! A multi-user chat server: every connection names itself, then relays
//! newline-delimited chat lines and commands to every other connection.
//!
//! # Features
//! - Name prompt and join/leave announcements
//! - `/nick`, `/list`, `/help`, `/quit` commands
//! - Chat relay to every other connected client
//! - Operator console broadcasts and shutdown
//! - Capacity-bounded registry with non-blocking, timeout-bounded delivery
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the connection `Registry`
//! - Each connection runs `handle_connection`, a session task that talks to
//!   the actor through a `ServerHandle`
//! - No locks needed - all registry access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use line_chat::{handle_connection, ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default();
//!     let listener = TcpListener::bind(&config.bind_addr).await.unwrap();
//!     let (server, handle) = ChatServer::channel(&config);
//!
//!     tokio::spawn(server.run());
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         tokio::spawn(handle_connection(stream, handle.clone(), config.clone()));
//!     }
//! }
//! ```

pub mod broadcast;
pub mod client;
pub mod command;
pub mod config;
pub mod console;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use client::Client;
pub use command::{Command, OperatorCommand};
pub use config::{Args, ServerConfig};
pub use console::run_console;
pub use error::{AppError, SendError};
pub use handler::{handle_connection, Termination};
pub use message::ServerMessage;
pub use registry::Registry;
pub use server::{ChatServer, ServerCommand, ServerHandle};
pub use types::{ClientId, SessionState};
