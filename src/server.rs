//! ChatServer Actor implementation
//!
//! The central actor that owns the connection registry. Every registry
//! mutation, query and broadcast arrives as a `ServerCommand` on a single
//! mpsc channel, so handling one command is the critical section and no
//! locks are needed.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::broadcast::{send_to, send_to_all, send_to_others};
use crate::config::ServerConfig;
use crate::error::AppError;
use crate::message::ServerMessage;
use crate::registry::Registry;
use crate::types::ClientId;

/// Channel buffer size for server commands
const CHANNEL_BUFFER_SIZE: usize = 256;

/// Commands sent from handlers and the console to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New connection wants a registry slot
    Connect {
        client_id: ClientId,
        sender: mpsc::UnboundedSender<ServerMessage>,
        reply: oneshot::Sender<Result<(), AppError>>,
    },
    /// Session terminated
    Disconnect { client_id: ClientId },
    /// First non-empty line of a session, consumed as its name
    Join { client_id: ClientId, name: String },
    /// Plain chat line from a named session
    Chat { client_id: ClientId, content: String },
    /// `/nick <name>`
    Nick { client_id: ClientId, name: String },
    /// `/list`
    List { client_id: ClientId },
    /// `/help`
    Help { client_id: ClientId },
    /// Unrecognised `/…` token
    Unknown { client_id: ClientId, input: String },
    /// Operator broadcast to every session
    Announce { content: String },
    /// Live session count
    Count { reply: oneshot::Sender<usize> },
    /// Point-in-time `(handle, name)` view
    Snapshot {
        reply: oneshot::Sender<Vec<(ClientId, String)>>,
    },
    /// Display name of one handle
    NameOf {
        client_id: ClientId,
        reply: oneshot::Sender<String>,
    },
    /// Stop accepting sessions and terminate every live one
    Shutdown { reply: oneshot::Sender<()> },
}

/// The main ChatServer actor
pub struct ChatServer {
    /// All live sessions
    registry: Registry,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
    /// Process-wide running flag, flipped by `ServerHandle::shutdown`
    running: watch::Receiver<bool>,
    /// Cleared once a Shutdown command has been handled
    accepting: bool,
}

impl ChatServer {
    /// Create a ChatServer and the handle used to talk to it
    pub fn channel(config: &ServerConfig) -> (Self, ServerHandle) {
        let (cmd_tx, receiver) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let (running_tx, running) = watch::channel(true);

        let server = Self {
            registry: Registry::new(config.max_clients),
            receiver,
            running,
            accepting: true,
        };
        let handle = ServerHandle {
            cmd_tx,
            running: Arc::new(running_tx),
        };
        (server, handle)
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all handles are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect {
                client_id,
                sender,
                reply,
            } => {
                let result = self.handle_connect(client_id, sender);
                let _ = reply.send(result);
            }
            ServerCommand::Disconnect { client_id } => self.handle_disconnect(client_id),
            ServerCommand::Join { client_id, name } => self.handle_join(client_id, name),
            ServerCommand::Chat { client_id, content } => self.handle_chat(client_id, content),
            ServerCommand::Nick { client_id, name } => self.handle_nick(client_id, name),
            ServerCommand::List { client_id } => {
                let names = self.registry.names();
                send_to(&self.registry, client_id, ServerMessage::OnlineUsers { names });
            }
            ServerCommand::Help { client_id } => {
                send_to(&self.registry, client_id, ServerMessage::Help);
            }
            ServerCommand::Unknown { client_id, input } => {
                debug!("Client {} sent unknown command '{}'", client_id, input);
                send_to(&self.registry, client_id, ServerMessage::UnknownCommand);
            }
            ServerCommand::Announce { content } => self.handle_announce(content),
            ServerCommand::Count { reply } => {
                let _ = reply.send(self.registry.count());
            }
            ServerCommand::Snapshot { reply } => {
                let _ = reply.send(self.registry.snapshot());
            }
            ServerCommand::NameOf { client_id, reply } => {
                let _ = reply.send(self.registry.name_of(client_id).to_string());
            }
            ServerCommand::Shutdown { reply } => {
                self.handle_shutdown();
                let _ = reply.send(());
            }
        }
    }

    /// Handle new client registration
    fn handle_connect(
        &mut self,
        client_id: ClientId,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<(), AppError> {
        if !self.accepting || !*self.running.borrow() {
            debug!("Rejecting client {} during shutdown", client_id);
            return Err(AppError::ShuttingDown);
        }

        if let Err(e) = self.registry.add(client_id, sender) {
            warn!("Client {} rejected: {}", client_id, e);
            return Err(e);
        }

        info!("Client {} connected", client_id);
        debug!(
            "Total clients: {}/{}",
            self.registry.count(),
            self.registry.capacity()
        );
        Ok(())
    }

    /// Handle session termination: announce, then remove
    fn handle_disconnect(&mut self, client_id: ClientId) {
        if !self.registry.contains(client_id) {
            debug!("Client {} already removed", client_id);
            return;
        }

        let name = self.registry.name_of(client_id).to_string();
        send_to_others(
            &self.registry,
            &ServerMessage::Left { name: name.clone() },
            client_id,
        );
        self.registry.remove(client_id);

        info!("{} left", name);
        debug!("Total clients: {}", self.registry.count());
    }

    /// Handle naming: rename, then announce to everyone including the joiner
    fn handle_join(&mut self, client_id: ClientId, name: String) {
        let Some(client) = self.registry.get(client_id) else {
            return;
        };
        if client.named || name.is_empty() {
            debug!("Ignoring join for client {}", client_id);
            return;
        }

        if self.registry.rename(client_id, &name).is_err()
            || self.registry.mark_named(client_id).is_err()
        {
            return;
        }

        info!("{} joined", name);
        send_to_all(&self.registry, &ServerMessage::Joined { name });
    }

    /// Handle chat message: relay to everyone but the sender
    fn handle_chat(&mut self, client_id: ClientId, content: String) {
        if !self.registry.contains(client_id) {
            return;
        }

        let from = self.registry.name_of(client_id).to_string();
        info!("[{}]: {}", from, content);

        let msg = ServerMessage::chat(from, content);
        let delivery = send_to_others(&self.registry, &msg, client_id);
        debug!(
            "Chat from {} delivered to {}, dropped for {}",
            client_id, delivery.delivered, delivery.dropped
        );
    }

    /// Handle rename: announce first, then rename
    fn handle_nick(&mut self, client_id: ClientId, name: String) {
        let new = name.trim();
        if new.is_empty() || !self.registry.contains(client_id) {
            return;
        }

        let old = self.registry.name_of(client_id).to_string();
        info!("{} -> {}", old, new);

        send_to_all(
            &self.registry,
            &ServerMessage::Renamed {
                old,
                new: new.to_string(),
            },
        );
        let _ = self.registry.rename(client_id, new);
    }

    /// Handle operator broadcast
    fn handle_announce(&mut self, content: String) {
        info!("[{}]: {}", crate::message::SERVER_NAME, content);
        send_to_all(&self.registry, &ServerMessage::admin(content));
    }

    /// Handle shutdown: refuse new sessions and drop every live one
    ///
    /// Dropping a client drops its outbound sender, which ends that
    /// connection's writer and with it the session.
    fn handle_shutdown(&mut self) {
        self.accepting = false;
        let closed = self.registry.count();
        self.registry.clear();
        info!("Shutdown: closed {} sessions", closed);
    }
}

/// Cloneable handle to the ChatServer actor
#[derive(Debug, Clone)]
pub struct ServerHandle {
    cmd_tx: mpsc::Sender<ServerCommand>,
    running: Arc<watch::Sender<bool>>,
}

impl ServerHandle {
    /// Send a command without waiting for a reply
    pub async fn send(&self, cmd: ServerCommand) -> Result<(), AppError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| AppError::ChannelSend)
    }

    /// Send a command carrying a reply channel and wait for the answer
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> ServerCommand,
    ) -> Result<T, AppError> {
        let (reply, response) = oneshot::channel();
        self.send(build(reply)).await?;
        response.await.map_err(|_| AppError::ChannelSend)
    }

    /// Add a session to the registry
    pub async fn register(
        &self,
        client_id: ClientId,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<(), AppError> {
        if !self.is_running() {
            return Err(AppError::ShuttingDown);
        }
        self.request(|reply| ServerCommand::Connect {
            client_id,
            sender,
            reply,
        })
        .await?
    }

    /// Run the termination sequence for a session; safe to call twice
    pub async fn unregister(&self, client_id: ClientId) -> Result<(), AppError> {
        self.send(ServerCommand::Disconnect { client_id }).await
    }

    /// Broadcast an operator line to every session
    pub async fn announce(&self, content: impl Into<String>) -> Result<(), AppError> {
        self.send(ServerCommand::Announce {
            content: content.into(),
        })
        .await
    }

    pub async fn count(&self) -> Result<usize, AppError> {
        self.request(|reply| ServerCommand::Count { reply }).await
    }

    pub async fn snapshot(&self) -> Result<Vec<(ClientId, String)>, AppError> {
        self.request(|reply| ServerCommand::Snapshot { reply }).await
    }

    pub async fn name_of(&self, client_id: ClientId) -> Result<String, AppError> {
        self.request(|reply| ServerCommand::NameOf { client_id, reply })
            .await
    }

    /// False once shutdown has been requested
    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    /// Stop accepting sessions and terminate every live one
    ///
    /// Returns once the registry has been emptied.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.running.send_replace(false);
        self.request(|reply| ServerCommand::Shutdown { reply }).await
    }

    /// Resolves once shutdown has been requested
    pub async fn stopped(&self) {
        let mut running = self.running.subscribe();
        let _ = running.wait_for(|running| !*running).await;
    }
}
