//! Connection handler
//!
//! Runs the per-connection session state machine: register, prompt for a
//! name, then read lines and turn them into `ServerCommand`s until the peer
//! quits, closes, or errors. Outbound lines are written by a separate
//! writer task fed from the session's registry channel.

use std::time::Duration;

use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::config::ServerConfig;
use crate::error::AppError;
use crate::message::{normalize_line, ServerMessage};
use crate::server::{ServerCommand, ServerHandle};
use crate::types::{ClientId, SessionState};

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Peer sent `/quit`
    Quit,
    /// Peer closed its side of the stream
    PeerClosed,
    /// Reading from the peer failed
    ReadError,
    /// The writer ended: write failure, write timeout, or server shutdown
    WriterClosed,
    /// The ChatServer actor is gone
    ServerClosed,
}

/// Handle a new connection
///
/// Registers the session, runs it to completion and releases the stream.
/// Returns `CapacityExceeded` or `ShuttingDown` without writing anything
/// when the registry refuses the connection.
pub async fn handle_connection<S>(
    stream: S,
    handle: ServerHandle,
    config: ServerConfig,
) -> Result<Termination, AppError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let client_id = ClientId::new();

    // Create channel for server -> client messages. The prompt is queued
    // before registration so it precedes any broadcast.
    let (msg_tx, msg_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let _ = msg_tx.send(ServerMessage::NamePrompt);

    handle.register(client_id, msg_tx).await?;

    let (read_half, write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);

    let mut write_task = tokio::spawn(write_loop(
        write_half,
        msg_rx,
        client_id,
        config.write_timeout,
    ));

    let (termination, writer_done) = tokio::select! {
        termination = read_loop(&mut reader, client_id, &handle, config.max_line_length) => {
            (termination, false)
        }
        _ = &mut write_task => (Termination::WriterClosed, true),
    };
    debug!(
        "Client {} is {} ({:?})",
        client_id,
        SessionState::Terminated,
        termination
    );

    // Announce and remove; this drops the registry's sender so the writer
    // drains whatever is queued and exits.
    let _ = handle.unregister(client_id).await;

    if !writer_done {
        finish_writer(write_task, config.write_timeout).await;
    }

    info!("Client {} disconnected", client_id);
    Ok(termination)
}

/// Read lines and dispatch them until the session terminates
///
/// A read stops at a newline or after `max_line_length` bytes. When the cap
/// splits a multibyte character, its leading bytes are held back and start
/// the next line.
async fn read_loop<R>(
    reader: &mut R,
    client_id: ClientId,
    handle: &ServerHandle,
    max_line_length: usize,
) -> Termination
where
    R: AsyncBufRead + Unpin,
{
    let mut state = SessionState::Connecting;
    let mut buf = Vec::new();
    let mut carry = Vec::new();

    loop {
        buf.clear();
        buf.append(&mut carry);
        let limit = max_line_length.saturating_sub(buf.len()).max(1);
        let read = (&mut *reader)
            .take(limit as u64)
            .read_until(b'\n', &mut buf)
            .await;
        let n = match read {
            Ok(n) => n,
            Err(e) => {
                debug!("Read error for {}: {}", client_id, e);
                return Termination::ReadError;
            }
        };
        if buf.is_empty() {
            return Termination::PeerClosed;
        }

        if n > 0 && buf.last() != Some(&b'\n') {
            if let Err(e) = std::str::from_utf8(&buf) {
                // error_len() is None only for a truncated trailing sequence
                if e.error_len().is_none() {
                    carry = buf.split_off(e.valid_up_to());
                }
            }
        }

        let text = String::from_utf8_lossy(&buf);
        let Some(line) = normalize_line(&text) else {
            continue;
        };

        let cmd = match state {
            SessionState::Connecting => {
                state = SessionState::Active;
                debug!("Client {} is {}", client_id, state);
                ServerCommand::Join {
                    client_id,
                    name: line.to_string(),
                }
            }
            _ => match Command::parse(line) {
                Command::Quit => return Termination::Quit,
                Command::List => ServerCommand::List { client_id },
                Command::Help => ServerCommand::Help { client_id },
                Command::Nick(name) => ServerCommand::Nick { client_id, name },
                Command::Unknown(input) => ServerCommand::Unknown { client_id, input },
                Command::Chat(content) => ServerCommand::Chat { client_id, content },
            },
        };

        if handle.send(cmd).await.is_err() {
            debug!("Server closed, ending read loop for {}", client_id);
            return Termination::ServerClosed;
        }
    }
}

/// Write queued messages to the peer, each write bounded by `write_timeout`
async fn write_loop<W>(
    mut writer: W,
    mut msg_rx: mpsc::UnboundedReceiver<ServerMessage>,
    client_id: ClientId,
    write_timeout: Duration,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(msg) = msg_rx.recv().await {
        let text = msg.to_string();
        let write = async {
            writer.write_all(text.as_bytes()).await?;
            writer.flush().await
        };
        match timeout(write_timeout, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!("Write to {} failed: {}", client_id, e);
                break;
            }
            Err(_) => {
                warn!("Write to {} timed out, dropping connection", client_id);
                break;
            }
        }
    }
    debug!("Write task ended for {}", client_id);

    let _ = timeout(write_timeout, writer.shutdown()).await;
}

/// Give the writer one timeout period to flush, then abort it
async fn finish_writer(mut write_task: JoinHandle<()>, write_timeout: Duration) {
    if timeout(write_timeout, &mut write_task).await.is_err() {
        warn!("Writer did not finish in time, aborting");
        write_task.abort();
    }
}
