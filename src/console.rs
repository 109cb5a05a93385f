//! Operator console
//!
//! A single privileged sender with no registry slot. Lines typed here are
//! broadcast to every session as `Server`; `/quit` shuts the server down.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::command::OperatorCommand;
use crate::error::AppError;
use crate::message::{normalize_line, ServerMessage};
use crate::server::ServerHandle;

const CONSOLE_HELP: &str = "Commands: /list, /quit, /help, or type message to broadcast";

/// Run the console until `/quit`, end of input, or the server goes away
pub async fn run_console<R, W>(input: R, mut output: W, handle: ServerHandle) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while let Some(raw) = lines.next_line().await? {
        let Some(line) = normalize_line(&raw) else {
            continue;
        };

        match OperatorCommand::parse(line) {
            OperatorCommand::Shutdown => {
                output.write_all(b"Shutting down server...\n").await?;
                output.flush().await?;
                handle.shutdown().await?;
                return Ok(());
            }
            OperatorCommand::List => {
                let names: Vec<String> = handle
                    .snapshot()
                    .await?
                    .into_iter()
                    .map(|(_, name)| name)
                    .collect();
                let listing = if names.is_empty() {
                    "None".to_string()
                } else {
                    names.join(", ")
                };
                let text = format!("Online users ({}): {}\n", names.len(), listing);
                output.write_all(text.as_bytes()).await?;
            }
            OperatorCommand::Help => {
                output.write_all(CONSOLE_HELP.as_bytes()).await?;
                output.write_all(b"\n").await?;
            }
            OperatorCommand::Broadcast(content) => {
                let echo = ServerMessage::admin(content.clone()).to_string();
                output.write_all(echo.as_bytes()).await?;
                handle.announce(content).await?;
            }
        }
        output.flush().await?;
    }

    debug!("Console input closed");
    Ok(())
}
