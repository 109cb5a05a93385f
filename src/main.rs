//! Line Chat Server - Entry Point
//!
//! Starts the TCP listener, the ChatServer actor and the operator console,
//! accepting connections until shutdown.

use clap::Parser;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use line_chat::{handle_connection, run_console, AppError, Args, ChatServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // e.g., RUST_LOG=debug or RUST_LOG=line_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("line_chat=info")),
        )
        .init();

    let config = ServerConfig::from(Args::parse());

    // Start TCP listener
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Chat server listening on {}", config.bind_addr);

    let (server, handle) = ChatServer::channel(&config);
    let server_task = tokio::spawn(server.run());

    // Operator console on stdin
    {
        let handle = handle.clone();
        tokio::spawn(async move {
            let stdin = BufReader::new(tokio::io::stdin());
            if let Err(e) = run_console(stdin, tokio::io::stdout(), handle).await {
                error!("Console error: {}", e);
            }
        });
    }

    // Ctrl-C / SIGINT triggers the same shutdown as the console's /quit
    {
        let handle = handle.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutting down server...");
                let _ = handle.shutdown().await;
            }
        });
    }

    let mut sessions = JoinSet::new();

    // Connection accept loop
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    debug!("New connection from {}", addr);
                    let session = handle_connection(stream, handle.clone(), config.clone());
                    sessions.spawn(async move {
                        match session.await {
                            Ok(termination) => {
                                debug!("Session from {} ended: {:?}", addr, termination);
                            }
                            Err(AppError::CapacityExceeded { max }) => {
                                warn!("Max clients ({}) reached. Connection from {} rejected", max, addr);
                            }
                            Err(e) => warn!("Connection from {} rejected: {}", addr, e),
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            },
            Some(_) = sessions.join_next(), if !sessions.is_empty() => {}
            _ = handle.stopped() => break,
        }
    }

    drop(listener);
    info!("Waiting for {} sessions to close", sessions.len());
    while sessions.join_next().await.is_some() {}

    drop(handle);
    // The console task still holds a handle while it waits on stdin
    server_task.abort();
    info!("Server stopped");

    // A pending blocking stdin read would otherwise keep the runtime alive
    std::process::exit(0)
}
