//! Line Chat Client
//!
//! Copies server output to stdout and stdin lines to the server. Plain
//! chat lines are echoed locally because the server never relays them back
//! to their sender.

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use line_chat::config::{DEFAULT_HOST, DEFAULT_PORT};
use line_chat::message::{normalize_line, ServerMessage};
use line_chat::Command;

/// Command line arguments for the client binary
#[derive(Parser, Debug)]
#[command(author, version, about = "Line-oriented TCP chat client", long_about = None)]
struct ClientArgs {
    /// Server IP
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = ClientArgs::parse();
    let addr = format!("{}:{}", args.host, args.port);

    println!("Connecting to {}...", addr);
    let stream = TcpStream::connect(&addr).await?;
    info!("Connected to {}", addr);
    let (mut server_rx, mut server_tx) = stream.into_split();

    // Server -> stdout
    let mut receive_task = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        let mut buf = [0u8; 1024];
        loop {
            match server_rx.read(&mut buf).await {
                Ok(0) => {
                    debug!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    debug!("Read from server failed: {}", e);
                    break;
                }
                Ok(n) => {
                    if stdout.write_all(&buf[..n]).await.is_err() {
                        break;
                    }
                    let _ = stdout.flush().await;
                }
            }
        }
    });

    // stdin -> server
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut my_name: Option<String> = None;

    loop {
        let raw = tokio::select! {
            line = stdin.next_line() => line?,
            _ = &mut receive_task => {
                println!("\nDisconnected from server.");
                break;
            }
        };
        let Some(raw) = raw else {
            debug!("stdin closed");
            break;
        };
        let Some(line) = normalize_line(&raw) else {
            continue;
        };

        let first = my_name.is_none();
        let command = Command::parse(line);
        match (my_name.clone(), &command) {
            (None, _) => {
                debug!("Requesting name {}", line);
                my_name = Some(line.to_string());
            }
            (Some(_), Command::Nick(new)) if !new.is_empty() => {
                debug!("Renaming to {}", new);
                my_name = Some(new.clone());
            }
            (Some(name), Command::Chat(content)) => {
                print!("{}", ServerMessage::chat(name, content.clone()));
            }
            _ => {}
        }

        server_tx.write_all(line.as_bytes()).await?;
        server_tx.write_all(b"\n").await?;

        // The first line is always a name, even "/quit"
        if !first && command == Command::Quit {
            info!("Quit sent, closing connection");
            break;
        }
    }

    let _ = server_tx.shutdown().await;
    // A pending blocking stdin read would otherwise keep the runtime alive
    std::process::exit(0)
}
