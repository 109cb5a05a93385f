//! Server configuration
//!
//! `ServerConfig` carries the runtime limits; `Args` is the clap-derived
//! command line that builds one.

use std::time::Duration;

use clap::Parser;

/// Default bind host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind port
pub const DEFAULT_PORT: u16 = 2006;

/// Default maximum number of simultaneous sessions
pub const DEFAULT_MAX_CLIENTS: usize = 100;

/// Runtime settings shared by the accept loop, the actor and every session
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to
    pub bind_addr: String,
    /// Registry capacity
    pub max_clients: usize,
    /// Upper bound on a single socket write
    pub write_timeout: Duration,
    /// Maximum bytes consumed by a single line read
    pub max_line_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("{DEFAULT_HOST}:{DEFAULT_PORT}"),
            max_clients: DEFAULT_MAX_CLIENTS,
            write_timeout: Duration::from_secs(5),
            max_line_length: 1024,
        }
    }
}

/// Command line arguments for the server binary
#[derive(Parser, Debug)]
#[command(author, version, about = "Line-oriented TCP chat server", long_about = None)]
pub struct Args {
    /// Host IP to bind
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to bind
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Maximum number of connected clients
    #[arg(long, default_value_t = DEFAULT_MAX_CLIENTS)]
    pub max_clients: usize,

    /// Per-write timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub write_timeout_ms: u64,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            bind_addr: format!("{}:{}", args.host, args.port),
            max_clients: args.max_clients,
            write_timeout: Duration::from_millis(args.write_timeout_ms),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:2006");
        assert_eq!(config.max_clients, 100);
        assert_eq!(config.max_line_length, 1024);
    }

    #[test]
    fn test_args_into_config() {
        let args = Args::parse_from([
            "line_chat",
            "-H",
            "0.0.0.0",
            "-p",
            "4000",
            "--max-clients",
            "3",
            "--write-timeout-ms",
            "250",
        ]);
        let config = ServerConfig::from(args);

        assert_eq!(config.bind_addr, "0.0.0.0:4000");
        assert_eq!(config.max_clients, 3);
        assert_eq!(config.write_timeout, Duration::from_millis(250));
    }
}
