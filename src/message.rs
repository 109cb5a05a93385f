//! Wire protocol definitions
//!
//! Newline-delimited UTF-8 text. `ServerMessage` renders, through `Display`,
//! the exact bytes a client receives; `normalize_line` turns one raw record
//! from a client into the trimmed line the interpreter sees.

use std::fmt;

use chrono::Local;

/// Name given to a session before it has named itself
pub const DEFAULT_NAME: &str = "Anonymous";

/// Name reported for a handle that is not in the registry
pub const UNKNOWN_NAME: &str = "Unknown";

/// Sender name shown on operator broadcasts
pub const SERVER_NAME: &str = "Server";

/// Display timestamp format, `MM/DD/YYYY-HH:MM:SS`
const TIMESTAMP_FORMAT: &str = "%m/%d/%Y-%H:%M:%S";

/// Current local time formatted for chat lines
pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Strip the record separator and surrounding whitespace from a raw line
///
/// Returns `None` for lines that are empty after trimming.
pub fn normalize_line(raw: &str) -> Option<&str> {
    let line = raw.strip_suffix('\n').unwrap_or(raw);
    let line = line.strip_suffix('\r').unwrap_or(line);
    let line = line.trim();
    (!line.is_empty()).then_some(line)
}

/// Server → Client message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// First bytes on a new connection, no trailing newline
    NamePrompt,
    /// A session named itself
    Joined { name: String },
    /// A session terminated
    Left { name: String },
    /// A session renamed itself
    Renamed { old: String, new: String },
    /// Relayed chat line or operator broadcast
    Chat {
        timestamp: String,
        from: String,
        content: String,
    },
    /// `/list` response
    OnlineUsers { names: Vec<String> },
    /// `/help` response
    Help,
    /// Response to an unrecognised `/…` token
    UnknownCommand,
}

impl ServerMessage {
    /// Chat line stamped with the current time
    pub fn chat(from: impl Into<String>, content: impl Into<String>) -> Self {
        ServerMessage::Chat {
            timestamp: timestamp(),
            from: from.into(),
            content: content.into(),
        }
    }

    /// Operator broadcast stamped with the current time
    pub fn admin(content: impl Into<String>) -> Self {
        Self::chat(SERVER_NAME, content)
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::NamePrompt => f.write_str("Enter name: "),
            ServerMessage::Joined { name } => writeln!(f, "{name} joined"),
            ServerMessage::Left { name } => writeln!(f, "{name} left"),
            ServerMessage::Renamed { old, new } => writeln!(f, "{old} is now {new}"),
            ServerMessage::Chat {
                timestamp,
                from,
                content,
            } => writeln!(f, "{timestamp} [{from}]: {content}"),
            ServerMessage::OnlineUsers { names } => {
                writeln!(f, "Online users: {}", names.join(", "))
            }
            ServerMessage::Help => f.write_str("Commands: /nick <name>, /list, /help, /quit\n"),
            ServerMessage::UnknownCommand => {
                f.write_str("Unknown command. /help for commands.\n")
            }
        }
    }
}
