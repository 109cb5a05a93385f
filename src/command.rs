//! Command parsing
//!
//! Turns one normalized input line into a `Command` (session input once
//! named) or an `OperatorCommand` (console input). Lines that do not start
//! with `/` are chat.

/// Command prefix
pub const COMMAND_PREFIX: char = '/';

/// Input from a named session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/quit`: end this session
    Quit,
    /// `/list`: online users
    List,
    /// `/help`: usage line
    Help,
    /// `/nick <name>`: the argument is trimmed and may be empty
    Nick(String),
    /// Any other `/…` token
    Unknown(String),
    /// Ordinary chat line
    Chat(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        if !line.starts_with(COMMAND_PREFIX) {
            return Command::Chat(line.to_string());
        }

        let (token, rest) = split_token(line);
        match token {
            "/quit" if rest.is_empty() => Command::Quit,
            "/list" if rest.is_empty() => Command::List,
            "/help" if rest.is_empty() => Command::Help,
            "/nick" => Command::Nick(rest.to_string()),
            _ => Command::Unknown(line.to_string()),
        }
    }
}

/// Input typed on the operator console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    /// `/quit`: shut the whole server down
    Shutdown,
    /// `/list`: print online users to the console
    List,
    /// `/help`: print console usage
    Help,
    /// Everything else is broadcast to all sessions
    Broadcast(String),
}

impl OperatorCommand {
    pub fn parse(line: &str) -> Self {
        match line {
            "/quit" => OperatorCommand::Shutdown,
            "/list" => OperatorCommand::List,
            "/help" => OperatorCommand::Help,
            _ => OperatorCommand::Broadcast(line.to_string()),
        }
    }
}

/// Split a line into its first token and the trimmed remainder
fn split_token(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest.trim()),
        None => (line, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/list"), Command::List);
        assert_eq!(Command::parse("/help"), Command::Help);
        assert_eq!(Command::parse("/nick bobby"), Command::Nick("bobby".into()));
    }

    #[test]
    fn test_parse_nick_argument_trimmed() {
        assert_eq!(
            Command::parse("/nick   new name  "),
            Command::Nick("new name".into())
        );
        assert_eq!(Command::parse("/nick"), Command::Nick(String::new()));
        assert_eq!(Command::parse("/nick \t "), Command::Nick(String::new()));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            Command::parse("/nickname x"),
            Command::Unknown("/nickname x".into())
        );
        assert_eq!(Command::parse("/dance"), Command::Unknown("/dance".into()));
        assert_eq!(
            Command::parse("/quit now"),
            Command::Unknown("/quit now".into())
        );
    }

    #[test]
    fn test_parse_chat() {
        assert_eq!(Command::parse("hi all"), Command::Chat("hi all".into()));
        assert_eq!(
            Command::parse("not /a command"),
            Command::Chat("not /a command".into())
        );
    }

    #[test]
    fn test_parse_operator() {
        assert_eq!(OperatorCommand::parse("/quit"), OperatorCommand::Shutdown);
        assert_eq!(OperatorCommand::parse("/list"), OperatorCommand::List);
        assert_eq!(OperatorCommand::parse("/help"), OperatorCommand::Help);
        assert_eq!(
            OperatorCommand::parse("/nick admin"),
            OperatorCommand::Broadcast("/nick admin".into())
        );
        assert_eq!(
            OperatorCommand::parse("restart at noon"),
            OperatorCommand::Broadcast("restart at noon".into())
        );
    }
}
