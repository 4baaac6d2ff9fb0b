//! Chat command parsing.
//!
//! Members type `+name` to take a rank and `-name` to drop it. Anything
//! else in the designated channel is ordinary conversation and is ignored.

/// A parsed member command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub rank: String,
    pub add: bool,
}

/// Parse a message body into a command, or `None` when the message is not
/// one. Only the first non-space token is considered.
pub fn parse_command(body: &str) -> Option<Command> {
    let token = body.split_whitespace().next()?;
    let (add, rank) = if let Some(rest) = token.strip_prefix('+') {
        (true, rest)
    } else if let Some(rest) = token.strip_prefix('-') {
        (false, rest)
    } else {
        return None;
    };
    if rank.is_empty() {
        return None;
    }
    Some(Command { rank: rank.to_owned(), add })
}
