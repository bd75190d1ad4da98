//! Command vocabulary and tokenizer
//!
//! A command line is a verb followed by at most one argument:
//! ```text
//! ping
//! fwd 50      (50 x 10ms)
//! rt 180      (degrees)
//! ```

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while reading a command line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    InvalidCommand,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid arguments for {verb}: {reason}")]
    InvalidArguments { verb: Verb, reason: String },
}

impl CommandError {
    pub(crate) fn arguments(verb: Verb, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            verb,
            reason: reason.into(),
        }
    }
}

/// The fixed set of verbs understood by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Liveness check, never actuates
    Ping,
    /// Forward at cruise throttle
    Forward,
    /// Forward at full throttle
    FastForward,
    /// Backward at cruise throttle
    Back,
    /// Spin left in place
    Left,
    /// Spin right in place
    Right,
}

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::Ping,
        Verb::Forward,
        Verb::FastForward,
        Verb::Back,
        Verb::Left,
        Verb::Right,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Ping => "ping",
            Verb::Forward => "fwd",
            Verb::FastForward => "ffwd",
            Verb::Back => "bck",
            Verb::Left => "lt",
            Verb::Right => "rt",
        }
    }

    /// Number of arguments the verb requires. Tokens after `ping` are
    /// ignored rather than counted.
    pub fn arity(&self) -> usize {
        match self {
            Verb::Ping => 0,
            _ => 1,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.as_str() == s)
            .ok_or_else(|| CommandError::UnknownCommand(s.to_string()))
    }
}

/// A tokenized command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: Verb,
    /// Raw argument value (tens of milliseconds or degrees, depending on verb)
    pub arg: Option<u64>,
}

impl Command {
    /// Split a command line on whitespace and validate arity and argument syntax
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut fields = line.split_whitespace();
        let verb: Verb = fields.next().ok_or(CommandError::InvalidCommand)?.parse()?;
        if verb == Verb::Ping {
            return Ok(Self { verb, arg: None });
        }

        let args: Vec<&str> = fields.collect();

        if args.len() != verb.arity() {
            return Err(CommandError::arguments(
                verb,
                format!("expected {} argument(s), got {}", verb.arity(), args.len()),
            ));
        }

        let arg = match args.first() {
            Some(token) => Some(parse_unsigned(verb, token)?),
            None => None,
        };

        Ok(Self { verb, arg })
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s)
    }
}

/// Plain base-10 digits only; signs are rejected
fn parse_unsigned(verb: Verb, token: &str) -> Result<u64, CommandError> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CommandError::arguments(
            verb,
            format!("not a non-negative integer: {token:?}"),
        ));
    }

    token
        .parse()
        .map_err(|e| CommandError::arguments(verb, format!("{token:?}: {e}")))
}
