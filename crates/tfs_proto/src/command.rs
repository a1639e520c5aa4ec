use std::{fmt, str::FromStr};

use strum::{Display, EnumString};

/// Kind of node a create command makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum NodeKind {
    #[strum(serialize = "f")]
    File,
    #[strum(serialize = "d")]
    Directory,
}

/// One request in the textual command grammar.
///
/// Commands are space-separated tokens, the first being a one-letter
/// opcode. Paths are absolute-rooted and contain no spaces, so plain
/// whitespace splitting is exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create { path: String, kind: NodeKind },
    Delete { path: String },
    Lookup { path: String },
    Move { from: String, to: String },
    Print { dest: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown opcode {0:?}")]
    UnknownOpcode(String),
    #[error("missing {0}")]
    MissingArgument(&'static str),
    #[error("unexpected trailing tokens")]
    TrailingTokens,
    #[error("invalid node type {0:?}")]
    BadNodeKind(String),
}

fn expect<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    what: &'static str,
) -> Result<&'a str, ParseError> {
    tokens.next().ok_or(ParseError::MissingArgument(what))
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let opcode = tokens.next().ok_or(ParseError::Empty)?;
        let command = match opcode {
            "c" => {
                let path = expect(&mut tokens, "path")?.to_owned();
                let kind = expect(&mut tokens, "node type")?;
                let kind = kind
                    .parse()
                    .map_err(|_| ParseError::BadNodeKind(kind.to_owned()))?;
                Self::Create { path, kind }
            }
            "d" => Self::Delete {
                path: expect(&mut tokens, "path")?.to_owned(),
            },
            "l" => Self::Lookup {
                path: expect(&mut tokens, "path")?.to_owned(),
            },
            "m" => Self::Move {
                from: expect(&mut tokens, "source path")?.to_owned(),
                to: expect(&mut tokens, "destination path")?.to_owned(),
            },
            "p" => Self::Print {
                dest: expect(&mut tokens, "output file")?.to_owned(),
            },
            _ => return Err(ParseError::UnknownOpcode(opcode.to_owned())),
        };
        if tokens.next().is_some() {
            return Err(ParseError::TrailingTokens);
        }
        Ok(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create { path, kind } => write!(f, "c {path} {kind}"),
            Self::Delete { path } => write!(f, "d {path}"),
            Self::Lookup { path } => write!(f, "l {path}"),
            Self::Move { from, to } => write!(f, "m {from} {to}"),
            Self::Print { dest } => write!(f, "p {dest}"),
        }
    }
}
