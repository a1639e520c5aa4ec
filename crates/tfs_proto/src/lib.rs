//! Shared vocabulary between the TecnicoFS server and its clients.
//!
//! Requests travel as one textual command per datagram ([`Command`]);
//! replies carry a single decimal integer, non-negative on success and a
//! negative [`ErrorCode`] discriminant on failure.

pub use self::{
    command::{Command, NodeKind, ParseError},
    error::{ErrorCode, decode_reply, encode_reply},
};

pub mod command;
pub mod error;

/// Upper bound on a request or reply datagram, in bytes.
pub const MAX_MESSAGE_SIZE: usize = 256;
