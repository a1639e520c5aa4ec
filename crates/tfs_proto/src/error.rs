use strum::FromRepr;

/// Failure codes carried by reply datagrams.
///
/// The wire value is the discriminant; every code is negative so that a
/// reply can always be told apart from a successful inumber (`>= 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr, thiserror::Error)]
#[repr(i64)]
pub enum ErrorCode {
    #[error("parent path does not resolve to a directory")]
    BadParent = -1,
    #[error("entry already exists")]
    Exists = -2,
    #[error("no such entry")]
    NotFound = -3,
    #[error("directory not empty")]
    NotEmpty = -4,
    #[error("inode table is full")]
    NoInode = -5,
    #[error("directory has no free entry slot")]
    DirFull = -6,
    #[error("move would make a directory its own ancestor")]
    Cycle = -7,
    #[error("invalid inumber")]
    BadInumber = -8,
    #[error("cannot write snapshot output")]
    Io = -9,
    #[error("path too long")]
    PathTooLong = -10,
    #[error("malformed request")]
    Protocol = -11,
}

impl ErrorCode {
    /// The integer carried on the wire.
    #[must_use]
    pub const fn value(self) -> i64 {
        self as i64
    }
}

/// Formats an operation status as a reply payload.
#[must_use]
pub fn encode_reply(status: Result<i64, ErrorCode>) -> String {
    match status {
        Ok(value) => value.to_string(),
        Err(code) => code.value().to_string(),
    }
}

/// Decodes a reply payload back into an operation status.
///
/// Returns `None` when the payload is not a decimal integer or carries an
/// unknown negative code.
#[must_use]
pub fn decode_reply(payload: &str) -> Option<Result<i64, ErrorCode>> {
    let value = payload.trim().parse::<i64>().ok()?;
    if value >= 0 {
        Some(Ok(value))
    } else {
        ErrorCode::from_repr(value).map(Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_round_trip() {
        assert_eq!(decode_reply(&encode_reply(Ok(3))), Some(Ok(3)));
        assert_eq!(
            decode_reply(&encode_reply(Err(ErrorCode::NotEmpty))),
            Some(Err(ErrorCode::NotEmpty))
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(decode_reply(""), None);
        assert_eq!(decode_reply("yes"), None);
        assert_eq!(decode_reply("-9999"), None);
    }

    #[test]
    fn test_decode_trims_whitespace() {
        assert_eq!(decode_reply(" 0\n"), Some(Ok(0)));
    }
}
