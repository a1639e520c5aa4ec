use tfs_proto::ErrorCode;

use crate::inode::Inumber;

/// Errors surfaced by filesystem operations.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("parent path does not resolve to a directory")]
    BadParent,
    #[error("entry already exists")]
    Exists,
    #[error("no such entry")]
    NotFound,
    #[error("directory not empty")]
    NotEmpty,
    #[error("inode table is full")]
    NoInode,
    #[error("directory has no free entry slot")]
    DirFull,
    #[error("move would make a directory its own ancestor")]
    Cycle,
    #[error("inumber out of range or freed: {0}")]
    BadInumber(Inumber),
    #[error("path too long")]
    PathTooLong,
    #[error("snapshot output: {0}")]
    Io(#[from] std::io::Error),
}

impl From<&FsError> for ErrorCode {
    fn from(error: &FsError) -> Self {
        match error {
            FsError::BadParent => Self::BadParent,
            FsError::Exists => Self::Exists,
            FsError::NotFound => Self::NotFound,
            FsError::NotEmpty => Self::NotEmpty,
            FsError::NoInode => Self::NoInode,
            FsError::DirFull => Self::DirFull,
            FsError::Cycle => Self::Cycle,
            // A bad inumber surviving past the table layer means the
            // tree references a freed or out-of-range slot. No caller
            // can recover from that; fail loud instead of answering.
            FsError::BadInumber(ino) => {
                panic!("corrupted inode table: bad inumber {ino} reached the reply path")
            }
            FsError::Io(_) => Self::Io,
            FsError::PathTooLong => Self::PathTooLong,
        }
    }
}

impl FsError {
    /// The wire code a reply carries for this error.
    ///
    /// # Panics
    ///
    /// Panics on [`FsError::BadInumber`]: an invalid inumber escaping
    /// the table layer is internal corruption, not an answerable
    /// failure.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_wire_values() {
        assert_eq!(FsError::BadParent.code().value(), -1);
        assert_eq!(FsError::Exists.code().value(), -2);
        assert_eq!(FsError::NotFound.code().value(), -3);
        assert_eq!(FsError::NotEmpty.code().value(), -4);
        assert_eq!(FsError::NoInode.code().value(), -5);
        assert_eq!(FsError::DirFull.code().value(), -6);
        assert_eq!(FsError::Cycle.code().value(), -7);
        assert_eq!(FsError::PathTooLong.code().value(), -10);
    }

    #[test]
    #[should_panic(expected = "corrupted inode table")]
    fn test_bad_inumber_is_fatal() {
        let _ = FsError::BadInumber(Inumber::new(99)).code();
    }
}
