use std::io;

use tfs_proto::ParseError;

/// Fatal server-level failures: bad startup or a broken script.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("cannot bind socket {path}: {source}")]
    Bind { path: String, source: io::Error },
    #[error("cannot read script {path}: {source}")]
    Script { path: String, source: io::Error },
    #[error("bad command in script: {0}")]
    Parse(#[from] ParseError),
}
