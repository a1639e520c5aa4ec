//! Client-side shim for the TecnicoFS server.
//!
//! The transport is one datagram per request and one per reply. The
//! client binds its own reply socket under the temp directory so the
//! server has an address to answer to, and removes it on unmount.

use std::{
    env, io,
    os::unix::net::UnixDatagram,
    path::{Path, PathBuf},
    process, str,
    sync::atomic::{AtomicU32, Ordering},
};

use tfs_proto::{Command, ErrorCode, MAX_MESSAGE_SIZE, NodeKind, decode_reply};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("cannot reach server: {0}")]
    Transport(#[from] io::Error),
    #[error("server replied with garbage")]
    Protocol,
    #[error(transparent)]
    Server(ErrorCode),
}

/// Distinguishes reply sockets of several mounts within one process.
static MOUNT_COUNT: AtomicU32 = AtomicU32::new(0);

/// A mounted connection to a server socket.
pub struct TfsClient {
    socket: UnixDatagram,
    local_path: PathBuf,
    server_path: PathBuf,
}

impl TfsClient {
    /// Binds a reply socket and remembers the server address.
    pub fn mount(server_path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let n = MOUNT_COUNT.fetch_add(1, Ordering::Relaxed);
        let local_path = env::temp_dir().join(format!("tfs-client-{}-{n}", process::id()));
        // a crashed run may have left the path behind
        let _ = std::fs::remove_file(&local_path);
        let socket = UnixDatagram::bind(&local_path)?;
        Ok(Self {
            socket,
            local_path,
            server_path: server_path.as_ref().to_path_buf(),
        })
    }

    /// Sends one command and decodes the reply status.
    pub fn send(&self, command: &Command) -> Result<i64, ClientError> {
        let payload = command.to_string();
        self.socket
            .send_to(payload.as_bytes(), &self.server_path)?;

        let mut buf = [0_u8; MAX_MESSAGE_SIZE];
        let len = self.socket.recv(&mut buf)?;
        let text = str::from_utf8(&buf[..len]).map_err(|_| ClientError::Protocol)?;
        match decode_reply(text) {
            Some(Ok(value)) => Ok(value),
            Some(Err(code)) => Err(ClientError::Server(code)),
            None => Err(ClientError::Protocol),
        }
    }

    /// Creates a file or directory at `path`.
    pub fn create(&self, path: &str, kind: NodeKind) -> Result<(), ClientError> {
        self.send(&Command::Create {
            path: path.to_owned(),
            kind,
        })
        .map(|_| ())
    }

    /// Deletes the node at `path`.
    pub fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.send(&Command::Delete {
            path: path.to_owned(),
        })
        .map(|_| ())
    }

    /// Resolves `path` to its inumber on the server.
    pub fn lookup(&self, path: &str) -> Result<i64, ClientError> {
        self.send(&Command::Lookup {
            path: path.to_owned(),
        })
    }

    /// Moves the node at `from` to `to`.
    pub fn rename(&self, from: &str, to: &str) -> Result<(), ClientError> {
        self.send(&Command::Move {
            from: from.to_owned(),
            to: to.to_owned(),
        })
        .map(|_| ())
    }

    /// Asks the server to snapshot its tree into the server-local file
    /// `dest`.
    pub fn print(&self, dest: &str) -> Result<(), ClientError> {
        self.send(&Command::Print {
            dest: dest.to_owned(),
        })
        .map(|_| ())
    }

    /// Tears the mount down, removing the reply socket. Dropping the
    /// client does the same.
    pub fn unmount(self) {}
}

impl Drop for TfsClient {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.local_path);
    }
}
