//! The datagram transport and its worker pool.
//!
//! One socket, N workers: every worker blocks in `recv_from` on the
//! shared socket, applies the command it won, and answers the sender
//! with the decimal status. The kernel hands each datagram to exactly
//! one receiver, so no dispatch layer is needed.

use std::{io, os::unix::net::UnixDatagram, path::Path, str, thread};

use log::{debug, error, info, warn};
use tfs::TecnicoFs;
use tfs_proto::{Command, ErrorCode, MAX_MESSAGE_SIZE, encode_reply};

use crate::{apply, error::ServerError};

/// Binds the socket and serves requests until the process is killed.
pub fn serve(fs: &TecnicoFs, path: &Path, threads: usize) -> Result<(), ServerError> {
    // a socket file left over from a previous run would make bind fail
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!("cannot remove stale socket {}: {err}", path.display()),
    }
    let socket = UnixDatagram::bind(path).map_err(|source| ServerError::Bind {
        path: path.display().to_string(),
        source,
    })?;

    info!("serving on {} with {threads} workers", path.display());
    thread::scope(|scope| {
        for worker in 0..threads {
            let socket = &socket;
            scope.spawn(move || worker_loop(worker, fs, socket));
        }
    });
    Ok(())
}

fn worker_loop(worker: usize, fs: &TecnicoFs, socket: &UnixDatagram) {
    let mut buf = [0_u8; MAX_MESSAGE_SIZE];
    loop {
        let (len, peer) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(err) => {
                error!("worker {worker}: receive failed: {err}");
                continue;
            }
        };

        let status = match str::from_utf8(&buf[..len]) {
            Ok(text) => match text.trim_end().parse::<Command>() {
                Ok(command) => apply::apply(fs, &command),
                Err(err) => {
                    warn!("worker {worker}: malformed request {text:?}: {err}");
                    Err(ErrorCode::Protocol)
                }
            },
            Err(_) => {
                warn!("worker {worker}: request is not utf-8");
                Err(ErrorCode::Protocol)
            }
        };
        let payload = encode_reply(status);

        let Some(reply_path) = peer.as_pathname() else {
            warn!("worker {worker}: peer has no reply address");
            continue;
        };
        debug!("worker {worker}: replying {payload} to {}", reply_path.display());
        if let Err(err) = socket.send_to(payload.as_bytes(), reply_path) {
            warn!("worker {worker}: reply failed: {err}");
        }
    }
}
