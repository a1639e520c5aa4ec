//! Maps decoded commands onto the filesystem engine.

use log::info;
use tfs::TecnicoFs;
use tfs_proto::{Command, ErrorCode};

/// Applies one command and produces the wire status: the inumber for
/// lookups, zero for other successes, a negative code on failure.
pub fn apply(fs: &TecnicoFs, command: &Command) -> Result<i64, ErrorCode> {
    match command {
        Command::Create { path, kind } => {
            info!("create {path} as {kind}");
            fs.create(path, *kind).map(|()| 0).map_err(|err| err.code())
        }
        Command::Delete { path } => {
            info!("delete {path}");
            fs.delete(path).map(|()| 0).map_err(|err| err.code())
        }
        Command::Lookup { path } => match fs.lookup(path) {
            Ok(ino) => {
                info!("lookup {path}: found {ino}");
                Ok(i64::from(ino.value()))
            }
            Err(err) => {
                info!("lookup {path}: not found");
                Err(err.code())
            }
        },
        Command::Move { from, to } => {
            info!("move {from} to {to}");
            fs.rename(from, to).map(|()| 0).map_err(|err| err.code())
        }
        Command::Print { dest } => {
            info!("print tree to {dest}");
            fs.print_to_file(dest).map(|()| 0).map_err(|err| err.code())
        }
    }
}
