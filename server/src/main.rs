//! TecnicoFS server.
//!
//! Serves an in-memory filesystem over a unix datagram socket, or, with
//! `--script`, drains a command file through the same worker pool and
//! exits.

use std::{path::PathBuf, process::ExitCode};

use clap::{Arg, Command, value_parser};
use log::error;
use tfs::TecnicoFs;

mod apply;
mod error;
mod script;
mod transport;

fn cli() -> Command {
    Command::new("tfs-server")
        .about("Serves an in-memory TecnicoFS tree over a unix datagram socket")
        .arg(
            Arg::new("threads")
                .required(true)
                .value_parser(value_parser!(usize))
                .help("Number of worker threads"),
        )
        .arg(
            Arg::new("socket")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Path of the unix datagram socket to bind"),
        )
        .arg(
            Arg::new("script")
                .long("script")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Apply commands from FILE and exit instead of serving the socket"),
        )
}

fn main() -> ExitCode {
    env_logger::init();

    let matches = cli().get_matches();
    let threads = *matches.get_one::<usize>("threads").expect("required arg");
    let socket = matches.get_one::<PathBuf>("socket").expect("required arg");
    let script = matches.get_one::<PathBuf>("script");

    if threads == 0 {
        error!("number of worker threads must be at least 1");
        return ExitCode::FAILURE;
    }

    let fs = TecnicoFs::new();
    let result = match script {
        Some(script) => script::run(&fs, script, threads),
        None => transport::serve(&fs, socket, threads),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
