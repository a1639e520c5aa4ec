//! Line-oriented shim for manual testing: reads commands from stdin,
//! sends each to the server, prints the numeric reply.

use std::{
    io::{self, BufRead},
    process::ExitCode,
};

use clap::{Arg, Command};
use log::error;
use tfs_client::{ClientError, TfsClient};

fn main() -> ExitCode {
    env_logger::init();

    let matches = Command::new("tfs-client")
        .about("Sends TecnicoFS commands from stdin to a server socket")
        .arg(
            Arg::new("socket")
                .required(true)
                .help("Path of the server socket"),
        )
        .get_matches();
    let socket = matches.get_one::<String>("socket").expect("required arg");

    let client = match TfsClient::mount(socket) {
        Ok(client) => client,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                error!("stdin: {err}");
                return ExitCode::FAILURE;
            }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let command = match line.parse() {
            Ok(command) => command,
            Err(err) => {
                eprintln!("bad command: {err}");
                continue;
            }
        };
        match client.send(&command) {
            Ok(value) => println!("{value}"),
            Err(ClientError::Server(code)) => println!("{}", code.value()),
            Err(err) => {
                error!("{err}");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}
