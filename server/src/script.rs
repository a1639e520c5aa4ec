//! Offline mode: drain a command script through the worker pool.
//!
//! A reader thread feeds lines into a bounded channel; the same worker
//! count as socket mode consumes them. Dropping the sender closes the
//! channel, which every blocked worker observes as end-of-script.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    thread,
};

use crossbeam_channel::bounded;
use log::info;
use tfs::TecnicoFs;
use tfs_proto::Command;

use crate::{apply, error::ServerError};

/// Commands buffered between the reader and the workers.
const QUEUE_DEPTH: usize = 10;

fn script_error(script: &Path, source: std::io::Error) -> ServerError {
    ServerError::Script {
        path: script.display().to_string(),
        source,
    }
}

/// Applies every command in `script`, then returns. Blank lines and
/// `#` comments are skipped; a malformed command aborts the run.
pub fn run(fs: &TecnicoFs, script: &Path, threads: usize) -> Result<(), ServerError> {
    let file = File::open(script).map_err(|source| script_error(script, source))?;
    let reader = BufReader::new(file);

    let (sender, receiver) = bounded::<Command>(QUEUE_DEPTH);

    thread::scope(|scope| -> Result<(), ServerError> {
        for _ in 0..threads {
            let receiver = receiver.clone();
            scope.spawn(move || {
                while let Ok(command) = receiver.recv() {
                    let _ = apply::apply(fs, &command);
                }
            });
        }

        for line in reader.lines() {
            let line = line.map_err(|source| script_error(script, source))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let command: Command = line.parse()?;
            sender
                .send(command)
                .expect("workers hold the channel open until it is closed");
        }
        drop(sender);
        Ok(())
    })?;

    info!("script {} applied", script.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{io::Write, process};

    use super::*;

    #[test]
    fn test_single_worker_applies_in_order() {
        let dir = std::env::temp_dir();
        let script_path = dir.join(format!("tfs-script-{}", process::id()));
        let out_path = dir.join(format!("tfs-script-out-{}", process::id()));

        let mut file = File::create(&script_path).unwrap();
        writeln!(file, "# build a small tree").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "c /a d").unwrap();
        writeln!(file, "c /a/x f").unwrap();
        writeln!(file, "m /a/x /a/y").unwrap();
        drop(file);

        let fs = TecnicoFs::new();
        run(&fs, &script_path, 1).unwrap();

        assert!(fs.lookup("/a/y").is_ok());
        fs.print_to_file(&out_path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&out_path).unwrap(),
            "\n/a\n/a/y\n"
        );

        let _ = std::fs::remove_file(&script_path);
        let _ = std::fs::remove_file(&out_path);
    }

    #[test]
    fn test_pool_drains_independent_commands() {
        // commands on unrelated paths may apply in any order
        let dir = std::env::temp_dir();
        let script_path = dir.join(format!("tfs-script-pool-{}", process::id()));
        let mut file = File::create(&script_path).unwrap();
        for i in 0..16 {
            writeln!(file, "c /n{i} d").unwrap();
        }
        drop(file);

        let fs = TecnicoFs::new();
        run(&fs, &script_path, 4).unwrap();
        for i in 0..16 {
            assert!(fs.lookup(&format!("/n{i}")).is_ok());
        }

        let _ = std::fs::remove_file(&script_path);
    }

    #[test]
    fn test_missing_script_is_reported() {
        let fs = TecnicoFs::new();
        let bogus = std::env::temp_dir().join("tfs-script-does-not-exist");
        assert!(matches!(
            run(&fs, &bogus, 2),
            Err(ServerError::Script { .. })
        ));
    }

    #[test]
    fn test_malformed_script_line_is_fatal() {
        let dir = std::env::temp_dir();
        let script_path = dir.join(format!("tfs-script-bad-{}", process::id()));
        let mut file = File::create(&script_path).unwrap();
        writeln!(file, "c /a d").unwrap();
        writeln!(file, "z /what").unwrap();
        drop(file);

        let fs = TecnicoFs::new();
        assert!(matches!(
            run(&fs, &script_path, 2),
            Err(ServerError::Parse(_))
        ));

        let _ = std::fs::remove_file(&script_path);
    }
}
