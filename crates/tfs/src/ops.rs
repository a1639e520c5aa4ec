//! Filesystem operations.
//!
//! Every mutator follows the same shape: register with the snapshot
//! coordinator, resolve the parent path with a write-locked terminal,
//! verify its preconditions under the held chain, mutate, and let the
//! guards release everything on the way out.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use log::{debug, warn};
use tfs_proto::NodeKind;

use crate::{
    error::FsError,
    inode::{Inode, InodeTable, Inumber},
    param::MAX_FILE_NAME,
    path::{self, Extended, LockMode, Resolved},
    snapshot::SnapshotCoordinator,
};

fn check_path(path: &str) -> Result<(), FsError> {
    if path.len() > MAX_FILE_NAME {
        return Err(FsError::PathTooLong);
    }
    Ok(())
}

/// The in-memory filesystem: one inode table plus the global snapshot
/// coordination. All operations take `&self` and synchronize internally,
/// so one instance is shared across a worker pool as-is.
pub struct TecnicoFs {
    pub(crate) table: InodeTable,
    coordinator: SnapshotCoordinator,
}

impl TecnicoFs {
    /// Creates an empty filesystem: just the root directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: InodeTable::new(),
            coordinator: SnapshotCoordinator::new(),
        }
    }

    /// Creates a file or directory at `path`.
    pub fn create(&self, path: &str, kind: NodeKind) -> Result<(), FsError> {
        check_path(path)?;
        let _mutator = self.coordinator.mutator();
        let (parent_path, child_name) = path::split_parent_child(path);

        let Resolved { ino, mut chain } =
            path::resolve(&self.table, parent_path, LockMode::Write)?;
        if ino.is_none() {
            warn!("failed to create {path}: invalid parent dir {parent_path:?}");
            return Err(FsError::BadParent);
        }
        {
            let Some(dir) = chain.terminal().and_then(|(_, inode)| inode.as_dir()) else {
                warn!("failed to create {path}: parent {parent_path:?} is not a dir");
                return Err(FsError::BadParent);
            };
            if dir.find(child_name).is_some() {
                warn!("failed to create {path}: already exists in {parent_path:?}");
                return Err(FsError::Exists);
            }
        }

        let (child_ino, mut child_guard) = match self.table.alloc(kind) {
            Ok(claimed) => claimed,
            Err(err) => {
                warn!("failed to create {path}: {err}");
                return Err(err);
            }
        };
        let dir = chain
            .terminal_mut()
            .and_then(|(_, inode)| inode.as_dir_mut())
            .ok_or(FsError::BadParent)?;
        if dir.add(child_ino, child_name).is_err() {
            *child_guard = Inode::Free;
            warn!("failed to create {path}: no free entry in {parent_path:?}");
            return Err(FsError::DirFull);
        }
        debug!("create {path}: inumber {child_ino}");
        Ok(())
    }

    /// Deletes the node at `path`. Directories must be empty.
    pub fn delete(&self, path: &str) -> Result<(), FsError> {
        let _mutator = self.coordinator.mutator();
        let (parent_path, child_name) = path::split_parent_child(path);

        let Resolved { ino, mut chain } =
            path::resolve(&self.table, parent_path, LockMode::Write)?;
        if ino.is_none() {
            warn!("failed to delete {path}: invalid parent dir {parent_path:?}");
            return Err(FsError::BadParent);
        }
        let child_ino = {
            let Some(dir) = chain.terminal().and_then(|(_, inode)| inode.as_dir()) else {
                warn!("failed to delete {path}: parent {parent_path:?} is not a dir");
                return Err(FsError::BadParent);
            };
            match dir.find(child_name) {
                Some(child) => child,
                None => {
                    warn!("failed to delete {path}: no such entry in {parent_path:?}");
                    return Err(FsError::NotFound);
                }
            }
        };

        // The parent is write-held, so no other walker can reach the
        // child; this lock cannot contend or deadlock.
        let mut child_guard = self.table.write(child_ino)?;
        if let Inode::Directory(entries) = &*child_guard {
            if !entries.is_empty() {
                warn!("failed to delete {path}: directory not empty");
                return Err(FsError::NotEmpty);
            }
        }
        chain
            .terminal_mut()
            .and_then(|(_, inode)| inode.as_dir_mut())
            .ok_or(FsError::BadParent)?
            .remove(child_ino)?;
        *child_guard = Inode::Free;
        debug!("delete {path}: inumber {child_ino} freed");
        Ok(())
    }

    /// Resolves `path` to its inumber.
    ///
    /// Pure reader: lock-coupled along the walk but never registered
    /// with the snapshot coordinator.
    pub fn lookup(&self, path: &str) -> Result<Inumber, FsError> {
        let resolved = path::resolve(&self.table, path, LockMode::Read)?;
        resolved.ino.ok_or(FsError::NotFound)
    }

    /// Moves the node at `from` to `to`, keeping its inumber.
    ///
    /// The two parent chains are taken in path-string order; a thread
    /// never re-locks a node its first chain already holds (the second
    /// walk rides through it), so concurrent symmetric moves cannot
    /// deadlock.
    pub fn rename(&self, from: &str, to: &str) -> Result<(), FsError> {
        check_path(to)?;
        let _mutator = self.coordinator.mutator();

        // Opportunistic pre-checks; re-verified below once the parent
        // chains are held.
        if path::resolve(&self.table, from, LockMode::Read)?.ino.is_none() {
            warn!("failed to move {from}: no such entry");
            return Err(FsError::NotFound);
        }
        if path::resolve(&self.table, to, LockMode::Read)?.ino.is_some() {
            warn!("failed to move {from} to {to}: destination exists");
            return Err(FsError::Exists);
        }

        let (from_parent, from_name) = path::split_parent_child(from);
        let (to_parent, to_name) = path::split_parent_child(to);

        if from_parent == to_parent {
            // One chain serves as both source and destination parent.
            let Resolved { ino, mut chain } =
                path::resolve(&self.table, from_parent, LockMode::Write)?;
            if ino.is_none() {
                warn!("failed to move {from}: invalid parent dir {from_parent:?}");
                return Err(FsError::BadParent);
            }
            let child_ino = {
                let Some(dir) = chain.terminal().and_then(|(_, inode)| inode.as_dir()) else {
                    warn!("failed to move {from}: parent {from_parent:?} is not a dir");
                    return Err(FsError::BadParent);
                };
                if dir.find(to_name).is_some() {
                    warn!("failed to move {from} to {to}: destination exists");
                    return Err(FsError::Exists);
                }
                match dir.find(from_name) {
                    Some(child) => child,
                    None => {
                        warn!("failed to move {from}: no such entry");
                        return Err(FsError::NotFound);
                    }
                }
            };
            let _child_guard = self.table.write(child_ino)?;
            let dir = chain
                .terminal_mut()
                .and_then(|(_, inode)| inode.as_dir_mut())
                .ok_or(FsError::BadParent)?;
            dir.add(child_ino, to_name)?;
            dir.remove_named(from_name)?;
            debug!("move {from} to {to}");
            return Ok(());
        }

        // Resolve the lexicographically smaller parent first. A parent
        // lying on the other parent's path is a strict prefix of it and
        // therefore sorts first, so the longer walk always finds that
        // node already write-held and rides through it.
        let from_is_first = from_parent <= to_parent;
        let (first_path, second_path) = if from_is_first {
            (from_parent, to_parent)
        } else {
            (to_parent, from_parent)
        };

        let Resolved {
            ino: first_ino,
            chain: mut first_chain,
        } = path::resolve(&self.table, first_path, LockMode::Write)?;
        if first_ino.is_none() {
            warn!("failed to move {from}: invalid parent dir {first_path:?}");
            return Err(FsError::BadParent);
        }
        let Extended {
            ino: second_ino,
            chain: mut second_chain,
            trace,
        } = path::resolve_extend(&self.table, second_path, LockMode::Write, &first_chain)?;
        if second_ino.is_none() {
            warn!("failed to move {from}: invalid parent dir {second_path:?}");
            return Err(FsError::BadParent);
        }

        // Re-verify under the chains; the pre-checks may be stale.
        let child_ino = {
            let (old_chain, new_chain) = if from_is_first {
                (&first_chain, &second_chain)
            } else {
                (&second_chain, &first_chain)
            };
            let Some(old_dir) = old_chain.terminal().and_then(|(_, inode)| inode.as_dir())
            else {
                warn!("failed to move {from}: parent {from_parent:?} is not a dir");
                return Err(FsError::BadParent);
            };
            let Some(new_dir) = new_chain.terminal().and_then(|(_, inode)| inode.as_dir())
            else {
                warn!("failed to move {from} to {to}: parent {to_parent:?} is not a dir");
                return Err(FsError::BadParent);
            };
            if new_dir.find(to_name).is_some() {
                warn!("failed to move {from} to {to}: destination exists");
                return Err(FsError::Exists);
            }
            match old_dir.find(from_name) {
                Some(child) => child,
                None => {
                    warn!("failed to move {from}: no such entry");
                    return Err(FsError::NotFound);
                }
            }
        };

        // The moved node must not sit anywhere on the root-to-new-parent
        // path, or it would become its own ancestor.
        let on_destination_path = if from_is_first {
            trace.contains(&child_ino)
        } else {
            first_chain.contains(child_ino)
        };
        if on_destination_path {
            warn!("failed to move {from} to {to}: would create a cycle");
            return Err(FsError::Cycle);
        }

        let _child_guard = self.table.write(child_ino)?;
        {
            let new_chain = if from_is_first {
                &mut second_chain
            } else {
                &mut first_chain
            };
            let dir = new_chain
                .terminal_mut()
                .and_then(|(_, inode)| inode.as_dir_mut())
                .ok_or(FsError::BadParent)?;
            dir.add(child_ino, to_name)?;
        }
        {
            let old_chain = if from_is_first {
                &mut first_chain
            } else {
                &mut second_chain
            };
            old_chain
                .terminal_mut()
                .and_then(|(_, inode)| inode.as_dir_mut())
                .ok_or(FsError::BadParent)?
                .remove(child_ino)?;
        }
        debug!("move {from} to {to}");
        Ok(())
    }

    /// Writes a full-tree snapshot to `sink`, parents before children.
    ///
    /// Takes the snapshot role: waits for in-flight mutators to drain
    /// and shuts new ones out until the dump completes. Lookups may
    /// overlap freely.
    pub fn print_tree(&self, sink: &mut impl Write) -> Result<(), FsError> {
        let _snapshot = self.coordinator.snapshot();
        self.table.write_tree(sink)
    }

    /// Snapshots the tree into the file at `dest` (created or
    /// truncated).
    pub fn print_to_file(&self, dest: impl AsRef<Path>) -> Result<(), FsError> {
        let file = File::create(dest)?;
        let mut sink = BufWriter::new(file);
        self.print_tree(&mut sink)?;
        sink.flush()?;
        Ok(())
    }
}

impl Default for TecnicoFs {
    fn default() -> Self {
        Self::new()
    }
}
