//! The fixed-capacity inode table.

use std::io::Write;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tfs_proto::NodeKind;

use super::{DirEntries, Inode, Inumber};
use crate::{
    error::FsError,
    param::{INODE_TABLE_SIZE, MAX_FILE_NAME},
};

/// The table of inode slots, addressed by inumber.
///
/// Slot 0 holds the root directory, installed at construction and never
/// freed. Every slot carries its own reader/writer lock; freed slots are
/// reused by later allocations.
pub struct InodeTable {
    slots: Box<[RwLock<Inode>]>,
}

impl InodeTable {
    /// Creates a table with every slot free and the root installed.
    #[must_use]
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(INODE_TABLE_SIZE);
        slots.resize_with(INODE_TABLE_SIZE, || RwLock::new(Inode::Free));
        let table = Self {
            slots: slots.into_boxed_slice(),
        };
        *table.slots[Inumber::ROOT.index()].write() = Inode::Directory(DirEntries::new());
        table
    }

    fn slot(&self, ino: Inumber) -> Result<&RwLock<Inode>, FsError> {
        self.slots.get(ino.index()).ok_or(FsError::BadInumber(ino))
    }

    /// Acquires the slot's lock for reading. Blocks.
    pub fn read(&self, ino: Inumber) -> Result<RwLockReadGuard<'_, Inode>, FsError> {
        Ok(self.slot(ino)?.read())
    }

    /// Acquires the slot's lock for writing. Blocks.
    pub fn write(&self, ino: Inumber) -> Result<RwLockWriteGuard<'_, Inode>, FsError> {
        Ok(self.slot(ino)?.write())
    }

    /// Claims the first free slot for a new node of the given kind.
    ///
    /// The inode comes back with its write lock held, so the caller can
    /// link it into a directory before anyone else can observe it. A slot
    /// whose lock is contended is live or mid-claim, never free, so the
    /// scan skips it rather than blocking while the caller holds chain
    /// locks.
    pub fn alloc(&self, kind: NodeKind) -> Result<(Inumber, RwLockWriteGuard<'_, Inode>), FsError> {
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(mut guard) = slot.try_write() else {
                continue;
            };
            if !guard.is_free() {
                continue;
            }
            *guard = Inode::new(kind);
            return Ok((Inumber::new(index as u32), guard));
        }
        Err(FsError::NoInode)
    }

    /// Writes the whole tree to `sink`, one full slash-delimited path per
    /// line, parents before children. The root prints as the empty
    /// string.
    ///
    /// Meant to run under snapshot exclusion: with no mutator in flight
    /// the read locks taken along the way are uncontended, and they stay
    /// compatible with any read-only walk that overlaps the dump.
    pub fn write_tree(&self, sink: &mut impl Write) -> Result<(), FsError> {
        self.write_subtree(sink, Inumber::ROOT, "")
    }

    fn write_subtree(
        &self,
        sink: &mut impl Write,
        ino: Inumber,
        path: &str,
    ) -> Result<(), FsError> {
        if path.len() > MAX_FILE_NAME {
            return Err(FsError::PathTooLong);
        }
        let guard = self.read(ino)?;
        match &*guard {
            Inode::Free => Err(FsError::BadInumber(ino)),
            Inode::File => {
                writeln!(sink, "{path}")?;
                Ok(())
            }
            Inode::Directory(entries) => {
                writeln!(sink, "{path}")?;
                for entry in entries.iter() {
                    let child_path = format!("{path}/{}", entry.name);
                    self.write_subtree(sink, entry.ino, &child_path)?;
                }
                Ok(())
            }
        }
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}
