//! Directory entry arrays.

use arrayvec::ArrayString;

use super::Inumber;
use crate::{
    error::FsError,
    param::{MAX_DIR_ENTRIES, MAX_NAME_LEN},
};

/// A bounded entry name. Never empty, never contains `/`.
pub type Name = ArrayString<MAX_NAME_LEN>;

/// An `(inumber, name)` pair inside a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub ino: Inumber,
    pub name: Name,
}

/// The fixed-capacity entry array of a directory inode.
///
/// Slot order carries no meaning; it only governs iteration. A name is
/// unique within its directory, enforced by the operations layer which
/// checks before adding.
#[derive(Debug, Default)]
pub struct DirEntries {
    entries: [Option<DirEntry>; MAX_DIR_ENTRIES],
}

impl DirEntries {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Live entries, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &DirEntry> {
        self.entries.iter().flatten()
    }

    /// Looks up a live entry by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<Inumber> {
        self.iter()
            .find(|entry| entry.name.as_str() == name)
            .map(|entry| entry.ino)
    }

    /// `true` when every slot is vacant.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }

    /// Adds `(ino, name)` into the first vacant slot.
    ///
    /// Fails when no slot is vacant or the name is empty; either way the
    /// directory cannot take the entry.
    pub fn add(&mut self, ino: Inumber, name: &str) -> Result<(), FsError> {
        if name.is_empty() {
            return Err(FsError::DirFull);
        }
        let name = Name::from(name).map_err(|_| FsError::PathTooLong)?;
        let slot = self
            .entries
            .iter_mut()
            .find(|slot| slot.is_none())
            .ok_or(FsError::DirFull)?;
        *slot = Some(DirEntry { ino, name });
        Ok(())
    }

    /// Vacates the entry referring to `ino`.
    pub fn remove(&mut self, ino: Inumber) -> Result<(), FsError> {
        let slot = self
            .entries
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|entry| entry.ino == ino))
            .ok_or(FsError::NotFound)?;
        *slot = None;
        Ok(())
    }

    /// Vacates the entry with the given name, returning its inumber.
    pub fn remove_named(&mut self, name: &str) -> Result<Inumber, FsError> {
        let slot = self
            .entries
            .iter_mut()
            .find(|slot| {
                slot.as_ref()
                    .is_some_and(|entry| entry.name.as_str() == name)
            })
            .ok_or(FsError::NotFound)?;
        let entry = slot.take().ok_or(FsError::NotFound)?;
        Ok(entry.ino)
    }
}
