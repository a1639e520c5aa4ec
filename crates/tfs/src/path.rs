//! Path walking over the inode table.
//!
//! A walk starts at the root and lock-couples its way down: the next
//! node's lock is acquired before anything is released, so no step of
//! the path can be deleted out from under the walker. The accumulated
//! locks come back as a [`LockChain`]; dropping the chain releases every
//! one of them, which makes it impossible for an early return to leak a
//! lock.

use arrayvec::ArrayVec;
use memchr::memrchr;
use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::{
    error::FsError,
    inode::{Inode, InodeTable, Inumber},
    param::{MAX_FILE_NAME, MAX_PATH_DEPTH},
};

/// Lock mode a walk applies to the final node of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Read,
    Write,
}

enum SlotGuard<'t> {
    Read(RwLockReadGuard<'t, Inode>),
    Write(RwLockWriteGuard<'t, Inode>),
}

impl SlotGuard<'_> {
    fn inode(&self) -> &Inode {
        match self {
            Self::Read(guard) => guard,
            Self::Write(guard) => guard,
        }
    }
}

struct Link<'t> {
    ino: Inumber,
    guard: SlotGuard<'t>,
}

/// The ordered list of locks a walk acquired, root first.
///
/// Interior nodes are read-locked; the terminal node holds whatever mode
/// the walk was asked for. The chain releases everything when dropped.
pub struct LockChain<'t> {
    links: ArrayVec<Link<'t>, MAX_PATH_DEPTH>,
}

impl<'t> LockChain<'t> {
    fn new() -> Self {
        Self {
            links: ArrayVec::new(),
        }
    }

    fn acquire(
        &mut self,
        table: &'t InodeTable,
        ino: Inumber,
        mode: LockMode,
    ) -> Result<(), FsError> {
        let guard = match mode {
            LockMode::Read => SlotGuard::Read(table.read(ino)?),
            LockMode::Write => SlotGuard::Write(table.write(ino)?),
        };
        // capacity is MAX_PATH_DEPTH, more than any bounded path can visit
        self.links.push(Link { ino, guard });
        Ok(())
    }

    /// Number of locks held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// `true` when the chain holds a lock on `ino`.
    #[must_use]
    pub fn contains(&self, ino: Inumber) -> bool {
        self.links.iter().any(|link| link.ino == ino)
    }

    /// The inode view a held lock gives, if `ino` is in the chain.
    #[must_use]
    pub fn inode(&self, ino: Inumber) -> Option<&Inode> {
        self.links
            .iter()
            .find(|link| link.ino == ino)
            .map(|link| link.guard.inode())
    }

    /// The deepest held node.
    #[must_use]
    pub fn terminal(&self) -> Option<(Inumber, &Inode)> {
        self.links
            .last()
            .map(|link| (link.ino, link.guard.inode()))
    }

    /// Mutable access to the deepest held node; `None` unless the walk
    /// took it in write mode.
    pub fn terminal_mut(&mut self) -> Option<(Inumber, &mut Inode)> {
        let link = self.links.last_mut()?;
        match &mut link.guard {
            SlotGuard::Write(guard) => Some((link.ino, &mut **guard)),
            SlotGuard::Read(_) => None,
        }
    }
}

/// Outcome of a walk: the terminal inumber when every component
/// resolved (`None` when the walk broke early), plus the locks that are
/// still held. Even a broken walk hands its partial chain back; the
/// caller releases it by drop.
pub struct Resolved<'t> {
    pub ino: Option<Inumber>,
    pub chain: LockChain<'t>,
}

/// Like [`Resolved`], for a walk that may ride on another chain: `chain`
/// holds only the freshly taken locks, while `trace` lists every inumber
/// on the walk, shared and fresh alike, root first.
pub struct Extended<'t> {
    pub ino: Option<Inumber>,
    pub chain: LockChain<'t>,
    pub trace: ArrayVec<Inumber, MAX_PATH_DEPTH>,
}

fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|component| !component.is_empty())
}

/// Splits a path into its parent directory path and final name.
///
/// A trailing slash is dropped first; a path whose only slash is the
/// leading one has the root (empty path) as parent.
///
/// `"/a/b"` becomes `("/a", "b")`, `"/a"` becomes `("", "a")`, `"/"`
/// becomes `("", "")`.
#[must_use]
pub fn split_parent_child(path: &str) -> (&str, &str) {
    let path = path.strip_suffix('/').unwrap_or(path);
    match memrchr(b'/', path.as_bytes()) {
        Some(pos) => (&path[..pos], &path[pos + 1..]),
        None => ("", path),
    }
}

/// Walks `path` from the root, read-locking interior directories and
/// taking `terminal_mode` on the last node. The empty path locks the
/// root itself in the terminal mode.
pub fn resolve<'t>(
    table: &'t InodeTable,
    path: &str,
    terminal_mode: LockMode,
) -> Result<Resolved<'t>, FsError> {
    if path.len() > MAX_FILE_NAME {
        return Err(FsError::PathTooLong);
    }

    let mut chain = LockChain::new();
    let mut components = components(path).peekable();

    let root_mode = if components.peek().is_none() {
        terminal_mode
    } else {
        LockMode::Read
    };
    chain.acquire(table, Inumber::ROOT, root_mode)?;

    let mut current = Inumber::ROOT;
    while let Some(name) = components.next() {
        let next = match chain.terminal() {
            Some((_, inode)) => inode.as_dir().and_then(|dir| dir.find(name)),
            None => return Err(FsError::BadInumber(current)),
        };
        let Some(next) = next else {
            // broke before the last component; the partial chain is the
            // caller's to release
            return Ok(Resolved { ino: None, chain });
        };
        let mode = if components.peek().is_none() {
            terminal_mode
        } else {
            LockMode::Read
        };
        chain.acquire(table, next, mode)?;
        current = next;
    }

    Ok(Resolved {
        ino: Some(current),
        chain,
    })
}

/// Walks `path` as [`resolve`] does, but traverses any node `base`
/// already holds through `base`'s guard instead of locking it again (a
/// thread must never re-acquire a lock it holds).
///
/// The two walks of a rename share exactly a prefix, and when one
/// terminal lies on the other walk's path the shorter path sorts first,
/// so the caller resolves it first and extends here; the terminal of the
/// extension is then always freshly locked.
pub fn resolve_extend<'t>(
    table: &'t InodeTable,
    path: &str,
    terminal_mode: LockMode,
    base: &LockChain<'t>,
) -> Result<Extended<'t>, FsError> {
    if path.len() > MAX_FILE_NAME {
        return Err(FsError::PathTooLong);
    }

    let mut chain = LockChain::new();
    let mut trace = ArrayVec::new();
    let mut components = components(path).peekable();

    let mut current = Inumber::ROOT;
    if base.contains(current) {
        trace.push(current);
    } else {
        let root_mode = if components.peek().is_none() {
            terminal_mode
        } else {
            LockMode::Read
        };
        chain.acquire(table, current, root_mode)?;
        trace.push(current);
    }

    while let Some(name) = components.next() {
        let next = {
            let inode = match chain.terminal() {
                Some((ino, inode)) if ino == current => Some(inode),
                _ => base.inode(current),
            };
            match inode {
                Some(inode) => inode.as_dir().and_then(|dir| dir.find(name)),
                None => return Err(FsError::BadInumber(current)),
            }
        };
        let Some(next) = next else {
            return Ok(Extended {
                ino: None,
                chain,
                trace,
            });
        };
        let last = components.peek().is_none();
        if base.contains(next) {
            debug_assert!(!last, "extension terminal must not be held by the base chain");
            trace.push(next);
        } else {
            let mode = if last { terminal_mode } else { LockMode::Read };
            chain.acquire(table, next, mode)?;
            trace.push(next);
        }
        current = next;
    }

    Ok(Extended {
        ino: Some(current),
        chain,
        trace,
    })
}

#[cfg(test)]
mod tests {
    use tfs_proto::NodeKind;

    use super::*;
    use crate::ops::TecnicoFs;

    #[test]
    fn test_split_parent_child() {
        assert_eq!(split_parent_child("/a/b"), ("/a", "b"));
        assert_eq!(split_parent_child("/a/b/"), ("/a", "b"));
        assert_eq!(split_parent_child("/a"), ("", "a"));
        assert_eq!(split_parent_child("a"), ("", "a"));
        assert_eq!(split_parent_child("/"), ("", ""));
        assert_eq!(split_parent_child(""), ("", ""));
    }

    #[test]
    fn test_components_skip_extra_slashes() {
        let tokens: Vec<_> = components("//a///bb/c/").collect();
        assert_eq!(tokens, ["a", "bb", "c"]);
        assert_eq!(components("").count(), 0);
        assert_eq!(components("///").count(), 0);
    }

    #[test]
    fn test_resolve_walks_to_terminal() {
        let fs = TecnicoFs::new();
        fs.create("/a", NodeKind::Directory).unwrap();
        fs.create("/a/x", NodeKind::File).unwrap();

        let resolved = resolve(&fs.table, "/a/x", LockMode::Read).unwrap();
        assert!(resolved.ino.is_some());
        assert_eq!(resolved.chain.len(), 3); // root, a, x
    }

    #[test]
    fn test_resolve_empty_path_is_root() {
        let fs = TecnicoFs::new();
        let resolved = resolve(&fs.table, "", LockMode::Write).unwrap();
        assert_eq!(resolved.ino, Some(Inumber::ROOT));
        assert_eq!(resolved.chain.len(), 1);
        assert!({
            let mut chain = resolved.chain;
            chain.terminal_mut().is_some()
        });
    }

    #[test]
    fn test_resolve_missing_component_keeps_partial_chain() {
        let fs = TecnicoFs::new();
        fs.create("/a", NodeKind::Directory).unwrap();

        let resolved = resolve(&fs.table, "/a/nope/deeper", LockMode::Write).unwrap();
        assert_eq!(resolved.ino, None);
        assert_eq!(resolved.chain.len(), 2); // root, a
    }

    #[test]
    fn test_resolve_through_file_fails() {
        let fs = TecnicoFs::new();
        fs.create("/f", NodeKind::File).unwrap();

        let resolved = resolve(&fs.table, "/f/x", LockMode::Read).unwrap();
        assert_eq!(resolved.ino, None);
    }

    #[test]
    fn test_chain_drop_releases_locks() {
        let fs = TecnicoFs::new();
        fs.create("/a", NodeKind::Directory).unwrap();

        let resolved = resolve(&fs.table, "/a", LockMode::Write).unwrap();
        let ino = resolved.ino.unwrap();
        drop(resolved);

        // both locks must be free again
        assert!(fs.table.write(Inumber::ROOT).is_ok());
        assert!(fs.table.write(ino).is_ok());
    }

    #[test]
    fn test_resolve_rejects_overlong_path() {
        let fs = TecnicoFs::new();
        let long = format!("/{}", "x".repeat(MAX_FILE_NAME + 1));
        assert!(matches!(
            resolve(&fs.table, &long, LockMode::Read),
            Err(FsError::PathTooLong)
        ));
    }

    #[test]
    fn test_resolve_extend_reuses_held_prefix() {
        let fs = TecnicoFs::new();
        fs.create("/a", NodeKind::Directory).unwrap();
        fs.create("/b", NodeKind::Directory).unwrap();
        fs.create("/a/c", NodeKind::Directory).unwrap();

        let first = resolve(&fs.table, "/a", LockMode::Write).unwrap();
        let second = resolve_extend(&fs.table, "/b", LockMode::Write, &first.chain).unwrap();
        assert!(second.ino.is_some());
        assert_eq!(second.chain.len(), 1); // only /b is fresh; the root is ridden
        assert_eq!(second.trace.len(), 2); // root, b

        // extending below the write-held terminal must not re-lock it
        let third = resolve_extend(&fs.table, "/a/c", LockMode::Write, &first.chain).unwrap();
        assert!(third.ino.is_some());
        assert_eq!(third.chain.len(), 1); // only /a/c is fresh
        assert_eq!(third.trace.len(), 3); // root, a, c
    }
}
