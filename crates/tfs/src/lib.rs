//! TecnicoFS core: a concurrent in-memory hierarchical filesystem.
//!
//! Four layers:
//!   + Inode table: a fixed array of slots, one reader/writer lock each.
//!   + Path resolver: root-to-leaf walks that collect lock chains.
//!   + Operations: create/delete/lookup/rename/print on top of both.
//!   + Snapshot coordinator: drains mutators so a full-tree dump
//!     observes a single instant.
//!
//! The engine is transport-agnostic; the datagram front-end lives in the
//! server crate and talks to [`TecnicoFs`] exactly like the tests here
//! do.

pub use tfs_proto::NodeKind;

pub use self::{
    error::FsError,
    inode::{DirEntries, DirEntry, Inode, InodeTable, Inumber},
    ops::TecnicoFs,
    path::{LockChain, LockMode},
    snapshot::SnapshotCoordinator,
};

pub mod error;
pub mod inode;
pub mod ops;
pub mod param;
pub mod path;
pub mod snapshot;
