/// Number of slots in the inode table.
pub const INODE_TABLE_SIZE: usize = 50;

/// Maximum number of entries a directory holds.
pub const MAX_DIR_ENTRIES: usize = 20;

/// Maximum length of a full slash-delimited path, in bytes.
pub const MAX_FILE_NAME: usize = 100;

/// Maximum length of a single name component, in bytes.
pub const MAX_NAME_LEN: usize = 100;

/// Upper bound on the number of nodes a single path walk can visit.
///
/// Every component of a bounded path costs at least two bytes (`/x`),
/// plus one node for the root.
pub const MAX_PATH_DEPTH: usize = MAX_FILE_NAME / 2 + 2;
