//! Storage Module
//!
//! Append-only, address-addressed byte store backing the tree. One regular
//! file holds everything; records are immutable once written and referenced
//! by the file offset of their length prefix.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Superblock (4096 bytes)                                 │
//! │   RootAddress: u64 BE (8) | Reserved: zero-filled       │
//! │   (RootAddress = 0 before the first commit)             │
//! ├─────────────────────────────────────────────────────────┤
//! │ Record Log (append-only)                                │
//! │   [Length: u64 BE (8)][Payload]                         │
//! │   ... repeated; a record's address is the offset        │
//! │   of its length prefix, so every address is >= 4096 ... │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The storage layer knows nothing about trees or keys; payloads are opaque.
//! The superblock write in [`Storage::commit_root_address`] is the single
//! durability barrier.

mod file;

pub use file::Storage;

// =============================================================================
// Shared Constants
// =============================================================================

/// File offset of a record's length prefix
pub type Address = u64;

/// Address meaning "no record": the superblock root before the first commit,
/// and the persisted form of an empty tree. Never a valid record address.
pub const NULL_ADDRESS: Address = 0;

/// Superblock size; also the address of the first record
pub const SUPERBLOCK_SIZE: u64 = 4096;

/// Size of the big-endian length prefix preceding each record payload
pub const LENGTH_PREFIX_SIZE: u64 = 8;
