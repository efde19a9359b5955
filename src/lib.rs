//! # GroveKV
//!
//! An embedded key-value store built on a persistent (copy-on-write),
//! unbalanced binary search tree in a single append-only file:
//! - One backing file: 4 KiB superblock + append-only record log
//! - Copy-on-write updates: a change rewrites only the path to it
//! - Structural sharing: unchanged subtrees are reused by address
//! - Single durability barrier: fsync-bracketed superblock update
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Engine                               │
//! │          get / set / delete / commit, Transaction           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Tree Ops                               │
//! │         copy-on-write lookup / insert / remove              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 NodeRef / ValueRef                          │
//! │          lazy resolve + cache, bottom-up persist            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Storage                               │
//! │      superblock + append-only length-prefixed records       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod key;
pub mod value;
pub mod storage;
pub mod tree;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{GroveError, Result};
pub use config::{Config, SyncStrategy};
pub use engine::{Engine, Transaction};
pub use key::IntoKey;
pub use value::IntoValue;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of GroveKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
