//! Tree Module
//!
//! Persistent (copy-on-write) unbalanced binary search tree over the
//! append-only storage layer.
//!
//! ## Copy-on-Write Update
//! ```text
//! committed tree               after set(12, v)
//!
//!       [8]@4200                    (8)*
//!       /      \                   /    \
//!  [3]@4130   [10]@4160      [3]@4130   (10)*
//!                                          \
//!                                          (12)*
//!
//! [n]@addr  durable record, reused by address
//! (n)*      dirty in-memory node, appended at the next commit
//! ```
//!
//! A mutation rebuilds only the path from the root to the change; every
//! subtree off that path moves into the new spine as a stored reference and
//! keeps its record address. Commit then appends exactly the dirty region,
//! children before parents, and publishes the new root address in the
//! superblock.

mod node;
mod refs;

pub mod ops;

pub use node::Node;
pub use refs::{NodeRef, ValueRef};
