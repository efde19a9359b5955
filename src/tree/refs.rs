//! Lazy Tree References
//!
//! `NodeRef` and `ValueRef` are the handles the tree is made of. Each is in
//! one of three states: empty (nodes only), dirty in memory, or stored at a
//! record address with an optionally materialized cache. Following a stored
//! ref reads and decodes its record once and caches the result; persisting a
//! dirty ref appends records for exactly the dirty region, children before
//! parents, and leaves the ref stored.

use bytes::Bytes;

use crate::error::Result;
use crate::storage::{Address, Storage, NULL_ADDRESS};

use super::node::{Node, NodeRecord};

// =============================================================================
// Value References
// =============================================================================

/// Lazy handle to a value payload.
///
/// Cloning is cheap: a stored ref copies its address and a fresh ref bumps
/// the payload's reference count. A clone of a stored ref shares the same
/// record, which is how a node lifted by a two-child delete keeps pointing
/// at the value it already had on disk.
#[derive(Debug, Clone)]
pub enum ValueRef {
    /// In-memory payload, not yet written
    Fresh(Bytes),
    /// Durable payload at `address`, materialized into `cached` on demand
    Stored {
        address: Address,
        cached: Option<Bytes>,
    },
}

impl ValueRef {
    /// Handle to the value record at `address` without reading it.
    pub fn stored(address: Address) -> Self {
        ValueRef::Stored {
            address,
            cached: None,
        }
    }

    /// Materialize the payload, reading and caching it on first use.
    pub fn follow(&mut self, storage: &mut Storage) -> Result<Bytes> {
        match self {
            ValueRef::Fresh(payload) => Ok(payload.clone()),
            ValueRef::Stored {
                cached: Some(payload),
                ..
            } => Ok(payload.clone()),
            ValueRef::Stored { address, cached } => {
                let payload = storage.read(*address)?;
                *cached = Some(payload.clone());
                Ok(payload)
            }
        }
    }

    /// Write the payload if it is not durable yet; returns its address.
    ///
    /// Already-stored values are left alone, so a value carried through any
    /// number of commits is written exactly once and shared by address.
    pub fn persist(&mut self, storage: &mut Storage) -> Result<Address> {
        match self {
            ValueRef::Stored { address, .. } => Ok(*address),
            ValueRef::Fresh(payload) => {
                let address = storage.write(payload)?;
                let cached = Some(payload.clone());
                *self = ValueRef::Stored { address, cached };
                Ok(address)
            }
        }
    }
}

// =============================================================================
// Node References
// =============================================================================

/// Lazy handle to a subtree.
#[derive(Debug, Default)]
pub enum NodeRef {
    /// Empty subtree
    #[default]
    Empty,
    /// In-memory node that the next commit must write
    Dirty(Box<Node>),
    /// Durable node at `address`, materialized into `cached` on demand
    Stored {
        address: Address,
        cached: Option<Box<Node>>,
    },
}

impl NodeRef {
    /// Ref owning a not-yet-persisted node.
    pub fn dirty(node: Node) -> Self {
        NodeRef::Dirty(Box::new(node))
    }

    /// Handle to the node record at `address` without reading it.
    pub fn stored(address: Address) -> Self {
        NodeRef::Stored {
            address,
            cached: None,
        }
    }

    /// Handle to the committed root recorded in a superblock; the null
    /// address means the tree is empty.
    pub fn from_root_address(address: Address) -> Self {
        if address == NULL_ADDRESS {
            NodeRef::Empty
        } else {
            NodeRef::stored(address)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, NodeRef::Empty)
    }

    /// Address of the durable record backing this ref, if it has one.
    pub fn stored_address(&self) -> Option<Address> {
        match self {
            NodeRef::Stored { address, .. } => Some(*address),
            _ => None,
        }
    }

    /// Materialize the node behind this ref, reading and caching its record
    /// on first use. `Empty` resolves to `None`.
    pub fn follow(&mut self, storage: &mut Storage) -> Result<Option<&mut Node>> {
        if let NodeRef::Stored { address, cached } = self {
            if cached.is_none() {
                let node = read_node(storage, *address)?;
                *cached = Some(Box::new(node));
            }
        }
        match self {
            NodeRef::Empty => Ok(None),
            NodeRef::Dirty(node) => Ok(Some(node.as_mut())),
            NodeRef::Stored { cached, .. } => Ok(cached.as_deref_mut()),
        }
    }

    /// Consuming form of [`follow`](NodeRef::follow) for the copy-on-write
    /// rebuild: the caller takes ownership of the materialized node, and the
    /// ref's address (if any) is dropped with it, since a node on the rebuilt
    /// path is getting a new record anyway. `Empty` yields `None`.
    pub fn into_node(self, storage: &mut Storage) -> Result<Option<Node>> {
        match self {
            NodeRef::Empty => Ok(None),
            NodeRef::Dirty(node) => Ok(Some(*node)),
            NodeRef::Stored {
                cached: Some(node), ..
            } => Ok(Some(*node)),
            NodeRef::Stored {
                address,
                cached: None,
            } => Ok(Some(read_node(storage, address)?)),
        }
    }

    /// Persist everything dirty beneath this ref; returns the ref's durable
    /// address ([`NULL_ADDRESS`] for an empty tree).
    ///
    /// Nodes are written children before parents, and each node's value
    /// record before its node record, so every address a record embeds is
    /// already durable when the record is appended. Stored refs return their
    /// address without touching the file, which is what lets unchanged
    /// subtrees travel between commits by address alone.
    ///
    /// On failure the ref is left empty; callers discard it and fall back to
    /// the last committed root.
    pub fn persist(&mut self, storage: &mut Storage) -> Result<Address> {
        match std::mem::take(self) {
            NodeRef::Empty => Ok(NULL_ADDRESS),
            NodeRef::Stored { address, cached } => {
                *self = NodeRef::Stored { address, cached };
                Ok(address)
            }
            NodeRef::Dirty(root) => {
                let (address, node) = persist_tree(storage, *root)?;
                *self = NodeRef::Stored {
                    address,
                    cached: Some(Box::new(node)),
                };
                Ok(address)
            }
        }
    }
}

// =============================================================================
// Bottom-Up Persistence
// =============================================================================

/// Which child slot of the parent the traversal descended into
enum Slot {
    Left,
    Right,
}

/// Detach one still-dirty child, if any, remembering its slot.
fn take_dirty_child(node: &mut Node) -> Option<(Slot, Box<Node>)> {
    match std::mem::take(&mut node.left) {
        NodeRef::Dirty(child) => return Some((Slot::Left, child)),
        keep => node.left = keep,
    }
    match std::mem::take(&mut node.right) {
        NodeRef::Dirty(child) => return Some((Slot::Right, child)),
        keep => node.right = keep,
    }
    None
}

/// Iterative post-order write of a dirty tree, returning the root's address
/// and the root node with every ref beneath it now stored.
///
/// The explicit parent stack stands in for recursion: a sorted insertion
/// order degenerates the tree into a list as deep as the key count, and that
/// depth must not land on the call stack.
fn persist_tree(storage: &mut Storage, root: Node) -> Result<(Address, Node)> {
    let mut path: Vec<(Node, Slot)> = Vec::new();
    let mut current = root;
    let mut written: u64 = 0;

    loop {
        if let Some((slot, child)) = take_dirty_child(&mut current) {
            path.push((current, slot));
            current = *child;
            continue;
        }

        // No dirty children below this node: write it
        let address = write_node(storage, &mut current)?;
        written += 1;

        match path.pop() {
            Some((mut parent, slot)) => {
                let stored = NodeRef::Stored {
                    address,
                    cached: Some(Box::new(current)),
                };
                match slot {
                    Slot::Left => parent.left = stored,
                    Slot::Right => parent.right = stored,
                }
                current = parent;
            }
            None => {
                tracing::debug!("Persisted {} dirty nodes, root at address {}", written, address);
                return Ok((address, current));
            }
        }
    }
}

/// Write one node whose children are all durable: value record first, then
/// the node record embedding the children's and the value's addresses.
fn write_node(storage: &mut Storage, node: &mut Node) -> Result<Address> {
    debug_assert!(
        !matches!(node.left, NodeRef::Dirty(_)) && !matches!(node.right, NodeRef::Dirty(_)),
        "children must be written before their parent"
    );

    let value = node.value.persist(storage)?;
    let record = NodeRecord {
        key: node.key,
        count: node.count,
        left: node.left.stored_address(),
        right: node.right.stored_address(),
        value,
    };
    storage.write(&record.encode())
}

/// Read and decode the node record at `address`.
fn read_node(storage: &mut Storage, address: Address) -> Result<Node> {
    let payload = storage.read(address)?;
    let record = NodeRecord::decode(&payload)?;
    Ok(Node {
        key: record.key,
        count: record.count,
        left: record.left.map_or(NodeRef::Empty, NodeRef::stored),
        right: record.right.map_or(NodeRef::Empty, NodeRef::stored),
        value: ValueRef::stored(record.value),
    })
}
