//! Copy-on-Write Tree Algorithms
//!
//! Pure BST operations over [`NodeRef`]s. Nothing here mutates an existing
//! record: insert and remove consume the refs on the search path and rebuild
//! that spine as dirty nodes, moving the untouched sibling refs into the new
//! nodes so unchanged subtrees keep their addresses. Lookups are iterative
//! and touch nothing.

use bytes::Bytes;

use crate::error::{GroveError, Result};
use crate::storage::Storage;

use super::node::Node;
use super::refs::{NodeRef, ValueRef};

/// Find `key` in the subtree under `root` and return its value payload.
///
/// Iterative descent, following stored refs as it goes; the walked path
/// stays cached for later operations on the same ref.
pub fn lookup(storage: &mut Storage, root: &mut NodeRef, key: i64) -> Result<Bytes> {
    let mut current = root;
    loop {
        let node = match current.follow(storage)? {
            Some(node) => node,
            None => return Err(GroveError::KeyNotFound),
        };
        if key < node.key {
            current = &mut node.left;
        } else if key > node.key {
            current = &mut node.right;
        } else {
            return node.value.follow(storage);
        }
    }
}

/// Whether `key` exists under `root`. Same descent as [`lookup`] without
/// touching the value.
pub fn contains(storage: &mut Storage, root: &mut NodeRef, key: i64) -> Result<bool> {
    let mut current = root;
    loop {
        let node = match current.follow(storage)? {
            Some(node) => node,
            None => return Ok(false),
        };
        if key < node.key {
            current = &mut node.left;
        } else if key > node.key {
            current = &mut node.right;
        } else {
            return Ok(true);
        }
    }
}

/// Insert or replace `key` in the tree under `root`, returning the rebuilt
/// (dirty) subtree.
///
/// Recursive on the search path only. A replaced key keeps its node's
/// children and count and takes the new value; a new key becomes a fresh
/// leaf, and each node on the way back up is rebuilt with its count bumped
/// by however much the child's count grew.
pub fn insert(storage: &mut Storage, root: NodeRef, key: i64, value: ValueRef) -> Result<NodeRef> {
    let mut node = match root.into_node(storage)? {
        Some(node) => node,
        None => return Ok(NodeRef::dirty(Node::leaf(key, value))),
    };

    if key < node.key {
        let old = subtree_count(storage, &mut node.left)?;
        let child = std::mem::take(&mut node.left);
        let mut rebuilt = insert(storage, child, key, value)?;
        node.count += subtree_count(storage, &mut rebuilt)? - old;
        node.left = rebuilt;
    } else if key > node.key {
        let old = subtree_count(storage, &mut node.right)?;
        let child = std::mem::take(&mut node.right);
        let mut rebuilt = insert(storage, child, key, value)?;
        node.count += subtree_count(storage, &mut rebuilt)? - old;
        node.right = rebuilt;
    } else {
        node.value = value;
    }

    Ok(NodeRef::dirty(node))
}

/// Remove `key` from the tree under `root`, returning the rebuilt subtree.
///
/// Fails with [`GroveError::KeyNotFound`] when the key is absent. The refs
/// on the search path are consumed either way, so callers that must keep the
/// tree intact on a miss check with [`contains`] first.
pub fn remove(storage: &mut Storage, root: NodeRef, key: i64) -> Result<NodeRef> {
    let mut node = match root.into_node(storage)? {
        Some(node) => node,
        None => return Err(GroveError::KeyNotFound),
    };

    if key < node.key {
        let child = std::mem::take(&mut node.left);
        node.left = remove(storage, child, key)?;
        node.count -= 1;
        return Ok(NodeRef::dirty(node));
    }
    if key > node.key {
        let child = std::mem::take(&mut node.right);
        node.right = remove(storage, child, key)?;
        node.count -= 1;
        return Ok(NodeRef::dirty(node));
    }

    // Found it. With at most one child the replacement is the other child's
    // ref as-is, so an already-durable child keeps its address through the
    // next commit.
    if node.left.is_empty() {
        return Ok(std::mem::take(&mut node.right));
    }
    if node.right.is_empty() {
        return Ok(std::mem::take(&mut node.left));
    }

    // Two children: lift the in-order predecessor out of the left subtree
    // and rebuild this position around it. The original right subtree moves
    // across untouched.
    let (pred_key, pred_value) = find_max(storage, &mut node.left)?;
    let left = std::mem::take(&mut node.left);
    let mut new_left = remove(storage, left, pred_key)?;
    let left_count = subtree_count(storage, &mut new_left)?;
    let right_count = subtree_count(storage, &mut node.right)?;

    Ok(NodeRef::dirty(Node {
        key: pred_key,
        count: left_count + right_count + 1,
        left: new_left,
        right: std::mem::take(&mut node.right),
        value: pred_value,
    }))
}

/// Number of keys under `root`, read from the root node's count field.
/// Follows the ref if it is not materialized yet; an empty subtree is zero.
pub fn subtree_count(storage: &mut Storage, root: &mut NodeRef) -> Result<i64> {
    Ok(match root.follow(storage)? {
        Some(node) => node.count,
        None => 0,
    })
}

/// Key and value ref of the largest key under `root`: iterative descent down
/// the right spine, cloning a value ref once at the terminal node. Only the
/// two-child delete needs it.
fn find_max(storage: &mut Storage, root: &mut NodeRef) -> Result<(i64, ValueRef)> {
    let mut current = root;
    loop {
        let node = match current.follow(storage)? {
            Some(node) => node,
            None => return Err(GroveError::KeyNotFound),
        };
        if node.right.is_empty() {
            return Ok((node.key, node.value.clone()));
        }
        current = &mut node.right;
    }
}
