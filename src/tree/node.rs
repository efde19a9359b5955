//! Tree Node and Record Codec
//!
//! A node record is the durable form of one BST node. Layout (all integers
//! big-endian):
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Tag: 'N' (1) | Version: 1 (1)                            │
//! │ Key: i64 (8) | Count: i64 (8)                            │
//! │ Left:  0x00 empty, or 0x01 + Address: u64 (8)            │
//! │ Right: 0x00 empty, or 0x01 + Address: u64 (8)            │
//! │ ValueAddress: u64 (8)                                    │
//! │ CRC32 over all preceding bytes (4)                       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Value records carry no framing at all: the payload is the caller's bytes
//! verbatim, handed back untouched by `get`.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{GroveError, Result};
use crate::storage::{Address, SUPERBLOCK_SIZE};

use super::refs::{NodeRef, ValueRef};

/// One node of the copy-on-write binary search tree.
///
/// `count` is the number of keys in the subtree rooted here, this node
/// included; every rebuild maintains `count == 1 + count(left) +
/// count(right)`.
#[derive(Debug)]
pub struct Node {
    pub key: i64,
    pub count: i64,
    pub left: NodeRef,
    pub right: NodeRef,
    pub value: ValueRef,
}

impl Node {
    /// Fresh leaf holding `value`, not yet persisted.
    pub fn leaf(key: i64, value: ValueRef) -> Self {
        Self {
            key,
            count: 1,
            left: NodeRef::Empty,
            right: NodeRef::Empty,
            value,
        }
    }
}

// Dropping a node must not recurse through its descendants: a degenerate
// chain is as deep as the key count, and the default drop glue would unwind
// one stack frame per level. Children are detached onto an explicit worklist
// first, so every node is dropped with its subtrees already gone. Leaves
// queue nothing and never allocate.
impl Drop for Node {
    fn drop(&mut self) {
        let mut work: Vec<Box<Node>> = Vec::new();
        queue_subtree(&mut work, std::mem::take(&mut self.left));
        queue_subtree(&mut work, std::mem::take(&mut self.right));
        while let Some(mut node) = work.pop() {
            queue_subtree(&mut work, std::mem::take(&mut node.left));
            queue_subtree(&mut work, std::mem::take(&mut node.right));
        }
    }
}

/// Queue a detached child for iterative teardown.
fn queue_subtree(work: &mut Vec<Box<Node>>, child: NodeRef) {
    match child {
        NodeRef::Dirty(node) => work.push(node),
        NodeRef::Stored {
            cached: Some(node), ..
        } => work.push(node),
        NodeRef::Empty | NodeRef::Stored { cached: None, .. } => {}
    }
}

// =============================================================================
// Record Codec
// =============================================================================

/// Child reference marker: empty subtree, no address follows
const CHILD_EMPTY: u8 = 0x00;

/// Child reference marker: subtree record at the following address
const CHILD_STORED: u8 = 0x01;

/// Durable form of a [`Node`]: the same fields with children and value
/// reduced to their record addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeRecord {
    pub key: i64,
    pub count: i64,
    pub left: Option<Address>,
    pub right: Option<Address>,
    pub value: Address,
}

impl NodeRecord {
    /// Record-type tag, the first payload byte
    pub const TAG: u8 = b'N';

    /// Current node record format version
    pub const VERSION: u8 = 1;

    /// Smallest well-formed record: both children empty
    pub const MIN_SIZE: usize = 1 + 1 + 8 + 8 + 1 + 1 + 8 + 4;

    /// Serialize to the record payload, checksum trailer included.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::MIN_SIZE + 16);
        buf.put_u8(Self::TAG);
        buf.put_u8(Self::VERSION);
        buf.put_i64(self.key);
        buf.put_i64(self.count);
        put_child(&mut buf, self.left);
        put_child(&mut buf, self.right);
        buf.put_u64(self.value);

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&buf);
        let crc = hasher.finalize();
        buf.put_u32(crc);

        buf.freeze()
    }

    /// Deserialize a record payload, validating tag, version, field
    /// plausibility, and the checksum.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < Self::MIN_SIZE {
            return Err(GroveError::Decode(format!(
                "node record truncated: {} bytes, need at least {}",
                payload.len(),
                Self::MIN_SIZE
            )));
        }

        let crc_start = payload.len() - 4;
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&payload[..crc_start]);
        let computed = hasher.finalize();
        let mut trailer = &payload[crc_start..];
        let stored = trailer.get_u32();
        if computed != stored {
            return Err(GroveError::Decode(format!(
                "node record checksum mismatch: stored {:08x}, computed {:08x}",
                stored, computed
            )));
        }

        // MIN_SIZE covers the fixed head below; the variable child refs are
        // re-checked as they are consumed
        let mut buf = &payload[..crc_start];
        let tag = buf.get_u8();
        if tag != Self::TAG {
            return Err(GroveError::Decode(format!("unknown record tag {:#04x}", tag)));
        }
        let version = buf.get_u8();
        if version != Self::VERSION {
            return Err(GroveError::Decode(format!(
                "unsupported node record version {}",
                version
            )));
        }
        let key = buf.get_i64();
        let count = buf.get_i64();
        if count < 1 {
            return Err(GroveError::Decode(format!(
                "implausible subtree count {}",
                count
            )));
        }

        let left = get_child(&mut buf)?;
        let right = get_child(&mut buf)?;

        if buf.remaining() < 8 {
            return Err(GroveError::Decode(
                "node record missing value address".to_string(),
            ));
        }
        let value = buf.get_u64();
        validate_address("value", value)?;

        if buf.has_remaining() {
            return Err(GroveError::Decode(format!(
                "{} unexpected trailing bytes in node record",
                buf.remaining()
            )));
        }

        Ok(Self {
            key,
            count,
            left,
            right,
            value,
        })
    }
}

fn put_child(buf: &mut BytesMut, child: Option<Address>) {
    match child {
        None => buf.put_u8(CHILD_EMPTY),
        Some(address) => {
            buf.put_u8(CHILD_STORED);
            buf.put_u64(address);
        }
    }
}

fn get_child(buf: &mut &[u8]) -> Result<Option<Address>> {
    if !buf.has_remaining() {
        return Err(GroveError::Decode(
            "node record truncated in child reference".to_string(),
        ));
    }
    match buf.get_u8() {
        CHILD_EMPTY => Ok(None),
        CHILD_STORED => {
            if buf.remaining() < 8 {
                return Err(GroveError::Decode(
                    "node record truncated in child address".to_string(),
                ));
            }
            let address = buf.get_u64();
            validate_address("child", address)?;
            Ok(Some(address))
        }
        other => Err(GroveError::Decode(format!(
            "invalid child reference marker {:#04x}",
            other
        ))),
    }
}

fn validate_address(what: &str, address: Address) -> Result<()> {
    if address < SUPERBLOCK_SIZE {
        return Err(GroveError::Decode(format!(
            "{} address {} points inside the superblock",
            what, address
        )));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> NodeRecord {
        NodeRecord {
            key: -42,
            count: 3,
            left: Some(4096),
            right: Some(5120),
            value: 4200,
        }
    }

    #[test]
    fn roundtrip_full_node() {
        let record = sample_record();
        let payload = record.encode();
        assert_eq!(NodeRecord::decode(&payload).unwrap(), record);
    }

    #[test]
    fn roundtrip_leaf() {
        let record = NodeRecord {
            key: 7,
            count: 1,
            left: None,
            right: None,
            value: 4096,
        };
        let payload = record.encode();
        assert_eq!(payload.len(), NodeRecord::MIN_SIZE);
        assert_eq!(NodeRecord::decode(&payload).unwrap(), record);
    }

    #[test]
    fn checksum_detects_corruption() {
        let payload = sample_record().encode();
        let mut corrupted = payload.to_vec();
        corrupted[10] ^= 0xFF;
        let err = NodeRecord::decode(&corrupted).unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn rejects_unknown_tag() {
        let mut raw = sample_record().encode().to_vec();
        raw[0] = b'X';
        // Re-seal so only the tag is wrong
        let crc_start = raw.len() - 4;
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&raw[..crc_start]);
        let crc = hasher.finalize();
        raw[crc_start..].copy_from_slice(&crc.to_be_bytes());

        let err = NodeRecord::decode(&raw).unwrap_err();
        assert!(err.to_string().contains("tag"));
    }

    #[test]
    fn rejects_future_version() {
        let mut raw = sample_record().encode().to_vec();
        raw[1] = NodeRecord::VERSION + 1;
        let crc_start = raw.len() - 4;
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&raw[..crc_start]);
        let crc = hasher.finalize();
        raw[crc_start..].copy_from_slice(&crc.to_be_bytes());

        let err = NodeRecord::decode(&raw).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn rejects_truncated_payload() {
        let payload = sample_record().encode();
        let err = NodeRecord::decode(&payload[..NodeRecord::MIN_SIZE - 1]).unwrap_err();
        assert!(matches!(err, GroveError::Decode(_)));
    }

    #[test]
    fn rejects_zero_count() {
        let record = NodeRecord {
            count: 0,
            ..sample_record()
        };
        let err = NodeRecord::decode(&record.encode()).unwrap_err();
        assert!(err.to_string().contains("count"));
    }

    #[test]
    fn rejects_address_inside_superblock() {
        let record = NodeRecord {
            left: Some(512),
            ..sample_record()
        };
        let err = NodeRecord::decode(&record.encode()).unwrap_err();
        assert!(err.to_string().contains("superblock"));
    }
}
