//! Backing File Access
//!
//! Owns the file handle and implements the append/read/commit primitives.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use bytes::Bytes;

use crate::config::SyncStrategy;
use crate::error::{GroveError, Result};

use super::{Address, LENGTH_PREFIX_SIZE, SUPERBLOCK_SIZE};

/// Append-only record store over a single file.
///
/// Construction takes a pre-opened handle, so callers decide how the file is
/// created and opened; [`crate::engine::Engine::open`] does the usual
/// `OpenOptions` dance from its `Config`.
pub struct Storage {
    /// Backing file; this struct is its exclusive owner
    file: File,
    /// When to fsync appended records (the commit barrier always syncs)
    sync_strategy: SyncStrategy,
}

impl Storage {
    /// Wrap an open file, establishing the superblock if absent.
    ///
    /// A file shorter than the superblock is zero-extended to exactly
    /// [`SUPERBLOCK_SIZE`] bytes; the zero root address reads back as an
    /// empty tree. Longer files are taken as-is, so reopening resumes from
    /// the committed root.
    pub fn new(file: File, sync_strategy: SyncStrategy) -> Result<Self> {
        let len = file.metadata()?.len();
        if len < SUPERBLOCK_SIZE {
            // set_len zero-fills the extension, which is exactly the
            // fresh-superblock content (root address 0, reserved zeros)
            file.set_len(SUPERBLOCK_SIZE)?;
        }
        Ok(Self {
            file,
            sync_strategy,
        })
    }

    /// Append a record and return its address.
    ///
    /// Writes an 8-byte big-endian length prefix followed by the payload at
    /// the end of the file. Existing bytes are never overwritten, so the
    /// returned address stays valid for the lifetime of the file.
    pub fn write(&mut self, payload: &[u8]) -> Result<Address> {
        let address = self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(&(payload.len() as u64).to_be_bytes())?;
        self.file.write_all(payload)?;

        if self.sync_strategy == SyncStrategy::EveryWrite {
            self.file.sync_all()?;
        }

        tracing::trace!("Appended {} byte record at address {}", payload.len(), address);
        Ok(address)
    }

    /// Read the record at `address`.
    ///
    /// Reads the length prefix, then exactly that many payload bytes. An
    /// address past the end of the file fails with an I/O error from the
    /// short read; a length field running past the end of the file fails
    /// with a decode error before any allocation.
    pub fn read(&mut self, address: Address) -> Result<Bytes> {
        if address < SUPERBLOCK_SIZE {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("record address {} points inside the superblock", address),
            )
            .into());
        }

        // Fresh length each call: the file only ever grows, and a reopened
        // reader must see records appended since the last look
        let file_len = self.file.metadata()?.len();

        let mut prefix = [0u8; LENGTH_PREFIX_SIZE as usize];
        self.file.seek(SeekFrom::Start(address))?;
        self.file.read_exact(&mut prefix)?;
        let payload_len = u64::from_be_bytes(prefix);

        let end = address
            .checked_add(LENGTH_PREFIX_SIZE)
            .and_then(|n| n.checked_add(payload_len));
        match end {
            Some(end) if end <= file_len => {}
            _ => {
                return Err(GroveError::Decode(format!(
                    "record at address {} claims {} bytes, past end of file ({} bytes)",
                    address, payload_len, file_len
                )))
            }
        }

        let mut payload = vec![0u8; payload_len as usize];
        self.file.read_exact(&mut payload)?;

        tracing::trace!("Read {} byte record at address {}", payload_len, address);
        Ok(Bytes::from(payload))
    }

    /// Read the committed root address from the superblock.
    ///
    /// Returns [`super::NULL_ADDRESS`] for a database that has never
    /// committed.
    pub fn root_address(&mut self) -> Result<Address> {
        let mut buf = [0u8; 8];
        self.file.seek(SeekFrom::Start(0))?;
        self.file.read_exact(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    /// Publish `address` as the committed root. The durability barrier.
    ///
    /// Syncs before the superblock write so every record the root references
    /// is on stable storage first, and syncs after so the new root pointer
    /// is too. A crash on either side leaves the previous committed tree
    /// intact.
    pub fn commit_root_address(&mut self, address: Address) -> Result<()> {
        self.file.sync_all()?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&address.to_be_bytes())?;
        self.file.sync_all()?;

        tracing::debug!("Committed root address {}", address);
        Ok(())
    }
}
