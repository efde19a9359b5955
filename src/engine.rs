//! Engine Module
//!
//! The facade tying storage and tree together.
//!
//! ## Responsibilities
//! - Open the backing file per the Config and hand it to Storage
//! - Normalize keys and encode values at the boundary
//! - Track the transaction state (pending uncommitted root)
//! - Persist and publish the root on commit
//!
//! ## Transaction Model
//!
//! The engine holds at most one uncommitted tree. `set`/`delete` open a
//! transaction implicitly by snapshotting the committed root; `get` outside
//! a transaction snapshots per call and never opens one; `commit` persists
//! the pending tree and closes the transaction. [`Engine::begin`] exposes
//! the same state as an explicit [`Transaction`] handle whose exclusive
//! borrow makes a second writer context unrepresentable.

use std::fs::OpenOptions;
use std::path::Path;

use bytes::Bytes;

use crate::config::Config;
use crate::error::{GroveError, Result};
use crate::key::IntoKey;
use crate::storage::Storage;
use crate::tree::{ops, NodeRef, ValueRef};
use crate::value::IntoValue;

/// The embedded storage engine
///
/// Owns the storage layer and the current root reference. All methods take
/// `&mut self`: the engine is single-threaded and cooperative, and the
/// borrow checker stands where a lock would otherwise be.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Superblock + append-only record log
    storage: Storage,

    /// Root of the in-flight uncommitted tree; `None` means no transaction
    /// is open and reads snapshot the committed root
    pending: Option<NodeRef>,
}

impl Engine {
    /// Open or create the database described by `config`.
    pub fn open(config: Config) -> Result<Self> {
        // Step 1: Open the backing file per the config
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(config.create_if_missing)
            .open(&config.path)?;

        // Step 2: Wrap it, establishing the superblock if the file is new
        let mut storage = Storage::new(file, config.sync_strategy)?;

        // Step 3: An existing file resumes from its committed root
        let root = storage.root_address()?;
        tracing::info!(
            "Opened database at {}, committed root at address {}",
            config.path.display(),
            root
        );

        Ok(Self {
            config,
            storage,
            pending: None,
        })
    }

    /// Open with defaults at `path` (convenience method)
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(Config::builder().path(path.as_ref()).build())
    }

    /// Look up `key` and return its value payload.
    ///
    /// Inside a transaction this reads the uncommitted tree. Outside, every
    /// call takes a fresh snapshot of the committed root and opens no
    /// transaction of its own, so records appended by a previous engine
    /// instance (or anyone else holding the file) are picked up.
    pub fn get(&mut self, key: impl IntoKey) -> Result<Bytes> {
        let key = key.into_key()?;
        match self.pending.as_mut() {
            Some(root) => ops::lookup(&mut self.storage, root, key),
            None => {
                let mut root = self.committed_root()?;
                ops::lookup(&mut self.storage, &mut root, key)
            }
        }
    }

    /// Insert or replace `key`, opening a transaction if none is open.
    /// Nothing is durable until [`commit`](Engine::commit).
    ///
    /// On an I/O or decode failure the open transaction is aborted:
    /// uncommitted changes are discarded and the next operation starts from
    /// the committed root.
    pub fn set(&mut self, key: impl IntoKey, value: impl IntoValue) -> Result<()> {
        let key = key.into_key()?;
        let value = ValueRef::Fresh(value.into_value());

        let root = self.working_root()?;
        let rebuilt = ops::insert(&mut self.storage, root, key, value)?;
        self.pending = Some(rebuilt);
        Ok(())
    }

    /// Remove `key`, opening a transaction if none is open.
    ///
    /// A missing key fails with [`GroveError::KeyNotFound`] and leaves
    /// everything as it was: an already-open transaction keeps its pending
    /// tree, and a closed engine stays closed. I/O or decode failures abort
    /// the transaction as in [`set`](Engine::set).
    pub fn delete(&mut self, key: impl IntoKey) -> Result<()> {
        let key = key.into_key()?;

        let was_open = self.pending.is_some();
        let mut root = self.working_root()?;

        // Check membership before the consuming rebuild: a miss must leave
        // the tree unchanged, and the check warms the path the rebuild walks
        if !ops::contains(&mut self.storage, &mut root, key)? {
            if was_open {
                self.pending = Some(root);
            }
            return Err(GroveError::KeyNotFound);
        }

        let rebuilt = ops::remove(&mut self.storage, root, key)?;
        self.pending = Some(rebuilt);
        Ok(())
    }

    /// Persist the pending tree and publish its root. Closes the
    /// transaction.
    ///
    /// Appends value and node records for exactly the dirty region, children
    /// before parents, then writes the root address into the superblock
    /// between two fsyncs. With no transaction open this is a no-op, so
    /// committing twice in a row leaves the file untouched.
    pub fn commit(&mut self) -> Result<()> {
        let mut root = match self.pending.take() {
            Some(root) => root,
            None => return Ok(()),
        };

        let address = root.persist(&mut self.storage)?;
        self.storage.commit_root_address(address)?;
        Ok(())
    }

    /// Start an explicit transaction.
    ///
    /// Snapshots the committed root if no transaction is open, or continues
    /// the one that implicit `set`/`delete` calls already opened. The handle
    /// borrows the engine exclusively; dropping it without
    /// [`Transaction::commit`] discards all pending changes.
    pub fn begin(&mut self) -> Result<Transaction<'_>> {
        if self.pending.is_none() {
            let root = self.committed_root()?;
            tracing::debug!("Beginning transaction");
            self.pending = Some(root);
        }
        Ok(Transaction {
            engine: self,
            committed: false,
        })
    }

    /// Number of keys, from the root node's subtree count.
    ///
    /// Counts the pending tree inside a transaction, the committed tree
    /// otherwise.
    pub fn len(&mut self) -> Result<u64> {
        let count = match self.pending.as_mut() {
            Some(root) => ops::subtree_count(&mut self.storage, root)?,
            None => {
                let mut root = self.committed_root()?;
                ops::subtree_count(&mut self.storage, &mut root)?
            }
        };
        Ok(count as u64)
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Snapshot of the committed root, straight from the superblock.
    fn committed_root(&mut self) -> Result<NodeRef> {
        let address = self.storage.root_address()?;
        Ok(NodeRef::from_root_address(address))
    }

    /// Take the root to mutate: the pending root if a transaction is open,
    /// otherwise a fresh snapshot of the committed root (which opens one).
    /// The caller puts the rebuilt root back; until then the transaction
    /// counts as aborted.
    fn working_root(&mut self) -> Result<NodeRef> {
        match self.pending.take() {
            Some(root) => Ok(root),
            None => {
                tracing::debug!("Beginning transaction");
                self.committed_root()
            }
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether a transaction is currently open
    pub fn in_transaction(&self) -> bool {
        self.pending.is_some()
    }
}

// =============================================================================
// Explicit Transactions
// =============================================================================

/// Explicit transaction over an [`Engine`].
///
/// Obtained from [`Engine::begin`]. Reads go through the uncommitted tree;
/// changes become durable only on [`commit`](Transaction::commit), and
/// dropping the handle instead rolls the engine back to its committed root.
pub struct Transaction<'a> {
    engine: &'a mut Engine,
    committed: bool,
}

impl Transaction<'_> {
    /// Look up `key` in the transaction's view of the tree.
    pub fn get(&mut self, key: impl IntoKey) -> Result<Bytes> {
        self.engine.get(key)
    }

    /// Insert or replace `key`.
    pub fn set(&mut self, key: impl IntoKey, value: impl IntoValue) -> Result<()> {
        self.engine.set(key, value)
    }

    /// Remove `key`.
    pub fn delete(&mut self, key: impl IntoKey) -> Result<()> {
        self.engine.delete(key)
    }

    /// Number of keys in the transaction's view.
    pub fn len(&mut self) -> Result<u64> {
        self.engine.len()
    }

    /// Persist and publish the transaction's changes.
    pub fn commit(mut self) -> Result<()> {
        self.committed = true;
        self.engine.commit()
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed && self.engine.pending.take().is_some() {
            tracing::debug!("Transaction dropped without commit, discarding changes");
        }
    }
}
