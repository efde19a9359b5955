//! Key normalization for GroveKV
//!
//! The tree orders entries by a canonical signed 64-bit key. `IntoKey` is the
//! seam where caller key types are normalized into that form; the engine runs
//! it before touching the tree, so a bad key never starts a mutation.

use crate::error::{GroveError, Result};

/// Conversion of a caller-supplied key into the canonical `i64` tree key.
///
/// The conversion must be injective over the caller's key domain: two
/// distinct keys that normalize to the same `i64` silently merge into one
/// entry. The built-in integer impls are lossless widenings; the string impls
/// accept decimal integers only. Applications with richer key types implement
/// this trait themselves.
pub trait IntoKey {
    fn into_key(self) -> Result<i64>;
}

// =============================================================================
// Integer Keys (lossless widening)
// =============================================================================

impl IntoKey for i64 {
    fn into_key(self) -> Result<i64> {
        Ok(self)
    }
}

impl IntoKey for i32 {
    fn into_key(self) -> Result<i64> {
        Ok(i64::from(self))
    }
}

impl IntoKey for i16 {
    fn into_key(self) -> Result<i64> {
        Ok(i64::from(self))
    }
}

impl IntoKey for i8 {
    fn into_key(self) -> Result<i64> {
        Ok(i64::from(self))
    }
}

impl IntoKey for u8 {
    fn into_key(self) -> Result<i64> {
        Ok(i64::from(self))
    }
}

impl IntoKey for u16 {
    fn into_key(self) -> Result<i64> {
        Ok(i64::from(self))
    }
}

impl IntoKey for u32 {
    fn into_key(self) -> Result<i64> {
        Ok(i64::from(self))
    }
}

// =============================================================================
// String Keys (decimal parse)
// =============================================================================

impl IntoKey for &str {
    fn into_key(self) -> Result<i64> {
        self.parse::<i64>()
            .map_err(|_| GroveError::InvalidKey(format!("not a decimal integer: {:?}", self)))
    }
}

impl IntoKey for String {
    fn into_key(self) -> Result<i64> {
        self.as_str().into_key()
    }
}

// =============================================================================
// Tests
// =============================================================================
