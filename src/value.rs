//! Value encoding for GroveKV
//!
//! Values are opaque byte payloads. `IntoValue` converts caller types into
//! the `Bytes` the store appends verbatim; `get` hands the same bytes back,
//! and decoding them is the caller's business.

use bytes::Bytes;

/// Conversion of a caller-supplied value into its stored byte payload.
pub trait IntoValue {
    fn into_value(self) -> Bytes;
}

impl IntoValue for Bytes {
    fn into_value(self) -> Bytes {
        self
    }
}

impl IntoValue for Vec<u8> {
    fn into_value(self) -> Bytes {
        Bytes::from(self)
    }
}

impl IntoValue for &[u8] {
    fn into_value(self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Bytes {
        Bytes::from(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payloads_pass_through_unchanged() {
        assert_eq!("abc".into_value(), Bytes::from_static(b"abc"));
        assert_eq!(vec![0u8, 255, 7].into_value(), Bytes::from_static(&[0, 255, 7]));
        assert_eq!((&b"xy"[..]).into_value(), Bytes::from_static(b"xy"));
    }
}
