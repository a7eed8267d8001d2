//! Growable byte buffer used for stream input and output.
//!
//! The buffer keeps bytes in arrival order and supports the three operations
//! the stream engine needs: append at the back, erase a prefix, and view the
//! contents as one contiguous slice.

use bytes::{Buf, BytesMut};
use std::ops::Deref;

/// Ordered, growable byte sequence.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ByteBuffer {
    inner: BytesMut,
}

impl ByteBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: BytesMut::with_capacity(capacity),
        }
    }

    /// Append `data` at the back.
    #[inline]
    pub fn extend_from_slice(&mut self, data: &[u8]) {
        self.inner.extend_from_slice(data);
    }

    /// Erase the first `count` bytes.
    ///
    /// Erasing more than the buffer holds empties it.
    #[inline]
    pub fn erase_prefix(&mut self, count: usize) {
        let count = count.min(self.inner.len());
        self.inner.advance(count);
    }

    /// Contiguous view of the buffered bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.inner
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop the contents but keep the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Drop the contents and the allocation.
    pub fn release(&mut self) {
        self.inner = BytesMut::new();
    }
}

impl Deref for ByteBuffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(data: &[u8]) -> Self {
        Self {
            inner: BytesMut::from(data),
        }
    }
}
