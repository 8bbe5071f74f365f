//! Buffer access for the inspected bytes.
//!
//! The structure model never reads from disk itself: heaps and records decode their values
//! from a byte slice addressed by absolute [`crate::Position`]. This module supplies that slice,
//! either from an owned `Vec<u8>` or from a memory-mapped file ([`physical::Physical`]),
//! behind the common [`Backend`] trait, plus the [`parser::Parser`] cursor the heap decoders
//! use.
//!
//! # Examples
//!
//! ```rust
//! use heapscope::{file::Buffer, Span};
//!
//! let buffer = Buffer::from_mem(vec![0x00, 0x03, 0x41, 0x42, 0x43])?;
//! assert_eq!(buffer.len(), 5);
//! assert_eq!(buffer.read(Span::new(2, 5))?, b"ABC");
//! # Ok::<(), heapscope::Error>(())
//! ```

pub mod parser;
pub mod physical;

use std::path::Path;

use crate::{
    span::{Position, Span},
    Error, Result,
};
use physical::Physical;

/// Backend for accessing buffer data, either from memory or from a mapped file.
///
/// All implementations must be thread-safe, the structure tree built over a buffer is shared
/// freely between readers. Only [`Backend::data`] is required; reads by [`Span`] are
/// bounds-checked against it.
pub trait Backend: Send + Sync {
    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize {
        self.data().len()
    }

    /// Returns the bytes covered by `span`.
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] if the span exceeds the data.
    fn read(&self, span: Span) -> Result<&[u8]> {
        read_span(self.data(), span)
    }
}

impl Backend for Vec<u8> {
    fn data(&self) -> &[u8] {
        self.as_slice()
    }
}

/// The bytes being inspected, position `0` is the first byte of the backend.
pub struct Buffer {
    backend: Box<dyn Backend>,
}

impl Buffer {
    /// Maps a file from disk
    ///
    /// # Errors
    /// Returns [`Error::FileError`] if the file cannot be opened or mapped and
    /// [`Error::Empty`] if it has no content.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Buffer> {
        Self::with_backend(Box::new(Physical::new(path)?))
    }

    /// Takes ownership of an in-memory buffer
    ///
    /// # Errors
    /// Returns [`Error::Empty`] if `data` is empty
    pub fn from_mem(data: Vec<u8>) -> Result<Buffer> {
        Self::with_backend(Box::new(data))
    }

    /// Wraps a custom backend
    ///
    /// # Errors
    /// Returns [`Error::Empty`] if the backend has no content
    pub fn with_backend(backend: Box<dyn Backend>) -> Result<Buffer> {
        if backend.len() == 0 {
            return Err(Error::Empty);
        }

        Ok(Buffer { backend })
    }

    /// The complete buffer
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.backend.data()
    }

    /// The bytes covered by `span`
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] if the span exceeds the buffer
    pub fn read(&self, span: Span) -> Result<&[u8]> {
        self.backend.read(span)
    }

    /// Size of the buffer in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    /// Always `false`, empty buffers are rejected on construction
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backend.len() == 0
    }

    /// The span covering the whole buffer
    #[must_use]
    pub fn span(&self) -> Span {
        Span::new(0, self.backend.len() as u64)
    }

    /// Returns `true` if `position` addresses a byte of the buffer
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.span().contains(position)
    }
}

/// Returns the bytes of `span` from a slice addressed by absolute position.
///
/// # Errors
/// Returns [`Error::OutOfBounds`] if the span exceeds `buffer`.
pub(crate) fn read_span(buffer: &[u8], span: Span) -> Result<&[u8]> {
    buffer.get(span.to_range()?).ok_or(Error::OutOfBounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_from_mem() {
        let buffer = Buffer::from_mem(vec![1, 2, 3, 4]).unwrap();
        assert_eq!(buffer.len(), 4);
        assert!(!buffer.is_empty());
        assert_eq!(buffer.span(), Span::new(0, 4));
        assert_eq!(buffer.read(Span::new(1, 3)).unwrap(), &[2, 3]);
        assert!(buffer.read(Span::new(3, 5)).is_err());
        assert!(matches!(
            buffer.read(Span::new(u64::MAX - 1, u64::MAX)),
            Err(Error::OutOfBounds)
        ));
        assert!(buffer.contains(Position(3)));
        assert!(!buffer.contains(Position(4)));
    }

    #[test]
    fn vec_backend() {
        let mut data = vec![0xCC_u8; 1048];
        data[10..15].copy_from_slice(&[0xBB; 5]);

        assert_eq!(Backend::len(&data), 1048);
        assert_eq!(data.read(Span::new(10, 15)).unwrap(), &[0xBB; 5]);
        assert_eq!(data.read(Span::new(1048, 1048)).unwrap(), &[] as &[u8]);
        assert!(data.read(Span::new(0, 2048)).is_err());
    }

    #[test]
    fn buffer_empty() {
        assert!(matches!(Buffer::from_mem(vec![]), Err(Error::Empty)));
    }

    #[test]
    fn read_span_bounds() {
        let data = [0u8, 1, 2];
        assert_eq!(read_span(&data, Span::new(1, 3)).unwrap(), &[1, 2]);
        assert_eq!(read_span(&data, Span::new(3, 3)).unwrap(), &[] as &[u8]);
        assert!(read_span(&data, Span::new(2, 4)).is_err());
    }
}
