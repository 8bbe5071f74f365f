//! The file tree over an inspected buffer.
//!
//! A [`Document`] owns the [`Buffer`] and the top-level [`HexFile`]s describing it. Each file
//! holds the [`StructureContainer`]s that know its structures (decoded heaps, lists of
//! hand-described headers) and the files nested inside it.
//!
//! # Examples
//!
//! ```rust
//! use heapscope::document::{Document, HexFile};
//! use heapscope::file::Buffer;
//! use heapscope::metadata::streams::{HeapReferences, StringsHeap};
//! use heapscope::{Position, Span};
//!
//! let bytes = b"\0Hello\0World\0".to_vec();
//! let heap = StringsHeap::parse(&bytes, Span::new(0, 13), &HeapReferences::new())?;
//!
//! let file = HexFile::new("#Strings", Span::new(0, 13)).with_container(Box::new(heap))?;
//! let document = Document::new(Buffer::from_mem(bytes)?, vec![file])?;
//!
//! let file = document.file_at(Position(8), false).unwrap();
//! assert_eq!(file.structure_at(Position(8), true).unwrap().name(), "StringsRecord");
//! # Ok::<(), heapscope::Error>(())
//! ```

mod hexfile;

pub use hexfile::{HexFile, StructureContainer, StructureList};

use crate::{file::Buffer, span::Position, Result};

/// An inspected buffer and the files laid over it.
pub struct Document {
    buffer: Buffer,
    files: Vec<HexFile>,
}

impl Document {
    /// Creates a document from a buffer and its top-level files
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a file reaches past the buffer or two files overlap
    pub fn new(buffer: Buffer, mut files: Vec<HexFile>) -> Result<Self> {
        files.sort_by_key(|file| file.span().start());

        for file in &files {
            if !buffer.span().contains_span(&file.span()) {
                return Err(malformed_error!(
                    "File '{}' at {} lies outside the buffer of {} bytes",
                    file.name(),
                    file.span(),
                    buffer.len()
                ));
            }
        }
        for pair in files.windows(2) {
            if pair[0].span().overlaps(&pair[1].span()) {
                return Err(malformed_error!(
                    "File '{}' at {} overlaps '{}' at {}",
                    pair[1].name(),
                    pair[1].span(),
                    pair[0].name(),
                    pair[0].span()
                ));
            }
        }

        Ok(Document { buffer, files })
    }

    /// The inspected bytes
    #[must_use]
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Top-level files, ordered by position
    #[must_use]
    pub fn files(&self) -> &[HexFile] {
        &self.files
    }

    /// The file containing `position`, see [`HexFile::file_at`]
    #[must_use]
    pub fn file_at(&self, position: Position, check_nested: bool) -> Option<&HexFile> {
        let index = self
            .files
            .partition_point(|file| file.span().end() <= position);
        self.files
            .get(index)
            .and_then(|file| file.file_at(position, check_nested))
    }
}
