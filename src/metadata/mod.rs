//! Structural description of .NET metadata heaps.
//!
//! This module describes the entries of the four ECMA-335 metadata heaps as structures of the
//! generic model in [`crate::structure`], so a hex view can answer which record and which
//! field a byte belongs to.
//!
//! # Key Components
//!
//! - [`streams`] - The heap records (`#GUID`, `#Strings`, `#US`, `#Blob`) and their heaps
//! - [`token`] - Metadata table row references used as record back-references
//!
//! # Examples
//!
//! ```rust
//! use heapscope::metadata::streams::{HeapReferences, StringsHeap};
//! use heapscope::{CompositeData, Position, Span};
//!
//! let data = b"\0Hello\0World\0";
//! let heap = StringsHeap::parse(data, Span::new(0, 13), &HeapReferences::new())?;
//!
//! let record = heap.record_at(Position(8)).unwrap();
//! assert_eq!(record.text(), "World");
//! assert_eq!(record.leaf_at(Position(8)).unwrap().name(), Some("String"));
//! # Ok::<(), heapscope::Error>(())
//! ```

/// Implementation of the heap records and heaps
pub mod streams;
/// Commonly used metadata token type
pub mod token;
