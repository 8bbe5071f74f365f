// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # heapscope
//!
//! Structural inspection of .NET metadata heaps for hex viewers.
//!
//! `heapscope` describes the bytes of a buffer as a tree of named, byte-addressed structures
//! and answers, for any position, which field the position is in and which sibling fields
//! belong with it. The metadata heaps of a .NET assembly (`#GUID`, `#Strings`, `#US` and
//! `#Blob`) are decoded into such trees out of the box.
//!
//! ## Features
//!
//! - **Composite structure model** - Leaf fields and nested composites over half-open spans
//! - **Metadata heap records** - Validated layouts for every entry of the four heaps
//! - **File tree** - Named buffer regions with nested files and pluggable structure containers
//! - **Provider aggregation** - Prioritized, format-specific hints for grouping, tooltips and
//!   references
//! - **Efficient memory access** - In-memory or memory-mapped buffers
//!
//! ## Quick Start
//!
//! ```rust
//! use heapscope::prelude::*;
//!
//! let bytes = b"\0Hello\0World\0".to_vec();
//! let heap = StringsHeap::parse(&bytes, Span::new(0, 13), &HeapReferences::new())?;
//! let file = HexFile::new("#Strings", Span::new(0, 13)).with_container(Box::new(heap))?;
//! let document = Document::new(Buffer::from_mem(bytes)?, vec![file])?;
//!
//! let service = StructureInfoService::new(vec![ProviderRegistration::with_instance(
//!     "heaps",
//!     0,
//!     std::sync::Arc::new(HeapRecordInfoProvider::new()),
//! )]);
//!
//! let fields = service.get_fields(&document, Position(8));
//! assert_eq!(fields[0], FieldHighlight::new(Span::new(7, 12), FieldKind::CurrentField));
//!
//! let tooltip = service.tooltip(&document, Position(8)).unwrap();
//! assert_eq!(
//!     tooltip.downcast_ref::<String>().unwrap(),
//!     "#Strings[0x7] StringsRecord\nString: \"World\""
//! );
//! # Ok::<(), heapscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`span`] - Positions and half-open spans
//! - [`structure`] - Leaf fields, composites and structures
//! - [`metadata`] - Metadata tokens and the heap records
//! - [`file`] - Buffer backends and the byte parser
//! - [`document`] - Files, nested files and structure containers
//! - [`info`] - Resolution of positions and provider aggregation
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Error Handling
//!
//! Building a structure tree is fallible: a record or heap that violates its layout is
//! rejected with [`Error::Malformed`] and never enters a tree. Querying a finished tree never
//! fails, positions without structure yield `None` or an empty highlight list.

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use heapscope::prelude::*;
///
/// let structure = StructureData::new(
///     "Header",
///     vec![LeafField::new("Magic", Span::new(0, 2), LeafValue::Bytes(vec![0x4D, 0x5A])).into()],
/// )?;
/// assert_eq!(structure.field_count(), 1);
/// # Ok::<(), heapscope::Error>(())
/// ```
pub mod prelude;

/// Absolute positions and half-open byte ranges
pub mod span;

pub mod structure;

/// Metadata tokens and heap records based on ECMA-335
///
/// # Key Components
///
/// - [`metadata::token`] - Metadata tokens used for back-references
/// - [`metadata::streams`] - The `#GUID`, `#Strings`, `#US` and `#Blob` heap records and their
///   decoded heaps
pub mod metadata;

pub mod file;

pub mod document;

pub mod info;

/// `heapscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `heapscope` Error type
///
/// Construction of structure trees fails with this type, queries never do.
pub use error::Error;

/// Byte addressing primitives
pub use span::{Position, Span};

/// The structure model
pub use structure::{
    CompositeData, Field, HexIndexes, LeafField, LeafValue, Structure, StructureData,
};

/// Low-level byte parsing
///
/// # Example
///
/// ```rust
/// use heapscope::Parser;
///
/// let data = [0x81, 0x02];
/// let mut parser = Parser::new(&data);
/// assert_eq!(parser.read_compressed_uint()?, 0x102);
/// # Ok::<(), heapscope::Error>(())
/// ```
pub use file::{parser::Parser, Buffer};

/// Structure resolution entry point
pub use info::StructureInfoService;
