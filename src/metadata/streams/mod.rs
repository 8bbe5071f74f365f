//! Metadata heap records for .NET assemblies.
//!
//! Every entry of a metadata heap is exposed as a [`crate::structure::Structure`] whose fields
//! follow the entry's byte layout. Heaps decode their entries eagerly when parsed and are
//! [`crate::document::StructureContainer`]s, so a [`crate::document::HexFile`] can find the
//! record under a position.
//!
//! # Heap Types
//!
//! - **`#GUID`** - [`GuidRecord`]: a single 16-byte identifier leaf, addressed by 1-based index
//! - **`#Strings`** - [`StringsRecord`]: `String` and an optional `Terminator`
//! - **`#US`** - [`UserStringRecord`]: `Length`, `String` and `TerminalByte`
//! - **`#Blob`** - [`BlobRecord`]: `Length` and `Data`
//!
//! # Implementation Notes
//!
//! - Record constructors enforce the contiguity and length invariants of their layout and
//!   fail with [`crate::Error::Malformed`] otherwise
//! - Records keep an `Arc<HeapInfo>` to their heap for heap-wide questions
//! - Back-reference tokens are supplied through [`HeapReferences`], keyed by heap offset
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Section 24.2 - Metadata streams

mod heap;
pub use heap::{HeapInfo, HeapKind, HeapReferences};

/// The '#GUID' heap records
mod guid;
pub use guid::{GuidHeap, GuidRecord, GUID_SIZE};

/// The '#Strings' heap records
mod strings;
pub use strings::{StringsHeap, StringsRecord};

/// The '#US' heap records
mod userstrings;
pub use userstrings::{UserStringRecord, UserStringsHeap};

/// The '#Blob' heap records
mod blob;
pub use blob::{BlobHeap, BlobRecord};
