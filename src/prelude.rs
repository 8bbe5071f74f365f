//! # heapscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the heapscope library. Import this module to get quick access to the essential
//! types for describing buffers and resolving positions.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all heapscope operations
pub use crate::Error;

/// The result type used throughout heapscope
pub use crate::Result;

/// Byte addressing
pub use crate::span::{Position, Span};

// ================================================================================================
// Structure Model
// ================================================================================================

/// Leaf fields and their decoded values
pub use crate::structure::{Field, LeafField, LeafValue, StringEncoding};

/// Composites and structures
pub use crate::structure::{Composite, CompositeData, Structure, StructureData};

/// Grouping hints over sibling fields
pub use crate::structure::HexIndexes;

// ================================================================================================
// Metadata Heaps
// ================================================================================================

/// Metadata token type for back-references
pub use crate::metadata::token::Token;

/// Heap-wide metadata and back-reference maps
pub use crate::metadata::streams::{HeapInfo, HeapKind, HeapReferences};

/// Heap records
pub use crate::metadata::streams::{BlobRecord, GuidRecord, StringsRecord, UserStringRecord};

/// Decoded heaps
pub use crate::metadata::streams::{BlobHeap, GuidHeap, StringsHeap, UserStringsHeap};

// ================================================================================================
// Buffers and Files
// ================================================================================================

/// Buffer access and the byte parser
pub use crate::file::{parser::Parser, Buffer};

/// The file tree
pub use crate::document::{Document, HexFile, StructureContainer, StructureList};

// ================================================================================================
// Resolution
// ================================================================================================

/// Resolution entry point and its configuration
pub use crate::info::{ServiceConfig, StructureInfoService};

/// Provider capability and registration
pub use crate::info::{Payload, ProviderRegistration, StructureInfoProvider};

/// Query results
pub use crate::info::{FieldHighlight, FieldKind, ResolvedStructure};

/// Built-in heap record provider
pub use crate::info::HeapRecordInfoProvider;
