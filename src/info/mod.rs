//! Structure resolution and provider aggregation.
//!
//! Given a [`crate::document::Document`] and a position, [`StructureInfoService`] finds the
//! file and the top-level structure under the position, descends to the leaf field, and asks
//! the registered [`StructureInfoProvider`]s how the structure's fields should be grouped for
//! highlighting. Tooltips and references are answered the same way: the first provider that
//! answers wins.
//!
//! # Key Components
//!
//! - [`StructureInfoService`] - The query entry point
//! - [`StructureInfoProvider`] / [`ProviderRegistration`] - Format specific hints and their
//!   priority
//! - [`FieldHighlight`] / [`FieldKind`] - The highlight stream returned per query
//! - [`ServiceConfig`] - Resolution options
//! - [`HeapRecordInfoProvider`] - Built-in tooltips and references for metadata heap records

mod config;
mod heaps;
mod provider;
mod service;

pub use config::ServiceConfig;
pub use heaps::HeapRecordInfoProvider;
pub use provider::{Payload, ProviderFactory, ProviderRegistration, StructureInfoProvider};
pub use service::{FieldHighlight, FieldKind, ResolvedStructure, StructureInfoService};
