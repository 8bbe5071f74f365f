//! Built-in provider for metadata heap records.

use std::{fmt::Write, sync::Arc};

use crate::{
    document::HexFile,
    info::provider::{Payload, StructureInfoProvider},
    metadata::streams::{BlobRecord, GuidRecord, HeapInfo, StringsRecord, UserStringRecord},
    span::Position,
    structure::{CompositeData, Structure},
};

/// Tooltips and references for [`GuidRecord`], [`StringsRecord`], [`UserStringRecord`] and
/// [`BlobRecord`].
///
/// Tooltips are a `String` naming the heap, the record and the leaf under the position.
/// References are the `Vec<Token>` of rows using a `#Strings` entry, or the owning
/// [`crate::metadata::token::Token`] of a `#Blob` entry. Other structures are declined, and
/// the provider never proposes a grouping.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapRecordInfoProvider;

impl HeapRecordInfoProvider {
    /// Creates the provider
    #[must_use]
    pub fn new() -> Self {
        HeapRecordInfoProvider
    }

    fn heap_of(structure: &dyn Structure) -> Option<(&HeapInfo, String)> {
        let any = structure.as_any();
        if let Some(record) = any.downcast_ref::<GuidRecord>() {
            return Some((record.heap(), format!("[{}]", record.index())));
        }

        let heap = if let Some(record) = any.downcast_ref::<StringsRecord>() {
            record.heap()
        } else if let Some(record) = any.downcast_ref::<UserStringRecord>() {
            record.heap()
        } else if let Some(record) = any.downcast_ref::<BlobRecord>() {
            record.heap()
        } else {
            return None;
        };

        let offset = heap.offset_of(structure.span().start())?;
        Some((heap, format!("[0x{offset:X}]")))
    }
}

impl StructureInfoProvider for HeapRecordInfoProvider {
    fn tooltip(
        &self,
        _file: &HexFile,
        structure: &dyn Structure,
        position: Position,
    ) -> Option<Payload> {
        let (heap, address) = Self::heap_of(structure)?;

        let mut tooltip = format!("{}{} {}", heap.kind(), address, structure.name());
        if let Some(leaf) = structure.leaf_at(position) {
            let _ = write!(
                tooltip,
                "\n{}: {}",
                leaf.name().unwrap_or("Value"),
                leaf.value()
            );
        }

        Some(Arc::new(tooltip))
    }

    fn reference(
        &self,
        _file: &HexFile,
        structure: &dyn Structure,
        _position: Position,
    ) -> Option<Payload> {
        let any = structure.as_any();
        if let Some(record) = any.downcast_ref::<StringsRecord>() {
            if record.tokens().is_empty() {
                return None;
            }
            return Some(Arc::new(record.tokens().to_vec()));
        }
        if let Some(record) = any.downcast_ref::<BlobRecord>() {
            if record.token().is_null() {
                return None;
            }
            return Some(Arc::new(record.token()));
        }

        None
    }
}
