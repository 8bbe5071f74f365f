//! GUID Heap (`#GUID`) records
//!
//! The `#GUID` heap is a plain array of 128-bit identifiers. Metadata tables address it with a
//! 1-based index, index `0` meaning "no GUID". Each slot is described by a [`GuidRecord`]
//! holding one unnamed leaf, and [`GuidHeap`] decodes all slots of a heap eagerly.
//!
//! # Reference
//! - [ECMA-335 II.24.2.5](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::{any::Any, sync::Arc};

use log::debug;

use crate::{
    document::StructureContainer,
    file::read_span,
    metadata::streams::heap::{record_at, HeapInfo, HeapKind},
    span::{Position, Span},
    structure::{CompositeData, Field, LeafField, LeafValue, Structure},
    Result,
};

/// Size of one `#GUID` slot
pub const GUID_SIZE: u64 = 16;

/// One 16-byte slot of the `#GUID` heap.
///
/// A GUID record is not field-composite: its only field is the identifier itself, so a
/// position anywhere in the slot resolves to the full 16 bytes.
///
/// # Examples
///
/// ```rust
/// use heapscope::metadata::streams::{GuidRecord, HeapInfo, HeapKind};
/// use heapscope::Span;
/// use std::sync::Arc;
///
/// let heap = Arc::new(HeapInfo::new(HeapKind::Guid, Span::new(0, 16)));
/// let record = GuidRecord::new(heap.clone(), &[0xAA; 16], Span::new(0, 16), 1)?;
/// assert_eq!(record.index(), 1);
///
/// assert!(GuidRecord::new(heap, &[0xAA; 16], Span::new(0, 16), 0).is_err());
/// # Ok::<(), heapscope::Error>(())
/// ```
#[derive(Debug)]
pub struct GuidRecord {
    heap: Arc<HeapInfo>,
    index: u32,
    guid: uguid::Guid,
    fields: Vec<Field>,
}

impl GuidRecord {
    /// Creates the record for the slot at `span`
    ///
    /// ## Arguments
    /// * 'heap'    - The owning heap
    /// * 'buffer'  - Bytes addressed by absolute position, must cover `span`
    /// * 'span'    - The 16 bytes of the slot
    /// * 'index'   - 1-based index of the slot
    ///
    /// # Errors
    /// Returns an error if `index` is `0`, `span` is not 16 bytes long or lies outside
    /// `buffer` or `heap`
    pub fn new(heap: Arc<HeapInfo>, buffer: &[u8], span: Span, index: u32) -> Result<Self> {
        if index == 0 {
            return Err(malformed_error!("#GUID index 0 does not address a GUID"));
        }
        if span.len() != GUID_SIZE {
            return Err(malformed_error!(
                "#GUID record {} must be {} bytes, got {}",
                index,
                GUID_SIZE,
                span.len()
            ));
        }

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(read_span(buffer, span)?);
        heap.check_record_span(span)?;
        let guid = uguid::Guid::from_bytes(bytes);

        Ok(GuidRecord {
            heap,
            index,
            guid,
            fields: vec![LeafField::unnamed(span, LeafValue::Guid(guid)).into()],
        })
    }

    /// The owning heap
    #[must_use]
    pub fn heap(&self) -> &HeapInfo {
        &self.heap
    }

    /// The 1-based index of this slot
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The decoded identifier
    #[must_use]
    pub fn guid(&self) -> uguid::Guid {
        self.guid
    }
}

impl CompositeData for GuidRecord {
    fn fields(&self) -> &[Field] {
        &self.fields
    }
}

impl Structure for GuidRecord {
    fn name(&self) -> &str {
        "GuidRecord"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The decoded `#GUID` heap
#[derive(Debug)]
pub struct GuidHeap {
    info: Arc<HeapInfo>,
    records: Vec<GuidRecord>,
}

impl GuidHeap {
    /// Decodes every full slot of the heap at `span`. Trailing bytes that do not form a full
    /// slot are left unstructured.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `span` exceeds `buffer`
    pub fn parse(buffer: &[u8], span: Span) -> Result<GuidHeap> {
        read_span(buffer, span)?;

        let info = Arc::new(HeapInfo::new(HeapKind::Guid, span));
        let count = span.len() / GUID_SIZE;
        let mut records = Vec::with_capacity(usize::try_from(count).unwrap_or_default());

        for slot in 0..count {
            let start = span.start() + slot * GUID_SIZE;
            let index = u32::try_from(slot + 1)
                .map_err(|_| malformed_error!("#GUID heap has too many entries"))?;
            records.push(GuidRecord::new(
                info.clone(),
                buffer,
                Span::from_len(start, GUID_SIZE)?,
                index,
            )?);
        }

        debug!("{}: {} records in {}", HeapKind::Guid, records.len(), span);
        Ok(GuidHeap { info, records })
    }

    /// Heap-wide metadata
    #[must_use]
    pub fn info(&self) -> &HeapInfo {
        &self.info
    }

    /// All records in heap order
    #[must_use]
    pub fn records(&self) -> &[GuidRecord] {
        &self.records
    }

    /// The record for a 1-based `index`
    #[must_use]
    pub fn record(&self, index: u32) -> Option<&GuidRecord> {
        let slot = usize::try_from(index.checked_sub(1)?).ok()?;
        self.records.get(slot)
    }

    /// The record covering `position`
    #[must_use]
    pub fn record_at(&self, position: Position) -> Option<&GuidRecord> {
        record_at(&self.records, position)
    }
}

impl StructureContainer for GuidHeap {
    fn span(&self) -> Span {
        self.info.span()
    }

    fn structure_at(&self, position: Position) -> Option<&dyn Structure> {
        self.record_at(position).map(|record| record as &dyn Structure)
    }
}
