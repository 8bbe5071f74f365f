//! Blob Heap (`#Blob`) records
//!
//! Provides the structural description of the ECMA-335 `#Blob` heap, which stores binary data
//! such as signatures and custom attributes. Each entry is prefixed with its size:
//!
//! * If the first one byte of the 'blob' is 0bbbbbbb, then the rest of the 'blob' contains the
//!   bbbbbbb bytes of actual data.
//! * If the first two bytes of the 'blob' are 10bbbbbb and x, then the rest of the 'blob'
//!   contains the (bbbbbb << 8 + x) bytes of actual data.
//! * If the first four bytes of the 'blob' are 110bbbbb, x, y, and z, then the rest of the
//!   'blob' contains the (bbbbb << 24 + x << 16 + y << 8 + z) bytes of actual data.
//!
//! # Reference
//! - [ECMA-335 II.24.2.4](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::{any::Any, sync::Arc};

use log::{debug, warn};

use crate::{
    document::StructureContainer,
    file::{parser::Parser, read_span},
    metadata::{
        streams::heap::{record_at, HeapInfo, HeapKind, HeapReferences},
        token::Token,
    },
    span::{Position, Span},
    structure::{CompositeData, Field, LeafField, LeafValue, Structure},
    Error, Result,
};

/// One length prefixed entry of the `#Blob` heap, fields `[Length, Data]`.
///
/// # Examples
///
/// ```rust
/// use heapscope::metadata::{streams::{BlobRecord, HeapInfo, HeapKind}, token::Token};
/// use heapscope::Span;
/// use std::sync::Arc;
///
/// let data = [0x00, 0x03, 0x41, 0x42, 0x43];
/// let heap = Arc::new(HeapInfo::new(HeapKind::Blob, Span::new(0, 5)));
///
/// let record = BlobRecord::new(heap, &data, Span::new(1, 5), Span::new(1, 2), Token::NULL)?;
/// assert_eq!(record.length(), 3);
/// assert_eq!(record.data_span(), Span::new(2, 5));
/// # Ok::<(), heapscope::Error>(())
/// ```
#[derive(Debug)]
pub struct BlobRecord {
    heap: Arc<HeapInfo>,
    token: Token,
    length: u32,
    fields: Vec<Field>,
}

impl BlobRecord {
    /// Creates the record covering `span`, whose length prefix is `length_span`
    ///
    /// ## Arguments
    /// * 'heap'        - The owning heap
    /// * 'buffer'      - Bytes addressed by absolute position
    /// * 'span'        - The whole entry, length prefix included
    /// * 'length_span' - The compressed length at the start of `span`
    /// * 'token'       - The row owning this blob, [`Token::NULL`] if it is only referenced
    ///   from within another blob
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if `length_span` does not start at `span`'s start, is not
    /// 1 to 4 bytes long, reaches past `span`, or does not hold exactly one compressed
    /// integer, if the decoded length differs from the data after it, or if `span` lies
    /// outside `heap`. Returns [`Error::OutOfBounds`] if `span` lies outside `buffer`.
    pub fn new(
        heap: Arc<HeapInfo>,
        buffer: &[u8],
        span: Span,
        length_span: Span,
        token: Token,
    ) -> Result<Self> {
        if length_span.start() != span.start() {
            return Err(malformed_error!(
                "#Blob length {} does not start the entry {}",
                length_span,
                span
            ));
        }
        if !(1..=4).contains(&length_span.len()) || length_span.end() > span.end() {
            return Err(malformed_error!(
                "#Blob length {} is invalid for the entry {}",
                length_span,
                span
            ));
        }

        let length_data = read_span(buffer, length_span)?;
        let mut parser = Parser::new(length_data);
        let length = parser.read_compressed_uint()?;
        if parser.pos() != length_data.len() {
            return Err(malformed_error!(
                "#Blob length {} is encoded in {} bytes but spans {}",
                length,
                parser.pos(),
                length_span
            ));
        }

        let data_span = Span::from_bounds(length_span.end(), span.end())?;
        if data_span.len() != u64::from(length) {
            return Err(malformed_error!(
                "#Blob length {} at {} does not match its data {}",
                length,
                span.start(),
                data_span
            ));
        }

        let data = read_span(buffer, data_span)?.to_vec();
        heap.check_record_span(span)?;

        Ok(BlobRecord {
            heap,
            token,
            length,
            fields: vec![
                LeafField::new("Length", length_span, LeafValue::CompressedUInt(length)).into(),
                LeafField::new("Data", data_span, LeafValue::Bytes(data)).into(),
            ],
        })
    }

    /// The owning heap
    #[must_use]
    pub fn heap(&self) -> &HeapInfo {
        &self.heap
    }

    /// The row owning this blob, null if there is no explicit owner
    #[must_use]
    pub fn token(&self) -> Token {
        self.token
    }

    /// The decoded length prefix
    #[must_use]
    pub fn length(&self) -> u32 {
        self.length
    }

    /// The blob content
    #[must_use]
    pub fn data(&self) -> &[u8] {
        match self.fields[1].as_leaf().map(LeafField::value) {
            Some(LeafValue::Bytes(data)) => data,
            _ => &[],
        }
    }

    /// The compressed length prefix
    #[must_use]
    pub fn length_span(&self) -> Span {
        self.fields[0].span()
    }

    /// The blob content
    #[must_use]
    pub fn data_span(&self) -> Span {
        self.fields[1].span()
    }
}

impl CompositeData for BlobRecord {
    fn fields(&self) -> &[Field] {
        &self.fields
    }
}

impl Structure for BlobRecord {
    fn name(&self) -> &str {
        "BlobRecord"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The decoded `#Blob` heap
#[derive(Debug)]
pub struct BlobHeap {
    info: Arc<HeapInfo>,
    records: Vec<BlobRecord>,
}

impl BlobHeap {
    /// Decodes the entries of the heap at `span`, starting at offset 0.
    ///
    /// Decoding stops at the first entry whose length prefix is malformed or that would
    /// extend past the heap; the bytes from there on are left unstructured. Owner tokens are
    /// the first token `references` holds for an entry's offset.
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] if `span` exceeds `buffer`
    pub fn parse(buffer: &[u8], span: Span, references: &HeapReferences) -> Result<BlobHeap> {
        let data = read_span(buffer, span)?;
        let info = Arc::new(HeapInfo::new(HeapKind::Blob, span));
        let mut records = Vec::new();
        let mut parser = Parser::new(data);

        while parser.has_more_data() {
            let offset = parser.pos();
            let length = match parser.read_compressed_uint() {
                Ok(length) => length as usize,
                Err(error) => {
                    warn!("{}: stopping at offset 0x{:X} - {}", HeapKind::Blob, offset, error);
                    break;
                }
            };
            let prefix = parser.pos() - offset;

            if parser.advance_by(length).is_err() {
                warn!(
                    "{}: entry at offset 0x{:X} with length {} exceeds the heap",
                    HeapKind::Blob,
                    offset,
                    length
                );
                break;
            }

            let start = span.start() + offset as u64;
            let heap_offset = u32::try_from(offset).map_err(|_| Error::OutOfBounds)?;
            records.push(BlobRecord::new(
                info.clone(),
                buffer,
                Span::from_len(start, (parser.pos() - offset) as u64)?,
                Span::from_len(start, prefix as u64)?,
                references.owner(heap_offset),
            )?);
        }

        debug!("{}: {} records in {}", HeapKind::Blob, records.len(), span);
        Ok(BlobHeap { info, records })
    }

    /// Heap-wide metadata
    #[must_use]
    pub fn info(&self) -> &HeapInfo {
        &self.info
    }

    /// All records in heap order
    #[must_use]
    pub fn records(&self) -> &[BlobRecord] {
        &self.records
    }

    /// The record starting at heap `offset`, as referenced by metadata tables
    #[must_use]
    pub fn record(&self, offset: u32) -> Option<&BlobRecord> {
        let position = self.info.span().start() + u64::from(offset);
        self.record_at(position)
            .filter(|record| record.span().start() == position)
    }

    /// The record covering `position`
    #[must_use]
    pub fn record_at(&self, position: Position) -> Option<&BlobRecord> {
        record_at(&self.records, position)
    }
}

impl StructureContainer for BlobHeap {
    fn span(&self) -> Span {
        self.info.span()
    }

    fn structure_at(&self, position: Position) -> Option<&dyn Structure> {
        self.record_at(position).map(|record| record as &dyn Structure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heap_info(span: Span) -> Arc<HeapInfo> {
        Arc::new(HeapInfo::new(HeapKind::Blob, span))
    }

    fn blob(data: &[u8], heap: Span, span: Span, length_span: Span) -> Result<BlobRecord> {
        BlobRecord::new(heap_info(heap), data, span, length_span, Token::NULL)
    }

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data = {
            let mut data = vec![0xCC; 300];
            /* i - 0    - should always be 0    */ data[0]          = 0b_00000000_u8;

            /* i - 1    - len 10                */ data[1]          = 0b_00001010_u8;
            /* i - 1    - len 10                */ data[2..12]      .copy_from_slice(&[0x0A; 10]);

            /* i - 12   - len 5                 */ data[12]         = 0b_00000101_u8;
            /* i - 12   - len 5                 */ data[13..18]     .copy_from_slice(&[0xAB; 5]);

            /* i - 18   - len 257               */ data[18]         = 0b_10000001_u8;
            /* i - 18   - len 257               */ data[19]         = 0b_00000001_u8;
            /* i - 18   - len 257               */ data[20..277]    .copy_from_slice(&[0xBA; 257]);

            /* i - 277  - invalid prefix        */ data[277]        = 0b_11111111_u8;

            data
        };

        let mut references = HeapReferences::new();
        references.add(12, Token(0x0C00_0001));
        references.add(12, Token(0x0C00_0002));

        let heap = BlobHeap::parse(&data, Span::new(0, 300), &references).unwrap();
        assert_eq!(heap.records().len(), 4);

        let empty = heap.record(0).unwrap();
        assert_eq!(empty.length(), 0);
        assert_eq!(empty.data_span(), Span::new(1, 1));

        let ten = heap.record(1).unwrap();
        assert_eq!(ten.data(), &[0x0A; 10]);
        assert!(ten.token().is_null());

        let five = heap.record(12).unwrap();
        assert_eq!(five.data(), &[0xAB; 5]);
        assert_eq!(five.token(), Token(0x0C00_0001));

        let large = heap.record(18).unwrap();
        assert_eq!(large.length(), 257);
        assert_eq!(large.length_span(), Span::new(18, 20));
        assert_eq!(large.data_span(), Span::new(20, 277));

        // everything after the invalid prefix is unstructured
        assert!(heap.record_at(Position(277)).is_none());
        assert!(heap.record_at(Position(290)).is_none());
    }

    #[test]
    fn length_must_start_entry() {
        let data = [0x00, 0x03, 0x41, 0x42, 0x43];
        let heap = Span::new(0, 5);
        assert!(matches!(
            blob(&data, heap, Span::new(1, 5), Span::new(2, 3)),
            Err(Error::Malformed { .. })
        ));
        assert!(blob(&data, heap, Span::new(1, 5), Span::new(1, 2)).is_ok());
    }

    #[test]
    fn length_inside_entry() {
        let data = [0x00, 0x81, 0x02];
        let heap = Span::new(0, 3);
        assert!(blob(&data, heap, Span::new(1, 2), Span::new(1, 3)).is_err());
        assert!(blob(&data, heap, Span::new(1, 1), Span::new(1, 1)).is_err());
    }

    #[test]
    fn length_must_match_data() {
        let mut data = vec![0x02];
        data.extend(1..10);

        let heap = Span::new(0, 10);
        assert!(matches!(
            blob(&data, heap, Span::new(0, 10), Span::new(0, 1)),
            Err(Error::Malformed { .. })
        ));
        let record = blob(&data, heap, Span::new(0, 3), Span::new(0, 1)).unwrap();
        assert_eq!(record.data(), &[1, 2]);
    }

    #[test]
    fn record_outside_heap() {
        let data = [0x00, 0x03, 0x41, 0x42, 0x43];
        assert!(matches!(
            blob(&data, Span::new(2, 5), Span::new(1, 5), Span::new(1, 2)),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn truncated() {
        let data = [0x00, 0x05, 0x41, 0x42, 0x43];
        let heap = BlobHeap::parse(&data, Span::new(0, 5), &HeapReferences::new()).unwrap();
        assert_eq!(heap.records().len(), 1);
        assert!(heap.record(1).is_none());
    }

    #[test]
    fn single_byte_length_scenario() {
        let mut data = vec![0u8; 55];
        data[50] = 0x04;
        data[51..55].copy_from_slice(&[1, 2, 3, 4]);

        let span = Span::new(50, 55);
        let record = blob(&data, span, span, Span::new(50, 51)).unwrap();
        assert_eq!(record.leaf_at(Position(50)).unwrap().span(), Span::new(50, 51));
        assert_eq!(record.leaf_at(Position(53)).unwrap().name(), Some("Data"));
    }
}
