//! String Heap (`#Strings`) records
//!
//! The `#Strings` heap stores identifier strings in UTF-8, each terminated by a zero byte.
//! Every entry is described by a [`StringsRecord`] with a `String` field and, when present,
//! a one byte `Terminator` field. The first entry is always the empty string at offset 0.
//!
//! # Reference
//! - [ECMA-335 II.24.2.3](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::{any::Any, sync::Arc};

use log::{debug, warn};

use crate::{
    document::StructureContainer,
    file::read_span,
    metadata::{
        streams::heap::{record_at, HeapInfo, HeapKind, HeapReferences},
        token::Token,
    },
    span::{Position, Span},
    structure::{CompositeData, Field, LeafField, LeafValue, StringEncoding, Structure},
    Error, Result,
};

/// One zero-terminated entry of the `#Strings` heap.
///
/// Fields are `[String]` or `[String, Terminator]`. The terminator exists iff the caller
/// declares a terminating zero, and then covers exactly the byte after the string.
///
/// # Examples
///
/// ```rust
/// use heapscope::metadata::streams::{HeapInfo, HeapKind, StringsRecord};
/// use heapscope::{CompositeData, Span};
/// use std::sync::Arc;
///
/// let data = b"\0Hello\0";
/// let heap = Arc::new(HeapInfo::new(HeapKind::Strings, Span::new(0, 7)));
///
/// let record = StringsRecord::new(heap, data, Span::new(1, 6), true, vec![])?;
/// assert_eq!(record.text(), "Hello");
/// assert_eq!(record.field_count(), 2);
/// assert_eq!(record.terminator_span(), Some(Span::new(6, 7)));
/// # Ok::<(), heapscope::Error>(())
/// ```
#[derive(Debug)]
pub struct StringsRecord {
    heap: Arc<HeapInfo>,
    tokens: Vec<Token>,
    fields: Vec<Field>,
}

impl StringsRecord {
    /// Creates the record for the string bytes at `string_span`
    ///
    /// ## Arguments
    /// * 'heap'                    - The owning heap
    /// * 'buffer'                  - Bytes addressed by absolute position
    /// * 'string_span'             - The string bytes, without the terminator
    /// * 'has_terminating_zero'    - Whether a zero byte follows the string
    /// * 'tokens'                  - Rows referencing this string, order is preserved
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] if the string or its terminator lies outside `buffer`
    /// and [`Error::Malformed`] if it lies outside `heap` or the declared terminator is not
    /// a zero byte
    pub fn new(
        heap: Arc<HeapInfo>,
        buffer: &[u8],
        string_span: Span,
        has_terminating_zero: bool,
        tokens: Vec<Token>,
    ) -> Result<Self> {
        let text = String::from_utf8_lossy(read_span(buffer, string_span)?).into_owned();
        heap.check_record_span(string_span)?;

        let mut fields = Vec::with_capacity(2);
        fields.push(
            LeafField::new(
                "String",
                string_span,
                LeafValue::String {
                    text,
                    encoding: StringEncoding::Utf8,
                },
            )
            .into(),
        );

        if has_terminating_zero {
            let terminator_span = Span::from_len(string_span.end(), 1)?;
            let terminator = read_span(buffer, terminator_span)?[0];
            heap.check_record_span(terminator_span)?;
            if terminator != 0 {
                return Err(malformed_error!(
                    "#Strings entry at {} is terminated by 0x{:02X}",
                    string_span.start(),
                    terminator
                ));
            }
            fields.push(LeafField::new("Terminator", terminator_span, LeafValue::Byte(0)).into());
        }

        Ok(StringsRecord {
            heap,
            tokens,
            fields,
        })
    }

    /// The owning heap
    #[must_use]
    pub fn heap(&self) -> &HeapInfo {
        &self.heap
    }

    /// Rows referencing this string, in the order they were supplied
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The decoded string
    #[must_use]
    pub fn text(&self) -> &str {
        match self.fields[0].as_leaf().map(LeafField::value) {
            Some(LeafValue::String { text, .. }) => text,
            _ => "",
        }
    }

    /// The string bytes, without the terminator
    #[must_use]
    pub fn string_span(&self) -> Span {
        self.fields[0].span()
    }

    /// Whether the entry is zero terminated
    #[must_use]
    pub fn has_terminating_zero(&self) -> bool {
        self.fields.len() == 2
    }

    /// The terminator byte, if present
    #[must_use]
    pub fn terminator_span(&self) -> Option<Span> {
        self.fields.get(1).map(Field::span)
    }
}

impl CompositeData for StringsRecord {
    fn fields(&self) -> &[Field] {
        &self.fields
    }
}

impl Structure for StringsRecord {
    fn name(&self) -> &str {
        "StringsRecord"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The decoded `#Strings` heap
#[derive(Debug)]
pub struct StringsHeap {
    info: Arc<HeapInfo>,
    records: Vec<StringsRecord>,
}

impl StringsHeap {
    /// Splits the heap at `span` into its zero-terminated entries. The last entry may lack
    /// its terminator.
    ///
    /// ## Arguments
    /// * 'buffer'      - Bytes addressed by absolute position
    /// * 'span'        - The heap stream
    /// * 'references'  - Tokens referencing entries, keyed by heap offset
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] if `span` exceeds `buffer`
    pub fn parse(buffer: &[u8], span: Span, references: &HeapReferences) -> Result<StringsHeap> {
        let data = read_span(buffer, span)?;
        if data.first().is_some_and(|&first| first != 0) {
            warn!(
                "{} at {} does not start with the empty string",
                HeapKind::Strings,
                span
            );
        }

        let info = Arc::new(HeapInfo::new(HeapKind::Strings, span));
        let mut records = Vec::new();
        let mut offset = 0usize;

        while offset < data.len() {
            let (len, terminated) = match data[offset..].iter().position(|&b| b == 0) {
                Some(len) => (len, true),
                None => (data.len() - offset, false),
            };

            let heap_offset = u32::try_from(offset).map_err(|_| Error::OutOfBounds)?;
            let start = span.start() + offset as u64;
            records.push(StringsRecord::new(
                info.clone(),
                buffer,
                Span::from_len(start, len as u64)?,
                terminated,
                references.tokens(heap_offset).to_vec(),
            )?);

            offset += len + usize::from(terminated);
        }

        debug!("{}: {} records in {}", HeapKind::Strings, records.len(), span);
        Ok(StringsHeap { info, records })
    }

    /// Heap-wide metadata
    #[must_use]
    pub fn info(&self) -> &HeapInfo {
        &self.info
    }

    /// All records in heap order
    #[must_use]
    pub fn records(&self) -> &[StringsRecord] {
        &self.records
    }

    /// The record starting at heap `offset`, as referenced by metadata tables
    #[must_use]
    pub fn record(&self, offset: u32) -> Option<&StringsRecord> {
        let position = self.info.span().start() + u64::from(offset);
        self.record_at(position)
            .filter(|record| record.span().start() == position)
    }

    /// The record covering `position`
    #[must_use]
    pub fn record_at(&self, position: Position) -> Option<&StringsRecord> {
        record_at(&self.records, position)
    }
}

impl StructureContainer for StringsHeap {
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
        Arc::new(HeapInfo::new(HeapKind::Strings, span))
    }

    #[test]
    fn terminator_optional() {
        let data = b"\0Hello\0";
        let heap = heap_info(Span::new(0, 7));

        let without =
            StringsRecord::new(heap.clone(), data, Span::new(1, 6), false, vec![]).unwrap();
        assert_eq!(without.field_count(), 1);
        assert_eq!(without.field(0).name(), Some("String"));
        assert_eq!(without.terminator_span(), None);
        assert!(!without.has_terminating_zero());

        let with = StringsRecord::new(heap, data, Span::new(1, 6), true, vec![]).unwrap();
        assert_eq!(with.field_count(), 2);
        assert_eq!(with.field(1).name(), Some("Terminator"));
        assert_eq!(with.terminator_span(), Some(Span::new(6, 7)));
        assert_eq!(with.span(), Span::new(1, 7));
    }

    #[test]
    fn terminator_must_be_zero() {
        let data = b"\0Hello!";
        let heap = heap_info(Span::new(0, 7));
        assert!(matches!(
            StringsRecord::new(heap.clone(), data, Span::new(1, 6), true, vec![]),
            Err(Error::Malformed { .. })
        ));
        assert!(matches!(
            StringsRecord::new(heap, data, Span::new(1, 7), true, vec![]),
            Err(Error::OutOfBounds)
        ));
    }

    #[test]
    fn record_outside_heap() {
        let mut data = vec![0u8; 16];
        data[10..15].copy_from_slice(b"Hello");
        let heap = heap_info(Span::new(12, 16));
        assert!(matches!(
            StringsRecord::new(heap, &data, Span::new(10, 15), false, vec![]),
            Err(Error::Malformed { .. })
        ));

        // the terminator must lie inside the heap as well
        let data = b"\0Hello\0";
        let heap = heap_info(Span::new(0, 6));
        assert!(matches!(
            StringsRecord::new(heap.clone(), data, Span::new(1, 6), true, vec![]),
            Err(Error::Malformed { .. })
        ));
        assert!(StringsRecord::new(heap, data, Span::new(1, 6), false, vec![]).is_ok());
    }

    #[test]
    fn tokens_keep_order() {
        let data = b"\0Hello\0";
        let tokens = vec![Token(0x0200_0003), Token(0x0100_0001), Token(0x0200_0003)];
        let heap = heap_info(Span::new(0, 7));
        let record = StringsRecord::new(heap, data, Span::new(1, 6), true, tokens.clone()).unwrap();
        assert_eq!(record.tokens(), tokens.as_slice());
    }

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data : [u8; 39] = [
            0x00,
            0x3c, 0x4d, 0x61, 0x69, 0x6e, 0x3e, 0x24, 0x00,
            0x43, 0x5f, 0x53, 0x68, 0x61, 0x72, 0x70, 0x5f, 0x50, 0x4f, 0x43, 0x5f, 0x31, 0x00,
            0x3c, 0x4d, 0x6f, 0x64, 0x75, 0x6c, 0x65, 0x3e, 0x00,
            0x53, 0x79, 0x73, 0x74, 0x65, 0x6d, 0x2e,
        ];

        let mut references = HeapReferences::new();
        references.add(9, Token(0x0200_0002));

        let heap = StringsHeap::parse(&data, Span::new(0, 39), &references).unwrap();
        assert_eq!(heap.records().len(), 5);

        assert_eq!(heap.record(0).unwrap().text(), "");
        assert_eq!(heap.record(1).unwrap().text(), "<Main>$");
        assert_eq!(heap.record(9).unwrap().text(), "C_Sharp_POC_1");
        assert_eq!(heap.record(9).unwrap().tokens(), &[Token(0x0200_0002)]);
        assert_eq!(heap.record(23).unwrap().text(), "<Module>");
        assert!(heap.record(2).is_none());

        let last = heap.record(32).unwrap();
        assert_eq!(last.text(), "System.");
        assert!(!last.has_terminating_zero());
        assert_eq!(last.span(), Span::new(32, 39));
    }

    #[test]
    fn record_at_positions() {
        let data = b"\0ab\0cd\0";
        let heap = StringsHeap::parse(data, Span::new(0, 7), &HeapReferences::new()).unwrap();

        // the empty string at offset 0 is all terminator
        let empty = heap.record_at(Position(0)).unwrap();
        assert_eq!(empty.string_span(), Span::new(0, 0));
        assert_eq!(empty.leaf_at(Position(0)).unwrap().name(), Some("Terminator"));

        let record = heap.record_at(Position(3)).unwrap();
        assert_eq!(record.text(), "ab");
        assert_eq!(record.leaf_at(Position(3)).unwrap().name(), Some("Terminator"));
        assert!(heap.record_at(Position(7)).is_none());
    }
}
