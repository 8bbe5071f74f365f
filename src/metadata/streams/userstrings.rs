//! User String Heap (`#US`) records
//!
//! The `#US` heap stores string literals in UTF-16. Each entry starts with a compressed
//! length that counts the string bytes plus one trailing terminal byte, which flags strings
//! containing characters that need special handling. An entry is described by a
//! [`UserStringRecord`] with `Length`, `String` and `TerminalByte` fields.
//!
//! # Reference
//! - [ECMA-335 II.24.2.4](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::{any::Any, sync::Arc};

use log::{debug, warn};
use widestring::U16String;

use crate::{
    document::StructureContainer,
    file::{parser::Parser, read_span},
    metadata::streams::heap::{record_at, HeapInfo, HeapKind},
    span::{Position, Span},
    structure::{CompositeData, Field, LeafField, LeafValue, StringEncoding, Structure},
    Result,
};

/// One length prefixed entry of the `#US` heap.
///
/// Fields are always `[Length, String, TerminalByte]` and contiguous. The terminal byte span
/// is zero bytes long when the encoded length is even, i.e. when the terminal byte is absent.
///
/// # Examples
///
/// ```rust
/// use heapscope::metadata::streams::{HeapInfo, HeapKind, UserStringRecord};
/// use heapscope::Span;
/// use std::sync::Arc;
///
/// let data = [0x00, 0x05, b'H', 0x00, b'i', 0x00, 0x00];
/// let heap = Arc::new(HeapInfo::new(HeapKind::UserStrings, Span::new(0, 7)));
///
/// let record = UserStringRecord::new(
///     heap.clone(), &data, Span::new(1, 2), Span::new(2, 6), Span::new(6, 7),
/// )?;
/// assert_eq!(record.text(), "Hi");
/// assert_eq!(record.terminal_byte(), Some(0));
///
/// // the terminal byte must directly follow the string
/// assert!(UserStringRecord::new(
///     heap, &data, Span::new(1, 2), Span::new(2, 5), Span::new(6, 7),
/// ).is_err());
/// # Ok::<(), heapscope::Error>(())
/// ```
#[derive(Debug)]
pub struct UserStringRecord {
    heap: Arc<HeapInfo>,
    length: u32,
    fields: Vec<Field>,
}

impl UserStringRecord {
    /// Creates the record from its three contiguous parts
    ///
    /// ## Arguments
    /// * 'heap'                - The owning heap
    /// * 'buffer'              - Bytes addressed by absolute position
    /// * 'length_span'         - The compressed length, 1 to 4 bytes
    /// * 'string_span'         - The UTF-16LE string bytes
    /// * 'terminal_byte_span'  - The terminal byte, 0 or 1 bytes
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the spans are not contiguous, the length span
    /// is not 1 to 4 bytes or does not hold exactly one compressed integer, the decoded
    /// length differs from the string and terminal byte together, the string span has an odd
    /// length, the terminal byte span is longer than one byte, or the record lies outside
    /// `heap`. Returns [`crate::Error::OutOfBounds`] if a span lies outside `buffer`.
    pub fn new(
        heap: Arc<HeapInfo>,
        buffer: &[u8],
        length_span: Span,
        string_span: Span,
        terminal_byte_span: Span,
    ) -> Result<Self> {
        if !(1..=4).contains(&length_span.len()) {
            return Err(malformed_error!(
                "#US length at {} must be 1 to 4 bytes, got {}",
                length_span.start(),
                length_span.len()
            ));
        }
        if length_span.end() != string_span.start() {
            return Err(malformed_error!(
                "#US string {} does not follow its length {}",
                string_span,
                length_span
            ));
        }
        if string_span.end() != terminal_byte_span.start() {
            return Err(malformed_error!(
                "#US terminal byte {} does not follow its string {}",
                terminal_byte_span,
                string_span
            ));
        }
        if terminal_byte_span.len() > 1 {
            return Err(malformed_error!(
                "#US terminal byte at {} spans {} bytes",
                terminal_byte_span.start(),
                terminal_byte_span.len()
            ));
        }
        if string_span.len() % 2 != 0 {
            return Err(malformed_error!(
                "#US string {} has an odd number of bytes",
                string_span
            ));
        }

        let length_data = read_span(buffer, length_span)?;
        let mut parser = Parser::new(length_data);
        let length = parser.read_compressed_uint()?;
        if parser.pos() != length_data.len() {
            return Err(malformed_error!(
                "#US length {} is encoded in {} bytes but spans {}",
                length,
                parser.pos(),
                length_span
            ));
        }
        if u64::from(length) != string_span.len() + terminal_byte_span.len() {
            return Err(malformed_error!(
                "#US length {} at {} does not match its string {} and terminal byte {}",
                length,
                length_span.start(),
                string_span,
                terminal_byte_span
            ));
        }

        let units: Vec<u16> = read_span(buffer, string_span)?
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let text = U16String::from_vec(units).to_string_lossy();

        let terminal = match read_span(buffer, terminal_byte_span)?.first() {
            Some(&byte) => LeafValue::Byte(byte),
            None => LeafValue::Bytes(Vec::new()),
        };
        heap.check_record_span(length_span.union(&terminal_byte_span))?;

        Ok(UserStringRecord {
            heap,
            length,
            fields: vec![
                LeafField::new("Length", length_span, LeafValue::CompressedUInt(length)).into(),
                LeafField::new(
                    "String",
                    string_span,
                    LeafValue::String {
                        text,
                        encoding: StringEncoding::Utf16Le,
                    },
                )
                .into(),
                LeafField::new("TerminalByte", terminal_byte_span, terminal).into(),
            ],
        })
    }

    /// The owning heap
    #[must_use]
    pub fn heap(&self) -> &HeapInfo {
        &self.heap
    }

    /// The decoded length prefix
    #[must_use]
    pub fn length(&self) -> u32 {
        self.length
    }

    /// The decoded string
    #[must_use]
    pub fn text(&self) -> &str {
        match self.fields[1].as_leaf().map(LeafField::value) {
            Some(LeafValue::String { text, .. }) => text,
            _ => "",
        }
    }

    /// The terminal byte, if the entry has one
    #[must_use]
    pub fn terminal_byte(&self) -> Option<u8> {
        match self.fields[2].as_leaf().map(LeafField::value) {
            Some(LeafValue::Byte(byte)) => Some(*byte),
            _ => None,
        }
    }

    /// The compressed length prefix
    #[must_use]
    pub fn length_span(&self) -> Span {
        self.fields[0].span()
    }

    /// The UTF-16LE string bytes
    #[must_use]
    pub fn string_span(&self) -> Span {
        self.fields[1].span()
    }

    /// The terminal byte, zero bytes long if absent
    #[must_use]
    pub fn terminal_byte_span(&self) -> Span {
        self.fields[2].span()
    }
}

impl CompositeData for UserStringRecord {
    fn fields(&self) -> &[Field] {
        &self.fields
    }
}

impl Structure for UserStringRecord {
    fn name(&self) -> &str {
        "UserStringRecord"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The decoded `#US` heap
#[derive(Debug)]
pub struct UserStringsHeap {
    info: Arc<HeapInfo>,
    records: Vec<UserStringRecord>,
}

impl UserStringsHeap {
    /// Decodes the entries of the heap at `span`, starting at offset 0.
    ///
    /// Decoding stops at the first entry whose length prefix is malformed or that would
    /// extend past the heap; the bytes from there on are left unstructured.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `span` exceeds `buffer`
    pub fn parse(buffer: &[u8], span: Span) -> Result<UserStringsHeap> {
        let data = read_span(buffer, span)?;
        let info = Arc::new(HeapInfo::new(HeapKind::UserStrings, span));
        let mut records = Vec::new();
        let mut parser = Parser::new(data);

        while parser.has_more_data() {
            let offset = parser.pos();
            let length = match parser.read_compressed_uint() {
                Ok(length) => length as usize,
                Err(error) => {
                    warn!(
                        "{}: stopping at offset 0x{:X} - {}",
                        HeapKind::UserStrings,
                        offset,
                        error
                    );
                    break;
                }
            };
            let prefix = parser.pos() - offset;

            if parser.advance_by(length).is_err() {
                warn!(
                    "{}: entry at offset 0x{:X} with length {} exceeds the heap",
                    HeapKind::UserStrings,
                    offset,
                    length
                );
                break;
            }

            let length_span = Span::from_len(span.start() + offset as u64, prefix as u64)?;
            let string_span = Span::from_len(length_span.end(), (length & !1) as u64)?;
            let terminal_byte_span = Span::from_len(string_span.end(), (length & 1) as u64)?;

            records.push(UserStringRecord::new(
                info.clone(),
                buffer,
                length_span,
                string_span,
                terminal_byte_span,
            )?);
        }

        debug!("{}: {} records in {}", HeapKind::UserStrings, records.len(), span);
        Ok(UserStringsHeap { info, records })
    }

    /// Heap-wide metadata
    #[must_use]
    pub fn info(&self) -> &HeapInfo {
        &self.info
    }

    /// All records in heap order
    #[must_use]
    pub fn records(&self) -> &[UserStringRecord] {
        &self.records
    }

    /// The record starting at heap `offset`, as referenced by `ldstr` tokens
    #[must_use]
    pub fn record(&self, offset: u32) -> Option<&UserStringRecord> {
        let position = self.info.span().start() + u64::from(offset);
        self.record_at(position)
            .filter(|record| record.span().start() == position)
    }

    /// The record covering `position`
    #[must_use]
    pub fn record_at(&self, position: Position) -> Option<&UserStringRecord> {
        record_at(&self.records, position)
    }
}

impl StructureContainer for UserStringsHeap {
    fn span(&self) -> Span {
        self.info.span()
    }

    fn structure_at(&self, position: Position) -> Option<&dyn Structure> {
        self.record_at(position).map(|record| record as &dyn Structure)
    }
}
