//! Shared heap descriptors.

use std::collections::HashMap;

use strum::{AsRefStr, Display, EnumCount, EnumIter};

use crate::{
    metadata::token::Token,
    span::{Position, Span},
    structure::Structure,
    Result,
};

/// The four metadata heaps whose entries are described as records
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter, EnumCount)]
pub enum HeapKind {
    /// `#GUID` - 16-byte identifiers, addressed by 1-based index
    #[strum(serialize = "#GUID")]
    Guid,
    /// `#Strings` - zero terminated UTF-8 identifiers
    #[strum(serialize = "#Strings")]
    Strings,
    /// `#US` - length prefixed UTF-16 literals
    #[strum(serialize = "#US")]
    UserStrings,
    /// `#Blob` - length prefixed binary data
    #[strum(serialize = "#Blob")]
    Blob,
}

/// Heap-wide metadata shared by a heap and every record it contains.
///
/// Records hold this behind an `Arc` instead of a reference to the heap itself, which keeps
/// records free of the heap's lifetime while still letting them answer heap questions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeapInfo {
    kind: HeapKind,
    span: Span,
}

impl HeapInfo {
    /// Describes a heap of `kind` covering `span`
    #[must_use]
    pub fn new(kind: HeapKind, span: Span) -> Self {
        HeapInfo { kind, span }
    }

    /// The heap kind
    #[must_use]
    pub fn kind(&self) -> HeapKind {
        self.kind
    }

    /// The bytes of the heap stream
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Heap-relative offset of an absolute position, as used by metadata table columns.
    /// Returns `None` if the position lies outside the heap.
    #[must_use]
    pub fn offset_of(&self, position: Position) -> Option<u64> {
        (position >= self.span.start() && position <= self.span.end())
            .then(|| position - self.span.start())
    }

    /// Checks that a record covering `span` lies inside the heap
    pub(crate) fn check_record_span(&self, span: Span) -> Result<()> {
        if !self.span.contains_span(&span) {
            return Err(malformed_error!(
                "{} record {} lies outside the heap {}",
                self.kind,
                span,
                self.span
            ));
        }

        Ok(())
    }
}

/// Metadata tokens referencing heap entries, keyed by heap offset.
///
/// The table decoder that knows which rows point where fills this in; heap parsers hand
/// the tokens to the records they create. Insertion order per offset is preserved.
#[derive(Clone, Debug, Default)]
pub struct HeapReferences {
    tokens: HashMap<u32, Vec<Token>>,
}

impl HeapReferences {
    /// An empty reference map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `token` references the entry at heap `offset`
    pub fn add(&mut self, offset: u32, token: Token) {
        self.tokens.entry(offset).or_default().push(token);
    }

    /// All tokens referencing the entry at `offset`, in insertion order
    #[must_use]
    pub fn tokens(&self, offset: u32) -> &[Token] {
        self.tokens.get(&offset).map(Vec::as_slice).unwrap_or_default()
    }

    /// The first token referencing the entry at `offset`, or the null token
    #[must_use]
    pub fn owner(&self, offset: u32) -> Token {
        self.tokens(offset).first().copied().unwrap_or(Token::NULL)
    }

    /// Returns `true` if no reference was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Binary search over records ordered by span
pub(crate) fn record_at<T: Structure>(records: &[T], position: Position) -> Option<&T> {
    let index = records.partition_point(|record| record.span().end() <= position);
    records
        .get(index)
        .filter(|record| record.span().contains(position))
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn heap_kind_names() {
        let names: Vec<String> = HeapKind::iter().map(|kind| kind.to_string()).collect();
        assert_eq!(names, ["#GUID", "#Strings", "#US", "#Blob"]);
        assert_eq!(HeapKind::COUNT, 4);
    }

    #[test]
    fn offset_of() {
        let heap = HeapInfo::new(HeapKind::Strings, Span::new(0x200, 0x300));
        assert_eq!(heap.offset_of(Position(0x210)), Some(0x10));
        assert_eq!(heap.offset_of(Position(0x300)), Some(0x100));
        assert_eq!(heap.offset_of(Position(0x1FF)), None);
        assert_eq!(heap.offset_of(Position(0x301)), None);
    }

    #[test]
    fn record_span_inside_heap() {
        let heap = HeapInfo::new(HeapKind::Blob, Span::new(12, 16));
        assert!(heap.check_record_span(Span::new(12, 16)).is_ok());
        assert!(heap.check_record_span(Span::new(16, 16)).is_ok());
        assert!(matches!(
            heap.check_record_span(Span::new(10, 15)),
            Err(crate::Error::Malformed { .. })
        ));
        assert!(heap.check_record_span(Span::new(14, 17)).is_err());
    }

    #[test]
    fn references_keep_order() {
        let mut references = HeapReferences::new();
        references.add(4, Token(0x0200_0002));
        references.add(4, Token(0x0100_0001));
        references.add(9, Token(0x0600_0001));

        assert_eq!(
            references.tokens(4),
            &[Token(0x0200_0002), Token(0x0100_0001)]
        );
        assert_eq!(references.owner(4), Token(0x0200_0002));
        assert_eq!(references.owner(5), Token::NULL);
        assert!(references.tokens(5).is_empty());
    }
}
