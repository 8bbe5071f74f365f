//! Sibling-field index ranges used as sub-structure grouping hints.

use std::fmt;

use crate::{span::Span, structure::CompositeData};

/// A half-open range `[start, end)` over the field indices of one composite.
///
/// Providers return a list of these to ask for each range's member fields to be highlighted
/// as one merged region. The indices refer to fields, never to bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexIndexes {
    start: usize,
    end: usize,
}

impl HexIndexes {
    /// Creates a new index range
    ///
    /// # Panics
    /// Panics if `start > end`
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end, "index range start {start} is after end {end}");
        HexIndexes { start, end }
    }

    /// A range covering only the field at `index`
    #[must_use]
    pub fn single(index: usize) -> Self {
        HexIndexes {
            start: index,
            end: index + 1,
        }
    }

    /// First field index
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last field index
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of fields covered
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if no field is covered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Checks a provider supplied list against a composite with `field_count` fields.
    ///
    /// The empty list is valid. Otherwise every range must be non-empty, the ranges must be
    /// sorted by start without overlapping, and every end must be `<= field_count`.
    #[must_use]
    pub fn is_valid_set(indexes: &[HexIndexes], field_count: usize) -> bool {
        let mut previous_end = 0;
        for (i, range) in indexes.iter().enumerate() {
            if range.is_empty() || range.end > field_count {
                return false;
            }
            if i > 0 && previous_end > range.start {
                return false;
            }
            previous_end = range.end;
        }

        true
    }

    /// The merged span of the fields covered by this range
    ///
    /// # Panics
    /// Panics if the range is empty or exceeds the field count of `composite`; only call this
    /// on ranges that passed [`HexIndexes::is_valid_set`].
    #[must_use]
    pub fn merged_span<C: CompositeData + ?Sized>(&self, composite: &C) -> Span {
        let first = composite.field(self.start).span();
        let last = composite.field(self.end - 1).span();
        first.union(&last)
    }
}

impl fmt::Debug for HexIndexes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation() {
        assert!(HexIndexes::is_valid_set(&[], 3));
        assert!(HexIndexes::is_valid_set(&[], 0));
        assert!(HexIndexes::is_valid_set(
            &[HexIndexes::new(0, 2), HexIndexes::new(2, 3)],
            3
        ));
        assert!(HexIndexes::is_valid_set(
            &[HexIndexes::single(0), HexIndexes::single(2)],
            3
        ));
    }

    #[test]
    fn validation_rejects() {
        // overlapping
        assert!(!HexIndexes::is_valid_set(
            &[HexIndexes::new(0, 2), HexIndexes::new(1, 3)],
            3
        ));
        // out of bounds
        assert!(!HexIndexes::is_valid_set(&[HexIndexes::new(0, 4)], 3));
        // empty range
        assert!(!HexIndexes::is_valid_set(&[HexIndexes::new(1, 1)], 3));
        // unsorted
        assert!(!HexIndexes::is_valid_set(
            &[HexIndexes::single(2), HexIndexes::single(0)],
            3
        ));
    }

    #[test]
    fn single() {
        let range = HexIndexes::single(4);
        assert_eq!(range.start(), 4);
        assert_eq!(range.end(), 5);
        assert_eq!(range.len(), 1);
        assert_eq!(format!("{range:?}"), "[4, 5)");
    }
}
