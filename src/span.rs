//! Byte positions and half-open byte ranges over a buffer.
//!
//! Every structure, field and file in this crate is addressed through these two value types.
//! A [`Position`] is an absolute offset into the inspected buffer and a [`Span`] is the
//! half-open range `[start, end)` between two positions. Zero-length spans are legal and are
//! used to describe data that is not present, e.g. a missing string terminator.

use std::{
    fmt,
    ops::{Add, Sub},
};

use crate::{Error, Result};

/// An absolute byte offset into a buffer.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position(pub u64);

impl Position {
    /// The first byte of every buffer
    pub const ZERO: Position = Position(0);

    /// Creates a new position from a raw offset
    #[must_use]
    pub fn new(value: u64) -> Self {
        Position(value)
    }

    /// Returns the raw offset
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Returns the offset as an index into an in-memory slice
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] if the offset does not fit into `usize`
    pub fn to_usize(&self) -> Result<usize> {
        usize::try_from(self.0).map_err(|_| Error::OutOfBounds)
    }

    /// Adds `len` bytes, returning `None` on overflow
    #[must_use]
    pub fn checked_add(&self, len: u64) -> Option<Position> {
        self.0.checked_add(len).map(Position)
    }
}

impl From<u64> for Position {
    fn from(value: u64) -> Self {
        Position(value)
    }
}

impl From<Position> for u64 {
    fn from(position: Position) -> Self {
        position.0
    }
}

impl Add<u64> for Position {
    type Output = Position;

    fn add(self, rhs: u64) -> Position {
        Position(self.0 + rhs)
    }
}

impl Sub<u64> for Position {
    type Output = Position;

    fn sub(self, rhs: u64) -> Position {
        Position(self.0 - rhs)
    }
}

/// Distance in bytes between two positions
impl Sub<Position> for Position {
    type Output = u64;

    fn sub(self, rhs: Position) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position(0x{:X})", self.0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

/// A half-open byte range `[start, end)` over a buffer.
///
/// The invariant `start <= end` is established at construction and never changes.
///
/// # Examples
///
/// ```rust
/// use heapscope::{Position, Span};
///
/// let span = Span::new(100, 105);
/// assert_eq!(span.len(), 5);
/// assert!(span.contains(Position(102)));
/// assert!(!span.contains(Position(105)));
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    start: Position,
    end: Position,
}

impl Span {
    /// Creates a span from raw offsets
    ///
    /// # Panics
    /// Panics if `start > end`, which is a programming error in the caller
    #[must_use]
    pub fn new(start: u64, end: u64) -> Self {
        assert!(start <= end, "span start {start} is after end {end}");
        Span {
            start: Position(start),
            end: Position(end),
        }
    }

    /// Creates a span from two positions, checking the bounds
    ///
    /// # Errors
    /// Returns [`Error::InvalidSpan`] if `start > end`
    pub fn from_bounds(start: Position, end: Position) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidSpan {
                start: start.0,
                end: end.0,
            });
        }

        Ok(Span { start, end })
    }

    /// Creates a span of `len` bytes starting at `start`
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] if the end would overflow
    pub fn from_len(start: Position, len: u64) -> Result<Self> {
        let end = start.checked_add(len).ok_or(Error::OutOfBounds)?;
        Ok(Span { start, end })
    }

    /// The first position of the span
    #[must_use]
    pub fn start(&self) -> Position {
        self.start
    }

    /// The position one past the last byte of the span
    #[must_use]
    pub fn end(&self) -> Position {
        self.end
    }

    /// Number of bytes covered
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end.0 - self.start.0
    }

    /// Returns `true` if the span covers no bytes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns `true` if `position` lies inside `[start, end)`
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        position >= self.start && position < self.end
    }

    /// Returns `true` if `other` lies completely inside this span
    #[must_use]
    pub fn contains_span(&self, other: &Span) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Returns `true` if both spans share at least one byte
    #[must_use]
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }

    /// Returns the smallest span covering both spans
    #[must_use]
    pub fn union(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Returns the span as a range into an in-memory slice
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] if a bound does not fit into `usize`
    pub fn to_range(&self) -> Result<std::ops::Range<usize>> {
        Ok(self.start.to_usize()?..self.end.to_usize()?)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:X}, 0x{:X})", self.start.0, self.end.0)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:X}, 0x{:X})", self.start.0, self.end.0)
    }
}
