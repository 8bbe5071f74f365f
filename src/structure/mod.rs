//! The composite binary-structure data model.
//!
//! A byte range's layout is described as a tree: [`LeafField`]s hold decoded values over a
//! [`Span`], and composites hold an ordered, fixed list of child [`Field`]s whose own span is
//! derived from their children. A top-level composite that a file exposes at a position is a
//! [`Structure`].
//!
//! # Key Components
//!
//! - [`CompositeData`] - Lookup of children by index and by position, and descent to a leaf
//! - [`Composite`] - A concrete nested composite usable as a [`Field`]
//! - [`Structure`] / [`StructureData`] - Named top-level composites
//! - [`HexIndexes`] - Sibling index ranges used as grouping hints
//!
//! # Examples
//!
//! ```rust
//! use heapscope::prelude::*;
//!
//! let header = StructureData::new(
//!     "Header",
//!     vec![
//!         LeafField::new("Magic", Span::new(0, 1), LeafValue::Byte(0x42)).into(),
//!         LeafField::new("Flags", Span::new(1, 2), LeafValue::Byte(0x00)).into(),
//!     ],
//! )?;
//!
//! assert_eq!(header.span(), Span::new(0, 2));
//! assert_eq!(header.leaf_at(Position(1)).unwrap().name(), Some("Flags"));
//! assert!(header.field_at(Position(2)).is_none());
//! # Ok::<(), heapscope::Error>(())
//! ```

use std::{any::Any, borrow::Cow};

use crate::{
    span::{Position, Span},
    Result,
};

mod field;
pub use field::{Field, LeafField, LeafValue, StringEncoding};

mod indexes;
pub use indexes::HexIndexes;

/// An ordered, fixed sequence of child fields.
///
/// Implementors only provide [`CompositeData::fields`]; every other operation is derived.
/// Children are ordered by position in declaration order and never overlap, which is what
/// allows [`CompositeData::field_at`] to binary search.
pub trait CompositeData {
    /// The children in declaration order
    fn fields(&self) -> &[Field];

    /// Number of direct children
    fn field_count(&self) -> usize {
        self.fields().len()
    }

    /// The child at `index`
    ///
    /// # Panics
    /// Panics if `index >= field_count()`. Indices come from the structure itself or from
    /// validated [`HexIndexes`], so an out of range index is a programming error.
    fn field(&self, index: usize) -> &Field {
        let fields = self.fields();
        assert!(
            index < fields.len(),
            "field index {index} out of range for {} fields",
            fields.len()
        );
        &fields[index]
    }

    /// `[first.start, last.end)` of the children, empty if there are none
    fn span(&self) -> Span {
        match (self.fields().first(), self.fields().last()) {
            (Some(first), Some(last)) => first.span().union(&last.span()),
            _ => Span::default(),
        }
    }

    /// The direct child whose span contains `position`, if any
    fn field_at(&self, position: Position) -> Option<&Field> {
        let fields = self.fields();
        let index = fields.partition_point(|field| field.span().end() <= position);
        fields
            .get(index)
            .filter(|field| field.span().contains(position))
    }

    /// The index of the direct child whose span contains `position`, if any
    fn field_index_at(&self, position: Position) -> Option<usize> {
        let fields = self.fields();
        let index = fields.partition_point(|field| field.span().end() <= position);
        fields
            .get(index)
            .filter(|field| field.span().contains(position))
            .map(|_| index)
    }

    /// Descends through nested composites to the leaf whose span contains `position`
    fn leaf_at(&self, position: Position) -> Option<&LeafField> {
        let mut field = self.field_at(position)?;
        loop {
            match field {
                Field::Leaf(leaf) => return Some(leaf),
                Field::Composite(composite) => field = composite.field_at(position)?,
            }
        }
    }
}

/// A named composite that a file exposes at a position.
///
/// The heap records in [`crate::metadata::streams`] implement this, as does the generic
/// [`StructureData`]. `as_any` lets format providers recover the concrete record type.
pub trait Structure: CompositeData + Send + Sync {
    /// Name of the structure kind, e.g. `"StringsRecord"`
    fn name(&self) -> &str;

    /// The concrete type, for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Checks that `fields` is non-empty and ordered by position without overlap.
///
/// # Errors
/// Returns [`crate::Error::Empty`] for an empty list and [`crate::Error::Malformed`] if two
/// adjacent fields are out of order or overlap.
pub(crate) fn check_field_order(fields: &[Field]) -> Result<()> {
    if fields.is_empty() {
        return Err(crate::Error::Empty);
    }

    for pair in fields.windows(2) {
        let (current, next) = (pair[0].span(), pair[1].span());
        if current.end() > next.start() {
            return Err(malformed_error!(
                "Field {:?} at {} overlaps or follows field {:?} at {}",
                pair[0].name().unwrap_or("<unnamed>"),
                current,
                pair[1].name().unwrap_or("<unnamed>"),
                next
            ));
        }
    }

    Ok(())
}

/// A nested composite field with an optional name.
#[derive(Clone, Debug, PartialEq)]
pub struct Composite {
    name: Option<Cow<'static, str>>,
    fields: Vec<Field>,
}

impl Composite {
    /// Creates a named composite
    ///
    /// # Errors
    /// Returns an error if `fields` is empty, out of order or overlapping
    pub fn new(name: impl Into<Cow<'static, str>>, fields: Vec<Field>) -> Result<Self> {
        check_field_order(&fields)?;
        Ok(Composite {
            name: Some(name.into()),
            fields,
        })
    }

    /// Creates a composite without a name
    ///
    /// # Errors
    /// Returns an error if `fields` is empty, out of order or overlapping
    pub fn unnamed(fields: Vec<Field>) -> Result<Self> {
        check_field_order(&fields)?;
        Ok(Composite { name: None, fields })
    }

    /// The composite name, if any
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl CompositeData for Composite {
    fn fields(&self) -> &[Field] {
        &self.fields
    }
}

/// A hand-described top-level structure: a name and a fixed field list.
#[derive(Clone, Debug, PartialEq)]
pub struct StructureData {
    name: Cow<'static, str>,
    fields: Vec<Field>,
}

impl StructureData {
    /// Creates a new structure
    ///
    /// # Errors
    /// Returns an error if `fields` is empty, out of order or overlapping
    pub fn new(name: impl Into<Cow<'static, str>>, fields: Vec<Field>) -> Result<Self> {
        check_field_order(&fields)?;
        Ok(StructureData {
            name: name.into(),
            fields,
        })
    }
}

impl CompositeData for StructureData {
    fn fields(&self) -> &[Field] {
        &self.fields
    }
}

impl Structure for StructureData {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
