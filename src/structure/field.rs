//! Leaf fields and the field tagged union.

use std::{borrow::Cow, fmt};

use strum::{AsRefStr, Display};

use crate::{
    span::Span,
    structure::{Composite, CompositeData},
};

/// Text encoding of a decoded string leaf
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum StringEncoding {
    /// `#Strings` heap identifiers
    #[strum(serialize = "UTF-8")]
    Utf8,
    /// `#US` heap literals
    #[strum(serialize = "UTF-16LE")]
    Utf16Le,
}

/// A directly decoded value without further internal structure
#[derive(Clone, Debug, PartialEq)]
pub enum LeafValue {
    /// A single byte
    Byte(u8),
    /// An ECMA-335 II.23.2 compressed unsigned integer (1, 2 or 4 bytes)
    CompressedUInt(u32),
    /// A 128-bit identifier
    Guid(uguid::Guid),
    /// A decoded string
    String {
        /// Decoded text, invalid sequences replaced
        text: String,
        /// Encoding the bytes were decoded with
        encoding: StringEncoding,
    },
    /// Raw bytes
    Bytes(Vec<u8>),
}

impl fmt::Display for LeafValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeafValue::Byte(value) => write!(f, "0x{value:02X}"),
            LeafValue::CompressedUInt(value) => write!(f, "{value} (0x{value:X})"),
            LeafValue::Guid(guid) => write!(f, "{{{guid}}}"),
            LeafValue::String { text, .. } => write!(f, "\"{}\"", text.escape_debug()),
            LeafValue::Bytes(bytes) => {
                write!(f, "byte[{}]", bytes.len())?;
                for byte in bytes.iter().take(16) {
                    write!(f, " {byte:02X}")?;
                }
                if bytes.len() > 16 {
                    write!(f, " ...")?;
                }
                Ok(())
            }
        }
    }
}

/// An optionally named byte range holding a decoded value. Immutable once constructed.
#[derive(Clone, Debug, PartialEq)]
pub struct LeafField {
    name: Option<Cow<'static, str>>,
    span: Span,
    value: LeafValue,
}

impl LeafField {
    /// Creates a named leaf
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>, span: Span, value: LeafValue) -> Self {
        LeafField {
            name: Some(name.into()),
            span,
            value,
        }
    }

    /// Creates a leaf without a name
    #[must_use]
    pub fn unnamed(span: Span, value: LeafValue) -> Self {
        LeafField {
            name: None,
            span,
            value,
        }
    }

    /// The field name, if any
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The bytes this field covers
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// The decoded value
    #[must_use]
    pub fn value(&self) -> &LeafValue {
        &self.value
    }
}

/// A child of a composite: either a decoded leaf or a nested composite.
///
/// Descending from a structure to the innermost field at a position is a `match` on this
/// enum, see [`CompositeData::leaf_at`].
#[derive(Clone, Debug, PartialEq)]
pub enum Field {
    /// A leaf holding a decoded value
    Leaf(LeafField),
    /// A nested composite
    Composite(Composite),
}

impl Field {
    /// The field name, if any
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Field::Leaf(leaf) => leaf.name(),
            Field::Composite(composite) => composite.name(),
        }
    }

    /// The bytes this field covers. For composites this is derived from the children.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Field::Leaf(leaf) => leaf.span(),
            Field::Composite(composite) => composite.span(),
        }
    }

    /// Returns the leaf, if this is one
    #[must_use]
    pub fn as_leaf(&self) -> Option<&LeafField> {
        match self {
            Field::Leaf(leaf) => Some(leaf),
            Field::Composite(_) => None,
        }
    }

    /// Returns the nested composite, if this is one
    #[must_use]
    pub fn as_composite(&self) -> Option<&Composite> {
        match self {
            Field::Leaf(_) => None,
            Field::Composite(composite) => Some(composite),
        }
    }
}

impl From<LeafField> for Field {
    fn from(leaf: LeafField) -> Self {
        Field::Leaf(leaf)
    }
}

impl From<Composite> for Field {
    fn from(composite: Composite) -> Self {
        Field::Composite(composite)
    }
}
