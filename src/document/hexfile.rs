//! Files: named buffer regions with their structures and nested files.

use std::borrow::Cow;

use crate::{
    span::{Position, Span},
    structure::{CompositeData, Structure},
    Result,
};

/// A source of structures over a byte range, e.g. a decoded metadata heap.
///
/// Implementors return the top-level structure covering a position. Containers may hold
/// structures nested inside other structures of their own tree and return the innermost one.
pub trait StructureContainer: Send + Sync {
    /// The bytes this container describes
    fn span(&self) -> Span;

    /// The structure covering `position`, if any
    fn structure_at(&self, position: Position) -> Option<&dyn Structure>;
}

/// A container of standalone structures, such as hand-described headers.
#[derive(Default)]
pub struct StructureList {
    structures: Vec<Box<dyn Structure>>,
}

impl StructureList {
    /// An empty list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a structure, keeping the list ordered by position
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the structure overlaps one already present
    pub fn push(&mut self, structure: Box<dyn Structure>) -> Result<()> {
        let span = structure.span();
        if let Some(existing) = self
            .structures
            .iter()
            .find(|existing| existing.span().overlaps(&span))
        {
            return Err(malformed_error!(
                "Structure {} at {} overlaps {} at {}",
                structure.name(),
                span,
                existing.name(),
                existing.span()
            ));
        }

        let index = self
            .structures
            .partition_point(|existing| existing.span().start() < span.start());
        self.structures.insert(index, structure);
        Ok(())
    }

    /// Number of structures
    #[must_use]
    pub fn len(&self) -> usize {
        self.structures.len()
    }

    /// Returns `true` if the list holds no structure
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }
}

impl StructureContainer for StructureList {
    fn span(&self) -> Span {
        match (self.structures.first(), self.structures.last()) {
            (Some(first), Some(last)) => first.span().union(&last.span()),
            _ => Span::default(),
        }
    }

    fn structure_at(&self, position: Position) -> Option<&dyn Structure> {
        let index = self
            .structures
            .partition_point(|structure| structure.span().end() <= position);
        let structure = self.structures.get(index)?;
        if structure.span().contains(position) {
            Some(structure.as_ref())
        } else {
            None
        }
    }
}

/// A named region of the buffer, e.g. a PE image or a metadata blob.
///
/// A file owns the structure containers describing its bytes and the files nested inside
/// it, e.g. an embedded resource inside an assembly. It is assembled once with the
/// `with_*` builders and is immutable afterwards.
///
/// # Examples
///
/// ```rust
/// use heapscope::document::HexFile;
/// use heapscope::{Position, Span};
///
/// let inner = HexFile::new("resource", Span::new(0x40, 0x80));
/// let outer = HexFile::new("assembly", Span::new(0, 0x100)).with_nested(inner)?;
///
/// assert_eq!(outer.file_at(Position(0x50), false).unwrap().name(), "assembly");
/// assert_eq!(outer.file_at(Position(0x50), true).unwrap().name(), "resource");
/// # Ok::<(), heapscope::Error>(())
/// ```
pub struct HexFile {
    name: Cow<'static, str>,
    span: Span,
    containers: Vec<Box<dyn StructureContainer>>,
    nested: Vec<HexFile>,
}

impl HexFile {
    /// Creates a file without structures
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>, span: Span) -> Self {
        HexFile {
            name: name.into(),
            span,
            containers: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// Adds a structure container describing part of this file
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the container reaches outside the file
    pub fn with_container(mut self, container: Box<dyn StructureContainer>) -> Result<Self> {
        if !self.span.contains_span(&container.span()) {
            return Err(malformed_error!(
                "Structures at {} lie outside file '{}' at {}",
                container.span(),
                self.name,
                self.span
            ));
        }

        self.containers.push(container);
        Ok(self)
    }

    /// Adds a file nested inside this one
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the nested file reaches outside this file or
    /// overlaps another nested file
    pub fn with_nested(mut self, file: HexFile) -> Result<Self> {
        if !self.span.contains_span(&file.span) {
            return Err(malformed_error!(
                "Nested file '{}' at {} lies outside file '{}' at {}",
                file.name,
                file.span,
                self.name,
                self.span
            ));
        }
        if let Some(existing) = self.nested.iter().find(|n| n.span.overlaps(&file.span)) {
            return Err(malformed_error!(
                "Nested file '{}' at {} overlaps '{}' at {}",
                file.name,
                file.span,
                existing.name,
                existing.span
            ));
        }

        let index = self
            .nested
            .partition_point(|existing| existing.span.start() < file.span.start());
        self.nested.insert(index, file);
        Ok(self)
    }

    /// The file name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bytes of the file
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Files directly nested in this one, ordered by position
    #[must_use]
    pub fn nested(&self) -> &[HexFile] {
        &self.nested
    }

    /// The file containing `position`.
    ///
    /// With `check_nested` the innermost nested file is returned, otherwise this file. Returns
    /// `None` if `position` lies outside this file.
    #[must_use]
    pub fn file_at(&self, position: Position, check_nested: bool) -> Option<&HexFile> {
        if !self.span.contains(position) {
            return None;
        }
        if check_nested {
            if let Some(nested) = self.nested_at(position) {
                return nested.file_at(position, true);
            }
        }

        Some(self)
    }

    /// The structure covering `position`.
    ///
    /// With `check_nested_files`, files nested in this one are asked first and this file's own
    /// containers are the fallback, so a nested file without structures at `position` does not
    /// hide a structure of this file.
    #[must_use]
    pub fn structure_at(
        &self,
        position: Position,
        check_nested_files: bool,
    ) -> Option<&dyn Structure> {
        if !self.span.contains(position) {
            return None;
        }
        if check_nested_files {
            if let Some(structure) = self
                .nested_at(position)
                .and_then(|nested| nested.structure_at(position, true))
            {
                return Some(structure);
            }
        }

        self.containers
            .iter()
            .filter(|container| container.span().contains(position))
            .find_map(|container| container.structure_at(position))
    }

    fn nested_at(&self, position: Position) -> Option<&HexFile> {
        let index = self
            .nested
            .partition_point(|nested| nested.span.end() <= position);
        self.nested
            .get(index)
            .filter(|nested| nested.span.contains(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{LeafField, LeafValue, StructureData};

    fn structure(name: &'static str, start: u64, end: u64) -> Box<dyn Structure> {
        let value = LeafField::new("Value", Span::new(start, end), LeafValue::Bytes(vec![]));
        Box::new(StructureData::new(name, vec![value.into()]).unwrap())
    }

    fn list(structures: Vec<Box<dyn Structure>>) -> Box<dyn StructureContainer> {
        let mut list = StructureList::new();
        for structure in structures {
            list.push(structure).unwrap();
        }
        Box::new(list)
    }

    #[test]
    fn structure_list() {
        let mut list = StructureList::new();
        list.push(structure("B", 10, 20)).unwrap();
        list.push(structure("A", 0, 4)).unwrap();
        assert!(list.push(structure("C", 15, 25)).is_err());

        assert_eq!(list.len(), 2);
        assert_eq!(list.span(), Span::new(0, 20));
        assert_eq!(list.structure_at(Position(2)).unwrap().name(), "A");
        assert_eq!(list.structure_at(Position(19)).unwrap().name(), "B");
        assert!(list.structure_at(Position(5)).is_none());
    }

    #[test]
    fn nested_bounds() {
        let outer = HexFile::new("outer", Span::new(0, 100));
        assert!(outer.with_nested(HexFile::new("inner", Span::new(90, 110))).is_err());

        let outer = HexFile::new("outer", Span::new(0, 100))
            .with_nested(HexFile::new("a", Span::new(10, 20)))
            .unwrap();
        assert!(outer.with_nested(HexFile::new("b", Span::new(15, 30))).is_err());

        let outer = HexFile::new("outer", Span::new(0, 100));
        assert!(outer.with_container(list(vec![structure("S", 95, 105)])).is_err());
    }

    #[test]
    fn file_at() {
        let file = HexFile::new("outer", Span::new(0, 100))
            .with_nested(
                HexFile::new("middle", Span::new(10, 50))
                    .with_nested(HexFile::new("inner", Span::new(20, 30)))
                    .unwrap(),
            )
            .unwrap();

        assert_eq!(file.file_at(Position(25), false).unwrap().name(), "outer");
        assert_eq!(file.file_at(Position(25), true).unwrap().name(), "inner");
        assert_eq!(file.file_at(Position(40), true).unwrap().name(), "middle");
        assert_eq!(file.file_at(Position(60), true).unwrap().name(), "outer");
        assert!(file.file_at(Position(100), true).is_none());
    }

    #[test]
    fn nested_file_does_not_hide_outer_structure() {
        // the nested file has no structure at 25, the outer one does
        let file = HexFile::new("outer", Span::new(0, 100))
            .with_container(list(vec![structure("Outer", 20, 40)]))
            .unwrap()
            .with_nested(
                HexFile::new("inner", Span::new(20, 30))
                    .with_container(list(vec![structure("Inner", 28, 30)]))
                    .unwrap(),
            )
            .unwrap();

        assert_eq!(file.structure_at(Position(25), true).unwrap().name(), "Outer");
        assert_eq!(file.structure_at(Position(29), true).unwrap().name(), "Inner");
        assert_eq!(file.structure_at(Position(29), false).unwrap().name(), "Outer");
        assert!(file.structure_at(Position(50), true).is_none());
    }
}
