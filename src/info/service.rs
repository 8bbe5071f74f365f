//! Resolution of positions to structures, fields and highlight groups.

use std::sync::{Arc, OnceLock};

use log::{debug, trace, warn};
use strum::{AsRefStr, Display};

use crate::{
    document::{Document, HexFile},
    info::{
        config::ServiceConfig,
        provider::{Payload, ProviderRegistration, StructureInfoProvider},
    },
    span::{Position, Span},
    structure::{CompositeData, Field, HexIndexes, LeafField, Structure},
};

/// How a highlighted span relates to the queried position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum FieldKind {
    /// The leaf field under the position
    CurrentField,
    /// A group of fields proposed by a provider
    SubStructure,
    /// The whole structure, when no provider proposed a grouping
    Structure,
}

/// One highlighted byte range
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldHighlight {
    /// The bytes to highlight
    pub span: Span,
    /// What the bytes are
    pub kind: FieldKind,
}

impl FieldHighlight {
    /// Creates a highlight
    #[must_use]
    pub fn new(span: Span, kind: FieldKind) -> Self {
        FieldHighlight { span, kind }
    }
}

/// The file and top-level structure a position resolved to
#[derive(Clone, Copy)]
pub struct ResolvedStructure<'a> {
    /// The outermost file containing the position
    pub file: &'a HexFile,
    /// The structure covering the position
    pub structure: &'a dyn Structure,
    /// The queried position
    pub position: Position,
}

/// Answers position queries over a [`Document`] with the help of format providers.
///
/// Providers are consulted in ascending `order`; for every question the first provider to
/// answer wins. The provider instances are created on first use and never change afterwards,
/// so a service can be shared between threads.
///
/// # Examples
///
/// ```rust
/// use heapscope::document::{Document, HexFile};
/// use heapscope::file::Buffer;
/// use heapscope::info::{FieldKind, StructureInfoService};
/// use heapscope::metadata::streams::{HeapReferences, StringsHeap};
/// use heapscope::{Position, Span};
///
/// let bytes = b"\0Hello\0".to_vec();
/// let heap = StringsHeap::parse(&bytes, Span::new(0, 7), &HeapReferences::new())?;
/// let file = HexFile::new("#Strings", Span::new(0, 7)).with_container(Box::new(heap))?;
/// let document = Document::new(Buffer::from_mem(bytes)?, vec![file])?;
///
/// let service = StructureInfoService::new(vec![]);
/// let fields = service.get_fields(&document, Position(3));
///
/// assert_eq!(fields[0].kind, FieldKind::CurrentField);
/// assert_eq!(fields[0].span, Span::new(1, 6));
/// assert_eq!(fields[1].kind, FieldKind::Structure);
/// assert_eq!(fields[1].span, Span::new(1, 7));
/// # Ok::<(), heapscope::Error>(())
/// ```
pub struct StructureInfoService {
    config: ServiceConfig,
    registrations: Vec<ProviderRegistration>,
    providers: OnceLock<Vec<Arc<dyn StructureInfoProvider>>>,
}

impl StructureInfoService {
    /// Creates a service with the default [`ServiceConfig`]
    #[must_use]
    pub fn new(registrations: Vec<ProviderRegistration>) -> Self {
        Self::with_config(registrations, ServiceConfig::default())
    }

    /// Creates a service with a custom configuration
    #[must_use]
    pub fn with_config(
        mut registrations: Vec<ProviderRegistration>,
        config: ServiceConfig,
    ) -> Self {
        registrations.sort_by_key(ProviderRegistration::order);
        StructureInfoService {
            config,
            registrations,
            providers: OnceLock::new(),
        }
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The registrations in the order they are consulted
    #[must_use]
    pub fn registrations(&self) -> &[ProviderRegistration] {
        &self.registrations
    }

    fn providers(&self) -> &[Arc<dyn StructureInfoProvider>] {
        self.providers.get_or_init(|| {
            let providers: Vec<_> = self
                .registrations
                .iter()
                .map(ProviderRegistration::instantiate)
                .collect();
            debug!(
                "Built {} structure info providers: {:?}",
                providers.len(),
                self.registrations
                    .iter()
                    .map(ProviderRegistration::name)
                    .collect::<Vec<_>>()
            );
            providers
        })
    }

    /// Finds the file and top-level structure covering `position`.
    ///
    /// The file is resolved without descending into nested files, then asked for its
    /// structure, which may come from a nested file when
    /// [`ServiceConfig::check_nested_files`] is set. A structure with an empty span is
    /// treated as absent.
    #[must_use]
    pub fn resolve<'a>(
        &self,
        document: &'a Document,
        position: Position,
    ) -> Option<ResolvedStructure<'a>> {
        let file = document.file_at(position, false)?;
        let structure = file.structure_at(position, self.config.check_nested_files)?;
        if structure.span().is_empty() {
            return None;
        }

        trace!(
            "{} resolved to {} at {} in '{}'",
            position,
            structure.name(),
            structure.span(),
            file.name()
        );
        Some(ResolvedStructure {
            file,
            structure,
            position,
        })
    }

    /// The highlight stream for `position`.
    ///
    /// The first entry is the [`FieldKind::CurrentField`] leaf under the position. It is
    /// followed either by the [`FieldKind::SubStructure`] groups of the first provider that
    /// proposed a valid grouping, or by a single [`FieldKind::Structure`] entry covering the
    /// whole structure. An empty list means there is no structure at `position`, or the
    /// position falls between the fields of the structure.
    #[must_use]
    pub fn get_fields(&self, document: &Document, position: Position) -> Vec<FieldHighlight> {
        let Some(resolved) = self.resolve(document, position) else {
            return Vec::new();
        };
        let Some(leaf) = self.current_field(resolved.structure, position) else {
            warn!(
                "No field under {} inside {} at {}",
                position,
                resolved.structure.name(),
                resolved.structure.span()
            );
            return Vec::new();
        };

        let mut highlights = vec![FieldHighlight::new(leaf.span(), FieldKind::CurrentField)];
        match self.sub_structures(&resolved) {
            Some(spans) => highlights.extend(
                spans
                    .into_iter()
                    .map(|span| FieldHighlight::new(span, FieldKind::SubStructure)),
            ),
            None => highlights.push(FieldHighlight::new(
                resolved.structure.span(),
                FieldKind::Structure,
            )),
        }

        highlights
    }

    /// The tooltip of the first provider that has one for `position`
    #[must_use]
    pub fn tooltip(&self, document: &Document, position: Position) -> Option<Payload> {
        let resolved = self.resolve(document, position)?;
        self.providers()
            .iter()
            .find_map(|provider| provider.tooltip(resolved.file, resolved.structure, position))
    }

    /// The reference of the first provider that has one for `position`
    #[must_use]
    pub fn reference(&self, document: &Document, position: Position) -> Option<Payload> {
        let resolved = self.resolve(document, position)?;
        self.providers()
            .iter()
            .find_map(|provider| provider.reference(resolved.file, resolved.structure, position))
    }

    /// Descends from `structure` to the leaf under `position`, at most `max_depth` composites deep
    fn current_field<'a>(
        &self,
        structure: &'a dyn Structure,
        position: Position,
    ) -> Option<&'a LeafField> {
        let mut field = structure.field_at(position)?;
        for _ in 0..=self.config.max_depth {
            match field {
                Field::Leaf(leaf) => return Some(leaf),
                Field::Composite(composite) => field = composite.field_at(position)?,
            }
        }

        warn!(
            "{} nests deeper than {} composites at {}",
            structure.name(),
            self.config.max_depth,
            position
        );
        None
    }

    /// The spans of the first valid grouping, `None` if no provider proposed one
    fn sub_structures(&self, resolved: &ResolvedStructure<'_>) -> Option<Vec<Span>> {
        let structure = resolved.structure;
        for (provider, registration) in self.providers().iter().zip(&self.registrations) {
            let Some(indexes) =
                provider.sub_structure_indexes(resolved.file, structure, resolved.position)
            else {
                continue;
            };

            if !HexIndexes::is_valid_set(&indexes, structure.field_count()) {
                warn!(
                    "Provider '{}' returned invalid indexes {:?} for {} with {} fields",
                    registration.name(),
                    indexes,
                    structure.name(),
                    structure.field_count()
                );
                debug_assert!(
                    !self.config.assert_invalid_indexes,
                    "provider '{}' returned invalid indexes {:?}",
                    registration.name(),
                    indexes
                );
                continue;
            }

            trace!("Provider '{}' grouped {:?}", registration.name(), indexes);
            if indexes.is_empty() {
                return Some(structure.fields().iter().map(Field::span).collect());
            }
            return Some(
                indexes
                    .iter()
                    .map(|range| range.merged_span(structure))
                    .collect(),
            );
        }

        None
    }
}
