//! Format providers consulted for groupings, tooltips and references.

use std::{any::Any, borrow::Cow, fmt, sync::Arc};

use crate::{
    document::HexFile,
    span::Position,
    structure::{HexIndexes, Structure},
};

/// An opaque, format-defined value handed back to the caller unchanged.
///
/// Providers choose the concrete type; callers downcast, e.g.
/// `payload.downcast_ref::<String>()`.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// A format-specific source of hints about structures.
///
/// Every method receives the file the position resolved to, the top-level structure at the
/// position and the position itself. Returning `None` declines and lets the next provider
/// answer. All methods decline by default.
pub trait StructureInfoProvider: Send + Sync {
    /// Groups of direct children of `structure` to highlight together.
    ///
    /// An empty list highlights every direct child on its own. A non-empty list must satisfy
    /// [`HexIndexes::is_valid_set`], an invalid list is ignored.
    fn sub_structure_indexes(
        &self,
        _file: &HexFile,
        _structure: &dyn Structure,
        _position: Position,
    ) -> Option<Vec<HexIndexes>> {
        None
    }

    /// A tooltip for the position
    fn tooltip(
        &self,
        _file: &HexFile,
        _structure: &dyn Structure,
        _position: Position,
    ) -> Option<Payload> {
        None
    }

    /// The entity the position refers to
    fn reference(
        &self,
        _file: &HexFile,
        _structure: &dyn Structure,
        _position: Position,
    ) -> Option<Payload> {
        None
    }
}

/// Constructor for a provider
pub type ProviderFactory = Box<dyn Fn() -> Arc<dyn StructureInfoProvider> + Send + Sync>;

/// A provider as supplied by the composition layer: a name, a priority and a factory.
///
/// Lower `order` is consulted first, equal orders keep their registration order.
pub struct ProviderRegistration {
    name: Cow<'static, str>,
    order: i32,
    factory: ProviderFactory,
}

impl ProviderRegistration {
    /// Registers a provider built lazily by `factory`
    pub fn new<F>(name: impl Into<Cow<'static, str>>, order: i32, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn StructureInfoProvider> + Send + Sync + 'static,
    {
        ProviderRegistration {
            name: name.into(),
            order,
            factory: Box::new(factory),
        }
    }

    /// Registers an already built provider
    pub fn with_instance(
        name: impl Into<Cow<'static, str>>,
        order: i32,
        provider: Arc<dyn StructureInfoProvider>,
    ) -> Self {
        Self::new(name, order, move || provider.clone())
    }

    /// The provider name, used in log messages
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The priority, lower is consulted first
    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    pub(crate) fn instantiate(&self) -> Arc<dyn StructureInfoProvider> {
        (self.factory)()
    }
}

impl fmt::Debug for ProviderRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistration")
            .field("name", &self.name)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}
