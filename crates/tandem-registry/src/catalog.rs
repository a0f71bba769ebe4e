//! Unit resolution and instantiation.
//!
//! [`UnitSource`] is the capability a chain needs from the outside world:
//! "find the descriptor for this id" and "create an instance of it".
//! [`UnitCatalog`] is the in-process implementation backed by registered
//! factories.

use crate::builtin;
use crate::descriptor::{IdScheme, UnitDescriptor};
use tandem_core::ProcessingUnit;

/// An owned, sendable unit instance.
pub type BoxedUnit = Box<dyn ProcessingUnit + Send>;

/// Factory creating a unit for a sample rate and maximum block size.
pub type UnitFactory = Box<dyn Fn(f64, usize) -> Result<BoxedUnit, String> + Send + Sync>;

/// Resolves ids and creates unit instances.
pub trait UnitSource: Send + Sync {
    /// Resolve `id` under `scheme`.
    ///
    /// Resolution order: exact id under the scheme, then the alternate
    /// identifier string, then the file path or format identifier.
    fn find_descriptor(&self, id: &str, scheme: IdScheme) -> Option<UnitDescriptor>;

    /// Create an instance for `descriptor`.
    ///
    /// Errors carry a human-readable reason.
    fn instantiate(
        &self,
        descriptor: &UnitDescriptor,
        sample_rate: f64,
        block_size: usize,
    ) -> Result<BoxedUnit, String>;

    /// Every descriptor this source knows about.
    fn descriptors(&self) -> Vec<UnitDescriptor>;
}

struct CatalogEntry {
    descriptor: UnitDescriptor,
    factory: Option<UnitFactory>,
}

/// Catalog of known units and their factories.
///
/// # Example
///
/// ```rust
/// use tandem_registry::{IdScheme, UnitCatalog, UnitSource};
///
/// let catalog = UnitCatalog::with_builtins();
/// let desc = catalog.find_descriptor("builtin:gain", IdScheme::Native).unwrap();
/// let unit = catalog.instantiate(&desc, 48000.0, 512).unwrap();
/// assert_eq!(unit.name(), "Gain");
/// ```
#[derive(Default)]
pub struct UnitCatalog {
    entries: Vec<CatalogEntry>,
}

impl UnitCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the built-in reference units registered.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        builtin::register_all(&mut catalog);
        catalog
    }

    /// Register a unit with its factory.
    pub fn register<F>(&mut self, descriptor: UnitDescriptor, factory: F)
    where
        F: Fn(f64, usize) -> Result<BoxedUnit, String> + Send + Sync + 'static,
    {
        self.entries.push(CatalogEntry {
            descriptor,
            factory: Some(Box::new(factory)),
        });
    }

    /// Register a descriptor that cannot be instantiated in this process
    /// (e.g. a scanned binary whose format has no loader).
    pub fn register_descriptor(&mut self, descriptor: UnitDescriptor) {
        self.entries.push(CatalogEntry {
            descriptor,
            factory: None,
        });
    }

    /// Iterate over all registered descriptors.
    pub fn iter(&self) -> impl Iterator<Item = &UnitDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    /// Resolve `id` without cloning.
    pub fn get(&self, id: &str, scheme: IdScheme) -> Option<&UnitDescriptor> {
        self.iter()
            .find(|d| d.plugin_id(scheme) == id)
            .or_else(|| self.iter().find(|d| d.identifier_string() == id))
            .or_else(|| self.iter().find(|d| d.file_or_identifier == id))
    }

    /// Number of registered units.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl UnitSource for UnitCatalog {
    fn find_descriptor(&self, id: &str, scheme: IdScheme) -> Option<UnitDescriptor> {
        self.get(id, scheme).cloned()
    }

    fn instantiate(
        &self,
        descriptor: &UnitDescriptor,
        sample_rate: f64,
        block_size: usize,
    ) -> Result<BoxedUnit, String> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.descriptor == *descriptor)
            .ok_or_else(|| format!("{} is not in the catalog", descriptor.name))?;
        let factory = entry
            .factory
            .as_ref()
            .ok_or_else(|| format!("no loader for format {}", descriptor.format))?;
        factory(sample_rate, block_size)
    }

    fn descriptors(&self) -> Vec<UnitDescriptor> {
        self.iter().cloned().collect()
    }
}
