//! Command system - manifest, loader, registry

pub mod loader;
pub mod manifest;
pub mod registry;

pub use loader::{CommandUnit, LibraryLoader, LoadedUnit, UnitLoader};
pub use manifest::{Manifest, ManifestEntry, MANIFEST_FILE};
pub use registry::CommandRegistry;
