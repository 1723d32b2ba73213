//! Command unit contract and dynamic loading from shared libraries

use async_trait::async_trait;
use libloading::{Library, Symbol};
use std::path::Path;
use std::sync::Arc;

use crate::application::errors::{CommandError, RegistryError};
use crate::application::messaging::Context;

/// Function signature a command library must export as
/// `waru_command_init`. The returned pointer must come from
/// `Arc::into_raw`.
pub type CommandInitFn = extern "C" fn() -> *mut dyn CommandUnit;

/// Contract every command unit must satisfy. Identity is the declared
/// name; aliases are extra lookup keys pointing at the same instance.
#[async_trait]
pub trait CommandUnit: Send + Sync {
    fn name(&self) -> &str;

    fn aliases(&self) -> &[String] {
        &[]
    }

    /// Run the command. Side effects (replies) go through the transport
    /// in the context; the dispatcher only inspects the error.
    async fn execute(&self, ctx: Context) -> Result<(), CommandError>;
}

/// A unit pulled out of its backing source. The library handle is kept
/// alive for as long as the instance is cached.
pub struct LoadedUnit {
    pub unit: Arc<dyn CommandUnit>,
    #[allow(dead_code)]
    library: Option<Library>,
}

impl LoadedUnit {
    /// Wrap an already-constructed unit with no backing library. Used by
    /// in-process loaders and tests.
    pub fn from_instance(unit: Arc<dyn CommandUnit>) -> Self {
        Self {
            unit,
            library: None,
        }
    }
}

/// Instantiates a command unit from an on-disk source. Injectable so the
/// registry can be exercised without compiling shared libraries.
pub trait UnitLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<LoadedUnit, RegistryError>;
}

/// Default loader: opens the file as a shared library and calls its init
/// symbol.
pub struct LibraryLoader;

impl UnitLoader for LibraryLoader {
    fn load(&self, path: &Path) -> Result<LoadedUnit, RegistryError> {
        let library = unsafe {
            Library::new(path)
                .map_err(|e| RegistryError::Load(format!("Failed to load library: {}", e)))?
        };

        let init_fn: Symbol<CommandInitFn> = unsafe {
            library
                .get(b"waru_command_init")
                .map_err(|e| RegistryError::Load(format!("Failed to find init function: {}", e)))?
        };

        let unit = unsafe {
            let ptr = init_fn();
            if ptr.is_null() {
                return Err(RegistryError::Malformed("init returned null".to_string()));
            }
            Arc::from_raw(ptr)
        };

        Ok(LoadedUnit {
            unit,
            library: Some(library),
        })
    }
}
