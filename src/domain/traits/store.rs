//! Credential persistence and interactive setup capabilities

use async_trait::async_trait;
use std::collections::HashMap;

use crate::application::errors::StorageError;

/// Multi-part authentication state, opaque to the core. Keys map to the
/// files the store keeps on disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialState {
    pub entries: HashMap<String, serde_json::Value>,
}

impl CredentialState {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Persists and retrieves the transport's authentication state.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> Result<CredentialState, StorageError>;
    async fn save(&self, state: &CredentialState) -> Result<(), StorageError>;
}

/// Supplies the operator's phone number when configuration has none.
/// Injectable so tests never block on a console prompt.
#[async_trait]
pub trait NumberProvider: Send + Sync {
    /// Ask once; `None` means no usable answer was obtained.
    async fn ask_number(&self) -> Option<String>;
}
