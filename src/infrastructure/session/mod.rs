//! Session orchestration

pub mod supervisor;

pub use supervisor::{ConnectionState, SessionSupervisor, KEEPALIVE_INTERVAL, RECONNECT_BACKOFF};

use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::BotError;
use crate::application::messaging::MessageDispatcher;
use crate::domain::traits::{CredentialStore, NumberProvider, TransportFactory};
use crate::infrastructure::commands::{CommandRegistry, UnitLoader};
use crate::infrastructure::config::Config;

/// Interval for the optional background manifest refresh.
pub const MANIFEST_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Composes registry, dispatcher, and supervisor, and owns the
/// process-wide background handles. Single-writer: only this value and
/// its supervisor create or destroy session resources.
pub struct BotRuntime {
    registry: Arc<CommandRegistry>,
    supervisor: SessionSupervisor,
    auto_reload: bool,
}

impl BotRuntime {
    pub fn new(
        config: &Config,
        factory: Arc<dyn TransportFactory>,
        store: Arc<dyn CredentialStore>,
        numbers: Arc<dyn NumberProvider>,
        loader: Arc<dyn UnitLoader>,
    ) -> Self {
        let registry = Arc::new(CommandRegistry::new(&config.commands.directory, loader));
        let dispatcher = MessageDispatcher::new(
            Arc::clone(&registry),
            config.identity(),
            config.command_timeout(),
            config.owner.allow_self,
        );
        let supervisor = SessionSupervisor::new(config, factory, store, numbers, dispatcher);

        Self {
            registry,
            supervisor,
            auto_reload: config.commands.auto_reload,
        }
    }

    /// Initialize the registry once, then run session generations until a
    /// terminal logout (or a fatal configuration error).
    pub async fn start(&mut self) -> Result<(), BotError> {
        self.registry.load_manifest();
        self.registry.preload_all();
        if self.auto_reload {
            self.registry
                .spawn_manifest_refresh(MANIFEST_REFRESH_INTERVAL);
        }

        let result = self.supervisor.run().await;
        self.registry.stop_manifest_refresh();
        result
    }
}
