//! Transport capability - abstraction over the messaging protocol session

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::errors::BotError;
use crate::domain::entities::InboundMessage;
use crate::domain::traits::store::CredentialState;

/// Connection phase reported by a transport, as seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connecting,
    Open,
    Close,
}

/// Reason attached to a close-phase connection update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Session credential was invalidated; re-pairing is required.
    LoggedOut,
    /// Server asked for a restart (normal after pairing).
    RestartRequired,
    ConnectionLost,
    Unknown,
}

/// Presence status for the liveness signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Available,
    Unavailable,
}

/// Events a connected transport emits to the supervisor.
#[derive(Debug)]
pub enum TransportEvent {
    /// A connection-state update. `connection` is absent on updates that
    /// carry no phase change (e.g. registration progress).
    ConnectionUpdate {
        connection: Option<Phase>,
        reason: Option<DisconnectReason>,
    },
    /// A batch of inbound messages, in wire order.
    MessageBatch(Vec<InboundMessage>),
    /// Credential state changed and should be persisted.
    CredsUpdate(CredentialState),
}

/// A live transport session handle.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, to: &str, text: &str) -> Result<(), BotError>;

    /// Request a pairing code for linking this session to an account.
    async fn request_pairing_code(&self, number: &str) -> Result<String, BotError>;

    async fn presence_update(&self, presence: Presence, to: &str) -> Result<(), BotError>;

    /// Whether the underlying credentials are already registered with the
    /// remote service.
    fn is_registered(&self) -> bool;

    async fn close(&self);
}

/// One connected session: the handle plus its event stream.
pub struct Session {
    pub transport: Arc<dyn Transport>,
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Creates a fresh transport session per generation. A reconnect goes
/// through here again; sessions are never resumed.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn connect(&self, creds: &CredentialState) -> Result<Session, BotError>;
}
