//! Domain traits - capability seams to external collaborators

pub mod store;
pub mod transport;

pub use store::{CredentialState, CredentialStore, NumberProvider};
pub use transport::{
    DisconnectReason, Phase, Presence, Session, Transport, TransportEvent, TransportFactory,
};
