//! Domain entities

pub mod identity;
pub mod message;

pub use identity::{sanitize_phone, OwnerIdentity};
pub use message::{Content, InboundMessage, MessageKey, STATUS_BROADCAST};
