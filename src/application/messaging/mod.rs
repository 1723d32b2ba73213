//! Messaging pipeline - parsing and dispatch

pub mod context;
pub mod dispatcher;
pub mod parser;

pub use context::{BotIdentity, Context};
pub use dispatcher::MessageDispatcher;
pub use parser::{extract_text, parse_invocation, Invocation};
