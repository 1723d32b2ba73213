//! Execution context handed to a command unit

use std::sync::Arc;

use crate::domain::entities::InboundMessage;
use crate::domain::traits::Transport;
use crate::infrastructure::commands::CommandRegistry;

/// Static bot identity fields shown to commands and the owner.
#[derive(Debug, Clone)]
pub struct BotIdentity {
    pub name: String,
    pub prefix: String,
    pub author: String,
    pub mode: String,
}

/// Per-message execution context, built fresh for every dispatched
/// command and dropped when it settles. Replies are the command's job,
/// through the transport handle carried here.
pub struct Context {
    pub transport: Arc<dyn Transport>,
    pub message: InboundMessage,
    /// Conversation the reply should go to.
    pub chat: String,
    /// Effective sender (group participant or the chat itself).
    pub sender: String,
    pub text: String,
    pub args: Vec<String>,
    pub identity: BotIdentity,
    /// Read-only view of the registry, for menu-style listing.
    pub commands: Arc<CommandRegistry>,
}
