//! Dispatch pipeline - routes inbound batches to command units

use std::sync::Arc;
use std::time::Duration;

use super::context::{BotIdentity, Context};
use super::parser;
use crate::domain::entities::InboundMessage;
use crate::domain::traits::Transport;
use crate::infrastructure::commands::CommandRegistry;

/// Routes each message of an inbound batch through filter, parse,
/// resolve, and timeout-guarded execution. All per-message faults stop at
/// this boundary.
pub struct MessageDispatcher {
    registry: Arc<CommandRegistry>,
    identity: BotIdentity,
    timeout: Duration,
    /// Self-issued commands are a supported control path; when false,
    /// messages from the bot's own account are dropped instead.
    allow_self: bool,
}

impl MessageDispatcher {
    pub fn new(
        registry: Arc<CommandRegistry>,
        identity: BotIdentity,
        timeout: Duration,
        allow_self: bool,
    ) -> Self {
        Self {
            registry,
            identity,
            timeout,
            allow_self,
        }
    }

    /// Process one batch sequentially, in array order. One message's
    /// fault never blocks or skips the next.
    pub async fn dispatch_batch(&self, transport: &Arc<dyn Transport>, batch: &[InboundMessage]) {
        for message in batch {
            self.dispatch_one(transport, message).await;
        }
    }

    async fn dispatch_one(&self, transport: &Arc<dyn Transport>, message: &InboundMessage) {
        let Some(key) = &message.key else {
            return;
        };
        if message.is_broadcast() {
            return;
        }
        if key.from_self && !self.allow_self {
            return;
        }

        let text = parser::extract_text(&message.content);
        if text.is_empty() {
            return;
        }
        let Some(invocation) = parser::parse_invocation(&text, &self.identity.prefix) else {
            return;
        };

        let Some(unit) = self.registry.resolve(&invocation.name) else {
            tracing::debug!("No command for '{}'", invocation.name);
            return;
        };

        let ctx = Context {
            transport: Arc::clone(transport),
            chat: key.chat.clone(),
            sender: key.sender().to_string(),
            message: message.clone(),
            text,
            args: invocation.args,
            identity: self.identity.clone(),
            commands: Arc::clone(&self.registry),
        };

        // On elapse the unit's future is dropped, cancelling it at its
        // next await point.
        match tokio::time::timeout(self.timeout, unit.execute(ctx)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!("Command '{}' failed: {}", invocation.name, e);
            }
            Err(_) => {
                tracing::error!(
                    "Command '{}' timed out after {}ms",
                    invocation.name,
                    self.timeout.as_millis()
                );
            }
        }
    }
}
