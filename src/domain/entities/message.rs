use chrono::{DateTime, Utc};

/// Chat id of the status/broadcast channel. Messages addressed here are
/// never dispatched.
pub const STATUS_BROADCAST: &str = "status@broadcast";

/// Routing key of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageKey {
    /// Conversation the message belongs to (user or group jid).
    pub chat: String,
    /// Sending participant inside a group chat, if any.
    pub participant: Option<String>,
    /// Whether the message originates from the bot's own account.
    pub from_self: bool,
}

impl MessageKey {
    pub fn new(chat: impl Into<String>) -> Self {
        Self {
            chat: chat.into(),
            participant: None,
            from_self: false,
        }
    }

    pub fn with_participant(mut self, participant: impl Into<String>) -> Self {
        self.participant = Some(participant.into());
        self
    }

    pub fn from_self(mut self, from_self: bool) -> Self {
        self.from_self = from_self;
        self
    }

    /// Effective sender id: the participant in a group, the chat otherwise.
    pub fn sender(&self) -> &str {
        self.participant.as_deref().unwrap_or(&self.chat)
    }
}

/// Message content union. Transports map their wire formats onto this;
/// the dispatcher only ever reads text out of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    /// Quoted/linked text body (extended text on the wire).
    ExtendedText(String),
    Image { caption: Option<String> },
    Video { caption: Option<String> },
    Document { caption: Option<String> },
    Other,
}

/// An inbound message envelope as delivered by a transport.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub id: String,
    /// Absent on keyless protocol notifications; such messages are dropped.
    pub key: Option<MessageKey>,
    pub content: Content,
    pub timestamp: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(key: MessageKey, content: Content) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            key: Some(key),
            content,
            timestamp: Utc::now(),
        }
    }

    pub fn from_text(chat: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(MessageKey::new(chat), Content::Text(text.into()))
    }

    /// A keyless envelope, as some protocol-level notifications arrive.
    pub fn keyless(content: Content) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            key: None,
            content,
            timestamp: Utc::now(),
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.key
            .as_ref()
            .map(|k| k.chat == STATUS_BROADCAST)
            .unwrap_or(false)
    }
}
