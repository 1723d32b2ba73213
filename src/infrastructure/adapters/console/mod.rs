//! Console adapter for development/testing
//!
//! Stands in for a real protocol backend: stdin lines become one-message
//! batches, sends are printed, and the session reports open immediately.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::errors::BotError;
use crate::domain::entities::InboundMessage;
use crate::domain::traits::{
    CredentialState, DisconnectReason, NumberProvider, Phase, Presence, Session, Transport,
    TransportEvent, TransportFactory,
};

const CONSOLE_CHAT: &str = "console";

pub struct ConsoleTransport {
    closed: AtomicBool,
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send_text(&self, to: &str, text: &str) -> Result<(), BotError> {
        println!("[waru -> {}] {}", to, text);
        Ok(())
    }

    async fn request_pairing_code(&self, _number: &str) -> Result<String, BotError> {
        // Console sessions never need pairing.
        Ok("CONSOLE".to_string())
    }

    async fn presence_update(&self, presence: Presence, to: &str) -> Result<(), BotError> {
        tracing::debug!("Presence {:?} -> {}", presence, to);
        Ok(())
    }

    fn is_registered(&self) -> bool {
        true
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub struct ConsoleFactory;

#[async_trait]
impl TransportFactory for ConsoleFactory {
    async fn connect(&self, _creds: &CredentialState) -> Result<Session, BotError> {
        let transport = Arc::new(ConsoleTransport {
            closed: AtomicBool::new(false),
        });
        let (tx, rx) = mpsc::channel(32);

        tx.send(TransportEvent::ConnectionUpdate {
            connection: Some(Phase::Open),
            reason: None,
        })
        .await
        .map_err(|_| BotError::Transport("event channel closed".to_string()))?;

        let reader = Arc::clone(&transport);
        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let mut lines = tokio::io::AsyncBufReadExt::lines(tokio::io::BufReader::new(stdin));
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if !reader.closed.load(Ordering::SeqCst) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }
                        let msg = InboundMessage::from_text(CONSOLE_CHAT, line);
                        if tx.send(TransportEvent::MessageBatch(vec![msg])).await.is_err() {
                            break;
                        }
                    }
                    // EOF or an explicit close ends the console session
                    // for good.
                    _ => {
                        let _ = tx
                            .send(TransportEvent::ConnectionUpdate {
                                connection: Some(Phase::Close),
                                reason: Some(DisconnectReason::LoggedOut),
                            })
                            .await;
                        break;
                    }
                }
            }
        });

        Ok(Session { transport, events: rx })
    }
}

/// Interactive number prompt on the console.
pub struct ConsolePrompt;

#[async_trait]
impl NumberProvider for ConsolePrompt {
    async fn ask_number(&self) -> Option<String> {
        use std::io::Write;

        print!("Enter your phone number (example: +237679261475): ");
        std::io::stdout().flush().ok()?;

        let answer = tokio::task::spawn_blocking(|| {
            let mut input = String::new();
            std::io::stdin().read_line(&mut input).ok()?;
            Some(input.trim().to_string())
        })
        .await
        .ok()??;

        if answer.is_empty() {
            None
        } else {
            Some(answer)
        }
    }
}
