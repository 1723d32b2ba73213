//! Connection supervisor - session lifecycle state machine

use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::BotError;
use crate::application::messaging::{BotIdentity, MessageDispatcher};
use crate::domain::entities::{sanitize_phone, OwnerIdentity};
use crate::domain::traits::{
    CredentialStore, DisconnectReason, NumberProvider, Phase, Presence, Session, Transport,
    TransportEvent, TransportFactory,
};
use crate::infrastructure::config::Config;

/// Low-frequency presence signal sent while the session is open.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(50);
/// Fixed delay before a transient disconnect is retried.
pub const RECONNECT_BACKOFF: Duration = Duration::from_millis(1200);
/// Settle delay before requesting a pairing code.
const PAIRING_SETTLE: Duration = Duration::from_secs(2);

/// Connection state, owned exclusively by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed(DisconnectReason),
    LoggedOut,
}

/// How one session generation ended.
enum SessionEnd {
    LoggedOut,
    Reconnect,
}

/// Owns the transport session across its whole lifecycle: connect,
/// pairing, liveness, disconnect classification, and full rebuild on
/// recoverable failure.
pub struct SessionSupervisor {
    identity: BotIdentity,
    owner: Option<OwnerIdentity>,
    configured_number: String,
    factory: Arc<dyn TransportFactory>,
    store: Arc<dyn CredentialStore>,
    numbers: Arc<dyn NumberProvider>,
    dispatcher: MessageDispatcher,
    state: ConnectionState,
    pairing_requested: bool,
    /// Sanitized pairing number, cached for the process lifetime.
    pairing_number: Option<String>,
    keepalive: Option<tokio::task::JoinHandle<()>>,
}

impl SessionSupervisor {
    pub fn new(
        config: &Config,
        factory: Arc<dyn TransportFactory>,
        store: Arc<dyn CredentialStore>,
        numbers: Arc<dyn NumberProvider>,
        dispatcher: MessageDispatcher,
    ) -> Self {
        let configured_number = if config.owner.phone_number.trim().is_empty() {
            config.owner.owner_number.clone()
        } else {
            config.owner.phone_number.clone()
        };

        Self {
            identity: config.identity(),
            owner: OwnerIdentity::new(config.owner_number()),
            configured_number,
            factory,
            store,
            numbers,
            dispatcher,
            state: ConnectionState::Connecting,
            pairing_requested: false,
            pairing_number: None,
            keepalive: None,
        }
    }

    /// Run session generations until a terminal logout. Only a fatal
    /// configuration problem (no usable pairing number) errors out.
    pub async fn run(&mut self) -> Result<(), BotError> {
        loop {
            match self.run_session().await? {
                SessionEnd::LoggedOut => {
                    tracing::info!("Logged out. Delete the auth directory and re-pair.");
                    return Ok(());
                }
                SessionEnd::Reconnect => {
                    tracing::info!("Restarting session in {}ms", RECONNECT_BACKOFF.as_millis());
                    tokio::time::sleep(RECONNECT_BACKOFF).await;
                }
            }
        }
    }

    /// One session generation: fresh transport, fresh event wiring. A
    /// restart is a full re-bootstrap, never a resume.
    async fn run_session(&mut self) -> Result<SessionEnd, BotError> {
        self.stop_keepalive();
        self.state = ConnectionState::Connecting;
        self.pairing_requested = false;

        let creds = match self.store.load().await {
            Ok(creds) => creds,
            Err(e) => {
                tracing::warn!("Credential load failed, starting unregistered: {}", e);
                Default::default()
            }
        };

        let Session {
            transport,
            mut events,
        } = match self.factory.connect(&creds).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Connect failed: {}", e);
                return Ok(SessionEnd::Reconnect);
            }
        };

        while let Some(event) = events.recv().await {
            match event {
                TransportEvent::ConnectionUpdate { connection, reason } => {
                    match connection {
                        Some(Phase::Open) => {
                            self.state = ConnectionState::Open;
                            self.pairing_requested = false;
                            tracing::info!("Connected");
                            self.start_keepalive(&transport);
                            self.notify_owner_connected(&transport).await;
                        }
                        Some(Phase::Close) => {
                            let reason = reason.unwrap_or(DisconnectReason::Unknown);
                            tracing::warn!("Disconnected: {:?}", reason);
                            self.teardown(&transport).await;
                            if reason == DisconnectReason::LoggedOut {
                                self.state = ConnectionState::LoggedOut;
                                return Ok(SessionEnd::LoggedOut);
                            }
                            self.state = ConnectionState::Closed(reason);
                            return Ok(SessionEnd::Reconnect);
                        }
                        _ => {
                            if !transport.is_registered() && !self.pairing_requested {
                                self.request_pairing(&transport).await?;
                            }
                        }
                    }
                }
                TransportEvent::MessageBatch(batch) => {
                    self.dispatcher.dispatch_batch(&transport, &batch).await;
                }
                TransportEvent::CredsUpdate(state) => {
                    if let Err(e) = self.store.save(&state).await {
                        tracing::warn!("Credential save failed: {}", e);
                    }
                }
            }
        }

        // Event stream ended without a close update; treat it like a
        // transient disconnect.
        self.teardown(&transport).await;
        self.state = ConnectionState::Closed(DisconnectReason::ConnectionLost);
        Ok(SessionEnd::Reconnect)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Pairing sub-flow, guarded so one session attempt requests at most
    /// one code. A failed request clears the guard for the next update.
    async fn request_pairing(&mut self, transport: &Arc<dyn Transport>) -> Result<(), BotError> {
        let number = self.pairing_number().await?;
        self.pairing_requested = true;

        println!("\n{} not linked yet.", self.identity.name);
        println!("Generating pairing code...");
        tokio::time::sleep(PAIRING_SETTLE).await;

        match transport.request_pairing_code(&number).await {
            Ok(code) => {
                println!("\nPairing code: {}", code);
                println!("Open the app -> Linked devices -> Link with phone number -> enter this code.");
                println!("A restart-required disconnect right after entering the code is normal.\n");
            }
            Err(e) => {
                self.pairing_requested = false;
                tracing::error!("Pairing code request failed: {}", e);
            }
        }
        Ok(())
    }

    /// Resolve the pairing number once: configuration first, interactive
    /// prompt otherwise. No usable number is fatal.
    async fn pairing_number(&mut self) -> Result<String, BotError> {
        if let Some(number) = &self.pairing_number {
            return Ok(number.clone());
        }

        let mut digits = sanitize_phone(&self.configured_number);
        if digits.is_empty() {
            let raw = self.numbers.ask_number().await.unwrap_or_default();
            digits = sanitize_phone(&raw);
        }
        if digits.is_empty() {
            return Err(BotError::Config(
                "No usable phone number for pairing".to_string(),
            ));
        }

        self.pairing_number = Some(digits.clone());
        Ok(digits)
    }

    fn start_keepalive(&mut self, transport: &Arc<dyn Transport>) {
        if self.keepalive.is_some() {
            return;
        }
        let Some(jid) = self.owner.as_ref().map(OwnerIdentity::jid) else {
            return;
        };

        let transport = Arc::clone(transport);
        self.keepalive = Some(tokio::spawn(async move {
            let mut tick = tokio::time::interval(KEEPALIVE_INTERVAL);
            tick.tick().await;
            loop {
                tick.tick().await;
                if let Err(e) = transport.presence_update(Presence::Available, &jid).await {
                    tracing::debug!("Keepalive presence failed: {}", e);
                }
            }
        }));
    }

    fn stop_keepalive(&mut self) {
        if let Some(handle) = self.keepalive.take() {
            handle.abort();
        }
    }

    /// One-time connect notification to the owner, sent best-effort.
    async fn notify_owner_connected(&self, transport: &Arc<dyn Transport>) {
        let Some(owner) = &self.owner else {
            return;
        };
        let text = format!(
            "*CONNECTED*\n\n*Bot:* *{}*\n*Prefix:* {}\n*Author:* *{}*\n*Mode:* {}\n*Time:* {}",
            self.identity.name,
            self.identity.prefix,
            self.identity.author,
            self.identity.mode,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        );
        if let Err(e) = transport.send_text(&owner.jid(), &text).await {
            tracing::debug!("Owner notify failed: {}", e);
        }
    }

    /// Tear down all session resources. The event receiver is dropped by
    /// the caller when the generation ends, detaching all listeners.
    async fn teardown(&mut self, transport: &Arc<dyn Transport>) {
        self.stop_keepalive();
        transport.close().await;
    }
}
