//! Push-channel connection manager.
//!
//! State machine:
//! - `Disconnected --start--> Connecting`
//! - `Connecting --ok--> Connected`, `--fail--> Reconnecting(1)`
//! - `Connected --drop--> Reconnecting(1)`; a connection silent for longer
//!   than [`PUSH_IDLE_TIMEOUT`] counts as dropped
//! - `Reconnecting(n) --ok--> Connected` (attempts reset)
//! - `Reconnecting(n<10) --fail--> Reconnecting(n+1)`
//! - `Reconnecting(10) --fail--> Exhausted` (terminal)

use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use stagecast_types::{
    CandidateUpdate, ConnectionEvent, ConnectionState, ConnectionStatus, SourceChannel, SyncError,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::{PushMessage, PushStream, PushTransport};
use crate::credential::CredentialStore;
use crate::events::EventSink;
use crate::liveness::LivenessTracker;
use crate::policy::{self, MAX_RECONNECT_ATTEMPTS, PUSH_IDLE_TIMEOUT};
use crate::reconcile;
use crate::shutdown::ShutdownSignal;

enum PumpOutcome {
    Dropped,
    Shutdown,
}

/// Owns the single push connection and its reconnection schedule.
pub struct ConnectionManager {
    transport: Arc<dyn PushTransport>,
    url: String,
    credentials: Arc<CredentialStore>,
    candidates: mpsc::Sender<CandidateUpdate>,
    events: EventSink,
    status: watch::Sender<ConnectionStatus>,
    liveness: Arc<LivenessTracker>,
    state: ConnectionState,
}

impl ConnectionManager {
    pub fn new(
        transport: Arc<dyn PushTransport>,
        url: impl Into<String>,
        credentials: Arc<CredentialStore>,
        candidates: mpsc::Sender<CandidateUpdate>,
        events: EventSink,
        status: watch::Sender<ConnectionStatus>,
        liveness: Arc<LivenessTracker>,
    ) -> Self {
        Self {
            transport,
            url: url.into(),
            credentials,
            candidates,
            events,
            status,
            liveness,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn spawn(self, shutdown: ShutdownSignal) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(mut self, mut shutdown: ShutdownSignal) {
        self.transition(ConnectionState::Connecting, 0);

        let mut live = tokio::select! {
            result = self.attempt(0) => result,
            () = shutdown.cancelled() => None,
        };

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            if let Some(stream) = live.take() {
                self.transition(ConnectionState::Connected, 0);
                match self.pump(stream, &mut shutdown).await {
                    PumpOutcome::Shutdown => break,
                    PumpOutcome::Dropped => {
                        tracing::warn!("[Push] Connection dropped");
                    },
                }
            }

            match self.reconnect(&mut shutdown).await {
                Some(stream) => live = Some(stream),
                None => break,
            }
        }

        if !self.state.is_terminal() {
            self.transition(ConnectionState::Disconnected, 0);
        }
        tracing::info!("[Push] Connection manager stopped ({})", self.state);
    }

    /// Walk the bounded backoff schedule. `None` on exhaustion or shutdown.
    async fn reconnect(&mut self, shutdown: &mut ShutdownSignal) -> Option<PushStream> {
        for attempt in 1..=MAX_RECONNECT_ATTEMPTS {
            let delay = policy::backoff_delay(attempt);
            let next_attempt_at = Utc::now()
                + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
            self.transition(ConnectionState::Reconnecting { attempt, next_attempt_at }, attempt);
            tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "[Push] Reconnect scheduled");

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = shutdown.cancelled() => return None,
            }

            let result = tokio::select! {
                result = self.attempt(attempt) => result,
                () = shutdown.cancelled() => return None,
            };
            if result.is_some() {
                return result;
            }
        }

        self.transition(ConnectionState::Exhausted, MAX_RECONNECT_ATTEMPTS);
        tracing::error!(
            attempts = MAX_RECONNECT_ATTEMPTS,
            "[Push] Reconnect budget exhausted; continuing on fallback only"
        );
        self.events.error(SyncError::PushExhausted { attempts: MAX_RECONNECT_ATTEMPTS });
        self.liveness.push_exhausted();
        None
    }

    /// One connect using whatever token is current right now.
    async fn attempt(&self, attempt: u32) -> Option<PushStream> {
        let token = self.credentials.token();
        match self.transport.connect(&self.url, &token).await {
            Ok(stream) => {
                tracing::info!(attempt, "[Push] Connected to {}", self.url);
                Some(stream)
            },
            Err(e) => {
                tracing::warn!(attempt, "[Push] Connect failed: {}", e);
                self.events.error(SyncError::PushConnectFailed { attempt, message: e.to_string() });
                None
            },
        }
    }

    /// Forward state frames as candidates until the connection drops or goes
    /// silent. Any frame, heartbeats included, restarts the idle timer.
    async fn pump(&self, mut stream: PushStream, shutdown: &mut ShutdownSignal) -> PumpOutcome {
        loop {
            let next = tokio::select! {
                next = tokio::time::timeout(PUSH_IDLE_TIMEOUT, stream.next()) => next,
                () = shutdown.cancelled() => return PumpOutcome::Shutdown,
            };
            let Ok(item) = next else {
                tracing::warn!(
                    idle_secs = PUSH_IDLE_TIMEOUT.as_secs(),
                    "[Push] No frames within idle timeout, treating connection as dropped"
                );
                return PumpOutcome::Dropped;
            };

            match item {
                Some(Ok(PushMessage::State { snapshot, version })) => {
                    let update = reconcile::stamp(SourceChannel::Push, snapshot, version);
                    if self.candidates.send(update).await.is_err() {
                        tracing::debug!("[Push] Reconciler gone, stopping");
                        return PumpOutcome::Shutdown;
                    }
                },
                Some(Ok(PushMessage::Heartbeat)) => {
                    tracing::trace!("[Push] Heartbeat");
                },
                Some(Err(e)) if !e.is_disconnect() => {
                    tracing::warn!("[Push] Dropping undecodable frame: {}", e);
                    self.events.error(SyncError::MalformedCandidate {
                        channel: SourceChannel::Push,
                        reason: e.to_string(),
                    });
                },
                Some(Err(e)) => {
                    tracing::warn!("[Push] Stream error: {}", e);
                    return PumpOutcome::Dropped;
                },
                None => return PumpOutcome::Dropped,
            }
        }
    }

    fn transition(&mut self, state: ConnectionState, attempt_count: u32) {
        tracing::debug!(attempt_count, "[Push] {} -> {}", self.state, state);
        self.state = state.clone();

        let event = ConnectionEvent { state, attempt_count };
        self.status.send_replace(ConnectionStatus::from_event(&event, MAX_RECONNECT_ATTEMPTS));
        self.events.connection(event);
    }
}

/// Initial status before any connect attempt.
pub(crate) fn initial_status() -> ConnectionStatus {
    ConnectionStatus { connected: false, attempt: 0, max_attempts: MAX_RECONNECT_ATTEMPTS }
}
