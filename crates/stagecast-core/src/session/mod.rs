//! Session wiring: one start, one teardown.
//!
//! Start order matters. The reconciler and the fallback listener come up
//! first and need no credential, so the display receives state even while
//! the issuer is unreachable. The credential is then bootstrapped (retried
//! until it succeeds) and only after that do the refresh scheduler and the
//! push connection manager start.

use std::sync::Arc;
use std::time::Duration;

use stagecast_types::{
    AuthoritativeState, CandidateUpdate, ConnectionStatus, Credential, SessionEvent, SyncConfig,
    SyncError,
};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use crate::credential::{CredentialIssuer, CredentialStore, RefreshScheduler};
use crate::events::EventSink;
use crate::fallback::{FallbackDocumentStore, FallbackListener};
use crate::liveness::LivenessTracker;
use crate::policy::CANDIDATE_QUEUE_CAPACITY;
use crate::push::{initial_status, ConnectionManager, PushTransport};
use crate::reconcile::{Counters, ReconcileStats, Reconciler};
use crate::shutdown::{ShutdownSignal, ShutdownTrigger};

/// Per-session parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub identity: String,
    pub push_url: String,
    pub document_id: String,
    pub fallback_retry: Duration,
    pub bootstrap_retry: Duration,
}

impl SessionSettings {
    /// Take endpoints and cadences from `config`; `identity` is already resolved.
    pub fn from_config(config: &SyncConfig, identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            push_url: config.push_url.clone(),
            document_id: config.document_id.clone(),
            fallback_retry: Duration::from_secs(config.fallback_retry_secs),
            bootstrap_retry: Duration::from_secs(config.bootstrap_retry_secs),
        }
    }
}

/// External systems the session talks to.
#[derive(Clone)]
pub struct SessionCollaborators {
    pub issuer: Arc<dyn CredentialIssuer>,
    pub push: Arc<dyn PushTransport>,
    pub fallback: Arc<dyn FallbackDocumentStore>,
}

/// A running sync session.
pub struct SyncSession {
    trigger: ShutdownTrigger,
    fallback: FallbackListener,
    reconciler: JoinHandle<()>,
    bootstrap: JoinHandle<()>,
    state: watch::Receiver<Option<Arc<AuthoritativeState>>>,
    status: watch::Receiver<ConnectionStatus>,
    credentials: watch::Receiver<Option<Arc<CredentialStore>>>,
    events: EventSink,
    counters: Arc<Counters>,
}

impl SyncSession {
    /// Start every component. The returned receiver is subscribed before any
    /// task runs, so it sees the session's first event.
    pub fn start(
        settings: SessionSettings,
        collaborators: SessionCollaborators,
    ) -> (Self, broadcast::Receiver<SessionEvent>) {
        let events = EventSink::new();
        let first_events = events.subscribe();
        let trigger = ShutdownTrigger::new();
        let liveness = Arc::new(LivenessTracker::new(events.clone()));

        let (candidates_tx, candidates_rx) = mpsc::channel(CANDIDATE_QUEUE_CAPACITY);
        let (state_tx, state) = watch::channel(None);
        let (status_tx, status) = watch::channel(initial_status());
        let (credentials_tx, credentials) = watch::channel(None);

        let reconciler = Reconciler::new(candidates_rx, state_tx, events.clone());
        let counters = reconciler.counters();
        let reconciler = reconciler.spawn(trigger.signal());

        let mut fallback = FallbackListener::new(
            collaborators.fallback,
            settings.document_id.clone(),
            settings.fallback_retry,
            candidates_tx.clone(),
            events.clone(),
            Arc::clone(&liveness),
        );
        fallback.start();

        let bootstrap = Bootstrap {
            issuer: collaborators.issuer,
            transport: collaborators.push,
            settings,
            candidates: candidates_tx,
            events: events.clone(),
            status: status_tx,
            credentials: credentials_tx,
            liveness,
        };
        let bootstrap = tokio::spawn(bootstrap.run(trigger.signal()));

        tracing::info!("[Session] Started");
        let session = Self {
            trigger,
            fallback,
            reconciler,
            bootstrap,
            state,
            status,
            credentials,
            events,
            counters,
        };
        (session, first_events)
    }

    /// Latest accepted state, if any candidate has been accepted yet.
    pub fn authoritative(&self) -> Option<Arc<AuthoritativeState>> {
        self.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<Option<Arc<AuthoritativeState>>> {
        self.state.clone()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Current credential; `None` until the bootstrap issue succeeded.
    pub fn credential(&self) -> Option<Arc<Credential>> {
        self.credentials.borrow().as_ref().map(|store| store.current())
    }

    pub fn reconcile_stats(&self) -> ReconcileStats {
        self.counters.snapshot()
    }

    /// Stop every task and wait for all of them to exit.
    ///
    /// Pending timers are cancelled and both channels are closed before this
    /// returns; no candidate is accepted afterwards.
    pub async fn shutdown(mut self) {
        tracing::info!("[Session] Shutting down");
        self.trigger.trigger();
        self.fallback.stop().await;

        if let Err(e) = self.bootstrap.await {
            tracing::error!("[Session] Credential/push task panicked: {}", e);
        }
        if let Err(e) = self.reconciler.await {
            tracing::error!("[Session] Reconciler task panicked: {}", e);
        }
        tracing::info!("[Session] Stopped");
    }
}

/// Issues the first credential, then owns the scheduler and push tasks.
struct Bootstrap {
    issuer: Arc<dyn CredentialIssuer>,
    transport: Arc<dyn PushTransport>,
    settings: SessionSettings,
    candidates: mpsc::Sender<CandidateUpdate>,
    events: EventSink,
    status: watch::Sender<ConnectionStatus>,
    credentials: watch::Sender<Option<Arc<CredentialStore>>>,
    liveness: Arc<LivenessTracker>,
}

impl Bootstrap {
    async fn run(self, mut shutdown: ShutdownSignal) {
        let Some(credential) = self.issue_initial(&mut shutdown).await else {
            return;
        };

        let store = Arc::new(CredentialStore::new(credential));
        self.credentials.send_replace(Some(Arc::clone(&store)));

        let scheduler =
            RefreshScheduler::new(self.issuer, Arc::clone(&store), self.events.clone())
                .spawn(shutdown.clone());
        let manager = ConnectionManager::new(
            self.transport,
            self.settings.push_url,
            store,
            self.candidates,
            self.events,
            self.status,
            self.liveness,
        )
        .spawn(shutdown);

        let (scheduler, manager) = tokio::join!(scheduler, manager);
        if let Err(e) = scheduler {
            tracing::error!("[Refresh] Scheduler task panicked: {}", e);
        }
        if let Err(e) = manager {
            tracing::error!("[Push] Connection manager task panicked: {}", e);
        }
    }

    async fn issue_initial(&self, shutdown: &mut ShutdownSignal) -> Option<Credential> {
        let identity = &self.settings.identity;
        loop {
            let result = tokio::select! {
                result = self.issuer.issue(identity) => result,
                () = shutdown.cancelled() => return None,
            };

            match result {
                Ok(credential) => {
                    tracing::info!(
                        %identity,
                        expires_at = %credential.expires_at,
                        "[Session] Initial credential issued"
                    );
                    return Some(credential);
                },
                Err(e) => {
                    tracing::error!(
                        %identity,
                        retry_secs = self.settings.bootstrap_retry.as_secs(),
                        "[Session] Initial credential failed: {}",
                        e
                    );
                    self.events.error(SyncError::BootstrapAuthFailed {
                        identity: identity.clone(),
                        message: e.to_string(),
                    });
                },
            }

            tokio::select! {
                () = tokio::time::sleep(self.settings.bootstrap_retry) => {}
                () = shutdown.cancelled() => return None,
            }
        }
    }
}
