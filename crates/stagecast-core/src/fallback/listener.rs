//! Fallback-channel listener.
//!
//! Runs for the whole session regardless of push health and never gives up:
//! failed subscribes are retried on a fixed cadence, and an interrupted
//! subscription is re-established rather than merely logged.
//!
//! The channel only counts as healthy once a subscription has delivered
//! something. One that closes or goes silent before its first change is a
//! failed subscribe.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use stagecast_types::{CandidateUpdate, SessionEvent, SourceChannel, SyncError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{DocumentChange, DocumentStream, FallbackDocumentStore};
use crate::events::EventSink;
use crate::liveness::LivenessTracker;
use crate::policy::FALLBACK_IDLE_TIMEOUT;
use crate::reconcile;
use crate::shutdown::{ShutdownSignal, ShutdownTrigger};

enum PumpOutcome {
    /// Subscription broke or went idle after delivering at least one change
    Interrupted,
    /// Subscription broke or went idle without delivering anything
    InterruptedEmpty,
    Shutdown,
}

struct ListenerTask {
    store: Arc<dyn FallbackDocumentStore>,
    document_id: String,
    retry_delay: Duration,
    candidates: mpsc::Sender<CandidateUpdate>,
    events: EventSink,
    liveness: Arc<LivenessTracker>,
}

/// Handle on the fallback subscription task.
pub struct FallbackListener {
    task: Option<ListenerTask>,
    running: Option<(ShutdownTrigger, JoinHandle<()>)>,
}

impl FallbackListener {
    pub fn new(
        store: Arc<dyn FallbackDocumentStore>,
        document_id: impl Into<String>,
        retry_delay: Duration,
        candidates: mpsc::Sender<CandidateUpdate>,
        events: EventSink,
        liveness: Arc<LivenessTracker>,
    ) -> Self {
        let task = ListenerTask {
            store,
            document_id: document_id.into(),
            retry_delay,
            candidates,
            events,
            liveness,
        };
        Self { task: Some(task), running: None }
    }

    /// Spawn the subscription loop.
    ///
    /// A listener runs at most once: returns `false` if it was already
    /// started or has been stopped.
    pub fn start(&mut self) -> bool {
        let Some(task) = self.task.take() else {
            tracing::warn!("[Fallback] Listener already started or stopped, not restarting");
            return false;
        };
        let trigger = ShutdownTrigger::new();
        let handle = tokio::spawn(task.run(trigger.signal()));
        self.running = Some((trigger, handle));
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|(_, handle)| !handle.is_finished())
    }

    /// Unsubscribe and wait for the loop to exit.
    pub async fn stop(&mut self) {
        if let Some((trigger, handle)) = self.running.take() {
            trigger.trigger();
            if let Err(e) = handle.await {
                tracing::error!("[Fallback] Listener task panicked: {}", e);
            }
        }
        // A never-started listener still owns a queue sender; release it.
        self.task = None;
    }
}

impl ListenerTask {
    async fn run(self, mut shutdown: ShutdownSignal) {
        tracing::info!(document_id = %self.document_id, "[Fallback] Listener started");

        loop {
            let subscribed = tokio::select! {
                result = self.store.subscribe(&self.document_id) => result,
                () = shutdown.cancelled() => break,
            };

            match subscribed {
                Ok(stream) => {
                    tracing::info!(document_id = %self.document_id, "[Fallback] Subscribed");
                    self.events.emit(SessionEvent::FallbackSubscribed);

                    match self.pump(stream, &mut shutdown).await {
                        PumpOutcome::Shutdown => break,
                        PumpOutcome::Interrupted => {
                            tracing::warn!("[Fallback] Subscription interrupted, resubscribing");
                            continue;
                        },
                        PumpOutcome::InterruptedEmpty => {
                            self.subscribe_failed("subscription ended before any update".to_string());
                        },
                    }
                },
                Err(e) => self.subscribe_failed(e.to_string()),
            }

            tokio::select! {
                () = tokio::time::sleep(self.retry_delay) => {}
                () = shutdown.cancelled() => break,
            }
        }

        tracing::info!("[Fallback] Listener stopped");
    }

    fn subscribe_failed(&self, message: String) {
        tracing::warn!(
            retry_secs = self.retry_delay.as_secs(),
            "[Fallback] Subscribe failed: {}",
            message
        );
        self.events.error(SyncError::FallbackSubscribeFailed {
            document_id: self.document_id.clone(),
            message,
        });
        self.liveness.fallback_failed();
    }

    /// First change on a subscription marks the channel healthy again.
    fn mark_delivered(&self, delivered: &mut bool) {
        if !*delivered {
            *delivered = true;
            self.liveness.fallback_recovered();
        }
    }

    async fn pump(&self, mut stream: DocumentStream, shutdown: &mut ShutdownSignal) -> PumpOutcome {
        let mut delivered = false;
        loop {
            let next = tokio::select! {
                next = tokio::time::timeout(FALLBACK_IDLE_TIMEOUT, stream.next()) => next,
                () = shutdown.cancelled() => return PumpOutcome::Shutdown,
            };
            let Ok(item) = next else {
                tracing::warn!(
                    idle_secs = FALLBACK_IDLE_TIMEOUT.as_secs(),
                    "[Fallback] Subscription idle, reopening"
                );
                return Self::interrupted(delivered);
            };

            match item {
                Some(Ok(DocumentChange::Snapshot { snapshot, version })) => {
                    self.mark_delivered(&mut delivered);
                    let update = reconcile::stamp(SourceChannel::Fallback, snapshot, version);
                    if self.candidates.send(update).await.is_err() {
                        tracing::debug!("[Fallback] Reconciler gone, stopping");
                        return PumpOutcome::Shutdown;
                    }
                },
                Some(Ok(DocumentChange::Missing)) => {
                    self.mark_delivered(&mut delivered);
                    tracing::info!(document_id = %self.document_id, "[Fallback] Document missing");
                    self.events.emit(SessionEvent::MissingState {
                        document_id: self.document_id.clone(),
                    });
                },
                Some(Ok(DocumentChange::KeepAlive)) => {
                    tracing::trace!("[Fallback] Keep-alive");
                },
                Some(Err(e)) if !e.is_disconnect() => {
                    tracing::warn!("[Fallback] Dropping undecodable snapshot: {}", e);
                    self.events.error(SyncError::MalformedCandidate {
                        channel: SourceChannel::Fallback,
                        reason: e.to_string(),
                    });
                },
                Some(Err(e)) => {
                    tracing::warn!("[Fallback] Stream error: {}", e);
                    return Self::interrupted(delivered);
                },
                None => return Self::interrupted(delivered),
            }
        }
    }

    fn interrupted(delivered: bool) -> PumpOutcome {
        if delivered {
            PumpOutcome::Interrupted
        } else {
            PumpOutcome::InterruptedEmpty
        }
    }
}
