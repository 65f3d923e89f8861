//! Single-consumer reconciliation task.

use std::sync::Arc;

use stagecast_types::{AuthoritativeState, CandidateUpdate, SyncError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::engine::{Counters, ReconciliationEngine, Verdict};
use crate::events::EventSink;
use crate::shutdown::ShutdownSignal;

/// Drains the candidate queue into the engine, one candidate at a time.
pub struct Reconciler {
    engine: ReconciliationEngine,
    candidates: mpsc::Receiver<CandidateUpdate>,
    state: watch::Sender<Option<Arc<AuthoritativeState>>>,
    events: EventSink,
}

impl Reconciler {
    pub fn new(
        candidates: mpsc::Receiver<CandidateUpdate>,
        state: watch::Sender<Option<Arc<AuthoritativeState>>>,
        events: EventSink,
    ) -> Self {
        Self { engine: ReconciliationEngine::new(), candidates, state, events }
    }

    pub(crate) fn counters(&self) -> Arc<Counters> {
        self.engine.counters()
    }

    pub fn spawn(self, shutdown: ShutdownSignal) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(mut self, mut shutdown: ShutdownSignal) {
        loop {
            let update = tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                update = self.candidates.recv() => update,
            };
            match update {
                Some(update) => self.handle(update),
                None => break,
            }
        }

        let stats = self.engine.stats();
        tracing::info!(
            accepted = stats.accepted,
            rejected = stats.rejected,
            malformed = stats.malformed,
            "[Reconcile] Stopped"
        );
    }

    fn handle(&mut self, update: CandidateUpdate) {
        let channel = update.source_channel;
        let version = update.source_version.clone();

        match self.engine.evaluate(update) {
            Verdict::Duplicate => {
                tracing::debug!(%channel, %version, "[Reconcile] Duplicate dropped");
            },
            Verdict::Malformed(reason) => {
                tracing::warn!(%channel, %version, "[Reconcile] Malformed candidate: {}", reason);
                self.events.error(SyncError::MalformedCandidate { channel, reason });
            },
            verdict => {
                let current = self.engine.current();
                if let Some(state) = &current {
                    if verdict == Verdict::Fresh {
                        tracing::debug!(%channel, %version, phase = %state.phase, "[Reconcile] Accepted");
                    } else {
                        tracing::info!(
                            %channel,
                            %version,
                            phase = %state.phase,
                            "[Reconcile] Accepted ({:?})",
                            verdict
                        );
                    }
                }
                self.state.send_replace(current);
            },
        }
    }
}
