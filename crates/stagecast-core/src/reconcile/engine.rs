//! Candidate acceptance rule.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use stagecast_types::{AuthoritativeState, CandidateUpdate};

use crate::policy::DEDUP_WINDOW;

/// Outcome of evaluating one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No authoritative state existed yet
    First,
    /// Phase differs from the authoritative one
    PhaseChange,
    /// Same phase, outside the dedup window
    Fresh,
    /// Same phase within the dedup window: the other channel's copy
    Duplicate,
    /// Payload unusable
    Malformed(String),
}

impl Verdict {
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::First | Self::PhaseChange | Self::Fresh)
    }
}

/// Diagnostic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub accepted: u64,
    pub rejected: u64,
    pub malformed: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    accepted: AtomicU64,
    rejected: AtomicU64,
    malformed: AtomicU64,
}

impl Counters {
    pub(crate) fn snapshot(&self) -> ReconcileStats {
        ReconcileStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
        }
    }
}

/// Decides which candidates become the authoritative state.
///
/// Rules, in order:
/// 1. nothing accepted yet: accept
/// 2. phase differs from the authoritative phase: accept
/// 3. same phase: accept only if observed at least [`DEDUP_WINDOW`] after
///    the authoritative state, measured on the monotonic clock
///
/// Rejections only bump a counter. The engine itself never fails.
#[derive(Debug, Default)]
pub struct ReconciliationEngine {
    current: Option<Arc<AuthoritativeState>>,
    counters: Arc<Counters>,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate `update`; returns whether it was accepted.
    pub fn on_candidate(&mut self, update: CandidateUpdate) -> bool {
        self.evaluate(update).is_accepted()
    }

    /// Evaluate `update` and report why it was accepted or rejected.
    pub fn evaluate(&mut self, update: CandidateUpdate) -> Verdict {
        let Some(phase) = update.payload.phase().map(str::to_owned) else {
            self.counters.malformed.fetch_add(1, Ordering::Relaxed);
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            return Verdict::Malformed("document has no string `phase` field".to_string());
        };

        let verdict = match &self.current {
            None => Verdict::First,
            Some(current) if current.phase != phase => Verdict::PhaseChange,
            Some(current) => match update.observed_at.checked_duration_since(current.observed_at) {
                Some(gap) if gap >= DEDUP_WINDOW => Verdict::Fresh,
                _ => Verdict::Duplicate,
            },
        };

        if verdict.is_accepted() {
            self.counters.accepted.fetch_add(1, Ordering::Relaxed);
            self.current = Some(AuthoritativeState::from_candidate(update, phase));
        } else {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
        }
        verdict
    }

    pub fn current(&self) -> Option<Arc<AuthoritativeState>> {
        self.current.clone()
    }

    pub fn stats(&self) -> ReconcileStats {
        self.counters.snapshot()
    }

    pub(crate) fn counters(&self) -> Arc<Counters> {
        Arc::clone(&self.counters)
    }
}
