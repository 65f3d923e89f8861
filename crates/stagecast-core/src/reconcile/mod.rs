//! Dual-channel reconciliation.
//!
//! [`ReconciliationEngine`] holds the decision rule and the current
//! [`AuthoritativeState`](stagecast_types::AuthoritativeState).
//! [`Reconciler`] is the single consumer task that feeds it candidates one at a
//! time, in arrival order, and publishes accepted states.

mod engine;
mod reconciler;


pub use engine::{ReconcileStats, ReconciliationEngine, Verdict};
pub use reconciler::Reconciler;

pub(crate) use engine::Counters;

use chrono::Utc;
use stagecast_types::{CandidateUpdate, GameStateSnapshot, SourceChannel, SourceVersion};

/// Stamp a candidate as it comes off a channel, using the runtime clock for
/// the monotonic stamp.
pub(crate) fn stamp(
    channel: SourceChannel,
    payload: GameStateSnapshot,
    version: SourceVersion,
) -> CandidateUpdate {
    CandidateUpdate::received(
        channel,
        payload,
        version,
        Utc::now(),
        tokio::time::Instant::now().into_std(),
    )
}
