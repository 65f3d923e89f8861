//! Shared game-state values flowing through reconciliation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Delivery channel a candidate update arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceChannel {
    /// Low-latency, connection-oriented channel
    Push,
    /// Subscription-based availability floor
    Fallback,
}

impl std::fmt::Display for SourceChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceChannel::Push => write!(f, "push"),
            SourceChannel::Fallback => write!(f, "fallback"),
        }
    }
}

/// Opaque monotonic marker assigned by the source (revision, update time).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceVersion(String);

impl SourceVersion {
    pub fn new(marker: impl Into<String>) -> Self {
        Self(marker.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The full shared document, opaque apart from its `phase` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameStateSnapshot {
    document: serde_json::Value,
}

impl GameStateSnapshot {
    pub fn new(document: serde_json::Value) -> Self {
        Self { document }
    }

    /// Discrete phase of the game (`None` if the document carries no string phase).
    pub fn phase(&self) -> Option<&str> {
        self.document.get("phase").and_then(serde_json::Value::as_str)
    }

    pub fn document(&self) -> &serde_json::Value {
        &self.document
    }

    pub fn into_document(self) -> serde_json::Value {
        self.document
    }
}

/// An unverified state change proposed by one of the channels.
///
/// `received_at` is the wall-clock stamp shown to consumers. Ordering and
/// dedup use `observed_at`, which cannot step backwards when the system
/// clock is adjusted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateUpdate {
    pub source_channel: SourceChannel,
    pub payload: GameStateSnapshot,
    pub source_version: SourceVersion,
    pub received_at: DateTime<Utc>,
    #[serde(skip)]
    pub observed_at: Instant,
}

impl CandidateUpdate {
    /// Stamp a candidate with the current wall-clock and monotonic time.
    pub fn new(
        source_channel: SourceChannel,
        payload: GameStateSnapshot,
        source_version: SourceVersion,
    ) -> Self {
        Self::received(source_channel, payload, source_version, Utc::now(), Instant::now())
    }

    pub fn received(
        source_channel: SourceChannel,
        payload: GameStateSnapshot,
        source_version: SourceVersion,
        received_at: DateTime<Utc>,
        observed_at: Instant,
    ) -> Self {
        Self { source_channel, payload, source_version, received_at, observed_at }
    }
}

/// The single accepted, externally visible state.
///
/// Replaced wholesale on every accepted candidate; consumers only ever see it
/// behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthoritativeState {
    pub snapshot: GameStateSnapshot,
    pub phase: String,
    pub source_channel: SourceChannel,
    pub source_version: SourceVersion,
    pub received_at: DateTime<Utc>,
    #[serde(skip)]
    pub observed_at: Instant,
}

impl AuthoritativeState {
    /// Build from a candidate whose phase has already been projected.
    pub fn from_candidate(update: CandidateUpdate, phase: String) -> Arc<Self> {
        Arc::new(Self {
            snapshot: update.payload,
            phase,
            source_channel: update.source_channel,
            source_version: update.source_version,
            received_at: update.received_at,
            observed_at: update.observed_at,
        })
    }
}
