//! Session event stream payloads.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::connection::ConnectionEvent;
use crate::error::SyncError;

/// Everything the sync core reports upward besides the authoritative state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Push connection state transition
    Connection(ConnectionEvent),
    /// Error or warning from any sub-component
    Error(SyncError),
    /// A new credential superseded the old one
    CredentialRenewed { expires_at: DateTime<Utc> },
    /// The fallback subscription is (re-)established
    FallbackSubscribed,
    /// The shared document does not exist (not a channel failure)
    MissingState { document_id: String },
}
