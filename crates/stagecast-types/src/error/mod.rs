//! Typed error definitions for Stagecast.
//!
//! Collaborator failures (`CredentialError`, `ChannelError`) are produced by the
//! adapters and consumed by the sync core. The core never lets them cross the
//! reconciliation boundary: it turns them into [`SyncError`] values that travel
//! on the session event stream.

mod channel;
mod config;
mod credential;

pub use channel::ChannelError;
pub use config::ConfigError;
pub use credential::CredentialError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::SourceChannel;

/// How prominently an error must be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Recorded for diagnostics only
    Info,
    /// Degraded but self-healing
    Warning,
    /// One channel is permanently down for this session
    Fatal,
    /// Live updates are lost; the operator must act
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Fatal => write!(f, "fatal"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Error events emitted on the session error stream.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum SyncError {
    /// The very first credential could not be issued (no connection ever succeeded)
    #[error("Bootstrap credential issue failed for {identity}: {message}")]
    BootstrapAuthFailed {
        /// Client identity the credential was requested for
        identity: String,
        /// Details about the issuer failure
        message: String,
    },

    /// Renewing the current credential failed; the last-known-good one stays in use
    #[error("Credential refresh failed for {identity} ({consecutive} in a row): {message}")]
    CredentialRefreshFailed {
        /// Client identity the credential was requested for
        identity: String,
        /// Consecutive failures within the current refresh cycle
        consecutive: u32,
        /// Details about the issuer failure
        message: String,
    },

    /// A single push connect attempt failed
    #[error("Push connect attempt {attempt} failed: {message}")]
    PushConnectFailed {
        /// Reconnect attempt number (0 for the initial connect)
        attempt: u32,
        /// Details about the transport failure
        message: String,
    },

    /// The push channel gave up after its bounded retry budget
    #[error("Push channel exhausted after {attempts} reconnect attempts")]
    PushExhausted {
        /// Number of reconnect attempts made
        attempts: u32,
    },

    /// The fallback subscription could not be (re-)established
    #[error("Fallback subscription to {document_id} failed: {message}")]
    FallbackSubscribeFailed {
        /// Shared-state document the listener subscribes to
        document_id: String,
        /// Details about the transport failure
        message: String,
    },

    /// A candidate update was unusable and dropped
    #[error("Malformed candidate from {channel}: {reason}")]
    MalformedCandidate {
        /// Channel the candidate arrived on
        channel: SourceChannel,
        /// Why the candidate was rejected
        reason: String,
    },

    /// Push channel exhausted while the fallback is also failing
    #[error("Connection lost, please refresh")]
    LiveUpdatesLost,
}

impl SyncError {
    /// Check if the condition may clear without outside intervention.
    pub const fn is_transient(&self) -> bool {
        !matches!(self, Self::PushExhausted { .. } | Self::LiveUpdatesLost)
    }

    /// Classify how prominently this error must be surfaced.
    pub const fn severity(&self) -> Severity {
        match self {
            Self::CredentialRefreshFailed { consecutive, .. } if *consecutive < 2 => Severity::Info,
            Self::PushConnectFailed { .. } | Self::MalformedCandidate { .. } => Severity::Info,
            Self::BootstrapAuthFailed { .. }
            | Self::CredentialRefreshFailed { .. }
            | Self::FallbackSubscribeFailed { .. } => Severity::Warning,
            Self::PushExhausted { .. } => Severity::Fatal,
            Self::LiveUpdatesLost => Severity::Critical,
        }
    }
}
