//! Push-channel connection state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of the push-channel connection manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection and none in progress
    Disconnected,
    /// Initial connect in progress
    Connecting,
    /// Live connection established
    Connected,
    /// Waiting to run reconnect attempt `attempt` (1-based)
    Reconnecting {
        /// Attempt number that will run next
        attempt: u32,
        /// When that attempt is scheduled
        next_attempt_at: DateTime<Utc>,
    },
    /// Retry budget spent; terminal for this session
    Exhausted,
}

impl ConnectionState {
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Reconnect attempt carried by the state (0 outside `Reconnecting`).
    pub const fn attempt(&self) -> u32 {
        match self {
            Self::Reconnecting { attempt, .. } => *attempt,
            _ => 0,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Reconnecting { attempt, .. } => write!(f, "reconnecting (attempt {})", attempt),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// Emitted on every connection state transition. Status reporting only:
/// it carries no game data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEvent {
    pub state: ConnectionState,
    pub attempt_count: u32,
}

/// Connectivity projection for a UI indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub attempt: u32,
    pub max_attempts: u32,
}

impl ConnectionStatus {
    pub fn from_event(event: &ConnectionEvent, max_attempts: u32) -> Self {
        Self {
            connected: event.state.is_connected(),
            attempt: event.attempt_count,
            max_attempts,
        }
    }
}
