//! # Stagecast Types
//!
//! Core types, models, and error definitions for the Stagecast display client.
//!
//! - **`error`** - Typed error hierarchy for credentials, channels, config and the session
//! - **`models`** - Domain models (Credential, ConnectionState, CandidateUpdate, AuthoritativeState)
//!
//! ## Architecture Role
//!
//! `stagecast-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!               stagecast-types (this crate)
//!                        │
//!          ┌─────────────┴─────────────┐
//!          ▼                           ▼
//!   stagecast-core              stagecast-client
//!          │                           │
//!          └─────────────┬─────────────┘
//!                        ▼
//!                stagecast-display
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde for logging and the session event stream
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;

pub use error::{ChannelError, ConfigError, CredentialError, Severity, SyncError};

pub use models::{
    AuthoritativeState, CandidateUpdate, ConnectionEvent, ConnectionState, ConnectionStatus,
    Credential, GameStateSnapshot, SessionEvent, SourceChannel, SourceVersion, SyncConfig,
};
