//! Core domain models for the Stagecast sync core.

mod config;
mod connection;
mod credential;
mod event;
mod snapshot;

pub use config::SyncConfig;
pub use connection::{ConnectionEvent, ConnectionState, ConnectionStatus};
pub use credential::Credential;
pub use event::SessionEvent;
pub use snapshot::{
    AuthoritativeState, CandidateUpdate, GameStateSnapshot, SourceChannel, SourceVersion,
};
