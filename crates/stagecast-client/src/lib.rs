//! # Stagecast Client
//!
//! Network adapters behind the three collaborator traits of `stagecast-core`:
//!
//! - [`HttpCredentialIssuer`] - `POST {issuer_url}` for short-lived push credentials
//! - [`WsPushTransport`] - authenticated WebSocket push connection
//! - [`SseDocumentStore`] - server-sent-events subscription to the shared document
//!
//! [`collaborators`] builds all three from a [`SyncConfig`].

mod documents;
mod error;
mod frames;
mod issuer;
mod push;

use std::sync::Arc;
use std::time::Duration;

use stagecast_core::SessionCollaborators;
use stagecast_types::SyncConfig;

pub use documents::SseDocumentStore;
pub use error::ClientError;
pub use frames::{decode_document_snapshot, decode_push_frame};
pub use issuer::HttpCredentialIssuer;
pub use push::WsPushTransport;

/// Build the network collaborators for one session.
pub fn collaborators(config: &SyncConfig) -> Result<SessionCollaborators, ClientError> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    Ok(SessionCollaborators {
        issuer: Arc::new(HttpCredentialIssuer::new(&config.issuer_url, timeout)?),
        push: Arc::new(WsPushTransport::new(timeout)),
        fallback: Arc::new(SseDocumentStore::new(&config.fallback_url, timeout)?),
    })
}
