//! Credential lifecycle: the issuer seam, the store, and the refresh scheduler.

mod scheduler;
mod store;

pub use scheduler::RefreshScheduler;
pub use store::CredentialStore;

use async_trait::async_trait;
use stagecast_types::{Credential, CredentialError};

/// External collaborator that mints credentials for a client identity.
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn issue(&self, identity: &str) -> Result<Credential, CredentialError>;
}
