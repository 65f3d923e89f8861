//! # Stagecast Core
//!
//! Keeps one display client's view of the shared game state correct, timely and
//! duplicate-free across two delivery channels for the length of a live show.
//!
//! ```text
//!  CredentialIssuer ──► RefreshScheduler ──► CredentialStore
//!                                                  │ token per attempt
//!  PushTransport ─────► ConnectionManager ◄────────┘
//!                              │ CandidateUpdate
//!                              ▼
//!  FallbackDocumentStore ► FallbackListener ──► Reconciler ──► AuthoritativeState
//! ```
//!
//! Every long-lived loop runs as its own tokio task; the [`reconcile::Reconciler`]
//! is the single consumer of candidate updates. [`session::SyncSession`] wires the
//! pieces together and tears them down as one unit.

pub mod credential;
pub mod events;
pub mod fallback;
pub mod liveness;
pub mod policy;
pub mod push;
pub mod reconcile;
pub mod session;
pub mod shutdown;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use credential::{CredentialIssuer, CredentialStore, RefreshScheduler};
pub use events::EventSink;
pub use fallback::{DocumentChange, DocumentStream, FallbackDocumentStore, FallbackListener};
pub use push::{ConnectionManager, PushMessage, PushStream, PushTransport};
pub use reconcile::{ReconcileStats, ReconciliationEngine, Reconciler, Verdict};
pub use session::{SessionCollaborators, SessionSettings, SyncSession};
pub use shutdown::{ShutdownSignal, ShutdownTrigger};
