//! Fallback channel: document-store seam and the always-on listener.

mod listener;

pub use listener::FallbackListener;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use stagecast_types::{ChannelError, GameStateSnapshot, SourceVersion};

/// One notification from the document subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentChange {
    /// Full snapshot of the document after a change
    Snapshot { snapshot: GameStateSnapshot, version: SourceVersion },
    /// The document does not exist (yet)
    Missing,
    /// Server activity without a document; only restarts the idle timer
    KeepAlive,
}

/// A standing subscription. The stream ending (or yielding a disconnect
/// error) is a transport interruption; dropping it unsubscribes.
pub type DocumentStream = Pin<Box<dyn Stream<Item = Result<DocumentChange, ChannelError>> + Send>>;

/// External collaborator exposing the shared document as a snapshot stream.
#[async_trait]
pub trait FallbackDocumentStore: Send + Sync {
    async fn subscribe(&self, document_id: &str) -> Result<DocumentStream, ChannelError>;
}
