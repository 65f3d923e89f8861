//! Push channel: transport seam and the reconnecting connection manager.

mod manager;


pub use manager::ConnectionManager;
pub(crate) use manager::initial_status;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use stagecast_types::{ChannelError, GameStateSnapshot, SourceVersion};

/// Decoded push-channel frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PushMessage {
    /// The shared document changed (`phase-changed` and friends)
    State { snapshot: GameStateSnapshot, version: SourceVersion },
    /// Keep-alive or any frame carrying no game data
    Heartbeat,
}

/// A live push connection. The stream ending (or yielding a disconnect
/// error) is a drop; dropping the stream closes the connection.
pub type PushStream = Pin<Box<dyn Stream<Item = Result<PushMessage, ChannelError>> + Send>>;

/// External collaborator that opens push connections.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn connect(&self, url: &str, token: &str) -> Result<PushStream, ChannelError>;
}
