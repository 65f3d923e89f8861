//! Session event fan-out.

use stagecast_types::{ConnectionEvent, SessionEvent, SyncError};
use tokio::sync::broadcast;

use crate::policy::EVENT_BUFFER;

/// Cloneable sender half of the session event stream.
///
/// Emitting never fails: with no subscribers the event is simply dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventSink {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    pub fn error(&self, error: SyncError) {
        self.emit(SessionEvent::Error(error));
    }

    pub fn connection(&self, event: ConnectionEvent) {
        self.emit(SessionEvent::Connection(event));
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new()
    }
}
