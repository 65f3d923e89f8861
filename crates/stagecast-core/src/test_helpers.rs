//! Scripted in-memory collaborators for driving the sync core in tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use stagecast_types::{
    ChannelError, Credential, CredentialError, GameStateSnapshot, SessionEvent, SourceVersion,
};
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::credential::CredentialIssuer;
use crate::fallback::{DocumentChange, DocumentStream, FallbackDocumentStore};
use crate::push::{PushMessage, PushStream, PushTransport};

/// Assert two durations agree to within one second.
pub fn assert_near(actual: Duration, expected: Duration) {
    let diff = if actual > expected { actual - expected } else { expected - actual };
    assert!(diff < Duration::from_secs(1), "expected ~{:?}, got {:?}", expected, actual);
}

pub fn snapshot(phase: &str) -> GameStateSnapshot {
    GameStateSnapshot::new(json!({ "phase": phase }))
}

pub fn state_message(phase: &str, version: &str) -> PushMessage {
    PushMessage::State { snapshot: snapshot(phase), version: SourceVersion::new(version) }
}

pub fn document_snapshot(phase: &str, version: &str) -> DocumentChange {
    DocumentChange::Snapshot { snapshot: snapshot(phase), version: SourceVersion::new(version) }
}

/// Wait (on the possibly paused clock) for an event matching `pred`.
pub async fn wait_for_event(
    rx: &mut broadcast::Receiver<SessionEvent>,
    pred: impl Fn(&SessionEvent) -> bool,
) -> SessionEvent {
    let wait = async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event stream closed"),
            }
        }
    };
    match tokio::time::timeout(Duration::from_secs(3600), wait).await {
        Ok(event) => event,
        Err(_) => panic!("timed out waiting for session event"),
    }
}

/// Issuer that replays a script, then falls back to a default outcome.
pub struct ScriptedIssuer {
    script: Mutex<VecDeque<Result<chrono::Duration, CredentialError>>>,
    default: Result<chrono::Duration, CredentialError>,
    calls: Mutex<Vec<Instant>>,
    counter: AtomicU32,
}

impl ScriptedIssuer {
    pub fn new(default_lifetime: chrono::Duration) -> Self {
        Self::with_default(Ok(default_lifetime))
    }

    pub fn failing(error: CredentialError) -> Self {
        Self::with_default(Err(error))
    }

    fn with_default(default: Result<chrono::Duration, CredentialError>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default,
            calls: Mutex::new(Vec::new()),
            counter: AtomicU32::new(0),
        }
    }

    pub fn push_ok(&self, lifetime: chrono::Duration) {
        self.script.lock().push_back(Ok(lifetime));
    }

    pub fn push_err(&self, error: CredentialError) {
        self.script.lock().push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<Instant> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl CredentialIssuer for ScriptedIssuer {
    async fn issue(&self, identity: &str) -> Result<Credential, CredentialError> {
        self.calls.lock().push(Instant::now());
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let outcome = self.script.lock().pop_front().unwrap_or_else(|| self.default.clone());
        outcome.map(|lifetime| Credential::with_lifetime(format!("token-{}", n), identity, lifetime))
    }
}

/// Sender half used by a test to drive one push connection.
pub type PushFeed = mpsc::UnboundedSender<Result<PushMessage, ChannelError>>;

/// Push transport handing out scripted connections; refuses once the script runs dry.
#[derive(Default)]
pub struct FakePushTransport {
    script: Mutex<VecDeque<Result<PushStream, ChannelError>>>,
    connects: Mutex<Vec<(Instant, String)>>,
}

impl FakePushTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a connection that succeeds; the returned feed drives it and
    /// dropping the feed drops the connection.
    pub fn accept(&self) -> PushFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.script.lock().push_back(Ok(Box::pin(UnboundedReceiverStream::new(rx))));
        tx
    }

    pub fn refuse(&self, error: ChannelError) {
        self.script.lock().push_back(Err(error));
    }

    pub fn connects(&self) -> Vec<(Instant, String)> {
        self.connects.lock().clone()
    }

    pub fn connect_count(&self) -> usize {
        self.connects.lock().len()
    }
}

#[async_trait]
impl PushTransport for FakePushTransport {
    async fn connect(&self, _url: &str, token: &str) -> Result<PushStream, ChannelError> {
        self.connects.lock().push((Instant::now(), token.to_string()));
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ChannelError::Connect { message: "connection refused".to_string() }))
    }
}

/// Sender half used by a test to drive one fallback subscription.
pub type DocumentFeed = mpsc::UnboundedSender<Result<DocumentChange, ChannelError>>;

/// Document store handing out scripted subscriptions; refuses once the script runs dry.
#[derive(Default)]
pub struct FakeDocumentStore {
    script: Mutex<VecDeque<Result<DocumentStream, ChannelError>>>,
    subscribes: AtomicU32,
}

impl FakeDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&self) -> DocumentFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.script.lock().push_back(Ok(Box::pin(UnboundedReceiverStream::new(rx))));
        tx
    }

    pub fn refuse(&self, error: ChannelError) {
        self.script.lock().push_back(Err(error));
    }

    pub fn subscribe_count(&self) -> u32 {
        self.subscribes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FallbackDocumentStore for FakeDocumentStore {
    async fn subscribe(&self, _document_id: &str) -> Result<DocumentStream, ChannelError> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ChannelError::Connect { message: "unavailable".to_string() }))
    }
}
