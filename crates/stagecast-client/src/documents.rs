//! Server-sent-events document store.

use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::Client;
use stagecast_core::{DocumentChange, DocumentStream, FallbackDocumentStore};
use stagecast_types::ChannelError;
use url::Url;

use crate::error::ClientError;
use crate::frames::decode_document_snapshot;

/// Subscribes to `GET {base}/documents/{id}/events`.
///
/// Event types: `snapshot` (data `{"version", "document"}`) and `missing`.
/// Any other named event is surfaced as a keep-alive. Comment lines never
/// reach the stream.
#[derive(Debug, Clone)]
pub struct SseDocumentStore {
    client: Client,
    base: Url,
}

impl SseDocumentStore {
    /// `connect_timeout` bounds connection setup only; the subscription
    /// itself stays open for as long as the server keeps it.
    pub fn new(base: &str, connect_timeout: Duration) -> Result<Self, ClientError> {
        let base = Url::parse(base)
            .map_err(|source| ClientError::InvalidUrl { url: base.to_string(), source })?;
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self { client, base })
    }

    fn events_url(&self, document_id: &str) -> String {
        format!("{}/documents/{}/events", self.base.as_str().trim_end_matches('/'), document_id)
    }
}

#[async_trait]
impl FallbackDocumentStore for SseDocumentStore {
    async fn subscribe(&self, document_id: &str) -> Result<DocumentStream, ChannelError> {
        let resp = self
            .client
            .get(self.events_url(document_id))
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| ChannelError::Connect { message: e.to_string() })?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ChannelError::Rejected { status: status.as_u16(), message });
        }

        let mut events = Box::pin(resp.bytes_stream().eventsource());
        let stream = async_stream::stream! {
            while let Some(event) = events.next().await {
                match event {
                    Ok(event) => match event.event.as_str() {
                        "snapshot" => yield decode_document_snapshot(&event.data),
                        "missing" => yield Ok(DocumentChange::Missing),
                        other => {
                            tracing::trace!(event = other, "[Fallback] Keep-alive SSE event");
                            yield Ok(DocumentChange::KeepAlive);
                        },
                    },
                    Err(e) => {
                        yield Err(ChannelError::Interrupted { message: e.to_string() });
                        break;
                    },
                }
            }
        };
        Ok(Box::pin(stream))
    }
}
