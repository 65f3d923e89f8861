//! WebSocket push transport.

use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use stagecast_core::{PushMessage, PushStream, PushTransport};
use stagecast_types::ChannelError;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::frames::decode_push_frame;

/// Opens one authenticated WebSocket per [`PushTransport::connect`] call.
///
/// The returned stream owns the socket: dropping it closes the connection.
#[derive(Debug, Clone)]
pub struct WsPushTransport {
    connect_timeout: Duration,
}

impl WsPushTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl PushTransport for WsPushTransport {
    async fn connect(&self, url: &str, token: &str) -> Result<PushStream, ChannelError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| ChannelError::Connect { message: e.to_string() })?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ChannelError::Connect { message: format!("invalid token: {}", e) })?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        let (socket, _response) =
            match tokio::time::timeout(self.connect_timeout, connect_async(request)).await {
                Ok(Ok(pair)) => pair,
                Ok(Err(WsError::Http(response))) => {
                    return Err(ChannelError::Rejected {
                        status: response.status().as_u16(),
                        message: "handshake refused".to_string(),
                    })
                },
                Ok(Err(e)) => return Err(ChannelError::Connect { message: e.to_string() }),
                Err(_) => {
                    return Err(ChannelError::Connect {
                        message: format!("timed out after {}s", self.connect_timeout.as_secs()),
                    })
                },
            };

        tracing::debug!(url, "[Push] WebSocket handshake complete");
        Ok(Box::pin(push_messages(socket)))
    }
}

/// Translate socket frames into push messages.
///
/// Control pings and pongs surface as heartbeats. A close frame ends the
/// stream with [`ChannelError::Closed`], a read error with
/// [`ChannelError::Interrupted`].
fn push_messages<S>(mut socket: S) -> impl Stream<Item = Result<PushMessage, ChannelError>> + Send
where
    S: Stream<Item = Result<Message, WsError>> + Unpin + Send,
{
    async_stream::stream! {
        while let Some(frame) = socket.next().await {
            match frame {
                Ok(Message::Text(text)) => match decode_push_frame(text.as_str()) {
                    Ok(Some(message)) => yield Ok(message),
                    Ok(None) => {},
                    Err(e) => yield Err(e),
                },
                Ok(Message::Ping(_) | Message::Pong(_)) => yield Ok(PushMessage::Heartbeat),
                Ok(Message::Close(frame)) => {
                    tracing::info!(?frame, "[Push] Server closed connection");
                    yield Err(ChannelError::Closed);
                    break;
                },
                Ok(_) => {},
                Err(e) => {
                    yield Err(ChannelError::Interrupted { message: e.to_string() });
                    break;
                },
            }
        }
    }
}
