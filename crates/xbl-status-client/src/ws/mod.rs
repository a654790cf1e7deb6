// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! One-shot WebSocket status fetcher.
//!
//! Each fetch opens a fresh connection, waits for the first text frame,
//! normalizes it and closes the connection. There is no reconnect or retry;
//! every failure ends up in the returned [`FetchResult`].

mod deadline;

use std::time::Duration;

use chrono::Utc;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::ORIGIN;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::protocol::{Protocol, StatusEnvelopeParser};
use crate::status::{normalize_services, FetchResult, NormalizedService};

use deadline::{Deadline, DeadlineToken};

/// Status feed endpoint.
pub const DEFAULT_ENDPOINT: &str = "wss://kvchecker.com/ws/LIVEAuthentication";

/// Origin the feed expects; connections without it may be rejected.
pub const DEFAULT_ORIGIN: &str = "https://xblstatus.com";

/// Default deadline for one fetch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Failures of a single fetch. The `Display` text is what callers see in
/// [`FetchResult::error_message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Failed to connect to WebSocket: {0}")]
    Connect(String),

    #[error("Invalid data received from WebSocket: {0}")]
    MalformedPayload(String),

    #[error("Invalid response format received.")]
    UnsupportedMessage { message_type: String },

    #[error("WebSocket error while receiving data: {0}")]
    ProtocolRead(String),

    #[error("WebSocket closed before a status message was received.")]
    ConnectionClosed,

    #[error("Operation timed out while receiving data.")]
    Timeout,

    #[error("Operation was cancelled while receiving data.")]
    Cancelled,

    #[error("Error while waiting for WebSocket data: {0}")]
    CompletionDropped(String),

    #[error("Error closing WebSocket: {0}")]
    Close(String),
}

impl FetchError {
    /// Whether the socket is still usable after this failure and should be
    /// closed gracefully.
    fn leaves_connection_open(&self) -> bool {
        matches!(
            self,
            Self::MalformedPayload(_) | Self::UnsupportedMessage { .. }
        )
    }
}

/// Configuration for the status fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// WebSocket URL of the status feed.
    pub endpoint: String,
    /// Value sent in the `Origin` request header.
    pub origin: String,
    /// Deadline used by [`StatusFetcher::fetch_with_default_timeout`].
    pub timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Fetches one status snapshot per call.
///
/// Holds only configuration; concurrent calls share nothing.
#[derive(Debug, Clone, Default)]
pub struct StatusFetcher {
    config: FetcherConfig,
}

impl StatusFetcher {
    #[must_use]
    pub fn new(config: FetcherConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Fetch using the configured timeout.
    pub async fn fetch_with_default_timeout(&self) -> FetchResult {
        self.fetch_status(self.config.timeout).await
    }

    /// Fetch the current status. Never fails; check [`FetchResult::success`].
    ///
    /// `timeout` arms a single deadline at connect time that also bounds the
    /// receive and close steps.
    pub async fn fetch_status(&self, timeout: Duration) -> FetchResult {
        self.fetch_status_with_cancel(timeout, &CancellationToken::new())
            .await
    }

    /// Like [`fetch_status`](Self::fetch_status), but also stops when
    /// `cancel` is cancelled.
    pub async fn fetch_status_with_cancel(
        &self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> FetchResult {
        let last_updated = Utc::now();
        let deadline = Deadline::arm(timeout, cancel);

        match self.run(deadline.token()).await {
            Ok(services) => {
                info!("Fetched status for {} services", services.len());
                FetchResult::succeeded(services, last_updated)
            }
            Err(e) => {
                warn!("Status fetch failed: {}", e);
                FetchResult::failed(e.to_string(), last_updated)
            }
        }
    }

    async fn run(&self, deadline: &DeadlineToken) -> Result<Vec<NormalizedService>, FetchError> {
        let stream = self.connect(deadline).await?;
        let (mut sink, source) = stream.split();

        let (done_tx, done_rx) = oneshot::channel();
        let receiver_deadline = deadline.clone();
        let receiver = tokio::spawn(async move {
            let outcome = receive_status(source, &receiver_deadline).await;
            // First result wins; nobody listening is fine.
            let _ = done_tx.send(outcome);
        });

        let outcome = done_rx
            .await
            .unwrap_or_else(|e| Err(FetchError::CompletionDropped(e.to_string())));

        // Close must not start before the receiver is done with the socket
        if let Err(e) = receiver.await {
            warn!("Receiver task ended abnormally: {}", e);
        }

        let still_open = match &outcome {
            Ok(_) => true,
            Err(e) => e.leaves_connection_open(),
        };
        let closed = if still_open {
            close(&mut sink, deadline).await
        } else {
            Ok(())
        };

        settle(outcome, closed)
    }

    async fn connect(&self, deadline: &DeadlineToken) -> Result<WsStream, FetchError> {
        let mut request = self
            .config
            .endpoint
            .as_str()
            .into_client_request()
            .map_err(|e| FetchError::Connect(e.to_string()))?;
        let origin = HeaderValue::from_str(&self.config.origin)
            .map_err(|e| FetchError::Connect(format!("invalid Origin header: {e}")))?;
        request.headers_mut().insert(ORIGIN, origin);

        info!("Connecting to {}...", self.config.endpoint);

        tokio::select! {
            result = connect_async(request) => {
                let (stream, response) = result.map_err(|e| FetchError::Connect(e.to_string()))?;
                info!("Connected to {} ({})", self.config.endpoint, response.status());
                Ok(stream)
            }
            () = deadline.cancelled() => {
                let reason = if deadline.has_expired() {
                    "timed out before the handshake completed"
                } else {
                    "cancelled before the handshake completed"
                };
                Err(FetchError::Connect(reason.to_string()))
            }
        }
    }
}

/// Read frames until the first text frame and decode it.
async fn receive_status(
    mut source: SplitStream<WsStream>,
    deadline: &DeadlineToken,
) -> Result<Vec<NormalizedService>, FetchError> {
    let mut parser = StatusEnvelopeParser::new();

    loop {
        let frame = tokio::select! {
            biased;
            () = deadline.cancelled() => return Err(deadline.receive_error()),
            frame = source.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => return decode_status(&mut parser, text.as_bytes()),
            Some(Ok(Message::Close(frame))) => {
                debug!("Server closed the connection: {:?}", frame);
                return Err(FetchError::ConnectionClosed);
            }
            Some(Ok(other)) => {
                debug!("Skipping non-text frame ({} bytes)", other.len());
            }
            Some(Err(e)) => return Err(FetchError::ProtocolRead(e.to_string())),
            None => return Err(FetchError::ConnectionClosed),
        }
    }
}

/// Decode one text frame into normalized services.
fn decode_status(
    parser: &mut StatusEnvelopeParser,
    input: &[u8],
) -> Result<Vec<NormalizedService>, FetchError> {
    let envelope = parser
        .parse(input)
        .map_err(|e| FetchError::MalformedPayload(e.to_string()))?
        .ok_or_else(|| FetchError::MalformedPayload("empty status envelope".to_string()))?;

    let Some(services) = envelope.status_services() else {
        return Err(FetchError::UnsupportedMessage {
            message_type: envelope.message_type,
        });
    };

    debug!(
        "Received {} message with {} services",
        envelope.kind(),
        services.len()
    );
    Ok(normalize_services(services))
}

/// Combine the receive outcome with the close step. A close failure
/// replaces whatever the receive step produced, including a success.
fn settle(
    outcome: Result<Vec<NormalizedService>, FetchError>,
    closed: Result<(), FetchError>,
) -> Result<Vec<NormalizedService>, FetchError> {
    closed?;
    outcome
}

async fn close(
    sink: &mut SplitSink<WsStream, Message>,
    deadline: &DeadlineToken,
) -> Result<(), FetchError> {
    let frame = CloseFrame {
        code: CloseCode::Normal,
        reason: "Closing connection".into(),
    };

    tokio::select! {
        biased;
        result = async {
            sink.send(Message::Close(Some(frame))).await?;
            sink.close().await
        } => {
            result.map_err(|e| FetchError::Close(e.to_string()))?;
            info!("Connection closed");
            Ok(())
        }
        () = deadline.cancelled() => {
            Err(FetchError::Close("deadline elapsed during close handshake".to_string()))
        }
    }
}
