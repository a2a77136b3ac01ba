//! HTTP access to the conversation backend.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{
    stream_endpoint, ConversationSummary, StreamMessageRequest, CONVERSATIONS_ENDPOINT,
};
use crate::core::transport::{Transport, TransportError};
use crate::utils::url::construct_api_url;

const MAX_ERROR_MESSAGE_CHARS: usize = 200;

#[derive(Clone, Debug)]
pub struct ConversationClient {
    client: reqwest::Client,
    base_url: String,
}

impl ConversationClient {
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Conversations for the current user, most recent first.
    pub async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, TransportError> {
        let url = construct_api_url(&self.base_url, CONVERSATIONS_ENDPOINT);
        let response = self.client.get(url).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Prepare a streamed reply to `content`. Nothing is sent until the
    /// returned transport is first read.
    pub fn open_stream(
        &self,
        conversation_id: i64,
        content: &str,
        model: &str,
        cancel_token: CancellationToken,
    ) -> HttpTransport {
        let url = construct_api_url(&self.base_url, &stream_endpoint(conversation_id));
        let request = self
            .client
            .post(url)
            .json(&StreamMessageRequest { content, model });
        HttpTransport::new(request, cancel_token)
    }
}

enum HttpState {
    Pending(reqwest::RequestBuilder),
    Streaming(BoxStream<'static, Result<Vec<u8>, reqwest::Error>>),
    Done,
}

/// Streaming response body of a single request.
///
/// Cancelling the token closes the stream; the next read reports
/// [`TransportError::Closed`].
pub struct HttpTransport {
    state: HttpState,
    cancel_token: CancellationToken,
}

impl HttpTransport {
    pub fn new(request: reqwest::RequestBuilder, cancel_token: CancellationToken) -> Self {
        Self {
            state: HttpState::Pending(request),
            cancel_token,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        if self.cancel_token.is_cancelled() {
            self.state = HttpState::Done;
            return Err(TransportError::Closed);
        }

        let mut stream = match std::mem::replace(&mut self.state, HttpState::Done) {
            HttpState::Done => return Ok(None),
            HttpState::Streaming(stream) => stream,
            HttpState::Pending(request) => {
                let response = tokio::select! {
                    _ = self.cancel_token.cancelled() => return Err(TransportError::Closed),
                    response = request.send() => response?,
                };
                let response = ensure_success(response).await?;
                debug!(status = response.status().as_u16(), url = %response.url(), "Response stream opened");
                response
                    .bytes_stream()
                    .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
                    .boxed()
            }
        };

        let next = tokio::select! {
            _ = self.cancel_token.cancelled() => return Err(TransportError::Closed),
            next = stream.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                self.state = HttpState::Streaming(stream);
                Ok(Some(chunk))
            }
            Some(Err(err)) => Err(TransportError::Network(err)),
            None => Ok(None),
        }
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).or_else(|| status.canonical_reason().map(str::to_owned));
    Err(TransportError::Status {
        status: status.as_u16(),
        message,
    })
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| collapse_whitespace(&text))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Human-readable message from an error body, if there is one worth showing.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return extract_error_summary(&json).filter(|s| !s.is_empty());
    }

    // Framework error pages are HTML; the status reason says more.
    if trimmed.starts_with('<') {
        return None;
    }

    let collapsed = collapse_whitespace(trimmed);
    Some(collapsed.chars().take(MAX_ERROR_MESSAGE_CHARS).collect())
}
