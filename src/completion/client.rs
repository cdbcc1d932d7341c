//! Opens streaming completion requests and turns the response body into a
//! lazy sequence of text fragments.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::{Stream, StreamExt, stream};
use tracing::{debug, warn};

use super::sse::SseDecoder;
use super::types::{ChatChunk, ChatMessage, ChatRequest, Role};
use crate::error::RequestError;
use crate::settings::ProviderSettings;

/// A finite, non-restartable sequence of incremental text fragments.
///
/// Ends after the terminal marker; a transport or framing failure surfaces
/// as one final `Err` item.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, RequestError>> + Send>>;

/// Client for OpenAI-compatible streaming chat completions.
pub struct CompletionClient {
    http: reqwest::Client,
}

impl CompletionClient {
    pub fn new() -> Result<Self, RequestError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("expound/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                RequestError::Configuration(format!("Failed to build reqwest client: {e}"))
            })?;

        Ok(Self { http })
    }

    /// Open a one-shot streaming exchange: one system message, one user
    /// message, `stream: true`.
    ///
    /// Fails fast with a [`RequestError`] when the connection cannot be
    /// established or the endpoint rejects the request (bad credential,
    /// unknown model, ...). No retries are attempted.
    #[tracing::instrument(
        name = "open_completion_stream",
        skip(self, system_prompt, user_prompt),
        fields(base_url = %settings.base_url, model = %settings.model),
        err
    )]
    pub async fn stream_chat(
        &self,
        settings: &ProviderSettings,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<FragmentStream, RequestError> {
        let url = chat_completions_url(&settings.base_url);
        let request = ChatRequest {
            model: settings.model.clone(),
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: Role::User,
                    content: user_prompt.to_string(),
                },
            ],
            stream: true,
        };

        // Some transports reject an empty bearer token outright; providers
        // that need no credential accept any placeholder.
        let credential = if settings.api_key.is_empty() {
            "-"
        } else {
            settings.api_key.as_str()
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(credential)
            .json(&request)
            .send()
            .await
            .map_err(|e| RequestError::Network {
                message: format!("Failed to reach {url}"),
                source: Box::new(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(status = %status, "Completion endpoint rejected the request");
            return Err(RequestError::Api {
                message: body,
                status_code: status.as_u16(),
            });
        }

        debug!(status = %status, "Completion stream opened");
        Ok(fragment_stream(response))
    }
}

/// Join the configured base address with the chat-completions path,
/// tolerating a trailing slash on the base.
fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

struct StreamState {
    body: Pin<Box<dyn Stream<Item = reqwest::Result<bytes::Bytes>> + Send>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

/// Adapt the raw response body into an ordered fragment stream.
///
/// Frames without a text delta yield nothing. A body that ends without the
/// `[DONE]` marker counts as abnormal termination and produces a final
/// `Err` item.
fn fragment_stream(response: reqwest::Response) -> FragmentStream {
    let state = StreamState {
        body: Box::pin(response.bytes_stream()),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            // Drain decoded frames before touching the network again so
            // fragments keep their receipt order.
            while let Some(payload) = state.pending.pop_front() {
                match parse_delta(&payload) {
                    Ok(Some(text)) => return Some((Ok(text), state)),
                    Ok(None) => continue,
                    Err(err) => {
                        state.finished = true;
                        return Some((Err(err), state));
                    }
                }
            }

            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(bytes)) => {
                    state.pending.extend(state.decoder.feed(&bytes));
                    if state.decoder.is_terminated() {
                        state.finished = true;
                    }
                }
                Some(Err(err)) => {
                    state.finished = true;
                    return Some((
                        Err(RequestError::Stream {
                            message: format!("Transport failed mid-stream: {err}"),
                        }),
                        state,
                    ));
                }
                None => {
                    state.finished = true;
                    if state.decoder.is_terminated() {
                        return None;
                    }
                    return Some((
                        Err(RequestError::Stream {
                            message: "Response body ended before the terminal marker".to_string(),
                        }),
                        state,
                    ));
                }
            }
        }
    }))
}

/// Extract the text delta from one frame. `None` for role-only or otherwise
/// empty deltas.
fn parse_delta(payload: &str) -> Result<Option<String>, RequestError> {
    let chunk: ChatChunk = serde_json::from_str(payload).map_err(|e| RequestError::Parse {
        message: format!("Malformed completion chunk: {payload}"),
        source: Box::new(e),
    })?;

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|text| !text.is_empty()))
}
