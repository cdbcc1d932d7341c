//! Streaming chat-completion client for OpenAI-compatible endpoints.

mod client;
mod sse;
mod types;

pub use client::{CompletionClient, FragmentStream};
