//! Emberfall AI — the chat-completion transport.
//!
//! Every AI call in the engine goes through the `CompletionClient` trait:
//! one prompt in, raw text out, a transport error on timeout or HTTP
//! failure, and no retry at this layer. Retry policy, when present, lives
//! one level up in the stage that owns the call.

pub mod client;
pub mod payload;

pub use client::{CompletionClient, CompletionRequest, OpenAiCompatClient};
