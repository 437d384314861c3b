//! # loopcraft-llm
//!
//! Chat-completion client layer for loopcraft.
//!
//! Everything above this crate depends only on the [`ChatClient`] trait,
//! a single `complete(messages) -> text` operation. [`OpenAiClient`] is
//! the production implementation against any OpenAI-compatible
//! chat-completions endpoint, with a bounded per-request timeout and a
//! small retry budget for transient failures.
//!
//! ## Key Types
//!
//! - [`ChatClient`] - The narrow model-call contract
//! - [`OpenAiClient`] - reqwest-backed client with retry/backoff
//! - [`LlmConfig`] - Credential, endpoint, model and retry policy
//! - [`Message`] / [`Role`] - Chat transcript entries

mod client;
mod config;
mod error;
mod message;
mod openai;

#[cfg(feature = "test-util")]
pub mod testing;

pub use client::ChatClient;
pub use config::{LlmConfig, API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use error::LlmError;
pub use message::{Message, Role};
pub use openai::OpenAiClient;
