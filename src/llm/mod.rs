//! LanguageModel capability: chat messages, the `LanguageModel` trait and an
//! OpenAI-compatible client.

pub mod client;
pub mod types;

pub use client::{LanguageModel, ModelError, OpenAiClient};
pub use types::{Message, Role};
