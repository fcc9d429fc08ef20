//! Local language model access through Ollama's HTTP API.

pub mod client;
pub mod models;

pub use client::{LlmConfig, OllamaClient, DEFAULT_HOST, DEFAULT_MODEL};
pub use models::{ChatMessage, ModelInfo};
