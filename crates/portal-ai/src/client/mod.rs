//! OpenAI-compatible chat completion client.
//!
//! Talks to one `/v1/chat/completions` endpoint (llama.cpp server, vLLM,
//! and anything else speaking the same protocol). The client has no
//! notion of sessions: every call carries the full message list.

mod api;
mod client;
mod config;
mod wire;


pub use client::InferenceClient;
pub use config::InferenceConfig;
