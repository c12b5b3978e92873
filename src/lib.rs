//! # ChatKit Server
//!
//! Backend for a chat UI kit: streamed tool-calling chat, speech-to-text
//! and per-tool settings.
//!
//! ## Architecture
//!
//! ```text
//!   browser ──► /api/chat ──► tool loop ──► LlmClient (Groq)
//!                               │
//!                               ▼
//!                          ToolRegistry ◄── ToolBindings ◄── Catalog
//!
//!   browser ──► /api/transcribe ──► Transcriber (Groq Whisper)
//!   browser ──► /api/settings   ──► SettingsStore ──► StorageBackend
//! ```
//!
//! ## Modules
//! - `api`: HTTP routes, the data-stream wire format and shared state
//! - `llm`: provider-neutral chat types and the streaming Groq client
//! - `tools`: executable tools, the UI catalog and the bindings between them
//! - `settings`: enabled flags and credentials with pluggable persistence
//! - `transcribe`: audio upload forwarding
//! - `config`: environment configuration

pub mod api;
pub mod config;
pub mod llm;
pub mod prompt;
pub mod settings;
pub mod tools;
pub mod transcribe;

pub use config::Config;
pub use settings::SettingsStore;
pub use tools::{Catalog, ToolBindings, ToolRegistry};
