//! # EchoChat
//!
//! Talk to a chat partner's voice. EchoChat parses an exported chat log,
//! profiles how a chosen speaker writes, retrieves their most relevant past
//! messages for each new input with TF-IDF similarity, and sends the
//! resulting prompt to a language model.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────┐
//! │ chat log  │──▶│ LogNormalizer│──▶│ style + TF-IDF│──▶│ Provider │
//! │  (.txt)   │   │   (core)     │   │ retrieval     │   │ Ollama / │
//! └───────────┘   └──────────────┘   └──────┬───────┘   │ Gemini   │
//!                                           │           └────┬─────┘
//!                                           ▼                ▼
//!                                     ┌──────────┐     ┌──────────┐
//!                                     │  prompt  │────▶│ Session  │
//!                                     └──────────┘     └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`ingest`] | Read and normalize chat logs |
//! | [`export`] | Tabular (CSV/JSON) output |
//! | [`completion`] | Ollama and Gemini providers |
//! | [`session`] | Per-turn retrieval, prompting, and history |
//! | [`retrieve`] | `retrieve` / `prompt` commands |
//! | [`inspect`] | `speakers` / `profile` commands |
//! | [`chat`] | Interactive loop |

pub mod chat;
pub mod completion;
pub mod config;
pub mod export;
pub mod ingest;
pub mod inspect;
pub mod retrieve;
pub mod session;
