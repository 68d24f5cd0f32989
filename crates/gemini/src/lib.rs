//! Gemini generative-content client.
//!
//! - [`api`] wraps the REST `generateContent` endpoint and defines the
//!   [`ContentModel`](api::ContentModel) seam.
//! - [`messages`] holds the request/response wire types.
//! - [`client`] composes the decorating operations (space analysis, style
//!   description, restyling, initial proposal batch, edits) on top of any
//!   `ContentModel`.
//! - [`config`] loads credentials and model names from the environment.

pub mod api;
pub mod client;
pub mod config;
pub mod messages;

pub use api::{ContentModel, GeminiApi, GeminiApiError};
pub use client::{GenerationClient, GenerationError};
pub use config::{ConfigError, GeminiConfig};
