//! Structured-output client for the OpenAI chat-completions wire shape.

pub mod client;
pub mod error;

pub use client::{ChatTransport, HttpTransport, StructuredOutputClient, TransportResponse};
pub use error::ClientError;
