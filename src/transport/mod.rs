//! Remote collector channel.
//!
//! The controller uploads captured frames and reports command results as
//! named events. The channel itself is opaque; [`MemoryTransport`] and
//! [`LocalTransport`] are the in-process implementations.

mod local;
mod memory;

pub use local::LocalTransport;
pub use memory::{MemoryTransport, RecordedEvent};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a [`Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("upload rejected: {0}")]
    Rejected(String),
    #[error("transport i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid upload payload: {0}")]
    InvalidPayload(String),
    #[error("transport channel closed")]
    Closed,
}

/// Body of a reported event: either `{"data": ...}` or
/// `{"error": "<Kind>: <message>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    Data { data: serde_json::Value },
    Error { error: String },
}

impl EventPayload {
    pub fn data(data: impl Into<serde_json::Value>) -> Self {
        EventPayload::Data { data: data.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        EventPayload::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, EventPayload::Error { .. })
    }
}

/// Request/response channel to the remote collector.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Stores a base64 blob remotely and returns its path.
    async fn upload_temporary_file(&self, blob_base64: &str) -> Result<String, TransportError>;

    /// Reports a named event.
    async fn send_event(&self, name: &str, payload: EventPayload) -> Result<(), TransportError>;
}
