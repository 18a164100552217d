//! In-memory transport that records uploads and events.

use super::{EventPayload, Transport, TransportError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// An event captured by [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub name: String,
    pub payload: EventPayload,
}

#[derive(Debug, Default)]
struct Recorded {
    uploads: Vec<String>,
    events: Vec<RecordedEvent>,
}

/// Transport that keeps everything in memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    recorded: Arc<Mutex<Recorded>>,
    fail_uploads: Arc<AtomicBool>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent uploads fail (`true`) or succeed (`false`).
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Uploaded base64 blobs, in order.
    pub fn uploads(&self) -> Vec<String> {
        self.lock().uploads.clone()
    }

    /// Reported events, in order.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.lock().events.clone()
    }

    /// The most recent event with `name`.
    pub fn last_event(&self, name: &str) -> Option<EventPayload> {
        self.lock()
            .events
            .iter()
            .rev()
            .find(|e| e.name == name)
            .map(|e| e.payload.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn upload_temporary_file(&self, blob_base64: &str) -> Result<String, TransportError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(TransportError::Rejected("upload disabled".to_string()));
        }
        let mut recorded = self.lock();
        recorded.uploads.push(blob_base64.to_string());
        Ok(format!("/tmp/upload-{}", recorded.uploads.len()))
    }

    async fn send_event(&self, name: &str, payload: EventPayload) -> Result<(), TransportError> {
        self.lock().events.push(RecordedEvent {
            name: name.to_string(),
            payload,
        });
        Ok(())
    }
}
