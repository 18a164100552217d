//! Transport that stores uploads on the local filesystem and prints
//! events as JSON lines.

use super::{EventPayload, Transport, TransportError};
use crate::render::decode_payload;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Writes each upload to `<dir>/upload-<n>.jpg` and returns that path.
#[derive(Debug)]
pub struct LocalTransport {
    dir: PathBuf,
    next_upload: AtomicU64,
}

impl LocalTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next_upload: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn upload_temporary_file(&self, blob_base64: &str) -> Result<String, TransportError> {
        let bytes =
            decode_payload(blob_base64).map_err(|e| TransportError::InvalidPayload(e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let index = self.next_upload.fetch_add(1, Ordering::SeqCst);
        let path = self.dir.join(format!("upload-{}.jpg", index));
        tokio::fs::write(&path, &bytes).await?;

        info!(path = %path.display(), bytes = bytes.len(), "Upload stored");
        Ok(path.display().to_string())
    }

    async fn send_event(&self, name: &str, payload: EventPayload) -> Result<(), TransportError> {
        let line = serde_json::json!({ "event": name, "payload": payload });
        println!("{}", line);
        Ok(())
    }
}
