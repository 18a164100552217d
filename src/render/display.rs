//! Display sinks for previews and instructions.

use super::encode::decode_payload;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

/// Receives rendered previews for presentation.
pub trait DisplaySink: Send {
    /// Presents an encoded image (a data URL).
    fn show_image(&mut self, data_url: &str);

    /// Hides (`true`) or reveals (`false`) the image.
    fn hide_image(&mut self, hide: bool);

    /// Shows an instruction text to the operator.
    fn show_instruction(&mut self, text: &str);
}

/// What a [`RecordingDisplay`] has been asked to show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayLog {
    pub images: Vec<String>,
    pub hidden: bool,
    pub instruction: Option<String>,
}

/// Display sink that records every request. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    log: Arc<Mutex<DisplayLog>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded requests.
    pub fn log(&self) -> DisplayLog {
        self.lock().clone()
    }

    /// The most recently shown image.
    pub fn last_image(&self) -> Option<String> {
        self.lock().images.last().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, DisplayLog> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DisplaySink for RecordingDisplay {
    fn show_image(&mut self, data_url: &str) {
        self.lock().images.push(data_url.to_string());
    }

    fn hide_image(&mut self, hide: bool) {
        self.lock().hidden = hide;
    }

    fn show_instruction(&mut self, text: &str) {
        self.lock().instruction = Some(text.to_string());
    }
}

/// Display sink that writes the latest preview to a JPEG file.
#[derive(Debug, Clone)]
pub struct FileDisplay {
    path: PathBuf,
}

impl FileDisplay {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DisplaySink for FileDisplay {
    fn show_image(&mut self, data_url: &str) {
        let result = decode_payload(data_url)
            .map_err(|e| e.to_string())
            .and_then(|bytes| std::fs::write(&self.path, bytes).map_err(|e| e.to_string()));
        match result {
            Ok(()) => info!(path = %self.path.display(), "Preview written"),
            Err(e) => warn!(path = %self.path.display(), "Failed to write preview: {}", e),
        }
    }

    fn hide_image(&mut self, hide: bool) {
        info!(hide, "Preview visibility changed");
    }

    fn show_instruction(&mut self, text: &str) {
        info!("Instruction: {}", text);
    }
}
