//! Command dispatch with results reported as named events.

use super::CaptureController;
use crate::error::CaptureError;
use crate::transport::{EventPayload, TransportError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

/// Operations a harness may request by name.
///
/// Serialised as `{"command": "<name>", ...arguments}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Enable,
    Disable,
    GrabFrame,
    GrabFrameAndTransmitBack,
    DetectFaces,
    ScanQrCode,
    ShowImage { ratio: f64 },
    HideImage { hide: bool },
    ShowInstruction { text: String },
    StreamState,
}

impl Command {
    /// Identifier of the command, also used as the default event name.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Enable => "enable",
            Command::Disable => "disable",
            Command::GrabFrame => "grab_frame",
            Command::GrabFrameAndTransmitBack => "grab_frame_and_transmit_back",
            Command::DetectFaces => "detect_faces",
            Command::ScanQrCode => "scan_qr_code",
            Command::ShowImage { .. } => "show_image",
            Command::HideImage { .. } => "hide_image",
            Command::ShowInstruction { .. } => "show_instruction",
            Command::StreamState => "stream_state",
        }
    }
}

impl CaptureController {
    /// Runs `command` and returns its result as JSON.
    pub async fn execute(&mut self, command: &Command) -> Result<Value, CaptureError> {
        let value = match command {
            Command::Enable => {
                self.enable().await?;
                Value::Null
            }
            Command::Disable => {
                self.disable();
                Value::Null
            }
            Command::GrabFrame => {
                self.grab_frame().await?;
                Value::Null
            }
            Command::GrabFrameAndTransmitBack => json!(self.grab_frame_and_transmit_back().await?),
            Command::DetectFaces => json!(self.detect_faces().await?),
            Command::ScanQrCode => json!(self.scan_qr_code().await?),
            Command::ShowImage { ratio } => {
                self.show_image(*ratio)?;
                Value::Null
            }
            Command::HideImage { hide } => {
                self.hide_image(*hide);
                Value::Null
            }
            Command::ShowInstruction { text } => {
                self.show_instruction(text);
                Value::Null
            }
            Command::StreamState => json!(self.stream_state().to_string()),
        };
        Ok(value)
    }

    /// Runs `command` and reports the outcome as event `event_name`.
    ///
    /// Failures of the command become `{"error": "<Kind>: <message>"}`;
    /// only a failure to send the event itself is returned.
    pub async fn dispatch(
        &mut self,
        event_name: &str,
        command: &Command,
    ) -> Result<(), TransportError> {
        let payload = match self.execute(command).await {
            Ok(data) => EventPayload::data(data),
            Err(e) => {
                warn!(command = command.name(), "Command failed: {}", e);
                EventPayload::error(e.report())
            }
        };
        self.transport.send_event(event_name, payload).await
    }

    /// Parses a JSON command and dispatches it.
    ///
    /// Unparseable input is reported as an `InvalidCommand` error event.
    pub async fn dispatch_json(
        &mut self,
        event_name: &str,
        raw: &str,
    ) -> Result<(), TransportError> {
        match serde_json::from_str::<Command>(raw) {
            Ok(command) => self.dispatch(event_name, &command).await,
            Err(e) => {
                warn!("Rejected command: {}", e);
                self.transport
                    .send_event(event_name, EventPayload::error(format!("InvalidCommand: {}", e)))
                    .await
            }
        }
    }
}
