//! Controller-level error taxonomy.

use crate::analysis::DetectionError;
use crate::capture::{AcquisitionError, DrawError};
use crate::render::RenderError;
use crate::transport::TransportError;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by [`crate::CaptureController`] operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("timeout from video element after {}ms", .0.as_millis())]
    StreamStartTimeout(Duration),

    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("no frame has been grabbed yet")]
    FrameBufferUnset,

    #[error("no active stream; call enable first")]
    StreamInactive,

    #[error(transparent)]
    Draw(#[from] DrawError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl CaptureError {
    /// Stable name of the error class, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            CaptureError::StreamStartTimeout(_) => "StreamStartTimeout",
            CaptureError::Acquisition(_) => "AcquisitionFailure",
            CaptureError::Detection(_) => "DetectionUnavailable",
            CaptureError::Transport(_) => "TransportFailure",
            CaptureError::FrameBufferUnset => "FrameBufferUnset",
            CaptureError::StreamInactive => "StreamInactive",
            CaptureError::Draw(_) => "FrameUnavailable",
            CaptureError::Render(_) => "RenderFailure",
        }
    }

    /// Formats the error as `"<kind>: <message>"`.
    pub fn report(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}
