//! Playback element abstraction.

use super::{MediaStream, PlayListener};
use image::RgbImage;
use thiserror::Error;

/// Errors raised while painting a frame.
#[derive(Debug, Clone, Error)]
pub enum DrawError {
    #[error("playback element has no source")]
    NoSource,
    #[error("no frame has been rendered yet")]
    NoFrame,
}

/// The element a stream is bound to for playback.
///
/// Reports its native rendered size, which may differ from the
/// requested capture size, and paints its latest frame on demand.
pub trait PlaybackElement: Send {
    /// Registers the listener invoked whenever playback starts.
    fn set_play_listener(&mut self, listener: PlayListener);

    /// Binds a stream as the element's source. Autoplay is implied.
    fn set_source(&mut self, stream: MediaStream);

    /// Native `(width, height)` of the video being rendered.
    fn video_size(&self) -> (u32, u32);

    /// Paints the latest frame into `target` at the origin.
    fn draw_frame(&self, target: &mut RgbImage) -> Result<(), DrawError>;
}
