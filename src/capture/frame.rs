//! Still-image buffer holding the most recently grabbed frame.

use image::RgbImage;
use std::time::{Duration, Instant};

/// The currently active still image.
///
/// Replaced on each successful grab; no history is kept. The buffer
/// starts out blank at the requested capture size and is considered
/// unset until the first successful grab.
#[derive(Clone)]
pub struct FrameBuffer {
    /// RGB pixel data.
    image: RgbImage,
    /// Number of successful grabs into this buffer.
    sequence: u64,
    /// Stream generation the current frame was captured from.
    generation: u64,
    /// Time of the last successful grab.
    captured_at: Option<Instant>,
}

impl FrameBuffer {
    /// Creates a blank, unset buffer with the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::new(width, height),
            sequence: 0,
            generation: 0,
            captured_at: None,
        }
    }

    /// Returns the current image.
    #[inline]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Returns the current image mutably.
    #[inline]
    pub fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    /// Returns the buffer width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Returns the buffer height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Returns `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Returns the grab sequence number (0 while unset).
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the stream generation of the current frame.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the time of the last successful grab.
    #[inline]
    pub fn captured_at(&self) -> Option<Instant> {
        self.captured_at
    }

    /// Whether a frame has been grabbed into this buffer.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.sequence > 0
    }

    /// Replaces the contents with a fully painted frame from `generation`.
    ///
    /// Returns the time elapsed since the previous frame, if any.
    pub fn store(&mut self, image: RgbImage, generation: u64) -> Option<Duration> {
        let now = Instant::now();
        let since_previous = self.captured_at.map(|t| now.duration_since(t));

        self.image = image;
        self.sequence += 1;
        self.generation = generation;
        self.captured_at = Some(now);
        since_previous
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("sequence", &self.sequence)
            .field("generation", &self.generation)
            .finish()
    }
}
