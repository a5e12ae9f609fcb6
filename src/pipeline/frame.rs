//! Frame acquisition seam between the capture loop and a camera device.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Error type for frame handling.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame payload is empty")]
    Empty,
}

/// A single JPEG-encoded frame at the source's native resolution.
///
/// Exactly one frame, no history. The payload is opaque to the pipeline;
/// only the inference client ever looks inside.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
}

impl EncodedFrame {
    /// Wrap JPEG bytes with the source geometry. Empty payloads are rejected.
    pub fn new(jpeg: Vec<u8>, width: u32, height: u32) -> Result<Self, FrameError> {
        if jpeg.is_empty() {
            return Err(FrameError::Empty);
        }
        Ok(Self {
            jpeg,
            width,
            height,
        })
    }

    pub fn jpeg_bytes(&self) -> &[u8] {
        &self.jpeg
    }

    /// Native frame geometry as (width, height).
    pub fn geometry(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Encode as a `data:image/jpeg;base64,…` URL for the JSON predict
    /// endpoint.
    pub fn to_data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", STANDARD.encode(&self.jpeg))
    }
}

/// Trait for camera-like frame providers.
///
/// The capture loop exclusively owns the source lifecycle: it calls
/// [`open`](FrameSource::open) once on activation, [`grab`](FrameSource::grab)
/// once per tick, and [`close`](FrameSource::close) exactly once on every
/// exit path.
///
/// # Example
///
/// ```ignore
/// use signpractice_rs::{EncodedFrame, FrameSource};
///
/// struct Webcam { /* device handle */ }
///
/// impl FrameSource for Webcam {
///     type Error = std::io::Error;
///
///     fn open(&mut self) -> Result<(), Self::Error> {
///         // acquire the front-facing camera, may be denied
///         Ok(())
///     }
///
///     fn grab(&mut self) -> Result<EncodedFrame, Self::Error> {
///         // render the current frame to an offscreen buffer and encode
///         todo!()
///     }
///
///     fn close(&mut self) {
///         // stop all tracks; must be safe to call repeatedly
///     }
/// }
/// ```
pub trait FrameSource {
    /// Error type for acquisition failures (permission denied, no device).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Acquire the camera. Front-facing by default where the device
    /// distinguishes. A failure here leaves the source unopened; callers may
    /// retry manually.
    fn open(&mut self) -> Result<(), Self::Error>;

    /// Capture the current frame as a single JPEG at native resolution.
    fn grab(&mut self) -> Result<EncodedFrame, Self::Error>;

    /// Release all camera tracks. Idempotent.
    fn close(&mut self);
}
