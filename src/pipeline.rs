//! Capture-and-detect pipeline.
//!
//! This module provides the real-time loop that acquires camera frames,
//! exchanges them with the remote detection service, and produces overlay
//! draw lists aligned to the video geometry.

mod capture;
mod client;
mod detection;
mod frame;
mod overlay;

pub use capture::{CaptureConfig, CaptureError, CaptureHandle, CaptureLoop, DetectionUpdate};
pub use client::{ClientError, InferenceClient, PredictEndpoint};
pub use detection::{Detection, DetectionStats, Rect};
pub use frame::{EncodedFrame, FrameError, FrameSource};
pub use overlay::{BoxStyle, OverlayBox, OverlayFrame, render_overlay};
