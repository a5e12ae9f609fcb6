//! Real-time sign-language practice pipeline.
//!
//! The crate is split into two halves:
//!
//! - [`pipeline`] — the capture-and-detect loop: a [`FrameSource`] feeds
//!   JPEG frames to an [`InferenceClient`] that exchanges them with a remote
//!   YOLO service, and the resulting detections are turned into an overlay
//!   draw list. One exchange per tick, fire-and-forget, last-writer-wins.
//! - [`session`] — the practice session state around the loop: the
//!   match/completion state machine with its cooldown window, the local
//!   lesson-progress store, and the best-effort remote sync client.
//!
//! ```ignore
//! use signpractice_rs::{CaptureLoop, InferenceClient, MatchMachine, ProgressStore};
//!
//! let client = InferenceClient::new("http://localhost:8000")?;
//! let mut capture = CaptureLoop::new(camera, client, Default::default());
//! let mut updates = capture.subscribe();
//! let handle = capture.start()?;
//! // drive `capture.run()` and feed `updates` into a `MatchMachine`
//! ```

pub mod pipeline;
pub mod session;

pub use pipeline::{
    BoxStyle, CaptureConfig, CaptureError, CaptureHandle, CaptureLoop, ClientError, Detection,
    DetectionStats, DetectionUpdate, EncodedFrame, FrameError, FrameSource, InferenceClient,
    OverlayBox, OverlayFrame, PredictEndpoint, Rect, render_overlay,
};
pub use session::{
    Completion, LessonProgress, MatchMachine, MatchState, ProgressError, ProgressStore,
    SessionSnapshot, SyncClient, UserStats,
};
