//! The frame-capture loop driving one inference exchange per tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::client::InferenceClient;
use super::detection::{Detection, DetectionStats};
use super::frame::FrameSource;

/// Error type for capture activation failures.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Camera unavailable or permission denied. The loop stays inactive;
    /// the caller may retry activation manually.
    #[error("unable to access camera: {0}")]
    Device(#[source] E),
    #[error("capture loop is already active")]
    AlreadyActive,
}

/// Tick pacing configuration.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Minimum time between capture ticks. Missed ticks are skipped, never
    /// queued, so the request rate is bounded by the display rate.
    pub frame_interval: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            // 60 Hz display cadence
            frame_interval: Duration::from_millis(16),
        }
    }
}

/// The unit published after each successful exchange.
#[derive(Debug, Clone, Default)]
pub struct DetectionUpdate {
    pub detections: Vec<Detection>,
    pub stats: DetectionStats,
}

/// Remote control for a running [`CaptureLoop`].
#[derive(Debug, Clone)]
pub struct CaptureHandle {
    cancel: CancellationToken,
}

impl CaptureHandle {
    /// Request deactivation. The loop cancels its next tick, releases the
    /// camera, and discards any exchange still in flight when it resolves.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

/// Continuously grabs frames from a [`FrameSource`] and exchanges them with
/// the detection service, one fire-and-forget request per tick.
///
/// Successful exchanges publish to a `watch` channel, so observers always
/// see the most recently *received* response (last-writer-wins; no
/// correlation of in-flight requests). Failed exchanges are logged and
/// publish nothing, leaving the previous overlay in place until the next
/// success.
pub struct CaptureLoop<S: FrameSource> {
    source: S,
    client: InferenceClient,
    config: CaptureConfig,
    cancel: CancellationToken,
    active: bool,
    tx: Arc<watch::Sender<DetectionUpdate>>,
}

impl<S: FrameSource> CaptureLoop<S> {
    pub fn new(source: S, client: InferenceClient, config: CaptureConfig) -> Self {
        let (tx, _rx) = watch::channel(DetectionUpdate::default());
        Self {
            source,
            client,
            config,
            cancel: CancellationToken::new(),
            active: false,
            tx: Arc::new(tx),
        }
    }

    /// Subscribe to detection updates. Receivers observe only the latest
    /// published update.
    pub fn subscribe(&self) -> watch::Receiver<DetectionUpdate> {
        self.tx.subscribe()
    }

    /// Acquire the camera and arm the loop.
    ///
    /// On device failure the loop stays inactive and no retry is attempted;
    /// re-invoke manually. Returns a [`CaptureHandle`] for deactivation.
    pub fn start(&mut self) -> Result<CaptureHandle, CaptureError<S::Error>> {
        if self.active {
            return Err(CaptureError::AlreadyActive);
        }
        self.source.open().map_err(CaptureError::Device)?;
        self.cancel = CancellationToken::new();
        self.active = true;
        Ok(CaptureHandle {
            cancel: self.cancel.clone(),
        })
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Drive ticks until the handle is stopped, then release the camera.
    ///
    /// Per tick: grab the current frame and spawn one exchange. The next
    /// tick never waits on the previous response, so responses may arrive
    /// out of order or be overwritten. A response resolving after
    /// deactivation checks the cancellation token and is discarded.
    pub async fn run(&mut self) {
        if !self.active {
            return;
        }

        let mut ticks = tokio::time::interval(self.config.frame_interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticks.tick() => {}
            }

            let frame = match self.source.grab() {
                Ok(frame) => frame,
                Err(err) => {
                    tracing::warn!(%err, "frame grab failed, skipping tick");
                    continue;
                }
            };

            let client = self.client.clone();
            let tx = Arc::clone(&self.tx);
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                match client.detect(&frame).await {
                    Ok(detections) => {
                        // Stale responses after deactivation are dropped.
                        if cancel.is_cancelled() {
                            return;
                        }
                        let stats = DetectionStats::from_batch(&detections);
                        let _ = tx.send(DetectionUpdate { detections, stats });
                    }
                    Err(err) => {
                        tracing::warn!(%err, "inference exchange failed");
                    }
                }
            });
        }

        self.shutdown();
    }

    /// Cancel and release the camera. Safe to call repeatedly; tracks are
    /// closed at most once per activation.
    fn shutdown(&mut self) {
        if self.active {
            self.cancel.cancel();
            self.source.close();
            self.active = false;
        }
    }
}

impl<S: FrameSource> Drop for CaptureLoop<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
