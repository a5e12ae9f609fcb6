//! Load-test scenario against a live backend.
//!
//! Simulates virtual users opening their progress page and practicing with
//! the camera: GET user progress, GET user stats, POST one frame to the
//! predict endpoint, short pause, repeat. Configuration via environment:
//! `BASE_URL`, `USER_ID`, `VUS`, `DURATION_SECS`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use anyhow::Context;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tokio::sync::Mutex;

use signpractice_rs::{EncodedFrame, InferenceClient, SyncClient};

// 1x1 JPEG used as the practice frame payload.
const SAMPLE_FRAME_BASE64: &str = "/9j/4AAQSkZJRgABAQEAYABgAAD/2wBDAAEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQH/2wBDAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQH/wAARCAABAAEDASIAAhEBAxEB/8QAFQABAQAAAAAAAAAAAAAAAAAAAAv/xAAUEAEAAAAAAAAAAAAAAAAAAAAA/8QAFQEBAQAAAAAAAAAAAAAAAAAAAAX/xAAUEQEAAAAAAAAAAAAAAAAAAAAA/9oADAMBAAIRAxEAPwA/8A8A";

#[derive(Default)]
struct Metrics {
    requests: AtomicU64,
    failures: AtomicU64,
    latencies: Mutex<Vec<Duration>>,
}

impl Metrics {
    async fn record(&self, latency: Duration, ok: bool) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        self.latencies.lock().await.push(latency);
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let base_url = env_or("BASE_URL", "http://127.0.0.1:8000");
    let user_id: i64 = env_or("USER_ID", "6").parse().context("bad USER_ID")?;
    let vus: usize = env_or("VUS", "10").parse().context("bad VUS")?;
    let duration_secs: u64 = env_or("DURATION_SECS", "60")
        .parse()
        .context("bad DURATION_SECS")?;

    let jpeg = STANDARD
        .decode(SAMPLE_FRAME_BASE64)
        .context("embedded sample frame is invalid")?;
    let frame = EncodedFrame::new(jpeg, 1, 1)?;

    let inference = InferenceClient::new(&base_url)?;
    anyhow::ensure!(
        inference.health().await,
        "backend at {base_url} failed its health check"
    );

    tracing::info!(%base_url, vus, duration_secs, "starting load test");

    let metrics = Arc::new(Metrics::default());
    let deadline = Instant::now() + Duration::from_secs(duration_secs);

    let mut workers = Vec::with_capacity(vus);
    for _ in 0..vus {
        let inference = inference.clone();
        let sync = SyncClient::new(&base_url, user_id)?;
        let frame = frame.clone();
        let metrics = Arc::clone(&metrics);

        workers.push(tokio::spawn(async move {
            while Instant::now() < deadline {
                let started = Instant::now();
                let ok = sync.user_progress().await.is_ok();
                metrics.record(started.elapsed(), ok).await;

                let started = Instant::now();
                let ok = sync.user_stats().await.is_ok();
                metrics.record(started.elapsed(), ok).await;

                let started = Instant::now();
                let ok = inference.detect(&frame).await.is_ok();
                metrics.record(started.elapsed(), ok).await;

                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }));
    }

    for worker in workers {
        worker.await?;
    }

    let requests = metrics.requests.load(Ordering::Relaxed);
    let failures = metrics.failures.load(Ordering::Relaxed);
    let mut latencies = metrics.latencies.lock().await.clone();
    latencies.sort();

    let mean = if latencies.is_empty() {
        Duration::ZERO
    } else {
        latencies.iter().sum::<Duration>() / latencies.len() as u32
    };
    let p95 = latencies
        .get(latencies.len().saturating_sub(1) * 95 / 100)
        .copied()
        .unwrap_or_default();
    let max = latencies.last().copied().unwrap_or_default();

    tracing::info!(
        requests,
        failures,
        mean_ms = mean.as_millis() as u64,
        p95_ms = p95.as_millis() as u64,
        max_ms = max.as_millis() as u64,
        "load test finished"
    );
    Ok(())
}
