use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use signpractice_rs::{
    CaptureConfig, CaptureError, CaptureLoop, EncodedFrame, FrameSource, InferenceClient,
    PredictEndpoint,
};

/// Camera double that counts lifecycle calls through shared handles.
#[derive(Clone, Default)]
struct Counters {
    opens: Arc<AtomicUsize>,
    grabs: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

struct MockCamera {
    counters: Counters,
    deny: Arc<AtomicBool>,
}

impl MockCamera {
    fn new() -> (Self, Counters, Arc<AtomicBool>) {
        let counters = Counters::default();
        let deny = Arc::new(AtomicBool::new(false));
        (
            Self {
                counters: counters.clone(),
                deny: deny.clone(),
            },
            counters,
            deny,
        )
    }
}

impl FrameSource for MockCamera {
    type Error = std::io::Error;

    fn open(&mut self) -> Result<(), Self::Error> {
        if self.deny.load(Ordering::SeqCst) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "camera permission denied",
            ));
        }
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn grab(&mut self) -> Result<EncodedFrame, Self::Error> {
        self.counters.grabs.fetch_add(1, Ordering::SeqCst);
        Ok(EncodedFrame::new(vec![0xFF, 0xD8, 0xFF, 0xD9], 640, 480).unwrap())
    }

    fn close(&mut self) {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
    }
}

fn detections_body() -> serde_json::Value {
    json!({
        "detections": [
            { "class": "hello", "confidence": 0.91, "bbox": [10.0, 20.0, 110.0, 220.0] }
        ]
    })
}

fn fast_config() -> CaptureConfig {
    CaptureConfig {
        frame_interval: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn test_detect_json_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/yolo/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detections_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = InferenceClient::new(&server.uri()).unwrap();
    let frame = EncodedFrame::new(vec![0xFF, 0xD8], 640, 480).unwrap();
    let detections = client.detect(&frame).await.unwrap();

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].class, "hello");
    assert_eq!(detections[0].rect.to_tlbr(), [10.0, 20.0, 110.0, 220.0]);
}

#[tokio::test]
async fn test_detect_multipart_endpoint_variant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/model/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detections_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        InferenceClient::with_endpoint(&server.uri(), PredictEndpoint::MultipartFile).unwrap();
    let frame = EncodedFrame::new(vec![0xFF, 0xD8], 640, 480).unwrap();
    let detections = client.detect(&frame).await.unwrap();
    assert_eq!(detections.len(), 1);
}

#[tokio::test]
async fn test_malformed_body_is_zero_detections() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/yolo/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = InferenceClient::new(&server.uri()).unwrap();
    let frame = EncodedFrame::new(vec![0xFF, 0xD8], 640, 480).unwrap();
    assert!(client.detect(&frame).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_error_status_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/yolo/predict"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = InferenceClient::new(&server.uri()).unwrap();
    let frame = EncodedFrame::new(vec![0xFF, 0xD8], 640, 480).unwrap();
    assert!(client.detect(&frame).await.is_err());
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = InferenceClient::new(&server.uri()).unwrap();
    assert!(client.health().await);

    let dead = InferenceClient::new("http://127.0.0.1:1").unwrap();
    assert!(!dead.health().await);
}

#[tokio::test]
async fn test_capture_loop_publishes_latest_update() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/yolo/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detections_body()))
        .mount(&server)
        .await;

    let (camera, counters, _) = MockCamera::new();
    let client = InferenceClient::new(&server.uri()).unwrap();
    let mut capture = CaptureLoop::new(camera, client, fast_config());

    let mut updates = capture.subscribe();
    let handle = capture.start().unwrap();
    let waiter = tokio::spawn(async move {
        updates.changed().await.unwrap();
        handle.stop();
        updates
    });

    capture.run().await;

    let updates = waiter.await.unwrap();
    let update = updates.borrow().clone();
    assert_eq!(update.detections.len(), 1);
    assert_eq!(update.stats.total_detections, 1);
    assert!((update.stats.accuracy - 91.0).abs() < 1e-3);
    assert!(counters.grabs.load(Ordering::SeqCst) >= 1);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stale_response_discarded_after_stop() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/yolo/predict"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(detections_body())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let (camera, _, _) = MockCamera::new();
    let client = InferenceClient::new(&server.uri()).unwrap();
    let mut capture = CaptureLoop::new(camera, client, fast_config());

    let updates = capture.subscribe();
    let handle = capture.start().unwrap();
    let stopper = tokio::spawn(async move {
        // Let a few exchanges get in flight, then deactivate before any of
        // the delayed responses can resolve.
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.stop();
    });

    capture.run().await;
    stopper.await.unwrap();

    // Give the in-flight exchanges time to resolve; they must be dropped.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!updates.has_changed().unwrap());
    assert!(updates.borrow().detections.is_empty());
}

#[tokio::test]
async fn test_reactivation_releases_tracks_exactly_once_per_cycle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/yolo/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "detections": [] })))
        .mount(&server)
        .await;

    let (camera, counters, _) = MockCamera::new();
    let client = InferenceClient::new(&server.uri()).unwrap();
    let mut capture = CaptureLoop::new(camera, client, fast_config());

    for cycle in 1..=2u32 {
        let handle = capture.start().unwrap();
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            handle.stop();
        });
        capture.run().await;
        stopper.await.unwrap();

        assert_eq!(counters.opens.load(Ordering::SeqCst), cycle as usize);
        assert_eq!(counters.closes.load(Ordering::SeqCst), cycle as usize);
    }
}

#[tokio::test]
async fn test_device_error_leaves_loop_inactive() {
    let (camera, counters, deny) = MockCamera::new();
    deny.store(true, Ordering::SeqCst);

    let client = InferenceClient::new("http://127.0.0.1:1").unwrap();
    let mut capture = CaptureLoop::new(camera, client, fast_config());

    assert!(matches!(capture.start(), Err(CaptureError::Device(_))));
    assert!(!capture.is_active());
    assert_eq!(counters.closes.load(Ordering::SeqCst), 0);

    // Manual retry succeeds once the device becomes available.
    deny.store(false, Ordering::SeqCst);
    let handle = capture.start().unwrap();
    assert!(capture.is_active());
    handle.stop();
}
