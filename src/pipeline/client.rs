//! HTTP client for the external detection service.

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;

use super::detection::{Detection, Rect};
use super::frame::EncodedFrame;

/// Error type for exchanges with the backend.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid backend url: {0}")]
    Url(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned status {0}")]
    Status(StatusCode),
}

/// Which deployment variant of the predict endpoint to speak.
///
/// Both carry the same protocol (one frame in, a detection list out); only
/// the transport framing differs between deployments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PredictEndpoint {
    /// POST `/yolo/predict` with `{ "image": "<data URL>" }`.
    #[default]
    JsonDataUrl,
    /// POST `/model/predict` with a multipart `file` part.
    MultipartFile,
}

impl PredictEndpoint {
    fn path(&self) -> &'static str {
        match self {
            Self::JsonDataUrl => "yolo/predict",
            Self::MultipartFile => "model/predict",
        }
    }
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    detections: Vec<WireDetection>,
}

#[derive(Debug, Deserialize)]
struct WireDetection {
    class: String,
    #[serde(default)]
    confidence: f32,
    bbox: [f32; 4],
}

impl From<WireDetection> for Detection {
    fn from(wire: WireDetection) -> Self {
        let [x1, y1, x2, y2] = wire.bbox;
        Detection::new(wire.class, wire.confidence, Rect::from_tlbr(x1, y1, x2, y2))
    }
}

/// Client for the frame-for-detections exchange.
///
/// Cheap to clone; every exchange is independent and no exchange is ever
/// retried — the next capture tick naturally re-attempts.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    base_url: Url,
    endpoint: PredictEndpoint,
}

impl InferenceClient {
    /// Create a client against `base_url` with the JSON endpoint variant.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_endpoint(base_url, PredictEndpoint::default())
    }

    /// Create a client with an explicit endpoint variant.
    pub fn with_endpoint(base_url: &str, endpoint: PredictEndpoint) -> Result<Self, ClientError> {
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
            endpoint,
        })
    }

    /// Exchange one encoded frame for the detections found in it.
    ///
    /// An empty list is a valid outcome (nothing recognized). A malformed
    /// response body is a data error: logged and mapped to zero detections.
    /// Transport failures and non-success statuses are returned to the
    /// caller, which is expected to swallow and log them without stalling.
    pub async fn detect(&self, frame: &EncodedFrame) -> Result<Vec<Detection>, ClientError> {
        let url = self.base_url.join(self.endpoint.path())?;

        let request = match self.endpoint {
            PredictEndpoint::JsonDataUrl => self
                .http
                .post(url)
                .json(&serde_json::json!({ "image": frame.to_data_url() })),
            PredictEndpoint::MultipartFile => {
                let part = Part::bytes(frame.jpeg_bytes().to_vec())
                    .file_name("frame.jpg")
                    .mime_str("image/jpeg")?;
                self.http.post(url).multipart(Form::new().part("file", part))
            }
        };

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }

        match response.json::<PredictResponse>().await {
            Ok(body) => Ok(body.detections.into_iter().map(Detection::from).collect()),
            Err(err) => {
                tracing::debug!(%err, "malformed predict response, treating as no detections");
                Ok(Vec::new())
            }
        }
    }

    /// GET `/health`; true iff the backend answers 200.
    pub async fn health(&self) -> bool {
        let Ok(url) = self.base_url.join("health") else {
            return false;
        };
        match self.http.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::debug!(%err, "health check failed");
                false
            }
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}
