//! Detection data model returned by the inference service.

/// Bounding box in source-frame pixel coordinates.
///
/// Stored as TLWH (top-left x, top-left y, width, height); the wire format
/// uses TLBR corners, see [`Rect::from_tlbr`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions.
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR corners (x1, y1, x2, y2).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Convert to TLBR corners: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Get the center point of the bounding box.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Get the area of the bounding box.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// One recognized object instance from a single frame.
///
/// Produced fresh on each inference response and never persisted; ordering
/// within a response carries no meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Class label as reported by the model (e.g. a letter or sign name).
    pub class: String,
    /// Confidence score in `[0, 1]`.
    pub confidence: f32,
    /// Bounding box in source-frame pixels.
    pub rect: Rect,
}

impl Detection {
    pub fn new(class: impl Into<String>, confidence: f32, rect: Rect) -> Self {
        Self {
            class: class.into(),
            confidence,
            rect,
        }
    }

    /// Whether this detection's class equals `target`, case-insensitively.
    pub fn matches_target(&self, target: &str) -> bool {
        self.class.to_lowercase() == target.to_lowercase()
    }

    /// Confidence as a percentage.
    #[inline]
    pub fn confidence_percent(&self) -> f32 {
        self.confidence * 100.0
    }
}

/// Snapshot statistics over the latest detection batch only.
///
/// Recomputed per response, never cumulative across frames.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DetectionStats {
    /// Number of detections in the batch.
    pub total_detections: usize,
    /// Mean confidence across the batch, as a percentage. Zero when empty.
    pub accuracy: f32,
}

impl DetectionStats {
    pub fn from_batch(detections: &[Detection]) -> Self {
        if detections.is_empty() {
            return Self::default();
        }
        let sum: f32 = detections.iter().map(|d| d.confidence).sum();
        Self {
            total_detections: detections.len(),
            accuracy: sum / detections.len() as f32 * 100.0,
        }
    }
}
