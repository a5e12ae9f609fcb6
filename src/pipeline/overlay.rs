//! Overlay draw-list generation for the live video surface.

use super::detection::{Detection, Rect};

/// Visual treatment of a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxStyle {
    /// The detection matches the active lesson's target class.
    Target,
    /// Any other detection.
    Other,
}

impl BoxStyle {
    /// Stroke color as a CSS hex string.
    pub fn stroke_color(&self) -> &'static str {
        match self {
            Self::Target => "#22C55E",
            Self::Other => "#00FF00",
        }
    }

    /// Stroke weight in pixels.
    pub fn stroke_width(&self) -> f32 {
        match self {
            Self::Target => 4.0,
            Self::Other => 2.0,
        }
    }
}

/// One box plus its label, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBox {
    pub rect: Rect,
    /// `"{class} {confidence}%"` with the percentage rounded to one decimal.
    pub label: String,
    pub style: BoxStyle,
}

/// A complete overlay for one frame.
///
/// `width`/`height` are the video's native geometry; the drawing surface
/// must be resized to them before every draw, since geometry can change
/// between sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayFrame {
    pub width: u32,
    pub height: u32,
    pub boxes: Vec<OverlayBox>,
}

impl OverlayFrame {
    /// Boxes carrying the target style.
    pub fn target_boxes(&self) -> impl Iterator<Item = &OverlayBox> {
        self.boxes.iter().filter(|b| b.style == BoxStyle::Target)
    }
}

/// Build the overlay for one detection batch.
///
/// Pure function of its inputs: no state is kept between calls. Detections
/// whose class case-insensitively equals `target` get [`BoxStyle::Target`],
/// everything else [`BoxStyle::Other`]. With no target, every box is
/// [`BoxStyle::Other`].
pub fn render_overlay(
    detections: &[Detection],
    target: Option<&str>,
    width: u32,
    height: u32,
) -> OverlayFrame {
    let boxes = detections
        .iter()
        .map(|det| {
            let style = match target {
                Some(t) if det.matches_target(t) => BoxStyle::Target,
                _ => BoxStyle::Other,
            };
            OverlayBox {
                rect: det.rect,
                label: format!("{} {:.1}%", det.class, det.confidence_percent()),
                style,
            }
        })
        .collect();

    OverlayFrame {
        width,
        height,
        boxes,
    }
}
