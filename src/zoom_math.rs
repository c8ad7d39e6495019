//! Panel-to-viewport mathematics.
//!
//! Pure functions mapping panels between the three coordinate spaces:
//! natural (intrinsic image pixels), rendered (on-screen image pixels) and
//! viewport (the fixed container the rendered image is transformed inside).
//! Nothing here keeps state; every transform is recomputed from natural
//! coordinates so repeated zooms never drift.

use thiserror::Error;

use crate::model::{Panel, Size};

/// Errors produced by the geometry mapper.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    /// The panel has no usable extent once mapped to rendered pixels
    #[error("Degenerate panel: {width_px}x{height_px} rendered pixels")]
    DegeneratePanel { width_px: f64, height_px: f64 },
}

/// Percent-based placement of a panel overlay, independent of rendered size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayRect {
    pub left_pct: f64,
    pub top_pct: f64,
    pub width_pct: f64,
    pub height_pct: f64,
}

/// Translate-then-scale transform applied to the rendered image.
///
/// The origin is the top-left corner of the rendered image: a rendered point
/// `p` ends up at `p * scale + translate` in the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
}

impl ViewportTransform {
    /// Create a new transform.
    pub fn new(translate_x: f64, translate_y: f64, scale: f64) -> Self {
        Self {
            translate_x,
            translate_y,
            scale,
        }
    }

    /// Create an identity transform (scale=1, no translation).
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Map a rendered-space point into viewport space.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.scale + self.translate_x,
            y * self.scale + self.translate_y,
        )
    }
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Position of a panel overlay as percentages of the natural image size.
pub fn overlay_rect(panel: &Panel, natural: Size) -> OverlayRect {
    OverlayRect {
        left_pct: panel.x / natural.width * 100.0,
        top_pct: panel.y / natural.height * 100.0,
        width_pct: panel.width / natural.width * 100.0,
        height_pct: panel.height / natural.height * 100.0,
    }
}

/// Compute the transform that frames `panel` inside the viewport.
///
/// The algorithm:
/// 1. Scale the panel from natural to rendered pixels, per axis
/// 2. Pick the largest scale that keeps the whole panel visible (contain-fit)
/// 3. Translate so the scaled panel is centered in the viewport
///
/// # Arguments
/// * `panel` - Panel bounds in natural pixels
/// * `natural` - Intrinsic image size
/// * `rendered` - Current on-screen image size
/// * `viewport` - Current container size
///
/// # Returns
/// The transform, or `DegeneratePanel` if the rendered panel has no width
/// or height.
pub fn zoom_transform(
    panel: &Panel,
    natural: Size,
    rendered: Size,
    viewport: Size,
) -> Result<ViewportTransform, GeometryError> {
    let ratio_x = rendered.width / natural.width;
    let ratio_y = rendered.height / natural.height;

    let left_px = panel.x * ratio_x;
    let top_px = panel.y * ratio_y;
    let width_px = panel.width * ratio_x;
    let height_px = panel.height * ratio_y;

    let usable = |v: f64| v.is_finite() && v > 0.0;
    if !usable(width_px) || !usable(height_px) || !left_px.is_finite() || !top_px.is_finite() {
        return Err(GeometryError::DegeneratePanel {
            width_px,
            height_px,
        });
    }

    let scale = (viewport.width / width_px).min(viewport.height / height_px);

    Ok(ViewportTransform {
        translate_x: -left_px * scale + (viewport.width - width_px * scale) / 2.0,
        translate_y: -top_px * scale + (viewport.height - height_px * scale) / 2.0,
        scale,
    })
}

/// Find the first panel (in reading order) under a rendered-space point.
///
/// `x`/`y` are relative to the top-left corner of the rendered image.
pub fn hit_test(panels: &[Panel], natural: Size, rendered: Size, x: f64, y: f64) -> Option<usize> {
    if !rendered.is_positive() {
        return None;
    }
    let natural_x = x * natural.width / rendered.width;
    let natural_y = y * natural.height / rendered.height;
    panels
        .iter()
        .position(|p| p.contains_point(natural_x, natural_y))
}
