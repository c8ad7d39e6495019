//! Render sink interface and a host-side overlay model.
//!
//! The navigator never touches a display directly. It tells a [`RenderSink`]
//! which overlays to draw, which one is active and which transform to put on
//! the rendered image, and asks it for the current on-screen sizes.

use crate::model::{Panel, Size};
use crate::zoom_math::{OverlayRect, ViewportTransform, overlay_rect};

/// On-screen sizes, measured at the moment a zoom is computed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DisplayMetrics {
    /// Size of the displayed image after responsive scaling
    pub rendered: Size,
    /// Size of the container the image is transformed inside
    pub viewport: Size,
}

/// Display surface driven by the navigator.
pub trait RenderSink {
    /// Replace all overlay rectangles with those of a new page.
    fn draw_overlays(&mut self, panels: &[Panel], natural_size: Size);

    /// Put `transform` on the rendered image (identity to reset).
    fn apply_transform(&mut self, transform: ViewportTransform);

    /// Mark one overlay active and hide its siblings, or restore all with `None`.
    fn set_active_panel(&mut self, index: Option<usize>);

    /// Current rendered image and viewport sizes.
    fn metrics(&self) -> DisplayMetrics;
}

/// Visibility of one overlay rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayVisibility {
    /// Shown with the normal outline
    Visible,
    /// Shown as the focused panel
    Active,
    /// Hidden while a sibling is active
    Hidden,
}

/// Overlay state for one page, ready for a host to paint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayLayer {
    rects: Vec<OverlayRect>,
    active: Option<usize>,
}

impl OverlayLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every overlay with those of `panels`; clears the active panel.
    pub fn draw(&mut self, panels: &[Panel], natural_size: Size) {
        self.rects = panels
            .iter()
            .map(|p| overlay_rect(p, natural_size))
            .collect();
        self.active = None;
    }

    /// Set the active overlay. Out-of-range indices are ignored.
    pub fn set_active(&mut self, index: Option<usize>) {
        match index {
            Some(i) if i >= self.rects.len() => {
                log::warn!(
                    "Ignoring active overlay {} ({} overlays drawn)",
                    i,
                    self.rects.len()
                );
            }
            _ => self.active = index,
        }
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn rect(&self, index: usize) -> Option<&OverlayRect> {
        self.rects.get(index)
    }

    pub fn visibility(&self, index: usize) -> OverlayVisibility {
        match self.active {
            None => OverlayVisibility::Visible,
            Some(active) if active == index => OverlayVisibility::Active,
            Some(_) => OverlayVisibility::Hidden,
        }
    }

    /// Overlays with their visibility, in reading order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &OverlayRect, OverlayVisibility)> + '_ {
        self.rects
            .iter()
            .enumerate()
            .map(|(i, rect)| (i, rect, self.visibility(i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> OverlayLayer {
        let mut layer = OverlayLayer::new();
        layer.draw(
            &[
                Panel::new(0.0, 0.0, 50.0, 50.0),
                Panel::new(50.0, 0.0, 50.0, 50.0),
                Panel::new(0.0, 50.0, 100.0, 50.0),
            ],
            Size::new(100.0, 100.0),
        );
        layer
    }

    #[test]
    fn test_draw_computes_percent_rects() {
        let layer = layer();
        assert_eq!(layer.len(), 3);
        assert_eq!(layer.rect(1).unwrap().left_pct, 50.0);
        assert_eq!(layer.rect(2).unwrap().width_pct, 100.0);
        assert!(layer.iter().all(|(_, _, v)| v == OverlayVisibility::Visible));
    }

    #[test]
    fn test_active_hides_siblings() {
        let mut layer = layer();
        layer.set_active(Some(1));
        assert_eq!(layer.visibility(0), OverlayVisibility::Hidden);
        assert_eq!(layer.visibility(1), OverlayVisibility::Active);
        assert_eq!(layer.visibility(2), OverlayVisibility::Hidden);

        layer.set_active(None);
        assert!(layer.iter().all(|(_, _, v)| v == OverlayVisibility::Visible));
    }

    #[test]
    fn test_redraw_replaces_overlays() {
        let mut layer = layer();
        layer.set_active(Some(2));
        layer.draw(&[Panel::new(0.0, 0.0, 10.0, 10.0)], Size::new(20.0, 20.0));
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.active(), None);
    }

    #[test]
    fn test_out_of_range_active_is_ignored() {
        let mut layer = layer();
        layer.set_active(Some(9));
        assert_eq!(layer.active(), None);
    }
}
