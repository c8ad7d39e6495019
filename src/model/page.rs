//! Page data model: one decoded image plus its detected panels.

use thiserror::Error;

use super::panel::{Panel, Size};

/// Reasons a page record is refused.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PageError {
    /// Natural image size is zero, negative or not a number
    #[error("Invalid natural size {width}x{height}")]
    InvalidSize { width: f64, height: f64 },

    /// A panel has non-finite coordinates or a negative extent
    #[error("Panel {index} is malformed: {panel:?}")]
    MalformedPanel { index: usize, panel: Panel },

    /// A panel extends past the image bounds
    #[error("Panel {index} lies outside the {width}x{height} image: {panel:?}")]
    PanelOutOfBounds {
        index: usize,
        panel: Panel,
        width: f64,
        height: f64,
    },
}

/// A loaded page. Immutable once built; reloading replaces the record.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    natural_size: Size,
    panels: Vec<Panel>,
}

impl Page {
    /// Build a page, validating every panel against the natural size.
    ///
    /// Zero-area panels are kept (and logged) so that the malformation stays
    /// visible in the overlays; they are skipped when picking zoom targets.
    pub fn new(natural_size: Size, panels: Vec<Panel>) -> Result<Self, PageError> {
        if !natural_size.is_positive() {
            return Err(PageError::InvalidSize {
                width: natural_size.width,
                height: natural_size.height,
            });
        }

        for (index, panel) in panels.iter().enumerate() {
            if !panel.is_finite() || panel.width < 0.0 || panel.height < 0.0 {
                return Err(PageError::MalformedPanel {
                    index,
                    panel: *panel,
                });
            }
            if panel.x < 0.0
                || panel.y < 0.0
                || panel.right() > natural_size.width
                || panel.bottom() > natural_size.height
            {
                return Err(PageError::PanelOutOfBounds {
                    index,
                    panel: *panel,
                    width: natural_size.width,
                    height: natural_size.height,
                });
            }
            if panel.is_degenerate() {
                log::warn!("Panel {} has zero area: {:?}", index, panel);
            }
        }

        Ok(Self {
            natural_size,
            panels,
        })
    }

    /// Intrinsic pixel size of the page image.
    pub fn natural_size(&self) -> Size {
        self.natural_size
    }

    /// Panels in reading order.
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    pub fn panel(&self, index: usize) -> Option<&Panel> {
        self.panels.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size() -> Size {
        Size::new(1000.0, 1500.0)
    }

    #[test]
    fn test_valid_page() {
        let page = Page::new(
            size(),
            vec![
                Panel::new(0.0, 0.0, 500.0, 750.0),
                Panel::new(500.0, 0.0, 500.0, 750.0),
            ],
        )
        .unwrap();
        assert_eq!(page.panel_count(), 2);
        assert_eq!(page.natural_size(), size());
        assert_eq!(page.panel(1).unwrap().x, 500.0);
        assert!(page.panel(2).is_none());
    }

    #[test]
    fn test_page_without_panels() {
        let page = Page::new(size(), Vec::new()).unwrap();
        assert_eq!(page.panel_count(), 0);
    }

    #[test]
    fn test_rejects_invalid_size() {
        let err = Page::new(Size::new(0.0, 100.0), Vec::new()).unwrap_err();
        assert!(matches!(err, PageError::InvalidSize { .. }));
    }

    #[test]
    fn test_rejects_out_of_bounds_panel() {
        let err = Page::new(size(), vec![Panel::new(600.0, 0.0, 500.0, 100.0)]).unwrap_err();
        assert!(matches!(err, PageError::PanelOutOfBounds { index: 0, .. }));

        let err = Page::new(size(), vec![Panel::new(-1.0, 0.0, 10.0, 10.0)]).unwrap_err();
        assert!(matches!(err, PageError::PanelOutOfBounds { .. }));
    }

    #[test]
    fn test_rejects_malformed_panel() {
        let err = Page::new(size(), vec![Panel::new(0.0, 0.0, -5.0, 10.0)]).unwrap_err();
        assert!(matches!(err, PageError::MalformedPanel { index: 0, .. }));

        let err = Page::new(size(), vec![Panel::new(f64::NAN, 0.0, 5.0, 10.0)]).unwrap_err();
        assert!(matches!(err, PageError::MalformedPanel { .. }));
    }

    #[test]
    fn test_keeps_zero_area_panel() {
        let page = Page::new(size(), vec![Panel::new(10.0, 10.0, 0.0, 50.0)]).unwrap();
        assert!(page.panel(0).unwrap().is_degenerate());
    }
}
