//! Global constants for the reader

/// Default contour simplification tolerance handed to the detector
pub const DEFAULT_RDP_EPSILON: f64 = 0.02;

/// Default minimum panel size as a fraction of the page
pub const DEFAULT_SMALL_PANEL_RATIO: f64 = 0.05;

/// Default gutter margin on every side, in pixels
pub const DEFAULT_GUTTER: u32 = 10;

/// Default number of pages to preload before and after the current page
pub const DEFAULT_PRELOAD_COUNT: usize = 1;

/// File name of the detector results manifest looked up next to the pages
pub const DEFAULT_MANIFEST_NAME: &str = "panels.json";
