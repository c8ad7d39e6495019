//! Page acquisition: source discovery, the loader bridge and the detector seam.
//!
//! This module provides:
//! - `PageLoader`: the asynchronous request/poll interface the navigator drives
//! - `FolderPageLoader`: background-thread loader for image files on disk
//! - `PanelDetector`: seam for the external panel detector, with a manifest
//!   lookup and a whole-page fallback built in
//!
//! ## Adding a Detector
//!
//! ```rust,ignore
//! use komawari::data::{Detection, DetectionError, DetectionInput, PanelDetector};
//!
//! pub struct MyDetector;
//!
//! impl PanelDetector for MyDetector {
//!     fn id(&self) -> &'static str { "mine" }
//!     fn detect(&self, input: &DetectionInput<'_>) -> Result<Detection, DetectionError> {
//!         /* run detection over input.bytes */
//!     }
//! }
//! ```

mod detection;
#[cfg(not(target_arch = "wasm32"))]
mod folder_loader;
mod loader;
mod sources;

pub use detection::{
    DetectedPanel, Detection, DetectionError, DetectionInput, DetectorConfig, FullPageDetector,
    Gutters, ManifestDetector, ManifestEntry, PanelDetector, ReadingDirection,
};
#[cfg(not(target_arch = "wasm32"))]
pub use folder_loader::FolderPageLoader;
pub use loader::{LoadCompletion, LoadError, PageLoader, build_page, decode_natural_size};
pub use sources::{IMAGE_EXTENSIONS, PageSources, SourceError, is_image_filename};
