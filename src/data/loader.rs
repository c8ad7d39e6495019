//! Page loader bridge.
//!
//! The navigator asks a [`PageLoader`] for pages it does not have yet and
//! later receives typed [`LoadCompletion`]s. Loads are asynchronous: a
//! request returns immediately, the result is picked up by polling, and
//! results for different pages may arrive in any order.

use std::io::Cursor;

use thiserror::Error;

use super::detection::{DetectionError, DetectionInput, DetectorConfig, PanelDetector};
use crate::model::{Page, PageError};

/// Why a page could not be loaded.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Page bytes could not be read
    #[error("Failed to read page: {0}")]
    Read(#[from] std::io::Error),

    /// Bytes are not a supported or well-formed image
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// Detector failed on a valid image
    #[error(transparent)]
    Detection(#[from] DetectionError),

    /// Detector output does not describe a valid page
    #[error("Invalid page: {0}")]
    InvalidPage(#[from] PageError),

    /// Page index past the end of the source list
    #[error("No page source at index {0}")]
    NoSuchPage(usize),

    /// The loader shut down before answering
    #[error("Page loader disconnected")]
    Disconnected,
}

/// Result of one page request.
#[derive(Debug)]
pub struct LoadCompletion {
    /// Page index that was requested
    pub page_index: usize,
    pub result: Result<Page, LoadError>,
}

impl LoadCompletion {
    pub fn new(page_index: usize, result: Result<Page, LoadError>) -> Self {
        Self { page_index, result }
    }
}

/// Source of pages for the navigator.
///
/// Callers never request a page index that is already in flight.
pub trait PageLoader {
    /// Number of pages in the sequence (loaded or not).
    fn page_count(&self) -> usize;

    /// Start loading a page. Must not block.
    fn request(&mut self, page_index: usize);

    /// Take one completed result, oldest first. Non-blocking.
    fn poll_completed(&mut self) -> Option<LoadCompletion>;
}

/// Read the natural size from the image header without decoding pixels.
pub fn decode_natural_size(bytes: &[u8]) -> Result<(u32, u32), LoadError> {
    let reader = image::ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    Ok(reader.into_dimensions()?)
}

/// Decode a page image and run the detector over it.
///
/// Decode failures surface as [`LoadError::Decode`], detector failures as
/// [`LoadError::Detection`]. The detector's reported size must match the
/// decoded image.
pub fn build_page(
    name: &str,
    bytes: &[u8],
    detector: &dyn PanelDetector,
    config: &DetectorConfig,
) -> Result<Page, LoadError> {
    let natural_size = decode_natural_size(bytes)?;
    let detection = detector.detect(&DetectionInput {
        name,
        bytes,
        natural_size,
        config,
    })?;

    if detection.size != natural_size {
        return Err(DetectionError::SizeMismatch {
            detected: detection.size,
            decoded: natural_size,
        }
        .into());
    }

    log::debug!(
        "Detector '{}' found {} panels in {} ({}x{})",
        detector.id(),
        detection.panels.len(),
        name,
        natural_size.0,
        natural_size.1
    );

    Ok(detection.into_page()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::detection::{Detection, FullPageDetector};
    use crate::test_support::png_bytes;

    struct FixedDetector(Detection);

    impl PanelDetector for FixedDetector {
        fn id(&self) -> &'static str {
            "fixed"
        }

        fn detect(&self, _input: &DetectionInput<'_>) -> Result<Detection, DetectionError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_decode_natural_size() {
        assert_eq!(decode_natural_size(&png_bytes(12, 34)).unwrap(), (12, 34));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_natural_size(b"definitely not an image"),
            Err(LoadError::Decode(_))
        ));
    }

    #[test]
    fn test_build_page_full_page() {
        let page = build_page(
            "0001.png",
            &png_bytes(20, 30),
            &FullPageDetector,
            &DetectorConfig::default(),
        )
        .unwrap();
        assert_eq!(page.panel_count(), 1);
        assert_eq!(page.panels()[0].width, 20.0);
        assert_eq!(page.panels()[0].height, 30.0);
    }

    #[test]
    fn test_build_page_size_mismatch() {
        let detector = FixedDetector(Detection {
            size: (100, 100),
            panels: Vec::new(),
        });
        let err = build_page(
            "0001.png",
            &png_bytes(20, 30),
            &detector,
            &DetectorConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LoadError::Detection(DetectionError::SizeMismatch { .. })
        ));
    }
}
