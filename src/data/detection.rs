//! Panel detector boundary.
//!
//! The detection algorithm itself lives outside this crate. This module
//! defines the detector configuration, the seam a detector plugs into, the
//! wire formats detector output arrives in, and two built-in detectors:
//! a manifest lookup over precomputed results and a whole-page fallback.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Page, PageError, Panel, Size};

/// Panel ordering convention the detector sorts rows by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReadingDirection {
    /// Left to right (western comics)
    Ltr,
    /// Right to left (manga)
    #[default]
    Rtl,
}

impl ReadingDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingDirection::Ltr => "ltr",
            ReadingDirection::Rtl => "rtl",
        }
    }
}

/// Gutter margins in pixels, applied when the detector grows panels
/// towards their neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gutters {
    pub x: u32,
    pub y: u32,
    pub r: u32,
    pub b: u32,
}

impl Default for Gutters {
    fn default() -> Self {
        Self {
            x: crate::constants::DEFAULT_GUTTER,
            y: crate::constants::DEFAULT_GUTTER,
            r: crate::constants::DEFAULT_GUTTER,
            b: crate::constants::DEFAULT_GUTTER,
        }
    }
}

/// Tunables handed to the detector with every page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Contour simplification tolerance (fraction of contour length)
    #[serde(default = "default_rdp_epsilon")]
    pub rdp_epsilon: f64,

    /// Panels smaller than this fraction of the page are discarded
    #[serde(default = "default_small_panel_ratio")]
    pub small_panel_ratio: f64,

    #[serde(default)]
    pub reading_direction: ReadingDirection,

    #[serde(default)]
    pub gutters: Gutters,
}

fn default_rdp_epsilon() -> f64 {
    crate::constants::DEFAULT_RDP_EPSILON
}

fn default_small_panel_ratio() -> f64 {
    crate::constants::DEFAULT_SMALL_PANEL_RATIO
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            rdp_epsilon: default_rdp_epsilon(),
            small_panel_ratio: default_small_panel_ratio(),
            reading_direction: ReadingDirection::default(),
            gutters: Gutters::default(),
        }
    }
}

impl DetectorConfig {
    /// Check the value ranges the detector relies on.
    pub fn validate(&self) -> Result<(), DetectionError> {
        if !(self.rdp_epsilon.is_finite() && self.rdp_epsilon > 0.0) {
            return Err(DetectionError::InvalidConfig(format!(
                "rdp_epsilon must be > 0, got {}",
                self.rdp_epsilon
            )));
        }
        if !(self.small_panel_ratio > 0.0 && self.small_panel_ratio < 1.0) {
            return Err(DetectionError::InvalidConfig(format!(
                "small_panel_ratio must be in (0, 1), got {}",
                self.small_panel_ratio
            )));
        }
        Ok(())
    }
}

/// Errors raised at the detector boundary.
#[derive(Error, Debug)]
pub enum DetectionError {
    /// Detector configuration out of range
    #[error("Invalid detector configuration: {0}")]
    InvalidConfig(String),

    /// Detector output could not be parsed
    #[error("Malformed detector output: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Manifest file could not be read
    #[error("Failed to read manifest {path:?}: {source}")]
    ManifestIo {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The image has no entry in the manifest
    #[error("No panels recorded for '{name}'")]
    NotInManifest { name: String },

    /// Detector reported a different image size than the decoded image
    #[error("Detector size {detected:?} does not match image size {decoded:?}")]
    SizeMismatch {
        detected: (u32, u32),
        decoded: (u32, u32),
    },

    /// Any other failure inside the detector
    #[error("Detection failed: {0}")]
    Failed(String),
}

/// A panel as the detector emits it: integer natural pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedPanel {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Detector output for one image: its size, then its panels in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub size: (u32, u32),
    pub panels: Vec<DetectedPanel>,
}

/// Serialized form: `[[width, height], [{"x", "y", "width", "height"}, ...]]`
#[derive(Deserialize)]
struct DetectionWire((u32, u32), Vec<DetectedPanel>);

impl Detection {
    /// Parse the size-then-panel-list serialization.
    pub fn from_json(json: &str) -> Result<Self, DetectionError> {
        let DetectionWire(size, panels) = serde_json::from_str(json)?;
        Ok(Self { size, panels })
    }

    /// Convert to a page, clamping every panel into the image bounds.
    ///
    /// Gutter expansion can push panel edges a few pixels past the image.
    /// Panel order is kept as received.
    pub fn into_page(self) -> Result<Page, PageError> {
        let natural = Size::from(self.size);
        let clamp = |v: i64, max: f64| (v as f64).clamp(0.0, max);

        let panels = self
            .panels
            .iter()
            .map(|p| {
                let left = clamp(i64::from(p.x), natural.width);
                let top = clamp(i64::from(p.y), natural.height);
                let right = clamp(i64::from(p.x) + i64::from(p.width), natural.width);
                let bottom = clamp(i64::from(p.y) + i64::from(p.height), natural.height);
                Panel::new(
                    left,
                    top,
                    (right - left).max(0.0),
                    (bottom - top).max(0.0),
                )
            })
            .collect();

        Page::new(natural, panels)
    }
}

/// Everything a detector receives for one page.
#[derive(Debug, Clone, Copy)]
pub struct DetectionInput<'a> {
    /// File name of the page image
    pub name: &'a str,
    /// Raw image bytes
    pub bytes: &'a [u8],
    /// Size of the decoded image
    pub natural_size: (u32, u32),
    pub config: &'a DetectorConfig,
}

/// Seam for panel detection implementations.
pub trait PanelDetector: Send {
    /// Unique identifier for this detector (e.g., "manifest").
    fn id(&self) -> &'static str;

    /// Detect the panels of one page, in reading order.
    fn detect(&self, input: &DetectionInput<'_>) -> Result<Detection, DetectionError>;
}

/// Treats every page as a single panel covering the whole image.
pub struct FullPageDetector;

impl PanelDetector for FullPageDetector {
    fn id(&self) -> &'static str {
        "full-page"
    }

    fn detect(&self, input: &DetectionInput<'_>) -> Result<Detection, DetectionError> {
        let (width, height) = input.natural_size;
        let to_i32 = |v: u32| {
            i32::try_from(v)
                .map_err(|_| DetectionError::Failed(format!("image dimension {} too large", v)))
        };
        Ok(Detection {
            size: input.natural_size,
            panels: vec![DetectedPanel {
                x: 0,
                y: 0,
                width: to_i32(width)?,
                height: to_i32(height)?,
            }],
        })
    }
}

/// One image entry of a detector results manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub size: (u32, u32),
    /// Reading direction the panels were sorted with
    #[serde(default)]
    pub numbering: Option<ReadingDirection>,
    /// Panels as `[x, y, width, height]`
    pub panels: Vec<[i32; 4]>,
}

/// Looks panels up in precomputed detector results.
///
/// The manifest is a JSON array of entries keyed by image file name, the
/// format written by the batch panel detector.
pub struct ManifestDetector {
    entries: HashMap<String, ManifestEntry>,
}

impl ManifestDetector {
    /// Parse a manifest from JSON.
    pub fn from_json(json: &str) -> Result<Self, DetectionError> {
        let list: Vec<ManifestEntry> = serde_json::from_str(json)?;
        Ok(Self::from_entries(list))
    }

    /// Read and parse a manifest file.
    pub fn from_file(path: &Path) -> Result<Self, DetectionError> {
        let json = std::fs::read_to_string(path).map_err(|source| DetectionError::ManifestIo {
            path: path.to_path_buf(),
            source,
        })?;
        let detector = Self::from_json(&json)?;
        log::info!(
            "Loaded panel manifest {:?} with {} entries",
            path,
            detector.len()
        );
        Ok(detector)
    }

    pub fn from_entries(entries: Vec<ManifestEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| (e.filename.clone(), e))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PanelDetector for ManifestDetector {
    fn id(&self) -> &'static str {
        "manifest"
    }

    fn detect(&self, input: &DetectionInput<'_>) -> Result<Detection, DetectionError> {
        let entry = self
            .entries
            .get(input.name)
            .ok_or_else(|| DetectionError::NotInManifest {
                name: input.name.to_string(),
            })?;

        let configured = input.config.reading_direction;
        if let Some(numbering) = entry.numbering.filter(|n| *n != configured) {
            log::warn!(
                "Panels for '{}' were ordered {}, reader is configured for {}",
                entry.filename,
                numbering.as_str(),
                configured.as_str()
            );
        }

        Ok(Detection {
            size: entry.size,
            panels: entry
                .panels
                .iter()
                .map(|&[x, y, width, height]| DetectedPanel {
                    x,
                    y,
                    width,
                    height,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(name: &'a str, config: &'a DetectorConfig) -> DetectionInput<'a> {
        DetectionInput {
            name,
            bytes: &[],
            natural_size: (800, 1200),
            config,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = DetectorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reading_direction, ReadingDirection::Rtl);
        assert_eq!(config.gutters.b, 10);
    }

    #[test]
    fn test_config_validation() {
        let config = DetectorConfig {
            rdp_epsilon: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DetectionError::InvalidConfig(_))
        ));

        for ratio in [0.0, 1.0, f64::NAN] {
            let config = DetectorConfig {
                small_panel_ratio: ratio,
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: DetectorConfig = serde_json::from_str(r#"{"reading_direction":"ltr"}"#).unwrap();
        assert_eq!(config.reading_direction, ReadingDirection::Ltr);
        assert_eq!(config.rdp_epsilon, default_rdp_epsilon());
        assert_eq!(config.gutters, Gutters::default());
    }

    #[test]
    fn test_parse_detector_output() {
        let json = r#"[[1000,1500],[{"x":0,"y":0,"width":500,"height":750},{"x":500,"y":0,"width":500,"height":750}]]"#;
        let detection = Detection::from_json(json).unwrap();
        assert_eq!(detection.size, (1000, 1500));
        assert_eq!(detection.panels.len(), 2);
        assert_eq!(detection.panels[1].x, 500);

        let page = detection.into_page().unwrap();
        assert_eq!(page.natural_size(), Size::new(1000.0, 1500.0));
        assert_eq!(page.panels()[0], Panel::new(0.0, 0.0, 500.0, 750.0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Detection::from_json(r#"{"size":[1,2]}"#),
            Err(DetectionError::Malformed(_))
        ));
    }

    #[test]
    fn test_into_page_clamps_overshoot() {
        let detection = Detection {
            size: (100, 200),
            panels: vec![
                DetectedPanel {
                    x: -2,
                    y: -2,
                    width: 54,
                    height: 104,
                },
                DetectedPanel {
                    x: 50,
                    y: 100,
                    width: 52,
                    height: 102,
                },
            ],
        };
        let page = detection.into_page().unwrap();
        assert_eq!(page.panels()[0], Panel::new(0.0, 0.0, 52.0, 102.0));
        assert_eq!(page.panels()[1], Panel::new(50.0, 100.0, 50.0, 100.0));
    }

    #[test]
    fn test_full_page_detector() {
        let config = DetectorConfig::default();
        let detection = FullPageDetector.detect(&input("0001.jpg", &config)).unwrap();
        assert_eq!(detection.size, (800, 1200));
        assert_eq!(
            detection.panels,
            vec![DetectedPanel {
                x: 0,
                y: 0,
                width: 800,
                height: 1200
            }]
        );
    }

    #[test]
    fn test_manifest_lookup() {
        let json = r#"[
            {"filename": "0001.jpg", "size": [800, 1200], "numbering": "rtl",
             "gutters": [2, 2], "panels": [[400, 0, 400, 600], [0, 0, 400, 600]],
             "processing_time": 0.12}
        ]"#;
        let detector = ManifestDetector::from_json(json).unwrap();
        assert_eq!(detector.len(), 1);

        let config = DetectorConfig::default();
        let detection = detector.detect(&input("0001.jpg", &config)).unwrap();
        assert_eq!(detection.size, (800, 1200));
        // Order is kept exactly as recorded
        assert_eq!(detection.panels[0].x, 400);
        assert_eq!(detection.panels[1].x, 0);

        assert!(matches!(
            detector.detect(&input("0002.jpg", &config)),
            Err(DetectionError::NotInManifest { .. })
        ));
    }
}
