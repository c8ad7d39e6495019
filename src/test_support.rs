//! Shared test doubles: a scripted page loader, a recording render sink and
//! tiny in-memory images.

use std::collections::VecDeque;
use std::io::Cursor;

use image::{ImageFormat, RgbImage};

use crate::data::{LoadCompletion, LoadError, PageLoader};
use crate::model::{Page, Panel, Size};
use crate::render::{DisplayMetrics, OverlayLayer, RenderSink};
use crate::zoom_math::ViewportTransform;

/// Encode a blank `width` x `height` PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::new(width, height);
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// A 1000x1500 page with a row of `count` equal panels.
pub fn page_with_panels(count: usize) -> Page {
    let natural = Size::new(1000.0, 1500.0);
    let width = (1000 / count.max(1)) as f64;
    let panels = (0..count)
        .map(|i| Panel::new(i as f64 * width, 0.0, width, 750.0))
        .collect();
    Page::new(natural, panels).unwrap()
}

/// Loader whose completions are pushed by the test.
///
/// Nothing completes on its own: `request` only records the index.
#[derive(Debug, Default)]
pub struct FakeLoader {
    pub count: usize,
    pub requests: Vec<usize>,
    pub ready: VecDeque<LoadCompletion>,
}

impl FakeLoader {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            ..Default::default()
        }
    }

    pub fn complete(&mut self, page_index: usize, page: Page) {
        self.ready.push_back(LoadCompletion::new(page_index, Ok(page)));
    }

    pub fn fail(&mut self, page_index: usize) {
        self.ready.push_back(LoadCompletion::new(
            page_index,
            Err(LoadError::NoSuchPage(page_index)),
        ));
    }
}

impl PageLoader for FakeLoader {
    fn page_count(&self) -> usize {
        self.count
    }

    fn request(&mut self, page_index: usize) {
        self.requests.push(page_index);
    }

    fn poll_completed(&mut self) -> Option<LoadCompletion> {
        self.ready.pop_front()
    }
}

/// One call received by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Draw(usize),
    Transform(ViewportTransform),
    Active(Option<usize>),
}

/// Sink that records every call and keeps an [`OverlayLayer`] in sync.
#[derive(Debug)]
pub struct RecordingSink {
    pub calls: Vec<SinkCall>,
    pub layer: OverlayLayer,
    pub transform: ViewportTransform,
    pub metrics: DisplayMetrics,
}

impl RecordingSink {
    /// Rendered at natural size inside a 500x500 viewport.
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            layer: OverlayLayer::new(),
            transform: ViewportTransform::identity(),
            metrics: DisplayMetrics {
                rendered: Size::new(1000.0, 1500.0),
                viewport: Size::new(500.0, 500.0),
            },
        }
    }

    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, SinkCall::Draw(_)))
            .count()
    }
}

impl RenderSink for RecordingSink {
    fn draw_overlays(&mut self, panels: &[Panel], natural_size: Size) {
        self.layer.draw(panels, natural_size);
        self.calls.push(SinkCall::Draw(panels.len()));
    }

    fn apply_transform(&mut self, transform: ViewportTransform) {
        self.transform = transform;
        self.calls.push(SinkCall::Transform(transform));
    }

    fn set_active_panel(&mut self, index: Option<usize>) {
        self.layer.set_active(index);
        self.calls.push(SinkCall::Active(index));
    }

    fn metrics(&self) -> DisplayMetrics {
        self.metrics
    }
}
