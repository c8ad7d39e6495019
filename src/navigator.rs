//! Panel-by-panel traversal of a page sequence.
//!
//! The [`Navigator`] owns the only mutable reader state: which page is
//! shown and which panel, if any, is zoomed. It pulls pages from a
//! [`PageLoader`] and drives a [`RenderSink`]. All transitions run to
//! completion on the caller's thread; page loads are the only
//! asynchronous step and their results are applied through
//! [`Navigator::complete_load`] or [`Navigator::pump`].
//!
//! A load result is only shown if it is for the page the reader is still
//! waiting on. Anything else is kept in the store for later and reported
//! as [`Transition::StaleLoadIgnored`].

use std::collections::HashSet;

use thiserror::Error;

use crate::constants::DEFAULT_PRELOAD_COUNT;
use crate::data::{LoadCompletion, LoadError, PageLoader};
use crate::message::Command;
use crate::model::Size;
use crate::render::RenderSink;
use crate::state::{PanelStore, StoreError, TraversalState};
use crate::zoom_math::{ViewportTransform, hit_test, zoom_transform};

/// Navigation failures. None of them change the traversal state.
#[derive(Error, Debug)]
pub enum NavError {
    /// Nothing has been shown yet
    #[error("No page is loaded")]
    NoPageLoaded,

    /// Page index past the end of the sequence
    #[error("Page {page} out of range ({count} pages)")]
    PageOutOfRange { page: usize, count: usize },

    #[error(transparent)]
    IndexOutOfRange(#[from] StoreError),

    /// Panel has no usable extent at the current display size
    #[error("Panel {panel} of page {page} is degenerate")]
    DegeneratePanel { page: usize, panel: usize },

    /// `next` on the last panel of the last page
    #[error("Already at the end of the sequence")]
    EndOfSequence,

    /// `previous` on the first panel of the first page
    #[error("Already at the start of the sequence")]
    StartOfSequence,

    /// The loader could not produce the page
    #[error("Failed to load page {page}: {source}")]
    PageLoadFailed {
        page: usize,
        #[source]
        source: LoadError,
    },
}

/// What a successful operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Page drawn, now `Unzoomed(page)`
    Shown { page: usize },
    /// Now `ZoomedOnPanel(page, panel)`
    Zoomed { page: usize, panel: usize },
    /// Zoom reset, now `Unzoomed(page)`
    Dezoomed { page: usize },
    /// Waiting for the loader to deliver `page`
    Loading { page: usize },
    /// A page arrived after the reader moved on; it was stored but not shown
    StaleLoadIgnored { page: usize },
    /// Nothing happened
    Unchanged,
}

/// Reader controller, generic over where pages come from and where they
/// are drawn.
pub struct Navigator<L: PageLoader, S: RenderSink> {
    store: PanelStore,
    loader: L,
    sink: S,
    /// `None` until the first page is shown
    state: Option<TraversalState>,
    /// Page the reader is waiting on
    target: Option<usize>,
    /// Pages requested from the loader and not yet completed
    in_flight: HashSet<usize>,
    preload_count: usize,
}

impl<L: PageLoader, S: RenderSink> Navigator<L, S> {
    pub fn new(loader: L, sink: S) -> Self {
        Self {
            store: PanelStore::new(),
            loader,
            sink,
            state: None,
            target: None,
            in_flight: HashSet::new(),
            preload_count: DEFAULT_PRELOAD_COUNT,
        }
    }

    /// Set how many pages on each side of the shown page are fetched ahead.
    pub fn with_preload_count(mut self, count: usize) -> Self {
        self.preload_count = count;
        self
    }

    pub fn state(&self) -> Option<TraversalState> {
        self.state
    }

    pub fn current_page(&self) -> Option<usize> {
        self.state.map(|s| s.page())
    }

    /// Page a pending `load_and_show` is waiting for.
    pub fn load_target(&self) -> Option<usize> {
        self.target
    }

    pub fn is_loading(&self) -> bool {
        self.target.is_some()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Length of the whole page sequence, loaded or not.
    ///
    /// [`PanelStore::page_count`] counts only the pages already loaded.
    pub fn sequence_len(&self) -> usize {
        self.loader.page_count()
    }

    pub fn store(&self) -> &PanelStore {
        &self.store
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Show a page, fetching it first if it is not stored yet.
    ///
    /// Returns `Loading` when a fetch is needed; the page is shown once its
    /// completion arrives, unless the reader has moved on by then.
    pub fn load_and_show(&mut self, page: usize) -> Result<Transition, NavError> {
        let count = self.loader.page_count();
        if page >= count {
            return Err(NavError::PageOutOfRange { page, count });
        }

        if self.store.contains(page) {
            return self.show_stored(page);
        }

        self.target = Some(page);
        self.request(page);
        log::debug!("Waiting for page {}", page);
        Ok(Transition::Loading { page })
    }

    /// Zoom the viewport onto a panel of the current page.
    ///
    /// Display sizes are read from the sink on every call.
    pub fn zoom_to(&mut self, panel: usize) -> Result<Transition, NavError> {
        let page = self.current_page().ok_or(NavError::NoPageLoaded)?;
        let stored = self.store.page(page)?;
        let rect = *stored.panel(panel).ok_or(StoreError::PanelOutOfRange {
            page,
            panel,
            count: stored.panel_count(),
        })?;
        let natural = stored.natural_size();

        if rect.is_degenerate() {
            log::warn!("Refusing to zoom on degenerate panel {} of page {}", panel, page);
            return Err(NavError::DegeneratePanel { page, panel });
        }

        let metrics = self.sink.metrics();
        let transform = zoom_transform(&rect, natural, metrics.rendered, metrics.viewport)
            .map_err(|e| {
                log::warn!("Cannot zoom on panel {} of page {}: {}", panel, page, e);
                NavError::DegeneratePanel { page, panel }
            })?;

        self.sink.apply_transform(transform);
        self.sink.set_active_panel(Some(panel));
        self.state = Some(TraversalState::ZoomedOnPanel { page, panel });
        self.target = None;
        log::debug!("Zoomed on panel {} of page {}", panel, page);
        Ok(Transition::Zoomed { page, panel })
    }

    /// Return to the whole page. A no-op while already unzoomed.
    pub fn dezoom(&mut self) -> Result<Transition, NavError> {
        let Some(TraversalState::ZoomedOnPanel { page, .. }) = self.state else {
            return Ok(Transition::Unchanged);
        };

        self.sink.apply_transform(ViewportTransform::identity());
        self.sink.set_active_panel(None);
        self.state = Some(TraversalState::Unzoomed { page });
        self.target = None;
        log::debug!("Dezoomed page {}", page);
        Ok(Transition::Dezoomed { page })
    }

    /// Advance to the next zoomable panel, or to the next page after the
    /// last one.
    pub fn next(&mut self) -> Result<Transition, NavError> {
        let state = self.state.ok_or(NavError::NoPageLoaded)?;
        let page = state.page();
        let start = state.panel().map_or(0, |i| i + 1);

        let stored = self.store.page(page)?;
        let candidate = stored
            .panels()
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, p)| !p.is_degenerate())
            .map(|(i, _)| i);

        match candidate {
            Some(panel) => self.zoom_to(panel),
            None if page + 1 >= self.loader.page_count() => Err(NavError::EndOfSequence),
            None => self.load_and_show(page + 1),
        }
    }

    /// Step back to the previous zoomable panel, or to the previous page.
    ///
    /// The previous page is shown unzoomed.
    pub fn previous(&mut self) -> Result<Transition, NavError> {
        let state = self.state.ok_or(NavError::NoPageLoaded)?;
        let page = state.page();

        if let Some(current) = state.panel() {
            let stored = self.store.page(page)?;
            let panels = stored.panels();
            if let Some(panel) = (0..current.min(panels.len()))
                .rev()
                .find(|&i| !panels[i].is_degenerate())
            {
                return self.zoom_to(panel);
            }
        }

        if page == 0 {
            return Err(NavError::StartOfSequence);
        }
        self.load_and_show(page - 1)
    }

    /// Re-apply the current zoom with fresh display sizes, e.g. after a resize.
    pub fn refresh(&mut self) -> Result<Transition, NavError> {
        match self.state {
            Some(TraversalState::ZoomedOnPanel { panel, .. }) => self.zoom_to(panel),
            _ => Ok(Transition::Unchanged),
        }
    }

    /// Zoom onto the panel under a point of the rendered image.
    ///
    /// `x`/`y` are relative to the top-left corner of the untransformed
    /// rendered image. While zoomed only the active overlay is visible, so
    /// only it can be hit.
    pub fn click(&mut self, x: f64, y: f64) -> Result<Transition, NavError> {
        let state = self.state.ok_or(NavError::NoPageLoaded)?;
        let stored = self.store.page(state.page())?;
        let metrics = self.sink.metrics();

        let hit = hit_test(stored.panels(), stored.natural_size(), metrics.rendered, x, y);
        match (hit, state.panel()) {
            (Some(panel), None) => self.zoom_to(panel),
            (Some(panel), Some(active)) if panel == active => self.zoom_to(panel),
            _ => Ok(Transition::Unchanged),
        }
    }

    /// Apply one user command.
    pub fn handle(&mut self, command: Command) -> Result<Transition, NavError> {
        match command {
            Command::NextPanel => self.next(),
            Command::PreviousPanel => self.previous(),
            Command::Dezoom => self.dezoom(),
            Command::LoadPage(page) => self.load_and_show(page),
            Command::ZoomTo(panel) => self.zoom_to(panel),
        }
    }

    /// Apply a loader result.
    ///
    /// Results for pages that were not requested are dropped. A requested
    /// page is always stored on success and shown only if it is the current
    /// load target. A failure is an error only for the load target; failed
    /// preloads are logged and reported as `Unchanged`.
    pub fn complete_load(&mut self, completion: LoadCompletion) -> Result<Transition, NavError> {
        let LoadCompletion { page_index, result } = completion;
        if !self.in_flight.remove(&page_index) {
            log::debug!("Dropping result for page {} which was not requested", page_index);
            return Ok(Transition::Unchanged);
        }

        match result {
            Ok(page) => {
                self.store.set_page(page_index, page);
                if self.target == Some(page_index) {
                    self.show_stored(page_index)
                } else {
                    log::debug!("Stored page {} without showing it", page_index);
                    Ok(Transition::StaleLoadIgnored { page: page_index })
                }
            }
            Err(source) if self.target == Some(page_index) => {
                self.target = None;
                log::warn!("Page {} failed to load: {}", page_index, source);
                Err(NavError::PageLoadFailed {
                    page: page_index,
                    source,
                })
            }
            Err(source) => {
                log::warn!("Background load of page {} failed: {}", page_index, source);
                Ok(Transition::Unchanged)
            }
        }
    }

    /// Apply every result the loader has ready, oldest first.
    pub fn pump(&mut self) -> Vec<Result<Transition, NavError>> {
        let mut results = Vec::new();
        while let Some(completion) = self.loader.poll_completed() {
            results.push(self.complete_load(completion));
        }
        results
    }

    /// Switch to a new page sequence, dropping everything about the old one.
    ///
    /// Returns the previous loader.
    pub fn replace_loader(&mut self, loader: L) -> L {
        let old = std::mem::replace(&mut self.loader, loader);
        self.store.clear();
        self.in_flight.clear();
        self.state = None;
        self.target = None;
        self.sink.draw_overlays(&[], Size::default());
        self.sink.apply_transform(ViewportTransform::identity());
        log::info!(
            "Switched to a sequence of {} pages",
            self.loader.page_count()
        );
        old
    }

    /// Request pages around `page` that are neither stored nor in flight.
    pub fn preload_around(&mut self, page: usize) {
        let count = self.loader.page_count();
        for distance in 1..=self.preload_count {
            let ahead = page.checked_add(distance).filter(|&p| p < count);
            let behind = page.checked_sub(distance);
            for candidate in [ahead, behind].into_iter().flatten() {
                if !self.store.contains(candidate) {
                    self.request(candidate);
                }
            }
        }
    }

    fn request(&mut self, page: usize) {
        if self.in_flight.insert(page) {
            self.loader.request(page);
        } else {
            log::debug!("Page {} already in flight", page);
        }
    }

    fn show_stored(&mut self, page: usize) -> Result<Transition, NavError> {
        let stored = self.store.page(page)?;
        self.sink
            .draw_overlays(stored.panels(), stored.natural_size());
        self.sink.apply_transform(ViewportTransform::identity());
        self.state = Some(TraversalState::Unzoomed { page });
        self.target = None;
        log::debug!("Showing page {} ({} panels)", page, stored.panel_count());

        self.preload_around(page);
        Ok(Transition::Shown { page })
    }
}
