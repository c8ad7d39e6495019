//! Per-page storage of natural sizes and panel lists.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::{Page, Panel};

/// Lookup failures of the panel store.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// No page record has been stored at this index
    #[error("Page {page} is not loaded")]
    PageNotLoaded { page: usize },

    /// Panel index past the end of the page's panel list
    #[error("Panel {panel} out of range for page {page} ({count} panels)")]
    PanelOutOfRange {
        page: usize,
        panel: usize,
        count: usize,
    },
}

/// Lazily populated page records, keyed by page index.
///
/// Gaps are allowed: a page that has not been loaded yet is simply absent.
#[derive(Debug, Default)]
pub struct PanelStore {
    pages: BTreeMap<usize, Page>,
}

impl PanelStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the page at `index`, returning the previous record.
    pub fn set_page(&mut self, index: usize, page: Page) -> Option<Page> {
        let previous = self.pages.insert(index, page);
        if previous.is_some() {
            log::debug!("Replaced page record {}", index);
        }
        previous
    }

    /// Number of pages actually loaded (not the length of the sequence).
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.pages.contains_key(&index)
    }

    pub fn page(&self, index: usize) -> Result<&Page, StoreError> {
        self.pages
            .get(&index)
            .ok_or(StoreError::PageNotLoaded { page: index })
    }

    pub fn panel_count(&self, page_index: usize) -> Result<usize, StoreError> {
        self.page(page_index).map(Page::panel_count)
    }

    pub fn panel_at(&self, page_index: usize, panel_index: usize) -> Result<&Panel, StoreError> {
        let page = self.page(page_index)?;
        page.panel(panel_index).ok_or(StoreError::PanelOutOfRange {
            page: page_index,
            panel: panel_index,
            count: page.panel_count(),
        })
    }

    /// Drop every page record.
    pub fn clear(&mut self) {
        self.pages.clear();
    }
}
