//! Data models for pages and panels.

mod page;
mod panel;

pub use page::{Page, PageError};
pub use panel::{Panel, Size};
