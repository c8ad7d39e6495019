//! Reader commands.
//!
//! Every input device (keys, pointer clicks, file selection) is reduced to
//! one of these before it reaches the navigator.

/// Logical commands the navigator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Next panel, or the next page after the last panel
    NextPanel,
    /// Previous panel, or the previous page before the first panel
    PreviousPanel,
    /// Reset the viewport to the whole page
    Dezoom,
    /// Show a page by index
    LoadPage(usize),
    /// Zoom straight to a panel of the current page (overlay click)
    ZoomTo(usize),
}
