//! Traversal position within the page sequence.

/// Where the reader currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    /// Whole page visible, no panel focused
    Unzoomed { page: usize },
    /// Viewport framed on one panel of the page
    ZoomedOnPanel { page: usize, panel: usize },
}

impl TraversalState {
    pub fn page(&self) -> usize {
        match *self {
            TraversalState::Unzoomed { page } | TraversalState::ZoomedOnPanel { page, .. } => page,
        }
    }

    /// Focused panel, or `None` while unzoomed.
    pub fn panel(&self) -> Option<usize> {
        match *self {
            TraversalState::Unzoomed { .. } => None,
            TraversalState::ZoomedOnPanel { panel, .. } => Some(panel),
        }
    }

    pub fn is_zoomed(&self) -> bool {
        matches!(self, TraversalState::ZoomedOnPanel { .. })
    }
}

impl std::fmt::Display for TraversalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraversalState::Unzoomed { page } => write!(f, "Unzoomed({})", page),
            TraversalState::ZoomedOnPanel { page, panel } => {
                write!(f, "ZoomedOnPanel({}, {})", page, panel)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let unzoomed = TraversalState::Unzoomed { page: 3 };
        assert_eq!(unzoomed.page(), 3);
        assert_eq!(unzoomed.panel(), None);
        assert!(!unzoomed.is_zoomed());

        let zoomed = TraversalState::ZoomedOnPanel { page: 1, panel: 4 };
        assert_eq!(zoomed.page(), 1);
        assert_eq!(zoomed.panel(), Some(4));
        assert!(zoomed.is_zoomed());
    }

    #[test]
    fn test_display() {
        assert_eq!(TraversalState::Unzoomed { page: 0 }.to_string(), "Unzoomed(0)");
        assert_eq!(
            TraversalState::ZoomedOnPanel { page: 2, panel: 1 }.to_string(),
            "ZoomedOnPanel(2, 1)"
        );
    }
}
