//! Reader state: stored pages and the traversal position.

mod panel_store;
mod traversal;

pub use panel_store::{PanelStore, StoreError};
pub use traversal::TraversalState;
