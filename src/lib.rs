//! komawari - panel-by-panel manga reader core
//!
//! Walks a sequence of page images one detected panel at a time, computing
//! the overlay placement and the viewport transform that frames each panel.
//! Pages come from a [`data::PageLoader`], output goes to a
//! [`render::RenderSink`], and the [`navigator::Navigator`] ties the two
//! together.

pub mod config;
pub mod constants;
pub mod data;
pub mod keybindings;
pub mod message;
pub mod model;
pub mod navigator;
pub mod render;
pub mod state;
pub mod zoom_math;

#[cfg(test)]
mod test_support;

pub use message::Command;
pub use navigator::{NavError, Navigator, Transition};
