//! Application-level modules for the CAD tree viewer.
//!
//! Contains the egui implementations of the engine's collaborators and the
//! theme persistence helpers.

mod icon_renderer;
mod file_sync;
mod theme_coordinator;

pub use icon_renderer::EguiIconRenderer;
pub use file_sync::{FileSync, StateFileWatcher};
pub use theme_coordinator::ThemeCoordinator;
