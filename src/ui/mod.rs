//! UI panel rendering subsystem
//!
//! - Header panel (theme selector, per-channel toggle-all)
//! - Tree panel (icon columns and collapsible assembly tree)
//! - Status bar (selection counts and sync activity)

pub mod header;
pub mod tree_panel;
pub mod status_bar;
