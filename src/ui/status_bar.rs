//! Status bar UI rendering
//!
//! Shows per-channel selection counts, sync activity and the last message.

use cadtree::{IconTheme, TreeStateEngine};
use egui::RichText;

use crate::app::{EguiIconRenderer, FileSync};

/// Renders the status panel at the bottom of the window
pub fn render_status_bar(
    ui: &mut egui::Ui,
    engine: &TreeStateEngine<EguiIconRenderer, FileSync>,
    theme: &IconTheme,
    message: Option<&str>,
) {
    ui.horizontal(|ui| {
        let leaves = engine.leaf_count();
        ui.label(RichText::new(format!("Parts: {}", leaves)).strong());

        for channel in 0..engine.channel_count() {
            ui.label(RichText::new("|").strong());
            ui.label(RichText::new(format!(
                "{}: {} / {}",
                theme.label(channel),
                engine.selected_leaves(channel).len(),
                leaves
            )).strong());
        }

        ui.label(RichText::new("|").strong());
        ui.label(RichText::new(format!(
            "Published: {} -> {} | Redraws: {}",
            engine.sync().published(),
            engine.sync().out_path(),
            engine.renderer().redraw_count()
        )).strong());

        if let Some(error) = engine.sync().last_error() {
            ui.label(RichText::new("|").strong());
            ui.label(RichText::new(error).strong().color(theme.colors.error));
        } else if let Some(message) = message {
            ui.label(RichText::new("|").strong());
            ui.label(RichText::new(message).strong().color(egui::Color32::YELLOW));
        }
    });
}
