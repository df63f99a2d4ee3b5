//! Header panel UI rendering
//!
//! Theme selector and bulk actions for the root node.

use cadtree::{Channel, IconTheme, ThemeManager};
use egui::ComboBox;

/// Result of header interactions that need to be handled by the application.
pub enum HeaderInteraction {
    /// User picked another theme
    ThemeSelected(String),
    /// User asked to flip a whole channel from the root
    ToggleAllRequested(Channel),
}

/// Renders the header panel with the theme selector and one "toggle all"
/// button per channel.
pub fn render_header(
    ui: &mut egui::Ui,
    themes: &ThemeManager,
    theme: &IconTheme,
    channel_count: usize,
) -> Option<HeaderInteraction> {
    let mut interaction = None;

    ui.horizontal(|ui| {
        let current = themes.current_theme_name().to_string();
        let mut selected = current.clone();
        ComboBox::from_label("Theme")
            .selected_text(selected.as_str())
            .show_ui(ui, |ui| {
                for name in themes.list_themes() {
                    ui.selectable_value(&mut selected, name.to_string(), name);
                }
            });
        if selected != current {
            interaction = Some(HeaderInteraction::ThemeSelected(selected));
        }

        ui.separator();

        for channel in 0..channel_count {
            if ui.button(format!("Toggle all {}", theme.label(channel))).clicked() {
                interaction = Some(HeaderInteraction::ToggleAllRequested(channel));
            }
        }
    });

    interaction
}
