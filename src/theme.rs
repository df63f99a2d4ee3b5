//! Icon themes for the tree viewer
//!
//! A theme decides how a `(channel, state)` pair looks: a glyph per state for
//! each channel plus a color per state. Built-in themes are Light and Dark.
//!
//! # Examples
//!
//! ```
//! use cadtree::theme::ThemeManager;
//! use cadtree::State;
//!
//! let manager = ThemeManager::new();
//! let dark = manager.get_theme("Dark").unwrap();
//! assert_eq!(dark.glyph(0, State::Selected), "●");
//! ```

use egui::Color32;
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::model::State;
use crate::traits::Channel;

/// Glyphs for one icon channel, indexed by state code.
#[derive(Debug, Clone)]
pub struct ChannelIcons {
    pub label: String,
    pub glyphs: [String; 4],
}

impl ChannelIcons {
    fn new(label: &str, glyphs: [&str; 4]) -> Self {
        Self {
            label: label.to_string(),
            glyphs: glyphs.map(str::to_string),
        }
    }
}

/// Color per state plus the marker color for broken nodes.
#[derive(Debug, Clone)]
pub struct StateColors {
    pub unselected: Color32,
    pub selected: Color32,
    pub mixed: Color32,
    pub empty: Color32,
    pub error: Color32,
}

#[derive(Debug, Clone)]
pub struct IconTheme {
    pub name: String,
    pub description: String,
    pub dark_mode: bool,
    pub channels: Vec<ChannelIcons>,
    pub colors: StateColors,
}

/// Used for channels a theme does not define.
static FALLBACK_ICONS: Lazy<ChannelIcons> = Lazy::new(|| ChannelIcons::new("channel", ["○", "●", "◐", "·"]));

static DEFAULT_THEME: Lazy<IconTheme> = Lazy::new(light_theme);

impl IconTheme {
    pub fn icons(&self, channel: Channel) -> &ChannelIcons {
        self.channels.get(channel).unwrap_or(&*FALLBACK_ICONS)
    }

    pub fn glyph(&self, channel: Channel, state: State) -> &str {
        &self.icons(channel).glyphs[state.code() as usize]
    }

    pub fn label(&self, channel: Channel) -> &str {
        &self.icons(channel).label
    }

    pub fn color(&self, state: State) -> Color32 {
        match state {
            State::Unselected => self.colors.unselected,
            State::Selected => self.colors.selected,
            State::Mixed => self.colors.mixed,
            State::Empty => self.colors.empty,
        }
    }
}

/// Centralized theme manager providing access to all available themes
pub struct ThemeManager {
    themes: HashMap<String, IconTheme>,
    current_theme_name: String,
}

impl ThemeManager {
    /// Creates a new ThemeManager initialized with all built-in themes
    pub fn new() -> Self {
        let mut themes = HashMap::new();

        themes.insert("Light".to_string(), light_theme());
        themes.insert("Dark".to_string(), dark_theme());

        Self {
            themes,
            current_theme_name: "Light".to_string(),
        }
    }

    pub fn get_theme(&self, name: &str) -> Option<&IconTheme> {
        self.themes.get(name)
    }

    /// Returns a list of all available theme names
    pub fn list_themes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.themes.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    pub fn current_theme(&self) -> &IconTheme {
        self.themes.get(&self.current_theme_name).unwrap_or(&*DEFAULT_THEME)
    }

    pub fn current_theme_name(&self) -> &str {
        &self.current_theme_name
    }

    pub fn set_current_theme(&mut self, name: &str) -> Result<(), String> {
        if self.themes.contains_key(name) {
            self.current_theme_name = name.to_string();
            Ok(())
        } else {
            Err(format!("Theme '{}' not found", name))
        }
    }

    /// Switches egui between its light and dark visuals to match `theme`.
    pub fn apply_theme(&self, theme: &IconTheme, ctx: &egui::Context) {
        let visuals = if theme.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);
    }
}

impl Default for ThemeManager {
    fn default() -> Self {
        Self::new()
    }
}

fn default_channels() -> Vec<ChannelIcons> {
    vec![
        ChannelIcons::new("shape", ["○", "●", "◐", "·"]),
        ChannelIcons::new("mesh", ["□", "■", "◧", "·"]),
    ]
}

fn light_theme() -> IconTheme {
    IconTheme {
        name: "Light".to_string(),
        description: "Dark glyphs on a light background".to_string(),
        dark_mode: false,
        channels: default_channels(),
        colors: StateColors {
            unselected: hex_to_color32("#9e9e9e"),
            selected: hex_to_color32("#1565c0"),
            mixed: hex_to_color32("#5e92f3"),
            empty: hex_to_color32("#d0d0d0"),
            error: hex_to_color32("#d32f2f"),
        },
    }
}

fn dark_theme() -> IconTheme {
    IconTheme {
        name: "Dark".to_string(),
        description: "Light glyphs on a dark background".to_string(),
        dark_mode: true,
        channels: default_channels(),
        colors: StateColors {
            unselected: hex_to_color32("#6b6b6b"),
            selected: hex_to_color32("#8ab4f8"),
            mixed: hex_to_color32("#5a7fb8"),
            empty: hex_to_color32("#3c3c3c"),
            error: hex_to_color32("#ef5350"),
        },
    }
}

/// Parses `#rrggbb` (leading `#` optional). Anything else is gray.
pub fn hex_to_color32(hex: &str) -> Color32 {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Color32::GRAY;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => Color32::from_rgb(r, g, b),
        _ => Color32::GRAY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_themes() {
        let manager = ThemeManager::new();
        assert_eq!(manager.list_themes(), vec!["Dark", "Light"]);
        assert_eq!(manager.current_theme().name, "Light");
    }

    #[test]
    fn test_unknown_channel_uses_fallback_icons() {
        let manager = ThemeManager::new();
        let theme = manager.current_theme();
        assert_eq!(theme.label(1), "mesh");
        assert_eq!(theme.label(7), "channel");
        assert_eq!(theme.glyph(7, State::Mixed), "◐");
    }

    #[test]
    fn test_set_unknown_theme_fails() {
        let mut manager = ThemeManager::new();
        assert!(manager.set_current_theme("Solarized").is_err());
        assert!(manager.set_current_theme("Dark").is_ok());
        assert!(manager.current_theme().dark_mode);
    }

    #[test]
    fn test_hex_to_color32() {
        assert_eq!(hex_to_color32("#e8b024"), Color32::from_rgb(0xe8, 0xb0, 0x24));
        assert_eq!(hex_to_color32("707070"), Color32::from_rgb(0x70, 0x70, 0x70));
        assert_eq!(hex_to_color32("#zzzzzz"), Color32::GRAY);
        assert_eq!(hex_to_color32("red"), Color32::GRAY);
    }
}
