//! Theme management and persistence coordination.
//!
//! Handles theme selection, application, and persistent storage across sessions.

use cadtree::ThemeManager;

const THEME_KEY: &str = "theme_preference";

/// Coordinates theme management and persistence.
pub struct ThemeCoordinator;

impl ThemeCoordinator {
    /// Loads theme preference from persistent storage during application startup.
    ///
    /// Falls back to `default` (the configured theme) when nothing was stored.
    pub fn load_theme_from_storage(storage: Option<&dyn eframe::Storage>, default: &str) -> String {
        storage
            .and_then(|storage| storage.get_string(THEME_KEY))
            .unwrap_or_else(|| default.to_string())
    }

    /// Saves current theme preference to persistent storage.
    pub fn save_theme_to_storage(storage: &mut dyn eframe::Storage, theme_name: &str) {
        storage.set_string(THEME_KEY, theme_name.to_string());
        storage.flush();
    }

    /// Applies the current theme to the egui context.
    ///
    /// Called every frame to ensure theme is correctly applied.
    pub fn apply_current_theme(ctx: &egui::Context, themes: &ThemeManager) {
        themes.apply_theme(themes.current_theme(), ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Simple mock storage for testing
    struct MockStorage {
        data: HashMap<String, String>,
    }

    impl eframe::Storage for MockStorage {
        fn get_string(&self, key: &str) -> Option<String> {
            self.data.get(key).cloned()
        }

        fn set_string(&mut self, key: &str, value: String) {
            self.data.insert(key.to_string(), value);
        }

        fn flush(&mut self) {}
    }

    #[test]
    fn test_theme_round_trip() {
        let mut storage = MockStorage { data: HashMap::new() };
        assert_eq!(ThemeCoordinator::load_theme_from_storage(Some(&storage), "Light"), "Light");

        ThemeCoordinator::save_theme_to_storage(&mut storage, "Dark");
        assert_eq!(ThemeCoordinator::load_theme_from_storage(Some(&storage), "Light"), "Dark");
        assert_eq!(ThemeCoordinator::load_theme_from_storage(None, "Light"), "Light");
    }
}
