//! Durable user preferences.

use crate::model::ui::Theme;
use serde::{Deserialize, Serialize};

/// Note list layout preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    Single,
    Dual,
    Grid,
}

/// Preferences node (`prefs` in the store tree).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Default note list layout.
    pub layout: LayoutMode,
    /// Base font size in points; always positive.
    pub font_size: u32,
    /// Preferred theme applied on startup.
    pub theme: Theme,
    /// Authenticated user, `None` while signed out.
    pub user_id: Option<String>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            layout: LayoutMode::Single,
            font_size: 14,
            theme: Theme::Light,
            user_id: None,
        }
    }
}
