use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::PathBuf,
};

use crate::error::AndBibleError;

pub const DEFAULT_SHELL_URL: &str = "file:///android_asset/bibleview-js/index.html";
pub const DEFAULT_VERSIFICATION: &str = "KJV";

/// Text display configuration handed to the renderer with every full content load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextDisplaySettings {
    pub font_size: u16,
    pub font_family: String,
    pub line_spacing: f32,
    pub show_verse_numbers: bool,
    pub show_strongs: bool,
    pub show_morphology: bool,
    pub show_red_letters: bool,
    pub show_footnotes: bool,
    pub show_bookmarks: bool,
    pub show_my_notes: bool,
    pub night_mode: bool,
}

impl Default for TextDisplaySettings {
    fn default() -> Self {
        TextDisplaySettings {
            font_size: 16,
            font_family: "sans-serif".to_string(),
            line_spacing: 1.0,
            show_verse_numbers: true,
            show_strongs: false,
            show_morphology: false,
            show_red_letters: false,
            show_footnotes: true,
            show_bookmarks: true,
            show_my_notes: true,
            night_mode: false,
        }
    }
}

/// Persisted user preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Route followed links to the dedicated links window rather than the active window.
    pub open_links_in_special_window: bool,
    /// Static renderer shell loaded by every content view.
    pub shell_url: String,
    pub default_v11n: String,
    pub display: TextDisplaySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            open_links_in_special_window: true,
            shell_url: DEFAULT_SHELL_URL.to_string(),
            default_v11n: DEFAULT_VERSIFICATION.to_string(),
            display: TextDisplaySettings::default(),
        }
    }
}

pub trait SettingsProvider: Send + Sync {
    fn settings(&self) -> Result<Settings, AndBibleError>;
    fn set_settings(&self, settings: Settings) -> Result<(), AndBibleError>;

    /// An unreadable store counts as the default preference.
    fn open_links_in_special_window(&self) -> bool {
        match self.settings() {
            Ok(settings) => settings.open_links_in_special_window,
            Err(e) => {
                tracing::warn!("Could not read settings, using default link preference: {e}");
                Settings::default().open_links_in_special_window
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TomlSettingsProvider {
    path: PathBuf,
}

impl TomlSettingsProvider {
    pub fn new(path: PathBuf) -> Self {
        TomlSettingsProvider { path }
    }
}

impl SettingsProvider for TomlSettingsProvider {
    fn settings(&self) -> Result<Settings, AndBibleError> {
        tracing::debug!("Attempting to read settings from: {:?}", &self.path);
        if !self.path.exists() {
            tracing::debug!("Settings file not found, using defaults.");
            return Ok(Settings::default());
        }
        let content = read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    fn set_settings(&self, settings: Settings) -> Result<(), AndBibleError> {
        tracing::debug!("Attempting to write settings to: {:?}", &self.path);
        let toml_string = toml::to_string(&settings)?;
        write(&self.path, toml_string)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemorySettings {
    settings: RwLock<Settings>,
}

impl MemorySettings {
    pub fn new(settings: Settings) -> Self {
        MemorySettings {
            settings: RwLock::new(settings),
        }
    }
}

impl SettingsProvider for MemorySettings {
    fn settings(&self) -> Result<Settings, AndBibleError> {
        Ok(self.settings.read().clone())
    }

    fn set_settings(&self, settings: Settings) -> Result<(), AndBibleError> {
        *self.settings.write() = settings;
        Ok(())
    }
}
