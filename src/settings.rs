use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use crate::view::{
    DEFAULT_DISTANCE_BETWEEN_PAGES, DEFAULT_MAX_PAGE_RESOLUTION, DEFAULT_MAX_ZOOM,
    ViewConfiguration,
};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pdf-renderer-view";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_distance_between_pages")]
    pub distance_between_pages: f32,

    #[serde(default = "default_max_zoom")]
    pub max_zoom: f32,

    #[serde(default = "default_max_page_resolution")]
    pub max_page_resolution: f32,

    #[serde(default)]
    pub single_page: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_distance_between_pages() -> f32 {
    DEFAULT_DISTANCE_BETWEEN_PAGES
}

fn default_max_zoom() -> f32 {
    DEFAULT_MAX_ZOOM
}

fn default_max_page_resolution() -> f32 {
    DEFAULT_MAX_PAGE_RESOLUTION
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            distance_between_pages: default_distance_between_pages(),
            max_zoom: default_max_zoom(),
            max_page_resolution: default_max_page_resolution(),
            single_page: false,
            log_level: default_log_level(),
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

pub fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from the user config directory, writing defaults on first run
pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };

    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

pub fn load_settings_from_path(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }

                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    settings.version = CURRENT_VERSION;
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = generate_settings_yaml(settings);

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(SETTINGS_HEADER);
    content.push_str(&format!("version: {}\n", settings.version));
    content.push_str(&format!(
        "distance_between_pages: {}\n",
        settings.distance_between_pages
    ));
    content.push_str(&format!("max_zoom: {}\n", settings.max_zoom));
    content.push_str(&format!(
        "max_page_resolution: {}\n",
        settings.max_page_resolution
    ));
    content.push_str(&format!("single_page: {}\n", settings.single_page));
    content.push_str(&format!("log_level: \"{}\"\n", settings.log_level));

    content
}

const SETTINGS_HEADER: &str = r#"# ============================================================================
# PDF view defaults
# ============================================================================
# distance_between_pages and max_page_resolution are read when the view is
# mounted; toggle the view off and on to apply changes to them.
#
# max_page_resolution caps the size of page bitmaps while zooming. Lower it
# if the renderer runs out of memory on deep zoom.

"#;

// Public API for accessing settings

#[must_use]
pub fn current() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

/// Replace the process-wide settings without touching the file
pub fn replace(settings: Settings) {
    if let Ok(mut global) = SETTINGS.write() {
        *global = settings;
    }
}

#[must_use]
pub fn get_log_level() -> String {
    SETTINGS
        .read()
        .map(|s| s.log_level.clone())
        .unwrap_or_else(|_| default_log_level())
}

/// Host-level defaults as a configuration callers overlay their own values on
#[must_use]
pub fn view_defaults() -> ViewConfiguration {
    let settings = current();
    ViewConfiguration {
        distance_between_pages: Some(settings.distance_between_pages),
        max_zoom: Some(settings.max_zoom),
        max_page_resolution: Some(settings.max_page_resolution),
        single_page: Some(settings.single_page),
        ..ViewConfiguration::default()
    }
}
