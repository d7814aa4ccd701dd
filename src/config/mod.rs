use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_AUTO_HIDE_EPSILON, DEFAULT_AUTO_HIDE_IDLE_SECS, DEFAULT_DRAG_THRESHOLD_PX,
    DEFAULT_FLY_DURATION_SECS, DEFAULT_OCCLUSION_EPSILON,
};

/// System set for config loading (other plugins can run after this)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigLoaded;

/// Tunables for marker interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSettings {
    /// Pointer travel in pixels before a marker press becomes a drag
    pub drag_threshold_px: f32,
    /// Duration of the animated viewpoint restore (0 = instant)
    pub fly_duration_secs: f32,
    /// Hide markers while the user is navigating
    pub auto_hide_during_navigation: bool,
    /// Camera must be still this long before markers reappear
    pub auto_hide_idle_secs: f64,
    /// Per-element camera matrix tolerance used by the settle detector
    pub auto_hide_epsilon: f32,
    /// Minimum depth margin for a mesh hit to occlude a marker
    pub occlusion_epsilon: f32,
    /// Whether marker editing (place, drag, menus) is on when the app starts
    pub editing_enabled_on_startup: bool,
}

impl Default for MarkerSettings {
    fn default() -> Self {
        Self {
            drag_threshold_px: DEFAULT_DRAG_THRESHOLD_PX,
            fly_duration_secs: DEFAULT_FLY_DURATION_SECS,
            auto_hide_during_navigation: true,
            auto_hide_idle_secs: DEFAULT_AUTO_HIDE_IDLE_SECS,
            auto_hide_epsilon: DEFAULT_AUTO_HIDE_EPSILON,
            occlusion_epsilon: DEFAULT_OCCLUSION_EPSILON,
            editing_enabled_on_startup: true,
        }
    }
}

impl MarkerSettings {
    /// Replace non-finite or negative values with defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.drag_threshold_px.is_finite() && self.drag_threshold_px >= 0.0) {
            self.drag_threshold_px = defaults.drag_threshold_px;
        }
        if !(self.fly_duration_secs.is_finite() && self.fly_duration_secs >= 0.0) {
            self.fly_duration_secs = defaults.fly_duration_secs;
        }
        if !(self.auto_hide_idle_secs.is_finite() && self.auto_hide_idle_secs >= 0.0) {
            self.auto_hide_idle_secs = defaults.auto_hide_idle_secs;
        }
        if !(self.auto_hide_epsilon.is_finite() && self.auto_hide_epsilon >= 0.0) {
            self.auto_hide_epsilon = defaults.auto_hide_epsilon;
        }
        if !(self.occlusion_epsilon.is_finite() && self.occlusion_epsilon >= 0.0) {
            self.occlusion_epsilon = defaults.occlusion_epsilon;
        }
        self
    }
}

/// Application configuration persisted to disk
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfigData {
    #[serde(default)]
    pub markers: MarkerSettings,
}

/// Runtime configuration resource
#[derive(Resource)]
pub struct AppConfig {
    /// The persisted configuration data
    pub data: AppConfigData,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Whether config needs to be saved (dirty flag)
    pub dirty: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: AppConfigData::default(),
            config_path: get_config_path(),
            dirty: false,
        }
    }
}

impl AppConfig {
    pub fn markers(&self) -> &MarkerSettings {
        &self.data.markers
    }
}

/// Resource to notify user when config was reset to defaults
#[derive(Resource, Default)]
pub struct ConfigResetNotification {
    /// Whether to show the notification dialog
    pub show: bool,
    /// The reason for the reset (parse error, read error, etc.)
    pub reason: Option<String>,
}

/// Message to trigger config save
#[derive(Message)]
pub struct SaveConfigRequest;

/// Message to replace the marker settings
#[derive(Message)]
pub struct UpdateMarkerSettingsRequest {
    pub settings: MarkerSettings,
}

/// Get the path to the config file (platform-appropriate location)
fn get_config_path() -> PathBuf {
    crate::paths::config_file()
}

/// Parse config JSON; unknown fields are ignored and missing ones defaulted.
fn parse_config(json: &str) -> Result<AppConfigData, String> {
    let mut data: AppConfigData = serde_json::from_str(json).map_err(|e| e.to_string())?;
    data.markers = data.markers.sanitized();
    Ok(data)
}

/// Result of loading config from disk
struct LoadConfigResult {
    config: AppConfig,
    /// Error message if config was reset to defaults due to an error
    reset_reason: Option<String>,
}

/// Load configuration from disk
fn load_config() -> LoadConfigResult {
    let config_path = get_config_path();

    let (data, reset_reason) = if config_path.exists() {
        match std::fs::read_to_string(&config_path) {
            Ok(json) => match parse_config(&json) {
                Ok(data) => {
                    info!("Loaded config from {:?}", config_path);
                    (data, None)
                }
                Err(e) => {
                    warn!("Failed to parse config file: {}", e);
                    (
                        AppConfigData::default(),
                        Some(format!("Configuration file was corrupted: {}", e)),
                    )
                }
            },
            Err(e) => {
                warn!("Failed to read config file: {}", e);
                (
                    AppConfigData::default(),
                    Some(format!("Could not read configuration file: {}", e)),
                )
            }
        }
    } else {
        info!("No config file found, using defaults");
        (AppConfigData::default(), None)
    };

    LoadConfigResult {
        config: AppConfig {
            data,
            config_path,
            dirty: false,
        },
        reset_reason,
    }
}

/// Save configuration to disk
fn save_config(config: &AppConfig) -> Result<(), String> {
    crate::paths::ensure_config_dir().map_err(|e| e.to_string())?;
    let json = serde_json::to_string_pretty(&config.data).map_err(|e| e.to_string())?;
    std::fs::write(&config.config_path, json).map_err(|e| e.to_string())
}

/// Startup system to load config from disk into the existing resource
fn load_config_system(
    mut config: ResMut<AppConfig>,
    mut reset_notification: ResMut<ConfigResetNotification>,
) {
    let result = load_config();
    config.data = result.config.data;
    config.config_path = result.config.config_path;
    config.dirty = result.config.dirty;

    // Set notification if config was reset due to an error
    if let Some(reason) = result.reset_reason {
        reset_notification.show = true;
        reset_notification.reason = Some(reason);
    }
}

/// System to save config when requested
fn save_config_system(
    mut events: MessageReader<SaveConfigRequest>,
    mut config: ResMut<AppConfig>,
) {
    for _ in events.read() {
        if config.dirty {
            match save_config(&config) {
                Ok(()) => info!("Config saved to {:?}", config.config_path),
                Err(e) => error!("Failed to save config: {}", e),
            }
            config.dirty = false;
        }
    }
}

/// System to replace marker settings
fn update_marker_settings_system(
    mut events: MessageReader<UpdateMarkerSettingsRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        let settings = event.settings.clone().sanitized();
        if settings != config.data.markers {
            config.data.markers = settings;
            config.dirty = true;
            save_events.write(SaveConfigRequest);
        }
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AppConfig>()
            .init_resource::<ConfigResetNotification>()
            .add_message::<SaveConfigRequest>()
            .add_message::<UpdateMarkerSettingsRequest>()
            .add_systems(Startup, load_config_system.in_set(ConfigLoaded))
            .add_systems(
                Update,
                (
                    update_marker_settings_system.run_if(on_message::<UpdateMarkerSettingsRequest>),
                    save_config_system.run_if(on_message::<SaveConfigRequest>),
                )
                    .chain(),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_settings_default() {
        let settings = MarkerSettings::default();
        assert_eq!(settings.drag_threshold_px, 4.0);
        assert!((settings.fly_duration_secs - 0.55).abs() < 1e-6);
        assert!(settings.auto_hide_during_navigation);
        assert!(settings.editing_enabled_on_startup);
    }

    #[test]
    fn test_parse_config_fills_missing_fields() {
        let data = parse_config(r#"{ "markers": { "drag_threshold_px": 8.0 } }"#).unwrap();
        assert_eq!(data.markers.drag_threshold_px, 8.0);
        assert_eq!(data.markers.fly_duration_secs, DEFAULT_FLY_DURATION_SECS);
    }

    #[test]
    fn test_parse_config_empty_object() {
        let data = parse_config("{}").unwrap();
        assert_eq!(data.markers, MarkerSettings::default());
    }

    #[test]
    fn test_parse_config_rejects_garbage() {
        assert!(parse_config("not json").is_err());
    }

    #[test]
    fn test_sanitized_replaces_invalid_values() {
        let settings = MarkerSettings {
            drag_threshold_px: -1.0,
            fly_duration_secs: f32::NAN,
            auto_hide_idle_secs: f64::INFINITY,
            ..MarkerSettings::default()
        }
        .sanitized();
        assert_eq!(settings, MarkerSettings::default());
    }

    #[test]
    fn test_app_config_data_serialization() {
        let data = AppConfigData {
            markers: MarkerSettings {
                auto_hide_during_navigation: false,
                ..MarkerSettings::default()
            },
        };

        let json = serde_json::to_string(&data).unwrap();
        let parsed: AppConfigData = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.markers, data.markers);
    }
}
