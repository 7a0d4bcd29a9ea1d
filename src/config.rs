// ============================================================================
// config.rs
// Viewer configuration: key-binding table, camera parameters and tick
// settings, loaded from a TOML file with built-in defaults as fallback.
// ============================================================================

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

/// Camera parameters applied at startup.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Orbit distance from the camera center, in arena units.
    pub distance: f32,
    /// How far above the controlled car the camera center sits.
    pub height: f32,
    /// Base camera elevation in degrees.
    pub angle: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 110.0,
            distance: 270.0,
            height: 110.0,
            angle: 3.0,
        }
    }
}

/// Simulation pacing: the engine tick rate and how many sub-steps the viewer
/// advances per frame when it owns stepping.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    pub tick_rate: u32,
    pub tick_skip: u32,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 120,
            tick_skip: 2,
        }
    }
}

/// Full viewer configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    /// Key name -> intent name, e.g. `w = "FORWARD"`.
    pub input: HashMap<String, String>,
    pub camera: CameraConfig,
    pub sim: TickConfig,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            input: default_bindings(),
            camera: CameraConfig::default(),
            sim: TickConfig::default(),
        }
    }
}

fn default_bindings() -> HashMap<String, String> {
    [
        ("w", "FORWARD"),
        ("s", "BACKWARD"),
        ("a", "LEFT"),
        ("d", "RIGHT"),
        ("q", "ROLL_LEFT"),
        ("e", "ROLL_RIGHT"),
        ("space", "JUMP"),
        ("shift", "BOOST"),
        ("control", "POWERSLIDE"),
        ("c", "SWITCH_CAR"),
        ("t", "TARGET_CAM"),
        ("y", "CYCLE_TARGETS"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl VizConfig {
    /// Load configuration from `path`, falling back to built-in defaults
    /// with a console notice when the file is absent or unparsable.
    /// A partial file overrides only the sections it names.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match toml::from_str::<VizConfig>(&text) {
                Ok(mut config) => {
                    if config.input.is_empty() {
                        config.input = default_bindings();
                    }
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "Config {} is invalid ({err}), using default configs",
                        path.display()
                    );
                    VizConfig::default()
                }
            },
            Err(_) => {
                log::warn!("Config {} not found, using default configs", path.display());
                VizConfig::default()
            }
        }
    }
}
