use serde::{Deserialize, Serialize};

/// Number of points in every model trajectory (path, lane lines, road edges).
pub const TRAJECTORY_SIZE: usize = 33;

pub const MIN_DRAW_DISTANCE: f32 = 10.0;
pub const MAX_DRAW_DISTANCE: f32 = 100.0;

/// Height of the road camera above the ground, added to path elevations.
pub const CAMERA_HEIGHT: f32 = 1.22;

/// Default tick frequency of the UI loop in Hz.
pub const UI_FREQ: u32 = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub params: ParamsConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub freq: u32,
    pub frame_width: f32,
    pub frame_height: f32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            freq: UI_FREQ,
            frame_width: 2160.0,
            frame_height: 1080.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamsConfig {
    /// YAML map seeding the persistent store
    pub persistent_seed: Option<String>,
    /// YAML map seeding the fast (memory) store
    pub memory_seed: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayConfig {
    pub log_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub offroad_brightness: f32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            offroad_brightness: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Closed screen-space loop: left edge forward, then right edge backward.
pub type Polygon = Vec<Point2>;
