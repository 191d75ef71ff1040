// src/lib.rs

pub mod config;
pub mod device;
pub mod driver_monitor;
pub mod messages;
pub mod model;
pub mod params;
pub mod pipeline;
pub mod projection;
pub mod scene;
pub mod smoother;
pub mod status;
pub mod toggles;
pub mod types;
pub mod ui_state;

pub use device::{Device, Hardware, LoggingHardware};
pub use scene::Scene;
pub use types::Config;
pub use ui_state::UiState;
