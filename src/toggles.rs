// src/toggles.rs
//
// Feature toggles read from the persistent param store. The full set is
// loaded once at startup; a subset is re-read whenever the fast store
// raises `FrogPilotTogglesUpdated`.

use crate::params::ParamStore;
use serde::Serialize;

pub const TOGGLES_UPDATED_KEY: &str = "FrogPilotTogglesUpdated";

/// Lane-line and road-edge widths are stored in inches (imperial) or
/// centimetres (metric) times 12.
fn line_conversion(is_metric: bool) -> f32 {
    if is_metric {
        0.06
    } else {
        0.1524
    }
}

fn path_conversion(is_metric: bool) -> f32 {
    if is_metric {
        0.5
    } else {
        0.1524
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FeatureToggles {
    pub is_metric: bool,
    pub map_on_left: bool,
    pub default_params_set: bool,

    pub custom_theme: bool,
    pub custom_colors: i32,
    pub frog_colors: bool,
    pub custom_signals: i32,
    pub frog_signals: bool,

    pub compass: bool,
    pub conditional_speed: i32,
    pub conditional_speed_lead: i32,

    pub custom_road_ui: bool,
    pub acceleration_path: bool,
    pub blind_spot_path: bool,
    pub developer_ui: bool,
    pub unlimited_road_ui_length: bool,
    pub lane_line_width: f32,
    pub path_edge_width: f32,
    pub path_width: f32,
    pub road_edge_width: f32,

    pub mute_dm: bool,
    pub personality_profile: i32,
    pub rotating_wheel: bool,
    pub screen_brightness: i32,
    pub steering_wheel: i32,
    pub wide_camera_disabled: bool,
}

/// Scene state that decides which toggles a live reload may touch.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveReloadGate {
    pub conditional_experimental: bool,
    pub driving_personalities_ui_wheel: bool,
    pub toyota_car: bool,
}

impl FeatureToggles {
    /// Settings that are read at every startup regardless of defaults.
    pub fn load_basic(&mut self, params: &dyn ParamStore) {
        self.is_metric = params.get_bool("IsMetric");
        self.map_on_left = params.get_bool("NavSettingLeftSide");
        if !self.default_params_set {
            self.default_params_set = params.get_bool("DefaultParamsSet");
        }
    }

    /// Full toggle load. Returns false (and changes nothing beyond the
    /// basics) until the default params have been written.
    pub fn load(&mut self, params: &dyn ParamStore) -> bool {
        self.load_basic(params);
        if !self.default_params_set {
            return false;
        }

        self.custom_theme = params.get_bool("CustomTheme");
        self.custom_colors = if self.custom_theme {
            params.get_int("CustomColors")
        } else {
            0
        };
        self.frog_colors = self.custom_colors == 1;
        self.custom_signals = if self.custom_theme {
            params.get_int("CustomSignals")
        } else {
            0
        };
        self.frog_signals = self.custom_signals == 1;

        self.compass = params.get_bool("Compass");
        self.conditional_speed = params.get_int("ConditionalExperimentalModeSpeed");
        self.conditional_speed_lead = params.get_int("ConditionalExperimentalModeSpeedLead");

        self.custom_road_ui = params.get_bool("CustomRoadUI");
        self.acceleration_path = self.custom_road_ui && params.get_bool("AccelerationPath");
        self.blind_spot_path = self.custom_road_ui && params.get_bool("BlindSpotPath");
        self.developer_ui = params.get_int("DeveloperUI") != 0;
        self.read_road_widths(params);
        self.unlimited_road_ui_length = self.custom_road_ui && params.get_bool("UnlimitedLength");

        self.mute_dm = params.get_bool("FireTheBabysitter") && params.get_bool("MuteDM");
        self.personality_profile = params.get_int("LongitudinalPersonality");
        self.rotating_wheel = params.get_bool("RotatingWheel");
        self.screen_brightness = params.get_int("ScreenBrightness");
        self.steering_wheel = params.get_int("SteeringWheel");
        self.wide_camera_disabled = params.get_bool("WideCameraDisable");
        true
    }

    /// Re-read the live-reloadable subset after a toggles-updated signal.
    pub fn reload_live(&mut self, params: &dyn ParamStore, gate: LiveReloadGate) {
        if gate.conditional_experimental {
            self.conditional_speed = params.get_int("ConditionalExperimentalModeSpeed");
            self.conditional_speed_lead =
                params.get_int("ConditionalExperimentalModeSpeedLead");
        }
        if self.custom_theme {
            self.custom_colors = params.get_int("CustomColors");
            self.frog_colors = self.custom_colors == 1;
            self.custom_signals = params.get_int("CustomSignals");
            self.frog_signals = self.custom_signals == 1;
        }
        if self.custom_road_ui {
            self.read_road_widths(params);
        }
        self.developer_ui = params.get_int("DeveloperUI") != 0;
        if gate.driving_personalities_ui_wheel && !gate.toyota_car {
            self.personality_profile = params.get_int("LongitudinalPersonality");
        }
        self.screen_brightness = params.get_int("ScreenBrightness");
        self.steering_wheel = params.get_int("SteeringWheel");
    }

    fn read_road_widths(&mut self, params: &dyn ParamStore) {
        let conversion = line_conversion(self.is_metric);
        self.lane_line_width = params.get_int("LaneLinesWidth") as f32 / 12.0 * conversion;
        self.path_edge_width = params.get_int("PathEdgeWidth") as f32;
        self.path_width =
            params.get_int("PathWidth") as f32 / 10.0 * path_conversion(self.is_metric);
        self.road_edge_width = params.get_int("RoadEdgesWidth") as f32 / 12.0 * conversion;
    }
}
