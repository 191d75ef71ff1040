// src/scene.rs
//
// The aggregate the renderer draws from. Written only by the UI tick;
// renderers receive an `Arc<Scene>` copy published at the end of each tick.

use crate::driver_monitor::DriverPose;
use crate::messages::PandaType;
use crate::toggles::FeatureToggles;
use crate::types::{Point2, Polygon};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Scene {
    // Calibration / camera
    pub calibration_valid: bool,
    pub calibration_wide_valid: bool,
    pub wide_cam: bool,

    // Model geometry
    pub lane_line_vertices: [Polygon; 4],
    pub lane_line_probs: [f32; 4],
    pub road_edge_vertices: [Polygon; 2],
    pub road_edge_stds: [f32; 2],
    pub track_vertices: Polygon,
    pub track_edge_vertices: Polygon,
    pub track_left_adjacent_lane_vertices: Polygon,
    pub track_right_adjacent_lane_vertices: Polygon,
    pub lead_vertices: [Option<Point2>; 2],

    // Driver monitoring
    pub driver_pose: DriverPose,
    pub is_rhd: bool,
    /// Icon animation progress, written by the renderer
    pub dm_fade_state: f32,

    // Hardware / lifecycle
    pub panda_type: PandaType,
    pub ignition: bool,
    pub started: bool,
    pub started_frame: u64,
    pub light_sensor: f32,

    // Controls
    pub enabled: bool,
    pub experimental_mode: bool,
    pub always_on_lateral: bool,
    pub always_on_lateral_active: bool,
    pub longitudinal_control: bool,
    pub conditional_experimental: bool,
    pub conditional_status: i32,
    pub driving_personalities_ui_wheel: bool,
    pub experimental_mode_via_wheel: bool,

    // Car state
    pub v_ego: f32,
    pub blind_spot_left: bool,
    pub blind_spot_right: bool,
    pub turn_signal_left: bool,
    pub turn_signal_right: bool,
    pub steering_angle_deg: f32,
    pub toyota_car: bool,

    // Planning / navigation
    pub bearing_deg: f32,
    pub lane_width_left: f32,
    pub lane_width_right: f32,
    pub desired_follow: f32,
    pub obstacle_distance: f32,
    pub obstacle_distance_stock: f32,
    pub stopped_equivalence: f32,
    pub stopped_equivalence_stock: f32,
    pub map_open: bool,

    pub toggles: FeatureToggles,
}
