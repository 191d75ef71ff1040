// src/messages.rs
//
// Records published on the vehicle data bus. Only the fields the onroad
// scene consumes are modelled; everything is serde so replay logs and
// test fixtures can be written as JSON.

use serde::{Deserialize, Serialize};

// ============================================================================
// SERVICES
// ============================================================================

/// Every stream the scene aggregator subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Service {
    ModelV2,
    UiPlan,
    ControlsState,
    LiveCalibration,
    RadarState,
    DeviceState,
    PandaStates,
    CarParams,
    DriverMonitoringState,
    CarState,
    DriverStateV2,
    WideRoadCameraState,
    CarControl,
    GpsLocationExternal,
    LateralPlan,
    LongitudinalPlan,
}

impl Service {
    /// Stream name as it appears on the bus and in replay logs
    pub fn name(&self) -> &'static str {
        match self {
            Service::ModelV2 => "modelV2",
            Service::UiPlan => "uiPlan",
            Service::ControlsState => "controlsState",
            Service::LiveCalibration => "liveCalibration",
            Service::RadarState => "radarState",
            Service::DeviceState => "deviceState",
            Service::PandaStates => "pandaStates",
            Service::CarParams => "carParams",
            Service::DriverMonitoringState => "driverMonitoringState",
            Service::CarState => "carState",
            Service::DriverStateV2 => "driverStateV2",
            Service::WideRoadCameraState => "wideRoadCameraState",
            Service::CarControl => "carControl",
            Service::GpsLocationExternal => "gpsLocationExternal",
            Service::LateralPlan => "lateralPlan",
            Service::LongitudinalPlan => "longitudinalPlan",
        }
    }
}

/// One record from the bus, tagged by the stream it was published on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "service", content = "data", rename_all = "camelCase")]
pub enum Message {
    ModelV2(ModelV2),
    UiPlan(UiPlan),
    ControlsState(ControlsState),
    LiveCalibration(LiveCalibration),
    RadarState(RadarState),
    DeviceState(DeviceState),
    PandaStates(Vec<PandaState>),
    CarParams(CarParams),
    DriverMonitoringState(DriverMonitoringState),
    CarState(CarState),
    DriverStateV2(DriverStateV2),
    WideRoadCameraState(CameraState),
    CarControl(CarControl),
    GpsLocationExternal(GpsLocation),
    LateralPlan(LateralPlan),
    LongitudinalPlan(LongitudinalPlan),
}

impl Message {
    pub fn service(&self) -> Service {
        match self {
            Message::ModelV2(_) => Service::ModelV2,
            Message::UiPlan(_) => Service::UiPlan,
            Message::ControlsState(_) => Service::ControlsState,
            Message::LiveCalibration(_) => Service::LiveCalibration,
            Message::RadarState(_) => Service::RadarState,
            Message::DeviceState(_) => Service::DeviceState,
            Message::PandaStates(_) => Service::PandaStates,
            Message::CarParams(_) => Service::CarParams,
            Message::DriverMonitoringState(_) => Service::DriverMonitoringState,
            Message::CarState(_) => Service::CarState,
            Message::DriverStateV2(_) => Service::DriverStateV2,
            Message::WideRoadCameraState(_) => Service::WideRoadCameraState,
            Message::CarControl(_) => Service::CarControl,
            Message::GpsLocationExternal(_) => Service::GpsLocationExternal,
            Message::LateralPlan(_) => Service::LateralPlan,
            Message::LongitudinalPlan(_) => Service::LongitudinalPlan,
        }
    }
}

// ============================================================================
// MODEL / PLAN
// ============================================================================

/// Index-aligned 3D samples of a predicted line, x non-decreasing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XyztData {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
    pub t: Vec<f32>,
}

impl XyztData {
    /// Number of complete (x, y, z) samples
    pub fn len(&self) -> usize {
        self.x.len().min(self.y.len()).min(self.z.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last_x(&self) -> Option<f32> {
        self.x.get(self.len().checked_sub(1)?).copied()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
pub struct ModelV2 {
    pub position: XyztData,
    pub lane_lines: Vec<XyztData>,
    pub lane_line_probs: Vec<f32>,
    pub road_edges: Vec<XyztData>,
    pub road_edge_stds: Vec<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiPlan {
    pub position: XyztData,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
pub struct LeadData {
    pub status: bool,
    pub d_rel: f32,
    pub y_rel: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
pub struct RadarState {
    pub lead_one: LeadData,
    pub lead_two: LeadData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
pub struct LateralPlan {
    pub lane_width_left: f32,
    pub lane_width_right: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
pub struct LongitudinalPlan {
    pub desired_follow_distance: f32,
    pub safe_obstacle_distance: f32,
    pub safe_obstacle_distance_stock: f32,
    pub stopped_equivalence_factor: f32,
    pub stopped_equivalence_factor_stock: f32,
}

// ============================================================================
// CALIBRATION
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalibrationStatus {
    #[default]
    Uncalibrated,
    Calibrated,
    Invalid,
    Recalibrating,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
pub struct LiveCalibration {
    pub rpy_calib: Vec<f32>,
    pub wide_from_device_euler: Vec<f32>,
    pub cal_status: CalibrationStatus,
}

// ============================================================================
// CONTROLS / CAR
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OpenpilotState {
    #[default]
    Disabled,
    PreEnabled,
    Enabled,
    SoftDisabling,
    Overriding,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
pub struct ControlsState {
    pub enabled: bool,
    pub state: OpenpilotState,
    pub experimental_mode: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
pub struct CarControl {
    pub always_on_lateral: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
pub struct CarParams {
    pub always_on_lateral: bool,
    pub openpilot_longitudinal_control: bool,
    pub conditional_experimental_mode: bool,
    #[serde(rename = "drivingPersonalitiesUIWheel")]
    pub driving_personalities_ui_wheel: bool,
    pub experimental_mode_via_wheel: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
pub struct CarState {
    pub v_ego: f32,
    pub left_blindspot: bool,
    pub right_blindspot: bool,
    pub left_blinker: bool,
    pub right_blinker: bool,
    pub steering_angle_deg: f32,
    pub toyota_car: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
pub struct GpsLocation {
    pub bearing_deg: f32,
}

// ============================================================================
// HARDWARE / DEVICE
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PandaType {
    #[default]
    Unknown,
    WhitePanda,
    GreyPanda,
    BlackPanda,
    Pedal,
    Uno,
    Dos,
    RedPanda,
    RedPandaV2,
    Tres,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
pub struct PandaState {
    pub panda_type: PandaType,
    pub ignition_line: bool,
    pub ignition_can: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceState {
    pub started: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageSensor {
    #[default]
    Unknown,
    Ar0231,
    Ox03c10,
    Os04c10,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
pub struct CameraState {
    pub sensor: ImageSensor,
    pub exposure_val_percent: f32,
}

// ============================================================================
// DRIVER MONITORING
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
pub struct DriverData {
    pub face_orientation: Vec<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
pub struct DriverStateV2 {
    pub left_driver_data: DriverData,
    pub right_driver_data: DriverData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
pub struct DriverMonitoringState {
    #[serde(rename = "isRHD")]
    pub is_rhd: bool,
}
