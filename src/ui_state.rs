// src/ui_state.rs
//
// The scene aggregator. Once per tick:
//
//   1. pull the latest record of every subscribed stream
//   2. fold updated streams into the scene (toggle-gated)
//   3. resolve engagement status and started/offroad edges
//   4. apply live toggle changes from the fast store
//   5. publish a read-only snapshot
//
// This is the only writer of the scene. Renderers get `Arc<Scene>` copies.

use crate::driver_monitor::DriverPoseEstimator;
use crate::messages::{ImageSensor, Message, PandaType, Service};
use crate::model::update_model;
use crate::params::ParamStore;
use crate::pipeline::{EventBus, SubMaster, UiEvent};
use crate::projection::{CalibrationModel, FrameSize, Projector};
use crate::scene::Scene;
use crate::status::{StatusResolver, UiStatus};
use crate::toggles::{LiveReloadGate, TOGGLES_UPDATED_KEY};
use crate::types::UiConfig;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ticks without a pandaStates record, in multiples of the tick rate,
/// before the hardware type is no longer trusted.
const PANDA_STALE_SECONDS: u64 = 5;

/// Wide camera is requested below this speed (m/s) ...
const WIDE_CAM_ON_SPEED: f32 = 10.0;
/// ... and released above this one.
const WIDE_CAM_OFF_SPEED: f32 = 15.0;

pub struct UiState {
    sm: SubMaster,
    scene: Scene,
    calibration: CalibrationModel,
    projector: Projector,
    frame_size: FrameSize,
    driver_pose: DriverPoseEstimator,
    status: StatusResolver,
    ui_freq: u32,

    params: Box<dyn ParamStore>,
    params_memory: Box<dyn ParamStore>,
    toggles_checked: bool,
    live_toggles_checked: bool,
    wide_cam_requested: bool,
}

impl UiState {
    pub fn new(
        config: &UiConfig,
        params: Box<dyn ParamStore>,
        params_memory: Box<dyn ParamStore>,
    ) -> Self {
        let frame_size = FrameSize::new(config.frame_width, config.frame_height);
        let calibration = CalibrationModel::new();
        let projector = Projector::new(&calibration, frame_size);
        let mut state = Self {
            sm: SubMaster::new(),
            scene: Scene::default(),
            calibration,
            projector,
            frame_size,
            driver_pose: DriverPoseEstimator::new(),
            status: StatusResolver::new(),
            ui_freq: config.freq.max(1),
            params,
            params_memory,
            toggles_checked: false,
            live_toggles_checked: false,
            wide_cam_requested: false,
        };
        state.update_params();
        state
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn status(&self) -> UiStatus {
        self.status.status()
    }

    pub fn sub_master(&self) -> &SubMaster {
        &self.sm
    }

    pub fn calibration(&self) -> &CalibrationModel {
        &self.calibration
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    pub fn frame(&self) -> u64 {
        self.sm.frame()
    }

    /// Driver-monitoring icon animation progress, owned by the renderer.
    pub fn set_dm_fade_state(&mut self, fade: f32) {
        self.scene.dm_fade_state = fade.clamp(0.0, 1.0);
    }

    /// Rebuild screen geometry for a new frame-buffer size.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.frame_size = FrameSize::new(width, height);
        self.projector = Projector::new(&self.calibration, self.frame_size);
    }

    /// Copy-on-publish snapshot of the scene.
    pub fn snapshot(&self) -> Arc<Scene> {
        Arc::new(self.scene.clone())
    }

    /// One UI tick.
    pub fn tick<I>(&mut self, incoming: I, bus: &mut EventBus)
    where
        I: IntoIterator<Item = Message>,
    {
        self.sm.update(incoming);
        self.update_state();
        self.update_status(bus);
        self.update_live_params();

        bus.publish(UiEvent::UiUpdate {
            frame: self.sm.frame(),
            scene: self.snapshot(),
        });
    }

    // ========================================================================
    // TOGGLES
    // ========================================================================

    /// Startup toggle load; retried until the default params exist.
    pub fn update_params(&mut self) {
        if self.toggles_checked {
            self.scene.toggles.load_basic(self.params.as_ref());
            return;
        }
        self.toggles_checked = self.scene.toggles.load(self.params.as_ref());
        if self.toggles_checked {
            info!("Feature toggles loaded");
        } else {
            debug!("Default params not set yet, toggles deferred");
        }
    }

    fn update_live_params(&mut self) {
        if self.params_memory.get_bool(TOGGLES_UPDATED_KEY) {
            let gate = LiveReloadGate {
                conditional_experimental: self.scene.conditional_experimental,
                driving_personalities_ui_wheel: self.scene.driving_personalities_ui_wheel,
                toyota_car: self.scene.toyota_car,
            };
            self.scene.toggles.reload_live(self.params.as_ref(), gate);
            debug!("Live toggles reloaded (second pass: {})", self.live_toggles_checked);

            // cleared on the second consecutive pass while engaged
            if self.live_toggles_checked && self.scene.enabled {
                self.params_memory.put_bool(TOGGLES_UPDATED_KEY, false);
                info!("Live toggle update applied");
            }
            self.live_toggles_checked = !self.live_toggles_checked;
        }

        if self.scene.conditional_experimental {
            self.scene.conditional_status = self.params_memory.get_int("ConditionalStatus");
        }
        self.scene.map_open = self.params_memory.get_bool("MapOpen");
    }

    // ========================================================================
    // STREAMS
    // ========================================================================

    fn update_state(&mut self) {
        let sm = &self.sm;
        let scene = &mut self.scene;
        let toggles = &scene.toggles;

        if sm.updated(Service::LiveCalibration) {
            if let Some(live_calib) = sm.live_calibration() {
                if self.calibration.update(live_calib) {
                    self.projector = Projector::new(&self.calibration, self.frame_size);
                }
                scene.calibration_valid = self.calibration.calibration_valid;
                scene.calibration_wide_valid = self.calibration.calibration_wide_valid;
            }
        }

        if sm.updated(Service::PandaStates) {
            if let Some(first) = sm.panda_states().and_then(|p| p.first()) {
                scene.panda_type = first.panda_type;
                if scene.panda_type != PandaType::Unknown {
                    let panda_states = sm.panda_states().into_iter().flatten();
                    scene.ignition = panda_states.fold(false, |ign, p| {
                        ign || p.ignition_line || p.ignition_can
                    });
                }
            }
        } else if sm.frames_since(Service::PandaStates) > PANDA_STALE_SECONDS * self.ui_freq as u64
        {
            if scene.panda_type != PandaType::Unknown {
                warn!(
                    "{} stale for {} frames, hardware type unknown",
                    Service::PandaStates.name(),
                    sm.frames_since(Service::PandaStates)
                );
            }
            scene.panda_type = PandaType::Unknown;
        }

        if sm.updated(Service::CarControl) {
            if let Some(car_control) = sm.car_control() {
                if scene.always_on_lateral {
                    scene.always_on_lateral_active = !scene.enabled && car_control.always_on_lateral;
                }
            }
        }

        if sm.updated(Service::CarParams) {
            if let Some(car_params) = sm.car_params() {
                scene.always_on_lateral = car_params.always_on_lateral;
                scene.longitudinal_control = car_params.openpilot_longitudinal_control;
                if scene.longitudinal_control {
                    scene.conditional_experimental = car_params.conditional_experimental_mode;
                    scene.driving_personalities_ui_wheel = car_params.driving_personalities_ui_wheel;
                    scene.experimental_mode_via_wheel = car_params.experimental_mode_via_wheel;
                }
            }
        }

        if sm.updated(Service::CarState) {
            if let Some(car_state) = sm.car_state() {
                scene.v_ego = car_state.v_ego;
                if toggles.blind_spot_path || toggles.frog_signals {
                    scene.blind_spot_left = car_state.left_blindspot;
                    scene.blind_spot_right = car_state.right_blindspot;
                }
                if toggles.developer_ui || toggles.frog_signals {
                    scene.turn_signal_left = car_state.left_blinker;
                    scene.turn_signal_right = car_state.right_blinker;
                }
                if toggles.blind_spot_path || toggles.developer_ui || toggles.rotating_wheel {
                    scene.steering_angle_deg = car_state.steering_angle_deg;
                }
                if scene.started {
                    scene.toyota_car = car_state.toyota_car;
                }
            }
        }

        if sm.updated(Service::ControlsState) {
            if let Some(controls) = sm.controls_state() {
                scene.enabled = controls.enabled;
                scene.experimental_mode = controls.experimental_mode;
            }
        }

        if sm.updated(Service::GpsLocationExternal) {
            if let Some(gps) = sm.gps_location_external() {
                if toggles.compass {
                    scene.bearing_deg = gps.bearing_deg;
                }
            }
        }

        if sm.updated(Service::LateralPlan) {
            if let Some(plan) = sm.lateral_plan() {
                if toggles.blind_spot_path || toggles.developer_ui {
                    scene.lane_width_left = plan.lane_width_left;
                    scene.lane_width_right = plan.lane_width_right;
                }
            }
        }

        if sm.updated(Service::LongitudinalPlan) {
            if let Some(plan) = sm.longitudinal_plan() {
                if toggles.developer_ui {
                    scene.desired_follow = plan.desired_follow_distance;
                    scene.obstacle_distance = plan.safe_obstacle_distance;
                    scene.obstacle_distance_stock = plan.safe_obstacle_distance_stock;
                    scene.stopped_equivalence = plan.stopped_equivalence_factor;
                    scene.stopped_equivalence_stock = plan.stopped_equivalence_factor_stock;
                }
            }
        }

        if sm.updated(Service::WideRoadCameraState) {
            if let Some(cam_state) = sm.wide_road_camera_state() {
                let scale = if cam_state.sensor == ImageSensor::Ar0231 {
                    6.0
                } else {
                    1.0
                };
                scene.light_sensor = (100.0 - scale * cam_state.exposure_val_percent).max(0.0);
            }
        }

        if sm.updated(Service::DriverMonitoringState) {
            if let Some(dm) = sm.driver_monitoring_state() {
                scene.is_rhd = dm.is_rhd;
            }
        }

        if sm.updated(Service::DriverStateV2) {
            if let Some(driver_state) = sm.driver_state_v2() {
                let pose = self
                    .driver_pose
                    .update(driver_state, scene.dm_fade_state, scene.is_rhd);
                scene.driver_pose = pose.clone();
            }
        }

        let device_started = sm.device_state().map(|d| d.started).unwrap_or(false);
        scene.started = device_started && scene.ignition;

        self.update_camera_selection();

        if self.sm.updated(Service::ModelV2) {
            if let Some(model) = self.sm.model_v2() {
                let view = self.projector.view(self.scene.wide_cam);
                update_model(
                    &mut self.scene,
                    view,
                    model,
                    self.sm.ui_plan(),
                    self.sm.radar_state(),
                );
            }
        }
    }

    fn update_camera_selection(&mut self) {
        let scene = &mut self.scene;
        let available = !scene.toggles.wide_camera_disabled && scene.calibration_wide_valid;
        if !available {
            scene.wide_cam = false;
            return;
        }
        if scene.v_ego < WIDE_CAM_ON_SPEED {
            self.wide_cam_requested = true;
        } else if scene.v_ego > WIDE_CAM_OFF_SPEED {
            self.wide_cam_requested = false;
        }
        let wide_cam = self.wide_cam_requested && scene.experimental_mode;
        if wide_cam != scene.wide_cam {
            debug!("Switching to {} camera", if wide_cam { "wide" } else { "narrow" });
        }
        scene.wide_cam = wide_cam;
    }

    fn update_status(&mut self, bus: &mut EventBus) {
        let controls = if self.sm.updated(Service::ControlsState) {
            self.sm.controls_state()
        } else {
            None
        };
        let update = self.status.update(
            self.sm.frame(),
            self.scene.started,
            self.scene.always_on_lateral_active,
            controls,
        );

        if let Some(offroad) = update.offroad_transition {
            if !offroad {
                self.scene.started_frame = self.sm.frame();
            }
            if !self.toggles_checked {
                self.update_params();
            }
            bus.publish(UiEvent::OffroadTransition(offroad));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::*;
    use crate::params::MemoryParams;

    struct Harness {
        ui: UiState,
        bus: EventBus,
        params: MemoryParams,
        memory: MemoryParams,
    }

    impl Harness {
        fn new() -> Self {
            let params = MemoryParams::new();
            params.put_bool("DefaultParamsSet", true);
            params.put_bool("CustomRoadUI", true);
            params.put_bool("BlindSpotPath", true);
            params.put_bool("Compass", true);
            params.put("ScreenBrightness", "101");
            let memory = MemoryParams::new();
            let ui = UiState::new(
                &UiConfig::default(),
                Box::new(params.clone()),
                Box::new(memory.clone()),
            );
            Self {
                ui,
                bus: EventBus::new(256),
                params,
                memory,
            }
        }

        fn tick(&mut self, msgs: Vec<Message>) -> Vec<UiEvent> {
            self.ui.tick(msgs, &mut self.bus);
            self.bus.drain()
        }

        /// Tick and return the offroad transitions it raised.
        fn tick_offroad(&mut self, msgs: Vec<Message>) -> Vec<bool> {
            self.ui.tick(msgs, &mut self.bus);
            let transitions = self.bus.drain_offroad();
            self.bus.drain();
            transitions
        }
    }

    fn panda(line: bool, can: bool) -> PandaState {
        PandaState {
            panda_type: PandaType::Tres,
            ignition_line: line,
            ignition_can: can,
        }
    }

    fn onroad() -> Vec<Message> {
        vec![
            Message::PandaStates(vec![panda(false, false), panda(false, true)]),
            Message::DeviceState(DeviceState { started: true }),
        ]
    }

    #[test]
    fn test_started_needs_device_and_ignition() {
        let mut h = Harness::new();
        h.tick(vec![Message::DeviceState(DeviceState { started: true })]);
        assert!(!h.ui.scene().started);

        h.tick(vec![Message::PandaStates(vec![panda(false, false), panda(false, true)])]);
        assert!(h.ui.scene().ignition);
        assert!(h.ui.scene().started);
    }

    #[test]
    fn test_ignition_untrusted_for_unknown_panda() {
        let mut h = Harness::new();
        h.tick(vec![Message::PandaStates(vec![PandaState {
            panda_type: PandaType::Unknown,
            ignition_line: true,
            ignition_can: true,
        }])]);
        assert!(!h.ui.scene().ignition);
    }

    #[test]
    fn test_offroad_transitions_are_edge_triggered() {
        let mut h = Harness::new();
        assert_eq!(h.tick_offroad(Vec::new()), vec![true]);

        assert_eq!(h.tick_offroad(onroad()), vec![false]);
        assert_eq!(h.ui.scene().started_frame, 2);

        assert!(h.tick_offroad(Vec::new()).is_empty());

        let stopped = vec![Message::DeviceState(DeviceState { started: false })];
        assert_eq!(h.tick_offroad(stopped), vec![true]);
    }

    #[test]
    fn test_every_tick_publishes_snapshot() {
        let mut h = Harness::new();
        let events = h.tick(onroad());
        let snapshot = events.iter().find_map(|e| match e {
            UiEvent::UiUpdate { frame, scene } => Some((*frame, scene.clone())),
            _ => None,
        });
        let (frame, scene) = snapshot.expect("ui update");
        assert_eq!(frame, 1);
        assert!(scene.started);

        // later ticks do not touch a published snapshot
        h.tick(vec![Message::DeviceState(DeviceState { started: false })]);
        assert!(scene.started);
        assert!(!h.ui.scene().started);
    }

    #[test]
    fn test_engaged_after_start() {
        let mut h = Harness::new();
        h.tick(onroad());
        assert_eq!(h.ui.status(), UiStatus::Disengaged);

        h.tick(vec![Message::ControlsState(ControlsState {
            enabled: true,
            state: OpenpilotState::Enabled,
            experimental_mode: false,
        })]);
        assert_eq!(h.ui.status(), UiStatus::Engaged);
        assert!(h.ui.scene().enabled);
    }

    #[test]
    fn test_always_on_lateral() {
        let mut h = Harness::new();
        h.tick(onroad());
        h.tick(vec![
            Message::CarParams(CarParams {
                always_on_lateral: true,
                ..Default::default()
            }),
        ]);
        h.tick(vec![
            Message::CarControl(CarControl {
                always_on_lateral: true,
            }),
            Message::ControlsState(ControlsState::default()),
        ]);
        assert!(h.ui.scene().always_on_lateral_active);
        assert_eq!(h.ui.status(), UiStatus::LateralActive);
    }

    #[test]
    fn test_panda_staleness_forces_unknown() {
        let mut h = Harness::new();
        h.tick(onroad());
        assert_eq!(h.ui.scene().panda_type, PandaType::Tres);

        let limit = PANDA_STALE_SECONDS * UiConfig::default().freq as u64;
        for _ in 0..limit {
            h.tick(Vec::new());
        }
        assert_eq!(h.ui.scene().panda_type, PandaType::Tres);

        h.tick(Vec::new());
        assert_eq!(h.ui.scene().panda_type, PandaType::Unknown);
        // ignition is left as last reported
        assert!(h.ui.scene().ignition);
    }

    #[test]
    fn test_toggle_gated_fields() {
        let mut h = Harness::new();
        h.tick(vec![
            Message::CarState(CarState {
                left_blindspot: true,
                left_blinker: true,
                steering_angle_deg: 12.0,
                ..Default::default()
            }),
            Message::LongitudinalPlan(LongitudinalPlan {
                desired_follow_distance: 30.0,
                ..Default::default()
            }),
            Message::GpsLocationExternal(GpsLocation { bearing_deg: 90.0 }),
        ]);
        let scene = h.ui.scene();
        assert!(scene.blind_spot_left);
        assert_eq!(scene.steering_angle_deg, 12.0);
        assert_eq!(scene.bearing_deg, 90.0);
        // developer UI and frog signals are off
        assert!(!scene.turn_signal_left);
        assert_eq!(scene.desired_follow, 0.0);
    }

    #[test]
    fn test_light_sensor_scale() {
        let mut h = Harness::new();
        h.tick(vec![Message::WideRoadCameraState(CameraState {
            sensor: ImageSensor::Ar0231,
            exposure_val_percent: 10.0,
        })]);
        assert!((h.ui.scene().light_sensor - 40.0).abs() < 1e-5);
        h.tick(vec![Message::WideRoadCameraState(CameraState {
            sensor: ImageSensor::Ar0231,
            exposure_val_percent: 50.0,
        })]);
        assert_eq!(h.ui.scene().light_sensor, 0.0);
        h.tick(vec![Message::WideRoadCameraState(CameraState {
            sensor: ImageSensor::Ox03c10,
            exposure_val_percent: 50.0,
        })]);
        assert!((h.ui.scene().light_sensor - 50.0).abs() < 1e-5);
    }

    #[test]
    fn test_calibration_feeds_projection() {
        let mut h = Harness::new();
        assert!(!h.ui.scene().calibration_valid);
        h.tick(vec![Message::LiveCalibration(LiveCalibration {
            rpy_calib: vec![0.0, 0.05, 0.0],
            wide_from_device_euler: vec![0.0, 0.0, 0.0],
            cal_status: CalibrationStatus::Calibrated,
        })]);
        assert!(h.ui.scene().calibration_valid);
        assert!(h.ui.scene().calibration_wide_valid);

        let before = h.ui.projector().project(crate::types::Point3::new(30.0, 0.0, 1.22), false);
        h.tick(vec![Message::LiveCalibration(LiveCalibration {
            rpy_calib: vec![0.0],
            wide_from_device_euler: vec![],
            cal_status: CalibrationStatus::Calibrated,
        })]);
        let after = h.ui.projector().project(crate::types::Point3::new(30.0, 0.0, 1.22), false);
        assert_eq!(before, after);
    }

    #[test]
    fn test_model_update_builds_geometry() {
        let mut h = Harness::new();
        let line = |y: f32| XyztData {
            x: (0..33).map(|i| 2.0 + i as f32 * 3.0).collect(),
            y: vec![y; 33],
            z: vec![0.0; 33],
            t: Vec::new(),
        };
        h.tick(vec![Message::ModelV2(ModelV2 {
            position: line(0.0),
            lane_lines: vec![line(-5.4), line(-1.8), line(1.8), line(5.4)],
            lane_line_probs: vec![0.1, 0.9, 0.9, 0.1],
            road_edges: vec![line(-7.0), line(7.0)],
            road_edge_stds: vec![0.3, 0.3],
        })]);
        let scene = h.ui.scene();
        assert!(!scene.track_vertices.is_empty());
        assert_eq!(scene.lane_line_probs[1], 0.9);
    }

    #[test]
    fn test_wide_camera_hysteresis() {
        let mut h = Harness::new();
        let controls = Message::ControlsState(ControlsState {
            enabled: true,
            state: OpenpilotState::Enabled,
            experimental_mode: true,
        });
        let calib = Message::LiveCalibration(LiveCalibration {
            rpy_calib: vec![0.0, 0.0, 0.0],
            wide_from_device_euler: vec![0.0, 0.0, 0.0],
            cal_status: CalibrationStatus::Calibrated,
        });
        let speed = |v_ego: f32| {
            Message::CarState(CarState {
                v_ego,
                ..Default::default()
            })
        };

        h.tick(vec![controls, calib, speed(5.0)]);
        assert!(h.ui.scene().wide_cam);
        h.tick(vec![speed(12.0)]);
        assert!(h.ui.scene().wide_cam);
        h.tick(vec![speed(16.0)]);
        assert!(!h.ui.scene().wide_cam);
        h.tick(vec![speed(12.0)]);
        assert!(!h.ui.scene().wide_cam);
    }

    #[test]
    fn test_live_toggle_reload_and_clear() {
        let mut h = Harness::new();
        h.tick(onroad());
        h.tick(vec![Message::ControlsState(ControlsState {
            enabled: true,
            state: OpenpilotState::Enabled,
            experimental_mode: false,
        })]);

        h.params.put("ScreenBrightness", "30");
        h.memory.put_bool(TOGGLES_UPDATED_KEY, true);

        h.tick(Vec::new());
        assert_eq!(h.ui.scene().toggles.screen_brightness, 30);
        assert!(h.memory.get_bool(TOGGLES_UPDATED_KEY));

        h.tick(Vec::new());
        assert!(!h.memory.get_bool(TOGGLES_UPDATED_KEY));
    }

    #[test]
    fn test_fast_store_polled_every_tick() {
        let mut h = Harness::new();
        h.memory.put_bool("MapOpen", true);
        h.tick(Vec::new());
        assert!(h.ui.scene().map_open);
    }

    #[test]
    fn test_deferred_toggles_loaded_on_transition() {
        let params = MemoryParams::new();
        params.put_bool("CustomRoadUI", true);
        let mut ui = UiState::new(
            &UiConfig::default(),
            Box::new(params.clone()),
            Box::new(MemoryParams::new()),
        );
        assert!(!ui.scene().toggles.custom_road_ui);

        params.put_bool("DefaultParamsSet", true);
        let mut bus = EventBus::default();
        ui.tick(Vec::new(), &mut bus);
        assert!(ui.scene().toggles.custom_road_ui);
    }
}
