// src/pipeline/sub_master.rs
//
// Latest-value view over the data bus. Each tick `update` takes whatever
// arrived since the previous tick, keeps only the newest record per
// service, and remembers the frame it arrived on. Nothing is queued: a
// consumer that looks twice sees the same value twice, which is why callers
// test `updated()` or compare `rcv_frame()` rather than the value itself.

use crate::messages::{Message, Service};
use std::collections::{HashMap, HashSet};
use tracing::trace;

#[derive(Debug, Default)]
pub struct SubMaster {
    frame: u64,
    latest: HashMap<Service, Message>,
    rcv_frame: HashMap<Service, u64>,
    updated: HashSet<Service>,
}

impl SubMaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one tick and absorb the messages that arrived since the last.
    pub fn update<I>(&mut self, incoming: I)
    where
        I: IntoIterator<Item = Message>,
    {
        self.frame += 1;
        self.updated.clear();
        for msg in incoming {
            let service = msg.service();
            self.latest.insert(service, msg);
            self.rcv_frame.insert(service, self.frame);
            self.updated.insert(service);
        }
        trace!(
            "SubMaster frame {}: updated [{}]",
            self.frame,
            self.updated
                .iter()
                .map(|s| s.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    /// Ticks seen so far; the first `update` makes this 1.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn updated(&self, service: Service) -> bool {
        self.updated.contains(&service)
    }

    /// Frame the service last delivered on, 0 if never.
    pub fn rcv_frame(&self, service: Service) -> u64 {
        self.rcv_frame.get(&service).copied().unwrap_or(0)
    }

    /// Ticks since the service last delivered.
    pub fn frames_since(&self, service: Service) -> u64 {
        self.frame - self.rcv_frame(service)
    }

}

/// Typed accessors over the latest records.
macro_rules! latest_accessor {
    ($fn_name:ident, $variant:ident, $ty:ty) => {
        impl SubMaster {
            pub fn $fn_name(&self) -> Option<&$ty> {
                match self.latest.get(&Service::$variant) {
                    Some(Message::$variant(v)) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

latest_accessor!(model_v2, ModelV2, crate::messages::ModelV2);
latest_accessor!(ui_plan, UiPlan, crate::messages::UiPlan);
latest_accessor!(controls_state, ControlsState, crate::messages::ControlsState);
latest_accessor!(live_calibration, LiveCalibration, crate::messages::LiveCalibration);
latest_accessor!(radar_state, RadarState, crate::messages::RadarState);
latest_accessor!(device_state, DeviceState, crate::messages::DeviceState);
latest_accessor!(panda_states, PandaStates, Vec<crate::messages::PandaState>);
latest_accessor!(car_params, CarParams, crate::messages::CarParams);
latest_accessor!(
    driver_monitoring_state,
    DriverMonitoringState,
    crate::messages::DriverMonitoringState
);
latest_accessor!(car_state, CarState, crate::messages::CarState);
latest_accessor!(driver_state_v2, DriverStateV2, crate::messages::DriverStateV2);
latest_accessor!(wide_road_camera_state, WideRoadCameraState, crate::messages::CameraState);
latest_accessor!(car_control, CarControl, crate::messages::CarControl);
latest_accessor!(gps_location_external, GpsLocationExternal, crate::messages::GpsLocation);
latest_accessor!(lateral_plan, LateralPlan, crate::messages::LateralPlan);
latest_accessor!(longitudinal_plan, LongitudinalPlan, crate::messages::LongitudinalPlan);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{ControlsState, DeviceState};

    fn controls(enabled: bool) -> Message {
        Message::ControlsState(ControlsState {
            enabled,
            ..Default::default()
        })
    }

    #[test]
    fn test_updated_only_on_arrival_tick() {
        let mut sm = SubMaster::new();
        sm.update(vec![controls(true)]);
        assert_eq!(sm.frame(), 1);
        assert!(sm.updated(Service::ControlsState));
        assert_eq!(sm.rcv_frame(Service::ControlsState), 1);

        sm.update(Vec::new());
        assert!(!sm.updated(Service::ControlsState));
        // the last value stays readable
        assert!(sm.controls_state().unwrap().enabled);
        assert_eq!(sm.frames_since(Service::ControlsState), 1);
    }

    #[test]
    fn test_latest_value_wins_within_tick() {
        let mut sm = SubMaster::new();
        sm.update(vec![controls(true), controls(false)]);
        assert!(!sm.controls_state().unwrap().enabled);
    }

    #[test]
    fn test_never_received() {
        let mut sm = SubMaster::new();
        sm.update(vec![Message::DeviceState(DeviceState { started: true })]);
        sm.update(Vec::new());
        sm.update(Vec::new());
        assert_eq!(sm.rcv_frame(Service::PandaStates), 0);
        assert_eq!(sm.frames_since(Service::PandaStates), 3);
        assert!(sm.panda_states().is_none());
        assert!(sm.device_state().unwrap().started);
    }
}
