// src/status.rs
//
// Engagement status shown by the border colour. Re-evaluated on every
// controlsState update while started; any change of the started flag (and
// the very first tick) forces DISENGAGED and announces the offroad
// transition.

use crate::messages::{ControlsState, OpenpilotState};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum UiStatus {
    #[default]
    Disengaged,
    Engaged,
    Override,
    LateralActive,
}

#[derive(Debug, Default)]
pub struct StatusResolver {
    status: UiStatus,
    started_prev: bool,
}

/// Outcome of one resolver step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: UiStatus,
    /// `Some(offroad)` when the started flag changed this tick
    pub offroad_transition: Option<bool>,
}

impl StatusResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> UiStatus {
        self.status
    }

    /// `controls` is the controlsState record if it updated this tick.
    pub fn update(
        &mut self,
        frame: u64,
        started: bool,
        always_on_lateral_active: bool,
        controls: Option<&ControlsState>,
    ) -> StatusUpdate {
        if started {
            if let Some(controls) = controls {
                let next = resolve(controls, always_on_lateral_active);
                if next != self.status {
                    info!("Status {:?} -> {:?}", self.status, next);
                }
                self.status = next;
            }
        }

        let mut offroad_transition = None;
        if started != self.started_prev || frame == 1 {
            if started {
                self.status = UiStatus::Disengaged;
            }
            self.started_prev = started;
            offroad_transition = Some(!started);
            info!("Offroad transition: offroad={}", !started);
        }

        StatusUpdate {
            status: self.status,
            offroad_transition,
        }
    }
}

fn resolve(controls: &ControlsState, always_on_lateral_active: bool) -> UiStatus {
    match controls.state {
        OpenpilotState::PreEnabled | OpenpilotState::Overriding => UiStatus::Override,
        _ if always_on_lateral_active => UiStatus::LateralActive,
        _ if controls.enabled => UiStatus::Engaged,
        _ => UiStatus::Disengaged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls(enabled: bool, state: OpenpilotState) -> ControlsState {
        ControlsState {
            enabled,
            state,
            experimental_mode: false,
        }
    }

    #[test]
    fn test_first_tick_always_announces() {
        let mut resolver = StatusResolver::new();
        let update = resolver.update(1, false, false, None);
        assert_eq!(update.offroad_transition, Some(true));
        let update = resolver.update(2, false, false, None);
        assert_eq!(update.offroad_transition, None);
    }

    #[test]
    fn test_start_edge_forces_disengaged() {
        let mut resolver = StatusResolver::new();
        resolver.update(1, false, false, None);
        let enabled = controls(true, OpenpilotState::Enabled);
        let update = resolver.update(2, true, false, Some(&enabled));
        assert_eq!(update.status, UiStatus::Disengaged);
        assert_eq!(update.offroad_transition, Some(false));

        let update = resolver.update(3, true, false, Some(&enabled));
        assert_eq!(update.status, UiStatus::Engaged);
        assert_eq!(update.offroad_transition, None);
    }

    #[test]
    fn test_priority_order() {
        let mut resolver = StatusResolver::new();
        resolver.update(1, true, false, None);

        let overriding = controls(true, OpenpilotState::Overriding);
        assert_eq!(resolver.update(2, true, true, Some(&overriding)).status, UiStatus::Override);
        let pre = controls(false, OpenpilotState::PreEnabled);
        assert_eq!(resolver.update(3, true, false, Some(&pre)).status, UiStatus::Override);
        let disabled = controls(false, OpenpilotState::Disabled);
        assert_eq!(
            resolver.update(4, true, true, Some(&disabled)).status,
            UiStatus::LateralActive
        );
        assert_eq!(resolver.update(5, true, false, Some(&disabled)).status, UiStatus::Disengaged);
    }

    #[test]
    fn test_ignores_controls_while_offroad_or_stale() {
        let mut resolver = StatusResolver::new();
        resolver.update(1, false, false, None);
        let enabled = controls(true, OpenpilotState::Enabled);
        assert_eq!(resolver.update(2, false, false, Some(&enabled)).status, UiStatus::Disengaged);

        resolver.update(3, true, false, None);
        resolver.update(4, true, false, Some(&enabled));
        // no controlsState this tick: status holds
        assert_eq!(resolver.update(5, true, false, None).status, UiStatus::Engaged);
    }

    #[test]
    fn test_stop_edge_keeps_status_and_reports_offroad() {
        let mut resolver = StatusResolver::new();
        resolver.update(1, true, false, None);
        let enabled = controls(true, OpenpilotState::Enabled);
        resolver.update(2, true, false, Some(&enabled));
        let update = resolver.update(3, false, false, None);
        assert_eq!(update.offroad_transition, Some(true));
        assert_eq!(update.status, UiStatus::Engaged);
    }
}
