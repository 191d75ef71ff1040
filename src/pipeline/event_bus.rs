// src/pipeline/event_bus.rs
//
// Notifications leaving the UI tick. Producers publish; whoever owns the
// loop drains and dispatches. Nothing reaches into another component's
// state to find out what happened.

use crate::scene::Scene;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub enum UiEvent {
    /// Carries `true` when going offroad (no longer started)
    OffroadTransition(bool),

    /// End of a tick, with a read-only copy of the scene
    UiUpdate { frame: u64, scene: Arc<Scene> },

    DisplayPowerChanged(bool),

    InteractiveTimeout,
}

pub struct EventBus {
    events: VecDeque<UiEvent>,
    max_pending: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventBus {
    pub fn new(max_pending: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_pending),
            max_pending: max_pending.max(1),
        }
    }

    /// Queue an event. When full, the oldest scene snapshot goes first
    /// since a newer one supersedes it; transitions and power changes are
    /// only dropped when no snapshot is left to evict.
    pub fn publish(&mut self, event: UiEvent) {
        if self.events.len() >= self.max_pending {
            let snapshot = self
                .events
                .iter()
                .position(|e| matches!(e, UiEvent::UiUpdate { .. }));
            match snapshot.and_then(|idx| self.events.remove(idx)) {
                Some(UiEvent::UiUpdate { frame, .. }) => {
                    debug!("Event bus full, dropping snapshot of frame {}", frame);
                }
                _ => {
                    if let Some(dropped) = self.events.pop_front() {
                        warn!(
                            "Event bus full ({} events), dropping {:?}",
                            self.max_pending, dropped
                        );
                    }
                }
            }
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<UiEvent> {
        self.events.drain(..).collect()
    }

    /// Take only the offroad transitions, in order, leaving everything else
    /// queued. Each entry is `true` for going offroad.
    pub fn drain_offroad(&mut self) -> Vec<bool> {
        let mut transitions = Vec::new();
        self.events.retain(|e| match e {
            UiEvent::OffroadTransition(offroad) => {
                transitions.push(*offroad);
                false
            }
            _ => true,
        });
        transitions
    }

    pub fn pending_count(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(frame: u64) -> UiEvent {
        UiEvent::UiUpdate {
            frame,
            scene: Arc::new(Scene::default()),
        }
    }

    #[test]
    fn test_drops_oldest_when_full() {
        let mut bus = EventBus::new(2);
        bus.publish(UiEvent::OffroadTransition(true));
        bus.publish(UiEvent::DisplayPowerChanged(true));
        bus.publish(UiEvent::InteractiveTimeout);
        assert_eq!(bus.pending_count(), 2);

        let events = bus.drain();
        assert!(matches!(events[0], UiEvent::DisplayPowerChanged(true)));
        assert!(matches!(events[1], UiEvent::InteractiveTimeout));
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_evicts_stale_snapshot_first() {
        let mut bus = EventBus::new(3);
        bus.publish(UiEvent::OffroadTransition(false));
        bus.publish(update(1));
        bus.publish(update(2));
        bus.publish(update(3));

        let events = bus.drain();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], UiEvent::OffroadTransition(false)));
        assert!(matches!(events[1], UiEvent::UiUpdate { frame: 2, .. }));
        assert!(matches!(events[2], UiEvent::UiUpdate { frame: 3, .. }));
    }

    #[test]
    fn test_drain_offroad_keeps_other_events() {
        let mut bus = EventBus::default();
        bus.publish(UiEvent::OffroadTransition(true));
        bus.publish(update(1));
        bus.publish(UiEvent::OffroadTransition(false));
        bus.publish(UiEvent::InteractiveTimeout);

        assert_eq!(bus.drain_offroad(), vec![true, false]);
        assert_eq!(bus.pending_count(), 2);
        assert!(bus.drain_offroad().is_empty());

        let rest = bus.drain();
        assert!(matches!(rest[0], UiEvent::UiUpdate { frame: 1, .. }));
        assert!(matches!(rest[1], UiEvent::InteractiveTimeout));
    }
}
