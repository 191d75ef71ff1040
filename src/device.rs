// src/device.rs
//
// Display backlight and wakefulness. Runs after every UI tick on the
// published scene.

use crate::pipeline::{EventBus, UiEvent};
use crate::scene::Scene;
use crate::smoother::FirstOrderFilter;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Backlight smoothing time constant in seconds.
pub const BACKLIGHT_TS: f32 = 10.0;
/// Backlight filter sample period in seconds.
pub const BACKLIGHT_DT: f32 = 0.05;

/// Interactive timeout after a touch, in seconds.
const TIMEOUT_IGNITION_ON: u32 = 10;
const TIMEOUT_IGNITION_OFF: u32 = 30;

/// Screen brightness setting above which brightness follows the light sensor.
const AUTO_BRIGHTNESS: i32 = 100;

/// Board-level display controls. Calls may block.
pub trait Hardware: Send + Sync {
    fn set_brightness(&self, percent: i32);
    fn set_display_power(&self, on: bool);
}

/// Hardware that only logs what it was asked to do.
#[derive(Debug, Default)]
pub struct LoggingHardware;

impl Hardware for LoggingHardware {
    fn set_brightness(&self, percent: i32) {
        info!("Backlight -> {}%", percent);
    }

    fn set_display_power(&self, on: bool) {
        info!("Display power -> {}", if on { "on" } else { "off" });
    }
}

pub struct Device {
    hardware: Arc<dyn Hardware>,
    brightness_filter: FirstOrderFilter,
    brightness_task: Option<JoinHandle<()>>,
    last_brightness: i32,
    offroad_brightness: f32,

    awake: bool,
    ignition_on: bool,
    interactive_timeout: u32,
    ui_freq: u32,
}

impl Device {
    pub fn new(hardware: Arc<dyn Hardware>, offroad_brightness: f32, ui_freq: u32) -> Self {
        let offroad_brightness = offroad_brightness.clamp(0.0, 100.0);
        let mut device = Self {
            hardware,
            brightness_filter: FirstOrderFilter::new(offroad_brightness, BACKLIGHT_TS, BACKLIGHT_DT),
            brightness_task: None,
            last_brightness: 0,
            offroad_brightness,
            awake: false,
            ignition_on: false,
            interactive_timeout: 0,
            ui_freq: ui_freq.max(1),
        };
        // power the display up without announcing it
        device.awake = true;
        device.hardware.set_display_power(true);
        device.reset_interactive_timeout(None);
        device
    }

    pub fn is_awake(&self) -> bool {
        self.awake
    }

    pub fn interactive_timeout(&self) -> u32 {
        self.interactive_timeout
    }

    pub fn last_brightness(&self) -> i32 {
        self.last_brightness
    }

    /// Restart the interactive timeout; `None` picks the default for the
    /// current ignition state.
    pub fn reset_interactive_timeout(&mut self, seconds: Option<u32>) {
        let seconds = seconds.unwrap_or(if self.ignition_on {
            TIMEOUT_IGNITION_ON
        } else {
            TIMEOUT_IGNITION_OFF
        });
        self.interactive_timeout = seconds * self.ui_freq;
    }

    pub fn update(&mut self, scene: &Scene, bus: &mut EventBus) {
        self.update_brightness(scene);
        self.update_wakefulness(scene, bus);
    }

    /// Wait for an outstanding backlight call to finish.
    pub async fn flush(&mut self) {
        if let Some(task) = self.brightness_task.take() {
            if let Err(e) = task.await {
                warn!("Backlight task failed: {}", e);
            }
        }
    }

    fn set_awake(&mut self, on: bool, bus: &mut EventBus) {
        if on != self.awake {
            self.awake = on;
            self.hardware.set_display_power(on);
            debug!("Setting display power {}", on);
            bus.publish(UiEvent::DisplayPowerChanged(on));
        }
    }

    fn update_brightness(&mut self, scene: &Scene) {
        let target = if scene.started {
            sensor_brightness(scene.light_sensor)
        } else {
            self.offroad_brightness
        };

        let mut brightness = self.brightness_filter.update(target) as i32;
        let screen_brightness = scene.toggles.screen_brightness;
        if !self.awake {
            brightness = 0;
        } else if screen_brightness <= AUTO_BRIGHTNESS {
            // manual setting, never fully dark while awake
            brightness = screen_brightness.max(5);
        }

        if brightness != self.last_brightness && !self.brightness_in_flight() {
            self.spawn_brightness(brightness);
            self.last_brightness = brightness;
        }
    }

    fn update_wakefulness(&mut self, scene: &Scene, bus: &mut EventBus) {
        let ignition_just_turned_off = !scene.ignition && self.ignition_on;
        self.ignition_on = scene.ignition;

        if ignition_just_turned_off {
            self.reset_interactive_timeout(None);
        } else if self.interactive_timeout > 0 {
            self.interactive_timeout -= 1;
            if self.interactive_timeout == 0 {
                debug!("Interactive timeout expired");
                bus.publish(UiEvent::InteractiveTimeout);
            }
        }

        let timeout_running = self.interactive_timeout > 0;
        if scene.toggles.screen_brightness != 0 {
            self.set_awake(scene.ignition || timeout_running, bus);
        } else {
            self.set_awake(timeout_running, bus);
        }
    }

    fn brightness_in_flight(&self) -> bool {
        self.brightness_task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    fn spawn_brightness(&mut self, brightness: i32) {
        let hardware = Arc::clone(&self.hardware);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                self.brightness_task = Some(
                    handle.spawn_blocking(move || hardware.set_brightness(brightness)),
                );
            }
            Err(_) => {
                // no runtime (offline tools): call inline
                hardware.set_brightness(brightness);
            }
        }
    }
}

/// Light sensor reading (0-100) to backlight percent via CIE 1931
/// lightness, limited to 10-100.
pub fn sensor_brightness(light_sensor: f32) -> f32 {
    let linear = if light_sensor <= 8.0 {
        light_sensor / 903.3
    } else {
        ((light_sensor + 16.0) / 116.0).powi(3)
    };
    (100.0 * linear).clamp(10.0, 100.0)
}
