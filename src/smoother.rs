// src/smoother.rs

/// First-order exponential low-pass filter.
///
/// Each update keeps `1 - k` of the previous state and takes `k` of the new
/// sample. Used for backlight brightness and driver face orientation.
#[derive(Debug, Clone, Copy)]
pub struct FirstOrderFilter {
    x: f32,
    k: f32,
}

impl FirstOrderFilter {
    /// Filter with a time constant `ts` sampled every `dt` seconds
    pub fn new(x0: f32, ts: f32, dt: f32) -> Self {
        Self::with_gain(x0, dt / (ts + dt))
    }

    /// Filter with an explicit gain on the new sample
    pub fn with_gain(x0: f32, k: f32) -> Self {
        Self {
            x: x0,
            k: k.clamp(0.0, 1.0),
        }
    }

    pub fn update(&mut self, sample: f32) -> f32 {
        self.x = (1.0 - self.k) * self.x + self.k * sample;
        self.x
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn reset(&mut self, x0: f32) {
        self.x = x0;
    }
}
