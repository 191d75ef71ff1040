// src/driver_monitor.rs
//
// Driver face pose for the monitoring icon. The face orientation from the
// driver-state model is gained per axis, low-pass filtered, and used to
// rotate a fixed wireframe of face keypoints. While the icon animates in or
// out (`fade` → 1) the rotation fades to identity and every keypoint is
// pushed to the same depth.

use crate::messages::DriverStateV2;
use crate::smoother::FirstOrderFilter;
use crate::types::Point3;
use serde::Serialize;

/// Share of each new sample taken by the orientation filter.
const POSE_FILTER_GAIN: f32 = 0.2;

const YAW_GAIN_NEGATIVE: f32 = 0.7;
const YAW_GAIN_POSITIVE: f32 = 0.9;
const PITCH_ROLL_GAIN: f32 = 0.4;

/// Depth every keypoint reaches when fully faded.
pub const FADE_DEPTH: f32 = 8.0;

pub const DEFAULT_FACE_KPTS_3D: [[f32; 3]; 30] = [
    [-5.98, -51.20, 8.00],
    [-17.64, -49.14, 8.00],
    [-23.81, -46.40, 8.00],
    [-29.98, -40.91, 8.00],
    [-32.04, -37.49, 8.00],
    [-34.10, -32.00, 8.00],
    [-36.16, -21.03, 8.00],
    [-36.16, 6.40, 8.00],
    [-35.47, 10.51, 8.00],
    [-32.73, 19.43, 8.00],
    [-29.30, 26.29, 8.00],
    [-24.49, 32.46, 8.00],
    [-18.33, 36.57, 8.00],
    [-11.47, 38.63, 8.00],
    [-5.98, 39.31, 8.00],
    [5.98, 39.31, 8.00],
    [11.47, 38.63, 8.00],
    [18.33, 36.57, 8.00],
    [24.49, 32.46, 8.00],
    [29.30, 26.29, 8.00],
    [32.73, 19.43, 8.00],
    [35.47, 10.51, 8.00],
    [36.16, 6.40, 8.00],
    [36.16, -21.03, 8.00],
    [34.10, -32.00, 8.00],
    [32.04, -37.49, 8.00],
    [29.98, -40.91, 8.00],
    [23.81, -46.40, 8.00],
    [17.64, -49.14, 8.00],
    [5.98, -51.20, 8.00],
];

#[derive(Debug, Clone, Serialize)]
pub struct DriverPose {
    /// Smoothed angle per axis
    pub vals: [f32; 3],
    /// |smoothed - gained raw| before this update, for distraction heuristics
    pub diff: [f32; 3],
    pub sins: [f32; 3],
    pub coss: [f32; 3],
    /// Rotated keypoints in display space, not yet placed on screen
    pub face_kpts_draw: Vec<Point3>,
}

impl Default for DriverPose {
    fn default() -> Self {
        Self {
            vals: [0.0; 3],
            diff: [0.0; 3],
            sins: [0.0; 3],
            coss: [1.0; 3],
            face_kpts_draw: DEFAULT_FACE_KPTS_3D
                .iter()
                .map(|k| Point3::new(k[0], k[1], k[2]))
                .collect(),
        }
    }
}

pub struct DriverPoseEstimator {
    filters: [FirstOrderFilter; 3],
    pose: DriverPose,
}

impl Default for DriverPoseEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverPoseEstimator {
    pub fn new() -> Self {
        Self {
            filters: [FirstOrderFilter::with_gain(0.0, POSE_FILTER_GAIN); 3],
            pose: DriverPose::default(),
        }
    }

    pub fn pose(&self) -> &DriverPose {
        &self.pose
    }

    /// Update from a driverStateV2 record, picking the seat by handedness.
    /// Records without a full orientation leave the pose untouched.
    pub fn update(&mut self, driver_state: &DriverStateV2, fade: f32, is_rhd: bool) -> &DriverPose {
        let data = if is_rhd {
            &driver_state.right_driver_data
        } else {
            &driver_state.left_driver_data
        };
        if let [yaw, pitch, roll, ..] = data.face_orientation[..] {
            self.update_orientation([yaw, pitch, roll], fade);
        }
        &self.pose
    }

    pub fn update_orientation(&mut self, orientation: [f32; 3], fade: f32) -> &DriverPose {
        let fade = fade.clamp(0.0, 1.0);
        let pose = &mut self.pose;

        for (i, filter) in self.filters.iter_mut().enumerate() {
            let raw = orientation[i];
            let gain = match i {
                0 if raw < 0.0 => YAW_GAIN_NEGATIVE,
                0 => YAW_GAIN_POSITIVE,
                _ => PITCH_ROLL_GAIN,
            };
            let v_this = gain * raw;
            pose.diff[i] = (filter.x() - v_this).abs();
            pose.vals[i] = filter.update(v_this);

            let angle = pose.vals[i] * (1.0 - fade);
            pose.sins[i] = angle.sin();
            pose.coss[i] = angle.cos();
        }

        let r = rotation_xyz(&pose.sins, &pose.coss);
        for (out, k) in pose.face_kpts_draw.iter_mut().zip(DEFAULT_FACE_KPTS_3D.iter()) {
            let x = r[0][0] * k[0] + r[0][1] * k[1] + r[0][2] * k[2];
            let y = r[1][0] * k[0] + r[1][1] * k[1] + r[1][2] * k[2];
            let z = r[2][0] * k[0] + r[2][1] * k[1] + r[2][2] * k[2];
            *out = Point3::new(x, y, z * (1.0 - fade) + FADE_DEPTH * fade);
        }
        &self.pose
    }
}

/// XYZ Euler rotation written out from per-axis sines and cosines.
fn rotation_xyz(s: &[f32; 3], c: &[f32; 3]) -> [[f32; 3]; 3] {
    [
        [c[1] * c[2], c[1] * s[2], -s[1]],
        [
            -s[0] * s[1] * c[2] - c[0] * s[2],
            -s[0] * s[1] * s[2] + c[0] * c[2],
            -s[0] * c[1],
        ],
        [
            c[0] * s[1] * c[2] - s[0] * s[2],
            c[0] * s[1] * s[2] + s[0] * c[2],
            c[0] * c[1],
        ],
    ]
}
