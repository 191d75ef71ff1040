// src/projection/calibration.rs
//
// View-from-calibration rotations for the narrow and wide road cameras.
// Rebuilt only when a liveCalibration record with well-formed angle sets
// arrives; otherwise the previous rotations stay in force.

use crate::messages::{CalibrationStatus, LiveCalibration};
use nalgebra::{Matrix3, Rotation3};
use tracing::{debug, warn};

/// Axis swap from the device frame (x forward, y right, z down) to the
/// camera view frame (x right, y down, z forward).
pub fn view_from_device() -> Matrix3<f32> {
    Matrix3::new(
        0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0, //
        1.0, 0.0, 0.0,
    )
}

/// Roll-pitch-yaw to rotation, composed as `Rz(yaw) * Ry(pitch) * Rx(roll)`.
pub fn euler_to_rot(rpy: [f32; 3]) -> Matrix3<f32> {
    Rotation3::from_euler_angles(rpy[0], rpy[1], rpy[2]).into_inner()
}

fn as_euler(values: &[f32]) -> Option<[f32; 3]> {
    match values {
        [r, p, y] => Some([*r, *p, *y]),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct CalibrationModel {
    pub view_from_calib: Matrix3<f32>,
    pub view_from_wide_calib: Matrix3<f32>,
    pub calibration_valid: bool,
    pub calibration_wide_valid: bool,
}

impl Default for CalibrationModel {
    fn default() -> Self {
        Self {
            view_from_calib: view_from_device(),
            view_from_wide_calib: view_from_device(),
            calibration_valid: false,
            calibration_wide_valid: false,
        }
    }
}

impl CalibrationModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotation for the selected camera
    pub fn view_from(&self, use_wide_camera: bool) -> &Matrix3<f32> {
        if use_wide_camera {
            &self.view_from_wide_calib
        } else {
            &self.view_from_calib
        }
    }

    /// Apply a liveCalibration record. Returns true if the rotations changed.
    pub fn update(&mut self, live_calib: &LiveCalibration) -> bool {
        let Some(rpy) = as_euler(&live_calib.rpy_calib) else {
            warn!(
                "Ignoring calibration with {} rpy values",
                live_calib.rpy_calib.len()
            );
            return false;
        };

        let device_from_calib = euler_to_rot(rpy);
        self.view_from_calib = view_from_device() * device_from_calib;
        self.calibration_valid = live_calib.cal_status == CalibrationStatus::Calibrated;

        match as_euler(&live_calib.wide_from_device_euler) {
            Some(wfde) => {
                let wide_from_device = euler_to_rot(wfde);
                self.view_from_wide_calib =
                    view_from_device() * wide_from_device * device_from_calib;
                self.calibration_wide_valid = true;
            }
            None => self.calibration_wide_valid = false,
        }

        debug!(
            "Calibration rebuilt: valid={} wide_valid={} rpy=[{:.4}, {:.4}, {:.4}]",
            self.calibration_valid, self.calibration_wide_valid, rpy[0], rpy[1], rpy[2]
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn approx_mat(a: &Matrix3<f32>, b: &Matrix3<f32>) -> bool {
        (a - b).amax() < 1e-6
    }

    #[test]
    fn test_zero_angles_give_axis_swap() {
        let mut calib = CalibrationModel::new();
        let changed = calib.update(&LiveCalibration {
            rpy_calib: vec![0.0, 0.0, 0.0],
            wide_from_device_euler: vec![0.0, 0.0, 0.0],
            cal_status: CalibrationStatus::Calibrated,
        });
        assert!(changed);
        assert!(calib.calibration_valid);
        assert!(calib.calibration_wide_valid);
        assert!(approx_mat(&calib.view_from_calib, &view_from_device()));

        // forward in the device frame is depth in the view frame
        let v = calib.view_from_calib * Vector3::new(1.0, 0.0, 0.0);
        assert!((v.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_yaw_rotation_matches_closed_form() {
        let yaw: f32 = 0.1;
        let rot = euler_to_rot([0.0, 0.0, yaw]);
        let expected = Matrix3::new(
            yaw.cos(),
            -yaw.sin(),
            0.0,
            yaw.sin(),
            yaw.cos(),
            0.0,
            0.0,
            0.0,
            1.0,
        );
        assert!(approx_mat(&rot, &expected));
    }

    #[test]
    fn test_malformed_rpy_keeps_previous() {
        let mut calib = CalibrationModel::new();
        calib.update(&LiveCalibration {
            rpy_calib: vec![0.0, 0.02, 0.0],
            wide_from_device_euler: vec![],
            cal_status: CalibrationStatus::Calibrated,
        });
        let before = calib.view_from_calib;
        assert!(!calib.calibration_wide_valid);

        let changed = calib.update(&LiveCalibration {
            rpy_calib: vec![0.5, 0.5],
            wide_from_device_euler: vec![0.0, 0.0, 0.0],
            cal_status: CalibrationStatus::Uncalibrated,
        });
        assert!(!changed);
        assert!(calib.calibration_valid);
        assert!(approx_mat(&calib.view_from_calib, &before));
    }

    #[test]
    fn test_uncalibrated_status_marks_invalid() {
        let mut calib = CalibrationModel::new();
        calib.update(&LiveCalibration {
            rpy_calib: vec![0.0, 0.0, 0.0],
            wide_from_device_euler: vec![0.0, 0.0, 0.0],
            cal_status: CalibrationStatus::Recalibrating,
        });
        assert!(!calib.calibration_valid);
        assert!(calib.calibration_wide_valid);
    }
}
