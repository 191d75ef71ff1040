// src/projection/camera.rs
//
// Calibrated-frame (vehicle space) to screen projection.
//
//   point ──view_from_calib──▶ camera ray ──intrinsic──▶ image px
//         ──perspective divide──▶ ──screen transform──▶ screen px
//
// Anything landing outside the frame grown by CLIP_MARGIN on every side is
// reported as not visible. The margin keeps points near the edges from
// popping in and out as the predictions jitter.

use super::calibration::CalibrationModel;
use crate::types::{Point2, Point3};
use nalgebra::{Matrix3, Vector3};

pub const CLIP_MARGIN: f32 = 500.0;

/// Rays closer to the camera plane than this cannot be divided safely.
const MIN_DEPTH: f32 = 1e-6;

const NARROW_ZOOM: f32 = 1.1;
const WIDE_ZOOM: f32 = 2.0;

/// Point used to locate the vanishing point when centring the video.
const VANISHING_POINT_DISTANCE: f32 = 1000.0;

/// Road camera intrinsics (1928x1208 sensor).
pub fn fcam_intrinsics() -> Matrix3<f32> {
    Matrix3::new(
        2648.0, 0.0, 1928.0 / 2.0, //
        0.0, 2648.0, 1208.0 / 2.0, //
        0.0, 0.0, 1.0,
    )
}

/// Wide road camera intrinsics (1928x1208 sensor).
pub fn ecam_intrinsics() -> Matrix3<f32> {
    Matrix3::new(
        567.0, 0.0, 1928.0 / 2.0, //
        0.0, 567.0, 1208.0 / 2.0, //
        0.0, 0.0, 1.0,
    )
}

pub trait Project {
    /// Screen position of a calibrated-frame point, `None` if not visible.
    fn project(&self, point: Point3) -> Option<Point2>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSize {
    pub width: f32,
    pub height: f32,
}

impl FrameSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Affine image-to-screen mapping, stored homogeneous.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTransform {
    matrix: Matrix3<f32>,
}

impl ScreenTransform {
    /// Centre the calibrated vanishing point on screen, scale by `zoom`
    /// around the principal point, then put the principal point at the
    /// frame centre shifted by the offsets.
    pub fn centered(frame: FrameSize, zoom: f32, principal: (f32, f32), offset: (f32, f32)) -> Self {
        let to_center = Matrix3::new(
            1.0,
            0.0,
            frame.width / 2.0 - offset.0,
            0.0,
            1.0,
            frame.height / 2.0 - offset.1,
            0.0,
            0.0,
            1.0,
        );
        let scale = Matrix3::new(zoom, 0.0, 0.0, 0.0, zoom, 0.0, 0.0, 0.0, 1.0);
        let from_principal = Matrix3::new(
            1.0,
            0.0,
            -principal.0,
            0.0,
            1.0,
            -principal.1,
            0.0,
            0.0,
            1.0,
        );
        Self {
            matrix: to_center * scale * from_principal,
        }
    }

    pub fn map(&self, x: f32, y: f32) -> Point2 {
        let v = self.matrix * Vector3::new(x, y, 1.0);
        Point2::new(v.x, v.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl ClipRect {
    pub fn with_margin(frame: FrameSize, margin: f32) -> Self {
        Self {
            left: -margin,
            top: -margin,
            right: frame.width + margin,
            bottom: frame.height + margin,
        }
    }

    pub fn contains(&self, p: Point2) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }
}

/// Projection through one camera with a fixed calibration.
#[derive(Debug, Clone)]
pub struct CameraView {
    view_from_calib: Matrix3<f32>,
    intrinsic: Matrix3<f32>,
    transform: ScreenTransform,
    clip: ClipRect,
}

impl CameraView {
    pub fn new(
        view_from_calib: Matrix3<f32>,
        intrinsic: Matrix3<f32>,
        transform: ScreenTransform,
        clip: ClipRect,
    ) -> Self {
        Self {
            view_from_calib,
            intrinsic,
            transform,
            clip,
        }
    }

    /// Camera view whose screen transform centres the calibrated vanishing
    /// point, clamped so the video never uncovers the frame.
    pub fn centered(
        view_from_calib: Matrix3<f32>,
        intrinsic: Matrix3<f32>,
        zoom: f32,
        frame: FrameSize,
    ) -> Self {
        let cx = intrinsic[(0, 2)];
        let cy = intrinsic[(1, 2)];

        let mut offset = (0.0, 0.0);
        if let Some((u, v)) = image_point(
            &view_from_calib,
            &intrinsic,
            Vector3::new(VANISHING_POINT_DISTANCE, 0.0, 0.0),
        ) {
            let max_x = (cx * zoom - frame.width / 2.0 - 5.0).max(0.0);
            let max_y = (cy * zoom - frame.height / 2.0 - 5.0).max(0.0);
            offset = (
                ((u - cx) * zoom).clamp(-max_x, max_x),
                ((v - cy) * zoom).clamp(-max_y, max_y),
            );
        }

        Self::new(
            view_from_calib,
            intrinsic,
            ScreenTransform::centered(frame, zoom, (cx, cy), offset),
            ClipRect::with_margin(frame, CLIP_MARGIN),
        )
    }
}

fn image_point(
    view_from_calib: &Matrix3<f32>,
    intrinsic: &Matrix3<f32>,
    pt: Vector3<f32>,
) -> Option<(f32, f32)> {
    let kep = intrinsic * (view_from_calib * pt);
    if !(kep.z > MIN_DEPTH) {
        return None;
    }
    let u = kep.x / kep.z;
    let v = kep.y / kep.z;
    (u.is_finite() && v.is_finite()).then_some((u, v))
}

impl Project for CameraView {
    fn project(&self, point: Point3) -> Option<Point2> {
        let (u, v) = image_point(
            &self.view_from_calib,
            &self.intrinsic,
            Vector3::new(point.x, point.y, point.z),
        )?;
        let screen = self.transform.map(u, v);
        self.clip.contains(screen).then_some(screen)
    }
}

/// Narrow and wide camera projections built from one calibration snapshot.
#[derive(Debug, Clone)]
pub struct Projector {
    narrow: CameraView,
    wide: CameraView,
}

impl Projector {
    pub fn new(calibration: &CalibrationModel, frame: FrameSize) -> Self {
        Self {
            narrow: CameraView::centered(
                *calibration.view_from(false),
                fcam_intrinsics(),
                NARROW_ZOOM,
                frame,
            ),
            wide: CameraView::centered(
                *calibration.view_from(true),
                ecam_intrinsics(),
                WIDE_ZOOM,
                frame,
            ),
        }
    }

    pub fn view(&self, use_wide_camera: bool) -> &CameraView {
        if use_wide_camera {
            &self.wide
        } else {
            &self.narrow
        }
    }

    pub fn project(&self, point: Point3, use_wide_camera: bool) -> Option<Point2> {
        self.view(use_wide_camera).project(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> FrameSize {
        FrameSize::new(2160.0, 1080.0)
    }

    fn projector() -> Projector {
        Projector::new(&CalibrationModel::new(), frame())
    }

    #[test]
    fn test_straight_ahead_lands_on_center_column() {
        let p = projector()
            .project(Point3::new(20.0, 0.0, 0.0), false)
            .expect("visible");
        assert!((p.x - 1080.0).abs() < 1e-3, "x = {}", p.x);
        assert!((p.y - 540.0).abs() < 1e-3, "y = {}", p.y);
    }

    #[test]
    fn test_road_below_horizon() {
        let p = projector()
            .project(Point3::new(10.0, 0.0, 1.22), false)
            .expect("visible");
        // 540 + 1.1 * 2648 * 1.22 / 10
        assert!((p.y - 895.366).abs() < 0.01, "y = {}", p.y);
    }

    #[test]
    fn test_rejects_non_positive_depth() {
        let projector = projector();
        assert!(projector.project(Point3::new(0.0, 0.0, 0.0), false).is_none());
        assert!(projector.project(Point3::new(-5.0, 0.0, 0.0), false).is_none());
        assert!(projector.project(Point3::new(-5.0, 0.0, 0.0), true).is_none());
    }

    #[test]
    fn test_margin_clipping() {
        let projector = projector();
        // 1.1 * 2648 * y / 10 px sideways: y = 4.5 is inside the margin, y = 6 is not
        assert!(projector.project(Point3::new(10.0, 4.5, 0.0), false).is_some());
        assert!(projector.project(Point3::new(10.0, 6.0, 0.0), false).is_none());
    }

    #[test]
    fn test_projection_is_deterministic() {
        let projector = projector();
        let pt = Point3::new(35.0, -1.5, 1.3);
        assert_eq!(projector.project(pt, true), projector.project(pt, true));
        assert_eq!(projector.project(pt, false), projector.project(pt, false));
    }

    #[test]
    fn test_wide_camera_is_less_magnified() {
        let projector = projector();
        let pt = Point3::new(10.0, 1.0, 0.0);
        let narrow = projector.project(pt, false).unwrap();
        let wide = projector.project(pt, true).unwrap();
        assert!((narrow.x - 1080.0).abs() > (wide.x - 1080.0).abs());
    }
}
