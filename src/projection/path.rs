// src/projection/path.rs
//
// Trajectory → screen polygon construction and lead-vehicle placement.

use super::camera::Project;
use crate::messages::{LeadData, XyztData};
use crate::types::{Point2, Point3, Polygon, CAMERA_HEIGHT, TRAJECTORY_SIZE};
use std::collections::VecDeque;

/// Last index whose x stays within `path_length`, scanning from index 1.
/// Relies on x being non-decreasing; returns 0 if x[1] is already past it.
pub fn find_path_length_idx(line: &XyztData, path_length: f32) -> usize {
    let mut max_idx = 0;
    for i in 1..line.len().min(TRAJECTORY_SIZE) {
        if line.x[i] > path_length {
            break;
        }
        max_idx = i;
    }
    max_idx
}

/// Build a closed polygon around `line`, `y_off` to each side and raised by
/// `z_off`: left edge front-to-back followed by the right edge back-to-front.
///
/// With `allow_invert` false a pair whose left point sits lower on screen
/// than the last accepted one is dropped. Wide shapes otherwise fold over
/// themselves past a hill crest.
pub fn build_line_polygon<P: Project + ?Sized>(
    projector: &P,
    line: &XyztData,
    y_off: f32,
    z_off: f32,
    max_idx: usize,
    allow_invert: bool,
) -> Polygon {
    let len = line.len();
    if len == 0 {
        return Polygon::new();
    }
    let last = max_idx.min(len - 1);

    let mut left_points: Vec<Point2> = Vec::with_capacity(last + 1);
    let mut right_points: VecDeque<Point2> = VecDeque::with_capacity(last + 1);

    for i in 0..=last {
        let (x, y, z) = (line.x[i], line.y[i], line.z[i]);
        // points behind the camera plane draw above the frame and flicker
        if x < 0.0 {
            continue;
        }
        let left = projector.project(Point3::new(x, y - y_off, z + z_off));
        let right = projector.project(Point3::new(x, y + y_off, z + z_off));
        let (Some(left), Some(right)) = (left, right) else {
            continue;
        };
        if !allow_invert {
            if let Some(prev) = left_points.last() {
                if left.y > prev.y {
                    continue;
                }
            }
        }
        left_points.push(left);
        right_points.push_front(right);
    }

    left_points.extend(right_points);
    left_points
}

/// Screen position of a lead vehicle, placed at the path elevation found at
/// its distance plus the camera height.
pub fn project_lead<P: Project + ?Sized>(
    projector: &P,
    lead: &LeadData,
    line: &XyztData,
) -> Option<Point2> {
    if !lead.status {
        return None;
    }
    let idx = find_path_length_idx(line, lead.d_rel);
    let z = *line.z.get(idx)?;
    projector.project(Point3::new(lead.d_rel, -lead.y_rel, z + CAMERA_HEIGHT))
}
