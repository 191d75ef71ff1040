// src/model.rs
//
// Model/plan → scene geometry. Every polygon is rebuilt from scratch on each
// model update; nothing is carried over between frames.

use crate::messages::{ModelV2, RadarState, UiPlan, XyztData};
use crate::projection::{build_line_polygon, find_path_length_idx, project_lead, Project};
use crate::scene::Scene;
use crate::types::{CAMERA_HEIGHT, MAX_DRAW_DISTANCE, MIN_DRAW_DISTANCE, TRAJECTORY_SIZE};
use tracing::trace;

/// Half-width of lane lines and road edges without the custom road UI.
const DEFAULT_LINE_WIDTH: f32 = 0.025;
/// Half-width of the driving path without the custom road UI.
const DEFAULT_PATH_WIDTH: f32 = 0.9;

/// Lane-line trajectories reused as centerlines of the adjacent lanes.
const ADJACENT_LEFT_LINE: usize = 4;
const ADJACENT_RIGHT_LINE: usize = 5;

/// Prefer the plan trajectory; fall back to the model's own when the plan
/// is shorter than a full trajectory.
pub fn select_trajectory<'a>(model: &'a ModelV2, plan: Option<&'a UiPlan>) -> &'a XyztData {
    match plan {
        Some(plan) if plan.position.len() >= TRAJECTORY_SIZE => &plan.position,
        _ => &model.position,
    }
}

/// Far end of the drawn path, clamped unless unlimited length is enabled.
pub fn draw_distance(line: &XyztData, unlimited: bool) -> f32 {
    let last_x = line.last_x().unwrap_or(0.0);
    if unlimited {
        last_x
    } else {
        last_x.clamp(MIN_DRAW_DISTANCE, MAX_DRAW_DISTANCE)
    }
}

/// Shorten the path in front of a close lead so it does not run past it.
pub fn shrink_for_lead(max_distance: f32, d_rel: f32) -> f32 {
    let lead_d = d_rel * 2.0;
    (lead_d - (lead_d * 0.35).min(10.0)).clamp(0.0, max_distance.max(0.0))
}

pub fn update_model<P: Project + ?Sized>(
    scene: &mut Scene,
    projector: &P,
    model: &ModelV2,
    plan: Option<&UiPlan>,
    radar: Option<&RadarState>,
) {
    let toggles = &scene.toggles;
    let custom_road_ui = toggles.custom_road_ui;
    let path = select_trajectory(model, plan);
    let mut max_distance = draw_distance(path, toggles.unlimited_road_ui_length);

    let empty = XyztData::default();
    let lane_line = |i: usize| model.lane_lines.get(i).unwrap_or(&empty);

    // lane lines
    let mut max_idx = find_path_length_idx(lane_line(0), max_distance);
    for i in 0..scene.lane_line_vertices.len() {
        let prob = model.lane_line_probs.get(i).copied().unwrap_or(0.0);
        let width = if custom_road_ui {
            scene.toggles.lane_line_width * prob
        } else {
            DEFAULT_LINE_WIDTH * prob
        };
        scene.lane_line_probs[i] = prob;
        scene.lane_line_vertices[i] =
            build_line_polygon(projector, lane_line(i), width, 0.0, max_idx, true);
    }

    // road edges
    let edge_width = if custom_road_ui {
        scene.toggles.road_edge_width
    } else {
        DEFAULT_LINE_WIDTH
    };
    for i in 0..scene.road_edge_vertices.len() {
        scene.road_edge_stds[i] = model.road_edge_stds.get(i).copied().unwrap_or(0.0);
        let edge = model.road_edges.get(i).unwrap_or(&empty);
        scene.road_edge_vertices[i] =
            build_line_polygon(projector, edge, edge_width, 0.0, max_idx, true);
    }

    // path, shortened in front of the lead
    if let Some(lead) = radar.map(|r| &r.lead_one).filter(|l| l.status) {
        max_distance = shrink_for_lead(max_distance, lead.d_rel);
    }
    max_idx = find_path_length_idx(path, max_distance);

    let toggles = &scene.toggles;
    let (path_width, path_edge_width) = if custom_road_ui {
        (
            toggles.path_width * (1.0 - toggles.path_edge_width / 100.0),
            toggles.path_width,
        )
    } else {
        (DEFAULT_PATH_WIDTH, 0.0)
    };
    let adjacent = toggles.blind_spot_path || toggles.developer_ui;
    let (adjacent_left, adjacent_right) = if adjacent {
        (scene.lane_width_left / 2.0, scene.lane_width_right / 2.0)
    } else {
        (0.0, 0.0)
    };

    scene.track_vertices =
        build_line_polygon(projector, path, path_width, CAMERA_HEIGHT, max_idx, false);
    scene.track_edge_vertices =
        build_line_polygon(projector, path, path_edge_width, CAMERA_HEIGHT, max_idx, false);

    scene.track_left_adjacent_lane_vertices = build_line_polygon(
        projector,
        lane_line(ADJACENT_LEFT_LINE),
        adjacent_left,
        0.0,
        max_idx,
        true,
    );
    scene.track_right_adjacent_lane_vertices = build_line_polygon(
        projector,
        lane_line(ADJACENT_RIGHT_LINE),
        adjacent_right,
        0.0,
        max_idx,
        true,
    );

    // leads
    scene.lead_vertices = match radar {
        Some(radar) => [
            project_lead(projector, &radar.lead_one, path),
            project_lead(projector, &radar.lead_two, path),
        ],
        None => [None, None],
    };

    trace!(
        "Model geometry: draw distance {:.1} m, path idx {}, track {} pts",
        max_distance,
        max_idx,
        scene.track_vertices.len()
    );
}
