pub mod calibration;
pub mod camera;
pub mod path;

pub use calibration::CalibrationModel;
pub use camera::{CameraView, FrameSize, Project, Projector};
pub use path::{build_line_polygon, find_path_length_idx, project_lead};
