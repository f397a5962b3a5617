//! Pose input seam. The host refreshes controller transforms and projects
//! them onto the interaction plane; the engine only pulls the results.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControllerPose {
    /// World position in metres.
    #[serde(default)]
    pub world: Vec3,
    /// Normalized plane coordinates, origin at the centre, y up, ±1 at the
    /// screen edges.
    pub projected: Vec2,
}

pub trait PoseProvider {
    /// Latest pose for `controller`, `None` while tracking is lost.
    fn controller_pose(&self, controller: usize) -> Option<ControllerPose>;

    /// Physical size of the interaction plane.
    fn screen_size_mm(&self) -> Vec2;
}

/// Normalized plane coordinates to millimetres.
pub fn to_plane_mm(projected: Vec2, screen_size_mm: Vec2) -> Vec2 {
    projected * screen_size_mm * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_conversion() {
        let screen = Vec2::new(120.0, 60.0);
        assert_eq!(to_plane_mm(Vec2::new(1.0, -1.0), screen), Vec2::new(60.0, -30.0));
        assert_eq!(to_plane_mm(Vec2::ZERO, screen), Vec2::ZERO);
    }

    #[test]
    fn test_pose_deserializes_without_world() {
        let pose: ControllerPose = serde_json::from_str(r#"{"projected":[0.5,0.25]}"#).unwrap();
        assert_eq!(pose.projected, Vec2::new(0.5, 0.25));
        assert_eq!(pose.world, Vec3::ZERO);
    }
}
