//! Camera framing
//!
//! The model is recentred on the origin and the camera placed on the
//! diagonal `(d, d * height_ratio, d)`, `d` being the length of the model's
//! bounding-box diagonal, looking back at the origin.

use super::AABB;
use crate::config::CameraConfig;
use crate::foundation::math::Vec3;
use crate::render::CameraPose;

/// Where the model and the camera go
#[derive(Debug, Clone, PartialEq)]
pub struct Framing {
    /// Translation that moves the model's center to the origin
    pub offset: Vec3,
    /// Camera placement
    pub camera: CameraPose,
}

/// Frame a model with `bounds`
pub fn frame_scene(bounds: &AABB, config: &CameraConfig) -> Framing {
    let size = bounds.diagonal();
    Framing {
        offset: -bounds.center(),
        camera: CameraPose {
            position: Vec3::new(size, size * config.height_ratio, size),
            target: Vec3::zeros(),
            fov_degrees: config.fov_degrees,
            near: config.near,
            far: config.far,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frame_recentres_and_places_camera() {
        let bounds = AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(4.0, 2.0, 4.0));
        let framing = frame_scene(&bounds, &CameraConfig::default());

        assert_eq!(framing.offset, Vec3::new(-2.0, -1.0, -2.0));
        assert_eq!(framing.camera.target, Vec3::zeros());
        // diagonal = sqrt(16 + 4 + 16) = 6
        assert_relative_eq!(framing.camera.position.x, 6.0, epsilon = 1e-5);
        assert_relative_eq!(framing.camera.position.y, 3.6, epsilon = 1e-5);
        assert_relative_eq!(framing.camera.position.z, 6.0, epsilon = 1e-5);
        assert_eq!(framing.camera.fov_degrees, 60.0);
    }

    #[test]
    fn test_degenerate_bounds() {
        let point = Vec3::new(3.0, 1.0, -2.0);
        let framing = frame_scene(&AABB::new(point, point), &CameraConfig::default());

        assert_eq!(framing.offset, -point);
        assert_eq!(framing.camera.position, Vec3::zeros());
    }
}
