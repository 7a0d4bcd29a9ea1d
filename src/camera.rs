// ============================================================================
// camera.rs
// Orbit camera with two modes: velocity-follow (azimuth from the controlled
// car's horizontal velocity) and target cam (azimuth/elevation toward a
// tracked entity). Produces the view-projection matrix for the renderer.
// ============================================================================

use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

/// Horizontal speed below which velocity-follow leaves the azimuth alone,
/// so near-zero velocity does not jitter the camera.
pub const VELOCITY_DEADBAND: f32 = 50.0;

/// Target-cam elevation is attenuated by this factor to reduce sensitivity.
pub const TARGET_ELEVATION_SCALE: f32 = 2.0 / 3.0;

const Z_NEAR: f32 = 10.0;
const Z_FAR: f32 = 30_000.0;

/// Camera state updated once per tick and read by the renderer.
#[derive(Clone, Debug)]
pub struct CameraState {
    /// Camera heading in radians; the camera sits behind the center along
    /// this direction.
    pub azimuth: f32,
    /// Camera elevation in radians above the horizontal plane.
    pub elevation: f32,
    pub distance: f32,
    pub fov_deg: f32,
    /// Height of the orbit center above the controlled car.
    pub height: f32,
    /// Point the camera orbits and looks at.
    pub center: Vec3,
    pub target_cam: bool,
    pub target_index: usize,
    base_elevation: f32,
}

impl CameraState {
    pub fn from_config(config: &CameraConfig) -> Self {
        let base_elevation = config.angle.to_radians();
        Self {
            azimuth: 0.0,
            elevation: base_elevation,
            distance: config.distance,
            fov_deg: config.fov,
            height: config.height,
            center: Vec3::ZERO,
            target_cam: false,
            target_index: 0,
            base_elevation,
        }
    }

    /// Velocity-follow mode: align the heading with the horizontal velocity
    /// direction. Below the deadband the previous azimuth is kept.
    pub fn follow_velocity(&mut self, vel: Vec3) {
        let horizontal_speed = (vel.x * vel.x + vel.y * vel.y).sqrt();
        if horizontal_speed > VELOCITY_DEADBAND {
            self.azimuth = vel.y.atan2(vel.x);
        }
        self.elevation = self.base_elevation;
    }

    /// Target-cam mode: point the heading at `target` and tilt by the
    /// attenuated elevation of the camera-to-target vector.
    pub fn track_target(&mut self, target: Vec3) {
        let rel = target - self.eye();
        let norm = rel.length();
        self.azimuth = rel.y.atan2(rel.x);
        let target_elevation = if norm > 0.0 { (rel.z / norm).asin() } else { 0.0 };
        self.elevation = self.base_elevation - target_elevation * TARGET_ELEVATION_SCALE;
    }

    pub fn toggle_target_cam(&mut self) {
        self.target_cam = !self.target_cam;
    }

    /// Advance the tracked-target index, wrapping modulo the candidate count.
    pub fn cycle_target(&mut self, candidates: usize) {
        if candidates > 0 {
            self.target_index = (self.target_index + 1) % candidates;
        }
    }

    /// Camera position on the orbit sphere around the center.
    pub fn eye(&self) -> Vec3 {
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let (sin_el, cos_el) = self.elevation.sin_cos();
        let back = Vec3::new(cos_az * cos_el, sin_az * cos_el, -sin_el);
        self.center - back * self.distance
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye(), self.center, Vec3::Z);
        let proj = Mat4::perspective_rh(self.fov_deg.to_radians(), aspect.max(1e-3), Z_NEAR, Z_FAR);
        proj * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> CameraState {
        CameraState::from_config(&CameraConfig::default())
    }

    #[test]
    fn slow_velocity_leaves_azimuth_unchanged() {
        let mut cam = camera();
        cam.azimuth = 1.25;
        cam.follow_velocity(Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(cam.azimuth, 1.25);
    }

    #[test]
    fn fast_velocity_steers_azimuth() {
        let mut cam = camera();
        cam.follow_velocity(Vec3::new(0.0, 500.0, 0.0));
        assert!((cam.azimuth - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn vertical_velocity_does_not_count_toward_deadband() {
        let mut cam = camera();
        cam.azimuth = 0.5;
        cam.follow_velocity(Vec3::new(0.0, 0.0, 1000.0));
        assert_eq!(cam.azimuth, 0.5);
    }

    #[test]
    fn target_cycle_wraps_modulo_candidates() {
        let mut cam = camera();
        cam.target_index = 2;
        cam.cycle_target(3);
        assert_eq!(cam.target_index, 0);
        cam.cycle_target(3);
        assert_eq!(cam.target_index, 1);
    }

    #[test]
    fn target_cycle_with_no_candidates_is_a_no_op() {
        let mut cam = camera();
        cam.cycle_target(0);
        assert_eq!(cam.target_index, 0);
    }

    #[test]
    fn eye_sits_at_configured_distance_from_center() {
        let mut cam = camera();
        cam.center = Vec3::new(100.0, -250.0, 60.0);
        cam.azimuth = 0.8;
        let eye = cam.eye();
        assert!(((eye - cam.center).length() - cam.distance).abs() < 1e-2);
    }

    #[test]
    fn positive_elevation_places_eye_above_center() {
        let mut cam = camera();
        cam.elevation = 0.4;
        assert!(cam.eye().z > cam.center.z);
    }

    #[test]
    fn target_elevation_is_attenuated() {
        let mut cam = camera();
        cam.center = Vec3::ZERO;
        cam.azimuth = 0.0;
        cam.elevation = 0.0;
        // Target straight above the eye position.
        let eye = cam.eye();
        let target = eye + Vec3::new(100.0, 0.0, 100.0);
        cam.track_target(target);
        let raw_elevation = (1.0f32 / 2.0f32.sqrt()).asin();
        let expected = cam_base_elevation() - raw_elevation * TARGET_ELEVATION_SCALE;
        assert!((cam.elevation - expected).abs() < 1e-4);
    }

    fn cam_base_elevation() -> f32 {
        CameraConfig::default().angle.to_radians()
    }
}
