//! Viewing cameras.
//!
//! [`Camera`] is a plain look-at camera producing view and projection
//! matrices. [`OrbitCamera`] circles a target point, either under mouse
//! control (drag to rotate, scroll to zoom) or spinning on its own.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec2, Vec3};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Keeps the orbit away from the poles where look-at flips.
const ELEVATION_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// A perspective camera looking at a point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 60f32.to_radians(),
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, position: impl Into<Vec3>) -> Self {
        self.position = position.into();
        self
    }

    pub fn looking_at(mut self, target: impl Into<Vec3>) -> Self {
        self.target = target.into();
        self
    }

    /// Sets the vertical field of view in degrees.
    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees.to_radians();
        self
    }

    /// Unit vector from the camera toward its target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

/// How the orbit camera moves.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum OrbitMode {
    /// Drag with the left mouse button to rotate, scroll to zoom.
    #[default]
    Interactive,
    /// Spins around the target, ignoring input.
    AutoRotate {
        /// Radians per second, counterclockwise seen from above.
        speed: f32,
    },
}

/// A camera controller circling a target point.
///
/// ```
/// use fuzzy_mesh::{OrbitCamera, OrbitMode};
/// use glam::Vec3;
///
/// let mut orbit = OrbitCamera::new()
///     .target(Vec3::new(0.0, 2.0, 0.0))
///     .distance(12.0)
///     .mode(OrbitMode::AutoRotate { speed: 0.5 });
///
/// orbit.update(0.016);
/// let camera = orbit.camera();
/// assert!((camera.position.distance(camera.target) - 12.0).abs() < 1e-4);
/// ```
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    /// Horizontal angle in radians.
    pub azimuth: f32,
    /// Vertical angle in radians, kept short of straight up or down.
    pub elevation: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub mode: OrbitMode,
    /// Radians per pixel dragged.
    pub sensitivity: f32,
    /// Distance per scroll line.
    pub zoom_sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    dragging: bool,
    cursor: Option<Vec2>,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 10.0,
            azimuth: 0.0,
            elevation: 0.2,
            fov: 60f32.to_radians(),
            mode: OrbitMode::Interactive,
            sensitivity: 0.005,
            zoom_sensitivity: 0.5,
            min_distance: 1.0,
            max_distance: 200.0,
            dragging: false,
            cursor: None,
        }
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, target: impl Into<Vec3>) -> Self {
        self.target = target.into();
        self
    }

    pub fn distance(mut self, distance: f32) -> Self {
        self.distance = distance.clamp(self.min_distance, self.max_distance);
        self
    }

    pub fn mode(mut self, mode: OrbitMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the vertical field of view in degrees.
    pub fn fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees.to_radians();
        self
    }

    pub fn azimuth(mut self, azimuth: f32) -> Self {
        self.azimuth = azimuth;
        self
    }

    pub fn elevation(mut self, elevation: f32) -> Self {
        self.elevation = elevation.clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
        self
    }

    pub fn distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self.distance = self.distance.clamp(min, max);
        self
    }

    /// Feeds a window event. Ignored unless the mode is interactive.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        if self.mode != OrbitMode::Interactive {
            return;
        }

        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = *state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                let cursor = Vec2::new(position.x as f32, position.y as f32);
                if let (true, Some(previous)) = (self.dragging, self.cursor) {
                    self.drag(cursor - previous);
                }
                self.cursor = Some(cursor);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };
                self.zoom(lines);
            }
            _ => {}
        }
    }

    /// Rotates by a cursor movement in pixels.
    pub fn drag(&mut self, delta: Vec2) {
        self.azimuth -= delta.x * self.sensitivity;
        self.elevation = (self.elevation + delta.y * self.sensitivity)
            .clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
    }

    /// Moves closer by `lines` scroll lines (negative moves away).
    pub fn zoom(&mut self, lines: f32) {
        self.distance = (self.distance - lines * self.zoom_sensitivity)
            .clamp(self.min_distance, self.max_distance);
    }

    /// Advances auto-rotation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if let OrbitMode::AutoRotate { speed } = self.mode {
            self.azimuth += speed * dt;
        }
    }

    /// The camera for the current orbit position.
    pub fn camera(&self) -> Camera {
        let (sin_el, cos_el) = self.elevation.sin_cos();
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let offset = Vec3::new(cos_el * sin_az, sin_el, cos_el * cos_az) * self.distance;

        Camera {
            position: self.target + offset,
            target: self.target,
            up: Vec3::Y,
            fov: self.fov,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_puts_target_ahead() {
        let camera = Camera::new().at(Vec3::new(0.0, 3.0, 8.0)).looking_at(Vec3::ZERO);
        let p = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!(p.z < 0.0);
        assert!(p.x.abs() < 1e-5 && p.y.abs() < 1e-5);
    }

    #[test]
    fn projection_keeps_target_centered() {
        let camera = Camera::new().at(Vec3::new(4.0, 0.0, 4.0)).looking_at(Vec3::new(1.0, 0.0, 1.0));
        let clip = camera.view_projection(16.0 / 9.0) * camera.target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn orbit_keeps_distance() {
        let orbit = OrbitCamera::new()
            .target(Vec3::new(1.0, 2.0, 3.0))
            .distance(7.0)
            .azimuth(1.1)
            .elevation(0.4);
        let camera = orbit.camera();
        assert!((camera.position.distance(camera.target) - 7.0).abs() < 1e-4);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut orbit = OrbitCamera::new().distance_limits(2.0, 5.0).distance(4.0);
        orbit.zoom(100.0);
        assert_eq!(orbit.distance, 2.0);
        orbit.zoom(-100.0);
        assert_eq!(orbit.distance, 5.0);
    }

    #[test]
    fn drag_clamps_elevation() {
        let mut orbit = OrbitCamera::new();
        orbit.drag(Vec2::new(10.0, 1.0e6));
        assert!(orbit.elevation <= ELEVATION_LIMIT);
        assert!((orbit.azimuth + 10.0 * orbit.sensitivity).abs() < 1e-6);
    }

    #[test]
    fn auto_rotate_advances_azimuth() {
        let mut orbit = OrbitCamera::new().mode(OrbitMode::AutoRotate { speed: 2.0 });
        orbit.update(0.5);
        assert!((orbit.azimuth - 1.0).abs() < 1e-6);

        let mut still = OrbitCamera::new();
        still.update(0.5);
        assert_eq!(still.azimuth, 0.0);
    }
}
