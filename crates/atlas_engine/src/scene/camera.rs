//! Free-flying camera
//!
//! WASD movement on the ground-relative axes, mouse look with pitch clamped
//! short of the poles.

use crate::foundation::math::{Mat4, Point3, Vec3};
use crate::input::Input;

const PITCH_LIMIT_DEG: f32 = 89.0;

/// Free-flying camera driven by keyboard and mouse
pub struct FlyCamera {
    position: Point3,
    /// Rotation around the world Y axis, degrees
    yaw: f32,
    /// Rotation above/below the horizon, degrees
    pitch: f32,
    speed: f32,
    sensitivity: f32,
}

impl FlyCamera {
    /// Camera at `position` looking down -Z
    pub fn new(position: Point3, speed: f32, sensitivity: f32) -> Self {
        Self {
            position,
            yaw: -90.0,
            pitch: 0.0,
            speed,
            sensitivity,
        }
    }

    /// Current position
    pub fn position(&self) -> Point3 {
        self.position
    }

    /// Unit vector the camera is looking along
    pub fn forward(&self) -> Vec3 {
        let yaw = self.yaw.to_radians();
        let pitch = self.pitch.to_radians();
        Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize()
    }

    /// Apply one frame of input: WASD to move, mouse to look
    pub fn update(&mut self, input: &Input, dt: f32) {
        let (dx, dy) = input.mouse_delta();
        self.yaw += dx as f32 * self.sensitivity;
        self.pitch = (self.pitch - dy as f32 * self.sensitivity)
            .clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG);

        let forward = self.forward();
        let right = forward.cross(&Vec3::y()).normalize();

        let mut movement = Vec3::zeros();
        if input.is_key_held(glfw::Key::W) {
            movement += forward;
        }
        if input.is_key_held(glfw::Key::S) {
            movement -= forward;
        }
        if input.is_key_held(glfw::Key::D) {
            movement += right;
        }
        if input.is_key_held(glfw::Key::A) {
            movement -= right;
        }

        if movement != Vec3::zeros() {
            self.position += movement.normalize() * self.speed * dt;
        }
    }

    /// View matrix (world → camera)
    pub fn view(&self) -> Mat4 {
        let target = self.position + self.forward();
        Mat4::look_at_rh(&self.position, &target, &Vec3::y())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glfw::{Action, Key, Modifiers, Scancode, WindowEvent};

    fn camera() -> FlyCamera {
        FlyCamera::new(Point3::new(0.0, 0.0, 5.0), 10.0, 0.1)
    }

    fn hold(input: &mut Input, key: Key) {
        input.handle_event(&WindowEvent::Key(key, 0 as Scancode, Action::Press, Modifiers::empty()));
    }

    #[test]
    fn default_orientation_looks_down_negative_z() {
        let cam = camera();
        let forward = cam.forward();
        assert_relative_eq!(forward.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(forward.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(forward.z, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn holding_w_moves_along_forward() {
        let mut cam = camera();
        let mut input = Input::new();
        hold(&mut input, Key::W);

        cam.update(&input, 0.5);
        let position = cam.position();
        assert_relative_eq!(position.z, 0.0, epsilon = 1e-5);
        assert_relative_eq!(position.x, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn pitch_is_clamped_short_of_the_poles() {
        let mut cam = camera();
        let mut input = Input::new();
        // A huge upward mouse sweep
        input.handle_event(&WindowEvent::CursorPos(0.0, 0.0));
        input.handle_event(&WindowEvent::CursorPos(0.0, -10_000.0));

        cam.update(&input, 0.016);
        assert!(cam.pitch <= PITCH_LIMIT_DEG);

        // Looking straight up would degenerate the view basis; forward must
        // keep a horizontal component
        let forward = cam.forward();
        assert!(forward.xz().norm() > 1e-3);
    }

    #[test]
    fn opposing_keys_cancel_out() {
        let mut cam = camera();
        let start = cam.position();
        let mut input = Input::new();
        hold(&mut input, Key::W);
        hold(&mut input, Key::S);

        cam.update(&input, 1.0);
        assert_relative_eq!((cam.position() - start).norm(), 0.0, epsilon = 1e-5);
    }
}
