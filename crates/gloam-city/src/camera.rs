//! Fly camera: WASD to move, Q/E down/up, right-drag to look, wheel to zoom.

use glam::{Mat4, Vec3};
use gloam_engine::deferred::ViewState;
use gloam_engine::input::{InputFrame, InputState, Key, MouseButton};

pub const PITCH_LIMIT: f32 = 89.0;
pub const ZOOM_RANGE: (f32, f32) = (1.0, 45.0);

#[derive(Debug, Clone)]
pub struct FlyCamera {
    pub position: Vec3,
    /// Degrees; -90 looks down -Z.
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub zoom: f32,
    /// World units per second.
    pub speed: f32,
    /// Degrees per logical pixel of pointer motion.
    pub sensitivity: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 5.0, 15.0),
            yaw: -90.0,
            pitch: 0.0,
            zoom: 45.0,
            speed: 10.0,
            sensitivity: 0.1,
        }
    }
}

impl FlyCamera {
    pub fn front(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.front().cross(Vec3::Y).normalize()
    }

    pub fn view_matrix(&self) -> Mat4 {
        let front = self.front();
        let up = self.right().cross(front).normalize();
        Mat4::look_at_rh(self.position, self.position + front, up)
    }

    pub fn view_state(&self) -> ViewState {
        ViewState::new(self.position, self.view_matrix(), self.zoom)
    }

    /// `dx`, `dy` in logical pixels, screen convention (`+dy` is down).
    pub fn look(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch - dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Positive `lines` (wheel away from the user) narrows the field of view.
    pub fn scroll(&mut self, lines: f32) {
        self.zoom = (self.zoom - lines).clamp(ZOOM_RANGE.0, ZOOM_RANGE.1);
    }

    pub fn update(&mut self, input: &InputState, frame: &InputFrame, dt: f32) {
        let step = self.speed * dt;
        let (front, right) = (self.front(), self.right());

        let mut motion = Vec3::ZERO;
        if input.key_down(Key::W) {
            motion += front;
        }
        if input.key_down(Key::S) {
            motion -= front;
        }
        if input.key_down(Key::D) {
            motion += right;
        }
        if input.key_down(Key::A) {
            motion -= right;
        }
        if input.key_down(Key::E) {
            motion += Vec3::Y;
        }
        if input.key_down(Key::Q) {
            motion -= Vec3::Y;
        }
        self.position += motion * step;

        if input.button_down(MouseButton::Right) {
            self.look(frame.pointer_delta.0, frame.pointer_delta.1);
        }
        if frame.wheel_lines != 0.0 {
            self.scroll(frame.wheel_lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_looks_down_negative_z() {
        let cam = FlyCamera::default();
        assert!((cam.front() - Vec3::NEG_Z).length() < 1e-5);
        assert!((cam.right() - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = FlyCamera::default();
        cam.look(0.0, -10_000.0);
        assert_eq!(cam.pitch, PITCH_LIMIT);
        cam.look(0.0, 10_000.0);
        assert_eq!(cam.pitch, -PITCH_LIMIT);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut cam = FlyCamera::default();
        cam.scroll(100.0);
        assert_eq!(cam.zoom, 1.0);
        cam.scroll(-100.0);
        assert_eq!(cam.zoom, 45.0);
    }

    #[test]
    fn view_matrix_puts_eye_at_origin() {
        let cam = FlyCamera::default();
        let eye = cam.view_matrix().transform_point3(cam.position);
        assert!(eye.length() < 1e-4);
    }
}
