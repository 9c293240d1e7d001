use glam::{Mat4, Vec3};

/// Camera-equivalent state the pipeline needs each frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewState {
    /// World-space eye position (used for specular lighting).
    pub position: Vec3,
    /// World → view transform.
    pub view: Mat4,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl ViewState {
    pub fn new(position: Vec3, view: Mat4, fov_degrees: f32) -> Self {
        Self {
            position,
            view,
            fov_degrees,
        }
    }

    /// Eye at `position` looking at `target` with +Y up.
    pub fn look_at(position: Vec3, target: Vec3, fov_degrees: f32) -> Self {
        Self::new(
            position,
            Mat4::look_at_rh(position, target, Vec3::Y),
            fov_degrees,
        )
    }

    /// Right-handed perspective projection with wgpu's `[0, 1]` depth range.
    pub fn projection(&self, width: u32, height: u32, near: f32, far: f32) -> Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, near, far)
    }
}
