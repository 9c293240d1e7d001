//! The scene: a grid of spinning blocks over an instanced tile floor.

use glam::{Mat4, Vec3};

#[derive(Debug, Clone)]
pub struct CityConfig {
    /// Blocks per side; the grid spans `-half..half` on X and Z.
    pub blocks: i32,
    pub spacing: f32,
    pub block_color: Vec3,
    /// Degrees per second.
    pub spin_rate: f32,
    pub floor_tiles: i32,
    pub floor_color: Vec3,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            blocks: 6,
            spacing: 2.5,
            block_color: Vec3::new(0.8, 0.4, 0.2),
            spin_rate: 10.0,
            floor_tiles: 12,
            floor_color: Vec3::splat(0.35),
        }
    }
}

const SPIN_AXIS: Vec3 = Vec3::new(1.0, 0.3, 0.5);

impl CityConfig {
    /// Block transforms at `time` seconds.
    pub fn block_transforms(&self, time: f32) -> Vec<Mat4> {
        let half = self.blocks / 2;
        let spin = Mat4::from_axis_angle(SPIN_AXIS.normalize(), (time * self.spin_rate).to_radians());

        let mut out = Vec::with_capacity((self.blocks * self.blocks) as usize);
        for i in -half..self.blocks - half {
            for j in -half..self.blocks - half {
                let at = Vec3::new(i as f32 * self.spacing, 0.0, j as f32 * self.spacing);
                out.push(Mat4::from_translation(at) * spin);
            }
        }
        out
    }

    /// Static floor slabs, one unit-cube each, flattened and sunk below the blocks.
    pub fn floor_transforms(&self) -> Vec<Mat4> {
        let half = self.floor_tiles / 2;
        let mut out = Vec::with_capacity((self.floor_tiles * self.floor_tiles) as usize);
        for i in -half..self.floor_tiles - half {
            for j in -half..self.floor_tiles - half {
                let at = Vec3::new(i as f32 * 2.0 + 1.0, -2.0, j as f32 * 2.0 + 1.0);
                out.push(Mat4::from_scale_rotation_translation(
                    Vec3::new(1.95, 0.1, 1.95),
                    glam::Quat::IDENTITY,
                    at,
                ));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_by_six_grid_spans_minus_three_to_two() {
        let cfg = CityConfig::default();
        let t = cfg.block_transforms(0.0);
        assert_eq!(t.len(), 36);

        let first = t[0].transform_point3(Vec3::ZERO);
        let last = t[35].transform_point3(Vec3::ZERO);
        assert_eq!(first, Vec3::new(-7.5, 0.0, -7.5));
        assert_eq!(last, Vec3::new(5.0, 0.0, 5.0));
    }

    #[test]
    fn spin_keeps_block_centres_fixed() {
        let cfg = CityConfig::default();
        let a = cfg.block_transforms(0.0);
        let b = cfg.block_transforms(7.0);
        for (a, b) in a.iter().zip(&b) {
            let d = a.transform_point3(Vec3::ZERO) - b.transform_point3(Vec3::ZERO);
            assert!(d.length() < 1e-5);
        }
        assert_ne!(a[0], b[0]);
    }

    #[test]
    fn floor_sits_below_blocks() {
        let floor = CityConfig::default().floor_transforms();
        assert_eq!(floor.len(), 144);
        assert!(floor.iter().all(|m| m.transform_point3(Vec3::ZERO).y < -1.0));
    }
}
