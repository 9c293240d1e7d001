//! Orbiting point lights.

use std::f32::consts::TAU;

use glam::Vec3;
use gloam_engine::deferred::PointLight;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const LIGHT_COUNT: usize = 32;

/// Colours fixed at creation; positions recomputed from the clock.
#[derive(Debug, Clone)]
pub struct LightRing {
    lights: Vec<PointLight>,
}

impl LightRing {
    /// `count` lights with pastel colours drawn from `seed`.
    pub fn new(count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut channel = || rng.gen_range(0..100) as f32 / 200.0 + 0.5;
        let lights = (0..count)
            .map(|_| {
                let color = Vec3::new(channel(), channel(), channel());
                PointLight::new(Vec3::ZERO, color)
            })
            .collect();
        Self { lights }
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    /// Places every light on its orbit at `elapsed` seconds.
    pub fn update(&mut self, elapsed: f32) {
        let n = self.lights.len() as f32;
        for (i, light) in self.lights.iter_mut().enumerate() {
            light.position = orbit_position(i, n, elapsed);
        }
    }
}

/// Light `i` of `n` circles the origin on a radius that breathes between 2
/// and 6 while bobbing up and down.
pub fn orbit_position(i: usize, n: f32, elapsed: f32) -> Vec3 {
    let time = elapsed * 0.5;
    let offset = i as f32 * TAU / n;
    let radius = 4.0 + (time + i as f32).sin() * 2.0;
    Vec3::new(
        (time + offset).sin() * radius,
        (time * 2.0 + offset).sin(),
        (time + offset).cos() * radius,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colours_stay_in_pastel_range() {
        let ring = LightRing::new(LIGHT_COUNT, 13);
        assert_eq!(ring.lights().len(), LIGHT_COUNT);
        for l in ring.lights() {
            for c in l.color.to_array() {
                assert!((0.5..1.0).contains(&c), "{c}");
            }
        }
    }

    #[test]
    fn same_seed_same_colours() {
        let a = LightRing::new(8, 13);
        let b = LightRing::new(8, 13);
        assert_eq!(a.lights(), b.lights());
    }

    #[test]
    fn orbits_stay_within_radius_bounds() {
        let mut ring = LightRing::new(LIGHT_COUNT, 1);
        for step in 0..50 {
            ring.update(step as f32 * 0.37);
            for l in ring.lights() {
                let r = Vec3::new(l.position.x, 0.0, l.position.z).length();
                assert!((2.0 - 1e-4..=6.0 + 1e-4).contains(&r));
                assert!(l.position.y.abs() <= 1.0 + 1e-6);
            }
        }
    }

    #[test]
    fn first_light_at_time_zero() {
        let p = orbit_position(0, 32.0, 0.0);
        assert!((p - Vec3::new(0.0, 0.0, 4.0)).length() < 1e-6);
    }
}
