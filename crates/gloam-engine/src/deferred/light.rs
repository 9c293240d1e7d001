use glam::Vec3;

/// Lights the lighting program can evaluate per frame.
pub const MAX_LIGHTS: usize = 64;

/// Point light with distance attenuation `1 / (1 + linear·d + quadratic·d²)`.
///
/// Colours may exceed 1.0; over-bright lights feed the bloom pass.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub linear: f32,
    pub quadratic: f32,
}

impl PointLight {
    /// Light with the default short-range falloff.
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self {
            position,
            color,
            linear: 0.35,
            quadratic: 0.44,
        }
    }

    pub fn with_attenuation(mut self, linear: f32, quadratic: f32) -> Self {
        self.linear = linear;
        self.quadratic = quadratic;
        self
    }

    pub fn attenuation(&self, distance: f32) -> f32 {
        1.0 / (1.0 + self.linear * distance + self.quadratic * distance * distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attenuation_is_one_at_source_and_falls_off() {
        let l = PointLight::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(l.attenuation(0.0), 1.0);
        assert!(l.attenuation(1.0) < 1.0);
        assert!(l.attenuation(10.0) < l.attenuation(1.0));
    }
}
