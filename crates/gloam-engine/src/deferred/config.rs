/// Tunables for [`DeferredRenderer`](super::DeferredRenderer).
///
/// Fixed at construction. Resizing keeps the configuration.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Separable blur passes applied to the bright-pass image.
    pub bloom_iterations: u32,

    /// Exposure used by the tone-mapping pass.
    pub exposure: f32,

    /// Hemisphere radius in view-space units.
    pub ssao_radius: f32,

    /// Depth bias that suppresses self-occlusion on flat surfaces.
    pub ssao_bias: f32,

    /// Seed for the SSAO kernel and noise tile.
    pub ssao_seed: u64,

    /// Allocate the emissive G-Buffer attachment.
    pub emissive: bool,

    /// Near and far clip planes.
    pub near: f32,
    pub far: f32,

    /// Multiplier applied to a light's colour when drawing its marker cube.
    pub marker_intensity: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            bloom_iterations: 10,
            exposure: 1.0,
            ssao_radius: 0.5,
            ssao_bias: 0.025,
            ssao_seed: 0x5eed,
            emissive: true,
            near: 0.1,
            far: 100.0,
            marker_intensity: 4.0,
        }
    }
}
