//! Surface format and alpha-mode selection.

const SRGB_FORMATS: [wgpu::TextureFormat; 2] = [
    wgpu::TextureFormat::Bgra8UnormSrgb,
    wgpu::TextureFormat::Rgba8UnormSrgb,
];

/// First preferred sRGB format the surface offers, else its first format.
pub(crate) fn choose_format(
    offered: &[wgpu::TextureFormat],
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let srgb = SRGB_FORMATS
        .into_iter()
        .find(|f| prefer_srgb && offered.contains(f));
    srgb.or_else(|| offered.first().copied())
}

pub(crate) fn choose_alpha_mode(
    offered: &[wgpu::CompositeAlphaMode],
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| offered.contains(m))
        .or_else(|| offered.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::{CompositeAlphaMode as Alpha, TextureFormat as Tf};

    #[test]
    fn srgb_is_preferred_over_first_format() {
        let offered = [Tf::Bgra8Unorm, Tf::Rgba8UnormSrgb];
        assert_eq!(choose_format(&offered, true), Some(Tf::Rgba8UnormSrgb));
        assert_eq!(choose_format(&offered, false), Some(Tf::Bgra8Unorm));
    }

    #[test]
    fn no_formats_means_no_surface() {
        assert_eq!(choose_format(&[], true), None);
    }

    #[test]
    fn unsupported_alpha_falls_back() {
        let offered = [Alpha::Opaque, Alpha::PreMultiplied];
        assert_eq!(choose_alpha_mode(&offered, Some(Alpha::PostMultiplied)), Alpha::Opaque);
        assert_eq!(
            choose_alpha_mode(&offered, Some(Alpha::PreMultiplied)),
            Alpha::PreMultiplied
        );
        assert_eq!(choose_alpha_mode(&[], None), Alpha::Auto);
    }
}
