//! Texture formats, render-target descriptions and completeness validation.

use std::fmt;

/// Pixel formats used by the pipeline's textures and attachments.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Format {
    /// 4 × f16. Positions, normals, HDR colour, emissive.
    Rgba16Float,
    /// 4 × u8 normalized. Albedo + specular, decoded images.
    Rgba8Unorm,
    /// 1 × f16. Ambient occlusion.
    R16Float,
    /// Depth buffer.
    Depth32Float,
}

impl Format {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            Format::Rgba16Float => 8,
            Format::Rgba8Unorm => 4,
            Format::R16Float => 2,
            Format::Depth32Float => 4,
        }
    }

    pub fn is_depth(self) -> bool {
        matches!(self, Format::Depth32Float)
    }

    pub fn channels(self) -> u32 {
        match self {
            Format::Rgba16Float | Format::Rgba8Unorm => 4,
            Format::R16Float | Format::Depth32Float => 1,
        }
    }
}

/// Sampling filter. Render targets never generate mipmaps.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
}

/// Addressing mode outside `[0, 1]`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Wrap {
    ClampToEdge,
    Repeat,
}

/// Standalone sampled texture.
#[derive(Debug, Clone)]
pub struct TextureDesc {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub filter: Filter,
    pub wrap: Wrap,
}

/// One colour attachment of a render target.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ColorAttachment {
    pub format: Format,
    pub filter: Filter,
}

impl ColorAttachment {
    pub const fn new(format: Format, filter: Filter) -> Self {
        Self { format, filter }
    }
}

/// Off-screen render target: N colour attachments written together plus an
/// optional depth attachment, all sized `width × height`.
#[derive(Debug, Clone)]
pub struct TargetDesc {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub color: Vec<ColorAttachment>,
    pub depth: bool,
}

/// Maximum simultaneous colour attachments.
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

/// Why a target failed validation.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IncompleteReason {
    ZeroExtent,
    ExceedsDeviceLimit { limit: u32 },
    NoAttachments,
    TooManyColorAttachments(usize),
    DepthFormatAsColor(usize),
}

impl fmt::Display for IncompleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncompleteReason::ZeroExtent => write!(f, "width or height is zero"),
            IncompleteReason::ExceedsDeviceLimit { limit } => {
                write!(f, "extent exceeds device limit of {limit}")
            }
            IncompleteReason::NoAttachments => write!(f, "no colour or depth attachment"),
            IncompleteReason::TooManyColorAttachments(n) => {
                write!(f, "{n} colour attachments (max {MAX_COLOR_ATTACHMENTS})")
            }
            IncompleteReason::DepthFormatAsColor(i) => {
                write!(f, "colour attachment {i} uses a depth format")
            }
        }
    }
}

/// Completeness of a render target. Incomplete targets keep their handle but
/// allocate no attachments; draws against them are dropped.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TargetStatus {
    Complete,
    Incomplete(IncompleteReason),
}

impl TargetStatus {
    pub fn is_complete(self) -> bool {
        matches!(self, TargetStatus::Complete)
    }
}

impl TargetDesc {
    /// Checks every completeness rule against `max_dimension`.
    pub fn validate(&self, max_dimension: u32) -> TargetStatus {
        use IncompleteReason::*;

        let reason = if self.width == 0 || self.height == 0 {
            Some(ZeroExtent)
        } else if self.width > max_dimension || self.height > max_dimension {
            Some(ExceedsDeviceLimit {
                limit: max_dimension,
            })
        } else if self.color.is_empty() && !self.depth {
            Some(NoAttachments)
        } else if self.color.len() > MAX_COLOR_ATTACHMENTS {
            Some(TooManyColorAttachments(self.color.len()))
        } else {
            self.color
                .iter()
                .position(|a| a.format.is_depth())
                .map(DepthFormatAsColor)
        };

        match reason {
            None => TargetStatus::Complete,
            Some(r) => TargetStatus::Incomplete(r),
        }
    }
}

/// Destination of draws: the window surface or an off-screen target.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Framebuffer {
    Screen,
    Offscreen(super::TargetId),
}

/// Clear request for the bound framebuffer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Clear {
    pub color: Option<[f32; 4]>,
    pub depth: bool,
}

impl Clear {
    pub const fn color_and_depth(color: [f32; 4]) -> Self {
        Self {
            color: Some(color),
            depth: true,
        }
    }

    pub const fn color(color: [f32; 4]) -> Self {
        Self {
            color: Some(color),
            depth: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(w: u32, h: u32, color: Vec<ColorAttachment>, depth: bool) -> TargetDesc {
        TargetDesc {
            label: "test".into(),
            width: w,
            height: h,
            color,
            depth,
        }
    }

    const HDR: ColorAttachment = ColorAttachment::new(Format::Rgba16Float, Filter::Linear);

    // ── validate ──────────────────────────────────────────────────────────

    #[test]
    fn valid_target_is_complete() {
        assert_eq!(desc(256, 256, vec![HDR], true).validate(8192), TargetStatus::Complete);
    }

    #[test]
    fn zero_width_is_incomplete() {
        let s = desc(0, 256, vec![HDR], true).validate(8192);
        assert_eq!(s, TargetStatus::Incomplete(IncompleteReason::ZeroExtent));
    }

    #[test]
    fn zero_height_is_incomplete() {
        let s = desc(256, 0, vec![HDR], false).validate(8192);
        assert!(!s.is_complete());
    }

    #[test]
    fn oversized_is_incomplete() {
        let s = desc(9000, 16, vec![HDR], false).validate(8192);
        assert_eq!(
            s,
            TargetStatus::Incomplete(IncompleteReason::ExceedsDeviceLimit { limit: 8192 })
        );
    }

    #[test]
    fn empty_attachment_set_is_incomplete() {
        let s = desc(16, 16, vec![], false).validate(8192);
        assert_eq!(s, TargetStatus::Incomplete(IncompleteReason::NoAttachments));
    }

    #[test]
    fn depth_only_target_is_complete() {
        assert!(desc(16, 16, vec![], true).validate(8192).is_complete());
    }

    #[test]
    fn too_many_colour_attachments() {
        let s = desc(16, 16, vec![HDR; 9], false).validate(8192);
        assert_eq!(
            s,
            TargetStatus::Incomplete(IncompleteReason::TooManyColorAttachments(9))
        );
    }

    #[test]
    fn depth_format_rejected_as_colour() {
        let bad = ColorAttachment::new(Format::Depth32Float, Filter::Nearest);
        let s = desc(16, 16, vec![HDR, bad], false).validate(8192);
        assert_eq!(
            s,
            TargetStatus::Incomplete(IncompleteReason::DepthFormatAsColor(1))
        );
    }
}
