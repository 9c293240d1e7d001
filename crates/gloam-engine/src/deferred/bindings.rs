//! The one texture-unit table every pass binds through.
//!
//! Each sampled input of each program is a [`Slot`]. Its unit is defined here
//! and nowhere else; a pass's program declares its slots in unit order so the
//! shader's binding order follows the table.

use crate::gfx::TextureUnit;

/// A named texture input of one of the pipeline's programs.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Slot {
    /// Optional albedo texture of a geometry-pass material.
    MaterialAlbedo,

    /// SSAO inputs.
    SsaoPosition,
    SsaoNormal,
    SsaoNoise,

    /// Raw occlusion read by the SSAO box blur.
    SsaoRaw,

    /// Lighting inputs.
    Position,
    Normal,
    AlbedoSpec,
    Occlusion,
    Emissive,

    /// Source image of one bloom blur iteration.
    BloomSource,

    /// Final composite inputs.
    Scene,
    Bloom,
}

impl Slot {
    pub const fn unit(self) -> TextureUnit {
        TextureUnit(match self {
            Slot::MaterialAlbedo => 0,

            Slot::SsaoPosition => 0,
            Slot::SsaoNormal => 1,
            Slot::SsaoNoise => 2,

            Slot::SsaoRaw => 0,

            Slot::Position => 0,
            Slot::Normal => 1,
            Slot::AlbedoSpec => 2,
            Slot::Occlusion => 3,
            Slot::Emissive => 4,

            Slot::BloomSource => 0,

            Slot::Scene => 0,
            Slot::Bloom => 1,
        })
    }
}

/// Every program the pipeline runs.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Pass {
    Geometry,
    Ssao,
    SsaoBlur,
    Lighting,
    Forward,
    Bloom,
    Final,
}

impl Pass {
    pub const ALL: [Pass; 7] = [
        Pass::Geometry,
        Pass::Ssao,
        Pass::SsaoBlur,
        Pass::Lighting,
        Pass::Forward,
        Pass::Bloom,
        Pass::Final,
    ];

    /// Slots sampled by the pass, in shader binding order.
    pub const fn slots(self) -> &'static [Slot] {
        match self {
            Pass::Geometry => &[Slot::MaterialAlbedo],
            Pass::Ssao => &[Slot::SsaoPosition, Slot::SsaoNormal, Slot::SsaoNoise],
            Pass::SsaoBlur => &[Slot::SsaoRaw],
            Pass::Lighting => &[
                Slot::Position,
                Slot::Normal,
                Slot::AlbedoSpec,
                Slot::Occlusion,
                Slot::Emissive,
            ],
            Pass::Forward => &[],
            Pass::Bloom => &[Slot::BloomSource],
            Pass::Final => &[Slot::Scene, Slot::Bloom],
        }
    }

    /// Units to declare in the pass's `ProgramDesc`.
    pub fn units(self) -> Vec<TextureUnit> {
        self.slots().iter().map(|s| s.unit()).collect()
    }
}
