//! Program and mesh descriptions.

use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};

use super::uniform::UniformLayout;

/// Number of texture units a program may bind.
pub const MAX_TEXTURE_UNITS: usize = 8;

/// Texture unit index (`0..MAX_TEXTURE_UNITS`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TextureUnit(pub u8);

impl TextureUnit {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Vertex stream a program consumes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VertexInput {
    /// Full-screen quad: position + uv, triangle strip.
    Quad,
    /// Lit mesh: position + normal + uv per vertex, plus a per-instance model
    /// matrix in four consecutive `vec4` slots.
    Mesh,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DepthMode {
    /// No depth test or write.
    Off,
    /// Less-than test with depth writes.
    TestWrite,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendMode {
    Replace,
    Additive,
}

/// Everything needed to compile and link one program.
///
/// `source` is WGSL with `vs_main`/`fs_main` entry points. Its uniform struct
/// must be bound at `@group(0) @binding(0)` and match `uniforms`; texture `i` of
/// `textures` is at binding `1 + 2i` with its sampler at `2 + 2i`.
#[derive(Debug, Clone)]
pub struct ProgramDesc {
    pub label: String,
    pub source: Cow<'static, str>,
    pub vertex: VertexInput,
    pub uniforms: UniformLayout,
    pub textures: Vec<TextureUnit>,
    pub depth: DepthMode,
    pub blend: BlendMode,
}

/// Interleaved quad vertex: clip-space position + uv.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub pos: [f32; 3],
    pub uv: [f32; 2],
}

/// Interleaved lit-mesh vertex.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    TriangleList,
    TriangleStrip,
}

/// Vertex data for a static mesh.
#[derive(Debug, Clone)]
pub enum MeshData<'a> {
    Quad(&'a [QuadVertex]),
    Lit(&'a [MeshVertex]),
}

impl MeshData<'_> {
    pub fn vertex_count(&self) -> u32 {
        match self {
            MeshData::Quad(v) => v.len() as u32,
            MeshData::Lit(v) => v.len() as u32,
        }
    }

    pub fn input(&self) -> VertexInput {
        match self {
            MeshData::Quad(_) => VertexInput::Quad,
            MeshData::Lit(_) => VertexInput::Mesh,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            MeshData::Quad(v) => bytemuck::cast_slice(v),
            MeshData::Lit(v) => bytemuck::cast_slice(v),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MeshDesc<'a> {
    pub label: &'a str,
    pub data: MeshData<'a>,
    pub topology: Topology,
}

/// Shader location of the first model-matrix column. A `mat4x4<f32>` exceeds a
/// single attribute, so columns occupy this location and the next three.
pub const INSTANCE_LOCATION: u32 = 3;

/// Byte stride of one instance (one column-major `Mat4`).
pub const INSTANCE_STRIDE: u64 = 64;

/// Instance count for a draw.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Instances {
    /// One instance with an identity instance transform.
    One,
    /// `count` instances read from `buffer` at per-instance rate.
    Batch {
        buffer: super::BufferId,
        count: u32,
    },
}

impl Instances {
    pub fn count(self) -> u32 {
        match self {
            Instances::One => 1,
            Instances::Batch { count, .. } => count,
        }
    }
}
