//! Unit cube and full-screen quad, built on first use.

use crate::gfx::{
    GpuContext, Mesh, MeshData, MeshDesc, MeshId, MeshVertex, QuadVertex, Topology,
};

const fn v(pos: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> MeshVertex {
    MeshVertex { pos, normal, uv }
}

/// Unit cube centred on the origin, 6 faces × 2 triangles.
pub const CUBE_VERTICES: [MeshVertex; 36] = [
    // back
    v([-0.5, -0.5, -0.5], [0.0, 0.0, -1.0], [0.0, 0.0]),
    v([0.5, 0.5, -0.5], [0.0, 0.0, -1.0], [1.0, 1.0]),
    v([0.5, -0.5, -0.5], [0.0, 0.0, -1.0], [1.0, 0.0]),
    v([0.5, 0.5, -0.5], [0.0, 0.0, -1.0], [1.0, 1.0]),
    v([-0.5, -0.5, -0.5], [0.0, 0.0, -1.0], [0.0, 0.0]),
    v([-0.5, 0.5, -0.5], [0.0, 0.0, -1.0], [0.0, 1.0]),
    // front
    v([-0.5, -0.5, 0.5], [0.0, 0.0, 1.0], [0.0, 0.0]),
    v([0.5, -0.5, 0.5], [0.0, 0.0, 1.0], [1.0, 0.0]),
    v([0.5, 0.5, 0.5], [0.0, 0.0, 1.0], [1.0, 1.0]),
    v([0.5, 0.5, 0.5], [0.0, 0.0, 1.0], [1.0, 1.0]),
    v([-0.5, 0.5, 0.5], [0.0, 0.0, 1.0], [0.0, 1.0]),
    v([-0.5, -0.5, 0.5], [0.0, 0.0, 1.0], [0.0, 0.0]),
    // left
    v([-0.5, 0.5, 0.5], [-1.0, 0.0, 0.0], [1.0, 0.0]),
    v([-0.5, 0.5, -0.5], [-1.0, 0.0, 0.0], [1.0, 1.0]),
    v([-0.5, -0.5, -0.5], [-1.0, 0.0, 0.0], [0.0, 1.0]),
    v([-0.5, -0.5, -0.5], [-1.0, 0.0, 0.0], [0.0, 1.0]),
    v([-0.5, -0.5, 0.5], [-1.0, 0.0, 0.0], [0.0, 0.0]),
    v([-0.5, 0.5, 0.5], [-1.0, 0.0, 0.0], [1.0, 0.0]),
    // right
    v([0.5, 0.5, 0.5], [1.0, 0.0, 0.0], [1.0, 0.0]),
    v([0.5, -0.5, -0.5], [1.0, 0.0, 0.0], [0.0, 1.0]),
    v([0.5, 0.5, -0.5], [1.0, 0.0, 0.0], [1.0, 1.0]),
    v([0.5, -0.5, -0.5], [1.0, 0.0, 0.0], [0.0, 1.0]),
    v([0.5, 0.5, 0.5], [1.0, 0.0, 0.0], [1.0, 0.0]),
    v([0.5, -0.5, 0.5], [1.0, 0.0, 0.0], [0.0, 0.0]),
    // bottom
    v([-0.5, -0.5, -0.5], [0.0, -1.0, 0.0], [0.0, 1.0]),
    v([0.5, -0.5, -0.5], [0.0, -1.0, 0.0], [1.0, 1.0]),
    v([0.5, -0.5, 0.5], [0.0, -1.0, 0.0], [1.0, 0.0]),
    v([0.5, -0.5, 0.5], [0.0, -1.0, 0.0], [1.0, 0.0]),
    v([-0.5, -0.5, 0.5], [0.0, -1.0, 0.0], [0.0, 0.0]),
    v([-0.5, -0.5, -0.5], [0.0, -1.0, 0.0], [0.0, 1.0]),
    // top
    v([-0.5, 0.5, -0.5], [0.0, 1.0, 0.0], [0.0, 1.0]),
    v([0.5, 0.5, 0.5], [0.0, 1.0, 0.0], [1.0, 0.0]),
    v([0.5, 0.5, -0.5], [0.0, 1.0, 0.0], [1.0, 1.0]),
    v([0.5, 0.5, 0.5], [0.0, 1.0, 0.0], [1.0, 0.0]),
    v([-0.5, 0.5, 0.5], [0.0, 1.0, 0.0], [0.0, 0.0]),
    v([-0.5, 0.5, -0.5], [0.0, 1.0, 0.0], [0.0, 1.0]),
];

/// Full-screen triangle strip. Texture space has its origin at the top left,
/// so NDC `y = 1` maps to `v = 0`.
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        pos: [-1.0, 1.0, 0.0],
        uv: [0.0, 0.0],
    },
    QuadVertex {
        pos: [-1.0, -1.0, 0.0],
        uv: [0.0, 1.0],
    },
    QuadVertex {
        pos: [1.0, 1.0, 0.0],
        uv: [1.0, 0.0],
    },
    QuadVertex {
        pos: [1.0, -1.0, 0.0],
        uv: [1.0, 1.0],
    },
];

pub(crate) fn create_cube(ctx: &mut dyn GpuContext, label: &str) -> Mesh {
    ctx.create_mesh(&MeshDesc {
        label,
        data: MeshData::Lit(&CUBE_VERTICES),
        topology: Topology::TriangleList,
    })
}

/// Shared cube and quad meshes. Each is uploaded once, on first request.
#[derive(Debug, Default)]
pub struct Primitives {
    cube: Option<Mesh>,
    quad: Option<Mesh>,
}

impl Primitives {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cube(&mut self, ctx: &mut dyn GpuContext) -> MeshId {
        self.cube
            .get_or_insert_with(|| create_cube(ctx, "gloam cube"))
            .id()
    }

    pub fn quad(&mut self, ctx: &mut dyn GpuContext) -> MeshId {
        self.quad
            .get_or_insert_with(|| {
                ctx.create_mesh(&MeshDesc {
                    label: "gloam quad",
                    data: MeshData::Quad(&QUAD_VERTICES),
                    topology: Topology::TriangleStrip,
                })
            })
            .id()
    }
}
