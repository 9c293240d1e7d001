//! Bind-group layouts, vertex layouts and lazily built render pipelines.

use crate::gfx::{
    BlendMode, DepthMode, INSTANCE_STRIDE, MeshVertex, QuadVertex, Topology, VertexInput,
};

use super::resources::DEPTH_FORMAT;

// ── vertex layouts ────────────────────────────────────────────────────────

const QUAD_ATTRS: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

const MESH_ATTRS: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

// Model matrix columns; see `INSTANCE_LOCATION`.
const INSTANCE_ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    3 => Float32x4,
    4 => Float32x4,
    5 => Float32x4,
    6 => Float32x4,
];

pub(super) fn quad_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &QUAD_ATTRS,
    }
}

pub(super) fn mesh_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &MESH_ATTRS,
    }
}

/// Per-instance model matrix, advancing once per instance.
pub(super) fn instance_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: INSTANCE_STRIDE,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &INSTANCE_ATTRS,
    }
}

// ── bind groups ───────────────────────────────────────────────────────────

/// Group 0: uniform block at binding 0, then `(texture, sampler)` pairs at
/// `1 + 2i` / `2 + 2i` for each declared texture unit.
pub(super) fn bind_group_layout(
    device: &wgpu::Device,
    label: &str,
    texture_count: usize,
) -> wgpu::BindGroupLayout {
    let mut entries = Vec::with_capacity(1 + 2 * texture_count);
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    });

    for i in 0..texture_count as u32 {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 1 + 2 * i,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 2 + 2 * i,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &entries,
    })
}

// ── pipelines ─────────────────────────────────────────────────────────────

/// Everything a pipeline depends on besides the program itself.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub(super) struct PipelineKey {
    pub colors: Vec<wgpu::TextureFormat>,
    pub depth: bool,
    pub topology: Topology,
}

/// Fixed-function state of a program.
pub(super) struct ProgramState<'a> {
    pub label: &'a str,
    pub module: &'a wgpu::ShaderModule,
    pub layout: &'a wgpu::PipelineLayout,
    pub vertex: VertexInput,
    pub depth: DepthMode,
    pub blend: BlendMode,
}

fn blend_state(blend: BlendMode) -> Option<wgpu::BlendState> {
    match blend {
        BlendMode::Replace => None,
        BlendMode::Additive => {
            let add = wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            };
            Some(wgpu::BlendState {
                color: add,
                alpha: add,
            })
        }
    }
}

/// Depth state for a target that carries a depth attachment.
///
/// Programs without depth testing still need a matching format, so they get a
/// pass-through state.
fn depth_state(mode: DepthMode) -> wgpu::DepthStencilState {
    let (write, compare) = match mode {
        DepthMode::TestWrite => (true, wgpu::CompareFunction::Less),
        DepthMode::Off => (false, wgpu::CompareFunction::Always),
    };
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

pub(super) fn create_pipeline(
    device: &wgpu::Device,
    program: &ProgramState<'_>,
    key: &PipelineKey,
) -> wgpu::RenderPipeline {
    let buffers: Vec<wgpu::VertexBufferLayout<'static>> = match program.vertex {
        VertexInput::Quad => vec![quad_layout()],
        VertexInput::Mesh => vec![mesh_layout(), instance_layout()],
    };

    let blend = blend_state(program.blend);
    let targets: Vec<Option<wgpu::ColorTargetState>> = key
        .colors
        .iter()
        .map(|&format| {
            Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })
        })
        .collect();

    let topology = match key.topology {
        Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
        Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(program.label),
        layout: Some(program.layout),

        vertex: wgpu::VertexState {
            module: program.module,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &buffers,
        },

        fragment: Some(wgpu::FragmentState {
            module: program.module,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &targets,
        }),

        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: key.depth.then(|| depth_state(program.depth)),
        multisample: wgpu::MultisampleState::default(),

        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── vertex layouts ────────────────────────────────────────────────────

    #[test]
    fn instance_matrix_uses_four_consecutive_slots() {
        let l = instance_layout();
        assert_eq!(l.step_mode, wgpu::VertexStepMode::Instance);
        assert_eq!(l.array_stride, 64);

        let locations: Vec<u32> = l.attributes.iter().map(|a| a.shader_location).collect();
        let offsets: Vec<u64> = l.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(locations, vec![3, 4, 5, 6]);
        assert_eq!(offsets, vec![0, 16, 32, 48]);
        assert!(
            l.attributes
                .iter()
                .all(|a| a.format == wgpu::VertexFormat::Float32x4)
        );
    }

    #[test]
    fn per_vertex_layouts_match_vertex_structs() {
        assert_eq!(quad_layout().array_stride, 20);
        assert_eq!(mesh_layout().array_stride, 32);
        assert_eq!(mesh_layout().step_mode, wgpu::VertexStepMode::Vertex);
        assert_eq!(mesh_layout().attributes[2].offset, 24);
    }

    // ── fixed function ────────────────────────────────────────────────────

    #[test]
    fn depth_off_still_passes_everything() {
        let s = depth_state(DepthMode::Off);
        assert!(!s.depth_write_enabled);
        assert_eq!(s.depth_compare, wgpu::CompareFunction::Always);
    }

    #[test]
    fn replace_has_no_blend() {
        assert!(blend_state(BlendMode::Replace).is_none());
        assert!(blend_state(BlendMode::Additive).is_some());
    }
}
