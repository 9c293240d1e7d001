//! wgpu texture, sampler and buffer creation.

use wgpu::util::DeviceExt;

use crate::gfx::{Filter, Format, Wrap};

/// Sampled texture plus the sampler it is always read with.
pub(super) struct TextureEntry {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// Depth attachment of a render target.
pub(super) struct DepthEntry {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

pub(super) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub(super) fn wgpu_format(format: Format) -> wgpu::TextureFormat {
    match format {
        Format::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        Format::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        Format::R16Float => wgpu::TextureFormat::R16Float,
        Format::Depth32Float => DEPTH_FORMAT,
    }
}

fn filter_mode(filter: Filter) -> wgpu::FilterMode {
    match filter {
        Filter::Nearest => wgpu::FilterMode::Nearest,
        Filter::Linear => wgpu::FilterMode::Linear,
    }
}

fn address_mode(wrap: Wrap) -> wgpu::AddressMode {
    match wrap {
        Wrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        Wrap::Repeat => wgpu::AddressMode::Repeat,
    }
}

fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

pub(super) fn create_sampler(
    device: &wgpu::Device,
    label: &str,
    filter: Filter,
    wrap: Wrap,
) -> wgpu::Sampler {
    let mode = filter_mode(filter);
    let address = address_mode(wrap);
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: address,
        address_mode_v: address,
        address_mode_w: address,
        mag_filter: mode,
        min_filter: mode,
        // Render targets never have mip chains.
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

/// Creates a single-mip 2D texture readable from shaders.
///
/// `attachment` additionally allows it as a colour render attachment.
pub(super) fn create_sampled(
    device: &wgpu::Device,
    label: &str,
    (width, height): (u32, u32),
    format: Format,
    filter: Filter,
    wrap: Wrap,
    attachment: bool,
) -> TextureEntry {
    let mut usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
    if attachment {
        usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
    }

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent(width, height),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu_format(format),
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = create_sampler(device, label, filter, wrap);

    TextureEntry {
        texture,
        view,
        sampler,
    }
}

pub(super) fn create_depth(device: &wgpu::Device, label: &str, size: (u32, u32)) -> DepthEntry {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent(size.0, size.1),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::COPY_SRC
            | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    DepthEntry { texture, view }
}

/// Uploads tightly packed pixels covering the whole texture.
///
/// Returns `false` (and uploads nothing) when `pixels` has the wrong length.
pub(super) fn upload(
    queue: &wgpu::Queue,
    entry: &TextureEntry,
    (width, height): (u32, u32),
    format: Format,
    pixels: &[u8],
) -> bool {
    let row = width * format.bytes_per_pixel();
    if pixels.len() != (row * height) as usize {
        return false;
    }

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &entry.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(row),
            rows_per_image: Some(height),
        },
        extent(width, height),
    );
    true
}

pub(super) fn vertex_buffer(device: &wgpu::Device, label: &str, bytes: &[u8]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytes,
        usage: wgpu::BufferUsages::VERTEX,
    })
}

pub(super) fn uniform_buffer(device: &wgpu::Device, label: &str, bytes: &[u8]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytes,
        usage: wgpu::BufferUsages::UNIFORM,
    })
}
