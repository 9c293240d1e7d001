//! Image textures and solid-colour fallbacks.
//!
//! Decode failures never propagate: they are logged with the path and a 1×1
//! white texture stands in, so material sampling stays defined.

use std::path::Path;

use anyhow::Context;
use image::RgbaImage;

use crate::gfx::{Filter, Format, GpuContext, Texture, TextureDesc, Wrap};

/// 1×1 texture of one colour.
pub fn solid_texture(ctx: &mut dyn GpuContext, label: &str, rgba: [u8; 4]) -> Texture {
    ctx.create_texture(
        &TextureDesc {
            label: label.into(),
            width: 1,
            height: 1,
            format: Format::Rgba8Unorm,
            filter: Filter::Nearest,
            wrap: Wrap::Repeat,
        },
        Some(&rgba),
    )
}

fn upload(ctx: &mut dyn GpuContext, label: &str, img: &RgbaImage) -> Texture {
    ctx.create_texture(
        &TextureDesc {
            label: label.into(),
            width: img.width(),
            height: img.height(),
            format: Format::Rgba8Unorm,
            filter: Filter::Linear,
            wrap: Wrap::Repeat,
        },
        Some(img.as_raw()),
    )
}

fn decode(bytes: &[u8]) -> anyhow::Result<RgbaImage> {
    let img = image::load_from_memory(bytes).context("decoding image")?;
    Ok(img.to_rgba8())
}

/// Decodes an encoded image (PNG or JPEG) held in memory.
pub fn decode_texture(ctx: &mut dyn GpuContext, label: &str, bytes: &[u8]) -> Texture {
    match decode(bytes) {
        Ok(img) => upload(ctx, label, &img),
        Err(err) => {
            log::error!("texture `{label}`: {err:#}");
            solid_texture(ctx, label, [255; 4])
        }
    }
}

/// Loads and decodes an image file.
pub fn load_texture(ctx: &mut dyn GpuContext, path: impl AsRef<Path>) -> Texture {
    let path = path.as_ref();
    let label = path.display().to_string();
    let loaded = std::fs::read(path)
        .with_context(|| format!("reading {label}"))
        .and_then(|bytes| decode(&bytes));

    match loaded {
        Ok(img) => {
            log::debug!("loaded texture {label} ({}x{})", img.width(), img.height());
            upload(ctx, &label, &img)
        }
        Err(err) => {
            log::error!("failed to load texture {label}: {err:#}");
            solid_texture(ctx, &label, [255; 4])
        }
    }
}
