//! Texture loading: plain images, array textures and cubemaps.
//!
//! Layered variants validate that every sub-image agrees on dimensions and
//! component count *before* the GPU upload, so a mismatch never leaves a
//! partially-allocated texture behind.

use std::path::{Path, PathBuf};

use image::GenericImageView;

use crate::res::desc::{TextureDesc, TextureKind};
use crate::res::errors::{Error, Result};
use crate::res::finder::SearchPaths;
use crate::video::{GpuDevice, TextureHandle, TextureParams};

/// A loaded texture: the backend handle plus the parameters it was created
/// with.
#[derive(Debug, Clone, Copy)]
pub struct Texture {
    pub handle: TextureHandle,
    pub params: TextureParams,
}

/// One decoded image: dimensions, component count and tightly packed pixel
/// bytes.
pub(crate) struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub components: u8,
    pub bytes: Vec<u8>,
}

pub(crate) fn decode(path: &Path, flip: bool) -> Result<DecodedImage> {
    let img = image::open(path)?;
    let img = if flip { img.flipv() } else { img };

    let components = match img {
        image::DynamicImage::ImageLuma8(_) => 1,
        image::DynamicImage::ImageLumaA8(_) => 2,
        image::DynamicImage::ImageRgb8(_) | image::DynamicImage::ImageBgr8(_) => 3,
        image::DynamicImage::ImageRgba8(_) | image::DynamicImage::ImageBgra8(_) => 4,
    };

    let (width, height) = img.dimensions();
    Ok(DecodedImage {
        width,
        height,
        components,
        bytes: img.raw_pixels(),
    })
}

pub fn load<G: GpuDevice>(
    device: &mut G,
    paths: &SearchPaths,
    desc: &TextureDesc,
    kind: TextureKind,
) -> Result<Texture> {
    match kind {
        TextureKind::Image => {
            let path = paths.locate(&desc.path)?;
            info!("Loads texture {:?}.", desc.path);

            let img = decode(&path, desc.flip)?;
            let params = TextureParams {
                dimensions: (img.width, img.height),
                components: img.components,
                layers: 1,
                mipmap: desc.mipmap,
                mipmap_levels: desc.mipmap_levels,
                anisotropy: desc.anisotropy,
            };
            let handle = device.create_texture(&params, &img.bytes)?;
            Ok(Texture { handle, params })
        }
        TextureKind::Cube => {
            let faces = desc
                .faces
                .as_ref()
                .ok_or_else(|| Error::MalformedScene("cubemap without face paths".into()))?;
            let layers: Vec<&PathBuf> = faces.iter().collect();
            load_layered(device, paths, desc, &layers)
        }
        TextureKind::Array => {
            let layers = desc
                .layers
                .as_ref()
                .ok_or_else(|| Error::MalformedScene("array texture without layer paths".into()))?;
            let layers: Vec<&PathBuf> = layers.iter().collect();
            load_layered(device, paths, desc, &layers)
        }
    }
}

/// Decodes every layer, validates consistency across the whole set, and
/// only then uploads the concatenated data.
fn load_layered<G: GpuDevice>(
    device: &mut G,
    paths: &SearchPaths,
    desc: &TextureDesc,
    layers: &[&PathBuf],
) -> Result<Texture> {
    if layers.is_empty() {
        return Err(Error::EmptyLayerList(desc.path.clone()));
    }

    let mut decoded = Vec::with_capacity(layers.len());
    for relative in layers {
        let path = paths.locate(relative)?;
        decoded.push(((*relative).clone(), decode(&path, desc.flip)?));
    }

    let (_, first) = &decoded[0];
    let (expected_w, expected_h, expected_c) = (first.width, first.height, first.components);

    for (relative, img) in &decoded {
        if img.components != expected_c {
            return Err(Error::ComponentMismatch {
                path: relative.clone(),
                expected: expected_c,
                found: img.components,
            });
        }
        if (img.width, img.height) != (expected_w, expected_h) {
            return Err(Error::DimensionMismatch {
                path: relative.clone(),
                expected_w,
                expected_h,
                found_w: img.width,
                found_h: img.height,
            });
        }
    }

    info!("Loads layered texture ({} layers).", decoded.len());

    let mut bytes = Vec::new();
    for (_, img) in &decoded {
        bytes.extend_from_slice(&img.bytes);
    }

    let params = TextureParams {
        dimensions: (expected_w, expected_h),
        components: expected_c,
        layers: decoded.len() as u32,
        mipmap: desc.mipmap,
        mipmap_levels: desc.mipmap_levels,
        anisotropy: desc.anisotropy,
    };
    let handle = device.create_texture(&params, &bytes)?;
    Ok(Texture { handle, params })
}
