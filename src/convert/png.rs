use std::io::Cursor;

use anyhow::Context;

use crate::foundation::error::{RenderError, RenderResult};

/// Decoded straight-alpha RGBA8 image.
#[derive(Clone, Debug)]
pub(crate) struct DecodedRaster {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) rgba8: Vec<u8>,
}

/// Decode encoded image bytes into straight-alpha RGBA8.
pub(crate) fn decode_rgba8(bytes: &[u8]) -> RenderResult<DecodedRaster> {
    let dyn_img = image::load_from_memory(bytes).context("decode raster from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedRaster {
        width,
        height,
        rgba8: rgba.into_raw(),
    })
}

/// Read only the dimensions of an encoded image.
pub(crate) fn dimensions(bytes: &[u8]) -> RenderResult<(u32, u32)> {
    let dims = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("guess raster format")?
        .into_dimensions()
        .context("read raster dimensions")?;
    Ok(dims)
}

/// Encode straight-alpha RGBA8 pixels as PNG.
pub(crate) fn encode_rgba8(width: u32, height: u32, rgba8: Vec<u8>) -> RenderResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(width, height, rgba8)
        .ok_or_else(|| RenderError::conversion("rgba buffer does not match dimensions"))?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

/// Convert premultiplied RGBA8 (as produced by tiny-skia) to straight alpha in place.
pub(crate) fn demultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
    }
}
