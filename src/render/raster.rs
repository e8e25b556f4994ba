//! SVG rasterization, bounding-box trim and PNG encoding.

use std::sync::Arc;

use resvg::tiny_skia::{self, Pixmap, Transform};
use resvg::usvg::{fontdb, Options, Tree};

use crate::error::{HeatmapError, Result};

use super::layout::POINTS_PER_INCH;

const INCHES_PER_METER: f64 = 39.3701;
/// Padding kept around the content when trimming, in inches.
const TRIM_PAD_IN: f64 = 0.1;

/// An opaque RGBA raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA, 4 bytes per pixel.
    pub data: Vec<u8>,
}

/// Load the system font database once; text in the figure resolves
/// against it.
pub fn system_fonts() -> Arc<fontdb::Database> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    tracing::debug!(faces = db.len(), "loaded system fonts");
    Arc::new(db)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_px(value: f64) -> u32 {
    // Tolerate float noise from the points-to-pixels scale
    (value - 1e-6).ceil().clamp(1.0, f64::from(u32::MAX)) as u32
}

/// Rasterize an SVG document laid out in points at `dpi`, on white.
pub fn rasterize(svg: &str, fonts: Arc<fontdb::Database>, dpi: u32) -> Result<RgbaImage> {
    let mut options = Options::default();
    options.fontdb = fonts;

    let tree = Tree::from_str(svg, &options)
        .map_err(|e| HeatmapError::RenderFailure(format!("SVG parse failed: {e}")))?;

    let scale = f64::from(dpi) / POINTS_PER_INCH;
    let size = tree.size();
    let width = to_px(f64::from(size.width()) * scale);
    let height = to_px(f64::from(size.height()) * scale);

    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        HeatmapError::RenderFailure(format!("cannot allocate a {width}x{height} image"))
    })?;
    pixmap.fill(tiny_skia::Color::WHITE);

    #[allow(clippy::cast_possible_truncation)]
    let s = scale as f32;
    resvg::render(&tree, Transform::from_scale(s, s), &mut pixmap.as_mut());

    Ok(RgbaImage {
        width,
        height,
        data: pixmap.take(),
    })
}

/// Crop to the non-white content plus `pad` pixels on each side.
///
/// An image with no content is returned unchanged.
pub fn trim(image: &RgbaImage, pad: u32) -> RgbaImage {
    let width = image.width as usize;
    if width == 0 {
        return image.clone();
    }
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for (idx, px) in image.data.chunks_exact(4).enumerate() {
        if px.iter().all(|&b| b == 255) {
            continue;
        }
        let x = u32::try_from(idx % width).unwrap_or(u32::MAX);
        let y = u32::try_from(idx / width).unwrap_or(u32::MAX);
        bounds = Some(match bounds {
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            None => (x, y, x, y),
        });
    }

    let Some((x0, y0, x1, y1)) = bounds else {
        return image.clone();
    };
    let x0 = x0.saturating_sub(pad);
    let y0 = y0.saturating_sub(pad);
    let x1 = x1.saturating_add(pad).min(image.width.saturating_sub(1));
    let y1 = y1.saturating_add(pad).min(image.height.saturating_sub(1));

    let out_w = x1 - x0 + 1;
    let out_h = y1 - y0 + 1;
    let mut data = Vec::with_capacity(out_w as usize * out_h as usize * 4);
    for y in y0..=y1 {
        let start = (y as usize * width + x0 as usize) * 4;
        let end = start + out_w as usize * 4;
        if let Some(row) = image.data.get(start..end) {
            data.extend_from_slice(row);
        }
    }

    RgbaImage {
        width: out_w,
        height: out_h,
        data,
    }
}

/// Trim padding in pixels for a resolution.
pub fn trim_pad_px(dpi: u32) -> u32 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let pad = (f64::from(dpi) * TRIM_PAD_IN).round() as u32;
    pad
}

/// Encode as 8-bit RGBA PNG with a `pHYs` chunk for `dpi`.
pub fn encode_png(image: &RgbaImage, dpi: u32) -> Result<Vec<u8>> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let ppm = (f64::from(dpi) * INCHES_PER_METER).round() as u32;

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, image.width, image.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: ppm,
            yppu: ppm,
            unit: png::Unit::Meter,
        }));
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&image.data)?;
        writer.finish()?;
    }
    Ok(out)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    fn white(width: u32, height: u32) -> RgbaImage {
        RgbaImage {
            width,
            height,
            data: vec![255; (width * height * 4) as usize],
        }
    }

    fn paint(image: &mut RgbaImage, x: u32, y: u32) {
        let idx = ((y * image.width + x) * 4) as usize;
        image.data[idx..idx + 3].copy_from_slice(&[0, 0, 0]);
    }

    #[test]
    fn test_trim_keeps_padding() {
        let mut image = white(100, 80);
        paint(&mut image, 40, 30);
        paint(&mut image, 50, 35);
        let trimmed = trim(&image, 5);
        assert_eq!((trimmed.width, trimmed.height), (21, 16));
        assert_eq!(trimmed.data.len(), 21 * 16 * 4);
    }

    #[test]
    fn test_trim_clamps_to_edges_and_blank_is_unchanged() {
        let mut image = white(10, 10);
        paint(&mut image, 0, 9);
        let trimmed = trim(&image, 30);
        assert_eq!((trimmed.width, trimmed.height), (10, 10));
        let blank = white(4, 4);
        assert_eq!(trim(&blank, 2), blank);
    }

    #[test]
    fn test_png_carries_dpi() {
        let png = encode_png(&white(3, 2), 300).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let decoder = png::Decoder::new(png.as_slice());
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (3, 2));
        let dims = info.pixel_dims.unwrap();
        assert_eq!(dims.xppu, 11811);
        assert_eq!(dims.unit, png::Unit::Meter);
        assert_eq!(trim_pad_px(300), 30);
    }

    #[test]
    fn test_rasterize_scales_points_to_dpi() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="72" height="36" viewBox="0 0 72 36"><rect x="0" y="0" width="36" height="36" fill="#000000"/></svg>"##;
        let image = rasterize(svg, Arc::new(fontdb::Database::new()), 100).unwrap();
        assert_eq!((image.width, image.height), (100, 50));
        // Left half is black, right half stays white
        assert_eq!(&image.data[0..4], &[0, 0, 0, 255]);
        let right = ((10 * 100 + 90) * 4) as usize;
        assert_eq!(&image.data[right..right + 4], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_rasterize_rejects_invalid_svg() {
        let err = rasterize("<svg", Arc::new(fontdb::Database::new()), 300).unwrap_err();
        assert!(matches!(err, HeatmapError::RenderFailure(_)));
    }
}
