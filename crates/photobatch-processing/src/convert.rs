use anyhow::{Context, Result};
use image::{DynamicImage, RgbImage};
use std::path::{Path, PathBuf};

/// Quality used for PNG→JPEG conversion unless configured otherwise
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Convert a PNG into a JPEG placed in `dest_dir`.
///
/// The output is named after the PNG stem (`photo.PT01.png` becomes
/// `photo.PT01.jpg`). Transparent and palette images are flattened onto an
/// opaque white background.
///
/// Optimized Huffman coding needs the `mozjpeg` feature. The default build
/// encodes with `image`'s baseline encoder, which honors `quality` but has no
/// optimization switch.
pub fn convert_png_to_jpeg(png_path: &Path, dest_dir: &Path, quality: u8) -> Result<PathBuf> {
    let stem = png_path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("PNG path has no file name: {}", png_path.display()))?;
    let jpeg_path = dest_dir.join(format!("{}.jpg", stem));

    let img = image::open(png_path)
        .with_context(|| format!("Failed to decode {}", png_path.display()))?;
    let rgb = flatten_onto_white(&img);
    let jpeg_data = encode_jpeg(&rgb, quality)?;

    std::fs::write(&jpeg_path, &jpeg_data)
        .with_context(|| format!("Failed to write {}", jpeg_path.display()))?;

    tracing::debug!(
        source = %png_path.display(),
        output = %jpeg_path.display(),
        size_bytes = jpeg_data.len(),
        "PNG converted to JPEG"
    );

    Ok(jpeg_path)
}

/// Alpha-composite onto white. Opaque images come out unchanged.
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Encode to JPEG using mozjpeg
#[cfg(feature = "mozjpeg")]
fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let (width, height) = rgb.dimensions();

    let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_quality(quality as f32);
    comp.set_optimize_coding(true);

    let mut comp = comp.start_compress(Vec::new())?;
    comp.write_scanlines(rgb)?;
    let jpeg_data = comp.finish()?;

    Ok(jpeg_data)
}

/// Encode to JPEG using the image crate encoder (standard Huffman tables)
#[cfg(not(feature = "mozjpeg"))]
fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    use image::codecs::jpeg::JpegEncoder;

    let mut buffer = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
        encoder
            .encode_image(rgb)
            .context("Failed to encode JPEG")?;
    }

    Ok(buffer)
}
