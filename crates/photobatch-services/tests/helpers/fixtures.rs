//! Test fixtures: image blobs and ZIP inspection.

use bytes::Bytes;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Small PNG with a transparent half.
pub fn create_test_png() -> Vec<u8> {
    let img = RgbaImage::from_fn(8, 8, |x, _| {
        if x < 4 {
            Rgba([200, 20, 20, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// Entry names of an in-memory ZIP, in archive order.
pub fn zip_entries(data: &Bytes) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data.to_vec())).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}
