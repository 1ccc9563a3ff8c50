//! Segment encoders: JPEG via `jpeg-encoder`, TIFF via `tiff`, PNG/BMP/TGA via `image`.
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};

use crate::error::Result;
use crate::types::OutputFormat;

pub mod jpeg;
pub mod naming;
pub mod tiff;

pub use naming::NamingContext;

fn is_opaque(image: &RgbaImage) -> bool {
    image.pixels().all(|p| p[3] == u8::MAX)
}

/// Drop the alpha channel.
pub fn to_rgb(image: RgbaImage) -> RgbImage {
    DynamicImage::ImageRgba8(image).to_rgb8()
}

/// Encode one segment to `output` in `format`, consuming it.
///
/// Lossy output is always opaque RGB; other formats keep alpha only when the
/// segment actually has transparent pixels.
pub fn write_segment(output: &Path, image: RgbaImage, format: OutputFormat) -> Result<()> {
    let (cols, rows) = image.dimensions();
    match format {
        OutputFormat::Jpeg => {
            let rgb = to_rgb(image);
            jpeg::write_rgb_jpeg(output, cols, rows, rgb.as_raw())
        }
        OutputFormat::Tiff if is_opaque(&image) => {
            let rgb = to_rgb(image);
            tiff::write_tiff_rgb8(output, cols, rows, rgb.as_raw())
        }
        OutputFormat::Tiff => tiff::write_tiff_rgba8(output, cols, rows, image.as_raw()),
        OutputFormat::Bmp if is_opaque(&image) => {
            to_rgb(image).save_with_format(output, ImageFormat::Bmp)?;
            Ok(())
        }
        OutputFormat::Bmp => {
            image.save_with_format(output, ImageFormat::Bmp)?;
            Ok(())
        }
        OutputFormat::Png => {
            image.save_with_format(output, ImageFormat::Png)?;
            Ok(())
        }
        OutputFormat::Tga => {
            image.save_with_format(output, ImageFormat::Tga)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn every_format_round_trips_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        for format in [
            OutputFormat::Png,
            OutputFormat::Jpeg,
            OutputFormat::Bmp,
            OutputFormat::Tiff,
            OutputFormat::Tga,
        ] {
            let path = dir.path().join(format!("seg.{}", format.extension()));
            let img = RgbaImage::from_pixel(16, 9, Rgba([200, 100, 50, 255]));
            write_segment(&path, img, format).unwrap();
            let decoded = image::open(&path).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (16, 9), "{}", format);
        }
    }

    #[test]
    fn jpeg_output_is_opaque_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seg.jpg");
        let img = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 0]));
        write_segment(&path, img, OutputFormat::Jpeg).unwrap();
        let decoded = image::open(&path).unwrap();
        assert!(!decoded.color().has_alpha());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_final_write_is_reported() {
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        for format in [OutputFormat::Jpeg, OutputFormat::Tiff] {
            let img = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
            assert!(write_segment(full, img, format).is_err(), "{}", format);
        }
    }

    #[test]
    fn transparent_png_keeps_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seg.png");
        let img = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 128]));
        write_segment(&path, img, OutputFormat::Png).unwrap();
        assert_eq!(image::open(&path).unwrap().to_rgba8().get_pixel(0, 0)[3], 128);
    }
}
