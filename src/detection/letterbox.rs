//! Aspect-preserving fit of a region into the detector's square input.
use fast_image_resize::FilterType;
use image::{Rgba, RgbaImage};

use super::nms::Detection;
use crate::core::processing::padding::pad_to_canvas;
use crate::core::processing::resize::resize_rgba_image;
use crate::error::Result;

pub const PAD_GRAY: u8 = 114;

/// Geometry of a letterboxed image, used to map detections back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub ratio: f32,
    /// Half of the horizontal slack, before rounding
    pub pad_x: f32,
    pub pad_y: f32,
    pub source_cols: u32,
    pub source_rows: u32,
}

impl Letterbox {
    pub fn new(source_cols: u32, source_rows: u32, size: u32) -> Self {
        let ratio = (size as f32 / source_cols.max(1) as f32)
            .min(size as f32 / source_rows.max(1) as f32);
        let (new_cols, new_rows) = scaled_dims(source_cols, source_rows, ratio, size);
        Self {
            ratio,
            pad_x: (size - new_cols) as f32 / 2.0,
            pad_y: (size - new_rows) as f32 / 2.0,
            source_cols,
            source_rows,
        }
    }

    /// Map a letterboxed x coordinate back to the source, clipped to its bounds.
    pub fn unmap_x(&self, x: f32) -> f32 {
        ((x - self.pad_x) / self.ratio).clamp(0.0, self.source_cols.saturating_sub(1) as f32)
    }

    pub fn unmap_y(&self, y: f32) -> f32 {
        ((y - self.pad_y) / self.ratio).clamp(0.0, self.source_rows.saturating_sub(1) as f32)
    }

    /// Source rows `(top, bottom)` covered by a detection, or `None` when the
    /// box clips to nothing (it lies in the padding).
    pub fn source_rows(&self, detection: &Detection) -> Option<(u32, u32)> {
        let (x1, x2) = (self.unmap_x(detection.x1), self.unmap_x(detection.x2));
        let (y1, y2) = (self.unmap_y(detection.y1), self.unmap_y(detection.y2));
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some((y1 as u32, y2 as u32))
    }
}

fn scaled_dims(cols: u32, rows: u32, ratio: f32, size: u32) -> (u32, u32) {
    let c = ((cols as f32 * ratio).round() as u32).clamp(1, size);
    let r = ((rows as f32 * ratio).round() as u32).clamp(1, size);
    (c, r)
}

/// Bilinear-resize `image` into a `size` x `size` gray-padded square.
pub fn letterbox(image: &RgbaImage, size: u32) -> Result<(RgbaImage, Letterbox)> {
    let geometry = Letterbox::new(image.width(), image.height(), size);
    let (new_cols, new_rows) = scaled_dims(image.width(), image.height(), geometry.ratio, size);

    let resized;
    let fitted = if (new_cols, new_rows) == image.dimensions() {
        image
    } else {
        resized = resize_rgba_image(image, new_cols, new_rows, FilterType::Bilinear)?;
        &resized
    };

    let left = (geometry.pad_x - 0.1).round().max(0.0) as u32;
    let top = (geometry.pad_y - 0.1).round().max(0.0) as u32;
    let padded = pad_to_canvas(
        fitted,
        size,
        size,
        left,
        top,
        Rgba([PAD_GRAY, PAD_GRAY, PAD_GRAY, 255]),
    )?;
    Ok((padded, geometry))
}

/// Planar RGB tensor data scaled to `[0, 1]`, laid out channel by channel.
pub fn to_chw_f32(image: &RgbaImage) -> Vec<f32> {
    let plane = (image.width() * image.height()) as usize;
    let mut data = vec![0f32; plane * 3];
    for (i, px) in image.pixels().enumerate() {
        data[i] = px[0] as f32 / 255.0;
        data[plane + i] = px[1] as f32 / 255.0;
        data[2 * plane + i] = px[2] as f32 / 255.0;
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tall_region_is_padded_horizontally() {
        let img = RgbaImage::from_pixel(200, 800, Rgba([10, 20, 30, 255]));
        let (boxed, geo) = letterbox(&img, 640).unwrap();
        assert_eq!(boxed.dimensions(), (640, 640));
        assert!((geo.ratio - 0.8).abs() < 1e-6);
        assert_eq!(geo.pad_x, 240.0);
        assert_eq!(geo.pad_y, 0.0);
        assert_eq!(boxed.get_pixel(100, 320), &Rgba([114, 114, 114, 255]));
        let inner = boxed.get_pixel(320, 320);
        assert!((inner[2] as i32 - 30).abs() <= 1);
    }

    #[test]
    fn unmap_inverts_letterbox_and_clips() {
        let geo = Letterbox::new(200, 800, 640);
        assert!((geo.unmap_y(320.0) - 400.0).abs() < 1e-3);
        assert!((geo.unmap_x(320.0) - 100.0).abs() < 1e-3);
        assert_eq!(geo.unmap_x(0.0), 0.0);
        assert_eq!(geo.unmap_y(10_000.0), 799.0);
    }

    #[test]
    fn boxes_in_the_padding_are_dropped() {
        let geo = Letterbox::new(200, 800, 640);
        let in_padding = Detection {
            x1: 10.0,
            y1: 100.0,
            x2: 200.0,
            y2: 300.0,
            score: 0.9,
        };
        assert_eq!(geo.source_rows(&in_padding), None);

        let straddling = Detection {
            x1: 200.0,
            y1: 0.0,
            x2: 320.0,
            y2: 2000.0,
            score: 0.9,
        };
        assert_eq!(geo.source_rows(&straddling), Some((0, 799)));
    }

    #[test]
    fn chw_layout_splits_channels() {
        let img = RgbaImage::from_pixel(2, 1, Rgba([255, 0, 51, 255]));
        let data = to_chw_f32(&img);
        assert_eq!(data.len(), 6);
        assert_eq!(&data[0..2], &[1.0, 1.0]);
        assert_eq!(&data[2..4], &[0.0, 0.0]);
        assert!((data[4] - 0.2).abs() < 1e-6);
    }
}
