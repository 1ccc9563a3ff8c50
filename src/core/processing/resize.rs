use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::types::WidthEnforcement;

/// Height of a frame scaled to `target_cols` with its aspect ratio preserved.
pub fn calculate_resize_height(original_cols: u32, original_rows: u32, target_cols: u32) -> u32 {
    if original_cols == 0 {
        return 0;
    }
    let scale_factor = target_cols as f64 / original_cols as f64;
    (original_rows as f64 * scale_factor).round() as u32
}

/// Width every frame should be scaled to, or `None` when widths are left alone.
pub fn resolve_target_width(
    mode: WidthEnforcement,
    widths: impl IntoIterator<Item = u32>,
    custom_width: u32,
) -> Option<u32> {
    match mode {
        WidthEnforcement::None => None,
        WidthEnforcement::MatchMinimum => widths.into_iter().filter(|&w| w > 0).min(),
        WidthEnforcement::Custom => Some(custom_width),
    }
}

pub fn resize_rgba_image(
    image: &RgbaImage,
    target_cols: u32,
    target_rows: u32,
    filter: FilterType,
) -> Result<RgbaImage> {
    let resize_options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(filter));
    let mut resizer = Resizer::new();

    let src_image = Image::from_vec_u8(
        image.width(),
        image.height(),
        image.as_raw().clone(),
        PixelType::U8x4,
    )?;
    let mut dst_image = Image::new(target_cols, target_rows, PixelType::U8x4);
    resizer.resize(&src_image, &mut dst_image, &resize_options)?;

    RgbaImage::from_raw(target_cols, target_rows, dst_image.into_vec()).ok_or_else(|| {
        Error::Processing(format!(
            "resized buffer does not match {}x{}",
            target_cols, target_rows
        ))
    })
}

/// Scale every frame to `target_width`, consuming the sequence.
///
/// Frames already at the target width pass through untouched; frames whose
/// scaled height rounds to zero are dropped.
pub fn resize_to_width(frames: Vec<RgbaImage>, target_width: Option<u32>) -> Result<Vec<RgbaImage>> {
    let Some(target_cols) = target_width else {
        return Ok(frames);
    };

    info!("Resizing {} frames to width {}", frames.len(), target_cols);
    let mut resized = Vec::with_capacity(frames.len());
    for (index, frame) in frames.into_iter().enumerate() {
        if frame.width() == target_cols {
            resized.push(frame);
            continue;
        }
        let target_rows = calculate_resize_height(frame.width(), frame.height(), target_cols);
        if target_rows == 0 {
            warn!(
                "Dropping frame {} ({}x{}): height rounds to 0 at width {}",
                index,
                frame.width(),
                frame.height(),
                target_cols
            );
            continue;
        }
        debug!(
            "Frame {}: {}x{} -> {}x{}",
            index,
            frame.width(),
            frame.height(),
            target_cols,
            target_rows
        );
        let replacement =
            resize_rgba_image(&frame, target_cols, target_rows, FilterType::Lanczos3)?;
        drop(frame);
        resized.push(replacement);
    }
    Ok(resized)
}

/// Apply a width enforcement mode to a sequence.
pub fn resize_images(
    frames: Vec<RgbaImage>,
    mode: WidthEnforcement,
    custom_width: u32,
) -> Result<Vec<RgbaImage>> {
    let target = resolve_target_width(mode, frames.iter().map(|f| f.width()), custom_width);
    resize_to_width(frames, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([200, 120, 40, 255]))
    }

    #[test]
    fn none_mode_keeps_frames() {
        let frames = vec![solid(100, 50), solid(80, 40)];
        let out = resize_images(frames, WidthEnforcement::None, 720).unwrap();
        assert_eq!(out[0].dimensions(), (100, 50));
        assert_eq!(out[1].dimensions(), (80, 40));
    }

    #[test]
    fn match_minimum_scales_to_narrowest() {
        let frames = vec![solid(100, 50), solid(80, 40), solid(200, 300)];
        let out = resize_images(frames, WidthEnforcement::MatchMinimum, 720).unwrap();
        let dims: Vec<_> = out.iter().map(|f| f.dimensions()).collect();
        assert_eq!(dims, vec![(80, 40), (80, 40), (80, 120)]);
    }

    #[test]
    fn custom_width_scales_all_frames() {
        let frames = vec![solid(100, 50), solid(50, 50)];
        let out = resize_images(frames, WidthEnforcement::Custom, 200).unwrap();
        let dims: Vec<_> = out.iter().map(|f| f.dimensions()).collect();
        assert_eq!(dims, vec![(200, 100), (200, 200)]);
    }

    #[test]
    fn drops_frames_that_collapse_to_zero_height() {
        let frames = vec![solid(1000, 1), solid(100, 100)];
        let out = resize_images(frames, WidthEnforcement::Custom, 100).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dimensions(), (100, 100));
    }

    #[test]
    fn resize_height_rounds() {
        assert_eq!(calculate_resize_height(3, 10, 2), 7);
        assert_eq!(calculate_resize_height(0, 10, 2), 0);
    }
}
