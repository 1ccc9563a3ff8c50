use image::{Rgba, RgbaImage};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Canvas dimensions for a sequence: widest frame by the sum of heights.
pub fn canvas_dimensions<'a>(frames: impl IntoIterator<Item = &'a RgbaImage>) -> (u32, u64) {
    frames
        .into_iter()
        .fold((0u32, 0u64), |(w, h), f| (w.max(f.width()), h + f.height() as u64))
}

/// Stack frames top-to-bottom into one canvas, consuming the sequence.
///
/// Narrower frames are left-aligned; uncovered pixels stay opaque black.
pub fn combine_images(frames: Vec<RgbaImage>) -> Result<RgbaImage> {
    if frames.is_empty() {
        return Err(Error::Processing("cannot combine an empty sequence".to_string()));
    }

    let (canvas_cols, canvas_rows) = canvas_dimensions(&frames);
    let canvas_rows = u32::try_from(canvas_rows).map_err(|_| {
        Error::Processing(format!(
            "combined height {} exceeds the raster limit",
            canvas_rows
        ))
    })?;
    info!(
        "Combining {} frames into {}x{} canvas",
        frames.len(),
        canvas_cols,
        canvas_rows
    );

    let mut canvas = RgbaImage::from_pixel(canvas_cols, canvas_rows, Rgba([0, 0, 0, 255]));
    let mut combine_offset: u32 = 0;
    for frame in frames {
        // Copy per row using slice copies to minimize per-pixel indexing
        let row_bytes = frame.width() as usize * 4;
        let canvas_stride = canvas_cols as usize * 4;
        let dst: &mut [u8] = &mut canvas;
        for (row, src_row) in frame.as_raw().chunks_exact(row_bytes.max(1)).enumerate() {
            let dst_offset = (combine_offset as usize + row) * canvas_stride;
            dst[dst_offset..dst_offset + row_bytes].copy_from_slice(src_row);
        }
        debug!("Pasted {}x{} frame at y={}", frame.width(), frame.height(), combine_offset);
        combine_offset += frame.height();
    }
    Ok(canvas)
}
