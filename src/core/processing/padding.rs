use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::error::{Error, Result};

/// Place `image` on a `canvas_cols` x `canvas_rows` canvas filled with `fill`,
/// its top-left corner at (`pad_cols`, `pad_rows`).
pub fn pad_to_canvas(
    image: &RgbaImage,
    canvas_cols: u32,
    canvas_rows: u32,
    pad_cols: u32,
    pad_rows: u32,
    fill: Rgba<u8>,
) -> Result<RgbaImage> {
    let (cols, rows) = image.dimensions();
    if pad_cols + cols > canvas_cols || pad_rows + rows > canvas_rows {
        return Err(Error::Processing(format!(
            "{}x{} image at ({}, {}) does not fit a {}x{} canvas",
            cols, rows, pad_cols, pad_rows, canvas_cols, canvas_rows
        )));
    }
    debug!(
        "Adding padding: cols={}, rows={}, pad_cols={}, pad_rows={}, canvas={}x{}",
        cols, rows, pad_cols, pad_rows, canvas_cols, canvas_rows
    );

    let mut padded = RgbaImage::from_pixel(canvas_cols, canvas_rows, fill);
    let row_bytes = cols as usize * 4;
    let canvas_stride = canvas_cols as usize * 4;
    let dst: &mut [u8] = &mut padded;
    // Copy per row using slice copies to minimize per-pixel indexing
    for (row, src_slice) in image.as_raw().chunks_exact(row_bytes.max(1)).enumerate() {
        let dst_offset = (row + pad_rows as usize) * canvas_stride + pad_cols as usize * 4;
        dst[dst_offset..dst_offset + row_bytes].copy_from_slice(src_slice);
    }
    Ok(padded)
}
