use image::{GrayImage, RgbaImage};

/// Single-channel projection of a canvas used by the cut search
pub fn luminance(canvas: &RgbaImage) -> GrayImage {
    image::imageops::grayscale(canvas)
}

/// Pixels of row `y`
#[inline]
pub fn row(luma: &GrayImage, y: u32) -> &[u8] {
    let stride = luma.width() as usize;
    let start = y as usize * stride;
    &luma.as_raw()[start..start + stride]
}

/// Columns left after trimming `ignorable` pixels from both edges
#[inline]
fn scan_span(row: &[u8], ignorable: usize) -> &[u8] {
    if row.len() <= ignorable * 2 {
        &[]
    } else {
        &row[ignorable..row.len() - ignorable]
    }
}

/// True when any adjacent-pixel delta inside the border exceeds `threshold`
pub fn row_is_busy(row: &[u8], ignorable: usize, threshold: i32) -> bool {
    scan_span(row, ignorable)
        .windows(2)
        .any(|pair| (pair[1] as i32 - pair[0] as i32).abs() > threshold)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowStats {
    /// Mean absolute delta between sampled neighbours
    pub mean_delta: f64,
    /// Fraction of sampled pixels darker than the dark level
    pub dark_ratio: f64,
}

/// Stride-sampled statistics of one row
pub fn row_stats(row: &[u8], ignorable: usize, stride: usize, dark_level: u8) -> RowStats {
    let span = scan_span(row, ignorable);
    let stride = stride.max(1);
    let mut delta_sum: u64 = 0;
    let mut pairs: u64 = 0;
    let mut dark: u64 = 0;
    let mut samples: u64 = 0;

    let mut x = 0;
    while x < span.len() {
        let v = span[x];
        samples += 1;
        if v < dark_level {
            dark += 1;
        }
        if x + 1 < span.len() {
            delta_sum += (span[x + 1] as i32 - v as i32).unsigned_abs() as u64;
            pairs += 1;
        }
        x += stride;
    }

    RowStats {
        mean_delta: if pairs == 0 { 0.0 } else { delta_sum as f64 / pairs as f64 },
        dark_ratio: if samples == 0 { 0.0 } else { dark as f64 / samples as f64 },
    }
}
