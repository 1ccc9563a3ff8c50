//! Split planning: choose where to cut a tall canvas so that each cut row is
//! visually quiet and outside every protected (detected bubble/text) range.
use image::{GrayImage, RgbaImage};
use tracing::{debug, info, trace};

use crate::core::params::{SplitTuning, StitchParams};
use crate::core::processing::ops::{row, row_is_busy, row_stats};
use crate::detection::ExclusionRange;
use crate::types::SplitStrategy;

/// Supplier of protected ranges for the cut currently being searched.
pub trait ExclusionSource {
    /// Sorted, merged ranges in canvas rows around the tentative cut at `cut_row`.
    fn exclusions_near(&mut self, cut_row: u32) -> Vec<ExclusionRange>;
}

/// No protected rows anywhere
pub struct NoExclusions;

impl ExclusionSource for NoExclusions {
    fn exclusions_near(&mut self, _cut_row: u32) -> Vec<ExclusionRange> {
        Vec::new()
    }
}

/// The same ranges for every probe
impl ExclusionSource for Vec<ExclusionRange> {
    fn exclusions_near(&mut self, _cut_row: u32) -> Vec<ExclusionRange> {
        self.clone()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SplitSettings {
    pub nominal_height: u32,
    pub sensitivity: u8,
    pub threshold: i32,
    pub ignorable_pixels: u32,
    pub scan_step: u32,
    pub strategy: SplitStrategy,
    pub tuning: SplitTuning,
}

impl SplitSettings {
    pub fn from_params(params: &StitchParams) -> Self {
        Self {
            nominal_height: params.split_height.max(1),
            sensitivity: params.sensitivity,
            threshold: params.threshold(),
            ignorable_pixels: params.ignorable_pixels,
            scan_step: params.scan_step.max(1),
            strategy: params.strategy,
            tuning: params.tuning,
        }
    }

    /// Shortest allowed non-final segment
    pub fn floor_height(&self) -> u32 {
        ((self.tuning.floor_ratio * self.nominal_height as f64).ceil() as u32).max(1)
    }
}

/// Ordered segment heights covering a canvas exactly
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitPlan {
    pub heights: Vec<u32>,
}

impl SplitPlan {
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn total_height(&self) -> u64 {
        self.heights.iter().map(|&h| h as u64).sum()
    }

    /// `(top, height)` of every segment, in canvas rows
    pub fn bounds(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.heights.iter().scan(0u32, |top, &h| {
            let start = *top;
            *top += h;
            Some((start, h))
        })
    }

    /// Internal cut rows (boundaries between consecutive segments)
    pub fn cuts(&self) -> Vec<u32> {
        self.bounds().skip(1).map(|(top, _)| top).collect()
    }
}

/// Copy one segment out of the canvas.
pub fn slice_segment(canvas: &RgbaImage, top: u32, height: u32) -> RgbaImage {
    image::imageops::crop_imm(canvas, 0, top, canvas.width(), height).to_image()
}

/// Plan every cut over a luminance projection.
///
/// Cuts advance while `offset + nominal < canvas height`; the remainder becomes
/// the final segment.
pub fn plan_splits(
    luma: &GrayImage,
    settings: &SplitSettings,
    exclusions: &mut dyn ExclusionSource,
) -> SplitPlan {
    let canvas_rows = luma.height();
    let nominal = settings.nominal_height.max(1);
    let mut heights = Vec::new();
    let mut offset: u32 = 0;

    while (offset as u64) + (nominal as u64) < canvas_rows as u64 {
        let ranges = exclusions.exclusions_near(offset + nominal);
        let height = match settings.strategy {
            SplitStrategy::Nudge => nudge_search(luma, offset, settings, &ranges),
            SplitStrategy::Windowed => windowed_search(luma, offset, settings, &ranges),
        };
        debug!(
            "Cut at row {} (segment height {}, {} protected ranges)",
            offset + height,
            height,
            ranges.len()
        );
        heights.push(height);
        offset += height;
    }

    let remaining_rows = canvas_rows - offset;
    if remaining_rows > 0 {
        heights.push(remaining_rows);
    }

    info!(
        "Planned {} segments over {} rows ({} strategy)",
        heights.len(),
        canvas_rows,
        settings.strategy
    );
    SplitPlan { heights }
}

fn is_protected(ranges: &[ExclusionRange], cut_row: u32) -> bool {
    ranges.iter().any(|r| r.blocks_cut(cut_row))
}

/// Iterative nudge: shrink from nominal by scan-step, and once past the floor
/// restart from nominal growing instead.
fn nudge_search(
    luma: &GrayImage,
    offset: u32,
    settings: &SplitSettings,
    ranges: &[ExclusionRange],
) -> u32 {
    let nominal = settings.nominal_height as i64;
    let step = settings.scan_step as i64;
    let floor = settings.tuning.floor_ratio * nominal as f64;
    let last_row = luma.height() as i64 - 1;
    let ignorable = settings.ignorable_pixels as usize;

    let mut height = nominal;
    let mut growing = false;
    loop {
        let cut_row = offset as i64 + height;
        if cut_row > last_row {
            trace!("Nudge ran past the canvas from offset {}", offset);
            return fallback_height(offset, settings, ranges, luma.height());
        }
        let cut_row = cut_row as u32;
        if !is_protected(ranges, cut_row)
            && !row_is_busy(row(luma, cut_row), ignorable, settings.threshold)
        {
            return height as u32;
        }
        if growing {
            height += step;
        } else {
            height -= step;
            if (height as f64) < floor {
                height = nominal + step;
                growing = true;
            }
        }
    }
}

/// Windowed scoring: rank every row near the nominal cut by neighbour delta
/// plus a distance penalty.
fn windowed_search(
    luma: &GrayImage,
    offset: u32,
    settings: &SplitSettings,
    ranges: &[ExclusionRange],
) -> u32 {
    let tuning = &settings.tuning;
    let nominal_row = offset + settings.nominal_height;
    let window = ((tuning.window_ratio * settings.nominal_height as f64).round() as u32)
        .max(tuning.window_min_steps * settings.scan_step);
    let half_window = window / 2;
    let low = nominal_row
        .saturating_sub(half_window)
        .max(offset + settings.floor_height());
    let high = nominal_row
        .saturating_add(half_window)
        .min(luma.height().saturating_sub(1));

    let dark_cap = tuning.dark_ratio_cap * settings.sensitivity as f64 / 100.0;
    let ignorable = settings.ignorable_pixels as usize;
    let stride = tuning.sample_stride as usize;

    // (score, distance, row)
    let mut best: Option<(f64, u32, u32)> = None;
    for cut_row in low..=high {
        if is_protected(ranges, cut_row) {
            continue;
        }
        let stats = row_stats(row(luma, cut_row), ignorable, stride, tuning.dark_level);
        if stats.dark_ratio > dark_cap && stats.mean_delta > settings.threshold as f64 {
            continue;
        }
        let distance = cut_row.abs_diff(nominal_row);
        let score = stats.mean_delta + tuning.distance_weight * distance as f64;
        let better = match best {
            None => true,
            Some((best_score, best_distance, best_row)) => {
                score < best_score
                    || (score == best_score
                        && (distance, cut_row) < (best_distance, best_row))
            }
        };
        if better {
            best = Some((score, distance, cut_row));
        }
    }

    match best {
        Some((_, _, cut_row)) => cut_row - offset,
        None => {
            trace!("No row qualified in window {}..={}", low, high);
            fallback_height(offset, settings, ranges, luma.height())
        }
    }
}

/// Nominal height, unless the nominal row is protected and a boundary of the
/// protecting range is usable.
fn fallback_height(
    offset: u32,
    settings: &SplitSettings,
    ranges: &[ExclusionRange],
    canvas_rows: u32,
) -> u32 {
    let nominal = settings.nominal_height;
    let nominal_row = offset + nominal;
    let Some(range) = ranges.iter().find(|r| r.blocks_cut(nominal_row)) else {
        return nominal;
    };
    if range.start > offset && range.start - offset >= settings.floor_height() {
        return range.start - offset;
    }
    if range.end < canvas_rows {
        return range.end - offset;
    }
    nominal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::StitchParams;
    use image::Luma;

    const WIDTH: u32 = 32;

    /// Busy rows carry a hard black/white stripe pattern, the rest are flat.
    fn luma_with(height: u32, busy: impl Fn(u32) -> bool) -> GrayImage {
        GrayImage::from_fn(WIDTH, height, |x, y| {
            if busy(y) {
                Luma([if x % 2 == 0 { 0 } else { 255 }])
            } else {
                Luma([200])
            }
        })
    }

    fn settings(nominal: u32, strategy: SplitStrategy) -> SplitSettings {
        SplitSettings::from_params(&StitchParams {
            split_height: nominal,
            strategy,
            ..StitchParams::default()
        })
    }

    fn assert_invariants(plan: &SplitPlan, canvas_rows: u32, s: &SplitSettings) {
        assert_eq!(plan.total_height(), canvas_rows as u64);
        let (last, rest) = plan.heights.split_last().unwrap();
        assert!(*last > 0);
        for &h in rest {
            assert!(h == s.nominal_height || h >= s.floor_height(), "height {} below floor", h);
        }
    }

    #[test]
    fn flat_canvas_splits_at_nominal() {
        let luma = luma_with(3500, |_| false);
        let s = settings(1000, SplitStrategy::Nudge);
        let plan = plan_splits(&luma, &s, &mut NoExclusions);
        assert_eq!(plan.heights, vec![1000, 1000, 1000, 500]);
        assert_eq!(plan.cuts(), vec![1000, 2000, 3000]);
    }

    #[test]
    fn exact_multiple_leaves_full_final_segment() {
        let luma = luma_with(3000, |_| false);
        let plan = plan_splits(&luma, &settings(1000, SplitStrategy::Nudge), &mut NoExclusions);
        assert_eq!(plan.heights, vec![1000, 1000, 1000]);
    }

    #[test]
    fn short_canvas_is_single_segment() {
        let luma = luma_with(400, |_| true);
        let plan = plan_splits(&luma, &settings(1000, SplitStrategy::Nudge), &mut NoExclusions);
        assert_eq!(plan.heights, vec![400]);
    }

    #[test]
    fn nudge_shrinks_off_a_busy_row() {
        let luma = luma_with(2500, |y| (998..=1002).contains(&y));
        let s = settings(1000, SplitStrategy::Nudge);
        let plan = plan_splits(&luma, &s, &mut NoExclusions);
        assert_eq!(plan.heights[0], 995);
        assert_invariants(&plan, 2500, &s);
    }

    #[test]
    fn nudge_grows_when_everything_above_floor_is_busy() {
        let luma = luma_with(2500, |y| (300..=1007).contains(&y));
        let s = settings(1000, SplitStrategy::Nudge);
        let plan = plan_splits(&luma, &s, &mut NoExclusions);
        assert_eq!(plan.heights[0], 1010);
        assert_invariants(&plan, 2500, &s);
    }

    #[test]
    fn nudge_steps_out_of_exclusion_range() {
        let luma = luma_with(2500, |_| false);
        let s = settings(1000, SplitStrategy::Nudge);
        let mut ranges = vec![ExclusionRange::new(900, 1100)];
        let plan = plan_splits(&luma, &s, &mut ranges);
        assert_eq!(plan.heights[0], 900);
        for cut in plan.cuts() {
            assert!(!ranges[0].blocks_cut(cut));
        }
    }

    #[test]
    fn fallback_cuts_at_range_boundary_when_search_fails() {
        let luma = luma_with(2500, |_| true);
        let s = settings(1000, SplitStrategy::Nudge);
        let mut ranges = vec![ExclusionRange::new(850, 1050)];
        let plan = plan_splits(&luma, &s, &mut ranges);
        assert_eq!(plan.heights[0], 850);
        assert_invariants(&plan, 2500, &s);
    }

    #[test]
    fn windowed_prefers_the_quiet_row_nearest_nominal() {
        let luma = luma_with(2500, |y| (980..=1020).contains(&y) && y != 1003);
        let s = settings(1000, SplitStrategy::Windowed);
        let plan = plan_splits(&luma, &s, &mut NoExclusions);
        assert_eq!(plan.heights[0], 1003);
        assert_invariants(&plan, 2500, &s);
    }

    #[test]
    fn windowed_search_stays_inside_its_window() {
        // 15% of 1000 spans rows 925..=1075; the quiet row at 920 is outside it
        let luma = luma_with(2500, |y| (900..=1100).contains(&y) && y != 920);
        let s = settings(1000, SplitStrategy::Windowed);
        let plan = plan_splits(&luma, &s, &mut NoExclusions);
        assert_eq!(plan.heights[0], 1000);

        let luma = luma_with(2500, |y| (900..=1100).contains(&y) && y != 930);
        let plan = plan_splits(&luma, &s, &mut NoExclusions);
        assert_eq!(plan.heights[0], 930);
    }

    #[test]
    fn windowed_keeps_nominal_on_flat_canvas() {
        let luma = luma_with(2500, |_| false);
        let s = settings(1000, SplitStrategy::Windowed);
        let plan = plan_splits(&luma, &s, &mut NoExclusions);
        assert_eq!(plan.heights, vec![1000, 1000, 500]);
    }

    #[test]
    fn windowed_avoids_protected_rows() {
        let luma = luma_with(2500, |_| false);
        let s = settings(1000, SplitStrategy::Windowed);
        let mut ranges = vec![ExclusionRange::new(960, 1060)];
        let plan = plan_splits(&luma, &s, &mut ranges);
        assert_eq!(plan.heights[0], 960);
        assert_invariants(&plan, 2500, &s);
    }

    #[test]
    fn planning_is_deterministic_and_respects_invariants() {
        // xorshift so the busy pattern is irregular but repeatable
        let mut state: u32 = 0x9e37_79b9;
        let pattern: Vec<bool> = (0..12_000)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state % 3 == 0
            })
            .collect();
        let luma = luma_with(12_000, |y| pattern[y as usize]);

        for strategy in [SplitStrategy::Nudge, SplitStrategy::Windowed] {
            for nominal in [700, 1000, 2500] {
                let s = settings(nominal, strategy);
                let ranges = vec![
                    ExclusionRange::new(1500, 1720),
                    ExclusionRange::new(4000, 4100),
                    ExclusionRange::new(6900, 7300),
                ];
                let first = plan_splits(&luma, &s, &mut ranges.clone());
                let second = plan_splits(&luma, &s, &mut ranges.clone());
                assert_eq!(first, second);
                assert_invariants(&first, 12_000, &s);
                for cut in first.cuts() {
                    assert!(
                        ranges.iter().all(|r| !r.blocks_cut(cut)),
                        "{:?} nominal {} cut {} inside a protected range",
                        strategy,
                        nominal,
                        cut
                    );
                }
            }
        }
    }

    #[test]
    fn slices_follow_plan_bounds() {
        let canvas = RgbaImage::from_fn(4, 10, |_, y| image::Rgba([y as u8, 0, 0, 255]));
        let plan = SplitPlan { heights: vec![6, 4] };
        let segments: Vec<_> = plan
            .bounds()
            .map(|(top, h)| slice_segment(&canvas, top, h))
            .collect();
        assert_eq!(segments[0].dimensions(), (4, 6));
        assert_eq!(segments[1].dimensions(), (4, 4));
        assert_eq!(segments[1].get_pixel(0, 0)[0], 6);
    }
}
