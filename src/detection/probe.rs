use image::RgbaImage;
use tracing::trace;

use super::{ExclusionDetector, ExclusionRange, merge_ranges};
use crate::core::params::DetectorParams;
use crate::core::processing::split::ExclusionSource;

/// Runs a detector on a local crop around each tentative cut and reports the
/// results in canvas rows, so cost does not grow with canvas length.
pub struct DetectorProbe<'a> {
    canvas: &'a RgbaImage,
    detector: &'a mut dyn ExclusionDetector,
    above: u32,
    below: u32,
}

impl<'a> DetectorProbe<'a> {
    pub fn new(canvas: &'a RgbaImage, detector: &'a mut dyn ExclusionDetector, above: u32, below: u32) -> Self {
        Self {
            canvas,
            detector,
            above,
            below,
        }
    }

    pub fn from_params(
        canvas: &'a RgbaImage,
        detector: &'a mut dyn ExclusionDetector,
        params: &DetectorParams,
    ) -> Self {
        Self::new(canvas, detector, params.probe_above, params.probe_below)
    }

    /// Canvas rows `[top, bottom)` inspected for a cut at `cut_row`
    pub fn window(&self, cut_row: u32) -> (u32, u32) {
        let rows = self.canvas.height();
        let top = cut_row.saturating_sub(self.above).min(rows);
        let bottom = cut_row.saturating_add(self.below).min(rows);
        (top, bottom)
    }
}

impl ExclusionSource for DetectorProbe<'_> {
    fn exclusions_near(&mut self, cut_row: u32) -> Vec<ExclusionRange> {
        let (top, bottom) = self.window(cut_row);
        if bottom <= top || self.canvas.width() == 0 {
            return Vec::new();
        }
        let region = image::imageops::crop_imm(self.canvas, 0, top, self.canvas.width(), bottom - top);
        let local = self.detector.detect(&region);
        trace!(
            "Probe rows {}..{} for cut {}: {} ranges from {}",
            top,
            bottom,
            cut_row,
            local.len(),
            self.detector.name()
        );
        merge_ranges(local.into_iter().map(|r| r.shifted(top)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, SubImage};

    /// Protects rows 10..20 of whatever region it is given, recording region heights
    struct FixedDetector {
        seen: Vec<u32>,
    }

    impl ExclusionDetector for FixedDetector {
        fn detect(&mut self, region: &SubImage<&RgbaImage>) -> Vec<ExclusionRange> {
            self.seen.push(region.height());
            vec![ExclusionRange::new(10, 20)]
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn local_ranges_are_translated_to_canvas_rows() {
        let canvas = RgbaImage::from_pixel(8, 5000, Rgba([255, 255, 255, 255]));
        let mut detector = FixedDetector { seen: Vec::new() };
        let mut probe = DetectorProbe::new(&canvas, &mut detector, 1500, 500);
        assert_eq!(probe.window(2000), (500, 2500));
        assert_eq!(probe.exclusions_near(2000), vec![ExclusionRange::new(510, 520)]);
        assert_eq!(probe.window(4800), (3300, 5000));
        assert_eq!(probe.exclusions_near(1000), vec![ExclusionRange::new(10, 20)]);
        drop(probe);
        assert_eq!(detector.seen, vec![2000, 1500]);
    }
}
