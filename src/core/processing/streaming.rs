//! Bounded-memory mode: process the folder in batches of frames, carrying the
//! last segment of each batch over as the first frame of the next.
use image::RgbaImage;
use tracing::{debug, info};

use crate::core::processing::pipeline::Stitcher;
use crate::core::processing::resize::resolve_target_width;
use crate::core::processing::split::slice_segment;
use crate::error::{Error, Result};
use crate::io::loader::{header_widths, load_frames};
use crate::io::progress::ProgressTracker;
use crate::types::WidthEnforcement;

/// Cursor over the file list plus the carried bridge frame.
#[derive(Debug, Default)]
struct Window {
    cursor: usize,
    bridge: Option<RgbaImage>,
    save_offset: usize,
}

impl Stitcher<'_> {
    /// Run the job in batches of `batch_unit_size` files.
    ///
    /// `should_continue` is consulted before every batch; returning `false`
    /// stops the job with [`Error::Cancelled`]. Returns the number of segments
    /// written.
    pub fn run_bounded(
        &mut self,
        progress: &mut ProgressTracker<'_>,
        should_continue: &mut dyn FnMut() -> bool,
    ) -> Result<usize> {
        let files = self.input_files()?;
        let unit = self.params.batch_unit_size.max(1);

        // One width for every batch so the bridge frame always fits
        let target_width = match self.params.width_enforcement {
            WidthEnforcement::MatchMinimum => resolve_target_width(
                WidthEnforcement::MatchMinimum,
                header_widths(&files),
                self.params.custom_width,
            ),
            mode => resolve_target_width(mode, std::iter::empty(), self.params.custom_width),
        };
        info!(
            "Streaming {} files in batches of {} (target width {:?})",
            files.len(),
            unit,
            target_width
        );

        let mut window = Window::default();
        let mut batch = 0usize;
        loop {
            if !should_continue() {
                info!("Cancelled before batch {}", batch + 1);
                return Err(Error::Cancelled {
                    segments_written: window.save_offset,
                });
            }
            batch += 1;

            let end = (window.cursor + unit).min(files.len());
            let paths = &files[window.cursor..end];
            let exhausted = paths.len() < unit || end >= files.len();
            window.cursor = end;

            let mut frames = Vec::with_capacity(paths.len() + 1);
            frames.extend(window.bridge.take());
            frames.extend(load_frames(paths));
            if frames.is_empty() {
                if window.save_offset == 0 && exhausted {
                    return Err(Error::EmptyInput {
                        path: self.input_folder.clone(),
                    });
                }
                if exhausted {
                    break;
                }
                continue;
            }

            let (canvas, plan) = self.build_canvas(frames, target_width)?;
            let persist = if exhausted {
                plan.len()
            } else {
                plan.len().saturating_sub(1)
            };
            debug!(
                "Batch {}: {} files, canvas {}x{}, {} segments ({} persisted now)",
                batch,
                paths.len(),
                canvas.width(),
                canvas.height(),
                plan.len(),
                persist
            );

            progress.add_total(persist as u64);
            window.save_offset =
                self.save_plan(&canvas, &plan, persist, window.save_offset, progress)?;

            if !exhausted {
                if let Some((top, height)) = plan.bounds().last() {
                    window.bridge = Some(slice_segment(&canvas, top, height));
                }
            }
            drop(canvas);

            if exhausted {
                break;
            }
        }

        info!(
            "Stitched {} files from {:?} into {} segments over {} batches",
            files.len(),
            self.input_folder,
            window.save_offset,
            batch
        );
        Ok(window.save_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::StitchParams;
    use crate::detection::NoDetector;
    use crate::io::progress::NoProgress;
    use image::Rgba;

    fn write_frames(dir: &std::path::Path, count: usize, height: u32) {
        for i in 1..=count {
            RgbaImage::from_pixel(20, height, Rgba([240, 240, 240, 255]))
                .save(dir.join(format!("{}.png", i)))
                .unwrap();
        }
    }

    #[test]
    fn cancellation_between_batches_reports_written_segments() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir(&input).unwrap();
        write_frames(&input, 6, 100);
        let params = StitchParams {
            split_height: 100,
            bounded_memory: true,
            batch_unit_size: 2,
            ..StitchParams::default()
        };
        let mut detector = NoDetector;
        let out = dir.path().join("out");
        let mut stitcher = Stitcher::new(&params, &mut detector, &input, &out);
        let mut sink = NoProgress;
        let mut progress = ProgressTracker::new(&mut sink);

        let mut calls = 0;
        let mut should_continue = || {
            calls += 1;
            calls <= 1
        };
        let result = stitcher.run_bounded(&mut progress, &mut should_continue);
        // First batch: two 100px frames -> two segments, one kept as bridge
        assert!(matches!(
            result,
            Err(Error::Cancelled {
                segments_written: 1
            })
        ));
        assert!(out.join("01.png").is_file());
        assert!(!out.join("02.png").exists());
    }

    #[test]
    fn single_short_batch_persists_everything() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 3, 100);
        let params = StitchParams {
            split_height: 120,
            bounded_memory: true,
            batch_unit_size: 10,
            ..StitchParams::default()
        };
        let mut detector = NoDetector;
        let out = dir.path().join("out");
        let mut stitcher = Stitcher::new(&params, &mut detector, dir.path(), &out);
        let mut sink = NoProgress;
        let mut progress = ProgressTracker::new(&mut sink);

        let written = stitcher.run_bounded(&mut progress, &mut || true).unwrap();
        assert_eq!(written, 3);
        assert_eq!(progress.state().processed, 3);
    }
}
