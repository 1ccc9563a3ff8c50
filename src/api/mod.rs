//! High-level, ergonomic library API: stitch one chapter folder or a whole
//! directory of chapters. Prefer these entrypoints over the low-level
//! processing modules when integrating stripcut.
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::params::StitchParams;
use crate::core::processing::pipeline::Stitcher;
use crate::detection::{ExclusionDetector, select_detector};
use crate::error::{Error, Result};
use crate::io::loader::natural_cmp;
use crate::io::progress::{ProgressSink, ProgressTracker};

/// Suffix of the folder a chapter is stitched into
pub const STITCHED_SUFFIX: &str = " [Stitched]";

/// Outcome of one stitched folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchReport {
    pub input_folder: PathBuf,
    pub output_folder: PathBuf,
    pub segments: usize,
}

/// Batch processing report
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub jobs: Vec<StitchReport>,
}

/// `<parent>/<name> [Stitched]` next to `input`
pub fn default_output_folder(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}{}", name, STITCHED_SUFFIX))
}

/// Stitch every image in `input` into re-paginated segments under `output`.
pub fn stitch_folder(
    input: &Path,
    output: &Path,
    params: &StitchParams,
    progress: &mut dyn ProgressSink,
) -> Result<StitchReport> {
    stitch_folder_with_cancel(input, output, params, progress, &mut || true)
}

/// Like [`stitch_folder`], consulting `should_continue` between batches in
/// bounded-memory mode.
pub fn stitch_folder_with_cancel(
    input: &Path,
    output: &Path,
    params: &StitchParams,
    progress: &mut dyn ProgressSink,
    should_continue: &mut dyn FnMut() -> bool,
) -> Result<StitchReport> {
    params.validate()?;
    let mut detector = select_detector(&params.detector);
    let mut tracker = ProgressTracker::new(progress);
    let report = run_job(
        input,
        output,
        params,
        detector.as_mut(),
        &mut tracker,
        should_continue,
    )?;
    tracker.finish();
    Ok(report)
}

/// Stitch one chapter on the caller's tracker. The caller calls `finish()`.
fn run_job(
    input: &Path,
    output: &Path,
    params: &StitchParams,
    detector: &mut dyn ExclusionDetector,
    tracker: &mut ProgressTracker<'_>,
    should_continue: &mut dyn FnMut() -> bool,
) -> Result<StitchReport> {
    info!(
        "Stitching {:?} -> {:?} (split {}, {}, {} detector, bounded: {})",
        input,
        output,
        params.split_height,
        params.output_format,
        detector.name(),
        params.bounded_memory
    );
    let mut stitcher = Stitcher::new(params, detector, input, output);
    let segments = if params.bounded_memory {
        stitcher.run_bounded(tracker, should_continue)?
    } else {
        stitcher.run_unbounded(tracker)?
    };
    Ok(StitchReport {
        input_folder: input.to_path_buf(),
        output_folder: output.to_path_buf(),
        segments,
    })
}

/// Immediate subfolders of `input_dir` in natural order, excluding stitched outputs.
pub fn chapter_folders(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(input_dir)? {
        let path = entry?.path();
        let is_output = path
            .file_name()
            .map(|n| n.to_string_lossy().ends_with(STITCHED_SUFFIX))
            .unwrap_or(false);
        if path.is_dir() && !is_output {
            dirs.push(path);
        }
    }
    dirs.sort_by(|a, b| {
        natural_cmp(
            &a.file_name().unwrap_or_default().to_string_lossy(),
            &b.file_name().unwrap_or_default().to_string_lossy(),
        )
    });
    Ok(dirs)
}

/// Stitch every chapter folder inside `input_dir` into
/// `output_dir/<chapter> [Stitched]`, sharing one detector across jobs.
/// If `continue_on_error` is true, failures are counted in the report and
/// processing continues; otherwise the first error is returned. Folders
/// without images are skipped.
pub fn stitch_directory(
    input_dir: &Path,
    output_dir: &Path,
    params: &StitchParams,
    continue_on_error: bool,
    progress: &mut dyn ProgressSink,
) -> Result<BatchReport> {
    stitch_directory_with_cancel(
        input_dir,
        output_dir,
        params,
        continue_on_error,
        progress,
        &mut || true,
    )
}

/// Like [`stitch_directory`], consulting `should_continue` before every
/// chapter and between batches in bounded-memory mode.
///
/// Progress accumulates over the whole directory and is marked done once,
/// after the last chapter. A stop request ends the run with
/// [`Error::Cancelled`] counting every segment written so far.
pub fn stitch_directory_with_cancel(
    input_dir: &Path,
    output_dir: &Path,
    params: &StitchParams,
    continue_on_error: bool,
    progress: &mut dyn ProgressSink,
    should_continue: &mut dyn FnMut() -> bool,
) -> Result<BatchReport> {
    params.validate()?;
    let mut detector = select_detector(&params.detector);
    let mut tracker = ProgressTracker::new(progress);
    let mut report = BatchReport::default();

    for chapter in chapter_folders(input_dir)? {
        let written: usize = report.jobs.iter().map(|job| job.segments).sum();
        if !should_continue() {
            info!("Cancelled before {:?}", chapter);
            return Err(Error::Cancelled {
                segments_written: written,
            });
        }
        let name = chapter
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = output_dir.join(format!("{}{}", name, STITCHED_SUFFIX));
        match run_job(
            &chapter,
            &output,
            params,
            detector.as_mut(),
            &mut tracker,
            should_continue,
        ) {
            Ok(job) => {
                report.processed += 1;
                report.jobs.push(job);
            }
            Err(Error::EmptyInput { path }) => {
                warn!("Skipping {:?}: no readable images", path);
                report.skipped += 1;
            }
            Err(Error::Cancelled { segments_written }) => {
                return Err(Error::Cancelled {
                    segments_written: written + segments_written,
                });
            }
            Err(e) => {
                report.errors += 1;
                if !continue_on_error {
                    return Err(e);
                }
                warn!("Failed to stitch {:?}: {}", chapter, e);
            }
        }
    }

    tracker.finish();
    info!(
        "Batch finished: {} processed, {} skipped, {} errors",
        report.processed, report.skipped, report.errors
    );
    Ok(report)
}
