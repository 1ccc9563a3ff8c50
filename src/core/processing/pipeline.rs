//! One stitching job: frames -> resize -> combine -> plan cuts -> encode.
use std::path::{Path, PathBuf};

use image::RgbaImage;
use tracing::info;

use crate::core::params::StitchParams;
use crate::core::processing::combine::combine_images;
use crate::core::processing::ops::luminance;
use crate::core::processing::resize::{resize_to_width, resolve_target_width};
use crate::core::processing::save::save_segments;
use crate::core::processing::split::{SplitPlan, SplitSettings, plan_splits, slice_segment};
use crate::detection::{DetectorProbe, ExclusionDetector};
use crate::error::{Error, Result, StageContext};
use crate::io::loader::{list_image_files, load_frames};
use crate::io::progress::ProgressTracker;
use crate::io::writers::NamingContext;

/// Shared state of a job over one input folder.
///
/// The detector is built once by the caller and reused for every probe.
pub struct Stitcher<'a> {
    pub(crate) params: &'a StitchParams,
    pub(crate) settings: SplitSettings,
    pub(crate) detector: &'a mut dyn ExclusionDetector,
    pub(crate) input_folder: PathBuf,
    pub(crate) output_folder: PathBuf,
    pub(crate) naming: NamingContext,
}

impl<'a> Stitcher<'a> {
    pub fn new(
        params: &'a StitchParams,
        detector: &'a mut dyn ExclusionDetector,
        input_folder: &Path,
        output_folder: &Path,
    ) -> Self {
        let parent = input_folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            params,
            settings: SplitSettings::from_params(params),
            detector,
            input_folder: input_folder.to_path_buf(),
            output_folder: output_folder.to_path_buf(),
            naming: NamingContext::new(params.filename_template.as_deref(), parent),
        }
    }

    pub fn input_folder(&self) -> &Path {
        &self.input_folder
    }

    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    /// Input files of the job; an empty folder is an error.
    pub fn input_files(&self) -> Result<Vec<PathBuf>> {
        let files = list_image_files(&self.input_folder)?;
        if files.is_empty() {
            return Err(Error::EmptyInput {
                path: self.input_folder.clone(),
            });
        }
        Ok(files)
    }

    /// Resize and combine a sequence, then plan cuts over the canvas.
    pub fn build_canvas(
        &mut self,
        frames: Vec<RgbaImage>,
        target_width: Option<u32>,
    ) -> Result<(RgbaImage, SplitPlan)> {
        let folder = self.input_folder.clone();
        let frames = resize_to_width(frames, target_width).stage("resize", &folder)?;
        if frames.is_empty() {
            return Err(Error::EmptyInput { path: folder });
        }
        let canvas = combine_images(frames).stage("combine", &folder)?;
        let plan = self.plan(&canvas);
        Ok((canvas, plan))
    }

    /// Plan cuts over a canvas, probing the detector near each tentative cut.
    pub fn plan(&mut self, canvas: &RgbaImage) -> SplitPlan {
        let luma = luminance(canvas);
        let mut probe = DetectorProbe::from_params(canvas, &mut *self.detector, &self.params.detector);
        plan_splits(&luma, &self.settings, &mut probe)
    }

    /// Slice and encode the first `count` segments of `plan`, one at a time.
    pub(crate) fn save_plan(
        &self,
        canvas: &RgbaImage,
        plan: &SplitPlan,
        count: usize,
        offset: usize,
        progress: &mut ProgressTracker<'_>,
    ) -> Result<usize> {
        let segments = plan
            .bounds()
            .take(count)
            .map(|(top, height)| slice_segment(canvas, top, height));
        save_segments(
            segments,
            &self.output_folder,
            self.params.output_format,
            &self.naming,
            offset,
            progress,
        )
    }

    /// Whole folder in memory at once. Returns the number of segments written.
    pub fn run_unbounded(&mut self, progress: &mut ProgressTracker<'_>) -> Result<usize> {
        let files = self.input_files()?;
        let frames = load_frames(&files);
        if frames.is_empty() {
            return Err(Error::EmptyInput {
                path: self.input_folder.clone(),
            });
        }
        let target_width = resolve_target_width(
            self.params.width_enforcement,
            frames.iter().map(|f| f.width()),
            self.params.custom_width,
        );

        let (canvas, plan) = self.build_canvas(frames, target_width)?;
        progress.add_total(plan.len() as u64);
        let written = self.save_plan(&canvas, &plan, plan.len(), 0, progress)?;
        info!(
            "Stitched {} files from {:?} into {} segments",
            files.len(),
            self.input_folder,
            written
        );
        Ok(written)
    }
}
