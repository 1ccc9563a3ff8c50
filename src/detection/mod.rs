//! Speech-bubble / text detection used to protect rows from being cut.
//!
//! Detection is a capability: [`ExclusionDetector`] turns an image region into
//! protected row ranges. [`NoDetector`] is the null object used whenever no
//! model is configured or the model cannot be loaded, so callers never branch
//! on detector presence. [`select_detector`] makes that choice once per job.
use std::path::Path;

use image::{RgbaImage, SubImage};
use tracing::{info, warn};

use crate::core::params::DetectorParams;

pub mod letterbox;
pub mod nms;
#[cfg(feature = "detector")]
pub mod onnx;
pub mod probe;

pub use probe::DetectorProbe;

/// Half-open interval `[start, end)` of protected rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExclusionRange {
    pub start: u32,
    pub end: u32,
}

impl ExclusionRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// A cut at `row` separates rows `row - 1` and `row`; it is protected when
    /// both sides belong to this range.
    pub fn blocks_cut(&self, row: u32) -> bool {
        self.start < row && row < self.end
    }

    pub fn shifted(&self, dy: u32) -> Self {
        Self::new(self.start + dy, self.end + dy)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Sort ranges and merge those that overlap or touch.
pub fn merge_ranges(mut ranges: Vec<ExclusionRange>) -> Vec<ExclusionRange> {
    ranges.retain(|r| !r.is_empty());
    ranges.sort();
    let mut merged: Vec<ExclusionRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

/// Turns an image region into protected row ranges local to that region.
pub trait ExclusionDetector {
    /// Never fails: inference problems yield an empty set.
    fn detect(&mut self, region: &SubImage<&RgbaImage>) -> Vec<ExclusionRange>;

    fn name(&self) -> &'static str;
}

/// Null detector: nothing is ever protected
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDetector;

impl ExclusionDetector for NoDetector {
    fn detect(&mut self, _region: &SubImage<&RgbaImage>) -> Vec<ExclusionRange> {
        Vec::new()
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Build the detector for a job, degrading to [`NoDetector`] when the model
/// is absent or fails to load.
pub fn select_detector(params: &DetectorParams) -> Box<dyn ExclusionDetector> {
    let Some(model_path) = params.model_path.as_deref() else {
        info!("Bubble avoidance disabled: no detector model configured");
        return Box::new(NoDetector);
    };
    if !model_path.is_file() {
        warn!(
            "Detector model not found at {:?}; continuing without bubble avoidance",
            model_path
        );
        return Box::new(NoDetector);
    }
    load_model(model_path, params)
}

#[cfg(feature = "detector")]
fn load_model(model_path: &Path, params: &DetectorParams) -> Box<dyn ExclusionDetector> {
    match onnx::OnnxBubbleDetector::load(model_path, params) {
        Ok(detector) => Box::new(detector),
        Err(e) => {
            warn!(
                "Failed to load detector model {:?}: {}; continuing without bubble avoidance",
                model_path, e
            );
            Box::new(NoDetector)
        }
    }
}

#[cfg(not(feature = "detector"))]
fn load_model(model_path: &Path, _params: &DetectorParams) -> Box<dyn ExclusionDetector> {
    warn!(
        "Built without the `detector` feature; ignoring model {:?}",
        model_path
    );
    Box::new(NoDetector)
}
