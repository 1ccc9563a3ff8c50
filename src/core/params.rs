use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{OutputFormat, SplitStrategy, WidthEnforcement};

/// Stitching parameters suitable for config files and host-application presets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchParams {
    /// Nominal output segment height in pixels
    pub split_height: u32,
    pub output_format: OutputFormat,
    pub width_enforcement: WidthEnforcement,
    /// Target width for `WidthEnforcement::Custom`
    pub custom_width: u32,
    /// 0-100; higher tolerates more pixel discontinuity at a cut row
    pub sensitivity: u8,
    /// Columns skipped on both edges when scanning a row
    pub ignorable_pixels: u32,
    /// 1-20; rows moved per search step
    pub scan_step: u32,
    pub strategy: SplitStrategy,
    /// Process the folder in batches of `batch_unit_size` frames
    pub bounded_memory: bool,
    pub batch_unit_size: usize,
    /// Output name template; `None` means `{num}`
    pub filename_template: Option<String>,
    pub tuning: SplitTuning,
    pub detector: DetectorParams,
}

impl Default for StitchParams {
    fn default() -> Self {
        Self {
            split_height: 5000,
            output_format: OutputFormat::Png,
            width_enforcement: WidthEnforcement::None,
            custom_width: 720,
            sensitivity: 90,
            ignorable_pixels: 0,
            scan_step: 5,
            strategy: SplitStrategy::Nudge,
            bounded_memory: false,
            batch_unit_size: 20,
            filename_template: None,
            tuning: SplitTuning::default(),
            detector: DetectorParams::default(),
        }
    }
}

impl StitchParams {
    /// Load parameters from a JSON file; missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let params: StitchParams = serde_json::from_str(&text)?;
        params.validate()?;
        Ok(params)
    }

    /// Reject configurations that cannot produce a valid split plan.
    pub fn validate(&self) -> Result<()> {
        if self.split_height == 0 {
            return Err(invalid("split_height", self.split_height));
        }
        if self.sensitivity > 100 {
            return Err(invalid("sensitivity", self.sensitivity));
        }
        if !(1..=20).contains(&self.scan_step) {
            return Err(invalid("scan_step", self.scan_step));
        }
        if self.batch_unit_size == 0 {
            return Err(invalid("batch_unit_size", self.batch_unit_size));
        }
        if self.width_enforcement == WidthEnforcement::Custom && self.custom_width == 0 {
            return Err(invalid("custom_width", self.custom_width));
        }
        if !(self.tuning.floor_ratio > 0.0 && self.tuning.floor_ratio <= 1.0) {
            return Err(invalid("tuning.floor_ratio", self.tuning.floor_ratio));
        }
        if self.tuning.sample_stride == 0 {
            return Err(invalid("tuning.sample_stride", self.tuning.sample_stride));
        }
        if !(0.0..=1.0).contains(&self.detector.confidence_threshold) {
            return Err(invalid(
                "detector.confidence_threshold",
                self.detector.confidence_threshold,
            ));
        }
        if !(0.0..=1.0).contains(&self.detector.iou_threshold) {
            return Err(invalid("detector.iou_threshold", self.detector.iou_threshold));
        }
        if self.detector.input_size == 0 {
            return Err(invalid("detector.input_size", self.detector.input_size));
        }
        Ok(())
    }

    /// Luminance delta above which a row counts as busy.
    pub fn threshold(&self) -> i32 {
        (255.0 * (1.0 - self.sensitivity as f64 / 100.0)) as i32
    }
}

fn invalid(arg: &'static str, value: impl ToString) -> Error {
    Error::InvalidArgument {
        arg,
        value: value.to_string(),
    }
}

/// Empirically tuned constants of the cut search
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitTuning {
    /// Shortest non-final segment, as a fraction of the nominal height
    pub floor_ratio: f64,
    /// Full width of the windowed search, centred on the nominal cut, as a
    /// fraction of the nominal height
    pub window_ratio: f64,
    /// Lower bound on the window width, in scan steps
    pub window_min_steps: u32,
    /// Luminance below which a pixel counts as dark
    pub dark_level: u8,
    /// Dark-pixel ratio allowed at sensitivity 100
    pub dark_ratio_cap: f64,
    /// Score penalty per row of distance from the nominal cut
    pub distance_weight: f64,
    /// Column stride used when sampling a row in the windowed search
    pub sample_stride: u32,
}

impl Default for SplitTuning {
    fn default() -> Self {
        Self {
            floor_ratio: 0.4,
            window_ratio: 0.15,
            window_min_steps: 3,
            dark_level: 64,
            dark_ratio_cap: 0.6,
            distance_weight: 0.2,
            sample_stride: 2,
        }
    }
}

/// Bubble/text detector settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// ONNX model artifact; `None` disables avoidance
    pub model_path: Option<PathBuf>,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    /// Square model input side in pixels
    pub input_size: u32,
    /// Rows added above and below each detected box
    pub row_padding: u32,
    /// Probe crop extent above the tentative cut
    pub probe_above: u32,
    /// Probe crop extent below the tentative cut
    pub probe_below: u32,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            model_path: None,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            input_size: 640,
            row_padding: 8,
            probe_above: 1500,
            probe_below: 500,
        }
    }
}
