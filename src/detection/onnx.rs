//! YOLO-style comic bubble/text detector backed by ONNX Runtime.
use std::path::Path;

use image::{RgbaImage, SubImage};
use ndarray::Array4;
use ort::session::{Session, builder::GraphOptimizationLevel};
use tracing::{debug, info, warn};

use super::letterbox::{letterbox, to_chw_f32};
use super::nms::{Detection, non_max_suppression};
use super::{ExclusionDetector, ExclusionRange, merge_ranges};
use crate::core::params::DetectorParams;
use crate::error::{Error, Result};

pub struct OnnxBubbleDetector {
    session: Session,
    input_name: String,
    output_name: String,
    input_size: u32,
    confidence: f32,
    iou_threshold: f32,
    row_padding: u32,
}

impl OnnxBubbleDetector {
    /// Build the inference session once; it is reused for every probe.
    pub fn load(model_path: &Path, params: &DetectorParams) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(num_cpus::get().max(1))?
            .with_inter_threads(1)?
            .commit_from_file(model_path)?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| Error::Detector("model declares no inputs".to_string()))?;
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| Error::Detector("model declares no outputs".to_string()))?;

        info!(
            "Loaded detector model {:?} (input '{}', output '{}')",
            model_path, input_name, output_name
        );
        Ok(Self {
            session,
            input_name,
            output_name,
            input_size: params.input_size,
            confidence: params.confidence_threshold,
            iou_threshold: params.iou_threshold,
            row_padding: params.row_padding,
        })
    }

    fn infer(&mut self, region: &RgbaImage) -> Result<Vec<ExclusionRange>> {
        let size = self.input_size;
        let (boxed, geometry) = letterbox(region, size)?;
        let tensor = Array4::from_shape_vec(
            (1, 3, size as usize, size as usize),
            to_chw_f32(&boxed),
        )
        .map_err(|e| Error::Detector(e.to_string()))?;
        drop(boxed);

        let input = ort::value::Value::from_array(tensor)?;
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input])?;
        let (shape, data) = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()?;
        let dims: Vec<i64> = shape.to_vec();

        let candidates = decode_predictions(&dims, data, self.confidence, size)?;
        let kept = non_max_suppression(candidates, self.iou_threshold);
        debug!("Detector kept {} boxes after NMS", kept.len());

        let rows = region.height();
        let ranges = kept
            .iter()
            .filter_map(|d| geometry.source_rows(d))
            .map(|(y1, y2)| {
                ExclusionRange::new(
                    y1.saturating_sub(self.row_padding),
                    (y2 + self.row_padding).min(rows),
                )
            })
            .collect();
        Ok(merge_ranges(ranges))
    }
}

impl ExclusionDetector for OnnxBubbleDetector {
    fn detect(&mut self, region: &SubImage<&RgbaImage>) -> Vec<ExclusionRange> {
        let crop = region.to_image();
        match self.infer(&crop) {
            Ok(ranges) => ranges,
            Err(e) => {
                warn!("Bubble detection failed, cutting without protection: {}", e);
                Vec::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "onnx"
    }
}

/// Decode a raw `[1, C, N]` or `[1, N, C]` prediction tensor into candidate
/// boxes in letterboxed pixel space, dropping those under `confidence`.
///
/// Each candidate is `(cx, cy, w, h, objectness, class scores...)`.
pub fn decode_predictions(
    dims: &[i64],
    data: &[f32],
    confidence: f32,
    input_size: u32,
) -> Result<Vec<Detection>> {
    let (a, b) = match dims {
        [1, a, b] | [a, b] => (*a as usize, *b as usize),
        _ => {
            return Err(Error::Detector(format!(
                "unexpected prediction shape {:?}",
                dims
            )));
        }
    };
    if a * b != data.len() {
        return Err(Error::Detector(format!(
            "prediction shape {:?} does not match {} values",
            dims,
            data.len()
        )));
    }
    // Attribute axis is the short one
    let channels_first = a <= b;
    let (attrs, count) = if channels_first { (a, b) } else { (b, a) };
    if attrs < 5 {
        return Err(Error::Detector(format!(
            "predictions carry {} attributes, need at least 5",
            attrs
        )));
    }
    let at = |i: usize, k: usize| -> f32 {
        if channels_first {
            data[k * count + i]
        } else {
            data[i * attrs + k]
        }
    };

    let mut raw: Vec<[f32; 5]> = Vec::new();
    for i in 0..count {
        let mut score = at(i, 4);
        if attrs > 5 {
            let best_class = (5..attrs).map(|k| at(i, k)).fold(f32::MIN, f32::max);
            score *= best_class;
        }
        if score >= confidence {
            raw.push([at(i, 0), at(i, 1), at(i, 2), at(i, 3), score]);
        }
    }

    let normalized = raw.iter().all(|r| r[0] <= 1.0 && r[2] <= 1.0);
    let scale = if normalized { input_size as f32 } else { 1.0 };
    Ok(raw
        .into_iter()
        .map(|[cx, cy, w, h, score]| {
            Detection::from_center(cx * scale, cy * scale, w * scale, h * scale, score)
        })
        .collect())
}
