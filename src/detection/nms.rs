/// Axis-aligned box in pixel coordinates with its confidence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
}

impl Detection {
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32, score: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
            score,
        }
    }

    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }
}

pub fn iou(a: &Detection, b: &Detection) -> f32 {
    let ix1 = a.x1.max(b.x1);
    let iy1 = a.y1.max(b.y1);
    let ix2 = a.x2.min(b.x2);
    let iy2 = a.y2.min(b.y2);
    let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
    let union = a.area() + b.area() - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}

/// Greedy non-maximum suppression: keep the most confident box, drop every
/// remaining box overlapping it by more than `iou_threshold`, repeat.
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        if kept.iter().all(|k| iou(k, &candidate) <= iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bx(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Detection {
        Detection { x1, y1, x2, y2, score }
    }

    #[test]
    fn overlapping_boxes_keep_most_confident() {
        let kept = non_max_suppression(
            vec![
                bx(0.0, 0.0, 100.0, 100.0, 0.6),
                bx(5.0, 5.0, 105.0, 105.0, 0.9),
                bx(300.0, 300.0, 350.0, 350.0, 0.3),
            ],
            0.45,
        );
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 0.9);
        assert_eq!(kept[1].score, 0.3);
    }

    #[test]
    fn iou_of_disjoint_and_identical_boxes() {
        let a = bx(0.0, 0.0, 10.0, 10.0, 1.0);
        assert_eq!(iou(&a, &bx(20.0, 20.0, 30.0, 30.0, 1.0)), 0.0);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn center_form_converts_to_corners() {
        let d = Detection::from_center(50.0, 40.0, 20.0, 10.0, 0.5);
        assert_eq!((d.x1, d.y1, d.x2, d.y2), (40.0, 35.0, 60.0, 45.0));
    }
}
