use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Guards the IoU division when both boxes are degenerate.
const IOU_EPSILON: f32 = 1e-9;

/// Axis-aligned bounding box in pixel coordinates.
///
/// Stored as corners (TLBR / xyxy), which is what every detector in this
/// pipeline emits. Conversions are provided for:
/// - TLWH: Top-Left X, Top-Left Y, Width, Height
/// - XYAH: Center X, Center Y, Aspect Ratio (w/h), Height (Kalman state)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    /// Create a box from its corners.
    #[inline]
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a box from TLWH format.
    #[inline]
    pub fn from_tlwh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y + height,
        }
    }

    /// Create a box from XYAH format (center x, center y, aspect ratio, height).
    #[inline]
    pub fn from_xyah(cx: f32, cy: f32, aspect_ratio: f32, height: f32) -> Self {
        let width = aspect_ratio * height;
        Self {
            x1: cx - width / 2.0,
            y1: cy - height / 2.0,
            x2: cx + width / 2.0,
            y2: cy + height / 2.0,
        }
    }

    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    #[inline]
    pub fn to_tlwh(&self) -> [f32; 4] {
        [self.x1, self.y1, self.width(), self.height()]
    }

    /// Convert to XYAH format: (center_x, center_y, aspect_ratio, height).
    #[inline]
    pub fn to_xyah(&self) -> [f32; 4] {
        let (cx, cy) = self.center();
        let height = self.height();
        let aspect_ratio = if height > 0.0 {
            self.width() / height
        } else {
            0.0
        };
        [cx, cy, aspect_ratio, height]
    }

    /// Width, never negative.
    #[inline]
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    /// Height, never negative.
    #[inline]
    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Strict containment: points on the border are outside.
    #[inline]
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        self.x1 < x && x < self.x2 && self.y1 < y && y < self.y2
    }

    /// Calculate Intersection over Union (IoU) with another bounding box.
    pub fn iou(&self, other: &BBox) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let inter_area = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union_area = self.area() + other.area() - inter_area;

        if union_area > IOU_EPSILON {
            (inter_area / union_area).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Per-coordinate linear blend: `alpha * self + (1 - alpha) * previous`.
    #[inline]
    pub fn blend(&self, previous: &BBox, alpha: f32) -> BBox {
        let mix = |cur: f32, prev: f32| alpha * cur + (1.0 - alpha) * prev;
        BBox {
            x1: mix(self.x1, previous.x1),
            y1: mix(self.y1, previous.y1),
            x2: mix(self.x2, previous.x2),
            y2: mix(self.y2, previous.y2),
        }
    }
}

/// Free-function form of [`BBox::iou`].
#[inline]
pub fn iou(a: &BBox, b: &BBox) -> f32 {
    a.iou(b)
}

/// Calculate IoU matrix between two sets of bounding boxes.
///
/// Returns a matrix of shape (M, N) where M is the length of `boxes_a`
/// and N is the length of `boxes_b`.
pub fn iou_batch(boxes_a: &[BBox], boxes_b: &[BBox]) -> Array2<f32> {
    let mut ious = Array2::zeros((boxes_a.len(), boxes_b.len()));
    for (i, a) in boxes_a.iter().enumerate() {
        for (j, b) in boxes_b.iter().enumerate() {
            ious[[i, j]] = a.iou(b);
        }
    }
    ious
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_conversions() {
        let b = BBox::from_tlwh(10.0, 20.0, 30.0, 40.0);

        assert_eq!(b.to_tlwh(), [10.0, 20.0, 30.0, 40.0]);
        assert_eq!(b.to_tlbr(), [10.0, 20.0, 40.0, 60.0]);

        let xyah = b.to_xyah();
        assert_eq!(xyah[0], 25.0);
        assert_eq!(xyah[1], 40.0);
        assert!((xyah[2] - 0.75).abs() < 1e-6);
        assert_eq!(xyah[3], 40.0);
    }

    #[test]
    fn test_from_xyah() {
        let b = BBox::from_xyah(25.0, 40.0, 0.75, 40.0);
        assert!((b.x1 - 10.0).abs() < 1e-6);
        assert!((b.y1 - 20.0).abs() < 1e-6);
        assert!((b.x2 - 40.0).abs() < 1e-6);
        assert!((b.y2 - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_partial_overlap() {
        let a = BBox::from_tlwh(0.0, 0.0, 10.0, 10.0);
        let b = BBox::from_tlwh(5.0, 5.0, 10.0, 10.0);

        // 25 / (100 + 100 - 25)
        assert!((a.iou(&b) - 25.0 / 175.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_symmetric() {
        let boxes = [
            BBox::new(0.0, 0.0, 10.0, 10.0),
            BBox::new(3.0, -2.0, 12.5, 7.0),
            BBox::new(100.0, 100.0, 101.0, 140.0),
            BBox::new(5.0, 5.0, 5.0, 9.0),
        ];
        for a in &boxes {
            for b in &boxes {
                assert_eq!(iou(a, b), iou(b, a));
            }
        }
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = BBox::from_tlwh(0.0, 0.0, 10.0, 10.0);
        let b = BBox::from_tlwh(20.0, 20.0, 10.0, 10.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_same_box() {
        let a = BBox::from_tlwh(0.0, 0.0, 10.0, 10.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_degenerate_boxes() {
        let a = BBox::new(5.0, 5.0, 5.0, 5.0);
        assert_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn test_contains_point_is_strict() {
        let b = BBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(b.contains_point(5.0, 5.0));
        assert!(!b.contains_point(0.0, 5.0));
        assert!(!b.contains_point(10.0, 5.0));
        assert!(!b.contains_point(5.0, 11.0));
    }

    #[test]
    fn test_iou_batch_shape() {
        let a = [BBox::new(0.0, 0.0, 10.0, 10.0)];
        let b = [BBox::new(0.0, 0.0, 10.0, 10.0), BBox::new(50.0, 50.0, 60.0, 60.0)];
        let m = iou_batch(&a, &b);
        assert_eq!(m.dim(), (1, 2));
        assert!((m[[0, 0]] - 1.0).abs() < 1e-6);
        assert_eq!(m[[0, 1]], 0.0);
    }
}
