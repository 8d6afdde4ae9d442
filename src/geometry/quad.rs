/// 2D point in pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance(&self, other: &Point2) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Order four corners as (top-left, top-right, bottom-right, bottom-left).
///
/// The smallest `x + y` is top-left and the largest is bottom-right; the
/// smallest `y - x` is top-right and the largest is bottom-left.
pub fn order_quad_points(points: [Point2; 4]) -> [Point2; 4] {
    let pick = |key: fn(&Point2) -> f32, largest: bool| -> Point2 {
        let mut best = points[0];
        for p in &points[1..] {
            let better = if largest {
                key(p) > key(&best)
            } else {
                key(p) < key(&best)
            };
            if better {
                best = *p;
            }
        }
        best
    };

    let sum = |p: &Point2| p.x + p.y;
    let diff = |p: &Point2| p.y - p.x;

    [
        pick(sum, false),
        pick(diff, false),
        pick(sum, true),
        pick(diff, true),
    ]
}
