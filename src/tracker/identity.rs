//! Per-object identity in the absence of a detector-side track id.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{GridAxes, KeyingConfig};
use crate::geometry::BBox;

/// Stable-ish identity for one physical plate across frames.
///
/// Two distinct objects may alias to the same key; the voter, smoother and
/// lock only need keys to be comparable and mostly stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKey {
    /// Spatial bucket of the box center
    Grid { col: i32, row: i32 },
    /// Id issued by a tracker
    Track(u64),
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid { col, row } => write!(f, "grid({col},{row})"),
            Self::Track(id) => write!(f, "track({id})"),
        }
    }
}

/// Assigns an [`ObjectKey`] to each plate box of a frame.
///
/// Called exactly once per frame with every plate box, so implementations
/// that carry state across frames (trackers) see the whole scene.
pub trait IdentityResolver {
    fn resolve(&mut self, boxes: &[BBox]) -> Vec<ObjectKey>;
}

/// Grid key of the horizontal box center.
pub fn grid_key(bbox: &BBox, grid_size: f32) -> ObjectKey {
    let (cx, _) = bbox.center();
    ObjectKey::Grid {
        col: quantize(cx, grid_size),
        row: 0,
    }
}

#[inline]
fn quantize(value: f32, grid_size: f32) -> i32 {
    (value / grid_size).floor() as i32
}

/// Stateless resolver bucketing box centers on a fixed grid.
#[derive(Debug, Clone)]
pub struct GridKeyResolver {
    grid_size: f32,
    axes: GridAxes,
}

impl Default for GridKeyResolver {
    fn default() -> Self {
        Self::new(&KeyingConfig::default())
    }
}

impl GridKeyResolver {
    pub fn new(config: &KeyingConfig) -> Self {
        Self {
            grid_size: config.grid_size,
            axes: config.axes,
        }
    }

    pub fn key(&self, bbox: &BBox) -> ObjectKey {
        match self.axes {
            GridAxes::Horizontal => grid_key(bbox, self.grid_size),
            GridAxes::Both => {
                let (cx, cy) = bbox.center();
                ObjectKey::Grid {
                    col: quantize(cx, self.grid_size),
                    row: quantize(cy, self.grid_size),
                }
            }
        }
    }
}

impl IdentityResolver for GridKeyResolver {
    fn resolve(&mut self, boxes: &[BBox]) -> Vec<ObjectKey> {
        boxes.iter().map(|b| self.key(b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_key_buckets_center_x() {
        let a = BBox::new(100.0, 10.0, 140.0, 30.0); // cx 120
        let b = BBox::new(105.0, 200.0, 165.0, 220.0); // cx 135
        let c = BBox::new(170.0, 10.0, 210.0, 30.0); // cx 190
        assert_eq!(grid_key(&a, 60.0), ObjectKey::Grid { col: 2, row: 0 });
        assert_eq!(grid_key(&a, 60.0), grid_key(&b, 60.0));
        assert_ne!(grid_key(&a, 60.0), grid_key(&c, 60.0));
    }

    #[test]
    fn test_negative_centers_floor() {
        let a = BBox::new(-30.0, 0.0, -10.0, 10.0); // cx -20
        assert_eq!(grid_key(&a, 60.0), ObjectKey::Grid { col: -1, row: 0 });
    }

    #[test]
    fn test_both_axes() {
        let config = KeyingConfig {
            axes: GridAxes::Both,
            ..KeyingConfig::default()
        };
        let mut resolver = GridKeyResolver::new(&config);
        let keys = resolver.resolve(&[
            BBox::new(100.0, 10.0, 140.0, 30.0),
            BBox::new(105.0, 200.0, 165.0, 220.0),
        ]);
        assert_eq!(keys[0], ObjectKey::Grid { col: 2, row: 0 });
        assert_eq!(keys[1], ObjectKey::Grid { col: 2, row: 3 });
    }
}
