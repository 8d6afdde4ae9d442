//! Exponential smoothing of plate boxes per key.

use crate::config::SmootherConfig;
use crate::geometry::BBox;
use crate::stabilize::store::KeyedStore;
use crate::tracker::ObjectKey;

#[derive(Debug, Clone)]
pub struct BoxSmoother {
    alpha: f32,
    boxes: KeyedStore<BBox>,
}

impl Default for BoxSmoother {
    fn default() -> Self {
        Self::new(&SmootherConfig::default())
    }
}

impl BoxSmoother {
    pub fn new(config: &SmootherConfig) -> Self {
        Self {
            alpha: config.alpha,
            boxes: KeyedStore::new(),
        }
    }

    /// Blend `current` into the smoothed box of `key` and return the result.
    /// The first observation of a key is returned unchanged.
    pub fn smooth(&mut self, key: ObjectKey, current: BBox, frame: u64) -> BBox {
        let alpha = self.alpha;
        let slot = self.boxes.touch_with(key, frame, || current);
        *slot = current.blend(slot, alpha);
        *slot
    }

    pub fn get(&self, key: &ObjectKey) -> Option<BBox> {
        self.boxes.get(key).copied()
    }

    pub(crate) fn store_mut(&mut self) -> &mut KeyedStore<BBox> {
        &mut self.boxes
    }
}
