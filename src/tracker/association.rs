//! Plate-to-vehicle association by center containment.

use crate::config::DetectionConfig;
use crate::detection::{Detection, FrameDetections};

/// A plate claimed by the vehicle whose box contains its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehiclePlate {
    pub vehicle: Detection,
    pub plate: Detection,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Association {
    pub pairs: Vec<VehiclePlate>,
    /// Plates not inside any vehicle, in detector order
    pub orphans: Vec<Detection>,
}

impl Association {
    /// All plates: paired ones in vehicle order, then orphans.
    pub fn plates(&self) -> impl Iterator<Item = &Detection> {
        self.pairs.iter().map(|p| &p.plate).chain(self.orphans.iter())
    }

    pub fn len(&self) -> usize {
        self.pairs.len() + self.orphans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pair each vehicle with the first unclaimed plate whose center lies
/// strictly inside it. First match wins, not best match.
pub fn associate(vehicles: &[Detection], plates: &[Detection]) -> Association {
    let mut claimed = vec![false; plates.len()];
    let mut pairs = Vec::new();

    for vehicle in vehicles {
        let hit = plates.iter().enumerate().find(|(j, plate)| {
            let (cx, cy) = plate.bbox.center();
            !claimed[*j] && vehicle.bbox.contains_point(cx, cy)
        });
        if let Some((j, plate)) = hit {
            claimed[j] = true;
            pairs.push(VehiclePlate {
                vehicle: *vehicle,
                plate: *plate,
            });
        }
    }

    let orphans = plates
        .iter()
        .zip(&claimed)
        .filter(|(_, claimed)| !**claimed)
        .map(|(plate, _)| *plate)
        .collect();

    Association { pairs, orphans }
}

/// Drop vehicles of other classes and low-confidence detections.
pub fn filter_detections(detections: &FrameDetections, config: &DetectionConfig) -> FrameDetections {
    let vehicles = detections
        .vehicles
        .iter()
        .filter(|v| {
            v.score >= config.vehicle_min_confidence
                && (config.vehicle_classes.is_empty() || config.vehicle_classes.contains(&v.class_id))
        })
        .copied()
        .collect();
    let plates = detections
        .plates
        .iter()
        .filter(|p| p.score >= config.plate_min_confidence)
        .copied()
        .collect();
    FrameDetections { vehicles, plates }
}
