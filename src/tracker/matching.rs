//! IoU cost and linear assignment between tracks and detections.

use ndarray::Array2;

use crate::geometry::{BBox, iou_batch};

/// Cost assigned to padding cells when the cost matrix is not square.
const PADDING_COST: f64 = 1e6;

/// `1 - IoU` for every (track, detection) pair.
pub fn iou_distance(track_boxes: &[BBox], det_boxes: &[BBox]) -> Array2<f32> {
    iou_batch(track_boxes, det_boxes).mapv(|iou| 1.0 - iou)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Minimum-cost matching; pairs costing more than `max_cost` are rejected.
pub fn linear_assignment(cost_matrix: &Array2<f32>, max_cost: f32) -> Assignment {
    let (rows, cols) = cost_matrix.dim();
    if rows == 0 || cols == 0 {
        return Assignment {
            matches: Vec::new(),
            unmatched_tracks: (0..rows).collect(),
            unmatched_detections: (0..cols).collect(),
        };
    }

    let size = rows.max(cols);
    let padded = Array2::from_shape_fn((size, size), |(i, j)| {
        if i < rows && j < cols {
            cost_matrix[[i, j]] as f64
        } else {
            PADDING_COST
        }
    });

    let mut assignment = Assignment::default();
    let mut detection_taken = vec![false; cols];

    match lapjv::lapjv(&padded) {
        Ok((row_to_col, _)) => {
            for (row, &col) in row_to_col.iter().enumerate().take(rows) {
                if col < cols && cost_matrix[[row, col]] <= max_cost {
                    assignment.matches.push((row, col));
                    detection_taken[col] = true;
                } else {
                    assignment.unmatched_tracks.push(row);
                }
            }
        }
        Err(err) => {
            tracing::warn!(?err, "linear assignment failed, treating all pairs as unmatched");
            assignment.unmatched_tracks = (0..rows).collect();
        }
    }

    assignment.unmatched_detections = detection_taken
        .iter()
        .enumerate()
        .filter(|(_, taken)| !**taken)
        .map(|(j, _)| j)
        .collect();
    assignment
}
