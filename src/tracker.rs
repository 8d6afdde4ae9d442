mod association;
mod identity;
mod iou_tracker;
mod kalman_filter;
mod matching;
mod plate_track;
mod track_state;

pub use association::{Association, VehiclePlate, associate, filter_detections};
pub use identity::{GridKeyResolver, IdentityResolver, ObjectKey, grid_key};
pub use iou_tracker::TrackerKeyResolver;
pub use kalman_filter::{KalmanFilter, KalmanState};
pub use matching::{Assignment, iou_distance, linear_assignment};
pub use plate_track::PlateTrack;
pub use track_state::TrackState;
