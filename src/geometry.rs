mod bbox;
mod crop;
mod quad;

pub use bbox::{BBox, iou, iou_batch};
pub use crop::{PixelRect, clamp_to_image, safe_crop};
pub use quad::{Point2, order_quad_points};
