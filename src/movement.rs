//! Face movement tracking
//!
//! Displacement between two face boxes is the Euclidean distance between
//! their centers.

use crate::types::BoundingBox;

/// Distance between the centers of two face boxes
pub fn movement_distance(current: &BoundingBox, previous: &BoundingBox) -> f64 {
    let (cy, cx) = current.center();
    let (py, px) = previous.center();
    (cy - py).hypot(cx - px)
}
