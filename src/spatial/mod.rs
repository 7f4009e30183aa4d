//! Spatial indexing for layout overlap checks and hit testing.
//!
//! This module provides R-tree based indices over entity slots: a point
//! index for minimum-distance queries and a box index for narrowing
//! hit-test candidates.

mod rtree;

pub use rtree::{BoxIndex, PointIndex, SlotBox, SlotPoint};
