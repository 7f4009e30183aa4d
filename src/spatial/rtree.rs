//! R-tree based spatial indices using the rstar crate.
//!
//! Provides O(log n) spatial queries for:
//! - Nearest neighbor within a distance (layout overlap checks)
//! - Envelope intersection (hit-test candidate pre-filtering)

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::geometry::{Bounds, Point};

/// A point in the index tagged with its entity slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotPoint {
    pub slot: usize,
    pub x: f64,
    pub y: f64,
}

impl RTreeObject for SlotPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for SlotPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// Point index over entity slots.
#[derive(Debug, Default)]
pub struct PointIndex {
    tree: RTree<SlotPoint>,
}

impl PointIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-load from `(slot, point)` pairs.
    pub fn from_points(points: impl IntoIterator<Item = (usize, Point)>) -> Self {
        let points = points
            .into_iter()
            .map(|(slot, p)| SlotPoint { slot, x: p.x, y: p.y })
            .collect();
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    pub fn insert(&mut self, slot: usize, p: Point) {
        self.tree.insert(SlotPoint { slot, x: p.x, y: p.y });
    }

    /// Nearest slot within `max_distance` of `p`.
    pub fn nearest_within(&self, p: Point, max_distance: f64) -> Option<usize> {
        let max_distance_sq = max_distance * max_distance;
        self.tree
            .nearest_neighbor(&[p.x, p.y])
            .filter(|point| point.distance_2(&[p.x, p.y]) < max_distance_sq)
            .map(|point| point.slot)
    }

    /// Number of indexed pairs closer than `min_distance`.
    pub fn count_close_pairs(&self, min_distance: f64) -> usize {
        let min_distance_sq = min_distance * min_distance;
        let pairs: usize = self
            .tree
            .iter()
            .map(|point| {
                self.tree
                    .locate_within_distance([point.x, point.y], min_distance_sq)
                    .filter(|other| {
                        other.slot != point.slot
                            && other.distance_2(&[point.x, point.y]) < min_distance_sq
                    })
                    .count()
            })
            .sum();
        pairs / 2
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// An axis-aligned box in the index tagged with its entity slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotBox {
    pub slot: usize,
    pub bounds: Bounds,
}

impl RTreeObject for SlotBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.min_x, self.bounds.min_y],
            [self.bounds.max_x, self.bounds.max_y],
        )
    }
}

/// Box index used to narrow hit-test candidates.
#[derive(Debug, Default)]
pub struct BoxIndex {
    tree: RTree<SlotBox>,
}

impl BoxIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-load from `(slot, bounds)` pairs.
    pub fn from_boxes(boxes: impl IntoIterator<Item = (usize, Bounds)>) -> Self {
        let boxes = boxes
            .into_iter()
            .map(|(slot, bounds)| SlotBox { slot, bounds })
            .collect();
        Self {
            tree: RTree::bulk_load(boxes),
        }
    }

    /// Slots whose box contains `p` (boundary inclusive), in no particular order.
    pub fn containing(&self, p: Point) -> Vec<usize> {
        let envelope = AABB::from_point([p.x, p.y]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|b| b.slot)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_within() {
        let mut index = PointIndex::new();
        index.insert(0, Point::new(0.0, 0.0));
        index.insert(1, Point::new(10.0, 10.0));

        assert_eq!(index.nearest_within(Point::new(0.0, 0.0), 5.0), Some(0));

        // Nothing within 1 of (5, 5)
        assert_eq!(index.nearest_within(Point::new(5.0, 5.0), 1.0), None);

        // Node 0 is ~7.07 from (5, 5), so within 8 should find it
        assert_eq!(index.nearest_within(Point::new(5.0, 5.0), 8.0), Some(0));
    }

    #[test]
    fn test_empty_index() {
        let index = PointIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.nearest_within(Point::new(0.5, 0.5), 1.0), None);
        assert_eq!(index.count_close_pairs(1.0), 0);
    }

    #[test]
    fn test_count_close_pairs() {
        let index = PointIndex::from_points([
            (0, Point::new(0.0, 0.0)),
            (1, Point::new(0.01, 0.0)),
            (2, Point::new(0.5, 0.5)),
            (3, Point::new(0.5, 0.505)),
        ]);
        assert_eq!(index.len(), 4);
        assert_eq!(index.count_close_pairs(0.02), 2);
        assert_eq!(index.count_close_pairs(0.001), 0);
    }

    #[test]
    fn test_box_containing() {
        let index = BoxIndex::from_boxes([
            (0, Bounds::centered(Point::new(10.0, 10.0), 4.0)),
            (1, Bounds::centered(Point::new(11.0, 11.0), 4.0)),
            (2, Bounds::centered(Point::new(50.0, 50.0), 4.0)),
        ]);

        let mut hits = index.containing(Point::new(11.5, 11.5));
        hits.sort_unstable();
        assert_eq!(hits, vec![0, 1]);

        // Boundary counts as inside
        assert_eq!(index.containing(Point::new(52.0, 50.0)), vec![2]);
        assert!(index.containing(Point::new(30.0, 30.0)).is_empty());
    }
}
