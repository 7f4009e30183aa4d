//! Thread paths for the tapestry view.
//!
//! Each entity becomes a thread running along the month axis. The thread has
//! one anchor per month with activity (carrying that month's events) plus a
//! tie-off anchor at each end. Consecutive anchors are joined by a cubic
//! bezier whose control point sits near the segment midpoint, pulled along the
//! segment direction and jittered sideways, so threads read as woven curves
//! rather than polylines. The padded bounding box is cached for hit testing.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{jitter, uniform};
use crate::geometry::{Bounds, Point, cubic_bezier, distance_to_segment, map_range};
use crate::model::{Entity, Event};

/// Direction threads run in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThreadOrientation {
    /// Months run left to right.
    #[default]
    Horizontal,
    /// Months run top to bottom.
    Vertical,
    /// Every third thread vertical, the rest horizontal.
    Woven,
}

/// Configuration for thread construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThreadConfig {
    /// Thread direction (default: horizontal).
    pub orientation: ThreadOrientation,
    /// Base spacing between threads in world units (default: 15.0).
    pub spacing: f64,
    /// Number of lanes threads cycle through (default: 20).
    pub lanes: usize,
    /// Months on the axis (default: 8).
    pub months: u8,
    /// Month-axis extent as a fraction of the world (default: 0.15 to 0.85).
    pub axis_start: f64,
    pub axis_end: f64,
    /// Tie-off anchors as a fraction of the world (default: 0.1 to 0.9).
    pub tie_start: f64,
    pub tie_end: f64,
    /// Bounding-box padding as a multiple of thickness (default: 5.0).
    pub bounds_padding: f64,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            orientation: ThreadOrientation::Horizontal,
            spacing: 15.0,
            lanes: 20,
            months: 8,
            axis_start: 0.15,
            axis_end: 0.85,
            tie_start: 0.1,
            tie_end: 0.9,
            bounds_padding: 5.0,
        }
    }
}

/// A point the thread passes through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadAnchor {
    pub point: Point,
    /// Month index; tie-offs use 0 and the last month.
    pub month: u8,
    /// Events attended in this month; empty for tie-offs.
    pub events: Vec<Event>,
}

/// One cubic bezier piece of a thread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CubicSegment {
    pub p0: Point,
    pub p1: Point,
    pub p2: Point,
    pub p3: Point,
}

impl CubicSegment {
    /// Elevate a quadratic `a`-`control`-`b` curve to a cubic.
    fn from_quadratic(a: Point, control: Point, b: Point) -> Self {
        Self {
            p0: a,
            p1: a.lerp(control, 2.0 / 3.0),
            p2: b.lerp(control, 2.0 / 3.0),
            p3: b,
        }
    }

    #[inline]
    pub fn at(&self, t: f64) -> Point {
        cubic_bezier(self.p0, self.p1, self.p2, self.p3, t)
    }
}

/// Smooth path of one entity's thread.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadPath {
    anchors: Vec<ThreadAnchor>,
    segments: Vec<CubicSegment>,
    bounds: Bounds,
    vertical: bool,
}

impl ThreadPath {
    /// Build the thread of the `index`-th entity in a `width` x `height` world.
    pub fn build<R: Rng + ?Sized>(
        entity: &Entity,
        index: usize,
        thickness: f64,
        width: f64,
        height: f64,
        config: &ThreadConfig,
        rng: &mut R,
    ) -> Self {
        let lanes = config.lanes.max(1);
        let (vertical, lane) = match config.orientation {
            ThreadOrientation::Horizontal => (false, index % lanes),
            ThreadOrientation::Vertical => (true, index % lanes),
            ThreadOrientation::Woven => (index % 3 == 0, (index / 3) % lanes),
        };

        // Work in (along, across) coordinates, then swap for vertical threads
        let (along_extent, across_extent) =
            if vertical { (height, width) } else { (width, height) };
        let axis = |value: f64, count: f64| {
            map_range(value, 0.0, count, config.axis_start, config.axis_end)
        };
        let across = axis(lane as f64, lanes as f64) * across_extent
            + jitter(rng, config.spacing / 3.0);
        let to_world = |along: f64, off: f64| {
            if vertical {
                Point::new(across + off, along)
            } else {
                Point::new(along, across + off)
            }
        };

        let mut anchors = vec![ThreadAnchor {
            point: to_world(config.tie_start * along_extent, 0.0),
            month: 0,
            events: Vec::new(),
        }];

        let months = config.months.max(1);
        for month in 1..=months {
            let events: Vec<Event> =
                entity.events().iter().filter(|e| e.month == month).cloned().collect();
            if events.is_empty() {
                continue;
            }
            let along = axis(f64::from(month), f64::from(months)) * along_extent;
            let deviation = jitter(rng, config.spacing / 2.0) * (events.len() as f64 / 5.0);
            anchors.push(ThreadAnchor {
                point: to_world(along, deviation),
                month,
                events,
            });
        }

        anchors.push(ThreadAnchor {
            point: to_world(config.tie_end * along_extent, 0.0),
            month: months,
            events: Vec::new(),
        });

        let segments: Vec<CubicSegment> = anchors
            .windows(2)
            .map(|pair| {
                let (a, b) = (pair[0].point, pair[1].point);
                let control = control_point(a, b, config.spacing, &mut *rng);
                CubicSegment::from_quadratic(a, control, b)
            })
            .collect();

        let hull = segments.iter().flat_map(|s| [s.p0, s.p1, s.p2, s.p3]);
        let bounds = Bounds::from_points(hull)
            .unwrap_or_else(|| Bounds::centered(anchors[0].point, 0.0))
            .padded(thickness * config.bounds_padding);

        Self {
            anchors,
            segments,
            bounds,
            vertical,
        }
    }

    pub fn anchors(&self) -> &[ThreadAnchor] {
        &self.anchors
    }

    pub fn segments(&self) -> &[CubicSegment] {
        &self.segments
    }

    /// Cached bounding box, padded for hit testing.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn is_vertical(&self) -> bool {
        self.vertical
    }

    /// Minimum distance from `p` to the curve, sampled at `steps` per segment.
    pub fn distance_to(&self, p: Point, steps: usize) -> f64 {
        let steps = steps.max(1);
        let mut best = f64::INFINITY;
        for segment in &self.segments {
            let mut prev = segment.p0;
            for i in 1..=steps {
                let next = segment.at(i as f64 / steps as f64);
                best = best.min(distance_to_segment(p, prev, next));
                prev = next;
            }
        }
        best
    }
}

/// Midpoint of `a`-`b` pulled towards `b` and jittered across the segment.
fn control_point<R: Rng + ?Sized>(a: Point, b: Point, spacing: f64, rng: &mut R) -> Point {
    let mid = a.midpoint(b);
    let length = a.distance(b);
    if length == 0.0 {
        return mid;
    }
    let (ux, uy) = ((b.x - a.x) / length, (b.y - a.y) / length);
    let pull = uniform(rng, 0.0, (spacing * 2.0).min(length / 4.0));
    let side = jitter(rng, spacing / 3.0);
    Point::new(mid.x + ux * pull - uy * side, mid.y + uy * pull + ux * side)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, EngagementStyle};
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn entity(months: &[u8]) -> Entity {
        let events = months
            .iter()
            .map(|&m| Event::new(m, Category::Social, "Student Mixer"))
            .collect();
        Entity::with_events("S001", EngagementStyle::Sampler, events)
    }

    fn build(entity: &Entity, index: usize, config: &ThreadConfig) -> ThreadPath {
        ThreadPath::build(entity, index, 2.0, 1000.0, 800.0, config, &mut Pcg64::seed_from_u64(4))
    }

    #[test]
    fn test_one_anchor_per_active_month() {
        let entity = entity(&[5, 2, 2, 7]);
        let path = build(&entity, 0, &ThreadConfig::default());

        let months: Vec<u8> = path.anchors().iter().map(|a| a.month).collect();
        assert_eq!(months, vec![0, 2, 5, 7, 8]);
        assert_eq!(path.anchors()[1].events.len(), 2);
        assert!(path.anchors()[0].events.is_empty());
        assert_eq!(path.segments().len(), path.anchors().len() - 1);
    }

    #[test]
    fn test_anchors_advance_along_axis() {
        let path = build(&entity(&[1, 3, 6, 8]), 4, &ThreadConfig::default());
        let xs: Vec<f64> = path.anchors().iter().map(|a| a.point.x).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
        assert!(!path.is_vertical());
        assert!((xs[0] - 100.0).abs() < 1e-9);
        assert!((xs[xs.len() - 1] - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_woven_orientation() {
        let config = ThreadConfig {
            orientation: ThreadOrientation::Woven,
            ..ThreadConfig::default()
        };
        let entity = entity(&[2, 4]);
        assert!(build(&entity, 0, &config).is_vertical());
        assert!(!build(&entity, 1, &config).is_vertical());
        assert!(build(&entity, 3, &config).is_vertical());

        let vertical = build(&entity, 3, &config);
        let ys: Vec<f64> = vertical.anchors().iter().map(|a| a.point.y).collect();
        assert!(ys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_no_events_gives_tie_off_segment() {
        let path = build(&entity(&[]), 0, &ThreadConfig::default());
        assert_eq!(path.anchors().len(), 2);
        assert_eq!(path.segments().len(), 1);
    }

    #[test]
    fn test_curve_passes_through_anchors() {
        let path = build(&entity(&[3, 4]), 2, &ThreadConfig::default());
        for (segment, anchor) in path.segments().iter().zip(path.anchors()) {
            assert!(segment.at(0.0).distance(anchor.point) < 1e-9);
            assert!(path.distance_to(anchor.point, 10) < 1e-9);
        }
    }

    #[test]
    fn test_bounds_contain_curve() {
        let path = build(&entity(&[1, 2, 5, 6]), 7, &ThreadConfig::default());
        let bounds = path.bounds();
        for segment in path.segments() {
            for i in 0..=20 {
                assert!(bounds.contains(segment.at(i as f64 / 20.0)));
            }
        }
    }
}
