//! Pattern generator: normalized anchor points approximating a silhouette.
//!
//! The generated pattern is the union of:
//! - **Outline points**: the polygon outline densified by linear interpolation
//! - **Interior points**: a regular grid over the polygon's bounding box,
//!   filtered by ray-casting containment and jittered slightly
//!
//! When the union is larger than requested it is down-sampled by a fixed
//! stride, so the count is reproducible while the jitter is not.

use rand::Rng;
use serde::Deserialize;

use super::jitter;
use crate::geometry::{Bounds, Point, point_in_polygon};

/// Mustang profile facing right, normalized to the unit square.
const MUSTANG_OUTLINE: [(f64, f64); 22] = [
    (0.20, 0.30), // tail tip
    (0.30, 0.34),
    (0.38, 0.38), // back
    (0.55, 0.38),
    (0.63, 0.31), // neck
    (0.69, 0.23),
    (0.74, 0.21), // ears
    (0.80, 0.27), // muzzle
    (0.80, 0.31),
    (0.73, 0.33),
    (0.68, 0.42), // throat
    (0.65, 0.50), // chest
    (0.64, 0.68), // front hoof
    (0.60, 0.68),
    (0.58, 0.55), // belly
    (0.46, 0.55),
    (0.45, 0.68), // hind hoof
    (0.41, 0.68),
    (0.39, 0.54),
    (0.34, 0.48), // rump
    (0.29, 0.40),
    (0.20, 0.36),
];

/// Hand-placed anchors: body core, head, tail and legs.
const MUSTANG_ANCHORS: [(f64, f64); 35] = [
    (0.40, 0.40), (0.45, 0.40), (0.50, 0.40), (0.55, 0.40), (0.60, 0.40),
    (0.40, 0.45), (0.45, 0.45), (0.50, 0.45), (0.55, 0.45), (0.60, 0.45),
    (0.40, 0.50), (0.45, 0.50), (0.50, 0.50), (0.55, 0.50), (0.60, 0.50),
    (0.65, 0.35), (0.70, 0.30), (0.75, 0.28), (0.80, 0.30), (0.70, 0.35), (0.70, 0.40),
    (0.35, 0.35), (0.30, 0.30), (0.25, 0.25), (0.20, 0.30), (0.30, 0.40),
    (0.40, 0.55), (0.40, 0.60), (0.40, 0.65),
    (0.50, 0.55), (0.50, 0.60), (0.50, 0.65),
    (0.60, 0.55), (0.60, 0.60), (0.60, 0.65),
];

/// Where pattern points come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternSource {
    /// Outline sampling plus interior grid fill.
    #[default]
    Silhouette,
    /// The fixed hand-placed anchor list, truncated to the target.
    Anchors,
}

/// Configuration for pattern generation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Interior grid spacing in normalized units (default: 0.02).
    pub grid_spacing: f64,
    /// Maximum jitter applied to interior points (default: 0.004).
    pub jitter: f64,
    /// Points per outline edge (default: 4).
    pub subdivisions: usize,
    /// Point source (default: silhouette).
    pub source: PatternSource,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            grid_spacing: 0.02,
            jitter: 0.004,
            subdivisions: 4,
            source: PatternSource::Silhouette,
        }
    }
}

/// Samples anchor points from a polygon silhouette.
#[derive(Debug, Clone)]
pub struct PatternGenerator {
    outline: Vec<Point>,
    config: PatternConfig,
}

impl PatternGenerator {
    /// Generator over the built-in mustang outline.
    pub fn new(config: PatternConfig) -> Self {
        let outline = MUSTANG_OUTLINE.iter().map(|&(x, y)| Point::new(x, y)).collect();
        Self { outline, config }
    }

    /// Generator over a custom polygon outline (implicitly closed).
    pub fn with_outline(outline: Vec<Point>, config: PatternConfig) -> Self {
        Self { outline, config }
    }

    pub fn outline(&self) -> &[Point] {
        &self.outline
    }

    /// Produce at most `target` points in `[0, 1]²`.
    ///
    /// Never fails; degenerate outlines yield fewer points than requested.
    pub fn generate<R: Rng + ?Sized>(&self, target: usize, rng: &mut R) -> Vec<Point> {
        if target == 0 {
            return Vec::new();
        }

        let candidates = match self.config.source {
            PatternSource::Anchors => {
                MUSTANG_ANCHORS.iter().map(|&(x, y)| Point::new(x, y)).collect()
            }
            PatternSource::Silhouette => {
                let mut points = self.outline_points();
                points.extend(self.interior_points(rng));
                points
            }
        };

        stride_sample(candidates, target)
    }

    /// Outline vertices plus evenly spaced points along every edge.
    fn outline_points(&self) -> Vec<Point> {
        let n = self.outline.len();
        if n < 2 {
            return self.outline.clone();
        }

        let steps = self.config.subdivisions.max(1);
        let mut points = Vec::with_capacity(n * steps);
        for i in 0..n {
            let a = self.outline[i];
            let b = self.outline[(i + 1) % n];
            for s in 0..steps {
                points.push(a.lerp(b, s as f64 / steps as f64));
            }
        }
        points
    }

    /// Jittered grid points inside the polygon.
    fn interior_points<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Point> {
        let spacing = self.config.grid_spacing;
        if self.outline.len() < 3 || !spacing.is_finite() || spacing <= 0.0 {
            return Vec::new();
        }
        let Some(bounds) = Bounds::from_points(self.outline.iter().copied()) else {
            return Vec::new();
        };

        let cols = (bounds.width() / spacing).floor() as usize;
        let rows = (bounds.height() / spacing).floor() as usize;
        let mut points = Vec::new();
        for row in 0..=rows {
            for col in 0..=cols {
                let grid = Point::new(
                    bounds.min_x + col as f64 * spacing,
                    bounds.min_y + row as f64 * spacing,
                );
                if point_in_polygon(grid, &self.outline) {
                    points.push(Point::new(
                        (grid.x + jitter(rng, self.config.jitter)).clamp(0.0, 1.0),
                        (grid.y + jitter(rng, self.config.jitter)).clamp(0.0, 1.0),
                    ));
                }
            }
        }
        points
    }
}

impl Default for PatternGenerator {
    fn default() -> Self {
        Self::new(PatternConfig::default())
    }
}

/// Deterministic down-sampling: keep index `floor(i * len / target)`.
fn stride_sample(points: Vec<Point>, target: usize) -> Vec<Point> {
    let len = points.len();
    if len <= target {
        return points;
    }
    (0..target).map(|i| points[i * len / target]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn rng() -> Pcg64 {
        Pcg64::seed_from_u64(42)
    }

    #[test]
    fn test_count_never_exceeds_target() {
        let generator = PatternGenerator::default();
        for target in [0, 1, 7, 35, 100, 250] {
            let points = generator.generate(target, &mut rng());
            assert!(points.len() <= target, "target {target} gave {}", points.len());
        }
    }

    #[test]
    fn test_reasonable_target_is_met() {
        let generator = PatternGenerator::default();
        let points = generator.generate(100, &mut rng());
        assert_eq!(points.len(), 100);
    }

    #[test]
    fn test_points_are_normalized() {
        let generator = PatternGenerator::default();
        for p in generator.generate(200, &mut rng()) {
            assert!((0.0..=1.0).contains(&p.x));
            assert!((0.0..=1.0).contains(&p.y));
        }
    }

    #[test]
    fn test_stride_sample_is_deterministic() {
        let points: Vec<Point> = (0..10).map(|i| Point::new(i as f64, 0.0)).collect();
        let sampled = stride_sample(points, 4);
        let xs: Vec<f64> = sampled.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 2.0, 5.0, 7.0]);
    }

    #[test]
    fn test_same_seed_same_pattern() {
        let generator = PatternGenerator::default();
        let a = generator.generate(120, &mut rng());
        let b = generator.generate(120, &mut rng());
        assert_eq!(a, b);
    }

    #[test]
    fn test_degenerate_outline() {
        let config = PatternConfig::default();

        let empty = PatternGenerator::with_outline(Vec::new(), config.clone());
        assert!(empty.generate(50, &mut rng()).is_empty());

        // A line has no interior; only outline points come back
        let outline = vec![Point::new(0.1, 0.1), Point::new(0.9, 0.9)];
        let line = PatternGenerator::with_outline(outline, config);
        let points = line.generate(50, &mut rng());
        assert_eq!(points.len(), 8);
    }

    #[test]
    fn test_zero_spacing_falls_back_to_outline() {
        let config = PatternConfig {
            grid_spacing: 0.0,
            ..PatternConfig::default()
        };
        let generator = PatternGenerator::new(config);
        let points = generator.generate(1000, &mut rng());
        assert_eq!(points.len(), MUSTANG_OUTLINE.len() * 4);
    }

    #[test]
    fn test_anchor_source() {
        let config = PatternConfig {
            source: PatternSource::Anchors,
            ..PatternConfig::default()
        };
        let generator = PatternGenerator::new(config);
        assert_eq!(generator.generate(100, &mut rng()).len(), 35);
        assert_eq!(generator.generate(10, &mut rng()).len(), 10);
    }
}
