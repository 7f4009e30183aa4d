//! Layout assigner: maps every entity to exactly one normalized position.
//!
//! Two kinds of placement:
//! - **Pattern entities** (the first `pattern_count` in order) consume
//!   pattern points in order and are `fixed`.
//! - **Free entities** are placed in a horizontal band keyed by primary
//!   category, with x spread widening with the category's population share
//!   and a style-specific spread rule. A bounded retry loop resamples
//!   positions that land within `min_distance` of an already placed free
//!   entity; when attempts run out the last sample is kept.

use rand::Rng;
use serde::Deserialize;

use super::{jitter, uniform};
use crate::geometry::{Point, lerp};
use crate::model::{Category, EngagementStyle, Entity, Position};
use crate::spatial::PointIndex;

/// Configuration for the layout assigner.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Number of leading entities bound to pattern points (default: 100).
    pub pattern_count: usize,
    /// Empty margin around the banded area (default: 0.1).
    pub margin: f64,
    /// Horizontal spread of a category with no population (default: 0.3).
    pub min_spread: f64,
    /// Horizontal spread of a category holding every free entity (default: 0.8).
    pub max_spread: f64,
    /// Soft minimum distance between free entities (default: 0.02).
    pub min_distance: f64,
    /// Placement attempts before the last sample is accepted (default: 10).
    pub max_attempts: usize,
    /// Fraction of the band a specialist occupies (default: 0.3).
    pub specialist_band: f64,
    /// Fraction of the band a super-connector may occupy (default: 1.8).
    pub super_connector_band: f64,
    /// Extra per-axis jitter for samplers (default: 0.03).
    pub sampler_jitter: f64,
    /// Discrete columns selectives snap to (default: 4).
    pub selective_columns: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            pattern_count: 100,
            margin: 0.1,
            min_spread: 0.3,
            max_spread: 0.8,
            min_distance: 0.02,
            max_attempts: 10,
            specialist_band: 0.3,
            super_connector_band: 1.8,
            sampler_jitter: 0.03,
            selective_columns: 4,
        }
    }
}

/// A horizontal band of the layout: vertical centre and height.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Band {
    center: f64,
    height: f64,
}

/// Assigns positions to entities.
#[derive(Debug, Clone, Default)]
pub struct LayoutAssigner {
    config: LayoutConfig,
}

impl LayoutAssigner {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Assign one position per entity, index-aligned with `entities`.
    ///
    /// Pattern entities beyond the available pattern points fall back to
    /// banded placement, so the result always has `entities.len()` items.
    pub fn assign<R: Rng + ?Sized>(
        &self,
        entities: &[Entity],
        pattern: &[Point],
        rng: &mut R,
    ) -> Vec<Position> {
        let fixed_count = self.config.pattern_count.min(pattern.len()).min(entities.len());

        // Population share per category among free entities
        let mut counts = [0usize; Category::COUNT];
        for entity in &entities[fixed_count..] {
            counts[entity.primary_category().index()] += 1;
        }
        let free_total = entities.len() - fixed_count;

        let mut placed = PointIndex::new();
        let mut positions = Vec::with_capacity(entities.len());

        for (slot, entity) in entities.iter().enumerate() {
            if slot < fixed_count {
                let p = pattern[slot];
                positions.push(Position::fixed(p.x, p.y));
                continue;
            }

            let share = if free_total == 0 {
                0.0
            } else {
                counts[entity.primary_category().index()] as f64 / free_total as f64
            };

            let mut candidate = self.sample(entity, share, rng);
            for _ in 1..self.config.max_attempts.max(1) {
                if placed.nearest_within(candidate, self.config.min_distance).is_none() {
                    break;
                }
                candidate = self.sample(entity, share, rng);
            }

            placed.insert(slot, candidate);
            positions.push(Position::free(candidate.x, candidate.y));
        }

        log::debug!(
            "Assigned {} positions ({} fixed, {} free)",
            positions.len(),
            fixed_count,
            free_total
        );
        positions
    }

    /// Band for a category; categories without a band share the centre.
    fn band(&self, category: Category) -> Band {
        let span = (1.0 - 2.0 * self.config.margin).max(0.0);
        let height = span / Category::GENERATED.len() as f64;
        match Category::GENERATED.iter().position(|&c| c == category) {
            Some(i) => Band {
                center: self.config.margin + height * (i as f64 + 0.5),
                height,
            },
            None => Band { center: 0.5, height },
        }
    }

    /// One position sample for a free entity.
    fn sample<R: Rng + ?Sized>(&self, entity: &Entity, share: f64, rng: &mut R) -> Point {
        let band = self.band(entity.primary_category());
        let spread = lerp(self.config.min_spread, self.config.max_spread, share.clamp(0.0, 1.0));
        let (x_min, x_max) = (0.5 - spread / 2.0, 0.5 + spread / 2.0);
        let half = band.height / 2.0;

        let (x, y) = match entity.style() {
            EngagementStyle::Specialist => {
                let h = half * self.config.specialist_band;
                (uniform(rng, x_min, x_max), band.center + jitter(rng, h))
            }
            EngagementStyle::SuperConnector => {
                let h = half * self.config.super_connector_band;
                (uniform(rng, x_min, x_max), band.center + jitter(rng, h))
            }
            EngagementStyle::Sampler => {
                let j = self.config.sampler_jitter;
                (
                    uniform(rng, x_min, x_max) + jitter(rng, j),
                    band.center + jitter(rng, half) + jitter(rng, j),
                )
            }
            EngagementStyle::Selective => {
                let columns = self.config.selective_columns.max(1);
                let column = rng.gen_range(0..columns);
                let x = x_min + spread * (column as f64 + 0.5) / columns as f64;
                (x, band.center + jitter(rng, half))
            }
        };

        Point::new(x.clamp(0.0, 1.0), y.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Event;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn entity(i: usize, style: EngagementStyle, category: Category) -> Entity {
        Entity::with_events(format!("S{i:03}"), style, vec![Event::new(1, category, "Event")])
    }

    fn population(n: usize) -> Vec<Entity> {
        (0..n)
            .map(|i| {
                let style = EngagementStyle::ALL[i % EngagementStyle::ALL.len()];
                let category = Category::GENERATED[(i / 4) % Category::GENERATED.len()];
                entity(i, style, category)
            })
            .collect()
    }

    #[test]
    fn test_empty_entities() {
        let assigner = LayoutAssigner::default();
        let mut rng = Pcg64::seed_from_u64(1);
        assert!(assigner.assign(&[], &[Point::new(0.5, 0.5)], &mut rng).is_empty());
    }

    #[test]
    fn test_pattern_entities_take_points_in_order() {
        let config = LayoutConfig {
            pattern_count: 3,
            ..LayoutConfig::default()
        };
        let assigner = LayoutAssigner::new(config);
        let pattern = vec![Point::new(0.1, 0.2), Point::new(0.3, 0.4), Point::new(0.5, 0.6)];
        let entities = population(10);
        let positions = assigner.assign(&entities, &pattern, &mut Pcg64::seed_from_u64(7));

        assert_eq!(positions.len(), 10);
        for (i, p) in pattern.iter().enumerate() {
            assert_eq!(positions[i], Position::fixed(p.x, p.y));
        }
        assert!(positions[3..].iter().all(|p| !p.fixed));
    }

    #[test]
    fn test_short_pattern_falls_back_to_bands() {
        let assigner = LayoutAssigner::default();
        let entities = population(5);
        let pattern = [Point::new(0.5, 0.5)];
        let positions = assigner.assign(&entities, &pattern, &mut Pcg64::seed_from_u64(3));
        assert_eq!(positions.iter().filter(|p| p.fixed).count(), 1);
        assert_eq!(positions.len(), 5);
    }

    #[test]
    fn test_free_positions_are_normalized() {
        let assigner = LayoutAssigner::default();
        let positions = assigner.assign(&population(300), &[], &mut Pcg64::seed_from_u64(11));
        for p in positions {
            assert!((0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y));
        }
    }

    #[test]
    fn test_bands_follow_declaration_order() {
        let assigner = LayoutAssigner::default();
        let centers: Vec<f64> =
            Category::GENERATED.iter().map(|&c| assigner.band(c).center).collect();
        assert!(centers.windows(2).all(|w| w[0] < w[1]));
        // Other has no band and sits in the middle
        assert!((assigner.band(Category::Other).center - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_specialists_stay_in_sub_band() {
        let assigner = LayoutAssigner::default();
        let entities: Vec<Entity> = (0..50)
            .map(|i| entity(i, EngagementStyle::Specialist, Category::Professional))
            .collect();
        let positions = assigner.assign(&entities, &[], &mut Pcg64::seed_from_u64(5));
        let band = assigner.band(Category::Professional);
        let limit = band.height / 2.0 * assigner.config().specialist_band + 1e-9;
        assert!(positions.iter().all(|p| (p.y - band.center).abs() <= limit));
    }

    #[test]
    fn test_selectives_snap_to_columns() {
        let assigner = LayoutAssigner::default();
        let entities: Vec<Entity> = (0..40)
            .map(|i| entity(i, EngagementStyle::Selective, Category::Cultural))
            .collect();
        let positions = assigner.assign(&entities, &[], &mut Pcg64::seed_from_u64(9));
        let mut xs: Vec<i64> = positions.iter().map(|p| (p.x * 1e6).round() as i64).collect();
        xs.sort_unstable();
        xs.dedup();
        assert!(xs.len() <= assigner.config().selective_columns);
    }

    #[test]
    fn test_overlap_is_rare() {
        let assigner = LayoutAssigner::default();
        let min_distance = assigner.config().min_distance;
        let positions = assigner.assign(&population(300), &[], &mut Pcg64::seed_from_u64(21));

        let index = PointIndex::from_points(
            positions
                .iter()
                .enumerate()
                .map(|(slot, p)| (slot, Point::new(p.x, p.y))),
        );
        let violations = index.count_close_pairs(min_distance);
        let pairs = 300 * 299 / 2;
        assert!((violations as f64) / (pairs as f64) < 0.01, "{violations} close pairs");
    }
}
