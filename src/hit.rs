//! Hit testing: resolve a screen point to the topmost entity under it.
//!
//! A [`HitScene`] holds the drawable targets in draw order together with an
//! R-tree over their boxes. A query inverse-transforms the screen point
//! through the viewport, collects candidates whose box contains the world
//! point, runs the precise test on each, and returns the match drawn last.
//! Overlaps are therefore broken by draw order, never by proximity: the
//! entity that is visibly on top wins.
//!
//! The same query serves selection (click) and hover; only what the caller
//! does with the result differs.

use serde::Deserialize;

use crate::geometry::{Bounds, Point};
use crate::layout::ThreadPath;
use crate::spatial::BoxIndex;
use crate::viewport::Viewport;
use crate::visual::Emphasis;

/// Configuration for hit testing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HitConfig {
    /// Samples per bezier segment (default: 10).
    pub thread_steps: usize,
    /// Accept distance as a multiple of thread thickness (default: 3.0).
    pub thread_tolerance: f64,
}

impl Default for HitConfig {
    fn default() -> Self {
        Self {
            thread_steps: 10,
            thread_tolerance: 3.0,
        }
    }
}

/// One hit target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitTarget {
    /// Axis-aligned square tile centred on `center` with base side `size`.
    Tile { slot: usize, center: Point, size: f64 },
    /// Thread curve; the path lives in the caller's slot-indexed cache.
    Thread { slot: usize, thickness: f64 },
}

impl HitTarget {
    pub fn slot(&self) -> usize {
        match *self {
            Self::Tile { slot, .. } | Self::Thread { slot, .. } => slot,
        }
    }
}

/// Targets in draw order (last drawn is on top) plus their box index.
#[derive(Debug, Default)]
pub struct HitScene {
    targets: Vec<HitTarget>,
    index: BoxIndex,
}

impl HitScene {
    /// Scene with nothing to hit.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Tile scene; boxes are sized for the largest emphasis so hover and
    /// selection never require a rebuild.
    pub fn tiles(tiles: impl IntoIterator<Item = (usize, Point, f64)>) -> Self {
        let targets: Vec<HitTarget> = tiles
            .into_iter()
            .map(|(slot, center, size)| HitTarget::Tile { slot, center, size })
            .collect();
        let boxes = targets.iter().enumerate().filter_map(|(rank, target)| match *target {
            HitTarget::Tile { center, size, .. } => {
                Some((rank, Bounds::centered(center, size * Emphasis::MAX_SCALE)))
            }
            HitTarget::Thread { .. } => None,
        });
        let index = BoxIndex::from_boxes(boxes);
        Self { targets, index }
    }

    /// Thread scene over `(slot, thickness)` pairs; `paths` is slot-indexed.
    pub fn threads(threads: impl IntoIterator<Item = (usize, f64)>, paths: &[ThreadPath]) -> Self {
        let targets: Vec<HitTarget> = threads
            .into_iter()
            .filter(|(slot, _)| *slot < paths.len())
            .map(|(slot, thickness)| HitTarget::Thread { slot, thickness })
            .collect();
        let index = BoxIndex::from_boxes(
            targets
                .iter()
                .enumerate()
                .map(|(rank, target)| (rank, paths[target.slot()].bounds())),
        );
        Self { targets, index }
    }

    pub fn targets(&self) -> &[HitTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Runs hit queries against a scene.
#[derive(Debug, Clone, Default)]
pub struct HitTester {
    config: HitConfig,
}

impl HitTester {
    pub fn new(config: HitConfig) -> Self {
        Self { config }
    }

    /// Slot of the topmost target under `screen`, or `None`.
    pub fn hit_test(
        &self,
        scene: &HitScene,
        paths: &[ThreadPath],
        viewport: &Viewport,
        screen: Point,
        emphasis: Emphasis,
    ) -> Option<usize> {
        self.hit_world(scene, paths, viewport.screen_to_world(screen), emphasis)
    }

    /// Same as [`hit_test`](Self::hit_test) for a world-space point.
    pub fn hit_world(
        &self,
        scene: &HitScene,
        paths: &[ThreadPath],
        world: Point,
        emphasis: Emphasis,
    ) -> Option<usize> {
        if scene.is_empty() {
            return None;
        }

        let mut candidates = scene.index.containing(world);
        // Highest draw rank first
        candidates.sort_unstable_by(|a, b| b.cmp(a));

        candidates
            .into_iter()
            .filter_map(|rank| scene.targets.get(rank))
            .find(|target| self.precise(target, paths, world, emphasis))
            .map(HitTarget::slot)
    }

    fn precise(
        &self,
        target: &HitTarget,
        paths: &[ThreadPath],
        world: Point,
        emphasis: Emphasis,
    ) -> bool {
        match *target {
            HitTarget::Tile { slot, center, size } => {
                let half = size * emphasis.scale(slot) / 2.0;
                (world.x - center.x).abs() <= half && (world.y - center.y).abs() <= half
            }
            HitTarget::Thread { slot, thickness } => paths.get(slot).is_some_and(|path| {
                let reach = thickness * self.config.thread_tolerance;
                path.bounds().contains(world)
                    && path.distance_to(world, self.config.thread_steps) < reach
            }),
        }
    }
}
