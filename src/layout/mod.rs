//! Layout algorithms for the mosaic.
//!
//! This module provides the CPU-side layout pipeline: a pattern generator that
//! samples anchor points from a silhouette, the assigner that maps entities to
//! normalized positions, and the thread-path builder for the tapestry view.
//! All randomness flows through a caller-supplied RNG so a fixed seed
//! reproduces the same layout.

pub mod assign;
pub mod pattern;
pub mod thread;

pub use assign::{LayoutAssigner, LayoutConfig};
pub use pattern::{PatternConfig, PatternGenerator, PatternSource};
pub use thread::{CubicSegment, ThreadAnchor, ThreadConfig, ThreadOrientation, ThreadPath};

use rand::Rng;

/// Uniform sample in `[-amount, amount]`; zero for non-positive or
/// non-finite amounts.
pub(crate) fn jitter<R: Rng + ?Sized>(rng: &mut R, amount: f64) -> f64 {
    if amount > 0.0 && (amount * 2.0).is_finite() {
        rng.gen_range(-amount..=amount)
    } else {
        0.0
    }
}

/// Uniform sample in `[lo, hi]`; `lo` when the range is empty, inverted or
/// not finite.
pub(crate) fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if hi > lo && (hi - lo).is_finite() {
        rng.gen_range(lo..=hi)
    } else {
        lo
    }
}
