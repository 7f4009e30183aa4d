//! Engine configuration.
//!
//! Every section derives `Deserialize` with `#[serde(default)]`, so a host can
//! pass a partial options object and get defaults for everything it omits.

use serde::Deserialize;

use crate::error::{MosaicError, Result};
use crate::hit::HitConfig;
use crate::ingest::DataConfig;
use crate::layout::{LayoutConfig, PatternConfig, ThreadConfig};
use crate::render::RenderConfig;
use crate::viewport::ViewportConfig;
use crate::visual::{ColorMode, VisualConfig};

/// Size of the world the normalized positions are scaled into.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World width in pixels at zoom 1 (default: 1000).
    pub width: f64,
    /// World height in pixels at zoom 1 (default: 800).
    pub height: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 800.0,
        }
    }
}

/// Top-level configuration for [`MosaicEngine`](crate::engine::MosaicEngine).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    /// Seed for every jittered computation (default: 2025).
    pub seed: u64,
    pub world: WorldConfig,
    pub viewport: ViewportConfig,
    pub pattern: PatternConfig,
    pub layout: LayoutConfig,
    pub visual: VisualConfig,
    /// Initial color mode (default: by-category).
    pub color_mode: ColorMode,
    pub render: RenderConfig,
    pub data: DataConfig,
    pub thread: ThreadConfig,
    pub hit: HitConfig,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            seed: 2025,
            world: WorldConfig::default(),
            viewport: ViewportConfig::default(),
            pattern: PatternConfig::default(),
            layout: LayoutConfig::default(),
            visual: VisualConfig::default(),
            color_mode: ColorMode::default(),
            render: RenderConfig::default(),
            data: DataConfig::default(),
            thread: ThreadConfig::default(),
            hit: HitConfig::default(),
        }
    }
}

impl MosaicConfig {
    /// Reject values that would make the engine meaningless.
    ///
    /// Every length, factor and jitter amount must be finite and
    /// non-negative. The thread timeline always follows the data timeline.
    pub fn validated(mut self) -> Result<Self> {
        let invalid = MosaicError::InvalidConfig;

        let non_negative = [
            ("world.width", self.world.width),
            ("world.height", self.world.height),
            ("viewport.min_zoom", self.viewport.min_zoom),
            ("viewport.max_zoom", self.viewport.max_zoom),
            ("viewport.width", self.viewport.width),
            ("viewport.height", self.viewport.height),
            ("pattern.grid_spacing", self.pattern.grid_spacing),
            ("pattern.jitter", self.pattern.jitter),
            ("layout.margin", self.layout.margin),
            ("layout.min_spread", self.layout.min_spread),
            ("layout.max_spread", self.layout.max_spread),
            ("layout.min_distance", self.layout.min_distance),
            ("layout.specialist_band", self.layout.specialist_band),
            ("layout.super_connector_band", self.layout.super_connector_band),
            ("layout.sampler_jitter", self.layout.sampler_jitter),
            ("visual.min_thickness", self.visual.min_thickness),
            ("visual.max_thickness", self.visual.max_thickness),
            ("visual.min_tile_size", self.visual.min_tile_size),
            ("visual.max_tile_size", self.visual.max_tile_size),
            ("render.phase_step", self.render.phase_step),
            ("thread.spacing", self.thread.spacing),
            ("thread.axis_start", self.thread.axis_start),
            ("thread.axis_end", self.thread.axis_end),
            ("thread.tie_start", self.thread.tie_start),
            ("thread.tie_end", self.thread.tie_end),
            ("thread.bounds_padding", self.thread.bounds_padding),
            ("hit.thread_tolerance", self.hit.thread_tolerance),
        ];
        if let Some((name, value)) = non_negative
            .iter()
            .find(|(_, v)| !v.is_finite() || *v < 0.0)
        {
            return Err(invalid(format!("{name} must be finite and non-negative, got {value}")));
        }

        if !(self.world.width > 0.0 && self.world.height > 0.0) {
            return Err(invalid("world size must be positive".into()));
        }
        if !(self.viewport.min_zoom > 0.0 && self.viewport.min_zoom <= self.viewport.max_zoom) {
            return Err(invalid("zoom bounds must satisfy 0 < min_zoom <= max_zoom".into()));
        }
        if self.layout.min_spread > self.layout.max_spread {
            return Err(invalid("layout.min_spread exceeds layout.max_spread".into()));
        }
        if self.visual.min_tile_size > self.visual.max_tile_size
            || self.visual.min_thickness > self.visual.max_thickness
        {
            return Err(invalid("visual minimums exceed maximums".into()));
        }
        if self.data.months == 0 || !(1..=12).contains(&self.data.start_month) {
            return Err(invalid(
                "data.months must be positive and data.start_month within 1-12".into(),
            ));
        }

        self.thread.months = self.data.months;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DisplayMode;

    #[test]
    fn test_defaults_validate() {
        let config = MosaicConfig::default().validated().unwrap();
        assert_eq!(config.thread.months, config.data.months);
        assert_eq!(config.layout.pattern_count, 100);
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{
            "seed": 7,
            "viewport": { "max_zoom": 3.0 },
            "render": { "display_mode": "tapestry" },
            "color_mode": "by-style",
            "data": { "months": 6 }
        }"#;
        let config: MosaicConfig = serde_json::from_str(json).unwrap();
        let config = config.validated().unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.viewport.max_zoom, 3.0);
        assert_eq!(config.viewport.min_zoom, 0.2);
        assert_eq!(config.render.display_mode, DisplayMode::Tapestry);
        assert_eq!(config.color_mode, ColorMode::ByStyle);
        assert_eq!(config.thread.months, 6);
    }

    #[test]
    fn test_invalid_zoom_bounds() {
        let mut config = MosaicConfig::default();
        config.viewport.min_zoom = 4.0;
        config.viewport.max_zoom = 2.0;
        assert!(matches!(config.validated(), Err(MosaicError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_world() {
        let mut config = MosaicConfig::default();
        config.world.width = 0.0;
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_invalid_non_finite() {
        let cases: [fn(&mut MosaicConfig); 7] = [
            |c| c.layout.sampler_jitter = f64::INFINITY,
            |c| c.layout.min_distance = f64::NAN,
            |c| c.pattern.jitter = f64::INFINITY,
            |c| c.pattern.grid_spacing = f64::NEG_INFINITY,
            |c| c.thread.spacing = f64::INFINITY,
            |c| c.hit.thread_tolerance = f64::NAN,
            |c| c.layout.sampler_jitter = -0.5,
        ];
        for set in cases {
            let mut config = MosaicConfig::default();
            set(&mut config);
            assert!(matches!(config.validated(), Err(MosaicError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_infinite_jitter_never_reaches_placement() {
        let mut config = MosaicConfig::default();
        config.layout.sampler_jitter = f64::INFINITY;
        assert!(crate::engine::MosaicEngine::new(config).is_err());
    }
}
