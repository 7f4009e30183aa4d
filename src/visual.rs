//! Entity visual-property calculator.
//!
//! Visual properties are derived on demand and never stored as truth:
//! - **Color** comes from a color-by mode resolved once to a function
//! - **Thickness** (threads) and **size** (tiles) grow with event count,
//!   clamped to a configured range
//! - **Texture** is a fixed table keyed by engagement style

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MosaicError;
use crate::geometry::lerp;
use crate::model::{Category, EngagementStyle, Entity};

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS `rgba()` string.
    pub fn css(self, alpha: f64) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha.clamp(0.0, 1.0))
    }
}

pub const SMU_BLUE: Rgb = Rgb::new(53, 76, 161);
pub const SMU_YELLOW: Rgb = Rgb::new(249, 200, 14);
pub const SMU_TEAL: Rgb = Rgb::new(89, 195, 195);
pub const SMU_RED: Rgb = Rgb::new(204, 0, 53);
pub const PURPLE: Rgb = Rgb::new(180, 100, 180);
/// Color for anything without a mapping.
pub const FALLBACK_GREY: Rgb = Rgb::new(169, 169, 169);

pub fn category_color(category: Category) -> Rgb {
    match category {
        Category::Academic => SMU_BLUE,
        Category::Social => SMU_YELLOW,
        Category::Professional => SMU_TEAL,
        Category::Cultural => PURPLE,
        Category::Athletic => SMU_RED,
        Category::Other => FALLBACK_GREY,
    }
}

pub fn style_color(style: EngagementStyle) -> Rgb {
    match style {
        EngagementStyle::Sampler => SMU_BLUE,
        EngagementStyle::Specialist => SMU_RED,
        EngagementStyle::SuperConnector => SMU_TEAL,
        EngagementStyle::Selective => SMU_YELLOW,
    }
}

/// Intensity bucket color; intensity is event count over 10, capped at 1.
pub fn intensity_color(event_count: usize) -> Rgb {
    let intensity = (event_count as f64 / 10.0).min(1.0);
    if intensity < 0.33 {
        SMU_BLUE
    } else if intensity < 0.66 {
        SMU_TEAL
    } else {
        SMU_RED
    }
}

/// Resolved color function.
pub type ColorFn = fn(&Entity) -> Rgb;

fn color_by_category(entity: &Entity) -> Rgb {
    category_color(entity.primary_category())
}

fn color_by_style(entity: &Entity) -> Rgb {
    style_color(entity.style())
}

fn color_by_intensity(entity: &Entity) -> Rgb {
    intensity_color(entity.event_count())
}

/// What tile and thread color encodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    #[default]
    ByCategory,
    ByStyle,
    ByIntensity,
}

impl ColorMode {
    pub const ALL: [ColorMode; 3] = [Self::ByCategory, Self::ByStyle, Self::ByIntensity];

    /// The color function for this mode.
    pub fn resolver(self) -> ColorFn {
        match self {
            Self::ByCategory => color_by_category,
            Self::ByStyle => color_by_style,
            Self::ByIntensity => color_by_intensity,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ByCategory => "by-category",
            Self::ByStyle => "by-style",
            Self::ByIntensity => "by-intensity",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorMode {
    type Err = MosaicError;

    /// Accepts `by-category` as well as the short `category`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|mode| {
                mode.as_str().eq_ignore_ascii_case(s) || mode.as_str()[3..].eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| MosaicError::unknown_mode("color", s))
    }
}

/// Stroke / fill pattern id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TexturePattern {
    Dotted,
    Solid,
    Cross,
    Dashed,
}

/// Texture of an entity: a pattern id plus a scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Texture {
    pub pattern: TexturePattern,
    pub scale: f64,
}

impl Texture {
    /// Used for style names outside the table.
    pub const DEFAULT: Texture = Texture {
        pattern: TexturePattern::Solid,
        scale: 0.3,
    };

    pub fn for_style(style: EngagementStyle) -> Self {
        let (pattern, scale) = match style {
            EngagementStyle::Sampler => (TexturePattern::Dotted, 0.8),
            EngagementStyle::Specialist => (TexturePattern::Solid, 0.2),
            EngagementStyle::SuperConnector => (TexturePattern::Cross, 0.5),
            EngagementStyle::Selective => (TexturePattern::Dashed, 0.4),
        };
        Self { pattern, scale }
    }

    /// Lookup by style name, with the default for unknown names.
    pub fn for_style_name(name: &str) -> Self {
        name.parse::<EngagementStyle>()
            .map(Self::for_style)
            .unwrap_or(Self::DEFAULT)
    }

    /// Line dash `[on, off]`, or `None` for a solid line.
    pub fn dash(&self) -> Option<[f64; 2]> {
        (self.scale > 0.1).then(|| [5.0 * self.scale, 3.0 * self.scale])
    }
}

/// Configuration for visual-property derivation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    /// Thread thickness range (default: 1.0 to 4.0).
    pub min_thickness: f64,
    pub max_thickness: f64,
    /// Tile size range in world units (default: 12.0 to 24.0).
    pub min_tile_size: f64,
    pub max_tile_size: f64,
    /// Event count that reaches the top of both ranges (default: 20).
    pub reference_events: usize,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            min_thickness: 1.0,
            max_thickness: 4.0,
            min_tile_size: 12.0,
            max_tile_size: 24.0,
            reference_events: 20,
        }
    }
}

/// Derived drawing attributes of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisualProperties {
    pub color: Rgb,
    pub thickness: f64,
    pub size: f64,
    pub texture: Texture,
}

/// Selection / hover emphasis applied to tile size.
///
/// Both factors apply when an entity is selected and hovered at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Emphasis {
    pub selected: Option<usize>,
    pub hovered: Option<usize>,
}

impl Emphasis {
    pub const SELECTED_SCALE: f64 = 1.5;
    pub const HOVERED_SCALE: f64 = 1.2;
    /// Largest combined factor.
    pub const MAX_SCALE: f64 = Self::SELECTED_SCALE * Self::HOVERED_SCALE;

    pub fn new(selected: Option<usize>, hovered: Option<usize>) -> Self {
        Self { selected, hovered }
    }

    pub fn scale(&self, slot: usize) -> f64 {
        let mut scale = 1.0;
        if self.selected == Some(slot) {
            scale *= Self::SELECTED_SCALE;
        }
        if self.hovered == Some(slot) {
            scale *= Self::HOVERED_SCALE;
        }
        scale
    }
}

/// Clamped linear growth of `[min, max]` with event count.
///
/// Zero or one event maps to `min`; counts at or beyond `reference` map to `max`.
pub fn scaled_by_events(event_count: usize, min: f64, max: f64, reference: usize) -> f64 {
    if event_count <= 1 || reference <= 1 {
        return min;
    }
    let t = (event_count - 1) as f64 / (reference - 1) as f64;
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    lerp(min, max, t).clamp(lo, hi)
}

/// Computes visual properties with a color mode resolved once.
#[derive(Debug, Clone)]
pub struct VisualCalculator {
    config: VisualConfig,
    mode: ColorMode,
    color: ColorFn,
}

impl VisualCalculator {
    pub fn new(config: VisualConfig, mode: ColorMode) -> Self {
        Self {
            config,
            mode,
            color: mode.resolver(),
        }
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ColorMode) {
        self.mode = mode;
        self.color = mode.resolver();
    }

    pub fn config(&self) -> &VisualConfig {
        &self.config
    }

    #[inline]
    pub fn color(&self, entity: &Entity) -> Rgb {
        (self.color)(entity)
    }

    pub fn thickness(&self, entity: &Entity) -> f64 {
        let c = &self.config;
        scaled_by_events(entity.event_count(), c.min_thickness, c.max_thickness, c.reference_events)
    }

    /// Base tile size before selection / hover emphasis.
    pub fn tile_size(&self, entity: &Entity) -> f64 {
        let c = &self.config;
        scaled_by_events(entity.event_count(), c.min_tile_size, c.max_tile_size, c.reference_events)
    }

    pub fn compute(&self, entity: &Entity) -> VisualProperties {
        VisualProperties {
            color: self.color(entity),
            thickness: self.thickness(entity),
            size: self.tile_size(entity),
            texture: Texture::for_style(entity.style()),
        }
    }
}

impl Default for VisualCalculator {
    fn default() -> Self {
        Self::new(VisualConfig::default(), ColorMode::default())
    }
}

/// One-shot property computation for a given color mode.
pub fn compute_properties(entity: &Entity, mode: ColorMode) -> VisualProperties {
    VisualCalculator::new(VisualConfig::default(), mode).compute(entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Event;

    fn entity(style: EngagementStyle, events: usize, category: Category) -> Entity {
        let events = (0..events)
            .map(|i| Event::new((i % 8) as u8 + 1, category, "Event"))
            .collect();
        Entity::with_events("S001", style, events)
    }

    #[test]
    fn test_every_category_and_style_has_a_color() {
        for category in Category::ALL {
            for style in EngagementStyle::ALL {
                let e = entity(style, 3, category);
                for mode in ColorMode::ALL {
                    let props = compute_properties(&e, mode);
                    assert_eq!(props.color, mode.resolver()(&e));
                    assert!(props.size > 0.0);
                }
            }
        }
        assert_eq!(category_color(Category::Other), FALLBACK_GREY);
        assert_eq!(
            compute_properties(
                &entity(EngagementStyle::Sampler, 0, Category::Social),
                ColorMode::ByCategory,
            )
            .color,
            FALLBACK_GREY
        );
    }

    #[test]
    fn test_color_modes() {
        let e = entity(EngagementStyle::Specialist, 8, Category::Academic);
        assert_eq!(compute_properties(&e, ColorMode::ByCategory).color, SMU_BLUE);
        assert_eq!(compute_properties(&e, ColorMode::ByStyle).color, SMU_RED);
        assert_eq!(compute_properties(&e, ColorMode::ByIntensity).color, SMU_RED);
    }

    #[test]
    fn test_intensity_buckets() {
        assert_eq!(intensity_color(0), SMU_BLUE);
        assert_eq!(intensity_color(3), SMU_BLUE);
        assert_eq!(intensity_color(4), SMU_TEAL);
        assert_eq!(intensity_color(7), SMU_RED);
        assert_eq!(intensity_color(500), SMU_RED);
    }

    #[test]
    fn test_thickness_is_clamped_and_monotonic() {
        let calc = VisualCalculator::default();
        let mut previous = 0.0;
        for n in 0..40 {
            let t = calc.thickness(&entity(EngagementStyle::Sampler, n, Category::Social));
            assert!((1.0..=4.0).contains(&t), "{n} events gave {t}");
            assert!(t >= previous);
            previous = t;
        }
        assert_eq!(scaled_by_events(0, 1.0, 4.0, 20), 1.0);
        assert_eq!(scaled_by_events(1, 1.0, 4.0, 20), 1.0);
        assert_eq!(scaled_by_events(20, 1.0, 4.0, 20), 4.0);
        assert_eq!(scaled_by_events(1000, 1.0, 4.0, 20), 4.0);
        // Degenerate reference never divides by zero
        assert_eq!(scaled_by_events(5, 1.0, 4.0, 1), 1.0);
    }

    #[test]
    fn test_texture_table() {
        assert_eq!(Texture::for_style(EngagementStyle::Sampler).pattern, TexturePattern::Dotted);
        assert_eq!(Texture::for_style(EngagementStyle::SuperConnector).scale, 0.5);
        assert_eq!(Texture::for_style_name("selective").pattern, TexturePattern::Dashed);
        assert_eq!(Texture::for_style_name("wanderer"), Texture::DEFAULT);
    }

    #[test]
    fn test_dash() {
        let [on, off] = Texture::for_style(EngagementStyle::Specialist).dash().unwrap();
        assert!((on - 1.0).abs() < 1e-12 && (off - 0.6).abs() < 1e-12);
        let flat = Texture {
            pattern: TexturePattern::Solid,
            scale: 0.05,
        };
        assert_eq!(flat.dash(), None);
    }

    #[test]
    fn test_parse_color_mode() {
        assert_eq!("by-style".parse::<ColorMode>().unwrap(), ColorMode::ByStyle);
        assert_eq!("intensity".parse::<ColorMode>().unwrap(), ColorMode::ByIntensity);
        assert!("rainbow".parse::<ColorMode>().is_err());
    }

    #[test]
    fn test_emphasis_scale() {
        let emphasis = Emphasis::new(Some(1), Some(2));
        assert_eq!(emphasis.scale(0), 1.0);
        assert_eq!(emphasis.scale(1), 1.5);
        assert_eq!(emphasis.scale(2), 1.2);
        assert!((Emphasis::new(Some(3), Some(3)).scale(3) - Emphasis::MAX_SCALE).abs() < 1e-12);
    }

    #[test]
    fn test_set_mode_swaps_resolver() {
        let e = entity(EngagementStyle::Selective, 2, Category::Athletic);
        let mut calc = VisualCalculator::default();
        assert_eq!(calc.color(&e), SMU_RED);
        calc.set_mode(ColorMode::ByStyle);
        assert_eq!(calc.color(&e), SMU_YELLOW);
    }
}
