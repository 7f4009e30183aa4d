//! Render loop, frame construction and selection notifications.
//!
//! The loop is an explicit `idle -> running -> idle` state machine. While
//! running, every [`RenderLoop::tick`] advances the animation phase by a fixed
//! step and asks for a redraw. Time comes from an injectable [`Clock`] so the
//! loop can be driven deterministically in tests.
//!
//! Each redraw rebuilds the whole [`Frame`] (a serializable display list in
//! world coordinates plus the viewport transform) from current state; nothing
//! is diffed. The per-mode frame builder is resolved once from the display
//! mode, not re-branched per entity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MosaicError;
use crate::geometry::Point;
use crate::input::Action;
use crate::layout::{CubicSegment, ThreadPath};
use crate::model::DataStore;
use crate::viewport::Viewport;
use crate::visual::{Emphasis, VisualCalculator, category_color};

/// Zoom below which the mosaic shows faint connection lines.
const MOSAIC_CONNECTION_ZOOM: f64 = 2.0;

// =============================================================================
// Display modes
// =============================================================================

/// What the scene is drawn as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    /// Square tiles; pattern tiles drawn on top of free tiles.
    #[default]
    Mosaic,
    /// Tiles plus every shared-event connection.
    Network,
    /// Tiles growing and turning as a month cursor sweeps the year.
    Evolution,
    /// One woven thread per entity.
    Tapestry,
}

/// Builds a frame for one display mode.
pub type FrameBuilder = fn(&Scene<'_>) -> Frame;

impl DisplayMode {
    pub const ALL: [DisplayMode; 4] =
        [Self::Mosaic, Self::Network, Self::Evolution, Self::Tapestry];

    pub fn builder(self) -> FrameBuilder {
        match self {
            Self::Mosaic => build_mosaic,
            Self::Network => build_network,
            Self::Evolution => build_evolution,
            Self::Tapestry => build_tapestry,
        }
    }

    /// Whether entities are hit-tested as threads rather than tiles.
    pub fn uses_threads(self) -> bool {
        self == Self::Tapestry
    }

    /// Whether the mode draws connection lines.
    pub fn uses_connections(self) -> bool {
        matches!(self, Self::Mosaic | Self::Network)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mosaic => "mosaic",
            Self::Network => "network",
            Self::Evolution => "evolution",
            Self::Tapestry => "tapestry",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = MosaicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MosaicError::unknown_mode("display", s))
    }
}

// =============================================================================
// Frame (display list)
// =============================================================================

/// A square tile in world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileDraw {
    pub id: String,
    pub x: f64,
    pub y: f64,
    /// Side length including emphasis and evolution scale.
    pub size: f64,
    pub rotation: f64,
    pub color: String,
    pub fixed: bool,
}

/// An event knot on a thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnotDraw {
    pub x: f64,
    pub y: f64,
    pub count: usize,
    pub color: String,
}

/// A thread in world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadDraw {
    pub id: String,
    pub color: String,
    pub thickness: f64,
    pub dash: Option<[f64; 2]>,
    pub highlighted: bool,
    pub segments: Vec<CubicSegment>,
    pub knots: Vec<KnotDraw>,
}

/// A connection line in world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineDraw {
    pub from: Point,
    pub to: Point,
    pub color: String,
    pub width: f64,
}

/// Everything the host needs to draw one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Host applies `screen = world * zoom + pan`.
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    pub phase: f64,
    pub connections: Vec<LineDraw>,
    pub tiles: Vec<TileDraw>,
    pub threads: Vec<ThreadDraw>,
    pub month_label: Option<String>,
}

/// Read-only state a frame is built from.
pub struct Scene<'a> {
    pub store: &'a DataStore,
    /// Visible slots, bottom to top.
    pub draw_order: &'a [usize],
    pub visuals: &'a VisualCalculator,
    /// Slot-indexed thread paths; empty outside the tapestry view.
    pub paths: &'a [ThreadPath],
    pub viewport: &'a Viewport,
    pub world_width: f64,
    pub world_height: f64,
    pub emphasis: Emphasis,
    pub phase: f64,
    pub months: u8,
}

impl Scene<'_> {
    fn empty_frame(&self) -> Frame {
        Frame {
            zoom: self.viewport.zoom(),
            pan_x: self.viewport.pan_x,
            pan_y: self.viewport.pan_y,
            phase: self.phase,
            ..Frame::default()
        }
    }

    /// World-space centre of a slot.
    fn world_position(&self, slot: usize) -> Option<Point> {
        self.store
            .position(slot)
            .map(|p| Point::new(p.x * self.world_width, p.y * self.world_height))
    }

    fn tile(&self, slot: usize, scale: f64, rotation: f64) -> Option<TileDraw> {
        let entity = self.store.entity(slot)?;
        let position = self.store.position(slot)?;
        let alpha = if position.fixed { 1.0 } else { 0.7 };
        Some(TileDraw {
            id: entity.id().to_string(),
            x: position.x * self.world_width,
            y: position.y * self.world_height,
            size: self.visuals.tile_size(entity) * self.emphasis.scale(slot) * scale,
            rotation,
            color: self.visuals.color(entity).css(alpha),
            fixed: position.fixed,
        })
    }

    fn tiles(&self) -> Vec<TileDraw> {
        self.draw_order.iter().filter_map(|&slot| self.tile(slot, 1.0, 0.0)).collect()
    }

    /// Connections between visible entities at the given base opacity.
    fn connections(&self, opacity: f64) -> Vec<LineDraw> {
        let mut visible = vec![false; self.store.len()];
        for &slot in self.draw_order {
            if let Some(v) = visible.get_mut(slot) {
                *v = true;
            }
        }

        self.store
            .connections()
            .iter()
            .filter(|c| {
                visible.get(c.a).copied().unwrap_or(false)
                    && visible.get(c.b).copied().unwrap_or(false)
            })
            .filter_map(|c| {
                let from = self.world_position(c.a)?;
                let to = self.world_position(c.b)?;
                let touches_selection =
                    self.emphasis.selected.is_some_and(|s| s == c.a || s == c.b);
                let (width, alpha) = if touches_selection { (2.0, 1.0) } else { (0.5, opacity) };
                Some(LineDraw {
                    from,
                    to,
                    color: category_color(c.shared.category).css(alpha),
                    width,
                })
            })
            .collect()
    }

    /// Month under the evolution cursor, in `1..=months`.
    fn cursor_month(&self) -> u8 {
        let months = self.months.max(1);
        let t = (self.phase.sin() + 1.0) / 2.0;
        let month = (t * months as f64).floor() as i64 + 1;
        month.clamp(1, months as i64) as u8
    }
}

fn build_mosaic(scene: &Scene<'_>) -> Frame {
    let mut frame = scene.empty_frame();
    if scene.viewport.zoom() < MOSAIC_CONNECTION_ZOOM {
        frame.connections = scene.connections(0.15);
    }
    frame.tiles = scene.tiles();
    frame
}

fn build_network(scene: &Scene<'_>) -> Frame {
    let mut frame = scene.empty_frame();
    frame.connections = scene.connections(0.8);
    frame.tiles = scene.tiles();
    frame
}

fn build_evolution(scene: &Scene<'_>) -> Frame {
    let mut frame = scene.empty_frame();
    let month = scene.cursor_month();
    let rotation = scene.phase * 0.1;
    frame.tiles = scene
        .draw_order
        .iter()
        .filter_map(|&slot| {
            let entity = scene.store.entity(slot)?;
            let grown = entity.events_through(month) as f64 / entity.event_count().max(1) as f64;
            scene.tile(slot, grown, rotation)
        })
        .collect();
    frame.month_label = Some(format!("Month {month}"));
    frame
}

fn build_tapestry(scene: &Scene<'_>) -> Frame {
    let mut frame = scene.empty_frame();
    let focus = scene.emphasis.selected.or(scene.emphasis.hovered);
    let dim_others = scene.emphasis.selected.is_some();

    frame.threads = scene
        .draw_order
        .iter()
        .filter_map(|&slot| {
            let entity = scene.store.entity(slot)?;
            let path = scene.paths.get(slot)?;
            let props = scene.visuals.compute(entity);
            let highlighted = focus == Some(slot);
            let opacity = if highlighted {
                1.0
            } else if dim_others {
                80.0 / 255.0
            } else {
                220.0 / 255.0
            };

            let offset = |at: Point| {
                if highlighted {
                    (scene.phase * 2.0 + at.x * 0.01).sin() * 3.0
                } else {
                    0.0
                }
            };
            let segments = path
                .segments()
                .iter()
                .map(|s| {
                    let dy = offset(s.p0);
                    let shift = |p: Point| Point::new(p.x, p.y + dy);
                    CubicSegment {
                        p0: shift(s.p0),
                        p1: shift(s.p1),
                        p2: shift(s.p2),
                        p3: shift(s.p3),
                    }
                })
                .collect();
            let knots = path
                .anchors()
                .iter()
                .filter(|a| !a.events.is_empty())
                .map(|a| KnotDraw {
                    x: a.point.x,
                    y: a.point.y + offset(a.point),
                    count: a.events.len(),
                    color: category_color(a.events[0].category).css(opacity),
                })
                .collect();

            Some(ThreadDraw {
                id: entity.id().to_string(),
                color: props.color.css(opacity),
                thickness: if highlighted { props.thickness * 1.5 } else { props.thickness },
                dash: props.texture.dash(),
                highlighted,
                segments,
                knots,
            })
        })
        .collect();
    frame
}

// =============================================================================
// Clock and loop
// =============================================================================

/// Monotonic millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Clock advanced by hand.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: std::cell::Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: std::cell::Cell::new(start_ms),
        }
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Browser wall clock.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct BrowserClock;

#[cfg(target_arch = "wasm32")]
impl Clock for BrowserClock {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

/// Render loop lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopState {
    #[default]
    Idle,
    Running,
}

/// Configuration for the render loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Phase advance per tick (default: 0.05).
    pub phase_step: f64,
    /// Initial display mode (default: mosaic).
    pub display_mode: DisplayMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            phase_step: 0.05,
            display_mode: DisplayMode::Mosaic,
        }
    }
}

/// Explicitly ticked animation loop.
pub struct RenderLoop {
    state: LoopState,
    phase: f64,
    phase_step: f64,
    frames: u64,
    elapsed_ms: f64,
    clock: Box<dyn Clock>,
    last_ms: Option<f64>,
}

impl fmt::Debug for RenderLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderLoop")
            .field("state", &self.state)
            .field("phase", &self.phase)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl RenderLoop {
    pub fn new(config: &RenderConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            state: LoopState::Idle,
            phase: 0.0,
            phase_step: config.phase_step,
            frames: 0,
            elapsed_ms: 0.0,
            clock,
            last_ms: None,
        }
    }

    /// Loop driven by a manual clock starting at zero.
    pub fn manual(config: &RenderConfig) -> Self {
        Self::new(config, Box::new(ManualClock::default()))
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Ticks that advanced the phase since creation.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn start(&mut self) {
        if self.state == LoopState::Idle {
            log::info!("Render loop started");
            self.state = LoopState::Running;
            self.last_ms = Some(self.clock.now_ms());
        }
    }

    pub fn stop(&mut self) {
        if self.state == LoopState::Running {
            log::info!("Render loop stopped after {} frames", self.frames);
            self.state = LoopState::Idle;
            self.last_ms = None;
        }
    }

    /// Advance by one frame of `delta_ms`; returns whether a redraw is due.
    ///
    /// Idle loops ignore ticks.
    pub fn tick(&mut self, delta_ms: f64) -> bool {
        if self.state != LoopState::Running {
            return false;
        }
        self.phase += self.phase_step;
        self.frames += 1;
        if delta_ms.is_finite() && delta_ms > 0.0 {
            self.elapsed_ms += delta_ms;
        }
        true
    }

    /// Tick using the injected clock for the delta.
    pub fn tick_from_clock(&mut self) -> bool {
        let now = self.clock.now_ms();
        let delta = self.last_ms.map_or(0.0, |last| now - last);
        self.last_ms = Some(now);
        self.tick(delta)
    }
}

// =============================================================================
// Selection
// =============================================================================

/// Selected / hovered slots plus the outbox of change notifications.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    selected: Option<usize>,
    hovered: Option<usize>,
    outbox: Vec<Action>,
}

impl Selection {
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn emphasis(&self) -> Emphasis {
        Emphasis::new(self.selected, self.hovered)
    }

    /// Change the selection; queues exactly one notification per actual change.
    pub fn select(&mut self, slot: Option<usize>, store: &DataStore) -> bool {
        if slot == self.selected {
            return false;
        }
        self.selected = slot;
        let id = slot.and_then(|s| store.entity(s)).map(|e| e.id().to_string());
        self.outbox.push(Action::SelectionChanged(id));
        true
    }

    /// Change the hover target; queues a notification per actual change.
    pub fn hover(&mut self, slot: Option<usize>, store: &DataStore) -> bool {
        if slot == self.hovered {
            return false;
        }
        self.hovered = slot;
        let id = slot.and_then(|s| store.entity(s)).map(|e| e.id().to_string());
        self.outbox.push(Action::HoverChanged(id));
        true
    }

    pub fn push(&mut self, action: Action) {
        self.outbox.push(action);
    }

    /// Take every queued notification.
    pub fn drain(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.outbox)
    }

    /// Forget selection and hover without notifying.
    pub fn clear(&mut self) {
        self.selected = None;
        self.hovered = None;
    }
}
