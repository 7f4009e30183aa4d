//! MosaicEngine - the composition root.
//!
//! The engine owns the data store and hands it by reference to the layout
//! assigner, hit tester and frame builders. It also owns the viewport, the
//! render loop and the selection, and it is the only place that mutates any
//! of them in response to host commands and pointer events.
//!
//! Lifecycle: the engine starts `Initializing`, and becomes `Ready` once a
//! data set has been placed. Interaction before that is a no-op. A failed or
//! empty load falls back to synthetic data rather than surfacing an error.

use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::Serialize;

use crate::config::MosaicConfig;
use crate::error::Result;
use crate::geometry::Point;
use crate::hit::{HitScene, HitTester};
use crate::ingest::{self, DataSource};
use crate::input::{Action, InputState, PointerEvent};
use crate::layout::{LayoutAssigner, PatternGenerator, ThreadPath};
use crate::model::{
    Category, CategoryDistribution, DataStore, EngagementStyle, Entity, Event, Filter, Position,
};
use crate::render::{Clock, DisplayMode, Frame, FrameBuilder, RenderLoop, Scene, Selection};
use crate::viewport::Viewport;
use crate::visual::{ColorMode, VisualCalculator};

/// Where the engine is in its load lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadState {
    #[default]
    Initializing,
    Ready,
}

/// Which data set is currently placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataOrigin {
    Synthetic,
    Attendance,
}

/// Everything the detail panel shows for one entity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDetails<'a> {
    pub id: &'a str,
    pub engagement_style: EngagementStyle,
    pub primary_category: Category,
    pub category_distribution: &'a CategoryDistribution,
    pub events: &'a [Event],
    pub position: Position,
    pub connections: Vec<&'a str>,
}

/// Composition root for the mosaic.
pub struct MosaicEngine {
    config: MosaicConfig,
    rng: Pcg64,

    store: DataStore,
    viewport: Viewport,
    visuals: VisualCalculator,
    hit: HitTester,
    render: RenderLoop,
    selection: Selection,
    input: InputState,

    display_mode: DisplayMode,
    build_frame: FrameBuilder,

    /// Pattern points used by the last placement.
    pattern: Vec<Point>,
    /// Slot-indexed thread paths; built on first use since they carry jitter.
    paths: Vec<ThreadPath>,
    /// Visible slots, bottom to top.
    draw_order: Vec<usize>,
    hit_scene: HitScene,

    load_state: LoadState,
    origin: Option<DataOrigin>,
}

impl std::fmt::Debug for MosaicEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MosaicEngine")
            .field("load_state", &self.load_state)
            .field("entities", &self.store.len())
            .field("display_mode", &self.display_mode)
            .field("render", &self.render)
            .finish_non_exhaustive()
    }
}

impl MosaicEngine {
    /// Create an engine driven by a manual clock.
    pub fn new(config: MosaicConfig) -> Result<Self> {
        let render = RenderLoop::manual(&config.render);
        Self::with_render_loop(config, render)
    }

    /// Create an engine whose render loop reads time from `clock`.
    pub fn with_clock(config: MosaicConfig, clock: Box<dyn Clock>) -> Result<Self> {
        let render = RenderLoop::new(&config.render, clock);
        Self::with_render_loop(config, render)
    }

    fn with_render_loop(config: MosaicConfig, render: RenderLoop) -> Result<Self> {
        let config = config.validated()?;
        let display_mode = config.render.display_mode;

        Ok(Self {
            rng: Pcg64::seed_from_u64(config.seed),
            store: DataStore::new(),
            viewport: Viewport::new(&config.viewport),
            visuals: VisualCalculator::new(config.visual.clone(), config.color_mode),
            hit: HitTester::new(config.hit.clone()),
            render,
            selection: Selection::default(),
            input: InputState::default(),
            display_mode,
            build_frame: display_mode.builder(),
            pattern: Vec::new(),
            paths: Vec::new(),
            draw_order: Vec::new(),
            hit_scene: HitScene::empty(),
            load_state: LoadState::Initializing,
            origin: None,
            config,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &MosaicConfig {
        &self.config
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn is_ready(&self) -> bool {
        self.load_state == LoadState::Ready
    }

    pub fn origin(&self) -> Option<DataOrigin> {
        self.origin
    }

    pub fn pattern(&self) -> &[Point] {
        &self.pattern
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn color_mode(&self) -> ColorMode {
        self.visuals.mode()
    }

    pub fn draw_order(&self) -> &[usize] {
        &self.draw_order
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selection.selected().and_then(|s| self.store.entity(s)).map(Entity::id)
    }

    pub fn hovered_id(&self) -> Option<&str> {
        self.selection.hovered().and_then(|s| self.store.entity(s)).map(Entity::id)
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Generate and place the synthetic class.
    pub fn generate_synthetic(&mut self) {
        let entities = ingest::synthetic::generate(
            &self.config.data,
            self.config.layout.pattern_count,
            &mut self.rng,
        );
        self.place(entities, DataOrigin::Synthetic);
    }

    /// Load attendance data, falling back to synthetic data on failure.
    ///
    /// Returns the origin of the data that ended up placed.
    pub fn load(&mut self, source: &DataSource) -> DataOrigin {
        self.load_state = LoadState::Initializing;
        match ingest::load(source, &self.config.data) {
            Ok(entities) => self.place(entities, DataOrigin::Attendance),
            Err(err) => {
                log::warn!("{err}; falling back to synthetic data");
                self.generate_synthetic();
            }
        }
        self.origin.unwrap_or(DataOrigin::Synthetic)
    }

    /// Place already-built entities; an empty list falls back to synthetic data.
    pub fn load_entities(&mut self, entities: Vec<Entity>) -> DataOrigin {
        if entities.is_empty() {
            log::warn!("No entities supplied; falling back to synthetic data");
            self.generate_synthetic();
        } else {
            self.place(entities, DataOrigin::Attendance);
        }
        self.origin.unwrap_or(DataOrigin::Synthetic)
    }

    /// Lay out `entities` and make them the current data set.
    fn place(&mut self, entities: Vec<Entity>, origin: DataOrigin) {
        let pattern_count = self.config.layout.pattern_count.min(entities.len());
        let generator = PatternGenerator::new(self.config.pattern.clone());
        self.pattern = generator.generate(pattern_count, &mut self.rng);

        let assigner = LayoutAssigner::new(self.config.layout.clone());
        let positions = assigner.assign(&entities, &self.pattern, &mut self.rng);

        let filter = self.store.filter().clone();
        self.store = DataStore::from_placed(entities.into_iter().zip(positions).collect());
        self.store.apply_filter(filter);
        self.store.rebuild_connections();

        self.paths.clear();
        self.selection.clear();
        self.input.release();
        self.origin = Some(origin);
        self.load_state = LoadState::Ready;
        self.rebuild_scene();

        log::info!(
            "Placed {} entities ({} fixed, {} connections)",
            self.store.len(),
            self.store.positions().iter().filter(|p| p.fixed).count(),
            self.store.connections().len()
        );
        self.selection.push(Action::RenderNeeded);
    }

    // =========================================================================
    // Scene
    // =========================================================================

    /// Recompute draw order and the hit scene from store, filter and mode.
    fn rebuild_scene(&mut self) {
        let filtered = self.store.filtered();
        let positions = self.store.positions();
        let is_fixed = |slot: &usize| positions.get(*slot).is_some_and(|p| p.fixed);
        self.draw_order = filtered
            .iter()
            .copied()
            .filter(|s| !is_fixed(s))
            .chain(filtered.iter().copied().filter(|s| is_fixed(s)))
            .collect();

        let (width, height) = (self.config.world.width, self.config.world.height);
        self.hit_scene = if self.display_mode.uses_threads() {
            self.ensure_paths();
            let store = &self.store;
            let visuals = &self.visuals;
            HitScene::threads(
                self.draw_order
                    .iter()
                    .filter_map(|&slot| store.entity(slot).map(|e| (slot, visuals.thickness(e)))),
                &self.paths,
            )
        } else {
            let store = &self.store;
            let visuals = &self.visuals;
            HitScene::tiles(self.draw_order.iter().filter_map(|&slot| {
                let entity = store.entity(slot)?;
                let p = store.position(slot)?;
                Some((slot, Point::new(p.x * width, p.y * height), visuals.tile_size(entity)))
            }))
        };
    }

    /// Build thread paths for every slot if they are missing.
    fn ensure_paths(&mut self) {
        if self.paths.len() == self.store.len() {
            return;
        }
        let (width, height) = (self.config.world.width, self.config.world.height);
        let rng = &mut self.rng;
        self.paths = self
            .store
            .entities()
            .iter()
            .enumerate()
            .map(|(slot, entity)| {
                let thickness = self.visuals.thickness(entity);
                let config = &self.config.thread;
                ThreadPath::build(entity, slot, thickness, width, height, config, &mut *rng)
            })
            .collect();
        log::debug!("Built {} thread paths", self.paths.len());
    }

    /// Build the display list for the current state.
    pub fn frame(&self) -> Frame {
        let scene = Scene {
            store: &self.store,
            draw_order: &self.draw_order,
            visuals: &self.visuals,
            paths: &self.paths,
            viewport: &self.viewport,
            world_width: self.config.world.width,
            world_height: self.config.world.height,
            emphasis: self.selection.emphasis(),
            phase: self.render.phase(),
            months: self.config.data.months,
        };
        (self.build_frame)(&scene)
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        if mode == self.display_mode {
            return;
        }
        self.display_mode = mode;
        self.build_frame = mode.builder();
        self.rebuild_scene();
        self.selection.push(Action::RenderNeeded);
    }

    pub fn set_color_mode(&mut self, mode: ColorMode) {
        if mode == self.visuals.mode() {
            return;
        }
        self.visuals.set_mode(mode);
        self.selection.push(Action::RenderNeeded);
    }

    // =========================================================================
    // Filtering and selection
    // =========================================================================

    /// Replace the filter. A selection that is filtered out is cleared.
    pub fn set_filter(&mut self, filter: Filter) -> usize {
        let visible = self.store.apply_filter(filter).len();
        self.drop_hidden_emphasis();
        self.rebuild_scene();
        self.selection.push(Action::RenderNeeded);
        visible
    }

    fn drop_hidden_emphasis(&mut self) {
        let filtered = self.store.filtered();
        if self.selection.selected().is_some_and(|s| filtered.binary_search(&s).is_err()) {
            self.selection.select(None, &self.store);
        }
        if self.selection.hovered().is_some_and(|s| filtered.binary_search(&s).is_err()) {
            self.selection.hover(None, &self.store);
        }
    }

    /// Filter by id substring (keeping category and style) and select the
    /// first match. Returns the selected id.
    pub fn search_and_select(&mut self, term: &str) -> Option<String> {
        let current = self.store.filter().clone();
        self.set_filter(Filter::new(current.category, current.style, term));
        let first = self.store.filtered().first().copied();
        self.selection.select(first, &self.store);
        first.and_then(|s| self.store.entity(s)).map(|e| e.id().to_string())
    }

    /// Select by id; `None` clears. Unknown ids are ignored.
    ///
    /// Returns whether the selection changed.
    pub fn select(&mut self, id: Option<&str>) -> bool {
        if !self.is_ready() {
            return false;
        }
        let slot = match id {
            Some(id) => match self.store.slot_of(id) {
                Some(slot) => Some(slot),
                None => return false,
            },
            None => None,
        };
        let changed = self.selection.select(slot, &self.store);
        if changed {
            self.selection.push(Action::RenderNeeded);
        }
        changed
    }

    /// Details for the detail panel, or `None` for unknown ids.
    pub fn entity_details(&self, id: &str) -> Option<EntityDetails<'_>> {
        let slot = self.store.slot_of(id)?;
        let entity = self.store.entity(slot)?;
        Some(EntityDetails {
            id: entity.id(),
            engagement_style: entity.style(),
            primary_category: entity.primary_category(),
            category_distribution: entity.distribution(),
            events: entity.events(),
            position: self.store.position(slot).unwrap_or_else(Position::center),
            connections: self.store.connections_of(id),
        })
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Topmost visible entity under a screen point.
    pub fn pick(&self, screen: Point) -> Option<usize> {
        self.hit.hit_test(
            &self.hit_scene,
            &self.paths,
            &self.viewport,
            screen,
            self.selection.emphasis(),
        )
    }

    /// Handle one pointer event and return the notifications it produced.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Vec<Action> {
        if !self.is_ready() {
            return Vec::new();
        }

        let at = event.point();
        match event {
            PointerEvent::Down { .. } => {
                let slot = self.pick(at);
                if self.selection.select(slot, &self.store) {
                    self.selection.push(Action::RenderNeeded);
                }
                self.input.press(at);
            }
            PointerEvent::Move { .. } => {
                if let Some((dx, dy)) = self.input.drag(at) {
                    self.viewport.pan(dx, dy);
                    self.selection.push(Action::RenderNeeded);
                } else {
                    let slot = self.pick(at);
                    if self.selection.hover(slot, &self.store) {
                        self.selection.push(Action::RenderNeeded);
                    }
                }
            }
            PointerEvent::Up { .. } => self.input.release(),
            PointerEvent::Wheel { delta_y, .. } => {
                self.viewport.wheel(delta_y, at.x, at.y);
                self.selection.push(Action::RenderNeeded);
            }
        }
        self.drain_actions()
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
        self.selection.push(Action::RenderNeeded);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
        self.selection.push(Action::RenderNeeded);
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
        self.selection.push(Action::RenderNeeded);
    }

    /// Canvas resized to `width` x `height` CSS pixels.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport.set_size(width, height);
        self.selection.push(Action::RenderNeeded);
    }

    /// Take every queued notification.
    pub fn drain_actions(&mut self) -> Vec<Action> {
        self.selection.drain()
    }

    // =========================================================================
    // Animation
    // =========================================================================

    pub fn start(&mut self) {
        self.render.start();
    }

    pub fn stop(&mut self) {
        self.render.stop();
    }

    /// Advance the animation by `delta_ms`; returns whether to redraw.
    pub fn tick(&mut self, delta_ms: f64) -> bool {
        self.is_ready() && self.render.tick(delta_ms)
    }

    /// Advance using the injected clock.
    pub fn tick_from_clock(&mut self) -> bool {
        self.is_ready() && self.render.tick_from_clock()
    }
}
