//! Spirit Mosaic - WASM Module
//!
//! Spatial layout and interactive canvas engine for the Spirit Mosaic: every
//! student is a tile (or a thread in the tapestry view) placed inside a
//! school-mascot silhouette or in a category band around it. This crate owns
//! layout, pan/zoom, hit testing and frame construction; the JavaScript host
//! owns the canvas, the DOM and the detail panel.
//!
//! # Architecture
//!
//! - `geometry`: points, bounds, segment/bezier/polygon math
//! - `model`: entities, filter and the explicitly owned `DataStore`
//! - `layout`: pattern generator, layout assigner, thread paths
//! - `visual`: color/size/texture derivation with a color-mode dispatch table
//! - `spatial`: R-tree indices for overlap checks and hit pre-filtering
//! - `viewport`, `hit`, `input`: pan/zoom, picking, platform-neutral input
//! - `render`: ticked render loop, injectable clock, frame builders
//! - `ingest`: synthetic generator and attendance-row ingestion
//! - `engine`: `MosaicEngine`, the composition root wrapped by this facade

use js_sys::Float64Array;
use wasm_bindgen::prelude::*;

pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod hit;
pub mod ingest;
pub mod input;
pub mod layout;
pub mod model;
pub mod render;
pub mod spatial;
pub mod viewport;
pub mod visual;

pub use config::MosaicConfig;
pub use engine::{DataOrigin, LoadState, MosaicEngine};
pub use error::{MosaicError, Result};

use ingest::{AttendanceRow, DataSource};
use input::{Action, PointerEvent};
use model::Filter;
use render::DisplayMode;
use visual::ColorMode;

/// Initialize the WASM module: panic hook and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        // A second init (hot reload) leaves the first logger in place
        let _ = console_log::init_with_level(log::Level::Info);
    }
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_value<T: serde::Serialize + ?Sized>(value: &T) -> std::result::Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(JsValue::from)
}

/// Main entry point for the mosaic engine.
///
/// This struct wraps the internal MosaicEngine and provides the public API
/// exposed to JavaScript.
#[wasm_bindgen]
pub struct SpiritMosaicWasm {
    engine: MosaicEngine,
}

#[wasm_bindgen]
impl SpiritMosaicWasm {
    /// Create an engine from a (possibly partial) options object.
    ///
    /// `undefined` or `null` uses the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> std::result::Result<SpiritMosaicWasm, JsValue> {
        let config: MosaicConfig = if options.is_undefined() || options.is_null() {
            MosaicConfig::default()
        } else {
            serde_wasm_bindgen::from_value(options)
                .map_err(|e| to_js(MosaicError::InvalidConfig(e.to_string())))?
        };

        #[cfg(target_arch = "wasm32")]
        let engine = MosaicEngine::with_clock(config, Box::new(render::BrowserClock));
        #[cfg(not(target_arch = "wasm32"))]
        let engine = MosaicEngine::new(config);

        Ok(Self {
            engine: engine.map_err(to_js)?,
        })
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Generate the synthetic class.
    #[wasm_bindgen(js_name = generateSynthetic)]
    pub fn generate_synthetic(&mut self) {
        self.engine.generate_synthetic();
    }

    /// Load attendance CSV text. Falls back to synthetic data when nothing
    /// usable is found.
    ///
    /// Returns `"attendance"` or `"synthetic"`.
    #[wasm_bindgen(js_name = loadCsv)]
    pub fn load_csv(&mut self, text: String) -> String {
        origin_str(self.engine.load(&DataSource::Csv(text)))
    }

    /// Load an array of attendance records
    /// (`{ studentId, eventName, eventType, eventTags, eventDate }`).
    ///
    /// An array that cannot be read at all falls back to synthetic data.
    #[wasm_bindgen(js_name = loadRows)]
    pub fn load_rows(&mut self, rows: JsValue) -> String {
        let rows: Vec<AttendanceRow> = serde_wasm_bindgen::from_value(rows).unwrap_or_else(|e| {
            log::warn!("Unreadable attendance rows: {e}");
            Vec::new()
        });
        origin_str(self.engine.load(&DataSource::Rows(rows)))
    }

    /// `"initializing"` or `"ready"`.
    #[wasm_bindgen(js_name = loadState)]
    pub fn load_state(&self) -> String {
        match self.engine.load_state() {
            LoadState::Initializing => "initializing",
            LoadState::Ready => "ready",
        }
        .to_string()
    }

    /// Number of entities in the store.
    #[wasm_bindgen(js_name = entityCount)]
    pub fn entity_count(&self) -> u32 {
        self.engine.store().len() as u32
    }

    /// World positions of every entity as `[x0, y0, x1, y1, ...]`.
    #[wasm_bindgen(js_name = getPositions)]
    pub fn get_positions(&self) -> Float64Array {
        let world = self.engine.config().world;
        let positions: Vec<f64> = self
            .engine
            .store()
            .positions()
            .iter()
            .flat_map(|p| [p.x * world.width, p.y * world.height])
            .collect();
        Float64Array::from(&positions[..])
    }

    /// Details of one entity for the detail panel; `null` for unknown ids.
    #[wasm_bindgen(js_name = getEntity)]
    pub fn get_entity(&self, id: &str) -> std::result::Result<JsValue, JsValue> {
        match self.engine.entity_details(id) {
            Some(details) => to_value(&details),
            None => Ok(JsValue::NULL),
        }
    }

    // =========================================================================
    // Filter and selection
    // =========================================================================

    /// Filter by category, style and id substring (`"all"` or `""` to skip a
    /// criterion). Returns the number of visible entities.
    #[wasm_bindgen(js_name = setFilter)]
    pub fn set_filter(
        &mut self,
        category: &str,
        style: &str,
        search: &str,
    ) -> std::result::Result<u32, JsValue> {
        let filter = Filter::parse(category, style, search).map_err(to_js)?;
        Ok(self.engine.set_filter(filter) as u32)
    }

    /// Search by id and select the first match.
    #[wasm_bindgen(js_name = searchAndSelect)]
    pub fn search_and_select(&mut self, term: &str) -> Option<String> {
        self.engine.search_and_select(term)
    }

    /// Select an entity by id; `undefined` clears the selection.
    ///
    /// Returns whether the selection changed.
    pub fn select(&mut self, id: Option<String>) -> bool {
        self.engine.select(id.as_deref())
    }

    #[wasm_bindgen(js_name = selectedId)]
    pub fn selected_id(&self) -> Option<String> {
        self.engine.selected_id().map(str::to_string)
    }

    #[wasm_bindgen(js_name = hoveredId)]
    pub fn hovered_id(&self) -> Option<String> {
        self.engine.hovered_id().map(str::to_string)
    }

    // =========================================================================
    // Modes
    // =========================================================================

    /// `mosaic`, `network`, `evolution` or `tapestry`.
    #[wasm_bindgen(js_name = setDisplayMode)]
    pub fn set_display_mode(&mut self, mode: &str) -> std::result::Result<(), JsValue> {
        let mode: DisplayMode = mode.parse().map_err(to_js)?;
        self.engine.set_display_mode(mode);
        Ok(())
    }

    /// `by-category`, `by-style` or `by-intensity` (the `by-` prefix is optional).
    #[wasm_bindgen(js_name = setColorMode)]
    pub fn set_color_mode(&mut self, mode: &str) -> std::result::Result<(), JsValue> {
        let mode: ColorMode = mode.parse().map_err(to_js)?;
        self.engine.set_color_mode(mode);
        Ok(())
    }

    #[wasm_bindgen(js_name = displayMode)]
    pub fn display_mode(&self) -> String {
        self.engine.display_mode().as_str().to_string()
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Handle a pointer event object (`{ type: "down" | "move" | "up" | "wheel", x, y, deltaY? }`).
    ///
    /// Returns the array of actions it produced.
    #[wasm_bindgen(js_name = handlePointer)]
    pub fn handle_pointer(&mut self, event: JsValue) -> std::result::Result<JsValue, JsValue> {
        let event: PointerEvent = serde_wasm_bindgen::from_value(event)?;
        to_value(&self.engine.handle_pointer(event))
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f64, y: f64) -> std::result::Result<JsValue, JsValue> {
        to_value(&self.engine.handle_pointer(PointerEvent::Down { x, y }))
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> std::result::Result<JsValue, JsValue> {
        to_value(&self.engine.handle_pointer(PointerEvent::Move { x, y }))
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, x: f64, y: f64) -> std::result::Result<JsValue, JsValue> {
        to_value(&self.engine.handle_pointer(PointerEvent::Up { x, y }))
    }

    pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) -> std::result::Result<JsValue, JsValue> {
        to_value(&self.engine.handle_pointer(PointerEvent::Wheel { x, y, delta_y }))
    }

    /// Actions queued by commands since the last drain.
    #[wasm_bindgen(js_name = drainActions)]
    pub fn drain_actions(&mut self) -> std::result::Result<JsValue, JsValue> {
        let actions: Vec<Action> = self.engine.drain_actions();
        to_value(&actions)
    }

    // =========================================================================
    // Viewport
    // =========================================================================

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&mut self) {
        self.engine.zoom_in();
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&mut self) {
        self.engine.zoom_out();
    }

    #[wasm_bindgen(js_name = resetView)]
    pub fn reset_view(&mut self) {
        self.engine.reset_view();
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.engine.resize(width, height);
    }

    pub fn zoom(&self) -> f64 {
        self.engine.viewport().zoom()
    }

    /// `[panX, panY]`.
    pub fn pan(&self) -> Float64Array {
        let viewport = self.engine.viewport();
        Float64Array::from(&[viewport.pan_x, viewport.pan_y][..])
    }

    // =========================================================================
    // Render loop
    // =========================================================================

    pub fn start(&mut self) {
        self.engine.start();
    }

    pub fn stop(&mut self) {
        self.engine.stop();
    }

    /// Advance the animation by `delta_ms`; returns whether to redraw.
    pub fn tick(&mut self, delta_ms: f64) -> bool {
        self.engine.tick(delta_ms)
    }

    /// Advance the animation using the browser clock.
    #[wasm_bindgen(js_name = tickNow)]
    pub fn tick_now(&mut self) -> bool {
        self.engine.tick_from_clock()
    }

    /// The display list for the current state.
    pub fn frame(&self) -> std::result::Result<JsValue, JsValue> {
        to_value(&self.engine.frame())
    }
}

fn origin_str(origin: DataOrigin) -> String {
    match origin {
        DataOrigin::Synthetic => "synthetic",
        DataOrigin::Attendance => "attendance",
    }
    .to_string()
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_facade_from_js_options() {
        let options = js_sys::JSON::parse(r#"{"seed":3,"data":{"entity_count":20}}"#).unwrap();
        let mut mosaic = SpiritMosaicWasm::new(options).unwrap();
        assert_eq!(mosaic.load_state(), "initializing");

        mosaic.generate_synthetic();
        assert_eq!(mosaic.load_state(), "ready");
        assert_eq!(mosaic.entity_count(), 20);
        assert_eq!(mosaic.get_positions().length(), 40);
        assert!(mosaic.frame().unwrap().is_object());

        mosaic.set_display_mode("tapestry").unwrap();
        assert_eq!(mosaic.display_mode(), "tapestry");
        assert!(mosaic.set_display_mode("spiral").is_err());
    }

    #[wasm_bindgen_test]
    fn test_facade_loads_csv_and_selects() {
        let mut mosaic = SpiritMosaicWasm::new(JsValue::UNDEFINED).unwrap();
        let csv = "student_id,event_name,event_type,event_tags,event_date\n\
                   S1,Career Fair,career,,2025-02-01\n\
                   S2,Study Group,academic,,2025-03-01\n";
        assert_eq!(mosaic.load_csv(csv.into()), "attendance");
        assert_eq!(mosaic.entity_count(), 2);

        assert_eq!(mosaic.search_and_select("S2").as_deref(), Some("S2"));
        assert_eq!(mosaic.selected_id().as_deref(), Some("S2"));
        assert!(mosaic.get_entity("S2").unwrap().is_object());
        assert!(mosaic.get_entity("nobody").unwrap().is_null());
    }

    #[wasm_bindgen_test]
    fn test_facade_rejects_bad_options() {
        let options = js_sys::JSON::parse(r#"{"viewport":{"min_zoom":0}}"#).unwrap();
        assert!(SpiritMosaicWasm::new(options).is_err());
    }
}
