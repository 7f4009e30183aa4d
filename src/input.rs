//! Input model: platform-neutral pointer events and the drag gesture state.
//!
//! The host adapts its native events (mouse, touch, wheel) into
//! [`PointerEvent`]s in canvas-relative screen coordinates. `InputState`
//! tracks the drag between pointer-down and pointer-up and turns moves into
//! pan deltas; moves without a drag become hover queries.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// A pointer event in screen coordinates (CSS pixels).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PointerEvent {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    /// Wheel or pinch; negative `delta_y` zooms in.
    Wheel {
        x: f64,
        y: f64,
        #[serde(rename = "deltaY")]
        delta_y: f64,
    },
}

impl PointerEvent {
    pub fn point(&self) -> Point {
        match *self {
            Self::Down { x, y }
            | Self::Move { x, y }
            | Self::Up { x, y }
            | Self::Wheel { x, y, .. } => Point::new(x, y),
        }
    }
}

/// Active gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InputState {
    #[default]
    Idle,
    /// Dragging the canvas; `last` is the previous pointer position.
    Panning { last: Point },
}

impl InputState {
    /// Begin a drag at `at`.
    pub fn press(&mut self, at: Point) {
        *self = Self::Panning { last: at };
    }

    /// Advance the drag; returns the screen delta to pan by, or `None` when idle.
    pub fn drag(&mut self, to: Point) -> Option<(f64, f64)> {
        match self {
            Self::Panning { last } => {
                let delta = (to.x - last.x, to.y - last.y);
                *last = to;
                Some(delta)
            }
            Self::Idle => None,
        }
    }

    /// End the drag.
    pub fn release(&mut self) {
        *self = Self::Idle;
    }

    pub fn is_panning(&self) -> bool {
        matches!(self, Self::Panning { .. })
    }
}

/// Notifications produced while handling input and commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "kebab-case")]
pub enum Action {
    /// The selected entity changed; carries the new id or none.
    SelectionChanged(Option<String>),
    /// The hovered entity changed.
    HoverChanged(Option<String>),
    /// State changed and the scene should be redrawn.
    RenderNeeded,
}
