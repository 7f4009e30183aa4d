//! Entity data model and the owned data store.
//!
//! Entities are created together with their positions during generation or
//! ingestion and are immutable in identity afterwards. Everything derived
//! from them (primary category, connections, visual properties) is a pure
//! function of current state and can be rebuilt at any time.

mod connections;
mod entity;
mod filter;
mod store;

pub use connections::{Connection, ConnectionIndex, SharedEvents};
pub use entity::{Category, CategoryDistribution, EngagementStyle, Entity, Event, Position};
pub use filter::Filter;
pub use store::DataStore;
