//! DataStore - the explicitly owned entity/position store.
//!
//! Entities and their positions are inserted together and live in parallel
//! slot-indexed vectors, so every entity has exactly one position and no two
//! entities ever share one. The store also owns the active filter (and the
//! filtered slot list the renderer and hit tester iterate) and the lazily
//! rebuilt connection index.

use std::collections::HashMap;

use super::connections::ConnectionIndex;
use super::entity::{Category, Entity, Position};
use super::filter::Filter;

/// Owned store of entities, positions and derived indices.
#[derive(Debug, Default)]
pub struct DataStore {
    /// Entities in insertion (generation) order.
    entities: Vec<Entity>,

    /// Positions, parallel to `entities`.
    positions: Vec<Position>,

    /// Map from entity id to slot.
    id_to_slot: HashMap<String, usize>,

    /// Active filter.
    filter: Filter,

    /// Slots passing the filter, in slot order.
    filtered: Vec<usize>,

    /// Shared-event connections, rebuilt on demand.
    connections: ConnectionIndex,
}

impl DataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity),
            positions: Vec::with_capacity(capacity),
            id_to_slot: HashMap::with_capacity(capacity),
            filtered: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Build a store from entities paired with their positions.
    ///
    /// Entries with a duplicate id are dropped.
    pub fn from_placed(placed: Vec<(Entity, Position)>) -> Self {
        let mut store = Self::with_capacity(placed.len());
        for (entity, position) in placed {
            store.insert(entity, position);
        }
        store
    }

    /// Insert an entity together with its position.
    ///
    /// Returns the new slot, or `None` if the id is already present.
    pub fn insert(&mut self, entity: Entity, position: Position) -> Option<usize> {
        if self.id_to_slot.contains_key(entity.id()) {
            log::warn!("Skipping duplicate entity id {}", entity.id());
            return None;
        }

        let slot = self.entities.len();
        self.id_to_slot.insert(entity.id().to_string(), slot);
        if self.filter.matches(&entity) {
            self.filtered.push(slot);
        }
        self.entities.push(entity);
        self.positions.push(position);
        self.connections = ConnectionIndex::default();
        Some(slot)
    }

    /// Remove everything, including the filter.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn entity(&self, slot: usize) -> Option<&Entity> {
        self.entities.get(slot)
    }

    pub fn position(&self, slot: usize) -> Option<Position> {
        self.positions.get(slot).copied()
    }

    pub fn slot_of(&self, id: &str) -> Option<usize> {
        self.id_to_slot.get(id).copied()
    }

    pub fn entity_by_id(&self, id: &str) -> Option<&Entity> {
        self.slot_of(id).and_then(|slot| self.entities.get(slot))
    }

    /// Position of `id`, or the centre fallback for unknown ids.
    pub fn position_by_id(&self, id: &str) -> Position {
        self.slot_of(id)
            .and_then(|slot| self.position(slot))
            .unwrap_or_else(Position::center)
    }

    /// Number of entities per primary category.
    pub fn category_counts(&self) -> [usize; Category::COUNT] {
        let mut counts = [0usize; Category::COUNT];
        for entity in &self.entities {
            counts[entity.primary_category().index()] += 1;
        }
        counts
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    /// Replace the active filter and return the matching slots.
    pub fn apply_filter(&mut self, filter: Filter) -> &[usize] {
        self.filtered = self
            .entities
            .iter()
            .enumerate()
            .filter(|(_, entity)| filter.matches(entity))
            .map(|(slot, _)| slot)
            .collect();
        self.filter = filter;
        &self.filtered
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Slots passing the active filter, in slot order.
    pub fn filtered(&self) -> &[usize] {
        &self.filtered
    }

    // =========================================================================
    // Connections
    // =========================================================================

    /// Rebuild the connection index from the current entities.
    pub fn rebuild_connections(&mut self) {
        self.connections = ConnectionIndex::build(&self.entities);
    }

    /// Build the connection index if it has not been built yet.
    pub fn ensure_connections(&mut self) {
        if !self.connections.is_built() {
            self.rebuild_connections();
        }
    }

    pub fn connections(&self) -> &ConnectionIndex {
        &self.connections
    }

    /// Ids connected to `id`; empty for unknown ids or before a build.
    pub fn connections_of(&self, id: &str) -> Vec<&str> {
        let Some(slot) = self.slot_of(id) else {
            return Vec::new();
        };
        self.connections
            .neighbors(slot)
            .into_iter()
            .filter_map(|n| self.entities.get(n).map(Entity::id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EngagementStyle, Event};

    fn entity(id: &str, style: EngagementStyle, category: Category) -> Entity {
        Entity::with_events(id, style, vec![Event::new(1, category, "Study Group")])
    }

    fn sample_store() -> DataStore {
        use Category::*;
        use EngagementStyle::*;
        DataStore::from_placed(vec![
            (entity("S1", Sampler, Academic), Position::fixed(0.4, 0.4)),
            (entity("S2", Specialist, Academic), Position::free(0.2, 0.3)),
            (entity("S3", Sampler, Athletic), Position::free(0.7, 0.8)),
        ])
    }

    #[test]
    fn test_insert_and_lookup() {
        let store = sample_store();
        assert_eq!(store.len(), 3);
        assert_eq!(store.slot_of("S2"), Some(1));
        assert_eq!(store.entity_by_id("S3").unwrap().primary_category(), Category::Athletic);
        assert_eq!(store.position_by_id("S1"), Position::fixed(0.4, 0.4));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut store = sample_store();
        let duplicate = entity("S1", EngagementStyle::Selective, Category::Social);
        let slot = store.insert(duplicate, Position::center());
        assert!(slot.is_none());
        assert_eq!(store.len(), 3);
        assert_eq!(store.positions().len(), store.entities().len());
    }

    #[test]
    fn test_unknown_id_falls_back() {
        let store = sample_store();
        assert!(store.entity_by_id("nobody").is_none());
        assert_eq!(store.position_by_id("nobody"), Position::center());
        assert!(store.connections_of("nobody").is_empty());
    }

    #[test]
    fn test_filter_restricts_slots() {
        let mut store = sample_store();
        assert_eq!(store.filtered(), &[0, 1, 2]);

        let slots = store.apply_filter(Filter::new(Some(Category::Academic), None, "")).to_vec();
        assert_eq!(slots, vec![0, 1]);

        store.apply_filter(Filter::new(None, Some(EngagementStyle::Sampler), "s3"));
        assert_eq!(store.filtered(), &[2]);

        // New entities respect the active filter
        store.insert(entity("S4", EngagementStyle::Sampler, Category::Social), Position::center());
        store.insert(entity("X5", EngagementStyle::Sampler, Category::Social), Position::center());
        assert_eq!(store.filtered(), &[2]);
    }

    #[test]
    fn test_connections_built_on_demand() {
        let mut store = sample_store();
        assert!(!store.connections().is_built());

        store.ensure_connections();
        // All three attended "Study Group" in month 1 but with different categories
        assert_eq!(store.connections_of("S1"), vec!["S2"]);
        assert_eq!(store.connections_of("S2"), vec!["S1"]);
        assert!(store.connections_of("S3").is_empty());
    }

    #[test]
    fn test_category_counts() {
        let store = sample_store();
        let counts = store.category_counts();
        assert_eq!(counts[Category::Academic.index()], 2);
        assert_eq!(counts[Category::Athletic.index()], 1);
        assert_eq!(counts[Category::Social.index()], 0);
    }
}
