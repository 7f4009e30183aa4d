//! Shared-event connection index for the network view.
//!
//! Two entities are connected when they attended an identical
//! (category, month, event name) tuple. The relation is stored as an
//! undirected petgraph `Graph` whose node indices coincide with entity slots,
//! and is always rebuilt wholesale, never patched.

use std::collections::BTreeMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use super::entity::{Category, Entity};

/// Edge weight: how many events two entities share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedEvents {
    pub count: u32,
    /// Category of the first shared event in key order, used for coloring.
    pub category: Category,
}

/// A connection between two entity slots (`a < b`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub a: usize,
    pub b: usize,
    pub shared: SharedEvents,
}

/// Symmetric connection relation over entity slots.
#[derive(Debug, Default)]
pub struct ConnectionIndex {
    graph: UnGraph<usize, SharedEvents>,
    built: bool,
}

impl ConnectionIndex {
    /// Build the index from scratch.
    ///
    /// Pairwise within each event key, so O(k²) per key of k attendees.
    pub fn build(entities: &[Entity]) -> Self {
        let mut attendees: BTreeMap<(Category, u8, &str), Vec<usize>> = BTreeMap::new();
        for (slot, entity) in entities.iter().enumerate() {
            for event in entity.events() {
                let slots = attendees
                    .entry((event.category, event.month, event.name.as_str()))
                    .or_default();
                // The same entity attending twice must not connect to itself
                if slots.last() != Some(&slot) {
                    slots.push(slot);
                }
            }
        }

        let mut graph: UnGraph<usize, SharedEvents> = UnGraph::with_capacity(entities.len(), 0);
        for slot in 0..entities.len() {
            graph.add_node(slot);
        }

        for ((category, _, _), slots) in &attendees {
            for i in 0..slots.len() {
                for j in (i + 1)..slots.len() {
                    let a = NodeIndex::new(slots[i]);
                    let b = NodeIndex::new(slots[j]);
                    match graph.find_edge(a, b) {
                        Some(edge) => graph[edge].count += 1,
                        None => {
                            graph.add_edge(
                                a,
                                b,
                                SharedEvents {
                                    count: 1,
                                    category: *category,
                                },
                            );
                        }
                    }
                }
            }
        }

        log::debug!(
            "Built connection index: {} entities, {} connections",
            graph.node_count(),
            graph.edge_count()
        );

        Self { graph, built: true }
    }

    /// Whether `build` has produced this index.
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Number of connected pairs.
    pub fn len(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }

    /// Slots connected to `slot`, ascending, each exactly once.
    pub fn neighbors(&self, slot: usize) -> Vec<usize> {
        if slot >= self.graph.node_count() {
            return Vec::new();
        }
        let mut neighbors: Vec<usize> = self
            .graph
            .neighbors(NodeIndex::new(slot))
            .map(|n| self.graph[n])
            .collect();
        neighbors.sort_unstable();
        neighbors
    }

    /// All connections, each pair reported once.
    pub fn iter(&self) -> impl Iterator<Item = Connection> + '_ {
        self.graph.edge_references().map(|edge| {
            let (a, b) = (self.graph[edge.source()], self.graph[edge.target()]);
            Connection {
                a: a.min(b),
                b: a.max(b),
                shared: *edge.weight(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EngagementStyle, Event};

    fn entity(id: &str, events: Vec<Event>) -> Entity {
        Entity::with_events(id, EngagementStyle::Sampler, events)
    }

    #[test]
    fn test_empty_index() {
        let index = ConnectionIndex::build(&[]);
        assert!(index.is_built());
        assert!(index.is_empty());
        assert!(index.neighbors(0).is_empty());
    }

    #[test]
    fn test_shared_event_is_symmetric() {
        let entities = vec![
            entity("A", vec![Event::new(2, Category::Social, "Spring Festival")]),
            entity("B", vec![Event::new(2, Category::Social, "Spring Festival")]),
            entity("C", vec![Event::new(3, Category::Social, "Spring Festival")]),
        ];
        let index = ConnectionIndex::build(&entities);
        assert_eq!(index.neighbors(0), vec![1]);
        assert_eq!(index.neighbors(1), vec![0]);
        // Different month, different key
        assert!(index.neighbors(2).is_empty());
    }

    #[test]
    fn test_multiple_shared_events_collapse_to_one_connection() {
        let shared = vec![
            Event::new(1, Category::Academic, "Study Group"),
            Event::new(4, Category::Athletic, "Varsity Game"),
        ];
        let entities = vec![entity("A", shared.clone()), entity("B", shared)];
        let index = ConnectionIndex::build(&entities);

        assert_eq!(index.len(), 1);
        let connection = index.iter().next().unwrap();
        assert_eq!((connection.a, connection.b), (0, 1));
        assert_eq!(connection.shared.count, 2);
        assert_eq!(connection.shared.category, Category::Academic);
    }

    #[test]
    fn test_duplicate_attendance_does_not_self_connect() {
        let event = Event::new(5, Category::Cultural, "Film Screening");
        let entities = vec![entity("A", vec![event.clone(), event])];
        let index = ConnectionIndex::build(&entities);
        assert!(index.is_empty());
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let entities = vec![
            entity("A", vec![Event::new(6, Category::Professional, "Career Fair")]),
            entity("B", vec![Event::new(6, Category::Professional, "Career Fair")]),
        ];
        let first = ConnectionIndex::build(&entities);
        let second = ConnectionIndex::build(&entities);
        assert_eq!(first.neighbors(0), second.neighbors(0));
        assert_eq!(second.neighbors(0), vec![1]);
    }
}
