//! Entity type and related structures.
//!
//! An entity is the engagement record of one student. Each entity has:
//! - A stable string identifier
//! - An immutable engagement style
//! - A month-ordered event list
//! - A category distribution and primary category derived from the events

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::MosaicError;

/// Event category. Declaration order is the tie-break order for the
/// primary category and the top-to-bottom order of layout bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Academic,
    Social,
    Professional,
    Cultural,
    Athletic,
    /// Fallback bucket for ingested events that match no known type or tag.
    Other,
}

impl Category {
    pub const COUNT: usize = 6;

    pub const ALL: [Category; Self::COUNT] = [
        Self::Academic,
        Self::Social,
        Self::Professional,
        Self::Cultural,
        Self::Athletic,
        Self::Other,
    ];

    /// Categories produced by the synthetic generator.
    pub const GENERATED: [Category; 5] = [
        Self::Academic,
        Self::Social,
        Self::Professional,
        Self::Cultural,
        Self::Athletic,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Social => "social",
            Self::Professional => "professional",
            Self::Cultural => "cultural",
            Self::Athletic => "athletic",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = MosaicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MosaicError::unknown_mode("category", s))
    }
}

/// Engagement style: drives event-generation bias and layout spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngagementStyle {
    /// Tries many different categories.
    Sampler,
    /// Concentrates on one category.
    Specialist,
    /// Touches every category, many events.
    SuperConnector,
    /// Few events in one or two categories.
    Selective,
}

impl EngagementStyle {
    pub const ALL: [EngagementStyle; 4] = [
        Self::Sampler,
        Self::Specialist,
        Self::SuperConnector,
        Self::Selective,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sampler => "sampler",
            Self::Specialist => "specialist",
            Self::SuperConnector => "super-connector",
            Self::Selective => "selective",
        }
    }
}

impl fmt::Display for EngagementStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngagementStyle {
    type Err = MosaicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MosaicError::unknown_mode("engagement style", s))
    }
}

/// A single attended event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    /// Month index, 1-based within the configured window.
    pub month: u8,
    pub category: Category,
    pub name: String,
}

impl Event {
    pub fn new(month: u8, category: Category, name: impl Into<String>) -> Self {
        Self {
            month,
            category,
            name: name.into(),
        }
    }
}

/// Per-category event counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryDistribution([u32; Category::COUNT]);

impl CategoryDistribution {
    pub fn from_events(events: &[Event]) -> Self {
        let mut counts = [0u32; Category::COUNT];
        for event in events {
            counts[event.category.index()] += 1;
        }
        Self(counts)
    }

    #[inline]
    pub fn get(&self, category: Category) -> u32 {
        self.0[category.index()]
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    /// Number of categories with at least one event.
    pub fn distinct(&self) -> usize {
        self.0.iter().filter(|&&c| c > 0).count()
    }

    /// Category with the highest count; the first declared wins ties.
    /// An empty distribution has no mode and falls back to `Other`.
    pub fn primary(&self) -> Category {
        let mut best = Category::Other;
        let mut best_count = 0;
        for category in Category::ALL {
            let count = self.get(category);
            if count > best_count {
                best = category;
                best_count = count;
            }
        }
        best
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, u32)> + '_ {
        Category::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

impl Serialize for CategoryDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Category::COUNT))?;
        for (category, count) in self.iter() {
            map.serialize_entry(category.as_str(), &count)?;
        }
        map.end()
    }
}

/// The engagement record for one student.
///
/// Fields are private so the distribution and primary category can never
/// drift from the event list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    id: String,
    engagement_style: EngagementStyle,
    events: Vec<Event>,
    category_distribution: CategoryDistribution,
    primary_category: Category,
}

impl Entity {
    /// Create an entity with no events.
    pub fn new(id: impl Into<String>, style: EngagementStyle) -> Self {
        Self {
            id: id.into(),
            engagement_style: style,
            events: Vec::new(),
            category_distribution: CategoryDistribution::default(),
            primary_category: Category::Other,
        }
    }

    /// Create an entity from an unordered event list.
    pub fn with_events(
        id: impl Into<String>,
        style: EngagementStyle,
        mut events: Vec<Event>,
    ) -> Self {
        events.sort_by_key(|e| e.month);
        let mut entity = Self::new(id, style);
        entity.events = events;
        entity.refresh_derived();
        entity
    }

    /// Append an event, keeping month order (stable for equal months).
    pub fn push_event(&mut self, event: Event) {
        let at = self.events.partition_point(|e| e.month <= event.month);
        self.events.insert(at, event);
        self.refresh_derived();
    }

    fn refresh_derived(&mut self) {
        self.category_distribution = CategoryDistribution::from_events(&self.events);
        self.primary_category = self.category_distribution.primary();
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn style(&self) -> EngagementStyle {
        self.engagement_style
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn distribution(&self) -> &CategoryDistribution {
        &self.category_distribution
    }

    pub fn primary_category(&self) -> Category {
        self.primary_category
    }

    /// Number of events in or before `month`.
    pub fn events_through(&self, month: u8) -> usize {
        self.events.partition_point(|e| e.month <= month)
    }
}

/// Layout position of one entity, normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    /// Bound to a silhouette anchor; never nudged by repositioning.
    pub fixed: bool,
}

impl Position {
    pub fn fixed(x: f64, y: f64) -> Self {
        Self { x, y, fixed: true }
    }

    pub fn free(x: f64, y: f64) -> Self {
        Self { x, y, fixed: false }
    }

    /// Fallback when an id has no assigned position.
    pub fn center() -> Self {
        Self::free(0.5, 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(month: u8, category: Category) -> Event {
        Event::new(month, category, format!("{category} event"))
    }

    #[test]
    fn test_distribution_sums_to_event_count() {
        let entity = Entity::with_events(
            "S001",
            EngagementStyle::Sampler,
            vec![
                event(3, Category::Social),
                event(1, Category::Academic),
                event(2, Category::Social),
            ],
        );
        assert_eq!(entity.distribution().total() as usize, entity.event_count());
        assert_eq!(entity.distribution().get(Category::Social), 2);
        assert_eq!(entity.primary_category(), Category::Social);
    }

    #[test]
    fn test_events_sorted_by_month() {
        let entity = Entity::with_events(
            "S001",
            EngagementStyle::Specialist,
            vec![
                event(5, Category::Academic),
                event(2, Category::Academic),
                event(4, Category::Cultural),
            ],
        );
        let months: Vec<u8> = entity.events().iter().map(|e| e.month).collect();
        assert_eq!(months, vec![2, 4, 5]);
    }

    #[test]
    fn test_push_event_recomputes_primary() {
        let mut entity = Entity::new("S002", EngagementStyle::Selective);
        assert_eq!(entity.primary_category(), Category::Other);

        entity.push_event(event(4, Category::Athletic));
        assert_eq!(entity.primary_category(), Category::Athletic);

        entity.push_event(event(1, Category::Cultural));
        entity.push_event(event(2, Category::Cultural));
        assert_eq!(entity.primary_category(), Category::Cultural);
        assert_eq!(entity.events()[0].month, 1);
        assert_eq!(entity.distribution().total(), 3);
    }

    #[test]
    fn test_primary_tie_breaks_by_declaration_order() {
        let entity = Entity::with_events(
            "S003",
            EngagementStyle::Sampler,
            vec![event(1, Category::Athletic), event(2, Category::Social)],
        );
        // Social is declared before Athletic
        assert_eq!(entity.primary_category(), Category::Social);
    }

    #[test]
    fn test_events_through_month() {
        let entity = Entity::with_events(
            "S004",
            EngagementStyle::Sampler,
            vec![
                event(1, Category::Academic),
                event(3, Category::Academic),
                event(3, Category::Social),
                event(7, Category::Other),
            ],
        );
        assert_eq!(entity.events_through(0), 0);
        assert_eq!(entity.events_through(3), 3);
        assert_eq!(entity.events_through(8), 4);
    }

    #[test]
    fn test_parse_style_and_category() {
        let style: EngagementStyle = "super-connector".parse().unwrap();
        assert_eq!(style, EngagementStyle::SuperConnector);
        assert_eq!("Athletic".parse::<Category>().unwrap(), Category::Athletic);
        assert!("wanderer".parse::<EngagementStyle>().is_err());
    }
}
