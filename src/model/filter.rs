//! Category / style / id-substring filter over the entity set.

use super::entity::{Category, EngagementStyle, Entity};
use crate::error::Result;

/// Active filter. `None` and an empty search mean "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub category: Option<Category>,
    pub style: Option<EngagementStyle>,
    /// Lower-cased id substring.
    search: String,
}

impl Filter {
    pub fn new(category: Option<Category>, style: Option<EngagementStyle>, search: &str) -> Self {
        Self {
            category,
            style,
            search: search.trim().to_lowercase(),
        }
    }

    /// Parse host strings; `"all"` or `""` disables a criterion.
    pub fn parse(category: &str, style: &str, search: &str) -> Result<Self> {
        let category = match category.trim() {
            "" | "all" => None,
            other => Some(other.parse()?),
        };
        let style = match style.trim() {
            "" | "all" => None,
            other => Some(other.parse()?),
        };
        Ok(Self::new(category, style, search))
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.style.is_none() && self.search.is_empty()
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        if self.category.is_some_and(|c| c != entity.primary_category()) {
            return false;
        }
        if self.style.is_some_and(|s| s != entity.style()) {
            return false;
        }
        self.search.is_empty() || entity.id().to_lowercase().contains(&self.search)
    }
}
