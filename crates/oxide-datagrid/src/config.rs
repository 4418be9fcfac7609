//! Datagrid configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::filter::FilterOptions;
use crate::pager::{Pager, PagerKind};
use crate::query::{ProxyQuery, SortOrder};

/// A filter declared in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterDefinition {
    /// Filter name, the key of its input value.
    pub name: String,
    /// Type key resolved through the filter factory.
    #[serde(rename = "type")]
    pub filter_type: String,
    /// Filter options.
    #[serde(default)]
    pub options: FilterOptions,
}

/// Configuration for how a datagrid pages and sorts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatagridConfig {
    /// Page size when the input does not pick one. 0 disables pagination.
    pub max_per_page: usize,
    /// Page sizes the input may pick (empty = any).
    pub per_page_options: Vec<usize>,
    /// Number of page links to show.
    pub max_page_links: usize,
    /// How the pager sizes the result set.
    pub pager_kind: PagerKind,
    /// Pages a simple pager looks ahead.
    pub simple_pager_threshold: usize,
    /// Cap on the reported number of results.
    pub max_record_limit: Option<usize>,
    /// Fields the input may sort by.
    pub sortable_fields: Vec<String>,
    /// Default sort field (prefix with - for descending).
    pub default_sort: Option<String>,
    /// Filters to build.
    pub filters: Vec<FilterDefinition>,
}

impl Default for DatagridConfig {
    fn default() -> Self {
        Self {
            max_per_page: 25,
            per_page_options: vec![10, 25, 50, 100, 250],
            max_page_links: 10,
            pager_kind: PagerKind::Default,
            simple_pager_threshold: 1,
            max_record_limit: None,
            sortable_fields: Vec::new(),
            default_sort: None,
            filters: Vec::new(),
        }
    }
}

impl DatagridConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a configuration from JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the default page size.
    #[must_use]
    pub fn max_per_page(mut self, n: usize) -> Self {
        self.max_per_page = n;
        self
    }

    /// Sets the page sizes the input may pick.
    #[must_use]
    pub fn per_page_options(mut self, options: &[usize]) -> Self {
        self.per_page_options = options.to_vec();
        self
    }

    /// Sets the number of page links.
    #[must_use]
    pub fn max_page_links(mut self, n: usize) -> Self {
        self.max_page_links = n;
        self
    }

    /// Uses a simple pager looking `threshold` pages ahead.
    #[must_use]
    pub fn simple_pager(mut self, threshold: usize) -> Self {
        self.pager_kind = PagerKind::Simple;
        self.simple_pager_threshold = threshold;
        self
    }

    /// Caps the reported number of results.
    #[must_use]
    pub fn max_record_limit(mut self, limit: usize) -> Self {
        self.max_record_limit = Some(limit);
        self
    }

    /// Sets the fields the input may sort by.
    #[must_use]
    pub fn sortable_fields(mut self, fields: &[&str]) -> Self {
        self.sortable_fields = fields.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Sets the default sort.
    #[must_use]
    pub fn default_sort(mut self, field: &str) -> Self {
        self.default_sort = Some(field.to_string());
        self
    }

    /// Declares a filter.
    #[must_use]
    pub fn filter(mut self, name: &str, filter_type: &str, options: FilterOptions) -> Self {
        self.filters.push(FilterDefinition {
            name: name.to_string(),
            filter_type: filter_type.to_string(),
            options,
        });
        self
    }

    /// Returns true if the input may sort by `field`.
    pub fn is_sortable(&self, field: &str) -> bool {
        self.sortable_fields.iter().any(|f| f == field)
    }

    /// Resolves a requested page size against the allowed options.
    ///
    /// 0 (no pagination) is only honoured when listed.
    pub fn resolve_per_page(&self, requested: Option<i64>) -> i64 {
        let fallback = i64::try_from(self.max_per_page).unwrap_or(i64::MAX);
        match requested {
            Some(n) if self.per_page_options.is_empty() && n >= 0 => n,
            Some(n) => self
                .per_page_options
                .iter()
                .find(|option| i64::try_from(**option).ok() == Some(n))
                .map_or(fallback, |_| n),
            None => fallback,
        }
    }

    /// Returns the default sort as field and direction.
    pub fn default_sort_order(&self) -> Option<(&str, SortOrder)> {
        let field = self.default_sort.as_deref()?;
        Some(match field.strip_prefix('-') {
            Some(field) => (field, SortOrder::Desc),
            None => (field, SortOrder::Asc),
        })
    }

    /// Creates an empty pager with these settings.
    pub fn pager<Q: ProxyQuery>(&self) -> Pager<Q> {
        let mut pager = Pager::new(self.max_per_page)
            .with_kind(self.pager_kind)
            .with_threshold(self.simple_pager_threshold);
        pager.set_max_page_links(self.max_page_links);
        pager.set_max_record_limit(self.max_record_limit);
        pager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterCondition;

    #[test]
    fn test_defaults() {
        let config = DatagridConfig::default();
        assert_eq!(config.max_per_page, 25);
        assert_eq!(config.per_page_options, vec![10, 25, 50, 100, 250]);
        assert_eq!(config.max_page_links, 10);
        assert_eq!(config.pager_kind, PagerKind::Default);
        assert!(config.default_sort_order().is_none());
    }

    #[test]
    fn test_from_json() {
        let config = DatagridConfig::from_json(
            r#"{
                "max_per_page": 50,
                "pager_kind": "simple",
                "default_sort": "-created_at",
                "filters": [
                    {"name": "title", "type": "string"},
                    {"name": "status", "type": "choice", "options": {"condition": "or"}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.max_per_page, 50);
        assert_eq!(config.max_page_links, 10);
        assert_eq!(config.pager_kind, PagerKind::Simple);
        assert_eq!(config.default_sort_order(), Some(("created_at", SortOrder::Desc)));
        assert_eq!(config.filters[1].filter_type, "choice");
        assert_eq!(config.filters[1].options.condition, FilterCondition::Or);
    }

    #[test]
    fn test_bad_json() {
        assert!(DatagridConfig::from_json("{\"max_per_page\": \"many\"}").is_err());
    }

    #[test]
    fn test_per_page_resolution() {
        let config = DatagridConfig::new();
        assert_eq!(config.resolve_per_page(Some(50)), 50);
        assert_eq!(config.resolve_per_page(Some(7)), 25);
        assert_eq!(config.resolve_per_page(Some(0)), 25);
        assert_eq!(config.resolve_per_page(None), 25);

        let open = DatagridConfig::new().per_page_options(&[]);
        assert_eq!(open.resolve_per_page(Some(7)), 7);
        assert_eq!(open.resolve_per_page(Some(0)), 0);
        assert_eq!(open.resolve_per_page(Some(-1)), 25);
    }
}
