//! Filter construction by type key.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    BooleanFilter, CallbackFilter, ChoiceFilter, DateFilter, DateRangeFilter, Filter,
    FilterOptions, ModelFilter, NullFilter, NumberFilter, StringFilter,
};
use crate::error::{DatagridError, Result};

/// Built-in filter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// [`StringFilter`]
    String,
    /// [`NumberFilter`]
    Number,
    /// [`BooleanFilter`]
    Boolean,
    /// [`ChoiceFilter`]
    Choice,
    /// [`DateFilter`]
    Date,
    /// [`DateRangeFilter`]
    DateRange,
    /// [`NullFilter`]
    Null,
    /// [`ModelFilter`]
    Model,
    /// [`CallbackFilter`]
    Callback,
}

impl FilterType {
    /// Returns the type key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Choice => "choice",
            Self::Date => "date",
            Self::DateRange => "date_range",
            Self::Null => "null",
            Self::Model => "model",
            Self::Callback => "callback",
        }
    }

    const ALL: [Self; 9] = [
        Self::String,
        Self::Number,
        Self::Boolean,
        Self::Choice,
        Self::Date,
        Self::DateRange,
        Self::Null,
        Self::Model,
        Self::Callback,
    ];
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = DatagridError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DatagridError::UnknownFilterType(s.to_string()))
    }
}

/// Builds a filter from its name and options.
pub type FilterConstructor = fn(&str, FilterOptions) -> Result<Box<dyn Filter>>;

/// Creates filters by type key.
///
/// Custom constructors registered under a key take precedence over the
/// built-in type of the same name.
#[derive(Clone, Default)]
pub struct FilterFactory {
    custom: HashMap<String, FilterConstructor>,
}

impl fmt::Debug for FilterFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.custom.keys().collect();
        keys.sort();
        f.debug_struct("FilterFactory").field("custom", &keys).finish()
    }
}

impl FilterFactory {
    /// Creates a factory knowing only the built-in types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor under `key`.
    #[must_use]
    pub fn register(mut self, key: impl Into<String>, constructor: FilterConstructor) -> Self {
        self.custom.insert(key.into(), constructor);
        self
    }

    /// Returns true if `key` names a built-in or registered type.
    pub fn has_type(&self, key: &str) -> bool {
        self.custom.contains_key(key) || key.parse::<FilterType>().is_ok()
    }

    /// Creates a built-in filter.
    pub fn create(
        &self,
        name: &str,
        filter_type: FilterType,
        options: FilterOptions,
    ) -> Result<Box<dyn Filter>> {
        if let Some(constructor) = self.custom.get(filter_type.as_str()) {
            return constructor(name, options);
        }

        debug!(filter = name, %filter_type, "creating filter");
        let filter: Box<dyn Filter> = match filter_type {
            FilterType::String => Box::new(StringFilter::with_options(name, options)),
            FilterType::Number => Box::new(NumberFilter::with_options(name, options)),
            FilterType::Boolean => Box::new(BooleanFilter::with_options(name, options)),
            FilterType::Choice => Box::new(ChoiceFilter::with_options(name, options)),
            FilterType::Date => Box::new(DateFilter::with_options(name, options)),
            FilterType::DateRange => Box::new(DateRangeFilter::with_options(name, options)),
            FilterType::Null => Box::new(NullFilter::with_options(name, options)),
            FilterType::Model => Box::new(ModelFilter::from_options(name, options)?),
            FilterType::Callback => Box::new(CallbackFilter::from_options(name, options)?),
        };
        Ok(filter)
    }

    /// Creates a filter by type key, custom constructors first.
    pub fn create_by_key(
        &self,
        name: &str,
        key: &str,
        options: FilterOptions,
    ) -> Result<Box<dyn Filter>> {
        if let Some(constructor) = self.custom.get(key) {
            debug!(filter = name, key, "creating custom filter");
            return constructor(name, options);
        }
        self.create(name, key.parse()?, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterData;
    use crate::query::{MemoryQuery, QueryBuilder};

    fn status_only(name: &str, options: FilterOptions) -> Result<Box<dyn Filter>> {
        Ok(Box::new(ChoiceFilter::with_options(
            name,
            options.choice("active", "Active").choice("blocked", "Blocked"),
        )))
    }

    #[test]
    fn test_builtin_types() {
        let factory = FilterFactory::new();
        let filter = factory
            .create_by_key("title", "string", FilterOptions::new())
            .unwrap();
        assert_eq!(filter.name(), "title");

        let filter = factory
            .create("published_at", FilterType::DateRange, FilterOptions::new())
            .unwrap();
        assert_eq!(filter.label(), "Published at");
    }

    #[test]
    fn test_unknown_key() {
        let err = FilterFactory::new()
            .create_by_key("x", "geo", FilterOptions::new())
            .err()
            .unwrap();
        assert!(matches!(err, DatagridError::UnknownFilterType(key) if key == "geo"));
    }

    #[test]
    fn test_custom_constructor() {
        let factory = FilterFactory::new().register("status", status_only);
        assert!(factory.has_type("status"));
        assert!(factory.has_type("date_range"));
        assert!(!factory.has_type("geo"));

        let filter = factory
            .create_by_key("state", "status", FilterOptions::new())
            .unwrap();
        assert_eq!(filter.choices().len(), 2);

        let mut q = MemoryQuery::<serde_json::Value>::new(Vec::new());
        assert!(!filter.apply(&mut q as &mut dyn QueryBuilder, Some(&FilterData::new("gone"))));
    }

    #[test]
    fn test_model_needs_association() {
        let factory = FilterFactory::new();
        assert!(factory
            .create("author", FilterType::Model, FilterOptions::new())
            .is_err());
        assert!(factory
            .create(
                "author",
                FilterType::Model,
                FilterOptions::new().association_path(&["author"])
            )
            .is_ok());
    }

    #[test]
    fn test_type_keys() {
        assert_eq!("date_range".parse::<FilterType>().unwrap(), FilterType::DateRange);
        let parsed: FilterType = serde_json::from_str("\"null\"").unwrap();
        assert_eq!(parsed, FilterType::Null);
    }
}
