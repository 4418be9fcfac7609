//! Datagrid filters.
//!
//! A filter turns one raw input value into conditions on a query. Filters
//! are stateless apart from their options, so one filter can be applied to
//! any number of queries.
//!
//! Built-in filters:
//!
//! - [`StringFilter`] - contains / equal / starts with / ends with
//! - [`NumberFilter`] - numeric comparisons
//! - [`BooleanFilter`] - yes / no
//! - [`ChoiceFilter`] - one or more predefined choices
//! - [`DateFilter`] and [`DateRangeFilter`] - calendar dates
//! - [`NullFilter`] - empty / not empty
//! - [`ModelFilter`] - related entities by identifier
//! - [`CallbackFilter`] - arbitrary closure
//!
//! Filters are usually created through the [`FilterFactory`], keyed by
//! [`FilterType`].

mod boolean;
mod callback;
mod choice;
mod date;
mod factory;
mod model;
mod number;
mod string;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::query::{qualify, Condition, QueryBuilder};

pub use boolean::BooleanFilter;
pub use callback::CallbackFilter;
pub use choice::ChoiceFilter;
pub use date::{DateFilter, DateRangeFilter};
pub use factory::{FilterConstructor, FilterFactory, FilterType};
pub use model::ModelFilter;
pub use number::NumberFilter;
pub use string::{NullFilter, StringFilter};

/// A filter that can be applied to a datagrid query.
pub trait Filter: Send + Sync {
    /// Returns the shared name and options.
    fn base(&self) -> &FilterBase;

    /// Applies the filter to `query` for the given input.
    ///
    /// Missing or empty input leaves the query untouched. Returns true when
    /// the filter added a condition.
    fn apply(&self, query: &mut dyn QueryBuilder, data: Option<&FilterData>) -> bool;

    /// Returns the filter's name, the key of its input value.
    fn name(&self) -> &str {
        self.base().name()
    }

    /// Returns the display label for this filter.
    fn label(&self) -> String {
        self.base().label()
    }

    /// Returns the filtered field on the (possibly joined) entity.
    fn field_name(&self) -> &str {
        self.base().field_name()
    }

    /// Returns the configured options.
    fn options(&self) -> &FilterOptions {
        &self.base().options
    }

    /// Returns the available options as (value, label) pairs.
    fn choices(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// How a filter's condition combines with the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterCondition {
    /// The condition must hold.
    #[default]
    And,
    /// The condition joins the OR group.
    Or,
}

/// Closure run by a [`CallbackFilter`].
///
/// Receives the query, the alias of the filtered entity, the field name and
/// the input. Returns whether the filter became active.
pub type FilterCallback =
    Arc<dyn Fn(&mut dyn QueryBuilder, &str, &str, &FilterData) -> bool + Send + Sync>;

/// Options shared by every filter.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Filtered field (defaults to the filter name).
    pub field_name: Option<String>,
    /// Display label (defaults to the humanized name).
    pub label: Option<String>,
    /// Associations to join, from the root entity outwards.
    pub association_path: Vec<String>,
    /// How the condition combines with other filters.
    pub condition: FilterCondition,
    /// Whether text matching is case sensitive.
    pub case_sensitive: bool,
    /// Predefined (value, label) choices.
    pub choices: Vec<(String, String)>,
    /// Operator used when the input does not name one.
    pub operator: Option<String>,
    /// Closure for callback filters.
    #[serde(skip)]
    pub callback: Option<FilterCallback>,
}

impl fmt::Debug for FilterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterOptions")
            .field("field_name", &self.field_name)
            .field("label", &self.label)
            .field("association_path", &self.association_path)
            .field("condition", &self.condition)
            .field("case_sensitive", &self.case_sensitive)
            .field("choices", &self.choices)
            .field("operator", &self.operator)
            .field("callback", &self.callback.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl FilterOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filtered field.
    #[must_use]
    pub fn field_name(mut self, field: impl Into<String>) -> Self {
        self.field_name = Some(field.into());
        self
    }

    /// Sets the display label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the associations to join before filtering.
    #[must_use]
    pub fn association_path(mut self, path: &[&str]) -> Self {
        self.association_path = path.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Makes the condition join the OR group.
    #[must_use]
    pub fn or(mut self) -> Self {
        self.condition = FilterCondition::Or;
        self
    }

    /// Makes text matching case sensitive.
    #[must_use]
    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    /// Adds a choice.
    #[must_use]
    pub fn choice(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.choices.push((value.into(), label.into()));
        self
    }

    /// Sets the default operator.
    #[must_use]
    pub fn operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    /// Sets the closure for a callback filter.
    #[must_use]
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut dyn QueryBuilder, &str, &str, &FilterData) -> bool + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }
}

/// Name and options every filter carries.
#[derive(Debug, Clone)]
pub struct FilterBase {
    name: String,
    options: FilterOptions,
}

impl FilterBase {
    /// Creates the shared part of a filter.
    pub fn new(name: impl Into<String>, options: FilterOptions) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    /// Returns the filter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the filtered field.
    pub fn field_name(&self) -> &str {
        self.options.field_name.as_deref().unwrap_or(&self.name)
    }

    /// Returns the configured label or the humanized name.
    pub fn label(&self) -> String {
        self.options
            .label
            .clone()
            .unwrap_or_else(|| humanize(&self.name))
    }

    /// Returns the options.
    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Returns the operator named by the input, or the configured default.
    pub fn operator<'a>(&'a self, data: &'a FilterData) -> Option<&'a str> {
        data.operator
            .as_deref()
            .filter(|op| !op.is_empty())
            .or(self.options.operator.as_deref())
    }

    /// Joins the association path and returns the alias of the entity
    /// holding the field.
    pub fn alias(&self, query: &mut dyn QueryBuilder) -> String {
        let mut alias = query.root_alias().to_string();
        for association in &self.options.association_path {
            alias = query.join(&alias, association);
        }
        alias
    }

    /// Joins the association path and returns `alias.field`.
    pub fn field_ref(&self, query: &mut dyn QueryBuilder) -> String {
        qualify(query, &self.options.association_path, self.field_name())
    }

    /// Adds `condition` with the configured conjunction.
    pub fn push(&self, query: &mut dyn QueryBuilder, condition: Condition) {
        match self.options.condition {
            FilterCondition::And => query.and_where(condition),
            FilterCondition::Or => query.or_where(condition),
        }
    }
}

/// Turns `created_at` into `Created at`.
fn humanize(name: &str) -> String {
    let spaced = name.replace(['_', '.'], " ");
    let mut chars = spaced.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Raw input for one filter: an optional operator and a value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterData {
    /// Operator key, e.g. `contains` or `gte`.
    pub operator: Option<String>,
    /// Input value as submitted.
    pub value: serde_json::Value,
}

impl FilterData {
    /// Creates input with no operator.
    pub fn new(value: impl Into<serde_json::Value>) -> Self {
        Self {
            operator: None,
            value: value.into(),
        }
    }

    /// Creates input with an explicit operator.
    pub fn with_operator(operator: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            operator: Some(operator.into()),
            value: value.into(),
        }
    }

    /// Reads input from a submitted value.
    ///
    /// Objects carrying `type` or `value` keys are split into operator and
    /// value; anything else is taken as the value itself. Returns `None` for
    /// null.
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Null => None,
            serde_json::Value::Object(map)
                if map.contains_key("type") || map.contains_key("value") =>
            {
                let operator = match map.get("type") {
                    Some(serde_json::Value::String(s)) => Some(s.clone()),
                    Some(serde_json::Value::Number(n)) => Some(n.to_string()),
                    _ => None,
                };
                Some(Self {
                    operator,
                    value: map.get("value").cloned().unwrap_or_default(),
                })
            }
            other => Some(Self::new(other.clone())),
        }
    }

    /// Returns true when the value is null, blank, or an empty collection.
    pub fn is_empty(&self) -> bool {
        is_blank(&self.value)
    }

    /// Returns the value as trimmed text, if it is a non-blank scalar.
    pub fn text(&self) -> Option<String> {
        scalar_text(&self.value)
    }

    /// Returns the non-blank values, flattening one level of array.
    pub fn values(&self) -> Vec<serde_json::Value> {
        match &self.value {
            serde_json::Value::Array(items) => {
                items.iter().filter(|v| !is_blank(v)).cloned().collect()
            }
            other if is_blank(other) => Vec::new(),
            other => vec![other.clone()],
        }
    }
}

fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.trim().is_empty(),
        serde_json::Value::Array(items) => items.iter().all(is_blank),
        serde_json::Value::Object(map) => map.values().all(is_blank),
        _ => false,
    }
}

pub(crate) fn scalar_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
