//! Filter over predefined choices.

use tracing::debug;

use super::{scalar_text, Filter, FilterBase, FilterData, FilterOptions};
use crate::query::{Condition, QueryBuilder};
use crate::value::Value;

/// A filter with predefined choices.
///
/// Input outside the configured choices is dropped; a filter without
/// choices accepts any value.
pub struct ChoiceFilter {
    base: FilterBase,
}

impl ChoiceFilter {
    /// Creates a new choice filter with no choices.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, FilterOptions::default())
    }

    /// Creates a new choice filter.
    pub fn with_options(name: impl Into<String>, options: FilterOptions) -> Self {
        Self {
            base: FilterBase::new(name, options),
        }
    }

    /// Adds a choice to the filter.
    #[must_use]
    pub fn choice(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.base.options.choices.push((value.into(), label.into()));
        self
    }

    fn accepts(&self, value: &str) -> bool {
        let choices = &self.base.options().choices;
        choices.is_empty() || choices.iter().any(|(v, _)| v == value)
    }
}

impl Filter for ChoiceFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn apply(&self, query: &mut dyn QueryBuilder, data: Option<&FilterData>) -> bool {
        let Some(data) = data else {
            return false;
        };

        let selected: Vec<String> = data
            .values()
            .iter()
            .filter_map(scalar_text)
            .filter(|v| {
                let known = self.accepts(v);
                if !known {
                    debug!(filter = self.base.name(), value = %v, "dropping unknown choice");
                }
                known
            })
            .collect();
        if selected.is_empty() {
            return false;
        }

        let negated = matches!(self.base.operator(data), Some("not_equal" | "2"));
        let field = self.base.field_ref(query);
        let condition = match (selected.as_slice(), negated) {
            ([one], false) => Condition::eq(&field, one.as_str()),
            ([one], true) => Condition::Any(vec![
                Condition::ne(&field, one.as_str()),
                Condition::is_null(&field),
            ]),
            (many, false) => Condition::in_list(&field, many.iter().cloned().map(Value::Text).collect()),
            (many, true) => Condition::Any(vec![
                Condition::not_in_list(&field, many.iter().cloned().map(Value::Text).collect()),
                Condition::is_null(&field),
            ]),
        };
        self.base.push(query, condition);
        true
    }

    fn choices(&self) -> Vec<(String, String)> {
        self.base.options().choices.clone()
    }
}
