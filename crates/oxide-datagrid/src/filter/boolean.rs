//! Yes/No filter.

use super::{scalar_text, Filter, FilterBase, FilterData, FilterOptions};
use crate::query::{Condition, QueryBuilder};
use crate::value::Value;

fn parse_bool(value: &serde_json::Value) -> Option<bool> {
    match scalar_text(value)?.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// A filter for boolean fields.
///
/// Several values at once become an IN list.
pub struct BooleanFilter {
    base: FilterBase,
    true_label: String,
    false_label: String,
}

impl BooleanFilter {
    /// Creates a new boolean filter with default options.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, FilterOptions::default())
    }

    /// Creates a new boolean filter.
    pub fn with_options(name: impl Into<String>, options: FilterOptions) -> Self {
        Self {
            base: FilterBase::new(name, options),
            true_label: "Yes".to_string(),
            false_label: "No".to_string(),
        }
    }

    /// Sets custom labels for true/false values.
    #[must_use]
    pub fn labels(mut self, true_label: impl Into<String>, false_label: impl Into<String>) -> Self {
        self.true_label = true_label.into();
        self.false_label = false_label.into();
        self
    }
}

impl Filter for BooleanFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn apply(&self, query: &mut dyn QueryBuilder, data: Option<&FilterData>) -> bool {
        let Some(data) = data else {
            return false;
        };

        let mut flags: Vec<bool> = Vec::with_capacity(2);
        for flag in data.values().iter().filter_map(parse_bool) {
            if !flags.contains(&flag) {
                flags.push(flag);
            }
        }
        let field = self.base.field_ref(query);

        let condition = match flags.as_slice() {
            [] => return false,
            [flag] => Condition::eq(&field, *flag),
            many => Condition::in_list(&field, many.iter().copied().map(Value::Bool).collect()),
        };
        self.base.push(query, condition);
        true
    }

    fn choices(&self) -> Vec<(String, String)> {
        vec![
            ("1".to_string(), self.true_label.clone()),
            ("0".to_string(), self.false_label.clone()),
        ]
    }
}
