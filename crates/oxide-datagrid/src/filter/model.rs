//! Association filter.

use super::{Filter, FilterBase, FilterData, FilterOptions};
use crate::error::{DatagridError, Result};
use crate::query::{Condition, QueryBuilder};
use crate::value::Value;

/// A filter matching related entities by identifier.
///
/// Joins the configured association path and compares the target's
/// identifier field (`id` unless `field_name` is set). With the
/// `not_equal` operator, rows without a related entity also match.
pub struct ModelFilter {
    base: FilterBase,
}

impl ModelFilter {
    /// Creates a filter over the given association path.
    pub fn new(name: impl Into<String>, association_path: &[&str]) -> Self {
        Self {
            base: FilterBase::new(
                name,
                FilterOptions::new()
                    .association_path(association_path)
                    .field_name("id"),
            ),
        }
    }

    /// Creates a filter from options, which must name an association.
    pub fn from_options(name: impl Into<String>, mut options: FilterOptions) -> Result<Self> {
        let name = name.into();
        if options.association_path.is_empty() {
            return Err(DatagridError::InvalidFilterOptions {
                filter: name,
                reason: "a model filter needs an association_path".to_string(),
            });
        }
        if options.field_name.is_none() {
            options.field_name = Some("id".to_string());
        }
        Ok(Self {
            base: FilterBase::new(name, options),
        })
    }
}

impl Filter for ModelFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn apply(&self, query: &mut dyn QueryBuilder, data: Option<&FilterData>) -> bool {
        let Some(data) = data else {
            return false;
        };

        let ids: Vec<Value> = data.values().iter().map(Value::from_json).collect();
        if ids.is_empty() {
            return false;
        }

        let negated = matches!(self.base.operator(data), Some("not_equal" | "2"));
        let field = self.base.field_ref(query);
        let condition = if negated {
            Condition::Any(vec![
                Condition::not_in_list(&field, ids),
                Condition::is_null(&field),
            ])
        } else {
            Condition::in_list(&field, ids)
        };
        self.base.push(query, condition);
        true
    }
}
