//! Filter delegating to a closure.

use std::sync::Arc;

use super::{Filter, FilterBase, FilterCallback, FilterData, FilterOptions};
use crate::error::{DatagridError, Result};
use crate::query::QueryBuilder;

/// A filter that hands the query to a user closure.
///
/// The closure receives the alias of the filtered entity (after joining the
/// association path), the field name and the input, and returns whether it
/// changed the query. Empty input never reaches the closure.
pub struct CallbackFilter {
    base: FilterBase,
    callback: FilterCallback,
}

impl CallbackFilter {
    /// Creates a callback filter with default options.
    pub fn new<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&mut dyn QueryBuilder, &str, &str, &FilterData) -> bool + Send + Sync + 'static,
    {
        Self {
            base: FilterBase::new(name, FilterOptions::default()),
            callback: Arc::new(callback),
        }
    }

    /// Creates a callback filter from options carrying the closure.
    pub fn from_options(name: impl Into<String>, options: FilterOptions) -> Result<Self> {
        let name = name.into();
        let Some(callback) = options.callback.clone() else {
            return Err(DatagridError::InvalidFilterOptions {
                filter: name,
                reason: "a callback filter needs a callback".to_string(),
            });
        };
        Ok(Self {
            base: FilterBase::new(name, options),
            callback,
        })
    }
}

impl Filter for CallbackFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn apply(&self, query: &mut dyn QueryBuilder, data: Option<&FilterData>) -> bool {
        let Some(data) = data.filter(|d| !d.is_empty()) else {
            return false;
        };
        let alias = self.base.alias(query);
        (self.callback)(query, &alias, self.base.field_name(), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Condition, MemoryQuery};

    #[test]
    fn test_callback_receives_alias_and_field() {
        let filter = CallbackFilter::new("full_name", |query, alias, field, data| {
            let Some(text) = data.text() else {
                return false;
            };
            query.and_where(Condition::Any(vec![
                Condition::like(&format!("{alias}.first_name"), format!("%{text}%"), false),
                Condition::like(&format!("{alias}.{field}"), format!("%{text}%"), false),
            ]));
            true
        });

        let mut q = MemoryQuery::<serde_json::Value>::new(Vec::new());
        assert!(filter.apply(&mut q, Some(&FilterData::new("ann"))));
        let (sql, _) = q.where_clause().to_sql().unwrap();
        assert_eq!(sql, "(LOWER(o.first_name) LIKE ?) OR (LOWER(o.full_name) LIKE ?)");
    }

    #[test]
    fn test_empty_input_skips_callback() {
        let filter = CallbackFilter::new("x", |_, _, _, _| panic!("must not run"));
        let mut q = MemoryQuery::<serde_json::Value>::new(Vec::new());
        assert!(!filter.apply(&mut q, Some(&FilterData::new(""))));
    }

    #[test]
    fn test_options_without_callback() {
        assert!(CallbackFilter::from_options("x", FilterOptions::new()).is_err());
    }
}
