//! Text filters.

use tracing::debug;

use super::{Filter, FilterBase, FilterData, FilterOptions};
use crate::query::{Condition, QueryBuilder};

/// Operators understood by [`StringFilter`].
///
/// Numeric keys are accepted for form compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringOperator {
    Contains,
    NotContains,
    Equal,
    StartsWith,
    EndsWith,
}

impl StringOperator {
    fn parse(key: Option<&str>) -> Self {
        match key {
            Some("not_contains" | "2") => Self::NotContains,
            Some("equal" | "3") => Self::Equal,
            Some("starts_with" | "4") => Self::StartsWith,
            Some("ends_with" | "5") => Self::EndsWith,
            _ => Self::Contains,
        }
    }
}

/// A filter matching text fields.
///
/// Matching is case insensitive unless `case_sensitive` is set.
pub struct StringFilter {
    base: FilterBase,
}

impl StringFilter {
    /// Creates a new string filter with default options.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, FilterOptions::default())
    }

    /// Creates a new string filter.
    pub fn with_options(name: impl Into<String>, options: FilterOptions) -> Self {
        Self {
            base: FilterBase::new(name, options),
        }
    }
}

impl Filter for StringFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn apply(&self, query: &mut dyn QueryBuilder, data: Option<&FilterData>) -> bool {
        let Some(data) = data else {
            return false;
        };
        let Some(text) = data.text() else {
            return false;
        };

        let operator = StringOperator::parse(self.base.operator(data));
        let case_sensitive = self.base.options().case_sensitive;
        let field = self.base.field_ref(query);

        let condition = match operator {
            StringOperator::Contains => {
                Condition::like(&field, format!("%{text}%"), case_sensitive)
            }
            StringOperator::NotContains => Condition::Any(vec![
                Condition::not_like(&field, format!("%{text}%"), case_sensitive),
                Condition::is_null(&field),
            ]),
            StringOperator::Equal if case_sensitive => Condition::eq(&field, text),
            StringOperator::Equal => Condition::like(&field, text, false),
            StringOperator::StartsWith => Condition::like(&field, format!("{text}%"), case_sensitive),
            StringOperator::EndsWith => Condition::like(&field, format!("%{text}"), case_sensitive),
        };

        debug!(filter = self.base.name(), ?operator, "applying string filter");
        self.base.push(query, condition);
        true
    }
}

/// A filter for null / not null checks.
pub struct NullFilter {
    base: FilterBase,
}

impl NullFilter {
    /// Creates a new null filter.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, FilterOptions::default())
    }

    /// Creates a new null filter with options.
    pub fn with_options(name: impl Into<String>, options: FilterOptions) -> Self {
        Self {
            base: FilterBase::new(name, options),
        }
    }
}

impl Filter for NullFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn apply(&self, query: &mut dyn QueryBuilder, data: Option<&FilterData>) -> bool {
        let Some(text) = data.and_then(FilterData::text) else {
            return false;
        };

        let is_null = match text.as_str() {
            "null" | "true" | "1" => true,
            "notnull" | "not_null" | "false" | "0" => false,
            other => {
                debug!(filter = self.base.name(), value = other, "ignoring null filter input");
                return false;
            }
        };

        let field = self.base.field_ref(query);
        let condition = if is_null {
            Condition::is_null(&field)
        } else {
            Condition::is_not_null(&field)
        };
        self.base.push(query, condition);
        true
    }

    fn choices(&self) -> Vec<(String, String)> {
        vec![
            ("null".to_string(), "Empty".to_string()),
            ("notnull".to_string(), "Not empty".to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::query::{MemoryQuery, WhereClause};

    fn query() -> MemoryQuery<serde_json::Value> {
        MemoryQuery::new(Vec::new())
    }

    fn single(clause: &WhereClause) -> Condition {
        clause.to_condition().unwrap()
    }

    #[test]
    fn test_contains_by_default() {
        let filter = StringFilter::new("title");
        let mut q = query();
        assert!(filter.apply(&mut q, Some(&FilterData::new("rust"))));
        assert_eq!(single(q.where_clause()), Condition::like("o.title", "%rust%", false));
    }

    #[test]
    fn test_equal_case_sensitive() {
        let filter = StringFilter::with_options("title", FilterOptions::new().case_sensitive(true));
        let mut q = query();
        filter.apply(&mut q, Some(&FilterData::with_operator("equal", "Rust")));
        assert_eq!(single(q.where_clause()), Condition::eq("o.title", "Rust"));
    }

    #[test]
    fn test_not_contains_keeps_nulls() {
        let filter = StringFilter::new("title");
        let mut q = query();
        filter.apply(&mut q, Some(&FilterData::with_operator("2", "x")));
        let (sql, _) = single(q.where_clause()).to_sql();
        assert_eq!(sql, "(LOWER(o.title) NOT LIKE ?) OR (o.title IS NULL)");
    }

    #[test]
    fn test_blank_input_is_pass_through() {
        let filter = StringFilter::new("title");
        let mut q = query();
        assert!(!filter.apply(&mut q, None));
        assert!(!filter.apply(&mut q, Some(&FilterData::new("   "))));
        assert!(!filter.apply(&mut q, Some(&FilterData::new(json!(null)))));
        assert!(q.where_clause().is_empty());
    }

    #[test]
    fn test_association_field() {
        let filter = StringFilter::with_options(
            "author_name",
            FilterOptions::new().association_path(&["author"]).field_name("name"),
        );
        let mut q = query();
        filter.apply(&mut q, Some(&FilterData::with_operator("starts_with", "An")));
        assert_eq!(q.joins(), ["author".to_string()]);
        assert_eq!(single(q.where_clause()), Condition::like("author.name", "An%", false));
    }

    #[test]
    fn test_null_filter() {
        let filter = NullFilter::new("deleted_at");

        let mut q = query();
        assert!(filter.apply(&mut q, Some(&FilterData::new("null"))));
        assert_eq!(single(q.where_clause()), Condition::is_null("o.deleted_at"));

        let mut q = query();
        assert!(filter.apply(&mut q, Some(&FilterData::new("notnull"))));
        assert_eq!(single(q.where_clause()), Condition::is_not_null("o.deleted_at"));

        let mut q = query();
        assert!(!filter.apply(&mut q, Some(&FilterData::new("maybe"))));
    }
}
