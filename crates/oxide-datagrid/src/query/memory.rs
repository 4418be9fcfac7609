//! In-memory query backend.
//!
//! Evaluates conditions against rows held in memory. Useful for small
//! fixed collections and for exercising datagrids without a database.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use super::{CompareOp, Condition, ProxyQuery, QueryBuilder, SortOrder, WhereClause};
use crate::error::Result;
use crate::value::Value;

/// A row that can be read by dotted field path.
pub trait Record {
    /// Returns every value reachable at `path`.
    ///
    /// Single-valued fields yield one value (possibly [`Value::Null`]);
    /// to-many associations yield one value per related row.
    fn values(&self, path: &str) -> Vec<Value>;
}

impl Record for serde_json::Value {
    fn values(&self, path: &str) -> Vec<Value> {
        let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        let mut out = Vec::new();
        collect_json(self, &segments, &mut out);
        out
    }
}

fn collect_json(json: &serde_json::Value, segments: &[&str], out: &mut Vec<Value>) {
    match (json, segments.split_first()) {
        (serde_json::Value::Array(items), _) => {
            for item in items {
                collect_json(item, segments, out);
            }
        }
        (_, None) => out.push(Value::from_json(json)),
        (serde_json::Value::Object(map), Some((head, rest))) => match map.get(*head) {
            Some(next) => collect_json(next, rest, out),
            None => out.push(Value::Null),
        },
        (_, Some(_)) => out.push(Value::Null),
    }
}

impl Record for HashMap<String, Value> {
    fn values(&self, path: &str) -> Vec<Value> {
        vec![self.get(path).cloned().unwrap_or(Value::Null)]
    }
}

/// A query over rows held in memory.
///
/// Joins only register aliases; association fields are read through the
/// row's nested structure (`author.name`).
#[derive(Debug)]
pub struct MemoryQuery<R> {
    rows: Arc<Vec<R>>,
    root_alias: String,
    joins: Vec<String>,
    where_clause: WhereClause,
    sort_by: Option<String>,
    sort_order: SortOrder,
    first_result: Option<usize>,
    max_results: Option<usize>,
}

// Manual Clone implementation to avoid R: Clone bound
impl<R> Clone for MemoryQuery<R> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            root_alias: self.root_alias.clone(),
            joins: self.joins.clone(),
            where_clause: self.where_clause.clone(),
            sort_by: self.sort_by.clone(),
            sort_order: self.sort_order,
            first_result: self.first_result,
            max_results: self.max_results,
        }
    }
}

impl<R: Record> MemoryQuery<R> {
    /// Creates a query over the given rows with root alias `o`.
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows: Arc::new(rows),
            root_alias: "o".to_string(),
            joins: Vec::new(),
            where_clause: WhereClause::new(),
            sort_by: None,
            sort_order: SortOrder::Asc,
            first_result: None,
            max_results: None,
        }
    }

    /// Returns the accumulated WHERE clause.
    pub fn where_clause(&self) -> &WhereClause {
        &self.where_clause
    }

    /// Returns the registered join aliases in join order.
    pub fn joins(&self) -> &[String] {
        &self.joins
    }

    fn path<'a>(&self, field: &'a str) -> &'a str {
        field
            .strip_prefix(self.root_alias.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(field)
    }

    fn matches(&self, row: &R, condition: &Condition) -> bool {
        match condition {
            Condition::Compare { field, op, value } => row
                .values(self.path(field))
                .iter()
                .any(|v| compare_holds(v.compare(value), *op)),
            Condition::Like {
                field,
                pattern,
                case_sensitive,
                negated,
            } => {
                let texts: Vec<String> = row
                    .values(self.path(field))
                    .iter()
                    .filter_map(Value::as_text)
                    .collect();
                if texts.is_empty() {
                    return false;
                }
                let found = texts
                    .iter()
                    .any(|text| like_match(text, pattern, *case_sensitive));
                found != *negated
            }
            Condition::IsNull { field } => {
                row.values(self.path(field)).iter().all(Value::is_null)
            }
            Condition::IsNotNull { field } => {
                row.values(self.path(field)).iter().any(|v| !v.is_null())
            }
            Condition::In {
                field,
                values,
                negated,
            } => {
                let present: Vec<Value> = row
                    .values(self.path(field))
                    .into_iter()
                    .filter(|v| !v.is_null())
                    .collect();
                if present.is_empty() {
                    return false;
                }
                let found = present
                    .iter()
                    .any(|v| values.iter().any(|candidate| v.loose_eq(candidate)));
                found != *negated
            }
            Condition::Between { field, low, high } => {
                row.values(self.path(field)).iter().any(|v| {
                    compare_holds(v.compare(low), CompareOp::Gte)
                        && compare_holds(v.compare(high), CompareOp::Lte)
                })
            }
            Condition::All(children) => children.iter().all(|c| self.matches(row, c)),
            Condition::Any(children) => children.iter().any(|c| self.matches(row, c)),
            Condition::Not(inner) => !self.matches(row, inner),
        }
    }

    fn matching_rows(&self) -> Vec<&R> {
        let condition = self.where_clause.to_condition();
        let mut rows: Vec<&R> = self
            .rows
            .iter()
            .filter(|row| condition.as_ref().map_or(true, |c| self.matches(row, c)))
            .collect();

        if let Some(sort_by) = &self.sort_by {
            let path = self.path(sort_by);
            rows.sort_by(|a, b| {
                let ord = sort_key_cmp(&first_value(*a, path), &first_value(*b, path));
                match self.sort_order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }

        rows
    }
}

fn first_value<R: Record>(row: &R, path: &str) -> Value {
    row.values(path).into_iter().next().unwrap_or(Value::Null)
}

// NULLs sort first, as SQLite does for ascending order.
fn sort_key_cmp(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.compare(b).unwrap_or(Ordering::Equal),
    }
}

fn compare_holds(ord: Option<Ordering>, op: CompareOp) -> bool {
    let Some(ord) = ord else {
        return false;
    };
    match op {
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::Ne => ord != Ordering::Equal,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::Gte => ord != Ordering::Less,
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::Lte => ord != Ordering::Greater,
    }
}

/// Matches `text` against a LIKE pattern (`%` any run, `_` one char).
pub(crate) fn like_match(text: &str, pattern: &str, case_sensitive: bool) -> bool {
    let (text, pattern) = if case_sensitive {
        (text.to_string(), pattern.to_string())
    } else {
        (text.to_lowercase(), pattern.to_lowercase())
    };
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    // matched[j]: the text prefix consumed so far matches pattern[..j]
    let mut matched = vec![false; pattern.len() + 1];
    matched[0] = true;
    for j in 1..=pattern.len() {
        matched[j] = matched[j - 1] && pattern[j - 1] == '%';
    }

    for c in &text {
        let mut next = vec![false; pattern.len() + 1];
        for j in 1..=pattern.len() {
            next[j] = match pattern[j - 1] {
                '%' => next[j - 1] || matched[j],
                '_' => matched[j - 1],
                p => matched[j - 1] && p == *c,
            };
        }
        matched = next;
    }

    matched[pattern.len()]
}

impl<R: Record> QueryBuilder for MemoryQuery<R> {
    fn root_alias(&self) -> &str {
        &self.root_alias
    }

    fn and_where(&mut self, condition: Condition) {
        self.where_clause.and_where(condition);
    }

    fn or_where(&mut self, condition: Condition) {
        self.where_clause.or_where(condition);
    }

    fn join(&mut self, parent_alias: &str, association: &str) -> String {
        let alias = if parent_alias == self.root_alias {
            association.to_string()
        } else {
            format!("{parent_alias}.{association}")
        };
        if !self.joins.contains(&alias) {
            self.joins.push(alias.clone());
        }
        alias
    }
}

impl<R: Record + Clone> ProxyQuery for MemoryQuery<R> {
    type Row = R;

    fn execute(&self) -> Result<Vec<R>> {
        let rows = self.matching_rows();
        let skip = self.first_result.unwrap_or(0);
        let take = self.max_results.unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(skip).take(take).cloned().collect())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.matching_rows().len())
    }

    fn set_first_result(&mut self, first: Option<usize>) {
        self.first_result = first;
    }

    fn first_result(&self) -> Option<usize> {
        self.first_result
    }

    fn set_max_results(&mut self, max: Option<usize>) {
        self.max_results = max;
    }

    fn max_results(&self) -> Option<usize> {
        self.max_results
    }

    fn set_sort_by(&mut self, field: Option<String>) {
        self.sort_by = field;
    }

    fn sort_by(&self) -> Option<&str> {
        self.sort_by.as_deref()
    }

    fn set_sort_order(&mut self, order: SortOrder) {
        self.sort_order = order;
    }

    fn sort_order(&self) -> SortOrder {
        self.sort_order
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rows() -> Vec<serde_json::Value> {
        vec![
            json!({"id": 1, "title": "Rust in Action", "views": 10, "author": {"name": "Ann"}}),
            json!({"id": 2, "title": "Learning SQL", "views": 30, "author": {"name": "Bob"}}),
            json!({"id": 3, "title": "rusty tools", "views": null, "author": null}),
        ]
    }

    #[test]
    fn test_like_match() {
        assert!(like_match("Rust in Action", "%rust%", false));
        assert!(!like_match("Rust in Action", "%rust%", true));
        assert!(like_match("abc", "a_c", true));
        assert!(!like_match("abcd", "a_c", true));
        assert!(like_match("", "%", true));
    }

    #[test]
    fn test_filter_and_count() {
        let mut query = MemoryQuery::new(rows());
        query.and_where(Condition::like("o.title", "%rust%", false));
        assert_eq!(query.count().unwrap(), 2);
    }

    #[test]
    fn test_association_path() {
        let mut query = MemoryQuery::new(rows());
        let alias = query.join("o", "author");
        assert_eq!(alias, "author");
        query.and_where(Condition::eq(&format!("{alias}.name"), "Bob"));
        let found = query.execute().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["id"], json!(2));
    }

    #[test]
    fn test_sort_and_window() {
        let mut query = MemoryQuery::new(rows());
        query.set_sort_by(Some("o.views".to_string()));
        query.set_sort_order(SortOrder::Desc);
        query.set_first_result(Some(1));
        query.set_max_results(Some(1));

        let found = query.execute().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["id"], json!(1));
        assert_eq!(query.count().unwrap(), 3);
    }

    #[test]
    fn test_null_semantics() {
        let mut query = MemoryQuery::new(rows());
        query.and_where(Condition::is_null("o.views"));
        assert_eq!(query.count().unwrap(), 1);

        let mut query = MemoryQuery::new(rows());
        query.and_where(Condition::not_in_list("o.views", vec![Value::Int(10)]));
        assert_eq!(query.count().unwrap(), 1);
    }

    #[test]
    fn test_to_many_values() {
        let row = json!({"tags": [{"name": "a"}, {"name": "b"}]});
        assert_eq!(
            row.values("tags.name"),
            vec![Value::Text("a".into()), Value::Text("b".into())]
        );
    }
}
