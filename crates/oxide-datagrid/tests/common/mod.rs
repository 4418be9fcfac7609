#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use oxide_datagrid::filter::FilterBase;
use oxide_datagrid::query::{Condition, MemoryQuery, ProxyQuery, QueryBuilder, SortOrder, SqlExecutor};
use oxide_datagrid::{Filter, FilterData, FilterOptions, Result, Value};
use serde_json::json;

/// Shared event log written by [`SpyFilter`] and [`LoggedQuery`].
pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Twelve users with a status, an optional team and a join date.
pub fn users() -> Vec<serde_json::Value> {
    let statuses = ["active", "blocked", "active", "pending"];
    (1..=12)
        .map(|id| {
            let team = if id % 3 == 0 {
                serde_json::Value::Null
            } else {
                json!({"id": id % 3, "name": format!("Team {}", id % 3)})
            };
            json!({
                "id": id,
                "name": format!("User {id:02}"),
                "status": statuses[(id as usize - 1) % statuses.len()],
                "age": 20 + id,
                "team": team,
                "joined": format!("2024-01-{id:02}"),
            })
        })
        .collect()
}

pub fn ids(rows: &[serde_json::Value]) -> Vec<i64> {
    rows.iter().filter_map(|row| row["id"].as_i64()).collect()
}

/// A filter that records every call and narrows on equality.
pub struct SpyFilter {
    base: FilterBase,
    log: Log,
}

impl SpyFilter {
    pub fn new(name: &str, log: Log) -> Self {
        Self {
            base: FilterBase::new(name, FilterOptions::new()),
            log,
        }
    }
}

impl Filter for SpyFilter {
    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn apply(&self, query: &mut dyn QueryBuilder, data: Option<&FilterData>) -> bool {
        let text = data.and_then(FilterData::text);
        self.log
            .lock()
            .unwrap()
            .push(format!("apply {}={}", self.name(), text.as_deref().unwrap_or("")));
        let Some(text) = text else {
            return false;
        };
        let field = self.base.field_ref(query);
        query.and_where(Condition::eq(&field, text));
        true
    }
}

/// A memory query that logs when it is counted or executed.
#[derive(Clone)]
pub struct LoggedQuery {
    inner: MemoryQuery<serde_json::Value>,
    log: Log,
}

impl LoggedQuery {
    pub fn new(rows: Vec<serde_json::Value>, log: Log) -> Self {
        Self {
            inner: MemoryQuery::new(rows),
            log,
        }
    }
}

impl QueryBuilder for LoggedQuery {
    fn root_alias(&self) -> &str {
        self.inner.root_alias()
    }

    fn and_where(&mut self, condition: Condition) {
        self.inner.and_where(condition);
    }

    fn or_where(&mut self, condition: Condition) {
        self.inner.or_where(condition);
    }

    fn join(&mut self, parent_alias: &str, association: &str) -> String {
        self.inner.join(parent_alias, association)
    }
}

impl ProxyQuery for LoggedQuery {
    type Row = serde_json::Value;

    fn execute(&self) -> Result<Vec<serde_json::Value>> {
        self.log.lock().unwrap().push("execute".to_string());
        self.inner.execute()
    }

    fn count(&self) -> Result<usize> {
        self.log.lock().unwrap().push("count".to_string());
        self.inner.count()
    }

    fn set_first_result(&mut self, first: Option<usize>) {
        self.inner.set_first_result(first);
    }

    fn first_result(&self) -> Option<usize> {
        self.inner.first_result()
    }

    fn set_max_results(&mut self, max: Option<usize>) {
        self.inner.set_max_results(max);
    }

    fn max_results(&self) -> Option<usize> {
        self.inner.max_results()
    }

    fn set_sort_by(&mut self, field: Option<String>) {
        self.inner.set_sort_by(field);
    }

    fn sort_by(&self) -> Option<&str> {
        self.inner.sort_by()
    }

    fn set_sort_order(&mut self, order: SortOrder) {
        self.inner.set_sort_order(order);
    }

    fn sort_order(&self) -> SortOrder {
        self.inner.sort_order()
    }
}

/// An executor that records statements and answers with fixed figures.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub total: usize,
    pub statements: Mutex<Vec<(String, Vec<Value>)>>,
}

impl RecordingExecutor {
    pub fn with_total(total: usize) -> Self {
        Self {
            total,
            statements: Mutex::new(Vec::new()),
        }
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements
            .lock()
            .unwrap()
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }
}

impl SqlExecutor for RecordingExecutor {
    type Row = usize;

    fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<usize>> {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        Ok(Vec::new())
    }

    fn fetch_count(&self, sql: &str, params: &[Value]) -> Result<usize> {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        Ok(self.total)
    }
}
