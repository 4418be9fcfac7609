//! SQL statement builder backend.
//!
//! [`SqlQuery`] renders parameterized `SELECT` and `COUNT` statements from
//! the conditions filters push into it. Running them is left to a
//! caller-supplied [`SqlExecutor`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use super::{Condition, ProxyQuery, QueryBuilder, SortOrder, WhereClause};
use crate::error::Result;
use crate::value::Value;

/// Runs statements built by [`SqlQuery`].
pub trait SqlExecutor {
    /// Row type returned by `fetch_all`.
    type Row;

    /// Runs a SELECT statement and returns all rows.
    fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Self::Row>>;

    /// Runs a COUNT statement and returns the single scalar.
    fn fetch_count(&self, sql: &str, params: &[Value]) -> Result<usize>;
}

/// How an association maps onto a joined table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlAssociation {
    /// Joined table name.
    pub table: String,
    /// Column on the owning side.
    pub local_column: String,
    /// Column on the joined table.
    pub foreign_column: String,
}

impl SqlAssociation {
    /// Creates a new association mapping.
    pub fn new(
        table: impl Into<String>,
        local_column: impl Into<String>,
        foreign_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            local_column: local_column.into(),
            foreign_column: foreign_column.into(),
        }
    }

    // `author` maps to `authors` via `author_id = id` unless configured.
    fn conventional(association: &str) -> Self {
        Self::new(
            format!("{association}s"),
            format!("{association}_id"),
            "id",
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Join {
    alias: String,
    parent_alias: String,
    mapping: SqlAssociation,
}

/// A query that renders to SQL.
///
/// # Example
///
/// ```
/// use oxide_datagrid::query::{Condition, QueryBuilder, SqlQuery};
/// # use oxide_datagrid::{Result, Value};
/// # struct NoDb;
/// # impl oxide_datagrid::query::SqlExecutor for NoDb {
/// #     type Row = ();
/// #     fn fetch_all(&self, _: &str, _: &[Value]) -> Result<Vec<()>> { Ok(vec![]) }
/// #     fn fetch_count(&self, _: &str, _: &[Value]) -> Result<usize> { Ok(0) }
/// # }
///
/// let mut query = SqlQuery::new(NoDb, "posts").columns(&["id", "title"]);
/// query.and_where(Condition::eq("o.status", "published"));
///
/// let (sql, params) = query.build_select();
/// assert_eq!(sql, "SELECT o.id, o.title FROM posts o WHERE o.status = ?");
/// assert_eq!(params.len(), 1);
/// ```
#[derive(Debug)]
pub struct SqlQuery<E> {
    executor: Arc<E>,
    table: String,
    root_alias: String,
    primary_key: String,
    columns: Vec<String>,
    associations: HashMap<String, SqlAssociation>,
    joins: Vec<Join>,
    where_clause: WhereClause,
    sort_by: Option<String>,
    sort_order: SortOrder,
    first_result: Option<usize>,
    max_results: Option<usize>,
}

// Manual Clone implementation to avoid E: Clone bound
impl<E> Clone for SqlQuery<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            table: self.table.clone(),
            root_alias: self.root_alias.clone(),
            primary_key: self.primary_key.clone(),
            columns: self.columns.clone(),
            associations: self.associations.clone(),
            joins: self.joins.clone(),
            where_clause: self.where_clause.clone(),
            sort_by: self.sort_by.clone(),
            sort_order: self.sort_order,
            first_result: self.first_result,
            max_results: self.max_results,
        }
    }
}

impl<E: SqlExecutor> SqlQuery<E> {
    /// Creates a query over `table`, aliased `o`, selecting every column.
    pub fn new(executor: E, table: impl Into<String>) -> Self {
        Self::with_executor(Arc::new(executor), table)
    }

    /// Creates a query sharing an existing executor.
    pub fn with_executor(executor: Arc<E>, table: impl Into<String>) -> Self {
        Self {
            executor,
            table: table.into(),
            root_alias: "o".to_string(),
            primary_key: "id".to_string(),
            columns: Vec::new(),
            associations: HashMap::new(),
            joins: Vec::new(),
            where_clause: WhereClause::new(),
            sort_by: None,
            sort_order: SortOrder::Asc,
            first_result: None,
            max_results: None,
        }
    }

    /// Selects specific columns of the root table.
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Sets the primary key column used for distinct counts.
    #[must_use]
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// Registers how an association is joined.
    #[must_use]
    pub fn association(mut self, name: impl Into<String>, mapping: SqlAssociation) -> Self {
        self.associations.insert(name.into(), mapping);
        self
    }

    /// Returns the accumulated WHERE clause.
    pub fn where_clause(&self) -> &WhereClause {
        &self.where_clause
    }

    fn build_from(&self, sql: &mut String) {
        sql.push_str(" FROM ");
        sql.push_str(&self.table);
        sql.push(' ');
        sql.push_str(&self.root_alias);

        for join in &self.joins {
            sql.push_str(&format!(
                " LEFT JOIN {} {} ON {}.{} = {}.{}",
                join.mapping.table,
                join.alias,
                join.parent_alias,
                join.mapping.local_column,
                join.alias,
                join.mapping.foreign_column,
            ));
        }
    }

    fn build_where(&self, sql: &mut String, params: &mut Vec<Value>) {
        if let Some((where_sql, where_params)) = self.where_clause.to_sql() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
            params.extend(where_params);
        }
    }

    /// Builds the SELECT statement and parameters.
    pub fn build_select(&self) -> (String, Vec<Value>) {
        let mut sql = String::from("SELECT ");
        let mut params = Vec::new();

        // Joins can multiply root rows
        if !self.joins.is_empty() {
            sql.push_str("DISTINCT ");
        }

        if self.columns.is_empty() {
            sql.push_str(&format!("{}.*", self.root_alias));
        } else {
            let cols: Vec<String> = self
                .columns
                .iter()
                .map(|c| format!("{}.{c}", self.root_alias))
                .collect();
            sql.push_str(&cols.join(", "));
        }

        self.build_from(&mut sql);
        self.build_where(&mut sql, &mut params);

        if let Some(sort_by) = &self.sort_by {
            sql.push_str(&format!(" ORDER BY {sort_by} {}", self.sort_order));
        }

        if let Some(limit) = self.max_results {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = self.first_result {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        (sql, params)
    }

    /// Builds the COUNT statement and parameters.
    pub fn build_count(&self) -> (String, Vec<Value>) {
        let mut sql = if self.joins.is_empty() {
            String::from("SELECT COUNT(*)")
        } else {
            format!(
                "SELECT COUNT(DISTINCT {}.{})",
                self.root_alias, self.primary_key
            )
        };
        let mut params = Vec::new();

        self.build_from(&mut sql);
        self.build_where(&mut sql, &mut params);

        (sql, params)
    }
}

impl<E: SqlExecutor> QueryBuilder for SqlQuery<E> {
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
            format!("s_{association}")
        } else {
            format!("{parent_alias}_{association}")
        };

        if !self.joins.iter().any(|j| j.alias == alias) {
            let mapping = self
                .associations
                .get(association)
                .cloned()
                .unwrap_or_else(|| SqlAssociation::conventional(association));
            self.joins.push(Join {
                alias: alias.clone(),
                parent_alias: parent_alias.to_string(),
                mapping,
            });
        }

        alias
    }
}

impl<E: SqlExecutor> ProxyQuery for SqlQuery<E> {
    type Row = E::Row;

    fn execute(&self) -> Result<Vec<E::Row>> {
        let (sql, params) = self.build_select();
        trace!(%sql, params = params.len(), "executing select");
        self.executor.fetch_all(&sql, &params)
    }

    fn count(&self) -> Result<usize> {
        let (sql, params) = self.build_count();
        trace!(%sql, params = params.len(), "executing count");
        self.executor.fetch_count(&sql, &params)
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
