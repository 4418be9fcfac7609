//! The query collaborator a datagrid filters and a pager slices.
//!
//! Filters only see the object-safe [`QueryBuilder`] half; the pager needs
//! the full [`ProxyQuery`] to count, slice and execute.

mod condition;
mod memory;
mod sql;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use condition::{CompareOp, Condition, WhereClause};
pub use memory::{MemoryQuery, Record};
pub use sql::{SqlAssociation, SqlExecutor, SqlQuery};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    /// Ascending order (ASC)
    #[default]
    Asc,
    /// Descending order (DESC)
    Desc,
}

impl SortOrder {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for SortOrder {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            _ => Err(()),
        }
    }
}

/// The filter-facing side of a query.
pub trait QueryBuilder {
    /// Alias of the root entity, e.g. `o`.
    fn root_alias(&self) -> &str;

    /// Adds a condition that every row must satisfy.
    fn and_where(&mut self, condition: Condition);

    /// Adds a condition to the OR group.
    fn or_where(&mut self, condition: Condition);

    /// Joins `association` from the entity aliased `parent_alias` and
    /// returns the alias of the joined entity.
    ///
    /// Joining the same association twice returns the existing alias.
    fn join(&mut self, parent_alias: &str, association: &str) -> String;
}

/// The pager-facing side of a query.
///
/// Clones are independent: the pager clones the query to fetch single rows
/// for cursor navigation without touching the page window.
pub trait ProxyQuery: QueryBuilder + Clone {
    /// Row type produced by `execute`.
    type Row;

    /// Runs the query, honoring the sort and the result window.
    fn execute(&self) -> Result<Vec<Self::Row>>;

    /// Counts matching rows, ignoring the result window.
    fn count(&self) -> Result<usize>;

    /// Sets the offset of the first row, `None` for no offset.
    fn set_first_result(&mut self, first: Option<usize>);

    /// Returns the offset of the first row.
    fn first_result(&self) -> Option<usize>;

    /// Sets the maximum number of rows, `None` for no limit.
    fn set_max_results(&mut self, max: Option<usize>);

    /// Returns the maximum number of rows.
    fn max_results(&self) -> Option<usize>;

    /// Sets the qualified field to sort by.
    fn set_sort_by(&mut self, field: Option<String>);

    /// Returns the qualified sort field.
    fn sort_by(&self) -> Option<&str>;

    /// Sets the sort direction.
    fn set_sort_order(&mut self, order: SortOrder);

    /// Returns the sort direction.
    fn sort_order(&self) -> SortOrder;
}

/// Joins every association in `path` starting at the root alias and
/// returns the qualified `alias.field` reference.
pub fn qualify(query: &mut dyn QueryBuilder, path: &[String], field: &str) -> String {
    let mut alias = query.root_alias().to_string();
    for association in path {
        alias = query.join(&alias, association);
    }
    format!("{alias}.{field}")
}
