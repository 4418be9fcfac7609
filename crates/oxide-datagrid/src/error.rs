//! Error types for datagrids, pagers and filters.

use thiserror::Error;

/// Datagrid-specific errors.
#[derive(Debug, Error)]
pub enum DatagridError {
    /// The pager was initialised before a query was attached.
    #[error("the pager has no query; call set_query() before init()")]
    MissingQuery,

    /// No filter is registered for the requested type key.
    #[error("unknown filter type: {0}")]
    UnknownFilterType(String),

    /// The options given to a filter cannot produce a working filter.
    #[error("invalid options for filter `{filter}`: {reason}")]
    InvalidFilterOptions { filter: String, reason: String },

    /// The query backend failed.
    #[error("query backend error: {0}")]
    Backend(String),

    /// A datagrid configuration could not be read.
    #[error("invalid datagrid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias for datagrid operations.
pub type Result<T> = std::result::Result<T, DatagridError>;
