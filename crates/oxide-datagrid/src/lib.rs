//! # oxide-datagrid
//!
//! Filterable, sortable, paginated list views over any query backend.
//!
//! A [`Datagrid`] binds three things together for one list screen:
//!
//! - a query implementing [`ProxyQuery`](query::ProxyQuery)
//! - named [filters](filter) that narrow the query from raw input values
//! - a [`Pager`] that counts the matches and slices out one page
//!
//! ## Quick Start
//!
//! ```
//! use oxide_datagrid::{DatagridBuilder, DatagridConfig, DatagridValues, FilterOptions};
//! use oxide_datagrid::query::MemoryQuery;
//! use serde_json::json;
//!
//! let posts: Vec<_> = (1..=25)
//!     .map(|id| json!({"id": id, "title": format!("Post {id}"), "views": id * 10}))
//!     .collect();
//!
//! let values = DatagridValues::from_query_pairs([
//!     ("views[type]", "gte"),
//!     ("views[value]", "50"),
//!     ("_sort_by", "views"),
//!     ("_sort_order", "DESC"),
//!     ("_page", "2"),
//! ]);
//!
//! let mut grid = DatagridBuilder::new(MemoryQuery::new(posts))
//!     .config(DatagridConfig::new().max_per_page(10).sortable_fields(&["views"]))
//!     .values(values)
//!     .filter("views", "number", FilterOptions::new())?
//!     .build()?;
//!
//! let page = grid.results()?;
//! assert_eq!(page.len(), 10);
//! assert_eq!(page[0]["id"], json!(15));
//! assert_eq!(grid.pager().nb_results(), 21);
//! # Ok::<(), oxide_datagrid::DatagridError>(())
//! ```
//!
//! ## Input Values
//!
//! Values are keyed by filter name, plus:
//!
//! - `_page` - Page number (1-based)
//! - `_per_page` - Page size, restricted to the configured options
//! - `_sort_by` - Sort field, restricted to the configured sortable fields
//! - `_sort_order` - `ASC` or `DESC`
//!
//! ## Backends
//!
//! - [`MemoryQuery`](query::MemoryQuery) - Filters rows held in memory
//! - [`SqlQuery`](query::SqlQuery) - Renders parameterized SQL for an
//!   [`SqlExecutor`](query::SqlExecutor)

pub mod config;
pub mod datagrid;
pub mod error;
pub mod filter;
pub mod pager;
pub mod query;
pub mod value;

// Re-export main types
pub use config::{DatagridConfig, FilterDefinition};
pub use datagrid::{BindState, Datagrid, DatagridBuilder, DatagridValues};
pub use error::{DatagridError, Result};
pub use filter::{Filter, FilterData, FilterFactory, FilterOptions, FilterType};
pub use pager::{Pager, PagerIter, PagerKind};
pub use value::Value;
