//! # oxide-admin-routing
//!
//! Routes for admin screens, including admins nested under a parent.
//!
//! Each admin registered in an [`AdminPool`] owns a [`RouteCollection`]:
//! the CRUD routes (`list`, `create`, `batch`, `edit`, `delete`, `show`,
//! `export`) plus whatever its route configurator adds. A child admin's
//! routes live under its parent's object:
//!
//! | admin           | route code                        | pattern                                 |
//! |-----------------|-----------------------------------|-----------------------------------------|
//! | `admin.post`    | `admin.post.edit`                 | `/post/{id}/edit`                       |
//! | `admin.comment` | `admin.post\|admin.comment.edit`  | `/post/{id}/comment/{childid}/edit`     |
//!
//! A [`RouteGenerator`] resolves short names such as `edit` to codes,
//! fills in parent ids from the current request and renders URLs.
//!
//! ```
//! use std::sync::Arc;
//! use oxide_admin_routing::{AdminNode, AdminPool, Parameters, RouteGenerator};
//!
//! let mut pool = AdminPool::new();
//! pool.register(AdminNode::new("admin.post", "Posts"))?;
//! let mut generator = RouteGenerator::new(Arc::new(pool));
//!
//! let params = Parameters::from([("id".to_string(), "7".to_string())]);
//! assert_eq!(generator.generate("admin.post", "show", params, None)?, "/post/7/show");
//! # Ok::<(), oxide_admin_routing::RoutingError>(())
//! ```

pub mod admin;
pub mod breadcrumbs;
pub mod error;
pub mod generator;
pub mod path;
pub mod route;

pub use admin::{id_parameter, AdminNode, AdminPool, RouteConfigurator};
pub use breadcrumbs::{Breadcrumb, BreadcrumbsBuilder};
pub use error::{Result, RoutingError};
pub use generator::{MenuUrl, Parameters, RequestAttributes, RouteGenerator};
pub use path::{PathPattern, PathSegment};
pub use route::{Route, RouteCollection, RouteInfo};
