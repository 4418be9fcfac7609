//! Error types for admin routing.

use thiserror::Error;

/// Routing-specific errors.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Invalid path pattern or parameter requirement.
    #[error("invalid path pattern: {0}")]
    InvalidPattern(String),

    /// No route is known under the resolved code.
    #[error("unable to find the route `{0}`")]
    RouteNotFound(String),

    /// A path parameter was not supplied.
    #[error("missing parameter `{name}` for route `{route}`")]
    MissingParameter { route: String, name: String },

    /// A path parameter does not satisfy its requirement.
    #[error("parameter `{name}` of route `{route}` must match `{requirement}`, got `{value}`")]
    InvalidParameter {
        route: String,
        name: String,
        requirement: String,
        value: String,
    },

    /// No admin is registered under the code.
    #[error("admin not registered: {0}")]
    AdminNotFound(String),

    /// An admin with the same code is already registered.
    #[error("admin already registered: {0}")]
    DuplicateAdmin(String),

    /// The child relation would be invalid.
    #[error("cannot add `{child}` as a child of `{parent}`: {reason}")]
    InvalidChild {
        parent: String,
        child: String,
        reason: String,
    },
}

/// Result type alias for routing operations.
pub type Result<T> = std::result::Result<T, RoutingError>;
