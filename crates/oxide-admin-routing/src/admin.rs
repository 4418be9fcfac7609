//! Admin registrations and their parent/child tree.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, RoutingError};
use crate::route::RouteCollection;

/// Hook that adds, removes or tweaks an admin's routes.
pub type RouteConfigurator = Arc<dyn Fn(&mut RouteCollection) -> Result<()> + Send + Sync>;

/// One registered admin.
///
/// Route name and pattern default from the code: `admin.post` becomes
/// `admin_post` and `/post`. For a child admin only the last code segment
/// is used, appended to the parent's values.
#[derive(Clone)]
pub struct AdminNode {
    code: String,
    label: String,
    base_route_name: Option<String>,
    base_route_pattern: Option<String>,
    controller: Option<String>,
    persistent_parameters: BTreeMap<String, String>,
    configure_routes: Option<RouteConfigurator>,
    parent: Option<String>,
    children: Vec<String>,
}

impl fmt::Debug for AdminNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminNode")
            .field("code", &self.code)
            .field("label", &self.label)
            .field("base_route_name", &self.base_route_name)
            .field("base_route_pattern", &self.base_route_pattern)
            .field("controller", &self.controller)
            .field("persistent_parameters", &self.persistent_parameters)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

fn last_segment(code: &str) -> &str {
    code.rsplit('.').next().unwrap_or(code)
}

impl AdminNode {
    /// Creates an admin with the given code and label.
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            base_route_name: None,
            base_route_pattern: None,
            controller: None,
            persistent_parameters: BTreeMap::new(),
            configure_routes: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Sets the route name prefix (the suffix for a child admin).
    #[must_use]
    pub fn base_route_name(mut self, name: impl Into<String>) -> Self {
        self.base_route_name = Some(name.into());
        self
    }

    /// Sets the path prefix (the suffix for a child admin).
    #[must_use]
    pub fn base_route_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.base_route_pattern = Some(pattern.into());
        self
    }

    /// Sets the controller routes default to (the code when unset).
    #[must_use]
    pub fn controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    /// Adds a parameter carried by every URL this admin generates.
    #[must_use]
    pub fn persistent_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.persistent_parameters.insert(key.into(), value.into());
        self
    }

    /// Sets a hook run after the default routes are added.
    #[must_use]
    pub fn configure_routes<F>(mut self, configure: F) -> Self
    where
        F: Fn(&mut RouteCollection) -> Result<()> + Send + Sync + 'static,
    {
        self.configure_routes = Some(Arc::new(configure));
        self
    }

    /// Returns the admin code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the persistent parameters.
    pub fn persistent_parameters(&self) -> &BTreeMap<String, String> {
        &self.persistent_parameters
    }

    /// Returns the parent admin code.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Returns the child admin codes in registration order.
    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// Returns true if the admin is nested under another.
    pub fn is_child(&self) -> bool {
        self.parent.is_some()
    }
}

/// The id parameter of an admin nested `depth` levels deep.
///
/// `id`, `childid`, `grandchildid`, `greatgrandchildid`, ...
pub fn id_parameter(depth: usize) -> String {
    match depth {
        0 => "id".to_string(),
        1 => "childid".to_string(),
        n => format!("{}grandchildid", "great".repeat(n - 2)),
    }
}

/// Registry of admins and their nesting.
///
/// # Example
///
/// ```
/// use oxide_admin_routing::{AdminNode, AdminPool};
///
/// let mut pool = AdminPool::new();
/// pool.register(AdminNode::new("admin.post", "Posts")).unwrap();
/// pool.register(AdminNode::new("admin.comment", "Comments")).unwrap();
/// pool.add_child("admin.post", "admin.comment").unwrap();
///
/// let routes = pool.routes("admin.comment").unwrap();
/// let list = routes.get("list").unwrap();
/// assert_eq!(list.name(), "admin_post_comment_list");
/// assert_eq!(list.pattern(), "/post/{id}/comment/list");
/// ```
#[derive(Debug, Clone, Default)]
pub struct AdminPool {
    admins: HashMap<String, AdminNode>,
    order: Vec<String>,
}

impl AdminPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an admin.
    pub fn register(&mut self, admin: AdminNode) -> Result<()> {
        if self.admins.contains_key(&admin.code) {
            return Err(RoutingError::DuplicateAdmin(admin.code));
        }
        debug!(admin = %admin.code, "registering admin");
        self.order.push(admin.code.clone());
        self.admins.insert(admin.code.clone(), admin);
        Ok(())
    }

    /// Nests `child` under `parent`.
    pub fn add_child(&mut self, parent: &str, child: &str) -> Result<()> {
        let invalid = |reason: &str| RoutingError::InvalidChild {
            parent: parent.to_string(),
            child: child.to_string(),
            reason: reason.to_string(),
        };

        self.get(parent)?;
        let node = self.get(child)?;
        if node.parent.is_some() {
            return Err(invalid("it already has a parent"));
        }
        if parent == child || self.ancestors(parent)?.iter().any(|a| a.code == child) {
            return Err(invalid("the admins would form a cycle"));
        }

        if let Some(node) = self.admins.get_mut(child) {
            node.parent = Some(parent.to_string());
        }
        if let Some(node) = self.admins.get_mut(parent) {
            node.children.push(child.to_string());
        }
        Ok(())
    }

    /// Returns an admin by code.
    pub fn get(&self, code: &str) -> Result<&AdminNode> {
        self.admins
            .get(code)
            .ok_or_else(|| RoutingError::AdminNotFound(code.to_string()))
    }

    /// Returns true if an admin is registered under `code`.
    pub fn has(&self, code: &str) -> bool {
        self.admins.contains_key(code)
    }

    /// Iterates over admins in registration order.
    pub fn admins(&self) -> impl Iterator<Item = &AdminNode> {
        self.order.iter().filter_map(|code| self.admins.get(code))
    }

    /// Returns the ancestors of an admin, root first.
    pub fn ancestors(&self, code: &str) -> Result<Vec<&AdminNode>> {
        let mut chain = Vec::new();
        let mut current = self.get(code)?;
        while let Some(parent) = current.parent.as_deref() {
            current = self.get(parent)?;
            chain.push(current);
        }
        chain.reverse();
        Ok(chain)
    }

    /// Returns how deep an admin is nested (0 for a root admin).
    pub fn depth(&self, code: &str) -> Result<usize> {
        Ok(self.ancestors(code)?.len())
    }

    /// Returns the name of the admin's id parameter.
    pub fn id_parameter(&self, code: &str) -> Result<String> {
        Ok(id_parameter(self.depth(code)?))
    }

    /// Returns the id placeholder used in the admin's paths, e.g. `{id}`.
    pub fn router_id_parameter(&self, code: &str) -> Result<String> {
        Ok(format!("{{{}}}", self.id_parameter(code)?))
    }

    /// Returns the code prefix of the admin's routes.
    ///
    /// Child admins chain onto their parent with `|`.
    pub fn base_code_route(&self, code: &str) -> Result<String> {
        let node = self.get(code)?;
        match node.parent.as_deref() {
            Some(parent) => Ok(format!("{}|{}", self.base_code_route(parent)?, node.code)),
            None => Ok(node.code.clone()),
        }
    }

    /// Returns the route name prefix of the admin.
    pub fn base_route_name(&self, code: &str) -> Result<String> {
        let node = self.get(code)?;
        match node.parent.as_deref() {
            Some(parent) => {
                let own = node
                    .base_route_name
                    .clone()
                    .unwrap_or_else(|| last_segment(&node.code).to_string());
                Ok(format!("{}_{own}", self.base_route_name(parent)?))
            }
            None => Ok(node
                .base_route_name
                .clone()
                .unwrap_or_else(|| node.code.replace('.', "_"))),
        }
    }

    /// Returns the path prefix of the admin.
    pub fn base_route_pattern(&self, code: &str) -> Result<String> {
        let node = self.get(code)?;
        let own = node
            .base_route_pattern
            .as_deref()
            .map(|p| p.trim_matches('/').to_string())
            .unwrap_or_else(|| last_segment(&node.code).to_string());
        match node.parent.as_deref() {
            Some(parent) => Ok(format!(
                "{}/{}/{own}",
                self.base_route_pattern(parent)?,
                self.router_id_parameter(parent)?
            )),
            None => Ok(format!("/{own}")),
        }
    }

    /// Builds the admin's routes, including those of its children.
    pub fn routes(&self, code: &str) -> Result<RouteCollection> {
        let node = self.get(code)?;
        let controller = node.controller.clone().unwrap_or_else(|| node.code.clone());
        let mut routes = RouteCollection::new(
            self.base_code_route(code)?,
            self.base_route_name(code)?,
            self.base_route_pattern(code)?,
            controller,
        )
        .with_default_routes(&self.router_id_parameter(code)?)?;

        if let Some(configure) = &node.configure_routes {
            configure(&mut routes)?;
        }
        for child in &node.children {
            routes.add_collection(&self.routes(child)?);
        }
        Ok(routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> AdminPool {
        let mut pool = AdminPool::new();
        pool.register(AdminNode::new("admin.post", "Posts")).unwrap();
        pool.register(AdminNode::new("admin.comment", "Comments")).unwrap();
        pool.register(AdminNode::new("admin.vote", "Votes").base_route_pattern("/votes/"))
            .unwrap();
        pool.add_child("admin.post", "admin.comment").unwrap();
        pool.add_child("admin.comment", "admin.vote").unwrap();
        pool
    }

    #[test]
    fn test_id_parameters_by_depth() {
        assert_eq!(id_parameter(0), "id");
        assert_eq!(id_parameter(1), "childid");
        assert_eq!(id_parameter(2), "grandchildid");
        assert_eq!(id_parameter(3), "greatgrandchildid");
    }

    #[test]
    fn test_composition() {
        let pool = pool();
        assert_eq!(pool.base_code_route("admin.vote").unwrap(), "admin.post|admin.comment|admin.vote");
        assert_eq!(pool.base_route_name("admin.vote").unwrap(), "admin_post_comment_vote");
        assert_eq!(
            pool.base_route_pattern("admin.vote").unwrap(),
            "/post/{id}/comment/{childid}/votes"
        );
        assert_eq!(pool.router_id_parameter("admin.vote").unwrap(), "{grandchildid}");
    }

    #[test]
    fn test_parent_routes_include_children() {
        let pool = pool();
        let routes = pool.routes("admin.post").unwrap();
        assert_eq!(routes.len(), 21);

        let edit = routes.get("admin.post|admin.comment.edit").unwrap();
        assert_eq!(edit.name(), "admin_post_comment_edit");
        assert_eq!(edit.pattern(), "/post/{id}/comment/{childid}/edit");
        assert_eq!(edit.default_value("_admin"), Some("admin.post|admin.comment"));
    }

    #[test]
    fn test_invalid_children() {
        let mut pool = pool();
        assert!(matches!(
            pool.add_child("admin.vote", "admin.post"),
            Err(RoutingError::InvalidChild { .. })
        ));
        assert!(matches!(
            pool.add_child("admin.post", "admin.vote"),
            Err(RoutingError::InvalidChild { .. })
        ));
        assert!(matches!(
            pool.add_child("admin.post", "admin.missing"),
            Err(RoutingError::AdminNotFound(_))
        ));
        assert!(matches!(
            pool.register(AdminNode::new("admin.post", "Again")),
            Err(RoutingError::DuplicateAdmin(_))
        ));
    }

    #[test]
    fn test_configure_routes() {
        let mut pool = AdminPool::new();
        pool.register(
            AdminNode::new("admin.user", "Users").configure_routes(|routes| {
                routes.remove("delete");
                routes.add("impersonate", Some("{id}/impersonate"))?;
                Ok(())
            }),
        )
        .unwrap();

        let routes = pool.routes("admin.user").unwrap();
        assert!(!routes.has("delete"));
        assert_eq!(
            routes.get("impersonate").unwrap().pattern(),
            "/user/{id}/impersonate"
        );
    }
}
