//! Route code resolution and URL generation for admins.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace};

use crate::admin::AdminPool;
use crate::error::{Result, RoutingError};
use crate::path::encode;
use crate::route::{Route, ADMIN};

/// Route parameters, sorted so generated query strings are stable.
pub type Parameters = BTreeMap<String, String>;

/// Attributes of the request being handled, such as the ids matched from
/// its path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestAttributes {
    attributes: HashMap<String, String>,
}

impl RequestAttributes {
    /// Creates empty attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts an attribute.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Gets an attribute value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

impl From<HashMap<String, String>> for RequestAttributes {
    fn from(attributes: HashMap<String, String>) -> Self {
        Self { attributes }
    }
}

/// A route name with the parameters to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuUrl {
    /// Route name.
    pub route: String,
    /// Parameters for the route.
    pub route_parameters: Parameters,
}

/// Resolves admin route codes and renders URLs.
///
/// Routes are loaded per admin on first use and cached by code; a child
/// admin loads its ancestors first, since their collections hold its
/// routes.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use oxide_admin_routing::{AdminNode, AdminPool, Parameters, RequestAttributes, RouteGenerator};
///
/// let mut pool = AdminPool::new();
/// pool.register(AdminNode::new("admin.post", "Posts")).unwrap();
/// pool.register(AdminNode::new("admin.comment", "Comments")).unwrap();
/// pool.add_child("admin.post", "admin.comment").unwrap();
///
/// let mut generator = RouteGenerator::new(Arc::new(pool)).url_prefix("/admin");
/// let request = RequestAttributes::new().with("id", "3");
/// let params = Parameters::from([("id".to_string(), "14".to_string())]);
///
/// let url = generator.generate("admin.comment", "edit", params, Some(&request)).unwrap();
/// assert_eq!(url, "/admin/post/3/comment/14/edit");
/// ```
#[derive(Debug)]
pub struct RouteGenerator {
    pool: Arc<AdminPool>,
    url_prefix: String,
    cache: HashMap<String, Route>,
    // route code -> code of the admin the route belongs to
    owners: HashMap<String, String>,
    loaded: HashSet<String>,
}

impl RouteGenerator {
    /// Creates a generator over the given admins.
    pub fn new(pool: Arc<AdminPool>) -> Self {
        Self {
            pool,
            url_prefix: String::new(),
            cache: HashMap::new(),
            owners: HashMap::new(),
            loaded: HashSet::new(),
        }
    }

    /// Sets the prefix prepended to generated paths.
    #[must_use]
    pub fn url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns the admin pool.
    pub fn pool(&self) -> &Arc<AdminPool> {
        &self.pool
    }

    fn load_cache(&mut self, admin: &str) -> Result<()> {
        let parent = self.pool.get(admin)?.parent().map(str::to_string);
        if let Some(parent) = parent {
            self.load_cache(&parent)?;
        }
        if self.loaded.contains(admin) {
            return Ok(());
        }

        let routes = self.pool.routes(admin)?;
        debug!(admin, routes = routes.len(), "loading admin routes");
        for (code, route) in routes.routes() {
            let owner = route
                .default_value(ADMIN)
                .and_then(|base| base.rsplit('|').next())
                .unwrap_or(admin);
            self.owners.insert(code.to_string(), owner.to_string());
            self.cache.insert(code.to_string(), route.clone());
        }
        self.loaded.insert(admin.to_string());
        Ok(())
    }

    /// Resolves `name` to a route code for `admin`.
    ///
    /// - a root admin passing a code already in the cache gets it back
    /// - a name with a dot names a child admin's route and is chained with `|`
    /// - anything else is an action of the admin itself
    pub fn code(&mut self, admin: &str, name: &str) -> Result<String> {
        self.load_cache(admin)?;

        let node = self.pool.get(admin)?;
        if !node.is_child() && self.cache.contains_key(name) {
            return Ok(name.to_string());
        }

        let prefix = if node.is_child() {
            self.pool.base_code_route(admin)?
        } else {
            node.code().to_string()
        };
        let code = if name.contains('.') {
            format!("{prefix}|{name}")
        } else {
            format!("{prefix}.{name}")
        };
        trace!(admin, name, %code, "resolved route code");
        Ok(code)
    }

    /// Returns true if `admin` has a route for `name`.
    pub fn has_admin_route(&mut self, admin: &str, name: &str) -> Result<bool> {
        let code = self.code(admin, name)?;
        Ok(self.cache.contains_key(&code))
    }

    /// Returns the route `admin` uses for `name`.
    pub fn route(&mut self, admin: &str, name: &str) -> Result<&Route> {
        let code = self.code(admin, name)?;
        self.cache
            .get(&code)
            .ok_or(RoutingError::RouteNotFound(code))
    }

    /// Resolves the route name and parameters for an admin action.
    ///
    /// For a child admin, `id` is renamed to the admin's own id parameter
    /// and every ancestor id is copied from the request. Persistent
    /// parameters fill in keys the caller did not set.
    pub fn generate_menu_url(
        &mut self,
        admin: &str,
        name: &str,
        mut parameters: Parameters,
        request: Option<&RequestAttributes>,
    ) -> Result<MenuUrl> {
        let node = self.pool.get(admin)?;

        if node.is_child() {
            if let Some(id) = parameters.remove("id") {
                parameters.insert(self.pool.id_parameter(admin)?, id);
            }
            if let Some(request) = request {
                for ancestor in self.pool.ancestors(admin)? {
                    let key = self.pool.id_parameter(ancestor.code())?;
                    if let Some(value) = request.get(&key) {
                        parameters.insert(key, value.to_string());
                    }
                }
            }
        }

        for (key, value) in node.persistent_parameters() {
            parameters
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }

        let code = self.code(admin, name)?;
        let route = self
            .cache
            .get(&code)
            .ok_or_else(|| RoutingError::RouteNotFound(code.clone()))?;

        Ok(MenuUrl {
            route: route.name().to_string(),
            route_parameters: parameters,
        })
    }

    /// Renders the URL of an admin action.
    ///
    /// Parameters not used by the path become a sorted query string.
    pub fn generate(
        &mut self,
        admin: &str,
        name: &str,
        parameters: Parameters,
        request: Option<&RequestAttributes>,
    ) -> Result<String> {
        let menu = self.generate_menu_url(admin, name, parameters, request)?;
        let code = self.code(admin, name)?;
        let route = self
            .cache
            .get(&code)
            .ok_or(RoutingError::RouteNotFound(code))?;

        let path = route.generate(&menu.route_parameters)?;
        let query: Vec<String> = menu
            .route_parameters
            .iter()
            .filter(|(key, _)| !route.path().param_names().contains(key))
            .map(|(key, value)| format!("{}={}", encode(key, false), encode(value, false)))
            .collect();

        let mut url = format!("{}{path}", self.url_prefix);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        Ok(url)
    }

    /// Drops the cached routes of an admin and of the admins nested in it.
    pub fn invalidate(&mut self, admin: &str) {
        let mut dropped = vec![admin.to_string()];
        let mut index = 0;
        while let Some(code) = dropped.get(index).cloned() {
            if let Ok(node) = self.pool.get(&code) {
                dropped.extend(node.children().iter().cloned());
            }
            index += 1;
        }

        let stale: Vec<String> = self
            .owners
            .iter()
            .filter(|(_, owner)| dropped.contains(owner))
            .map(|(code, _)| code.clone())
            .collect();
        for code in &stale {
            self.owners.remove(code);
            self.cache.remove(code);
        }
        for code in &dropped {
            self.loaded.remove(code);
        }
        debug!(admin, routes = stale.len(), "invalidated admin routes");
    }

    /// Drops every cached route.
    pub fn clear(&mut self) {
        self.cache.clear();
        self.owners.clear();
        self.loaded.clear();
    }

    /// Returns the number of cached routes.
    pub fn cached_routes(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::AdminNode;

    fn generator() -> RouteGenerator {
        let mut pool = AdminPool::new();
        pool.register(AdminNode::new("admin.post", "Posts").persistent_parameter("locale", "en"))
            .unwrap();
        pool.register(AdminNode::new("admin.comment", "Comments")).unwrap();
        pool.register(AdminNode::new("admin.tag", "Tags")).unwrap();
        pool.add_child("admin.post", "admin.comment").unwrap();
        RouteGenerator::new(Arc::new(pool))
    }

    fn params(pairs: &[(&str, &str)]) -> Parameters {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_code_resolution() {
        let mut g = generator();
        assert_eq!(g.code("admin.post", "edit").unwrap(), "admin.post.edit");
        assert_eq!(g.code("admin.post", "admin.post.edit").unwrap(), "admin.post.edit");
        assert_eq!(
            g.code("admin.post", "admin.comment.list").unwrap(),
            "admin.post|admin.comment.list"
        );
        assert_eq!(
            g.code("admin.comment", "list").unwrap(),
            "admin.post|admin.comment.list"
        );
    }

    #[test]
    fn test_child_loads_parent_first() {
        let mut g = generator();
        assert!(g.has_admin_route("admin.comment", "edit").unwrap());
        assert_eq!(g.cached_routes(), 14);
        assert!(!g.has_admin_route("admin.comment", "publish").unwrap());
    }

    #[test]
    fn test_menu_url_for_child() {
        let mut g = generator();
        let request = RequestAttributes::new().with("id", "3");
        let menu = g
            .generate_menu_url("admin.comment", "edit", params(&[("id", "14")]), Some(&request))
            .unwrap();
        assert_eq!(menu.route, "admin_post_comment_edit");
        assert_eq!(menu.route_parameters, params(&[("childid", "14"), ("id", "3")]));
    }

    #[test]
    fn test_persistent_parameters_do_not_override() {
        let mut g = generator();
        let url = g
            .generate("admin.post", "list", params(&[("page", "2")]), None)
            .unwrap();
        assert_eq!(url, "/post/list?locale=en&page=2");

        let url = g
            .generate("admin.post", "list", params(&[("locale", "fr ca")]), None)
            .unwrap();
        assert_eq!(url, "/post/list?locale=fr%20ca");
    }

    #[test]
    fn test_unknown_route() {
        let mut g = generator();
        let err = g
            .generate_menu_url("admin.tag", "publish", Parameters::new(), None)
            .unwrap_err();
        assert!(matches!(err, RoutingError::RouteNotFound(code) if code == "admin.tag.publish"));
    }

    #[test]
    fn test_invalidate() {
        let mut g = generator();
        g.code("admin.comment", "list").unwrap();
        g.code("admin.tag", "list").unwrap();
        assert_eq!(g.cached_routes(), 21);

        g.invalidate("admin.post");
        assert_eq!(g.cached_routes(), 7);
        assert!(g.has_admin_route("admin.comment", "list").unwrap());
        assert_eq!(g.cached_routes(), 21);

        g.clear();
        assert_eq!(g.cached_routes(), 0);
    }

    #[test]
    fn test_invalidate_keeps_admins_sharing_a_code_prefix() {
        let mut pool = AdminPool::new();
        pool.register(AdminNode::new("admin.post", "Posts")).unwrap();
        pool.register(AdminNode::new("admin.post.tag", "Post tags")).unwrap();
        let mut g = RouteGenerator::new(Arc::new(pool));

        assert!(g.has_admin_route("admin.post", "list").unwrap());
        assert!(g.has_admin_route("admin.post.tag", "list").unwrap());
        assert_eq!(g.cached_routes(), 14);

        g.invalidate("admin.post");
        assert_eq!(g.cached_routes(), 7);
        assert!(g.has_admin_route("admin.post.tag", "list").unwrap());
        assert!(g.has_admin_route("admin.post", "list").unwrap());
        assert_eq!(g.cached_routes(), 14);
    }
}
