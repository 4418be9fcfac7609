//! Routes and the per-admin route collection.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;
use crate::path::PathPattern;

/// Default key naming the controller action.
pub const CONTROLLER: &str = "_controller";
/// Default key naming the admin that owns the route.
pub const ADMIN: &str = "_admin";
/// Default key holding the route name.
pub const NAME: &str = "_name";

/// A named route with its path, defaults and parameter requirements.
#[derive(Debug, Clone)]
pub struct Route {
    name: String,
    path: PathPattern,
    defaults: BTreeMap<String, String>,
    requirements: BTreeMap<String, String>,
}

impl Route {
    /// Creates a route.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            path: PathPattern::new(pattern)?,
            defaults: BTreeMap::new(),
            requirements: BTreeMap::new(),
        })
    }

    /// Returns the route name, e.g. `admin_post_edit`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the compiled path.
    pub fn path(&self) -> &PathPattern {
        &self.path
    }

    /// Returns the path pattern string.
    pub fn pattern(&self) -> &str {
        self.path.pattern()
    }

    /// Returns a default value.
    pub fn default_value(&self, key: &str) -> Option<&str> {
        self.defaults.get(key).map(String::as_str)
    }

    /// Returns all defaults.
    pub fn defaults(&self) -> &BTreeMap<String, String> {
        &self.defaults
    }

    /// Sets a default value.
    pub fn set_default(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    /// Returns the parameter requirements.
    pub fn requirements(&self) -> &BTreeMap<String, String> {
        &self.requirements
    }

    /// Requires a path parameter to match `regex`.
    pub fn set_requirement(&mut self, param: impl Into<String>, regex: impl Into<String>) -> Result<&mut Self> {
        self.requirements.insert(param.into(), regex.into());
        self.path = PathPattern::with_requirements(self.path.pattern(), &self.requirements)?;
        Ok(self)
    }

    /// Renders the path for `params`.
    pub fn generate(&self, params: &BTreeMap<String, String>) -> Result<String> {
        self.path.reverse(&self.name, params)
    }
}

/// Summary of a route for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    /// Route code.
    pub code: String,
    /// Route name.
    pub name: String,
    /// Path pattern.
    pub pattern: String,
}

/// Turns `batch_delete` or `admin.post.batch_delete` into `batchDelete`.
fn camelize(name: &str) -> String {
    let action = name.rsplit('.').next().unwrap_or(name);
    let mut out = String::with_capacity(action.len());
    let mut upper = false;
    for c in action.chars() {
        if c == '_' || c == '-' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// The routes of one admin, keyed by route code.
///
/// Names passed to the collection are short action names (`edit`) or full
/// codes (`admin.post.edit`); both resolve to the same code.
///
/// # Example
///
/// ```
/// use oxide_admin_routing::RouteCollection;
///
/// let mut routes = RouteCollection::new("admin.post", "admin_post", "/post", "PostAdmin");
/// routes.add("edit", Some("{id}/edit")).unwrap();
///
/// let edit = routes.get("edit").unwrap();
/// assert_eq!(edit.name(), "admin_post_edit");
/// assert_eq!(edit.pattern(), "/post/{id}/edit");
/// assert_eq!(edit.default_value("_controller"), Some("PostAdmin:edit"));
/// assert!(routes.has("admin.post.edit"));
/// ```
#[derive(Debug, Clone)]
pub struct RouteCollection {
    base_code_route: String,
    base_route_name: String,
    base_route_pattern: String,
    base_controller_name: String,
    elements: Vec<(String, Route)>,
}

impl RouteCollection {
    /// Creates an empty collection.
    pub fn new(
        base_code_route: impl Into<String>,
        base_route_name: impl Into<String>,
        base_route_pattern: impl Into<String>,
        base_controller_name: impl Into<String>,
    ) -> Self {
        Self {
            base_code_route: base_code_route.into(),
            base_route_name: base_route_name.into(),
            base_route_pattern: base_route_pattern.into(),
            base_controller_name: base_controller_name.into(),
            elements: Vec::new(),
        }
    }

    /// Returns the code prefix of every route.
    pub fn base_code_route(&self) -> &str {
        &self.base_code_route
    }

    /// Returns the route name prefix.
    pub fn base_route_name(&self) -> &str {
        &self.base_route_name
    }

    /// Returns the path prefix.
    pub fn base_route_pattern(&self) -> &str {
        &self.base_route_pattern
    }

    /// Returns the controller every route defaults to.
    pub fn base_controller_name(&self) -> &str {
        &self.base_controller_name
    }

    /// Resolves a name to a route code.
    ///
    /// Names containing a dot are already codes.
    pub fn code(&self, name: &str) -> String {
        if name.contains('.') {
            name.to_string()
        } else {
            format!("{}.{name}", self.base_code_route)
        }
    }

    /// Adds (or replaces) the route `name` under `base pattern / pattern`.
    ///
    /// The pattern defaults to the name itself.
    pub fn add(&mut self, name: &str, pattern: Option<&str>) -> Result<&mut Route> {
        let suffix = pattern.unwrap_or(name).trim_start_matches('/');
        let pattern = format!("{}/{suffix}", self.base_route_pattern.trim_end_matches('/'));
        let code = self.code(name);
        let route_name = format!("{}_{name}", self.base_route_name);

        let mut route = Route::new(route_name.as_str(), &pattern)?;
        route
            .set_default(
                CONTROLLER,
                format!("{}:{}", self.base_controller_name, camelize(name)),
            )
            .set_default(ADMIN, self.base_code_route.as_str())
            .set_default(NAME, route_name);

        Ok(self.insert(code, route))
    }

    fn insert(&mut self, code: String, route: Route) -> &mut Route {
        let index = match self.elements.iter().position(|(c, _)| *c == code) {
            Some(index) => {
                self.elements[index].1 = route;
                index
            }
            None => {
                self.elements.push((code, route));
                self.elements.len() - 1
            }
        };
        &mut self.elements[index].1
    }

    /// Adds the standard CRUD routes.
    ///
    /// `id_parameter` is the placeholder for the object id, e.g. `{id}`.
    pub fn with_default_routes(mut self, id_parameter: &str) -> Result<Self> {
        self.add("list", None)?;
        self.add("create", None)?;
        self.add("batch", None)?;
        self.add("edit", Some(&format!("{id_parameter}/edit")))?;
        self.add("delete", Some(&format!("{id_parameter}/delete")))?;
        self.add("show", Some(&format!("{id_parameter}/show")))?;
        self.add("export", None)?;
        Ok(self)
    }

    /// Copies every route of `other` into this collection, keeping codes.
    pub fn add_collection(&mut self, other: &RouteCollection) {
        for (code, route) in &other.elements {
            self.insert(code.clone(), route.clone());
        }
    }

    /// Returns true if the route is present.
    pub fn has(&self, name: &str) -> bool {
        let code = self.code(name);
        self.elements.iter().any(|(c, _)| *c == code)
    }

    /// Returns a route by name or code.
    pub fn get(&self, name: &str) -> Option<&Route> {
        let code = self.code(name);
        self.elements
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, route)| route)
    }

    /// Returns a route mutably by name or code.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Route> {
        let code = self.code(name);
        self.elements
            .iter_mut()
            .find(|(c, _)| *c == code)
            .map(|(_, route)| route)
    }

    /// Removes a route by name or code.
    pub fn remove(&mut self, name: &str) -> Option<Route> {
        let code = self.code(name);
        let index = self.elements.iter().position(|(c, _)| *c == code)?;
        Some(self.elements.remove(index).1)
    }

    /// Removes every route.
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Removes every route except the named ones.
    pub fn clear_except(&mut self, names: &[&str]) {
        let keep: Vec<String> = names.iter().map(|name| self.code(name)).collect();
        self.elements.retain(|(code, _)| keep.contains(code));
    }

    /// Iterates over `(code, route)` pairs in insertion order.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &Route)> {
        self.elements.iter().map(|(code, route)| (code.as_str(), route))
    }

    /// Returns a listing of every route.
    pub fn infos(&self) -> Vec<RouteInfo> {
        self.routes()
            .map(|(code, route)| RouteInfo {
                code: code.to_string(),
                name: route.name().to_string(),
                pattern: route.pattern().to_string(),
            })
            .collect()
    }

    /// Returns the number of routes.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true when the collection holds no route.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection() -> RouteCollection {
        RouteCollection::new("admin.post", "admin_post", "/post", "PostAdmin")
    }

    #[test]
    fn test_code_resolution() {
        let routes = collection();
        assert_eq!(routes.code("edit"), "admin.post.edit");
        assert_eq!(routes.code("admin.comment.list"), "admin.comment.list");
    }

    #[test]
    fn test_add_defaults() {
        let mut routes = collection();
        let route = routes.add("batch_delete", None).unwrap();
        assert_eq!(route.pattern(), "/post/batch_delete");
        assert_eq!(route.default_value(CONTROLLER), Some("PostAdmin:batchDelete"));
        assert_eq!(route.default_value(ADMIN), Some("admin.post"));
        assert_eq!(route.default_value(NAME), Some("admin_post_batch_delete"));
    }

    #[test]
    fn test_readding_replaces_in_place() {
        let mut routes = collection().with_default_routes("{id}").unwrap();
        assert_eq!(routes.len(), 7);
        routes.add("edit", Some("{id}/modify")).unwrap();
        assert_eq!(routes.len(), 7);
        assert_eq!(routes.get("edit").unwrap().pattern(), "/post/{id}/modify");

        let codes: Vec<&str> = routes.routes().map(|(code, _)| code).collect();
        assert_eq!(codes[3], "admin.post.edit");
    }

    #[test]
    fn test_remove_and_clear_except() {
        let mut routes = collection().with_default_routes("{id}").unwrap();
        assert!(routes.remove("export").is_some());
        assert!(!routes.has("export"));

        routes.clear_except(&["list", "admin.post.show"]);
        let names: Vec<String> = routes.infos().into_iter().map(|i| i.name).collect();
        assert_eq!(names, ["admin_post_list", "admin_post_show"]);

        routes.clear();
        assert!(routes.is_empty());
    }

    #[test]
    fn test_requirement_applies_to_generation() {
        let mut routes = collection();
        routes
            .add("show", Some("{id}/show"))
            .unwrap()
            .set_requirement("id", r"\d+")
            .unwrap();

        let route = routes.get("show").unwrap();
        let params = BTreeMap::from([("id".to_string(), "5".to_string())]);
        assert_eq!(route.generate(&params).unwrap(), "/post/5/show");

        let params = BTreeMap::from([("id".to_string(), "five".to_string())]);
        assert!(route.generate(&params).is_err());
    }

    #[test]
    fn test_camelize() {
        assert_eq!(camelize("list"), "list");
        assert_eq!(camelize("admin.post.batch_delete"), "batchDelete");
        assert_eq!(camelize("_private"), "private");
    }
}
