#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use oxide_admin_routing::{AdminNode, AdminPool, Parameters, RouteGenerator};

/// Posts with comments nested under them and votes under comments, plus a
/// standalone tag admin.
pub fn pool() -> AdminPool {
    let mut pool = AdminPool::new();
    pool.register(AdminNode::new("admin.post", "Posts").controller("PostAdmin"))
        .unwrap();
    pool.register(AdminNode::new("admin.comment", "Comments").persistent_parameter("context", "blog"))
        .unwrap();
    pool.register(AdminNode::new("admin.vote", "Votes")).unwrap();
    pool.register(
        AdminNode::new("app.admin.tag", "Tags")
            .base_route_name("tags")
            .base_route_pattern("/tags")
            .configure_routes(|routes| {
                routes.clear_except(&["list", "create"]);
                routes.add("merge", Some("merge/{source}/{target}"))?;
                Ok(())
            }),
    )
    .unwrap();
    pool.add_child("admin.post", "admin.comment").unwrap();
    pool.add_child("admin.comment", "admin.vote").unwrap();
    pool
}

pub fn generator() -> RouteGenerator {
    RouteGenerator::new(Arc::new(pool()))
}

pub fn params(pairs: &[(&str, &str)]) -> Parameters {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

pub fn subjects(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}
