//! Breadcrumb trails for admin pages.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::generator::{Parameters, RequestAttributes, RouteGenerator};

/// One entry of a breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    /// Text shown for the entry.
    pub label: String,
    /// Link target; `None` for the current page.
    pub url: Option<String>,
}

impl Breadcrumb {
    fn link(label: impl Into<String>, url: String) -> Self {
        Self {
            label: label.into(),
            url: Some(url),
        }
    }

    fn text(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: None,
        }
    }
}

/// Turns an action name into a label: `batch_delete` becomes `Batch delete`.
fn humanize(action: &str) -> String {
    let words = action.replace('_', " ");
    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Builds breadcrumb trails.
#[derive(Debug, Clone)]
pub struct BreadcrumbsBuilder {
    dashboard_label: String,
    dashboard_url: String,
}

impl Default for BreadcrumbsBuilder {
    fn default() -> Self {
        Self {
            dashboard_label: "Dashboard".to_string(),
            dashboard_url: "/".to_string(),
        }
    }
}

impl BreadcrumbsBuilder {
    /// Creates a builder linking to `/` as the dashboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the dashboard entry.
    #[must_use]
    pub fn dashboard(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.dashboard_label = label.into();
        self.dashboard_url = url.into();
        self
    }

    /// Builds the trail for `action` on `admin`.
    ///
    /// Ancestors contribute their list page and the parent object being
    /// browsed, whose id is read from the request. `subjects` maps admin
    /// codes to the label of the object each one is showing.
    pub fn breadcrumbs(
        &self,
        generator: &mut RouteGenerator,
        admin: &str,
        action: &str,
        request: Option<&RequestAttributes>,
        subjects: &HashMap<String, String>,
    ) -> Result<Vec<Breadcrumb>> {
        let mut trail = vec![Breadcrumb::link(
            self.dashboard_label.as_str(),
            self.dashboard_url.clone(),
        )];

        let pool = Arc::clone(generator.pool());
        for ancestor in pool.ancestors(admin)? {
            let code = ancestor.code();
            let list = generator.generate(code, "list", Parameters::new(), request)?;
            trail.push(Breadcrumb::link(ancestor.label(), list));

            let key = pool.id_parameter(code)?;
            let id = request.and_then(|r| r.get(&key));
            if let (Some(label), Some(id)) = (subjects.get(code), id) {
                let params = Parameters::from([("id".to_string(), id.to_string())]);
                let edit = generator.generate(code, "edit", params, request)?;
                trail.push(Breadcrumb::link(label.as_str(), edit));
            }
        }

        let node = pool.get(admin)?;
        if action == "list" {
            trail.push(Breadcrumb::text(node.label()));
            return Ok(trail);
        }
        let list = generator.generate(admin, "list", Parameters::new(), request)?;
        trail.push(Breadcrumb::link(node.label(), list));

        let crumb = match subjects.get(admin) {
            Some(subject) if action != "create" => subject.clone(),
            _ => humanize(action),
        };
        trail.push(Breadcrumb::text(crumb));
        Ok(trail)
    }
}
