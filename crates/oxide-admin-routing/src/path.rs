//! Route path patterns.

use std::collections::{BTreeMap, HashMap};

use regex::Regex;

use crate::error::{Result, RoutingError};

/// Percent-encodes everything but unreserved characters, and `/` when
/// `keep_slash` is set.
pub(crate) fn encode(s: &str, keep_slash: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(byte));
            }
            b'/' if keep_slash => out.push('/'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn hex_digit(byte: u8) -> Option<u8> {
    char::from(byte)
        .to_digit(16)
        .and_then(|d| u8::try_from(d).ok())
}

/// Reverses [`encode`]; malformed escapes are kept as written.
pub(crate) fn decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push(hi * 16 + lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// One `/`-separated piece of a route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Fixed text.
    Literal(String),
    /// A placeholder such as `{childid}`.
    Param(String),
    /// A trailing `{*name}` placeholder taking the rest of the path.
    Wildcard(String),
}

/// A compiled route path such as `/post/{id}/comment/list`.
#[derive(Debug, Clone)]
pub struct PathPattern {
    pattern: String,
    segments: Vec<PathSegment>,
    regex: Regex,
    requirements: HashMap<String, (String, Regex)>,
    param_names: Vec<String>,
}

impl PathPattern {
    /// Compiles a path pattern.
    ///
    /// Pattern syntax:
    /// - `/post/list` - Literal path
    /// - `/post/{id}/edit` - Path with parameter
    /// - `/files/{*path}` - Wildcard parameter (matches rest of path)
    ///
    /// # Example
    ///
    /// ```
    /// use oxide_admin_routing::PathPattern;
    ///
    /// let pattern = PathPattern::new("/post/{id}/comment/{childid}/edit").unwrap();
    /// let params = pattern.match_path("/post/3/comment/14/edit").unwrap();
    /// assert_eq!(params.get("id").map(String::as_str), Some("3"));
    /// assert_eq!(params.get("childid").map(String::as_str), Some("14"));
    /// ```
    pub fn new(pattern: &str) -> Result<Self> {
        Self::with_requirements(pattern, &BTreeMap::new())
    }

    /// Compiles a path pattern whose parameters must match the given
    /// regular expressions.
    pub fn with_requirements(pattern: &str, requirements: &BTreeMap<String, String>) -> Result<Self> {
        let mut segments = Vec::new();
        let mut param_names = Vec::new();
        let mut compiled = HashMap::new();
        let mut regex_str = String::from("^");

        for part in pattern.split('/').filter(|s| !s.is_empty()) {
            regex_str.push('/');

            if let Some(param) = part.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                let (name, default) = match param.strip_prefix('*') {
                    Some(name) => (name, "(.+)"),
                    None => (param, "([^/]+)"),
                };
                if name.is_empty() || param_names.iter().any(|n| n == name) {
                    return Err(RoutingError::InvalidPattern(format!(
                        "{pattern}: bad or repeated parameter `{name}`"
                    )));
                }
                match requirements.get(name) {
                    Some(requirement) => {
                        regex_str.push_str(&format!("({requirement})"));
                        let anchored = Regex::new(&format!("^(?:{requirement})$"))
                            .map_err(|e| RoutingError::InvalidPattern(e.to_string()))?;
                        compiled.insert(name.to_string(), (requirement.clone(), anchored));
                    }
                    None => regex_str.push_str(default),
                }
                segments.push(if param.starts_with('*') {
                    PathSegment::Wildcard(name.to_string())
                } else {
                    PathSegment::Param(name.to_string())
                });
                param_names.push(name.to_string());
            } else {
                segments.push(PathSegment::Literal(part.to_string()));
                regex_str.push_str(&regex::escape(part));
            }
        }

        regex_str.push_str("/?$");

        let regex =
            Regex::new(&regex_str).map_err(|e| RoutingError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            regex,
            requirements: compiled,
            param_names,
        })
    }

    /// Matches a request path.
    ///
    /// Returns the placeholder values on success.
    pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        if !self.regex.is_match(path) {
            return None;
        }

        // Requirements may contain their own groups, so capture positions
        // are unreliable; re-split instead.
        let mut params = HashMap::new();
        let mut parts = path.trim_matches('/').split('/');
        for segment in &self.segments {
            match segment {
                PathSegment::Literal(_) => {
                    parts.next();
                }
                PathSegment::Param(name) => {
                    params.insert(name.clone(), decode(parts.next()?));
                }
                PathSegment::Wildcard(name) => {
                    let rest: Vec<&str> = parts.by_ref().collect();
                    params.insert(name.clone(), decode(&rest.join("/")));
                }
            }
        }

        Some(params)
    }

    /// Returns the pattern as written.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns placeholder names in path order.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Returns the parsed segments.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Renders the path with placeholders filled in.
    ///
    /// `route` only names the route in errors.
    pub fn reverse(&self, route: &str, params: &BTreeMap<String, String>) -> Result<String> {
        let mut path = String::new();

        for segment in &self.segments {
            path.push('/');
            match segment {
                PathSegment::Literal(s) => path.push_str(s),
                PathSegment::Param(name) | PathSegment::Wildcard(name) => {
                    let value = params.get(name).ok_or_else(|| RoutingError::MissingParameter {
                        route: route.to_string(),
                        name: name.clone(),
                    })?;
                    if let Some((requirement, regex)) = self.requirements.get(name) {
                        if !regex.is_match(value) {
                            return Err(RoutingError::InvalidParameter {
                                route: route.to_string(),
                                name: name.clone(),
                                requirement: requirement.clone(),
                                value: value.clone(),
                            });
                        }
                    }
                    let keep_slash = matches!(segment, PathSegment::Wildcard(_));
                    path.push_str(&encode(value, keep_slash));
                }
            }
        }

        if path.is_empty() {
            path.push('/');
        }

        Ok(path)
    }
}
