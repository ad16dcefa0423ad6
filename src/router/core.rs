use crate::routes::RouteMeta;
use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Maximum number of path/query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>` because path parameter names come from the
/// route table and are shared by every match.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of successfully matching a request path to a route
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route metadata
    pub route: Arc<RouteMeta>,
    /// Path parameters extracted from the URL (e.g., `{person_id}` → `"3"`)
    pub path_params: ParamVec,
    /// Name of the handler that should process this request
    pub handler_name: String,
    /// Query string parameters (populated by the server)
    pub query_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics if a name repeats in the pattern.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name (`?age=1&age=2` yields `"2"`)
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Note: This allocates - use get_path_param() in hot paths instead
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    method: Method,
    regex: Regex,
    meta: Arc<RouteMeta>,
    param_names: Vec<Arc<str>>,
}

/// Router that matches HTTP requests to handlers
///
/// Routes are tested in table order; the first pattern that matches both
/// method and path wins. With a handful of routes a linear scan over
/// anchored regexes is plenty.
#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<CompiledRoute>,
}

impl Router {
    /// Create a new router from route metadata
    #[must_use]
    pub fn new(routes: Vec<RouteMeta>) -> Self {
        let routes: Vec<CompiledRoute> = routes
            .into_iter()
            .map(|route| {
                let (regex, param_names) = Self::path_to_regex(&route.path_pattern);
                CompiledRoute {
                    method: route.method.clone(),
                    regex,
                    meta: Arc::new(route),
                    param_names: param_names.into_iter().map(Arc::from).collect(),
                }
            })
            .collect();

        let routes_summary: Vec<String> = routes
            .iter()
            .take(10)
            .map(|r| format!("{} {}", r.method, r.meta.path_pattern))
            .collect();

        info!(
            routes_count = routes.len(),
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );

        Self { routes }
    }

    /// Route metadata in table order.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<RouteMeta>> {
        self.routes.iter().map(|r| &r.meta)
    }

    /// Render all registered routes, one per line.
    #[must_use]
    pub fn dump_routes(&self) -> String {
        let mut out = String::new();
        for r in &self.routes {
            out.push_str(&format!(
                "{:<7} {:<28} -> {}\n",
                r.method.as_str(),
                r.meta.path_pattern,
                r.meta.handler_name
            ));
        }
        out
    }

    /// Match an HTTP request to a route
    ///
    /// # Returns
    ///
    /// * `Some(RouteMatch)` - If a matching route is found
    /// * `None` - If no route matches; see [`Router::allowed_methods`] to
    ///   tell a 404 from a 405
    #[must_use]
    pub fn route(&self, method: Method, path: &str) -> Option<RouteMatch> {
        debug!(method = %method, path = %path, "Route match attempt");

        let match_start = std::time::Instant::now();

        for r in self.routes.iter().filter(|r| r.method == method) {
            let Some(caps) = r.regex.captures(path) else {
                continue;
            };
            let mut params = ParamVec::new();
            for (i, name) in r.param_names.iter().enumerate() {
                if let Some(m) = caps.get(i + 1) {
                    params.push((Arc::clone(name), percent_decode(m.as_str())));
                }
            }

            info!(
                method = %method,
                path = %path,
                handler_name = %r.meta.handler_name,
                route_pattern = %r.meta.path_pattern,
                path_params = ?params,
                duration_us = match_start.elapsed().as_micros() as u64,
                "Route matched"
            );

            return Some(RouteMatch {
                route: Arc::clone(&r.meta),
                path_params: params,
                handler_name: r.meta.handler_name.clone(),
                query_params: ParamVec::new(),
            });
        }

        warn!(
            method = %method,
            path = %path,
            duration_us = match_start.elapsed().as_micros() as u64,
            "No route matched"
        );

        None
    }

    /// Methods registered for a path, regardless of the request method.
    /// An empty result means the path is unknown (404); otherwise the
    /// request used the wrong method (405).
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        self.routes
            .iter()
            .filter(|r| r.regex.is_match(path))
            .map(|r| r.method.clone())
            .collect()
    }

    /// Convert a path pattern to a regex and extract parameter names
    ///
    /// `/person/{person_id}` becomes `^/person/([^/]+)$` with params
    /// `["person_id"]`.
    pub(crate) fn path_to_regex(path: &str) -> (Regex, Vec<String>) {
        let mut pattern = String::with_capacity(path.len() + 8);
        pattern.push('^');
        let mut param_names = Vec::with_capacity(path.matches('{').count());

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            pattern.push('/');
            if let Some(name) = segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
            {
                pattern.push_str("([^/]+)");
                param_names.push(name.to_string());
            } else {
                pattern.push_str(&regex::escape(segment));
            }
        }
        if path.ends_with('/') {
            pattern.push('/');
        }

        pattern.push('$');
        // Patterns are built from escaped literals and a fixed capture group.
        #[allow(clippy::expect_used)]
        let regex = Regex::new(&pattern).expect("route pattern compiles");

        (regex, param_names)
    }
}

/// Decode `%XX` escapes in a path segment; malformed escapes are kept verbatim.
fn percent_decode(segment: &str) -> String {
    if !segment.contains('%') {
        return segment.to_string();
    }
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(b) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
