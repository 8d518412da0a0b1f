//! Route templates known ahead of axum routing.
//!
//! The guard middleware runs before the inner router, so it cannot rely on axum's
//! `MatchedPath`. Every API route is registered through [`ApiRouter`], which records
//! the `(method, template)` pair next to the axum route. The resulting [`RouteTable`]
//! resolves requests to their template and decoded params, feeds the concurrency
//! limiter, and renders paths back from modified params.

use axum::{
    handler::Handler,
    http::Method,
    routing::{delete, get, patch, post, MethodRouter},
    Router,
};
use percent_encoding::percent_decode_str;
use std::collections::BTreeMap;
use url::Url;

/// Routing key of a server route: `METHOD ROUTE`.
pub fn route_key(method: &str, route: &str) -> String {
    format!("{} {}", method.trim().to_ascii_uppercase(), route.trim())
}

/// Routing key of an outbound call: `SERVICE METHOD ROUTE`.
pub fn client_key(service: &str, method: &str, route: &str) -> String {
    format!(
        "{} {} {}",
        service.trim(),
        method.trim().to_ascii_uppercase(),
        route.trim()
    )
}

/// Splits a `METHOD /route` string.
///
/// # Returns
/// - `Some((method, route))` - Upper-cased method and route template
/// - `None` - Either part is missing
pub fn parse_router(router: &str) -> Option<(String, String)> {
    let mut parts = router.split_whitespace();
    let method = parts.next()?;
    let route = parts.next()?;
    if parts.next().is_some() || !route.starts_with('/') {
        return None;
    }
    Some((method.to_ascii_uppercase(), route.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    Wildcard(String),
}

impl Segment {
    fn rank(&self) -> u8 {
        match self {
            Self::Static(_) => 2,
            Self::Param(_) => 1,
            Self::Wildcard(_) => 0,
        }
    }
}

fn parse_template(template: &str) -> Vec<Segment> {
    template
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            match segment
                .strip_prefix('{')
                .and_then(|inner| inner.strip_suffix('}'))
            {
                Some(inner) => match inner.strip_prefix('*') {
                    Some(name) => Segment::Wildcard(name.to_string()),
                    None => Segment::Param(inner.to_string()),
                },
                None => Segment::Static(segment.to_string()),
            }
        })
        .collect()
}

fn decode(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

#[derive(Debug, Clone)]
struct RouteEntry {
    method: Method,
    template: String,
    segments: Vec<Segment>,
}

impl RouteEntry {
    fn matches(&self, path: &[&str]) -> Option<BTreeMap<String, String>> {
        let mut params = BTreeMap::new();

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Static(value) => {
                    if path.get(index) != Some(&value.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = path.get(index)?;
                    params.insert(name.clone(), decode(value));
                }
                Segment::Wildcard(name) => {
                    let rest = path.get(index..).filter(|rest| !rest.is_empty())?;
                    let value = rest.iter().map(|s| decode(s)).collect::<Vec<_>>().join("/");
                    params.insert(name.clone(), value);
                    return Some(params);
                }
            }
        }

        (path.len() == self.segments.len()).then_some(params)
    }

    fn rank(&self) -> Vec<u8> {
        self.segments.iter().map(Segment::rank).collect()
    }
}

/// A request resolved to its route template, inserted as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub method: Method,
    /// Route template, e.g. `/configurations/v1/{id}`.
    pub route: String,
    /// Percent-decoded path params.
    pub params: BTreeMap<String, String>,
}

impl ResolvedRoute {
    /// Routing key used by the limiter, the mocks and the script registry.
    pub fn key(&self) -> String {
        route_key(self.method.as_str(), &self.route)
    }

    /// Renders the template with the given params. See [`render_template`].
    pub fn render(&self, params: &BTreeMap<String, String>) -> Option<String> {
        render_template(&self.route, params)
    }
}

/// Renders a route template with the given params, percent-encoding each segment.
///
/// # Returns
/// - `Some(String)` - Encoded request path
/// - `None` - A param named by the template is missing
pub fn render_template(template: &str, params: &BTreeMap<String, String>) -> Option<String> {
    let mut url = Url::parse("http://localhost/").ok()?;
    {
        let mut path = url.path_segments_mut().ok()?;
        path.clear();
        for segment in parse_template(template) {
            match segment {
                Segment::Static(value) => {
                    path.push(&value);
                }
                Segment::Param(name) => {
                    path.push(params.get(&name)?);
                }
                Segment::Wildcard(name) => {
                    path.extend(params.get(&name)?.split('/'));
                }
            }
        }
    }
    Some(url.path().to_string())
}

/// Method and template of every API route.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, method: Method, template: &str) {
        self.entries.push(RouteEntry {
            method,
            template: template.to_string(),
            segments: parse_template(template),
        });
    }

    /// Routing keys of every registered route.
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| route_key(entry.method.as_str(), &entry.template))
            .collect()
    }

    /// Resolves a request to its route template.
    ///
    /// Static segments take precedence over params, params over wildcards, the same
    /// way axum prioritises overlapping routes. A HEAD request without a HEAD route
    /// resolves to the GET route that axum answers it with.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<ResolvedRoute> {
        let trimmed = path.trim_start_matches('/');
        let segments: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').collect()
        };

        self.resolve_segments(method, &segments).or_else(|| {
            if *method == Method::HEAD {
                self.resolve_segments(&Method::GET, &segments)
            } else {
                None
            }
        })
    }

    fn resolve_segments(&self, method: &Method, segments: &[&str]) -> Option<ResolvedRoute> {
        self.entries
            .iter()
            .filter(|entry| entry.method == *method)
            .filter_map(|entry| entry.matches(segments).map(|params| (entry, params)))
            .max_by(|(a, _), (b, _)| a.rank().cmp(&b.rank()))
            .map(|(entry, params)| ResolvedRoute {
                method: entry.method.clone(),
                route: entry.template.clone(),
                params,
            })
    }
}

/// axum `Router` builder that records every route it registers.
pub struct ApiRouter<S> {
    router: Router<S>,
    table: RouteTable,
}

impl<S> ApiRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            table: RouteTable::new(),
        }
    }

    fn add(mut self, method: Method, path: &str, method_router: MethodRouter<S>) -> Self {
        self.table.add(method, path);
        self.router = self.router.route(path, method_router);
        self
    }

    pub fn get<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(Method::GET, path, get(handler))
    }

    pub fn post<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(Method::POST, path, post(handler))
    }

    pub fn patch<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(Method::PATCH, path, patch(handler))
    }

    pub fn delete<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(Method::DELETE, path, delete(handler))
    }

    /// Splits into the axum router and the recorded route table.
    pub fn into_parts(self) -> (Router<S>, RouteTable) {
        (self.router, self.table)
    }
}

impl<S> Default for ApiRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
