//! Script-visible projections of requests and responses.
//!
//! A facade is built fresh for every pass and only records what the script assigned.
//! Applying it back writes the assigned fields and leaves everything else byte for
//! byte as it was.

use axum::{
    body::{Body, Bytes},
    http::{
        header::{self, HeaderName},
        request::Parts,
        uri::PathAndQuery,
        HeaderMap, HeaderValue, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

use crate::server::{
    routing::ResolvedRoute,
    service::http_client::{RequestBody, RequestConfig},
    util::cookie::parse_cookies,
};

const CONTENT_TYPE_JSON: &str = "application/json";
const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// Encoding the request body arrived in, reused when it is written back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyKind {
    #[default]
    Json,
    Form,
}

/// Keeps the first value of every query key.
fn first_values<'a, I>(pairs: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (Cow<'a, str>, Cow<'a, str>)>,
{
    let mut query = BTreeMap::new();
    for (key, value) in pairs {
        query
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    query
}

fn encode_query(query: &BTreeMap<String, String>) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query)
        .finish()
}

/// Decodes a JSON object body, anything else yields an empty map.
fn decode_json(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(value) => value.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Request as seen by `req` in a script.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestFacade {
    pub uri: String,
    pub cookies: HashMap<String, String>,
    pub ip: String,
    pub params: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub body: Map<String, Value>,
    #[serde(skip)]
    pub modified_query: bool,
    #[serde(skip)]
    pub modified_params: bool,
    #[serde(skip)]
    pub modified_body: bool,
    #[serde(skip)]
    pub body_kind: BodyKind,
}

impl RequestFacade {
    /// Builds the facade of an inbound request.
    ///
    /// # Arguments
    /// - `parts` - Request head
    /// - `route` - Resolved route carrying the decoded params
    /// - `ip` - Resolved client IP
    /// - `body` - Buffered request body, decoded as a JSON object when possible
    pub fn from_server(parts: &Parts, route: &ResolvedRoute, ip: &str, body: &[u8]) -> Self {
        let query = parts
            .uri
            .query()
            .map(|query| first_values(url::form_urlencoded::parse(query.as_bytes())))
            .unwrap_or_default();

        Self {
            uri: parts
                .uri
                .path_and_query()
                .map(PathAndQuery::to_string)
                .unwrap_or_else(|| parts.uri.path().to_string()),
            cookies: parse_cookies(&parts.headers),
            ip: ip.to_string(),
            params: route.params.clone(),
            query,
            body: decode_json(body),
            body_kind: BodyKind::Json,
            ..Default::default()
        }
    }

    /// Builds the facade of an outbound request.
    pub fn from_client(config: &RequestConfig) -> Self {
        let (body, body_kind) = match &config.body {
            RequestBody::Empty => (Map::new(), BodyKind::Json),
            RequestBody::Json(Value::Object(map)) => (map.clone(), BodyKind::Json),
            RequestBody::Json(_) => (Map::new(), BodyKind::Json),
            RequestBody::Form(pairs) => {
                let mut map = Map::new();
                for (key, value) in pairs {
                    if !map.contains_key(key) {
                        map.insert(key.clone(), Value::String(value.clone()));
                    }
                }
                (map, BodyKind::Form)
            }
        };

        Self {
            uri: config.uri(),
            params: config.params.clone(),
            query: first_values(
                config
                    .query
                    .iter()
                    .map(|(k, v)| (Cow::Borrowed(k.as_str()), Cow::Borrowed(v.as_str()))),
            ),
            body,
            body_kind,
            ..Default::default()
        }
    }

    pub fn set_query(&mut self, query: BTreeMap<String, String>) {
        self.query = query;
        self.modified_query = true;
    }

    pub fn set_params(&mut self, params: BTreeMap<String, String>) {
        self.params = params;
        self.modified_params = true;
    }

    pub fn set_body(&mut self, body: Map<String, Value>) {
        self.body = body;
        self.modified_body = true;
    }

    fn encode_body(&self) -> (Bytes, &'static str) {
        match self.body_kind {
            BodyKind::Json => (
                Bytes::from(Value::Object(self.body.clone()).to_string()),
                CONTENT_TYPE_JSON,
            ),
            BodyKind::Form => {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(self.body.iter().map(|(k, v)| (k, value_to_string(v))))
                    .finish();
                (Bytes::from(encoded), CONTENT_TYPE_FORM)
            }
        }
    }

    /// Writes modified fields back into an inbound request.
    ///
    /// Modified params are rendered into the route template and modified query is
    /// re-encoded; the inner router then routes the rewritten URI. A template that can no
    /// longer be rendered leaves the path untouched.
    pub fn apply_to_server(&self, parts: &mut Parts, route: &mut ResolvedRoute, body: &mut Bytes) {
        if self.modified_params || self.modified_query {
            let path = if self.modified_params {
                match route.render(&self.params) {
                    Some(path) => {
                        route.params = self.params.clone();
                        path
                    }
                    None => {
                        warn!(route = %route.route, "Modified params do not fill the route template");
                        parts.uri.path().to_string()
                    }
                }
            } else {
                parts.uri.path().to_string()
            };

            let query = if self.modified_query {
                Some(encode_query(&self.query))
            } else {
                parts.uri.query().map(str::to_string)
            };

            let path_and_query = match query.filter(|query| !query.is_empty()) {
                Some(query) => format!("{}?{}", path, query),
                None => path,
            };

            match rebuild_uri(&parts.uri, &path_and_query) {
                Some(uri) => parts.uri = uri,
                None => warn!(uri = %path_and_query, "Modified request URI is invalid"),
            }
        }

        if self.modified_body {
            let (encoded, content_type) = self.encode_body();
            parts
                .headers
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
            parts.headers.insert(
                header::CONTENT_LENGTH,
                HeaderValue::from(encoded.len()),
            );
            *body = encoded;
        }
    }

    /// Writes modified fields back into an outbound request config.
    pub fn apply_to_client(&self, config: &mut RequestConfig) {
        if self.modified_query {
            config.query = self
                .query
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
        }
        if self.modified_params {
            config.params = self.params.clone();
        }
        if self.modified_body {
            config.body = match self.body_kind {
                BodyKind::Json => RequestBody::Json(Value::Object(self.body.clone())),
                BodyKind::Form => RequestBody::Form(
                    self.body
                        .iter()
                        .map(|(k, v)| (k.clone(), value_to_string(v)))
                        .collect(),
                ),
            };
        }
    }
}

fn rebuild_uri(uri: &Uri, path_and_query: &str) -> Option<Uri> {
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);
    Uri::from_parts(parts).ok()
}

/// Response as seen by `resp` in a script. A `status` of `0` means unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseFacade {
    pub status: i64,
    pub header: BTreeMap<String, String>,
    pub body: Map<String, Value>,
    #[serde(skip)]
    pub modified_status: bool,
    #[serde(skip)]
    pub modified_header: bool,
    #[serde(skip)]
    pub modified_body: bool,
}

impl ResponseFacade {
    /// Builds the facade of a produced response.
    pub fn from_response(status: u16, headers: &HeaderMap, body: &[u8]) -> Self {
        let mut header = BTreeMap::new();
        for (name, value) in headers {
            if let Ok(value) = value.to_str() {
                header
                    .entry(name.as_str().to_string())
                    .or_insert_with(|| value.to_string());
            }
        }

        Self {
            status: i64::from(status),
            header,
            body: decode_json(body),
            ..Default::default()
        }
    }

    pub fn set_status(&mut self, status: i64) {
        self.status = status;
        self.modified_status = true;
    }

    pub fn set_header(&mut self, header: BTreeMap<String, String>) {
        self.header = header;
        self.modified_header = true;
    }

    pub fn set_body(&mut self, body: Map<String, Value>) {
        self.body = body;
        self.modified_body = true;
    }

    /// Whether a "before" script answered the request itself.
    pub fn is_short_circuit(&self) -> bool {
        self.status != 0
    }

    fn status_code(&self) -> StatusCode {
        u16::try_from(self.status)
            .ok()
            .and_then(|status| StatusCode::from_u16(status).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn write_headers(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.header {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!(header = %name, "Invalid header set by script"),
            }
        }
    }

    /// Status, headers and body the facade describes, for short-circuited calls.
    pub fn to_parts(&self) -> (StatusCode, HeaderMap, Bytes) {
        let mut headers = HeaderMap::new();
        let body = if self.body.is_empty() {
            Bytes::new()
        } else {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
            Bytes::from(Value::Object(self.body.clone()).to_string())
        };
        self.write_headers(&mut headers);

        (self.status_code(), headers, body)
    }

    /// Builds a complete response from the facade, for short-circuited requests.
    pub fn to_response(&self) -> Response {
        let (status, headers, body) = self.to_parts();
        (status, headers, Body::from(body)).into_response()
    }

    /// Writes modified fields back into a produced response.
    ///
    /// An assigned `header` map replaces the response headers: names the script left
    /// out are removed.
    pub fn apply(&self, status: &mut StatusCode, headers: &mut HeaderMap, body: &mut Bytes) {
        if self.modified_status {
            *status = self.status_code();
        }
        if self.modified_header {
            let dropped: Vec<HeaderName> = headers
                .keys()
                .filter(|name| {
                    !self
                        .header
                        .keys()
                        .any(|kept| kept.eq_ignore_ascii_case(name.as_str()))
                })
                .cloned()
                .collect();
            for name in dropped {
                headers.remove(name);
            }
            self.write_headers(headers);
        }
        if self.modified_body {
            let encoded = Bytes::from(Value::Object(self.body.clone()).to_string());
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(encoded.len()));
            *body = encoded;
        }
    }
}
