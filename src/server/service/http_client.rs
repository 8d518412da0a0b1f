//! Outbound HTTP client with script interception.
//!
//! Every call is described by a [`RequestConfig`] whose routing key
//! `SERVICE METHOD ROUTE` selects the client interceptor, if any. A "before" script
//! may rewrite the config or answer the call itself; an "after" script may rewrite the
//! upstream response.

use axum::{
    body::Bytes,
    http::{header, HeaderMap, Method, StatusCode},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::server::{
    dynamic::DynamicConfig,
    error::AppError,
    interceptor::facade::{RequestFacade, ResponseFacade},
    routing::{client_key, render_template},
};

/// Body of an outbound call.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    /// URL-encoded form pairs.
    Form(Vec<(String, String)>),
}

/// Description of one outbound call, relative to the service base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    pub service: String,
    pub method: Method,
    /// Route template, e.g. `/ip-locations/json/{ip}`.
    pub route: String,
    pub params: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl RequestConfig {
    pub fn new(service: &str, method: Method, route: &str) -> Self {
        Self {
            service: service.to_string(),
            method,
            route: route.to_string(),
            params: BTreeMap::new(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(pairs);
        self
    }

    /// Routing key of the call.
    pub fn key(&self) -> String {
        client_key(&self.service, self.method.as_str(), &self.route)
    }

    /// Path with the params filled in, `None` while a param is missing.
    pub fn path(&self) -> Option<String> {
        render_template(&self.route, &self.params)
    }

    /// Path and query as shown to scripts.
    pub fn uri(&self) -> String {
        let path = self.path().unwrap_or_else(|| self.route.clone());
        if self.query.is_empty() {
            return path;
        }

        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.query)
            .finish();
        format!("{}?{}", path, query)
    }
}

/// Buffered response of an outbound call.
#[derive(Debug, Clone)]
pub struct ClientResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ClientResponse {
    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            AppError::InternalError(format!("Failed to decode upstream response: {}", e))
        })
    }
}

/// HTTP client bound to one upstream service.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    service: String,
    base_url: String,
    dynamic: Arc<DynamicConfig>,
}

impl HttpClient {
    /// Creates a client for one upstream.
    ///
    /// # Arguments
    /// - `client` - Shared reqwest client
    /// - `service` - Service name, the first part of client routing keys
    /// - `base_url` - Base URL the request paths are appended to
    /// - `dynamic` - Runtime configuration holding the client interceptors
    pub fn new(
        client: reqwest::Client,
        service: &str,
        base_url: &str,
        dynamic: Arc<DynamicConfig>,
    ) -> Self {
        Self {
            client,
            service: service.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            dynamic,
        }
    }

    /// Starts a call description for this service.
    pub fn request(&self, method: Method, route: &str) -> RequestConfig {
        RequestConfig::new(&self.service, method, route)
    }

    /// Sends a call through the client interceptor of its routing key.
    ///
    /// Without an interceptor the call goes out unchanged. A "before" script that sets
    /// `resp.status` answers the call without contacting the upstream.
    ///
    /// # Returns
    /// - `Ok(ClientResponse)` - Upstream or script response, any status
    /// - `Err(AppError::ScriptErr(_))` - Interceptor script failed
    /// - `Err(AppError::ReqwestErr(_))` - Upstream unreachable
    pub async fn send(&self, mut config: RequestConfig) -> Result<ClientResponse, AppError> {
        let Some(descriptor) = self.dynamic.client_interceptors.lookup(&config.key()) else {
            return self.execute(&config).await;
        };

        let mut req = RequestFacade::from_client(&config);

        if let Some(script) = descriptor.before() {
            let mut resp = ResponseFacade::default();
            self.dynamic.engine.run(script, &mut req, &mut resp)?;

            if resp.is_short_circuit() {
                debug!(key = %descriptor.key, "Outbound call answered by interceptor");
                let (status, headers, body) = resp.to_parts();
                return Ok(ClientResponse {
                    status,
                    headers,
                    body,
                });
            }

            req.apply_to_client(&mut config);
        }

        let mut response = self.execute(&config).await?;

        if let Some(script) = descriptor.after() {
            let mut resp = ResponseFacade::from_response(
                response.status.as_u16(),
                &response.headers,
                &response.body,
            );
            self.dynamic.engine.run(script, &mut req, &mut resp)?;
            resp.apply(&mut response.status, &mut response.headers, &mut response.body);
        }

        Ok(response)
    }

    async fn execute(&self, config: &RequestConfig) -> Result<ClientResponse, AppError> {
        let path = config.path().ok_or_else(|| {
            AppError::InternalError(format!("Missing route params for {}", config.key()))
        })?;

        let mut request = self
            .client
            .request(config.method.clone(), format!("{}{}", self.base_url, path));
        if !config.query.is_empty() {
            request = request.query(&config.query);
        }
        request = match &config.body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(value.to_string()),
            RequestBody::Form(pairs) => request.form(pairs),
        };

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(ClientResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::interceptor::registry::ClientInterceptorConfig;
    use axum::{
        extract::{Path, Query},
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;

    const ROUTE: &str = "/ip-locations/json/{ip}";

    /// Starts an upstream echoing the path param and query, returns its base URL.
    async fn upstream() -> String {
        let app = Router::new().route(
            ROUTE,
            get(
                |Path(ip): Path<String>, Query(query): Query<HashMap<String, String>>| async move {
                    Json(json!({ "ip": ip, "query": query }))
                },
            ),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    fn client(base_url: &str, interceptors: &[&str]) -> HttpClient {
        let dynamic = Arc::new(DynamicConfig::new(Vec::new(), Vec::new(), 10_000));
        let rows: Vec<String> = interceptors.iter().map(|row| row.to_string()).collect();
        dynamic
            .client_interceptors
            .update::<ClientInterceptorConfig>(&dynamic.engine, &rows);

        HttpClient::new(reqwest::Client::new(), "location", base_url, dynamic)
    }

    /// Tests that a call without interceptor reaches the upstream unchanged.
    ///
    /// Expected: Ok with the upstream echo
    #[tokio::test]
    async fn sends_without_interceptor() -> Result<(), AppError> {
        let http = client(&upstream().await, &[]);

        let response = http
            .send(
                http.request(Method::GET, ROUTE)
                    .param("ip", "1.2.3.4")
                    .query("lang", "en"),
            )
            .await?;

        assert_eq!(response.status, StatusCode::OK);
        let body: Value = response.json()?;
        assert_eq!(body, json!({ "ip": "1.2.3.4", "query": { "lang": "en" } }));

        Ok(())
    }

    /// Tests that a "before" script answers the call without contacting the upstream.
    ///
    /// Expected: Ok with the script response, even though no upstream is listening
    #[tokio::test]
    async fn before_script_short_circuits_call() -> Result<(), AppError> {
        let http = client(
            "http://127.0.0.1:9",
            &[r#"{"service":"location","method":"GET","route":"/ip-locations/json/{ip}","before":"resp.status = 200; resp.body = #{ ip: req.params.ip, cached: true };"}"#],
        );

        let response = http
            .send(http.request(Method::GET, ROUTE).param("ip", "8.8.8.8"))
            .await?;

        assert_eq!(response.status, StatusCode::OK);
        let body: Value = response.json()?;
        assert_eq!(body, json!({ "ip": "8.8.8.8", "cached": true }));

        Ok(())
    }

    /// Tests that a "before" script rewrites the outbound call and an "after" script its result.
    ///
    /// Expected: Ok with the rewritten param and query echoed plus the field added afterwards
    #[tokio::test]
    async fn scripts_rewrite_call_and_response() -> Result<(), AppError> {
        let http = client(
            &upstream().await,
            &[r#"{"service":"location","method":"GET","route":"/ip-locations/json/{ip}","before":"req.params.ip = \"9.9.9.9\"; req.query.lang = \"de\";","after":"resp.body.source = \"script\";"}"#],
        );

        let response = http
            .send(
                http.request(Method::GET, ROUTE)
                    .param("ip", "1.2.3.4")
                    .query("lang", "en"),
            )
            .await?;

        let body: Value = response.json()?;
        assert_eq!(body["ip"], json!("9.9.9.9"));
        assert_eq!(body["query"], json!({ "lang": "de" }));
        assert_eq!(body["source"], json!("script"));

        Ok(())
    }

    /// Tests that a failing script surfaces as an error of the call.
    ///
    /// Expected: Err(AppError::ScriptErr)
    #[tokio::test]
    async fn failing_script_is_error() {
        let http = client(
            "http://127.0.0.1:9",
            &[r#"{"service":"location","method":"GET","route":"/ip-locations/json/{ip}","before":"throw \"boom\";"}"#],
        );

        let result = http
            .send(http.request(Method::GET, ROUTE).param("ip", "8.8.8.8"))
            .await;

        assert!(matches!(result, Err(AppError::ScriptErr(_))));
    }
}
