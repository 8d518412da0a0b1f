use axum::http::Method;

use crate::server::{
    error::AppError,
    service::http_client::{ClientResponse, HttpClient},
};

/// Service name of the IP location upstream, the first part of its routing keys.
pub const LOCATION_SERVICE: &str = "location";

/// Lookup route of the IP location upstream.
pub const LOCATION_ROUTE: &str = "/ip-locations/json/{ip}";

pub struct LocationService<'a> {
    http: &'a HttpClient,
}

impl<'a> LocationService<'a> {
    pub fn new(http: &'a HttpClient) -> Self {
        Self { http }
    }

    /// Looks up the location of an IP address.
    ///
    /// The call is routed through the client interceptor keyed
    /// `location GET /ip-locations/json/{ip}`, so the response may come from a script.
    pub async fn lookup(&self, ip: &str) -> Result<ClientResponse, AppError> {
        let ip = ip.trim();
        if ip.is_empty() {
            return Err(AppError::BadRequest("IP address is required".to_string()));
        }

        let config = self
            .http
            .request(Method::GET, LOCATION_ROUTE)
            .param("ip", ip);

        self.http.send(config).await
    }
}
