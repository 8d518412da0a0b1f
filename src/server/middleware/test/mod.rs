use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use crate::server::{
    dynamic::DynamicConfig,
    router,
    service::{configuration::ConfigurationService, http_client::HttpClient, location::LOCATION_SERVICE},
    startup,
    state::AppState,
};
use test_utils::{builder::TestBuilder, context::TestContext, factory};

mod interceptor;
mod tracker;

/// Client IP used by test requests unless a test says otherwise.
const CLIENT_IP: &str = "5.6.7.8";

/// Builds the full middleware stack over the test database.
async fn setup(test: &mut TestContext) -> (Router, AppState) {
    let db = test.database().await.unwrap().clone();
    let session = startup::connect_to_session(&db).await.unwrap();

    let (api, routes) = router::api_router().into_parts();
    let dynamic = Arc::new(DynamicConfig::new(
        routes.keys(),
        vec!["test-key".to_string()],
        10_000,
    ));
    let location = HttpClient::new(
        reqwest::Client::new(),
        LOCATION_SERVICE,
        "http://127.0.0.1:9",
        dynamic.clone(),
    );
    let state = AppState::new(
        db,
        dynamic,
        Arc::new(routes),
        location,
        Duration::from_secs(5),
    );

    (router::router(api, state.clone(), session), state)
}

/// Stores a configuration row and refreshes the runtime components.
async fn configure(state: &AppState, category: &str, data: &str) {
    factory::create_configuration(&state.db, category, data)
        .await
        .unwrap();
    ConfigurationService::new(&state.db)
        .refresh(&state.dynamic, Duration::from_secs(5))
        .await
        .unwrap();
}

fn request(method: Method, uri: &str) -> Request<Body> {
    request_from(method, uri, CLIENT_IP)
}

fn request_from(method: Method, uri: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", CLIENT_IP)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// Tests that a request matching nothing dynamic reaches its handler unchanged.
///
/// Expected: 200 with `pong`
#[tokio::test]
async fn passes_through_without_configuration() {
    let mut test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let (app, _) = setup(&mut test).await;

    let response = send(&app, request(Method::GET, "/ping")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "pong");
}

/// Tests that unknown routes still get the router's 404.
///
/// Expected: 404
#[tokio::test]
async fn unknown_route_is_not_found() {
    let mut test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let (app, _) = setup(&mut test).await;

    let response = send(&app, request(Method::GET, "/nothing/here")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
