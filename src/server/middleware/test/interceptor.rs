use super::*;
use serde_json::json;

/// Tests the end-to-end short circuit of a "before" script.
///
/// Verifies that a configured row makes the request answer with the script status and
/// never reach the real handler.
///
/// Expected: 403 and an empty body
#[tokio::test]
async fn before_script_short_circuits() {
    let mut test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let (app, state) = setup(&mut test).await;
    configure(
        &state,
        "httpServerInterceptor",
        r#"{"router":"GET /users/v1/me","before":"resp.status = 403"}"#,
    )
    .await;

    let response = send(&app, request(Method::GET, "/users/v1/me")).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_string(response).await, "");
}

/// Tests that a short circuit can carry a body and headers.
///
/// Expected: 418 with the JSON body and header set by the script
#[tokio::test]
async fn before_script_answers_with_body() {
    let mut test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let (app, state) = setup(&mut test).await;
    configure(
        &state,
        "httpServerInterceptor",
        r#"{"router":"GET /ping","before":"resp.status = 418; resp.header = #{\"x-teapot\": \"yes\"}; resp.body = #{ reason: req.ip };"}"#,
    )
    .await;

    let response = send(&app, request(Method::GET, "/ping")).await;

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(response.headers().get("x-teapot").unwrap(), "yes");
    assert_eq!(body_json(response).await, json!({ "reason": CLIENT_IP }));
}

/// Tests that predicates that do not match make the interceptor absent.
///
/// Expected: 200 from another IP, 403 from the required IP
#[tokio::test]
async fn predicates_gate_execution() {
    let mut test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let (app, state) = setup(&mut test).await;
    configure(
        &state,
        "httpServerInterceptor",
        r#"{"router":"GET /ping","before":"resp.status = 403","ip":"1.2.3.4"}"#,
    )
    .await;

    let other = send(&app, request_from(Method::GET, "/ping", "5.6.7.8")).await;
    let matching = send(&app, request_from(Method::GET, "/ping", "1.2.3.4")).await;

    assert_eq!(other.status(), StatusCode::OK);
    assert_eq!(body_string(other).await, "pong");
    assert_eq!(matching.status(), StatusCode::FORBIDDEN);
}

/// Tests that cookie predicates require every pair.
///
/// Expected: 403 only when both cookies are present
#[tokio::test]
async fn cookie_predicates_require_all_pairs() {
    let mut test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let (app, state) = setup(&mut test).await;
    configure(
        &state,
        "httpServerInterceptor",
        r#"{"router":"GET /ping","before":"resp.status = 403","cookie":"beta=1;team=qa"}"#,
    )
    .await;

    let mut partial = request(Method::GET, "/ping");
    partial
        .headers_mut()
        .insert(header::COOKIE, "beta=1".parse().unwrap());
    let mut complete = request(Method::GET, "/ping");
    complete
        .headers_mut()
        .insert(header::COOKIE, "beta=1; team=qa".parse().unwrap());

    assert_eq!(send(&app, partial).await.status(), StatusCode::OK);
    assert_eq!(send(&app, complete).await.status(), StatusCode::FORBIDDEN);
}

/// Tests that modified route params re-route the request.
///
/// Expected: the row named by the rewritten param is returned
#[tokio::test]
async fn modified_params_reroute_request() {
    let mut test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let (app, state) = setup(&mut test).await;
    let first = factory::create_configuration(&state.db, "blockIP", "1.1.1.1")
        .await
        .unwrap();
    let second = factory::create_configuration(&state.db, "blockIP", "2.2.2.2")
        .await
        .unwrap();
    configure(
        &state,
        "httpServerInterceptor",
        &json!({
            "router": "GET /configurations/v1/{id}",
            "before": format!("req.params.id = \"{}\";", second.id),
        })
        .to_string(),
    )
    .await;

    let response = send(
        &app,
        request(Method::GET, &format!("/configurations/v1/{}", first.id)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["id"], json!(second.id));
}

/// Tests that a modified body reaches the handler re-encoded.
///
/// Expected: the created row carries the data set by the script
#[tokio::test]
async fn modified_body_reaches_handler() {
    let mut test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let (app, state) = setup(&mut test).await;
    configure(
        &state,
        "httpServerInterceptor",
        r#"{"router":"POST /configurations/v1","before":"req.body.description = \"via script\";"}"#,
    )
    .await;

    let response = send(
        &app,
        json_request(
            Method::POST,
            "/configurations/v1",
            json!({
                "name": "scripted",
                "category": "blockIP",
                "data": "3.3.3.3",
                "startedAt": "2020-01-01T00:00:00Z",
                "endedAt": "2100-01-01T00:00:00Z",
            }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["description"], json!("via script"));
    assert_eq!(body["data"], json!("3.3.3.3"));
}

/// Tests that an "after" script rewrites the handler response.
///
/// Expected: handler status kept, body field replaced
#[tokio::test]
async fn after_script_rewrites_response() {
    let mut test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let (app, state) = setup(&mut test).await;
    configure(
        &state,
        "httpServerInterceptor",
        r#"{"router":"GET /users/v1/me","after":"resp.body.account = \"scripted\";"}"#,
    )
    .await;

    let response = send(&app, request(Method::GET, "/users/v1/me")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["account"], json!("scripted"));
}

/// Tests that a throwing script yields a well-formed 500 response.
///
/// Expected: 500 with a JSON error body
#[tokio::test]
async fn failing_script_is_internal_error() {
    let mut test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let (app, state) = setup(&mut test).await;
    configure(
        &state,
        "httpServerInterceptor",
        r#"{"router":"GET /ping","before":"throw \"boom\";"}"#,
    )
    .await;

    let response = send(&app, request(Method::GET, "/ping")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Internal server error" })
    );
}
