use super::*;
use crate::server::middleware::tracker::TRACK_COOKIE;

/// Extracts the `jt=<value>` pair of a response, if any.
fn track_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&format!("{}=", TRACK_COOKIE)))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

/// Tests that a new caller gets a tracking cookie and keeps its id afterwards.
///
/// Expected: a cookie on the first response only, same track id on both
#[tokio::test]
async fn issues_and_reuses_tracking_cookie() {
    let mut test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let (app, _) = setup(&mut test).await;

    let first = send(&app, request(Method::GET, "/users/v1/me")).await;
    let cookie = track_cookie(&first).unwrap();
    let first_id = body_json(first).await["trackId"].clone();
    assert!(first_id.is_string());

    let mut again = request(Method::GET, "/users/v1/me");
    again
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let second = send(&app, again).await;

    assert!(track_cookie(&second).is_none());
    assert_eq!(body_json(second).await["trackId"], first_id);
}

/// Tests that a forged cookie is replaced.
///
/// Expected: a fresh cookie in the response
#[tokio::test]
async fn replaces_forged_cookie() {
    let mut test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let (app, _) = setup(&mut test).await;

    let mut forged = request(Method::GET, "/ping");
    forged.headers_mut().insert(
        header::COOKIE,
        format!("{}=abc.0123", TRACK_COOKIE).parse().unwrap(),
    );
    let response = send(&app, forged).await;

    let cookie = track_cookie(&response).unwrap();
    assert_ne!(cookie, format!("{}=abc.0123", TRACK_COOKIE));
}
