mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use uuid::Uuid;

use common::{app, authed, create_app, json_body, send, sign_in, test_state};

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

fn with_auth(uri: &str, value: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", value)
        .body(Body::empty())
        .expect("build request")
}

#[tokio::test]
async fn test_missing_authorization_is_401() {
    let state = test_state();
    let response = send(app(&state), get("/apps")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn test_non_bearer_scheme_is_401() {
    let state = test_state();
    let response = send(app(&state), with_auth("/apps", "Basic YWxhZGRpbjpvcGVu")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(app(&state), with_auth("/apps", "Bearer ")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_other_secret_is_401() {
    let state = test_state();
    let foreign = glimpse_server::auth::TokenService::new("some-other-secret")
        .issue(Uuid::new_v4())
        .expect("token");
    let response = send(app(&state), authed("GET", "/apps", &foreign, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_token_lists_own_apps() {
    let state = test_state();
    let (_, token) = sign_in(&state, "owner@example.com").await;
    let response = send(app(&state), authed("GET", "/apps", &token, None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["data"], serde_json::json!([]));
}

#[tokio::test]
async fn test_analytics_without_token_is_401_even_without_tracking_id() {
    let state = test_state();
    let response = send(app(&state), get("/analytics/referrals")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_analytics_tracking_id_checks() {
    let state = test_state();
    let (_, owner) = sign_in(&state, "owner@example.com").await;
    let (_, stranger) = sign_in(&state, "stranger@example.com").await;
    let tracking_id = create_app(&state, &owner, "Blog").await;

    let missing = send(
        app(&state),
        authed("GET", "/analytics/browsers", &owner, None),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    let json = json_body(missing).await;
    assert_eq!(json["error"]["field"], "trackingID");

    let malformed = send(
        app(&state),
        authed("GET", "/analytics/browsers?trackingID=not-a-uuid", &owner, None),
    )
    .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

    let unknown = send(
        app(&state),
        authed(
            "GET",
            &format!("/analytics/browsers?trackingID={}", Uuid::new_v4()),
            &owner,
            None,
        ),
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let foreign = send(
        app(&state),
        authed(
            "GET",
            &format!("/analytics/browsers?trackingID={tracking_id}"),
            &stranger,
            None,
        ),
    )
    .await;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);

    let own = send(
        app(&state),
        authed(
            "GET",
            &format!("/analytics/browsers?trackingID={tracking_id}"),
            &owner,
            None,
        ),
    )
    .await;
    assert_eq!(own.status(), StatusCode::OK);
}
