use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo, Item};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn empty(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- echo ---

#[tokio::test]
async fn echo_reflects_method_query_headers_and_body() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo?b=2&a=1")
                .header(http::header::CONTENT_TYPE, "application/json")
                .header("x-multi", "1")
                .header("x-multi", "2")
                .body(r#"{"k":"v"}"#.to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.path, "/echo");
    assert_eq!(echo.query.as_deref(), Some("b=2&a=1"));
    assert_eq!(echo.body, r#"{"k":"v"}"#);
    let multi: Vec<&str> = echo
        .headers
        .iter()
        .filter(|(name, _)| name == "x-multi")
        .map(|(_, value)| value.as_str())
        .collect();
    assert_eq!(multi, ["1", "2"]);
}

#[tokio::test]
async fn echo_accepts_any_method() {
    let resp = app().oneshot(empty("PATCH", "/echo")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PATCH");
    assert!(echo.query.is_none());
}

// --- item ---

#[tokio::test]
async fn item_returns_fixed_json() {
    let resp = app().oneshot(empty("GET", "/item")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let item: Item = body_json(resp).await;
    assert_eq!(
        item,
        Item {
            id: 42,
            name: "x".to_string()
        }
    );
}

// --- status ---

#[tokio::test]
async fn status_uses_requested_code_with_json_body() {
    let resp = app().oneshot(empty("GET", "/status/404")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let item: Item = body_json(resp).await;
    assert_eq!(item.id, 404);
    assert_eq!(item.name, "Not Found");
}

#[tokio::test]
async fn status_rejects_out_of_range_code() {
    let resp = app().oneshot(empty("GET", "/status/42")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- malformed ---

#[tokio::test]
async fn malformed_is_not_json() {
    let resp = app().oneshot(empty("GET", "/malformed")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_bytes(resp).await;
    assert!(serde_json::from_slice::<serde_json::Value>(&body).is_err());
}

// --- cookies ---

#[tokio::test]
async fn cookies_sets_two_cookies() {
    let resp = app().oneshot(empty("GET", "/cookies")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookies: Vec<_> = resp
        .headers()
        .get_all(http::header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cookies.len(), 2);
    assert!(cookies[0].starts_with("sid=abc123"));
    assert!(cookies[1].starts_with("theme=dark"));
}

// --- slow ---

#[tokio::test]
async fn slow_eventually_answers() {
    let resp = app().oneshot(empty("GET", "/slow/5")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let item: Item = body_json(resp).await;
    assert_eq!(item.id, 5);
}

// --- truncated ---

#[tokio::test]
async fn truncated_body_fails_to_collect() {
    let resp = app().oneshot(empty("GET", "/truncated")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.into_body().collect().await.is_err());
}

// --- stall ---

#[tokio::test]
async fn stall_completes_the_body_after_waiting() {
    let resp = app().oneshot(empty("GET", "/stall/5")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let item: Item = body_json(resp).await;
    assert_eq!(item.name, "late");
}
