use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    /// Every header line in arrival order, names lowercase.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Body served by `/item`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: i64,
    pub name: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/item", get(item))
        .route("/status/{code}", any(status))
        .route("/malformed", get(malformed))
        .route("/slow/{ms}", get(slow))
        .route("/cookies", get(set_cookies))
        .route("/truncated", get(truncated))
        .route("/stall/{ms}", get(stall))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers: headers
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn item() -> Json<Item> {
    Json(Item {
        id: 42,
        name: "x".to_string(),
    })
}

async fn status(Path(code): Path<u16>) -> Result<Response, StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((
        status,
        Json(Item {
            id: i64::from(code),
            name: status.canonical_reason().unwrap_or("unknown").to_string(),
        }),
    )
        .into_response())
}

async fn malformed() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"id": 1, "name": "#,
    )
}

async fn slow(Path(ms): Path<u64>) -> Json<Item> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(Item {
        id: ms as i64,
        name: "slow".to_string(),
    })
}

async fn set_cookies() -> impl IntoResponse {
    (
        AppendHeaders([
            (header::SET_COOKIE, "sid=abc123; Path=/; HttpOnly"),
            (header::SET_COOKIE, "theme=dark; Max-Age=60; SameSite=Lax"),
        ]),
        Json(Item {
            id: 1,
            name: "cookies".to_string(),
        }),
    )
}

/// Sends one chunk, then drops the connection mid-body.
async fn truncated() -> Response {
    let stream = futures::stream::unfold(0u8, |step| async move {
        match step {
            0 => Some((Ok::<_, std::io::Error>(Bytes::from_static(b"{\"id\":")), 1)),
            1 => {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Some((Err(std::io::Error::other("connection dropped")), 2))
            }
            _ => None,
        }
    });
    Response::new(Body::from_stream(stream))
}

/// Sends the start of a JSON body, waits `ms`, then finishes it.
async fn stall(Path(ms): Path<u64>) -> Response {
    let stream = futures::stream::unfold(0u8, move |step| async move {
        match step {
            0 => Some((Ok::<_, std::io::Error>(Bytes::from_static(b"{\"id\":")), 1)),
            1 => {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Some((Ok(Bytes::from_static(b"1,\"name\":\"late\"}")), 2))
            }
            _ => None,
        }
    });
    Response::new(Body::from_stream(stream))
}
