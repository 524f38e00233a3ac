use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, Method, StatusCode},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// What the echo endpoints saw.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub method: String,
    pub version: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    /// Query pairs for GET, url-encoded form pairs for POST/PATCH.
    pub params: Vec<(String, String)>,
    /// The request body as text.
    pub raw: String,
}

#[derive(Clone, Debug, Default)]
pub struct AppState {
    /// Bearer token `/me` requires. `None` accepts any caller.
    pub token: Option<String>,
}

pub type Shared = Arc<AppState>;

pub fn app() -> Router {
    app_with_token(None)
}

pub fn app_with_token(token: Option<String>) -> Router {
    let state: Shared = Arc::new(AppState { token });
    Router::new()
        .route("/api/{version}/echo", get(echo_query).post(echo_form).patch(echo_form))
        .route("/api/{version}/status/{code}", any(status))
        .route("/api/{version}/plain", get(plain))
        .route("/api/{version}/me", get(me))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_token(listener: TcpListener, token: Option<String>) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_token(token)).await
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn pairs(encoded: &[u8]) -> Vec<(String, String)> {
    form_urlencoded::parse(encoded).into_owned().collect()
}

async fn echo_query(
    Path(version): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Json<Echo> {
    Json(Echo {
        method: Method::GET.to_string(),
        version,
        authorization: header_value(&headers, header::AUTHORIZATION),
        content_type: header_value(&headers, header::CONTENT_TYPE),
        params: query.map(|q| pairs(q.as_bytes())).unwrap_or_default(),
        raw: String::new(),
    })
}

async fn echo_form(
    method: Method,
    Path(version): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Echo> {
    let content_type = header_value(&headers, header::CONTENT_TYPE);
    let is_form = content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
    Json(Echo {
        method: method.to_string(),
        version,
        authorization: header_value(&headers, header::AUTHORIZATION),
        params: if is_form { pairs(&body) } else { Vec::new() },
        content_type,
        raw: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// Respond with `code`. `?errors=a,b` puts `{"errors": ["a", "b"]}` in the
/// body; otherwise the body is `{"status": code}`.
async fn status(
    Path((_version, code)): Path<(String, u16)>,
    RawQuery(query): RawQuery,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    let errors = query.and_then(|q| {
        pairs(q.as_bytes())
            .into_iter()
            .find(|(k, _)| k == "errors")
            .map(|(_, v)| v)
    });
    let body = match errors {
        Some(errors) => json!({ "errors": errors.split(',').collect::<Vec<_>>() }),
        None => json!({ "status": code }),
    };
    Ok((status, Json(body)))
}

async fn plain() -> &'static str {
    "plain text"
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let presented = header_value(&headers, header::AUTHORIZATION);
    match &state.token {
        Some(token) if presented.as_deref() != Some(format!("Bearer {token}").as_str()) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "errors": ["invalid token"] })),
        ),
        _ => (StatusCode::OK, Json(json!({ "authenticated": presented.is_some() }))),
    }
}
