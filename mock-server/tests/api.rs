use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_token, Echo};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn form_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body.to_string())
        .unwrap()
}

// --- echo ---

#[tokio::test]
async fn echo_get_returns_query_pairs() {
    let resp = app()
        .oneshot(get("/api/v2/echo?q=a+b&page=2"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.version, "v2");
    assert_eq!(
        echo.params,
        vec![
            ("q".to_string(), "a b".to_string()),
            ("page".to_string(), "2".to_string()),
        ]
    );
    assert!(echo.authorization.is_none());
}

#[tokio::test]
async fn echo_post_decodes_form_body() {
    let resp = app()
        .oneshot(form_request("POST", "/api/v1/echo", "user%5Bname%5D=ann"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.params, vec![("user[name]".to_string(), "ann".to_string())]);
    assert_eq!(echo.raw, "user%5Bname%5D=ann");
}

#[tokio::test]
async fn echo_patch_keeps_non_form_body_raw() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/api/v1/echo")
                .header(http::header::CONTENT_TYPE, "multipart/form-data; boundary=x")
                .body("--x--\r\n".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PATCH");
    assert!(echo.params.is_empty());
    assert_eq!(echo.raw, "--x--\r\n");
}

// --- status ---

#[tokio::test]
async fn status_returns_requested_code_with_errors() {
    let resp = app()
        .oneshot(get("/api/v1/status/422?errors=bad+field,missing"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({ "errors": ["bad field", "missing"] }));
}

#[tokio::test]
async fn status_without_errors_reports_code() {
    let resp = app()
        .oneshot(form_request("POST", "/api/v1/status/418", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({ "status": 418 }));
}

#[tokio::test]
async fn status_rejects_out_of_range_code() {
    let resp = app().oneshot(get("/api/v1/status/42")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- plain ---

#[tokio::test]
async fn plain_is_text() {
    let resp = app().oneshot(get("/api/v1/plain")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers()[http::header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"), "{content_type}");
}

// --- me ---

#[tokio::test]
async fn me_requires_configured_token() {
    let app = app_with_token(Some("s3cret".to_string()));

    let resp = app.clone().oneshot(get("/api/v1/me")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/me")
                .header(http::header::AUTHORIZATION, "Bearer s3cret")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["authenticated"], true);
}

#[tokio::test]
async fn me_without_configured_token_accepts_anyone() {
    let resp = app().oneshot(get("/api/v1/me")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let resp = app().oneshot(get("/todos")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
