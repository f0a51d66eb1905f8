use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde_json::json;
use tokio::{net::TcpListener, sync::Mutex};

use super::*;
use crate::credentials::{MissingCredentialProvider, StaticCredentialProvider};

#[derive(Clone, Default)]
struct ServerState {
    patches: Arc<Mutex<Vec<(i64, Value)>>>,
}

async fn echo_list(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    Json(json!({
        "authorization": authorization,
        "params": params,
    }))
}

async fn forbidden() -> impl IntoResponse {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "detail": "You do not have permission to perform this action." })),
    )
}

async fn field_errors() -> impl IntoResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "rejection_reason": ["This field may not be blank."] })),
    )
}

async fn plain_failure() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn patch_appeal(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.patches.lock().await.push((id, body.clone()));
    Json(json!({ "id": id, "status": body["status"] }))
}

async fn spawn_api_server() -> anyhow::Result<(Url, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/appeals/", get(echo_list))
        .route("/backend/api/appeals/", get(echo_list))
        .route("/api/appeals/:id/", patch(patch_appeal))
        .route("/api/forbidden/", get(forbidden))
        .route("/api/invalid/", get(field_errors))
        .route("/api/broken/", get(plain_failure))
        .route("/api/empty/", get(no_content))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((Url::parse(&format!("http://{addr}"))?, state))
}

fn transport(base_url: Url, scheme: AuthScheme) -> HttpTransport {
    HttpTransport::new(
        Client::new(),
        base_url,
        scheme,
        Arc::new(StaticCredentialProvider::new("secret-token")),
    )
}

fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[tokio::test]
async fn get_sends_token_header_and_query_params() {
    let (base_url, _) = spawn_api_server().await.expect("spawn server");
    let transport = transport(base_url, AuthScheme::Token);

    let body = transport
        .get_json(
            "/api/appeals/",
            &params(&[("page", "2"), ("page_size", "25"), ("status", "pending")]),
        )
        .await
        .expect("list");

    assert_eq!(body["authorization"], "Token secret-token");
    assert_eq!(body["params"]["page"], "2");
    assert_eq!(body["params"]["page_size"], "25");
    assert_eq!(body["params"]["status"], "pending");
}

#[tokio::test]
async fn bearer_scheme_is_configurable() {
    let (base_url, _) = spawn_api_server().await.expect("spawn server");
    let transport = transport(base_url, AuthScheme::Bearer);
    let body = transport.get_json("api/appeals/", &[]).await.expect("list");
    assert_eq!(body["authorization"], "Bearer secret-token");
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() {
    let (base_url, _) = spawn_api_server().await.expect("spawn server");
    let prefixed = base_url.join("backend").expect("prefixed url");
    let transport = transport(prefixed, AuthScheme::Token);
    assert!(transport.base_url().as_str().ends_with("/backend/"));

    let body = transport.get_json("/api/appeals/", &[]).await.expect("list");
    assert_eq!(body["authorization"], "Token secret-token");
}

#[tokio::test]
async fn missing_token_fails_before_any_request() {
    let transport = HttpTransport::new(
        Client::new(),
        Url::parse("http://127.0.0.1:9").expect("url"),
        AuthScheme::Token,
        Arc::new(MissingCredentialProvider),
    );
    let err = transport
        .get_json("/api/appeals/", &[])
        .await
        .expect_err("no token");
    assert_eq!(err, NetworkError::MissingCredential);
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn error_status_carries_backend_detail() {
    let (base_url, _) = spawn_api_server().await.expect("spawn server");
    let transport = transport(base_url, AuthScheme::Token);

    let err = transport
        .get_json("/api/forbidden/", &[])
        .await
        .expect_err("forbidden");
    assert_eq!(
        err,
        NetworkError::Status {
            status: 403,
            message: "You do not have permission to perform this action.".into(),
        }
    );
    assert!(err.is_unauthorized());

    let err = transport
        .get_json("/api/invalid/", &[])
        .await
        .expect_err("invalid");
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("rejection_reason"));
}

#[tokio::test]
async fn non_json_error_body_falls_back_to_reason_phrase() {
    let (base_url, _) = spawn_api_server().await.expect("spawn server");
    let transport = transport(base_url, AuthScheme::Token);
    let err = transport
        .get_json("/api/broken/", &[])
        .await
        .expect_err("broken");
    assert_eq!(
        err,
        NetworkError::Status {
            status: 500,
            message: "Internal Server Error".into(),
        }
    );
}

#[tokio::test]
async fn empty_success_body_is_null() {
    let (base_url, _) = spawn_api_server().await.expect("spawn server");
    let transport = transport(base_url, AuthScheme::Token);
    let body = transport.get_json("/api/empty/", &[]).await.expect("empty");
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn patch_sends_json_body() {
    let (base_url, state) = spawn_api_server().await.expect("spawn server");
    let transport = transport(base_url, AuthScheme::Token);

    let body = transport
        .send_json(
            HttpMethod::Patch,
            "/api/appeals/7/",
            &json!({ "status": "approved" }),
        )
        .await
        .expect("patch");

    assert_eq!(body, json!({ "id": 7, "status": "approved" }));
    let patches = state.patches.lock().await.clone();
    assert_eq!(patches, vec![(7, json!({ "status": "approved" }))]);
}

#[tokio::test]
async fn unconfigured_transport_always_fails() {
    let err = MissingTransport
        .get_json("/api/appeals/", &[])
        .await
        .expect_err("missing transport");
    assert!(matches!(err, NetworkError::Transport(_)));
}
