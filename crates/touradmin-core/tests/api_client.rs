//! ApiClient against an in-process backend.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Multipart, Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use touradmin_core::api::{FileUpload, PageQuery, Submission};
use touradmin_core::auth::{MemoryTokenStore, TokenStore};
use touradmin_core::pages::ListPage;
use touradmin_core::{ApiClient, ApiError, Config, ResourceApi, ResourceKind, Route, SessionGuard};

const USERNAME: &str = "admin@example.com";
const PASSWORD: &str = "secret";

fn jwt(expires_in: Duration) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let exp = (Utc::now() + expires_in).timestamp();
    let payload = URL_SAFE_NO_PAD.encode(json!({ "sub": "admin", "exp": exp }).to_string());
    format!("{}.{}.signature", header, payload)
}

fn authorized(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", token))
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid token" }))).into_response()
}

fn router(token: Arc<String>) -> Router {
    let login_token = token.clone();
    let list_token = token.clone();
    let fetch_token = token.clone();
    let upload_token = token;

    Router::new()
        .route(
            "/api/auth/login",
            post(move |Json(body): Json<Value>| {
                let token = login_token.clone();
                async move {
                    if body["email"] == USERNAME && body["password"] == PASSWORD {
                        Json(json!({ "success": true, "data": { "token": *token } })).into_response()
                    } else {
                        (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid credentials" })))
                            .into_response()
                    }
                }
            }),
        )
        .route(
            "/api/tours",
            get(move |headers: HeaderMap, Query(params): Query<HashMap<String, String>>| {
                let token = list_token.clone();
                async move {
                    if !authorized(&headers, &token) {
                        return unauthorized();
                    }
                    let page: u64 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
                    let limit = params.get("limit").cloned().unwrap_or_default();
                    Json(json!({
                        "tours": [
                            { "_id": "t1", "title": "Bali Escape", "limit": limit },
                            { "_id": "t2", "title": "Kyoto Autumn" }
                        ],
                        "currentPage": page,
                        "totalPages": 4,
                        "totalCount": 31
                    }))
                    .into_response()
                }
            }),
        )
        .route(
            "/api/tours/{id}",
            get(move |headers: HeaderMap, Path(id): Path<String>| {
                let token = fetch_token.clone();
                async move {
                    if !authorized(&headers, &token) {
                        return unauthorized();
                    }
                    Json(json!({ "success": true, "data": { "_id": id, "title": "Bali Escape" } }))
                        .into_response()
                }
            })
            .put(|Path(id): Path<String>, Json(mut body): Json<Value>| async move {
                body["_id"] = json!(id);
                Json(json!({ "data": body }))
            }),
        )
        .route(
            "/api/sliders",
            post(move |headers: HeaderMap, mut multipart: Multipart| {
                let token = upload_token.clone();
                async move {
                    if !authorized(&headers, &token) {
                        return unauthorized();
                    }
                    let mut fields = Vec::new();
                    let mut files = Vec::new();
                    while let Ok(Some(field)) = multipart.next_field().await {
                        let name = field.name().unwrap_or_default().to_string();
                        match field.file_name().map(str::to_string) {
                            Some(file_name) => {
                                let size = field.bytes().await.map(|b| b.len()).unwrap_or(0);
                                files.push(json!({ "field": name, "name": file_name, "size": size }));
                            }
                            None => fields.push(name),
                        }
                    }
                    Json(json!({ "_id": "s1", "fields": fields, "files": files })).into_response()
                }
            }),
        )
        .route("/api/visas", get(|| async { unauthorized() }))
}

async fn spawn_backend(token: &str) -> Config {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    let app = router(Arc::new(token.to_string()));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server failed");
    });
    Config {
        api_base_url: format!("http://{}/api/", addr),
        ..Config::default()
    }
}

#[tokio::test]
async fn login_returns_nested_token() {
    let token = jwt(Duration::hours(1));
    let config = spawn_backend(&token).await;
    let client = ApiClient::new(&config).expect("client");

    let issued = client.authenticate(USERNAME, PASSWORD).await.expect("login");
    assert_eq!(issued, token);

    let err = client.authenticate(USERNAME, "wrong").await.err().expect("bad password");
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn list_sends_bearer_and_paging() {
    let token = jwt(Duration::hours(1));
    let config = spawn_backend(&token).await;
    let client = ApiClient::new(&config).expect("client");

    let page = client
        .list(&token, ResourceKind::Tour, Some(PageQuery { page: 2, limit: 10 }))
        .await
        .expect("list");
    assert_eq!(page.records.len(), 2);
    assert_eq!((page.page, page.total_pages, page.total), (2, 4, 31));
    assert_eq!(page.records[0].get("limit"), Some(&json!("10")));

    let err = client
        .list("someone-else", ResourceKind::Tour, None)
        .await
        .err()
        .expect("wrong token");
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn fetch_and_update_unwrap_data_envelope() {
    let token = jwt(Duration::hours(1));
    let config = spawn_backend(&token).await;
    let client = ApiClient::new(&config).expect("client");

    let record = client.fetch(&token, ResourceKind::Tour, "t1").await.expect("fetch");
    assert_eq!(record.get("title"), Some(&json!("Bali Escape")));

    let mut body = serde_json::Map::new();
    body.insert("title".to_string(), json!("Bali Retreat"));
    let updated = client
        .update(&token, ResourceKind::Tour, "t1", Submission::Json(body))
        .await
        .expect("update");
    assert_eq!(updated.get("_id"), Some(&json!("t1")));
    assert_eq!(updated.get("title"), Some(&json!("Bali Retreat")));
}

#[tokio::test]
async fn create_uploads_multipart_file() {
    let token = jwt(Duration::hours(1));
    let config = spawn_backend(&token).await;
    let client = ApiClient::new(&config).expect("client");

    let path = std::env::temp_dir().join(format!("touradmin-upload-{}.png", std::process::id()));
    std::fs::write(&path, [0x89, b'P', b'N', b'G']).expect("write upload");

    let created = client
        .create(
            &token,
            ResourceKind::Slider,
            Submission::Multipart {
                fields: vec![("title".to_string(), "Summer".to_string())],
                files: vec![FileUpload {
                    field: "image".to_string(),
                    path: path.clone(),
                }],
            },
        )
        .await
        .expect("create");
    let _ = std::fs::remove_file(&path);

    assert_eq!(created.get("fields"), Some(&json!(["title"])));
    let files = created.get("files").and_then(Value::as_array).expect("files");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["field"], "image");
    assert_eq!(files[0]["size"], 4);
}

#[tokio::test]
async fn unauthorized_response_ends_the_session() {
    let token = jwt(Duration::hours(1));
    let config = spawn_backend(&token).await;
    let client = ApiClient::new(&config).expect("client");

    let store = Arc::new(MemoryTokenStore::with_token(token.clone()));
    let mut guard = SessionGuard::new(store.clone());

    let mut tours = ListPage::new(ResourceKind::Tour, 10);
    assert_eq!(tours.load(&mut guard, &client, Utc::now()).await, None);
    assert_eq!(tours.rows().len(), 2);

    let mut visas = ListPage::new(ResourceKind::Visa, 10);
    assert_eq!(visas.load(&mut guard, &client, Utc::now()).await, Some(Route::Login));
    assert_eq!(store.load().expect("load"), None);
    assert!(!guard.is_authenticated());
}
