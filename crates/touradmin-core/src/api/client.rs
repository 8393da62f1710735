//! HTTP client for the tourism backend's REST API.
//!
//! `ApiClient` logs in against the configured login endpoint and implements
//! `ResourceApi` for the admin pages. Each call is a single request: no
//! retries, caching or deduplication.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::resources::{Record, ResourceKind};

use super::backend::{record_from_value, FileUpload, PageQuery, RecordPage, ResourceApi, Submission};
use super::ApiError;

/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    login_url: String,
    login_field: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            login_url: config.login_url(),
            login_field: config.login_field.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Log in and return the issued bearer token
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let mut body = Map::new();
        body.insert(self.login_field.clone(), json!(username));
        body.insert("password".to_string(), json!(password));

        debug!(url = %self.login_url, "Sending login request");
        let response = self
            .client
            .post(&self.login_url)
            .json(&body)
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        let value: Value = response.json().await?;

        extract_token(&value).ok_or_else(|| {
            ApiError::InvalidResponse("Login response did not include a token".to_string())
        })
    }

    fn collection_url(&self, kind: ResourceKind) -> String {
        format!("{}/{}", self.base_url, kind.slug())
    }

    fn record_url(&self, kind: ResourceKind, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, kind.slug(), id)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let url = response.url().to_string();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, url = %url, "Request failed");
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn send_json(request: RequestBuilder) -> Result<Value, ApiError> {
        let response = Self::check_response(request.send().await?).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Malformed JSON: {}", e)))
    }

    async fn with_body(request: RequestBuilder, body: Submission) -> Result<RequestBuilder, ApiError> {
        match body {
            Submission::Json(record) => Ok(request.json(&record)),
            Submission::Multipart { fields, files } => {
                let mut form = Form::new();
                for (name, value) in fields {
                    form = form.text(name, value);
                }
                for upload in files {
                    form = form.part(upload.field.clone(), file_part(&upload).await?);
                }
                Ok(request.multipart(form))
            }
        }
    }
}

#[async_trait]
impl ResourceApi for ApiClient {
    async fn list(
        &self,
        token: &str,
        kind: ResourceKind,
        query: Option<PageQuery>,
    ) -> Result<RecordPage, ApiError> {
        let mut request = self.client.get(self.collection_url(kind)).bearer_auth(token);
        if let Some(q) = query {
            request = request.query(&[("page", q.page), ("limit", q.limit)]);
        }
        debug!(kind = kind.slug(), ?query, "Fetching collection");
        let value = Self::send_json(request).await?;
        RecordPage::from_value(value, kind, query)
    }

    async fn fetch(&self, token: &str, kind: ResourceKind, id: &str) -> Result<Record, ApiError> {
        debug!(kind = kind.slug(), id, "Fetching record");
        let request = self.client.get(self.record_url(kind, id)).bearer_auth(token);
        record_from_value(Self::send_json(request).await?)
    }

    async fn create(
        &self,
        token: &str,
        kind: ResourceKind,
        body: Submission,
    ) -> Result<Record, ApiError> {
        debug!(kind = kind.slug(), "Creating record");
        let request = self.client.post(self.collection_url(kind)).bearer_auth(token);
        let request = Self::with_body(request, body).await?;
        record_from_value(Self::send_json(request).await?)
    }

    async fn update(
        &self,
        token: &str,
        kind: ResourceKind,
        id: &str,
        body: Submission,
    ) -> Result<Record, ApiError> {
        debug!(kind = kind.slug(), id, "Updating record");
        let request = self.client.put(self.record_url(kind, id)).bearer_auth(token);
        let request = Self::with_body(request, body).await?;
        record_from_value(Self::send_json(request).await?)
    }
}

/// Token from a login response: `token`, `accessToken`, `access_token`,
/// or any of those under `data`.
fn extract_token(value: &Value) -> Option<String> {
    const KEYS: [&str; 3] = ["token", "accessToken", "access_token"];
    let top = value.as_object()?;
    let nested = top.get("data").and_then(Value::as_object);
    std::iter::once(top)
        .chain(nested)
        .find_map(|obj| {
            KEYS.iter()
                .find_map(|key| obj.get(*key).and_then(Value::as_str))
        })
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

async fn file_part(upload: &FileUpload) -> Result<Part, ApiError> {
    let bytes = tokio::fs::read(&upload.path)
        .await
        .map_err(|source| ApiError::Upload {
            path: upload.path.display().to_string(),
            source,
        })?;
    let file_name = upload
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| upload.field.clone());
    let part = Part::bytes(bytes).file_name(file_name);
    match image_mime(&upload.path) {
        Some(mime) => Ok(part.mime_str(mime)?),
        None => Ok(part),
    }
}

fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_shapes() {
        assert_eq!(extract_token(&json!({"token": "a.b.c"})), Some("a.b.c".to_string()));
        assert_eq!(extract_token(&json!({"accessToken": "x"})), Some("x".to_string()));
        assert_eq!(
            extract_token(&json!({"success": true, "data": {"token": "nested"}})),
            Some("nested".to_string())
        );
        assert_eq!(extract_token(&json!({"token": ""})), None);
        assert_eq!(extract_token(&json!({"message": "welcome"})), None);
        assert_eq!(extract_token(&json!("a.b.c")), None);
    }

    #[test]
    fn test_image_mime() {
        assert_eq!(image_mime(Path::new("/tmp/beach.JPG")), Some("image/jpeg"));
        assert_eq!(image_mime(Path::new("flag.svg")), Some("image/svg+xml"));
        assert_eq!(image_mime(Path::new("notes.txt")), None);
        assert_eq!(image_mime(Path::new("noext")), None);
    }

    #[test]
    fn test_urls_use_trimmed_base() {
        let config = Config {
            api_base_url: "http://api.example.com/v1/".to_string(),
            ..Config::default()
        };
        let client = ApiClient::new(&config).expect("client");
        assert_eq!(client.collection_url(ResourceKind::Visa), "http://api.example.com/v1/visas");
        assert_eq!(
            client.record_url(ResourceKind::Tour, "abc"),
            "http://api.example.com/v1/tours/abc"
        );
    }

    #[tokio::test]
    async fn test_missing_upload_file_is_reported() {
        let upload = FileUpload {
            field: "image".to_string(),
            path: std::env::temp_dir().join("touradmin-missing-upload.png"),
        };
        let err = file_part(&upload).await.err().expect("missing file should fail");
        assert!(matches!(err, ApiError::Upload { .. }));
    }
}
