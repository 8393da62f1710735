//! The resource API seam and the response shapes it accepts.
//!
//! Controllers talk to `ResourceApi` rather than `ApiClient` directly so they
//! can be tested against an in-memory fake.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::resources::{record_id, Record, ResourceKind};

use super::ApiError;

/// Keys under which backends commonly nest the rows of a list response
const ROW_KEYS: [&str; 4] = ["data", "items", "results", "rows"];

/// Objects that may carry paging metadata next to the rows
const META_KEYS: [&str; 3] = ["pagination", "meta", "data"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
}

impl PageQuery {
    pub fn first(limit: u32) -> Self {
        Self { page: 1, limit }
    }
}

/// One fetched page of a collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPage {
    pub records: Vec<Record>,
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
}

impl RecordPage {
    /// Interpret a list response body.
    ///
    /// Accepts a bare array, or an object holding the rows under one of the
    /// usual keys or under the collection's own name. Missing paging
    /// metadata falls back to the requested page and the row count.
    pub fn from_value(
        value: Value,
        kind: ResourceKind,
        requested: Option<PageQuery>,
    ) -> Result<Self, ApiError> {
        let (rows, meta) = match value {
            Value::Array(rows) => (rows, Map::new()),
            Value::Object(mut obj) => {
                let rows = take_rows(&mut obj, kind.slug()).ok_or_else(|| {
                    ApiError::InvalidResponse(format!("No {} rows in response", kind.slug()))
                })?;
                (rows, obj)
            }
            other => {
                return Err(ApiError::InvalidResponse(format!(
                    "Expected a list of {}, got {}",
                    kind.slug(),
                    type_name(&other)
                )))
            }
        };

        let records: Vec<Record> = rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(record) => Some(record),
                other => {
                    debug!(kind = kind.slug(), value = %other, "Skipping non-object row");
                    None
                }
            })
            .collect();

        let page = meta_number(&meta, &["page", "currentPage", "current_page"])
            .map(saturate_u32)
            .or(requested.map(|q| q.page))
            .unwrap_or(1)
            .max(1);
        let total = meta_number(&meta, &["total", "totalCount", "total_count", "count"])
            .unwrap_or(records.len() as u64);
        let total_pages = meta_number(&meta, &["totalPages", "total_pages", "pages"])
            .map(saturate_u32)
            .or_else(|| {
                requested
                    .filter(|q| q.limit > 0)
                    .map(|q| saturate_u32(total.div_ceil(u64::from(q.limit))))
            })
            .unwrap_or(1)
            .max(1);

        Ok(Self {
            records,
            page,
            total_pages,
            total,
        })
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Backend counts above `u32::MAX` clamp instead of wrapping
fn saturate_u32(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Interpret a single-record response, unwrapping a `data` envelope.
pub fn record_from_value(value: Value) -> Result<Record, ApiError> {
    match value {
        Value::Object(mut obj) => {
            if record_id(&obj).is_none() {
                if let Some(Value::Object(inner)) = obj.remove("data") {
                    return Ok(inner);
                }
            }
            Ok(obj)
        }
        other => Err(ApiError::InvalidResponse(format!(
            "Expected a record, got {}",
            type_name(&other)
        ))),
    }
}

fn take_rows(obj: &mut Map<String, Value>, slug: &str) -> Option<Vec<Value>> {
    for key in ROW_KEYS.iter().copied().chain(std::iter::once(slug)) {
        if matches!(obj.get(key), Some(Value::Array(_))) {
            if let Some(Value::Array(rows)) = obj.remove(key) {
                return Some(rows);
            }
        }
    }
    // `{ "data": { "tours": [...], "total": 3 } }`
    if let Some(Value::Object(inner)) = obj.get_mut("data") {
        if let Some(rows) = take_rows(inner, slug) {
            return Some(rows);
        }
    }
    None
}

fn meta_number(meta: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    lookup_meta(meta, keys, 2)
}

fn lookup_meta(obj: &Map<String, Value>, keys: &[&str], depth: u8) -> Option<u64> {
    if let Some(n) = keys.iter().find_map(|key| obj.get(*key).and_then(as_count)) {
        return Some(n);
    }
    if depth == 0 {
        return None;
    }
    META_KEYS
        .iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_object))
        .find_map(|nested| lookup_meta(nested, keys, depth - 1))
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A local file sent as one multipart part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub field: String,
    pub path: PathBuf,
}

/// Body of a create or update request
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Json(Record),
    /// Sent when at least one image is a newly chosen local file
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<FileUpload>,
    },
}

/// REST operations the admin pages need. Every call carries the bearer
/// token handed out by the session guard.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    async fn list(
        &self,
        token: &str,
        kind: ResourceKind,
        query: Option<PageQuery>,
    ) -> Result<RecordPage, ApiError>;

    async fn fetch(&self, token: &str, kind: ResourceKind, id: &str) -> Result<Record, ApiError>;

    async fn create(
        &self,
        token: &str,
        kind: ResourceKind,
        body: Submission,
    ) -> Result<Record, ApiError>;

    async fn update(
        &self,
        token: &str,
        kind: ResourceKind,
        id: &str,
        body: Submission,
    ) -> Result<Record, ApiError>;
}
