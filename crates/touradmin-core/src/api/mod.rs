//! REST API client module for the tourism backend.
//!
//! `ResourceApi` is the seam the admin pages call through; `ApiClient` is the
//! reqwest implementation authenticating with a JWT bearer token.

pub mod backend;
pub mod client;
pub mod error;

pub use backend::{record_from_value, FileUpload, PageQuery, RecordPage, ResourceApi, Submission};
pub use client::ApiClient;
pub use error::ApiError;
