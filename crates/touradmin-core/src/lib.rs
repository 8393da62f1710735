//! Core library for touradmin.
//!
//! Everything the admin console needs apart from the terminal itself:
//!
//! - `api`: REST client for the tourism backend and the `ResourceApi` seam
//! - `auth`: token decoding, token storage, and the session guard
//! - `config`: persisted user configuration
//! - `nav`: the static navigation tree and its open/active state
//! - `pages`: list, detail, and form controllers shared by every resource
//! - `resources`: the resource catalogue (sliders, blogs, tours, ...)
//! - `routes`: route paths mirroring the admin pages
//! - `timer`: the countdown tick task
//! - `utils`: string formatting helpers

pub mod api;
pub mod auth;
pub mod config;
pub mod nav;
pub mod pages;
pub mod resources;
pub mod routes;
pub mod timer;
pub mod utils;

pub use api::{ApiClient, ApiError, ResourceApi};
pub use auth::{SessionGuard, SessionState, TokenStore};
pub use config::Config;
pub use resources::{Record, ResourceKind};
pub use routes::Route;
