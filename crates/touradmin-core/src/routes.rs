//! Admin page routes.
//!
//! Paths mirror the browser panel: `/login`, `/dashboard`, and per resource
//! `/{slug}`, `/{slug}/add`, `/{slug}/edit/{id}`, `/{slug}/view/{id}`.

use std::fmt;

use crate::resources::ResourceKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    List(ResourceKind),
    Add(ResourceKind),
    Edit(ResourceKind, String),
    View(ResourceKind, String),
}

impl Route {
    /// Parse a path. Unknown paths, and add/edit paths for read-only
    /// resources, yield `None`.
    pub fn parse(path: &str) -> Option<Route> {
        let segments: Vec<&str> = path
            .trim()
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [] | ["dashboard"] => Some(Route::Dashboard),
            ["login"] => Some(Route::Login),
            [slug] => ResourceKind::from_slug(slug).map(Route::List),
            [slug, "add"] => ResourceKind::from_slug(slug)
                .filter(ResourceKind::is_editable)
                .map(Route::Add),
            [slug, "edit", id] => ResourceKind::from_slug(slug)
                .filter(ResourceKind::is_editable)
                .map(|kind| Route::Edit(kind, (*id).to_string())),
            [slug, "view", id] => {
                ResourceKind::from_slug(slug).map(|kind| Route::View(kind, (*id).to_string()))
            }
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::List(kind) => format!("/{}", kind.slug()),
            Route::Add(kind) => format!("/{}/add", kind.slug()),
            Route::Edit(kind, id) => format!("/{}/edit/{}", kind.slug(), id),
            Route::View(kind, id) => format!("/{}/view/{}", kind.slug(), id),
        }
    }

    /// Every route except the login page requires a session
    pub fn is_guarded(&self) -> bool {
        !matches!(self, Route::Login)
    }

    pub fn resource(&self) -> Option<ResourceKind> {
        match self {
            Route::List(kind) | Route::Add(kind) => Some(*kind),
            Route::Edit(kind, _) | Route::View(kind, _) => Some(*kind),
            Route::Login | Route::Dashboard => None,
        }
    }

    /// Heading shown above the page content
    pub fn title(&self) -> String {
        match self {
            Route::Login => "Login".to_string(),
            Route::Dashboard => "Dashboard".to_string(),
            Route::List(kind) => kind.title().to_string(),
            Route::Add(kind) => format!("Add {}", kind.singular()),
            Route::Edit(kind, _) => format!("Edit {}", kind.singular()),
            Route::View(kind, _) => format!("{} Details", kind.singular()),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
