//! Page controllers shared by every resource.
//!
//! Each controller runs the session check before touching the network and
//! maps the outcome of its one request through `settle`: a 401 ends the
//! session and redirects to login, any other failure becomes a generic
//! message, and success hands the data to the page.
//!
//! Requests can be driven two ways. `load`/`submit` await inline through
//! `guarded`. The TUI instead calls `SessionGuard::mount`, runs the request
//! on a spawned task, and feeds the result back through `settle` and the
//! controller's `apply`. Both paths tag the request with a ticket so a
//! response for a page that has since been re-mounted is dropped.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use crate::api::ApiError;
use crate::auth::SessionGuard;
use crate::routes::Route;

pub mod detail;
pub mod form;
pub mod list;

pub use detail::DetailPage;
pub use form::{FormError, FormMode, FormPage};
pub use list::ListPage;

/// Shown for every failure other than an expired or rejected session
pub const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

/// Tickets are unique across every page, so a result can only ever match
/// the request that produced it.
pub(crate) fn next_ticket() -> u64 {
    NEXT_TICKET.fetch_add(1, Ordering::Relaxed)
}

/// Result of one guarded request
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome<T> {
    Ready(T),
    Redirect(Route),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Loaded,
    Failed(String),
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadStatus::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Map a request result onto what the page should do next.
pub fn settle<T>(guard: &mut SessionGuard, result: Result<T, ApiError>) -> PageOutcome<T> {
    match result {
        Ok(data) => PageOutcome::Ready(data),
        Err(e) if e.is_unauthorized() => {
            debug!("Backend rejected the session token");
            PageOutcome::Redirect(guard.invalidate().unwrap_or(Route::Login))
        }
        Err(e) => {
            error!(error = %e, "Request failed");
            PageOutcome::Failed(GENERIC_ERROR.to_string())
        }
    }
}

/// Session check, request, and `settle` in one step. `call` only runs
/// when the guard hands out a token.
pub async fn guarded<T, F, Fut>(guard: &mut SessionGuard, now: DateTime<Utc>, call: F) -> PageOutcome<T>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let token = match guard.mount(now) {
        Ok(token) => token,
        Err(route) => return PageOutcome::Redirect(route),
    };
    settle(guard, call(token).await)
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::auth::{SessionState, TokenStore};
    use crate::resources::ResourceKind;

    /// Mount every page type for every resource
    async fn mount_all(guard: &mut SessionGuard, api: &FakeApi) -> Vec<Option<Route>> {
        let mut redirects = Vec::new();
        for kind in ResourceKind::ALL {
            let mut list = ListPage::new(kind, 10);
            redirects.push(list.load(guard, api, now()).await);

            let mut detail = DetailPage::new(kind, "1".to_string());
            redirects.push(detail.load(guard, api, now()).await);

            if kind.is_editable() {
                let mut form = FormPage::edit(kind, "1".to_string());
                redirects.push(form.load(guard, api, now()).await);
            }
        }
        redirects
    }

    #[tokio::test]
    async fn test_no_request_without_token() {
        let (mut guard, _) = signed_out();
        let api = FakeApi::new(FakeMode::Ok);

        let redirects = mount_all(&mut guard, &api).await;

        assert!(!redirects.is_empty());
        assert!(redirects.iter().all(|r| r == &Some(Route::Login)));
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_unauthorized_clears_token_and_redirects() {
        for kind in ResourceKind::ALL {
            let (mut guard, store) = signed_in();
            let api = FakeApi::new(FakeMode::Unauthorized);
            let mut list = ListPage::new(kind, 10);
            assert_eq!(list.load(&mut guard, &api, now()).await, Some(Route::Login));
            assert_eq!(store.load().expect("load"), None);
            assert_eq!(guard.state(), &SessionState::Expired);

            let (mut guard, store) = signed_in();
            let mut detail = DetailPage::new(kind, "7".to_string());
            assert_eq!(detail.load(&mut guard, &api, now()).await, Some(Route::Login));
            assert_eq!(store.load().expect("load"), None);
        }

        let (mut guard, store) = signed_in();
        let api = FakeApi::new(FakeMode::Unauthorized);
        let mut form = FormPage::edit(ResourceKind::Tour, "7".to_string());
        assert_eq!(form.load(&mut guard, &api, now()).await, Some(Route::Login));
        assert_eq!(store.load().expect("load"), None);
    }

    #[tokio::test]
    async fn test_server_error_stays_on_page() {
        let (mut guard, store) = signed_in();
        let api = FakeApi::new(FakeMode::ServerError);
        let mut list = ListPage::new(ResourceKind::Blog, 10);

        assert_eq!(list.load(&mut guard, &api, now()).await, None);
        assert_eq!(list.status(), &LoadStatus::Failed(GENERIC_ERROR.to_string()));
        assert!(store.load().expect("load").is_some());
        assert!(guard.is_authenticated());
    }

    #[tokio::test]
    async fn test_guarded_passes_the_stored_token() {
        let (mut guard, store) = signed_in();
        let stored = store.load().expect("load").expect("token");
        let outcome = guarded(&mut guard, now(), |token| async move {
            Ok::<_, ApiError>(token)
        })
        .await;
        assert_eq!(outcome, PageOutcome::Ready(stored));
    }

    #[test]
    fn test_settle_after_session_already_ended() {
        let (mut guard, _) = signed_out();
        let outcome: PageOutcome<()> = settle(&mut guard, Err(ApiError::Unauthorized));
        assert_eq!(outcome, PageOutcome::Redirect(Route::Login));
    }

    #[test]
    fn test_tickets_are_unique() {
        let a = next_ticket();
        let b = next_ticket();
        assert!(b > a);
    }
}
