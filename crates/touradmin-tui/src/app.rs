//! Application state management for touradmin.
//!
//! This module contains the core `App` struct: the current route and page,
//! the session guard, the sidebar, the login form, and the channel through
//! which spawned requests and the countdown timer report back to the event
//! loop.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

use touradmin_core::api::{ApiClient, ApiError, PageQuery, RecordPage, ResourceApi, Submission};
use touradmin_core::auth::{SessionGuard, TokenStore};
use touradmin_core::config::{Config, PASSWORD_ENV, USERNAME_ENV};
use touradmin_core::nav::{NavItem, NavState};
use touradmin_core::pages::{settle, DetailPage, FormMode, FormPage, ListPage};
use touradmin_core::resources::{Record, ResourceKind};
use touradmin_core::routes::Route;
use touradmin_core::timer::CountdownTimer;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background event channel.
/// One request per page plus timer ticks never comes close.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 64;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// UI State Types
// ============================================================================

/// The mounted page for the current route
pub enum Page {
    Login,
    Dashboard,
    List(ListPage),
    Detail(DetailPage),
    Form(FormPage),
}

/// Current UI focus area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Content,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Messages sent to the event loop by spawned requests and the countdown.
///
/// Every request result carries the ticket its page issued, so a result for
/// a page that has since been replaced or re-mounted is dropped. The bearer
/// token it was sent with decides whether a stale 401 still ends the session.
pub enum AppEvent {
    /// One second of the session countdown elapsed
    Tick,
    ListLoaded {
        ticket: u64,
        token: String,
        result: Result<RecordPage, ApiError>,
    },
    RecordLoaded {
        ticket: u64,
        token: String,
        result: Result<Record, ApiError>,
    },
    Saved {
        ticket: u64,
        token: String,
        result: Result<Record, ApiError>,
    },
}

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub guard: SessionGuard,
    api: Arc<ApiClient>,

    // Routing
    pub route: Route,
    pub page: Page,
    pub nav: NavState,

    // UI State
    pub state: AppState,
    pub focus: Focus,
    pub sidebar_selection: usize,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
    /// Why the user landed on the login page (session expired, logged out)
    pub login_notice: Option<&'static str>,

    // Background event channel
    events_tx: mpsc::Sender<AppEvent>,
    events_rx: mpsc::Receiver<AppEvent>,
    timer: Option<CountdownTimer>,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    /// Create a new application instance
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        debug!(api = %config.base_url(), "Config loaded");

        let store = config.token_store()?;
        Self::with_config(config, store)
    }

    /// Build the app around an explicit config and token store
    pub fn with_config(config: Config, store: Arc<dyn TokenStore>) -> Result<Self> {
        let guard = SessionGuard::new(store);
        let api = Arc::new(ApiClient::new(&config)?);
        let (events_tx, events_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_username = std::env::var(USERNAME_ENV)
            .ok()
            .or_else(|| config.last_username.clone())
            .unwrap_or_default();
        let login_password = std::env::var(PASSWORD_ENV).unwrap_or_default();

        Ok(Self {
            config,
            guard,
            api,

            route: Route::Login,
            page: Page::Login,
            nav: NavState::new(),

            state: AppState::Normal,
            focus: Focus::Content,
            sidebar_selection: 0,

            login_username,
            login_password,
            login_focus: LoginFocus::Username,
            login_error: None,
            login_notice: None,

            events_tx,
            events_rx,
            timer: None,

            status_message: None,
        })
    }

    pub fn api_base_url(&self) -> &str {
        self.api.base_url()
    }

    // =========================================================================
    // Routing
    // =========================================================================

    /// Go to a route. Guarded routes run the session check first and end up
    /// on the login page when it fails.
    pub fn navigate(&mut self, route: Route) {
        if !route.is_guarded() {
            self.show_login();
            return;
        }
        let token = match self.guard.mount(Utc::now()) {
            Ok(token) => token,
            Err(redirect) => {
                debug!(to = %route, redirect = %redirect, "Session check failed");
                self.follow(redirect);
                return;
            }
        };
        self.ensure_timer();

        debug!(to = %route, "Navigating");
        self.nav.on_route_change(&route);
        self.page = self.mount_page(&route, token);
        self.route = route;
        self.state = AppState::Normal;
        self.focus = Focus::Content;
        self.sync_sidebar_selection();
    }

    /// Act on a redirect returned by the guard or a page
    fn follow(&mut self, route: Route) {
        match route {
            Route::Login => self.show_login(),
            other => self.navigate(other),
        }
    }

    fn mount_page(&self, route: &Route, token: String) -> Page {
        match route {
            Route::Login => Page::Login,
            Route::Dashboard => Page::Dashboard,
            Route::List(kind) => {
                let mut list = ListPage::new(*kind, self.config.effective_page_size());
                let ticket = list.start();
                self.spawn_list(ticket, *kind, list.query(), token);
                Page::List(list)
            }
            Route::View(kind, id) => {
                let mut detail = DetailPage::new(*kind, id.clone());
                let ticket = detail.start();
                self.spawn_fetch(ticket, *kind, id.clone(), token);
                Page::Detail(detail)
            }
            Route::Add(kind) => Page::Form(FormPage::create(*kind)),
            Route::Edit(kind, id) => {
                let mut form = FormPage::edit(*kind, id.clone());
                if let Some((ticket, id)) = form.start_load() {
                    self.spawn_fetch(ticket, *kind, id, token);
                }
                Page::Form(form)
            }
        }
    }

    /// Re-run the current list or detail request (paging, refresh)
    pub fn reload(&mut self) {
        let token = match self.guard.mount(Utc::now()) {
            Ok(token) => token,
            Err(redirect) => {
                self.follow(redirect);
                return;
            }
        };
        let request = match &mut self.page {
            Page::List(list) => Some((list.start(), list.kind(), None, list.query())),
            Page::Detail(detail) => {
                Some((detail.start(), detail.kind(), Some(detail.id().to_string()), None))
            }
            _ => None,
        };
        match request {
            Some((ticket, kind, None, query)) => self.spawn_list(ticket, kind, query, token),
            Some((ticket, kind, Some(id), _)) => self.spawn_fetch(ticket, kind, id, token),
            None => {}
        }
    }

    pub fn show_login(&mut self) {
        self.timer = None;
        if let Some(reason) = self.guard.ended_by() {
            self.login_notice = Some(reason.message());
        }
        self.guard.enter_login();

        self.route = Route::Login;
        self.page = Page::Login;
        self.nav.on_route_change(&Route::Login);
        self.state = AppState::Normal;
        self.login_password.clear();
        self.login_error = None;
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) {
        let username = self.login_username.trim().to_string();
        let password = self.login_password.clone();

        if username.is_empty() || password.is_empty() {
            self.login_error = Some("Username and password required".to_string());
            return;
        }
        self.login_error = None;

        let token = match self.api.authenticate(&username, &password).await {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, "Login failed");
                self.login_error = Some(login_error_message(&e));
                return;
            }
        };

        if let Err(e) = self.guard.begin(&token, Utc::now()) {
            error!(error = %e, "Login returned an unusable token");
            self.login_error = Some("Login failed: the server returned an unusable token".to_string());
            return;
        }

        self.config.last_username = Some(username);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        self.login_password.clear();
        self.login_notice = None;
        info!("Login successful");
        self.navigate(Route::Dashboard);
    }

    pub fn logout(&mut self) {
        let redirect = self.guard.logout();
        info!("Logged out");
        self.follow(redirect);
    }

    // =========================================================================
    // Sidebar
    // =========================================================================

    pub fn sidebar_items(&self) -> Vec<NavItem> {
        self.nav.visible_items()
    }

    pub fn sidebar_next(&mut self) {
        let len = self.sidebar_items().len();
        if self.sidebar_selection + 1 < len {
            self.sidebar_selection += 1;
        }
    }

    pub fn sidebar_prev(&mut self) {
        self.sidebar_selection = self.sidebar_selection.saturating_sub(1);
    }

    /// Enter on the sidebar: toggle a group or open an entry
    pub fn sidebar_activate(&mut self) {
        match self.sidebar_items().get(self.sidebar_selection).copied() {
            Some(NavItem::Group(group)) => {
                let open = self.nav.toggle(group.key);
                debug!(group = group.key, open, "Toggled navigation group");
            }
            Some(NavItem::Entry(entry)) => match Route::parse(entry.path) {
                Some(route) => self.navigate(route),
                None => warn!(path = entry.path, "Navigation entry has no route"),
            },
            None => {}
        }
    }

    fn sync_sidebar_selection(&mut self) {
        let Some(active) = self.nav.active_entry() else {
            return;
        };
        if let Some(index) = self
            .sidebar_items()
            .iter()
            .position(|item| matches!(item, NavItem::Entry(entry) if entry.path == active.path))
        {
            self.sidebar_selection = index;
        }
    }

    // =========================================================================
    // Forms
    // =========================================================================

    pub fn submit_form(&mut self) {
        let Page::Form(form) = &mut self.page else {
            return;
        };
        let Some((ticket, body)) = form.begin_submit() else {
            return;
        };
        let (kind, mode) = (form.kind(), form.mode().clone());

        match self.guard.mount(Utc::now()) {
            Ok(token) => self.spawn_save(ticket, kind, mode, body, token),
            Err(redirect) => self.follow(redirect),
        }
    }

    // =========================================================================
    // Background requests
    // =========================================================================

    fn ensure_timer(&mut self) {
        if self.timer.is_some() {
            return;
        }
        let tx = self.events_tx.clone();
        self.timer = Some(CountdownTimer::spawn(CountdownTimer::DEFAULT_PERIOD, move || {
            match tx.try_send(AppEvent::Tick) {
                Ok(()) | Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Closed(_)) => false,
            }
        }));
    }

    fn spawn_list(&self, ticket: u64, kind: ResourceKind, query: Option<PageQuery>, token: String) {
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.list(&token, kind, query).await;
            Self::send_event(&tx, AppEvent::ListLoaded { ticket, token, result }).await;
        });
    }

    fn spawn_fetch(&self, ticket: u64, kind: ResourceKind, id: String, token: String) {
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch(&token, kind, &id).await;
            Self::send_event(&tx, AppEvent::RecordLoaded { ticket, token, result }).await;
        });
    }

    fn spawn_save(
        &self,
        ticket: u64,
        kind: ResourceKind,
        mode: FormMode,
        body: Submission,
        token: String,
    ) {
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = match mode {
                FormMode::Create => api.create(&token, kind, body).await,
                FormMode::Edit(id) => api.update(&token, kind, &id, body).await,
            };
            Self::send_event(&tx, AppEvent::Saved { ticket, token, result }).await;
        });
    }

    async fn send_event(tx: &mpsc::Sender<AppEvent>, event: AppEvent) {
        if tx.send(event).await.is_err() {
            debug!("Event loop closed, dropping result");
        }
    }

    /// Drain finished requests and timer ticks
    pub fn process_events(&mut self) {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            events.push(event);
        }
        for event in events {
            self.process_event(event);
        }
    }

    fn process_event(&mut self, event: AppEvent) {
        self.process_event_at(event, Utc::now());
    }

    fn process_event_at(&mut self, event: AppEvent, now: DateTime<Utc>) {
        let redirect = match event {
            AppEvent::Tick => self.guard.tick(now),
            AppEvent::ListLoaded { ticket, token, result } => match &mut self.page {
                Page::List(list) if list.accepts(ticket) => {
                    let outcome = settle(&mut self.guard, result);
                    list.apply(ticket, outcome)
                }
                _ => self.discard_stale("list", ticket, &token, result),
            },
            AppEvent::RecordLoaded { ticket, token, result } => match &mut self.page {
                Page::Detail(detail) if detail.accepts(ticket) => {
                    let outcome = settle(&mut self.guard, result);
                    detail.apply(ticket, outcome)
                }
                Page::Form(form) if form.accepts(ticket) => {
                    let outcome = settle(&mut self.guard, result);
                    form.apply_load(ticket, outcome)
                }
                _ => self.discard_stale("record", ticket, &token, result),
            },
            AppEvent::Saved { ticket, token, result } => match &mut self.page {
                Page::Form(form) if form.accepts(ticket) => {
                    let saved = result.is_ok();
                    let kind = form.kind();
                    let outcome = settle(&mut self.guard, result);
                    let redirect = form.finish_submit(ticket, outcome);
                    if saved {
                        self.status_message = Some(format!("{} saved", kind.singular()));
                    }
                    redirect
                }
                _ => self.discard_stale("save", ticket, &token, result),
            },
        };

        if let Some(route) = redirect {
            self.follow(route);
        }
    }

    /// A result for a page that is no longer waiting on it. The data is
    /// dropped, but a 401 for the token still in use ends the session.
    fn discard_stale<T>(
        &mut self,
        what: &'static str,
        ticket: u64,
        token: &str,
        result: Result<T, ApiError>,
    ) -> Option<Route> {
        match result {
            Err(e) if e.is_unauthorized() && self.guard.is_current(token) => {
                warn!(what, ticket, "Stale response rejected the current token");
                self.guard.invalidate()
            }
            _ => {
                debug!(what, ticket, "Dropping stale response");
                None
            }
        }
    }
}

/// User-facing text for a failed login
pub fn login_error_message(e: &ApiError) -> String {
    match e {
        ApiError::Unauthorized | ApiError::AccessDenied(_) => {
            "Invalid username or password".to_string()
        }
        ApiError::InvalidResponse(msg) if msg.starts_with("Status 400") => {
            "Invalid username or password".to_string()
        }
        ApiError::NotFound(_) => {
            "Login endpoint not found. Check api_base_url and login_path.".to_string()
        }
        ApiError::NetworkError(err) if err.is_timeout() => {
            "Connection timed out. Please try again.".to_string()
        }
        e if e.is_connection_failure() => {
            "Unable to connect to server. Check your connection.".to_string()
        }
        other => format!("Login failed: {}", other),
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use chrono::Duration;
    use serde_json::json;
    use touradmin_core::auth::{EndReason, MemoryTokenStore};

    /// Unsigned JWT expiring at `exp`; `sig` keeps tokens with the same
    /// expiry distinct
    fn jwt(exp: DateTime<Utc>, sig: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(json!({ "exp": exp.timestamp() }).to_string());
        format!("{}.{}.{}", header, payload, sig)
    }

    /// App with requests pointed at a closed port so spawned calls fail fast
    fn app_with(token: Option<String>) -> (App, Arc<MemoryTokenStore>) {
        let store = Arc::new(match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::new(),
        });
        let config = Config {
            api_base_url: "http://127.0.0.1:9/api".to_string(),
            ..Config::default()
        };
        let app = App::with_config(config, store.clone()).expect("app");
        (app, store)
    }

    /// Re-issue the mounted list's request and return the ticket it now waits on
    fn restart_list(app: &mut App) -> u64 {
        match &mut app.page {
            Page::List(list) => list.start(),
            _ => panic!("expected a list page"),
        }
    }

    fn unauthorized(ticket: u64, token: &str) -> AppEvent {
        AppEvent::ListLoaded {
            ticket,
            token: token.to_string(),
            result: Err(ApiError::Unauthorized),
        }
    }

    #[tokio::test]
    async fn test_guarded_route_without_token_lands_on_login() {
        let (mut app, _) = app_with(None);
        app.navigate(Route::Dashboard);

        assert!(matches!(app.page, Page::Login));
        assert_eq!(app.route, Route::Login);
        assert!(app.timer.is_none());
        assert_eq!(app.login_notice, None);
    }

    #[tokio::test]
    async fn test_guarded_route_with_token_mounts_page_and_countdown() {
        let token = jwt(Utc::now() + Duration::hours(1), "a");
        let (mut app, _) = app_with(Some(token.clone()));
        app.navigate(Route::List(ResourceKind::Tour));

        assert!(matches!(app.page, Page::List(_)));
        assert_eq!(app.route, Route::List(ResourceKind::Tour));
        assert!(app.timer.is_some());
        assert!(app.guard.is_current(&token));
    }

    #[tokio::test]
    async fn test_countdown_expiry_redirects_and_clears_token() {
        let (mut app, store) = app_with(Some(jwt(Utc::now() + Duration::hours(1), "a")));
        app.navigate(Route::Dashboard);
        assert!(matches!(app.page, Page::Dashboard));

        app.process_event_at(AppEvent::Tick, Utc::now() + Duration::minutes(30));
        assert!(matches!(app.page, Page::Dashboard));

        app.process_event_at(AppEvent::Tick, Utc::now() + Duration::hours(2));
        assert!(matches!(app.page, Page::Login));
        assert!(app.timer.is_none());
        assert_eq!(app.login_notice, Some(EndReason::Expired.message()));
        assert_eq!(store.load().expect("load"), None);
    }

    #[tokio::test]
    async fn test_unauthorized_response_redirects_and_clears_token() {
        let token = jwt(Utc::now() + Duration::hours(1), "a");
        let (mut app, store) = app_with(Some(token.clone()));
        app.navigate(Route::List(ResourceKind::Tour));
        let ticket = restart_list(&mut app);

        app.process_event(unauthorized(ticket, &token));

        assert!(matches!(app.page, Page::Login));
        assert!(app.timer.is_none());
        assert_eq!(app.login_notice, Some(EndReason::Unauthorized.message()));
        assert_eq!(store.load().expect("load"), None);
    }

    #[tokio::test]
    async fn test_unauthorized_after_leaving_page_still_ends_session() {
        let token = jwt(Utc::now() + Duration::hours(1), "a");
        let (mut app, store) = app_with(Some(token.clone()));
        app.navigate(Route::List(ResourceKind::Tour));
        let ticket = restart_list(&mut app);
        app.navigate(Route::Dashboard);

        app.process_event(unauthorized(ticket, &token));

        assert!(matches!(app.page, Page::Login));
        assert_eq!(app.login_notice, Some(EndReason::Unauthorized.message()));
        assert_eq!(store.load().expect("load"), None);
    }

    #[tokio::test]
    async fn test_unauthorized_for_replaced_token_keeps_new_session() {
        let old = jwt(Utc::now() + Duration::hours(1), "old");
        let (mut app, store) = app_with(Some(old.clone()));
        app.navigate(Route::List(ResourceKind::Tour));
        let ticket = restart_list(&mut app);

        let new = jwt(Utc::now() + Duration::hours(1), "new");
        app.guard.begin(&new, Utc::now()).expect("begin");
        app.navigate(Route::Dashboard);

        app.process_event(unauthorized(ticket, &old));

        assert!(matches!(app.page, Page::Dashboard));
        assert!(app.guard.is_current(&new));
        assert_eq!(store.load().expect("load"), Some(new));
    }

    #[tokio::test]
    async fn test_superseded_list_result_is_ignored() {
        let token = jwt(Utc::now() + Duration::hours(1), "a");
        let (mut app, _) = app_with(Some(token.clone()));
        app.navigate(Route::List(ResourceKind::Tour));
        let old_ticket = restart_list(&mut app);
        restart_list(&mut app);

        let record = json!({ "_id": "t1", "title": "Old" })
            .as_object()
            .cloned()
            .expect("object");
        app.process_event(AppEvent::ListLoaded {
            ticket: old_ticket,
            token: token.clone(),
            result: Ok(RecordPage {
                records: vec![record],
                page: 1,
                total_pages: 1,
                total: 1,
            }),
        });

        match &app.page {
            Page::List(list) => {
                assert!(list.rows().is_empty());
                assert!(list.status().is_loading());
            }
            _ => panic!("expected a list page"),
        }
        assert!(app.guard.is_current(&token));
    }

    #[test]
    fn test_login_error_messages() {
        assert_eq!(
            login_error_message(&ApiError::Unauthorized),
            "Invalid username or password"
        );
        assert_eq!(
            login_error_message(&ApiError::InvalidResponse(
                "Status 400 Bad Request: missing email".to_string()
            )),
            "Invalid username or password"
        );
        assert!(login_error_message(&ApiError::NotFound(String::new())).contains("login_path"));
        assert_eq!(
            login_error_message(&ApiError::ServerError("down".to_string())),
            "Login failed: Server error: down"
        );
    }

    #[test]
    fn test_can_add_username_char() {
        assert!(can_add_username_char(0, 'a'));
        assert!(can_add_username_char(63, '@'));
        assert!(!can_add_username_char(64, 'a'));
        assert!(!can_add_username_char(0, '\x00'));
        assert!(!can_add_username_char(0, '\n'));
        assert!(!can_add_username_char(0, '\t'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\x00'));
        assert!(!can_add_password_char(0, '\r'));
    }
}
