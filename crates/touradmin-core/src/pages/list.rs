use chrono::{DateTime, Utc};
use tracing::debug;

use crate::api::{PageQuery, RecordPage, ResourceApi};
use crate::auth::SessionGuard;
use crate::resources::{display_field, record_id, Record, ResourceKind};
use crate::routes::Route;
use crate::utils::contains_ignore_case;

use super::{guarded, next_ticket, LoadStatus, PageOutcome};

/// Collection page: one table of records with paging, a search filter and
/// a row cursor.
#[derive(Debug, Clone)]
pub struct ListPage {
    kind: ResourceKind,
    page_size: u32,
    page: u32,
    data: RecordPage,
    status: LoadStatus,
    filter: String,
    selected: usize,
    pending: Option<u64>,
}

impl ListPage {
    pub fn new(kind: ResourceKind, page_size: u32) -> Self {
        Self {
            kind,
            page_size: page_size.max(1),
            page: 1,
            data: RecordPage::default(),
            status: LoadStatus::Loading,
            filter: String::new(),
            selected: 0,
            pending: None,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// `?page=&limit=` for paginated collections, nothing for the rest
    pub fn query(&self) -> Option<PageQuery> {
        self.kind.is_paginated().then_some(PageQuery {
            page: self.page,
            limit: self.page_size,
        })
    }

    /// Mark a request as in flight and return its ticket
    pub fn start(&mut self) -> u64 {
        let ticket = next_ticket();
        self.pending = Some(ticket);
        self.status = LoadStatus::Loading;
        ticket
    }

    /// Whether `ticket` belongs to the request this page is waiting on
    pub fn accepts(&self, ticket: u64) -> bool {
        self.pending == Some(ticket)
    }

    /// Take a settled result. Returns a redirect when the session ended.
    pub fn apply(&mut self, ticket: u64, outcome: PageOutcome<RecordPage>) -> Option<Route> {
        if !self.accepts(ticket) {
            debug!(kind = self.kind.slug(), ticket, "Discarding stale list response");
            return None;
        }
        self.pending = None;
        match outcome {
            PageOutcome::Ready(data) => {
                self.page = data.page;
                self.data = data;
                self.status = LoadStatus::Loaded;
                self.clamp_selection();
                None
            }
            PageOutcome::Failed(msg) => {
                self.status = LoadStatus::Failed(msg);
                None
            }
            PageOutcome::Redirect(route) => Some(route),
        }
    }

    pub async fn load(
        &mut self,
        guard: &mut SessionGuard,
        api: &dyn ResourceApi,
        now: DateTime<Utc>,
    ) -> Option<Route> {
        let ticket = self.start();
        let (kind, query) = (self.kind, self.query());
        let outcome = guarded(guard, now, |token| async move {
            api.list(&token, kind, query).await
        })
        .await;
        self.apply(ticket, outcome)
    }

    /// Advance to the next page. Returns true when a reload is needed.
    pub fn next_page(&mut self) -> bool {
        if self.kind.is_paginated() && self.data.has_next() {
            self.page = self.data.page + 1;
            self.selected = 0;
            true
        } else {
            false
        }
    }

    pub fn prev_page(&mut self) -> bool {
        if self.kind.is_paginated() && self.data.has_prev() {
            self.page = self.data.page - 1;
            self.selected = 0;
            true
        } else {
            false
        }
    }

    /// (current page, total pages, total records)
    pub fn page_info(&self) -> (u32, u32, u64) {
        (self.data.page.max(1), self.data.total_pages.max(1), self.data.total)
    }

    /// Records passing the search filter, in backend order
    pub fn rows(&self) -> Vec<&Record> {
        if self.filter.is_empty() {
            return self.data.records.iter().collect();
        }
        let columns = self.kind.list_columns();
        self.data
            .records
            .iter()
            .filter(|record| {
                columns
                    .iter()
                    .any(|spec| contains_ignore_case(&display_field(record, spec), &self.filter))
            })
            .collect()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter.push(c);
        self.selected = 0;
    }

    pub fn pop_filter_char(&mut self) {
        self.filter.pop();
        self.selected = 0;
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
        self.selected = 0;
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select_next(&mut self) {
        let len = self.rows().len();
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_record(&self) -> Option<&Record> {
        self.rows().get(self.selected).copied()
    }

    fn selected_id(&self) -> Option<String> {
        self.selected_record().and_then(record_id)
    }

    pub fn view_route(&self) -> Option<Route> {
        self.selected_id().map(|id| Route::View(self.kind, id))
    }

    pub fn edit_route(&self) -> Option<Route> {
        if !self.kind.is_editable() {
            return None;
        }
        self.selected_id().map(|id| Route::Edit(self.kind, id))
    }

    pub fn add_route(&self) -> Option<Route> {
        self.kind.is_editable().then_some(Route::Add(self.kind))
    }

    fn clamp_selection(&mut self) {
        let len = self.rows().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}
