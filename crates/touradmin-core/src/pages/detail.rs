use chrono::{DateTime, Utc};
use tracing::debug;

use crate::api::ResourceApi;
use crate::auth::SessionGuard;
use crate::resources::{display_field, Record, ResourceKind};
use crate::routes::Route;

use super::{guarded, next_ticket, LoadStatus, PageOutcome};

/// Read-only view of one record
#[derive(Debug, Clone)]
pub struct DetailPage {
    kind: ResourceKind,
    id: String,
    record: Option<Record>,
    status: LoadStatus,
    scroll: u16,
    pending: Option<u64>,
}

impl DetailPage {
    pub fn new(kind: ResourceKind, id: String) -> Self {
        Self {
            kind,
            id,
            record: None,
            status: LoadStatus::Loading,
            scroll: 0,
            pending: None,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    pub fn start(&mut self) -> u64 {
        let ticket = next_ticket();
        self.pending = Some(ticket);
        self.status = LoadStatus::Loading;
        ticket
    }

    pub fn accepts(&self, ticket: u64) -> bool {
        self.pending == Some(ticket)
    }

    pub fn apply(&mut self, ticket: u64, outcome: PageOutcome<Record>) -> Option<Route> {
        if !self.accepts(ticket) {
            debug!(kind = self.kind.slug(), id = %self.id, ticket, "Discarding stale record response");
            return None;
        }
        self.pending = None;
        match outcome {
            PageOutcome::Ready(record) => {
                self.record = Some(record);
                self.status = LoadStatus::Loaded;
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
        let kind = self.kind;
        let id = self.id.clone();
        let outcome = guarded(guard, now, |token| async move {
            api.fetch(&token, kind, &id).await
        })
        .await;
        self.apply(ticket, outcome)
    }

    /// Every field of the resource as (label, text), HTML stripped
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let Some(record) = &self.record else {
            return Vec::new();
        };
        self.kind
            .fields()
            .iter()
            .map(|spec| (spec.label, display_field(record, spec)))
            .collect()
    }

    pub fn edit_route(&self) -> Option<Route> {
        self.kind
            .is_editable()
            .then(|| Route::Edit(self.kind, self.id.clone()))
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::testing::*;
    use crate::pages::GENERIC_ERROR;

    #[tokio::test]
    async fn test_load_shows_every_field() {
        let (mut guard, _) = signed_in();
        let api = FakeApi::new(FakeMode::Ok);
        let mut detail = DetailPage::new(ResourceKind::Tour, "42".to_string());

        assert_eq!(detail.load(&mut guard, &api, now()).await, None);
        assert_eq!(api.calls(), 1);

        let fields = detail.fields();
        assert_eq!(fields.len(), ResourceKind::Tour.fields().len());
        assert!(fields.contains(&("Title", "Tour 42".to_string())));
        assert!(fields.contains(&("Description", "Sun & sea".to_string())));
        assert!(fields.contains(&("Featured", "Yes".to_string())));
        assert!(fields.contains(&("Duration", "-".to_string())));
    }

    #[tokio::test]
    async fn test_failure_keeps_generic_message() {
        let (mut guard, _) = signed_in();
        let api = FakeApi::new(FakeMode::ServerError);
        let mut detail = DetailPage::new(ResourceKind::Visa, "1".to_string());

        assert_eq!(detail.load(&mut guard, &api, now()).await, None);
        assert_eq!(detail.status().error(), Some(GENERIC_ERROR));
        assert!(detail.fields().is_empty());
    }

    #[test]
    fn test_edit_route_only_for_editable_kinds() {
        let tour = DetailPage::new(ResourceKind::Tour, "1".to_string());
        assert_eq!(tour.edit_route(), Some(Route::Edit(ResourceKind::Tour, "1".to_string())));
        let contact = DetailPage::new(ResourceKind::Contact, "1".to_string());
        assert_eq!(contact.edit_route(), None);
    }

    #[test]
    fn test_scroll_saturates() {
        let mut detail = DetailPage::new(ResourceKind::Blog, "1".to_string());
        detail.scroll_up();
        assert_eq!(detail.scroll(), 0);
        detail.scroll_down();
        detail.scroll_down();
        assert_eq!(detail.scroll(), 2);
    }
}
