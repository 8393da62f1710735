//! Add/edit form for one resource.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{FileUpload, ResourceApi, Submission};
use crate::auth::SessionGuard;
use crate::resources::{value_to_input, FieldKind, FieldSpec, Record, ResourceKind};
use crate::routes::Route;

use super::{guarded, next_ticket, LoadStatus, PageOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{0} must be a number")]
    InvalidNumber(&'static str),
}

#[derive(Debug, Clone)]
pub struct FormPage {
    kind: ResourceKind,
    mode: FormMode,
    values: Vec<String>,
    /// Values as loaded, so unchanged image URLs are not re-uploaded
    original: Vec<String>,
    focus: usize,
    status: LoadStatus,
    error: Option<String>,
    submitting: bool,
    pending: Option<u64>,
}

impl FormPage {
    pub fn create(kind: ResourceKind) -> Self {
        Self::with_mode(kind, FormMode::Create, LoadStatus::Loaded)
    }

    /// Edit form; `load` fetches the record and hydrates the inputs
    pub fn edit(kind: ResourceKind, id: String) -> Self {
        Self::with_mode(kind, FormMode::Edit(id), LoadStatus::Loading)
    }

    fn with_mode(kind: ResourceKind, mode: FormMode, status: LoadStatus) -> Self {
        let values: Vec<String> = kind
            .fields()
            .iter()
            .map(|spec| match spec.kind {
                FieldKind::Bool => "false".to_string(),
                _ => String::new(),
            })
            .collect();
        Self {
            kind,
            mode,
            original: values.clone(),
            values,
            focus: 0,
            status,
            error: None,
            submitting: false,
            pending: None,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.kind.fields()
    }

    pub fn value(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focused_field(&self) -> Option<&'static FieldSpec> {
        self.fields().get(self.focus)
    }

    pub fn route(&self) -> Route {
        match &self.mode {
            FormMode::Create => Route::Add(self.kind),
            FormMode::Edit(id) => Route::Edit(self.kind, id.clone()),
        }
    }

    /// Fill the inputs from a fetched record
    pub fn hydrate(&mut self, record: &Record) {
        for (value, spec) in self.values.iter_mut().zip(self.kind.fields()) {
            *value = match (spec.kind, record.get(spec.name)) {
                (FieldKind::Bool, Some(Value::Bool(b))) => b.to_string(),
                (FieldKind::Bool, Some(Value::String(s))) => (s == "true").to_string(),
                (FieldKind::Bool, _) => "false".to_string(),
                (_, Some(v)) => value_to_input(v),
                (_, None) => String::new(),
            };
        }
        self.original = self.values.clone();
    }

    pub fn focus_next(&mut self) {
        if self.focus + 1 < self.values.len() {
            self.focus += 1;
        }
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.saturating_sub(1);
    }

    pub fn input_char(&mut self, c: char) {
        let Some(spec) = self.focused_field() else {
            return;
        };
        if spec.kind == FieldKind::Bool {
            if c == ' ' {
                self.toggle_bool();
            }
            return;
        }
        if let Some(value) = self.values.get_mut(self.focus) {
            value.push(c);
            self.error = None;
        }
    }

    pub fn backspace(&mut self) {
        if self.focused_field().map(|s| s.kind) == Some(FieldKind::Bool) {
            return;
        }
        if let Some(value) = self.values.get_mut(self.focus) {
            value.pop();
        }
    }

    /// Line break, only in multi-line fields. Returns whether one was added.
    pub fn newline(&mut self) -> bool {
        match self.focused_field() {
            Some(spec) if spec.kind.is_multiline() => {
                if let Some(value) = self.values.get_mut(self.focus) {
                    value.push('\n');
                }
                true
            }
            _ => false,
        }
    }

    pub fn toggle_bool(&mut self) {
        if self.focused_field().map(|s| s.kind) != Some(FieldKind::Bool) {
            return;
        }
        if let Some(value) = self.values.get_mut(self.focus) {
            *value = (value != "true").to_string();
        }
    }

    /// Required fields must be non-blank and number fields must parse.
    pub fn validate(&self) -> Result<(), FormError> {
        for (spec, value) in self.kind.fields().iter().zip(&self.values) {
            let value = value.trim();
            if spec.required && value.is_empty() {
                return Err(FormError::Required(spec.label));
            }
            if spec.kind == FieldKind::Number && !value.is_empty() && parse_number(value).is_none() {
                return Err(FormError::InvalidNumber(spec.label));
            }
        }
        Ok(())
    }

    /// Body for the create/update request. Multipart when an image field
    /// holds a newly entered local file path.
    pub fn submission(&self) -> Result<Submission, FormError> {
        self.validate()?;

        let specs = self.kind.fields();
        let uploads: Vec<FileUpload> = specs
            .iter()
            .enumerate()
            .filter(|(i, spec)| spec.kind == FieldKind::Image && self.is_new_file(*i))
            .map(|(i, spec)| FileUpload {
                field: spec.name.to_string(),
                path: PathBuf::from(self.values[i].trim()),
            })
            .collect();

        if uploads.is_empty() {
            let mut record = Record::new();
            for (spec, value) in specs.iter().zip(&self.values) {
                record.insert(spec.name.to_string(), json_value(spec, value));
            }
            return Ok(Submission::Json(record));
        }

        let fields = specs
            .iter()
            .zip(&self.values)
            .filter(|(spec, _)| !uploads.iter().any(|u| u.field == spec.name))
            .filter(|(spec, value)| !(spec.kind == FieldKind::Number && value.trim().is_empty()))
            .map(|(spec, value)| (spec.name.to_string(), text_value(spec, value)))
            .collect();

        Ok(Submission::Multipart {
            fields,
            files: uploads,
        })
    }

    /// Validate and mark a submit as in flight. `None` when a submit is
    /// already running or validation failed (the message is in `error`).
    pub fn begin_submit(&mut self) -> Option<(u64, Submission)> {
        if self.submitting || self.status.is_loading() {
            return None;
        }
        match self.submission() {
            Ok(body) => {
                let ticket = next_ticket();
                self.pending = Some(ticket);
                self.submitting = true;
                self.error = None;
                Some((ticket, body))
            }
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }

    /// Success returns to the resource list; failure stays on the form.
    pub fn finish_submit(&mut self, ticket: u64, outcome: PageOutcome<Record>) -> Option<Route> {
        if !self.accepts(ticket) {
            debug!(kind = self.kind.slug(), ticket, "Discarding stale save response");
            return None;
        }
        self.pending = None;
        self.submitting = false;
        match outcome {
            PageOutcome::Ready(_) => Some(Route::List(self.kind)),
            PageOutcome::Redirect(route) => Some(route),
            PageOutcome::Failed(msg) => {
                warn!(kind = self.kind.slug(), "Save failed, staying on form");
                self.error = Some(msg);
                None
            }
        }
    }

    pub async fn submit(
        &mut self,
        guard: &mut SessionGuard,
        api: &dyn ResourceApi,
        now: DateTime<Utc>,
    ) -> Option<Route> {
        let (ticket, body) = self.begin_submit()?;
        let kind = self.kind;
        let mode = self.mode.clone();
        let outcome = guarded(guard, now, |token| async move {
            match mode {
                FormMode::Create => api.create(&token, kind, body).await,
                FormMode::Edit(id) => api.update(&token, kind, &id, body).await,
            }
        })
        .await;
        self.finish_submit(ticket, outcome)
    }

    /// Start fetching the record being edited. `None` in create mode.
    pub fn start_load(&mut self) -> Option<(u64, String)> {
        let FormMode::Edit(id) = &self.mode else {
            return None;
        };
        let id = id.clone();
        let ticket = next_ticket();
        self.pending = Some(ticket);
        self.status = LoadStatus::Loading;
        Some((ticket, id))
    }

    pub fn accepts(&self, ticket: u64) -> bool {
        self.pending == Some(ticket)
    }

    pub fn apply_load(&mut self, ticket: u64, outcome: PageOutcome<Record>) -> Option<Route> {
        if !self.accepts(ticket) {
            debug!(kind = self.kind.slug(), ticket, "Discarding stale record response");
            return None;
        }
        self.pending = None;
        match outcome {
            PageOutcome::Ready(record) => {
                self.hydrate(&record);
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

    /// Edit mode fetch. Create mode still runs the session check.
    pub async fn load(
        &mut self,
        guard: &mut SessionGuard,
        api: &dyn ResourceApi,
        now: DateTime<Utc>,
    ) -> Option<Route> {
        let Some((ticket, id)) = self.start_load() else {
            return guard.mount(now).err();
        };
        let kind = self.kind;
        let outcome = guarded(guard, now, |token| async move {
            api.fetch(&token, kind, &id).await
        })
        .await;
        self.apply_load(ticket, outcome)
    }

    fn is_new_file(&self, index: usize) -> bool {
        let value = self.values[index].trim();
        !value.is_empty() && value != self.original[index].trim() && !is_remote(value)
    }
}

fn is_remote(value: &str) -> bool {
    ["http://", "https://", "data:"]
        .iter()
        .any(|scheme| value.starts_with(scheme))
}

fn parse_number(value: &str) -> Option<Number> {
    if let Ok(n) = value.parse::<i64>() {
        return Some(Number::from(n));
    }
    value.parse::<f64>().ok().and_then(Number::from_f64)
}

fn json_value(spec: &FieldSpec, value: &str) -> Value {
    let trimmed = value.trim();
    match spec.kind {
        FieldKind::Bool => Value::Bool(trimmed == "true"),
        FieldKind::Number => parse_number(trimmed).map(Value::Number).unwrap_or(Value::Null),
        FieldKind::TextArea | FieldKind::RichText => Value::String(value.to_string()),
        _ => Value::String(trimmed.to_string()),
    }
}

fn text_value(spec: &FieldSpec, value: &str) -> String {
    match spec.kind {
        FieldKind::TextArea | FieldKind::RichText => value.to_string(),
        _ => value.trim().to_string(),
    }
}
