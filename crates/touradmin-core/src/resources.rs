//! Resource catalogue for the tourism backend.
//!
//! Each `ResourceKind` names one REST collection and describes how the admin
//! pages present it: the form fields, the list columns, whether it can be
//! edited, and whether the backend paginates it. Records themselves are
//! whatever flat JSON object the backend returns.

use serde_json::{Map, Value};

use crate::utils::{format_date, strip_html};

/// A backend record as fetched: a flat JSON object.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Slider,
    Blog,
    Tour,
    Location,
    Visa,
    Contact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextArea,
    /// HTML authored in the editor and rendered inline by the site
    RichText,
    Number,
    Bool,
    Date,
    /// Image URL; a local file path entered in the form is uploaded
    Image,
}

impl FieldKind {
    pub fn is_multiline(&self) -> bool {
        matches!(self, FieldKind::TextArea | FieldKind::RichText)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(name: &'static str, label: &'static str, kind: FieldKind, required: bool) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind,
        required,
    }
}

static SLIDER_FIELDS: [FieldSpec; 5] = [
    field("title", "Title", FieldKind::Text, true),
    field("subtitle", "Subtitle", FieldKind::Text, false),
    field("image", "Image", FieldKind::Image, true),
    field("link", "Link", FieldKind::Text, false),
    field("order", "Order", FieldKind::Number, false),
];

static BLOG_FIELDS: [FieldSpec; 7] = [
    field("title", "Title", FieldKind::Text, true),
    field("slug", "Slug", FieldKind::Text, false),
    field("author", "Author", FieldKind::Text, false),
    field("image", "Cover Image", FieldKind::Image, false),
    field("content", "Content", FieldKind::RichText, true),
    field("publishedAt", "Published", FieldKind::Date, false),
    field("isPublished", "Visible", FieldKind::Bool, false),
];

static TOUR_FIELDS: [FieldSpec; 8] = [
    field("title", "Title", FieldKind::Text, true),
    field("location", "Location", FieldKind::Text, true),
    field("price", "Price", FieldKind::Number, true),
    field("duration", "Duration", FieldKind::Text, false),
    field("image", "Image", FieldKind::Image, false),
    field("overview", "Overview", FieldKind::TextArea, false),
    field("description", "Description", FieldKind::RichText, false),
    field("featured", "Featured", FieldKind::Bool, false),
];

static LOCATION_FIELDS: [FieldSpec; 4] = [
    field("name", "Name", FieldKind::Text, true),
    field("country", "Country", FieldKind::Text, false),
    field("image", "Image", FieldKind::Image, false),
    field("description", "Description", FieldKind::RichText, false),
];

static VISA_FIELDS: [FieldSpec; 6] = [
    field("country", "Country", FieldKind::Text, true),
    field("visaType", "Visa Type", FieldKind::Text, true),
    field("processingTime", "Processing Time", FieldKind::Text, false),
    field("fee", "Fee", FieldKind::Number, false),
    field("image", "Flag / Image", FieldKind::Image, false),
    field("requirements", "Requirements", FieldKind::RichText, false),
];

static CONTACT_FIELDS: [FieldSpec; 6] = [
    field("name", "Name", FieldKind::Text, true),
    field("email", "Email", FieldKind::Text, true),
    field("phone", "Phone", FieldKind::Text, false),
    field("subject", "Subject", FieldKind::Text, false),
    field("message", "Message", FieldKind::TextArea, false),
    field("createdAt", "Received", FieldKind::Date, false),
];

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Slider,
        ResourceKind::Blog,
        ResourceKind::Tour,
        ResourceKind::Location,
        ResourceKind::Visa,
        ResourceKind::Contact,
    ];

    /// Plural display title, e.g. "Tours"
    pub fn title(&self) -> &'static str {
        match self {
            ResourceKind::Slider => "Sliders",
            ResourceKind::Blog => "Blogs",
            ResourceKind::Tour => "Tours",
            ResourceKind::Location => "Locations",
            ResourceKind::Visa => "Visas",
            ResourceKind::Contact => "Contacts",
        }
    }

    pub fn singular(&self) -> &'static str {
        match self {
            ResourceKind::Slider => "Slider",
            ResourceKind::Blog => "Blog",
            ResourceKind::Tour => "Tour",
            ResourceKind::Location => "Location",
            ResourceKind::Visa => "Visa",
            ResourceKind::Contact => "Contact",
        }
    }

    /// Collection name shared by the REST path and the route segment
    pub fn slug(&self) -> &'static str {
        match self {
            ResourceKind::Slider => "sliders",
            ResourceKind::Blog => "blogs",
            ResourceKind::Tour => "tours",
            ResourceKind::Location => "locations",
            ResourceKind::Visa => "visas",
            ResourceKind::Contact => "contacts",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }

    /// Contacts are visitor enquiries: list and view only.
    pub fn is_editable(&self) -> bool {
        !matches!(self, ResourceKind::Contact)
    }

    /// Whether the backend pages this collection (`?page=&limit=`)
    pub fn is_paginated(&self) -> bool {
        matches!(
            self,
            ResourceKind::Blog | ResourceKind::Tour | ResourceKind::Contact
        )
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            ResourceKind::Slider => &SLIDER_FIELDS,
            ResourceKind::Blog => &BLOG_FIELDS,
            ResourceKind::Tour => &TOUR_FIELDS,
            ResourceKind::Location => &LOCATION_FIELDS,
            ResourceKind::Visa => &VISA_FIELDS,
            ResourceKind::Contact => &CONTACT_FIELDS,
        }
    }

    /// Fields shown as table columns on the list page
    pub fn list_columns(&self) -> Vec<&'static FieldSpec> {
        let names: &[&str] = match self {
            ResourceKind::Slider => &["title", "subtitle", "order"],
            ResourceKind::Blog => &["title", "author", "publishedAt"],
            ResourceKind::Tour => &["title", "location", "price", "duration"],
            ResourceKind::Location => &["name", "country"],
            ResourceKind::Visa => &["country", "visaType", "processingTime", "fee"],
            ResourceKind::Contact => &["name", "email", "subject", "createdAt"],
        };
        self.fields()
            .iter()
            .filter(|spec| names.contains(&spec.name))
            .collect()
    }
}

/// Record id as the backend names it (`_id` or `id`, string or number)
pub fn record_id(record: &Record) -> Option<String> {
    ["_id", "id"].iter().find_map(|key| match record.get(*key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Raw editable text for a value, used to hydrate form inputs
pub fn value_to_input(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Human-readable rendering of one field of a record
pub fn display_field(record: &Record, spec: &FieldSpec) -> String {
    let value = match record.get(spec.name) {
        None | Some(Value::Null) => return "-".to_string(),
        Some(value) => value,
    };
    match (spec.kind, value) {
        (FieldKind::Bool, Value::Bool(b)) => (if *b { "Yes" } else { "No" }).to_string(),
        (FieldKind::RichText, Value::String(html)) => strip_html(html),
        (FieldKind::Date, Value::String(date)) => format_date(date),
        (_, Value::String(s)) if s.is_empty() => "-".to_string(),
        (_, other) => value_to_input(other),
    }
}
