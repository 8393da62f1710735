use chrono::Utc;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use touradmin_core::resources::ResourceKind;

use crate::app::App;
use crate::ui::styles;

use super::content_block;

pub fn render_dashboard(frame: &mut Frame, app: &App, area: Rect, focused: bool) {
    let now = Utc::now();
    let greeting = match &app.config.last_username {
        Some(name) => format!("  Welcome back, {}", name),
        None => "  Welcome back".to_string(),
    };
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(greeting, styles::title_style())),
        Line::from(""),
    ];

    if let (Some(expires_at), Some(left)) = (app.guard.expires_at(), app.guard.countdown_label(now)) {
        let local = expires_at.with_timezone(&chrono::Local);
        let style = if app.guard.is_expiring_soon(now) {
            styles::warning_style()
        } else {
            styles::muted_style()
        };
        lines.push(Line::from(Span::styled(
            format!("  Session valid until {} ({} left)", local.format("%H:%M:%S"), left),
            style,
        )));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(Span::styled("  Manage", styles::highlight_style())));
    for (i, kind) in ResourceKind::ALL.iter().enumerate() {
        let access = if kind.is_editable() { "" } else { "  (read only)" };
        lines.push(Line::from(vec![
            Span::styled(format!("    [{}] ", i + 1), styles::help_key_style()),
            Span::styled(kind.title(), styles::list_item_style()),
            Span::styled(access, styles::muted_style()),
        ]));
    }

    let block = content_block(" Dashboard ".to_string(), focused);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
