use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use touradmin_core::nav::{NavItem, NavState};

use crate::app::{App, Focus};

use super::styles;

/// Sidebar row text. Groups show an open/closed marker, entries are indented.
pub fn item_label(nav: &NavState, item: &NavItem) -> String {
    match item {
        NavItem::Group(group) => {
            let marker = if nav.is_open(group.key) { "▾" } else { "▸" };
            format!("{} {}", marker, group.title)
        }
        NavItem::Entry(entry) => format!("   {} {}", entry.icon, entry.label),
    }
}

pub fn render_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Sidebar;
    let active = app.nav.active_entry();

    let lines: Vec<Line> = app
        .sidebar_items()
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let is_active = matches!(item, NavItem::Entry(entry) if Some(*entry) == active);
            let mut style = match item {
                NavItem::Group(_) => styles::muted_style(),
                NavItem::Entry(_) if is_active => styles::active_style(),
                NavItem::Entry(_) => styles::list_item_style(),
            };
            if focused && i == app.sidebar_selection {
                style = style.patch(styles::selected_style());
            }
            Line::from(Span::styled(item_label(&app.nav, item), style))
        })
        .collect();

    let block = Block::default()
        .title(" Menu ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
