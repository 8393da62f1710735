//! Content-pane renderers, one per page kind.

pub mod dashboard;
pub mod detail;
pub mod form;
pub mod list;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::styles;

/// Placeholder pane while a request is in flight or after it failed
pub(crate) fn render_message(frame: &mut Frame, block: Block, message: &str, is_error: bool, area: Rect) {
    let style = if is_error {
        styles::error_style()
    } else {
        styles::muted_style()
    };
    let mut lines = vec![Line::from(""), Line::from(Span::styled(format!("  {}", message), style))];
    if is_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("  Press [r] to retry", styles::muted_style())));
    }
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

pub(crate) fn content_block(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused))
}
