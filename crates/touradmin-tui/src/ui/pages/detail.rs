use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use touradmin_core::pages::{DetailPage, LoadStatus};

use crate::ui::styles;

use super::{content_block, render_message};

pub fn render_detail(frame: &mut Frame, page: &DetailPage, area: Rect, focused: bool) {
    let kind = page.kind();
    let block = content_block(format!(" {} Details ", kind.singular()), focused);

    match page.status() {
        LoadStatus::Loading => return render_message(frame, block, "Loading...", false, area),
        LoadStatus::Failed(msg) => return render_message(frame, block, msg, true, area),
        LoadStatus::Loaded => {}
    }

    let mut lines = Vec::new();
    for (label, value) in page.fields() {
        lines.push(Line::from(Span::styled(format!(" {}", label), styles::highlight_style())));
        for text in value.lines() {
            lines.push(Line::from(Span::styled(format!("   {}", text), styles::list_item_style())));
        }
        lines.push(Line::from(""));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((page.scroll(), 0));
    frame.render_widget(paragraph, area);
}
