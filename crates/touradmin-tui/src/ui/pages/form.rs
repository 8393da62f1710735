use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use touradmin_core::pages::{FormMode, FormPage, LoadStatus};
use touradmin_core::resources::{FieldKind, FieldSpec};

use crate::ui::styles;

use super::{content_block, render_message};

/// Input text as shown in the form. Multi-line values keep their breaks.
pub fn input_lines(spec: &FieldSpec, value: &str) -> Vec<String> {
    match spec.kind {
        FieldKind::Bool => {
            let mark = if value == "true" { "x" } else { " " };
            vec![format!("[{}]", mark)]
        }
        _ if spec.kind.is_multiline() => value.split('\n').map(str::to_string).collect(),
        _ => vec![value.to_string()],
    }
}

fn hint(spec: &FieldSpec) -> &'static str {
    match spec.kind {
        FieldKind::Image => "  (URL or local file path)",
        FieldKind::Date => "  (YYYY-MM-DD)",
        FieldKind::RichText => "  (HTML)",
        FieldKind::Bool => "  (space to toggle)",
        _ => "",
    }
}

pub fn render_form(frame: &mut Frame, page: &FormPage, area: Rect, focused: bool) {
    let kind = page.kind();
    let title = match page.mode() {
        FormMode::Create => format!(" Add {} ", kind.singular()),
        FormMode::Edit(_) => format!(" Edit {} ", kind.singular()),
    };
    let block = content_block(title, focused);

    match page.status() {
        LoadStatus::Loading => return render_message(frame, block, "Loading...", false, area),
        LoadStatus::Failed(msg) => return render_message(frame, block, msg, true, area),
        LoadStatus::Loaded => {}
    }

    let mut lines = Vec::new();
    let mut focus_line = 0u16;

    for (i, spec) in page.fields().iter().enumerate() {
        let is_focused = i == page.focus();
        if is_focused {
            focus_line = lines.len() as u16;
        }
        let required = if spec.required { "*" } else { "" };
        let label_style = if is_focused {
            styles::highlight_style()
        } else {
            styles::muted_style()
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {}{}", spec.label, required), label_style),
            Span::styled(hint(spec), styles::muted_style()),
        ]));

        let value_style = if is_focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let mut values = input_lines(spec, page.value(i));
        if is_focused && spec.kind != FieldKind::Bool {
            if let Some(last) = values.last_mut() {
                last.push('▌');
            }
        }
        for text in values {
            lines.push(Line::from(Span::styled(format!("   {}", text), value_style)));
        }
        lines.push(Line::from(""));
    }

    if page.is_submitting() {
        lines.push(Line::from(Span::styled(" Saving...", styles::muted_style())));
    } else if let Some(error) = page.error() {
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    // Keep the focused field in view
    let visible = area.height.saturating_sub(2);
    let scroll = focus_line.saturating_sub(visible / 2);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}
