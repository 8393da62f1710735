use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use touradmin_core::pages::{ListPage, LoadStatus};
use touradmin_core::resources::{display_field, FieldKind, FieldSpec};
use touradmin_core::utils::truncate_string;

use crate::app::{App, AppState};
use crate::ui::styles;

use super::{content_block, render_message};

/// Cell text limit; wide HTML bodies otherwise swamp the table
const MAX_CELL_CHARS: usize = 48;

fn column_width(spec: &FieldSpec) -> Constraint {
    match spec.kind {
        FieldKind::Bool => Constraint::Length(5),
        FieldKind::Number => Constraint::Length(10),
        FieldKind::Date => Constraint::Length(13),
        _ => Constraint::Fill(1),
    }
}

pub fn render_list(frame: &mut Frame, app: &App, page: &ListPage, area: Rect, focused: bool) {
    let kind = page.kind();
    let (current, total_pages, total) = page.page_info();
    let title = if kind.is_paginated() {
        format!(" {} ({} total, page {}/{}) ", kind.title(), total, current, total_pages)
    } else {
        format!(" {} ({}) ", kind.title(), total)
    };
    let block = content_block(title, focused);

    match page.status() {
        LoadStatus::Loading => return render_message(frame, block, "Loading...", false, area),
        LoadStatus::Failed(msg) => return render_message(frame, block, msg, true, area),
        LoadStatus::Loaded => {}
    }

    let searching = matches!(app.state, AppState::Searching);
    let show_filter = searching || !page.filter().is_empty();
    let (table_area, filter_area) = if show_filter {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(area);
        (chunks[0], Some(chunks[1]))
    } else {
        (area, None)
    };

    let columns = kind.list_columns();
    let rows_data = page.rows();

    if rows_data.is_empty() {
        let message = if page.filter().is_empty() {
            format!("No {} yet", kind.title().to_lowercase())
        } else {
            "No matches".to_string()
        };
        render_message(frame, block, &message, false, table_area);
    } else {
        let header = Row::new(columns.iter().map(|spec| Cell::from(spec.label)))
            .style(styles::header_style())
            .height(1);

        let rows: Vec<Row> = rows_data
            .iter()
            .map(|record| {
                Row::new(columns.iter().map(|spec| {
                    Cell::from(truncate_string(&display_field(record, spec), MAX_CELL_CHARS))
                }))
                .style(styles::list_item_style())
            })
            .collect();

        let widths: Vec<Constraint> = columns.iter().map(|spec| column_width(spec)).collect();

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(styles::selected_style());

        let mut state = TableState::default();
        state.select(Some(page.selected()));
        frame.render_stateful_widget(table, table_area, &mut state);
    }

    if let Some(filter_area) = filter_area {
        let cursor = if searching { "▌" } else { "" };
        let line = Line::from(vec![
            Span::styled(" / ", styles::search_style()),
            Span::styled(format!("{}{}", page.filter(), cursor), styles::search_style()),
        ]);
        frame.render_widget(Paragraph::new(line), filter_area);
    }
}
