use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, Focus, LoginFocus, Page};

use super::pages::{dashboard, detail, form, list};
use super::{sidebar, styles};

/// Sidebar width including borders
const SIDEBAR_WIDTH: u16 = 24;

pub fn render(frame: &mut Frame, app: &App) {
    if matches!(app.page, Page::Login) {
        render_login(frame, app);
    } else {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Title bar
                Constraint::Min(10),   // Sidebar + content
                Constraint::Length(1), // Status bar
            ])
            .split(frame.area());

        render_title_bar(frame, app, chunks[0]);
        render_body(frame, app, chunks[1]);
        render_status_bar(frame, app, chunks[2]);
    }

    // Render overlays
    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("  Touradmin  ›  {}", app.route.title());
    let now = Utc::now();

    let (countdown, countdown_style) = match app.guard.countdown_label(now) {
        Some(left) if app.guard.is_expiring_soon(now) => {
            (format!("Session ends in {}", left), styles::warning_style())
        }
        Some(left) => (format!("Session {}", left), styles::muted_style()),
        None => (String::new(), styles::muted_style()),
    };
    let help_hint = "  [?] Help ";

    let used = title.chars().count() + countdown.chars().count() + help_hint.len();
    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat((area.width as usize).saturating_sub(used))),
        Span::styled(countdown, countdown_style),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_body(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(area);

    sidebar::render_sidebar(frame, app, chunks[0]);

    let focused = app.focus == Focus::Content;
    match &app.page {
        Page::Dashboard => dashboard::render_dashboard(frame, app, chunks[1], focused),
        Page::List(page) => list::render_list(frame, app, page, chunks[1], focused),
        Page::Detail(page) => detail::render_detail(frame, page, chunks[1], focused),
        Page::Form(page) => form::render_form(frame, page, chunks[1], focused),
        Page::Login => {}
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match (&app.page, app.focus) {
        (_, Focus::Sidebar) => "↑/↓ move | Enter open | Tab content | q quit",
        (Page::List(_), _) => "Enter view | e edit | a add | n/p page | / search | L logout",
        (Page::Detail(_), _) => "e edit | Esc back | r reload | L logout",
        (Page::Form(_), _) => "Tab next | Ctrl+S save | Esc cancel",
        _ => "1-6 open | Tab sidebar | L logout | q quit",
    };

    let left_text = match &app.status_message {
        Some(msg) => format!(" {} ", msg),
        None => format!(" {} ", app.api_base_url()),
    };
    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let left_style = if app.status_message.is_some() {
        styles::success_style()
    } else {
        styles::muted_style()
    };

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 28, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  Touradmin", styles::title_style())),
        Line::from(Span::styled(format!("  version {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("Tab", "Switch focus (sidebar ↔ content)"),
        help_line("↑/↓ j/k", "Move selection"),
        help_line("Enter", "Open entry / toggle group / view"),
        help_line("1-6", "Open a list from the dashboard"),
        help_line("Esc", "Go back"),
        Line::from(""),
        Line::from(Span::styled(" Lists", styles::highlight_style())),
        help_line("a / e", "Add / edit record"),
        help_line("n / p", "Next / previous page"),
        help_line("/", "Filter rows"),
        help_line("r", "Reload"),
        Line::from(""),
        Line::from(Span::styled(" Forms", styles::highlight_style())),
        help_line("Tab", "Next field"),
        help_line("Space", "Toggle yes/no fields"),
        help_line("Enter", "New line / next field / save"),
        help_line("Ctrl+S", "Save"),
        Line::from(""),
        help_line("L", "Log out"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(help_text).block(block);

    frame.render_widget(paragraph, area);
}

fn render_login(frame: &mut Frame, app: &App) {
    let extra = app.login_error.is_some() as u16 * 2 + app.login_notice.is_some() as u16 * 2;
    let area = centered_rect_fixed(56, 12 + extra, frame.area());

    let mut lines = vec![
        Line::from(Span::styled("  Touradmin", styles::title_style())),
        Line::from(Span::styled(
            format!("  {}", app.api_base_url()),
            styles::muted_style(),
        )),
        Line::from(""),
    ];

    if let Some(notice) = app.login_notice {
        lines.push(Line::from(Span::styled(
            format!("  {}", notice),
            styles::warning_style(),
        )));
        lines.push(Line::from(""));
    }

    let field_style = |focused: bool| {
        if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        }
    };

    // Username field
    let username_focused = app.login_focus == LoginFocus::Username;
    let cursor = if username_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("    "),
        Span::styled("Username: [", styles::muted_style()),
        Span::styled(
            format!("{:<28}{}", app.login_username, cursor),
            field_style(username_focused),
        ),
        Span::styled("]", styles::muted_style()),
    ]));

    // Password field
    let password_focused = app.login_focus == LoginFocus::Password;
    let masked = "*".repeat(app.login_password.chars().count().min(28));
    let cursor = if password_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("    "),
        Span::styled("Password: [", styles::muted_style()),
        Span::styled(format!("{:<28}{}", masked, cursor), field_style(password_focused)),
        Span::styled("]", styles::muted_style()),
    ]));

    // Login button
    let button_focused = app.login_focus == LoginFocus::Button;
    let label = if button_focused { " ▶ Login ◀ " } else { "   Login   " };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("                    ["),
        Span::styled(label, field_style(button_focused)),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .title(" Sign in ")
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}
