//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use touradmin_core::resources::ResourceKind;
use touradmin_core::routes::Route;

use crate::app::{can_add_password_char, can_add_username_char, App, AppState, Focus, LoginFocus, Page};

pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    if matches!(app.page, Page::Login) {
        return handle_login_input(app, key).await;
    }

    // Handle search mode
    if matches!(app.state, AppState::Searching) {
        handle_search_input(app, key);
        return Ok(false);
    }

    // Forms take every printable key while focused
    if matches!(app.page, Page::Form(_)) && app.focus == Focus::Content {
        handle_form_input(app, key);
        return Ok(false);
    }

    app.status_message = None;

    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('L') => {
            app.logout();
            return Ok(false);
        }
        KeyCode::Tab => {
            app.focus = match app.focus {
                Focus::Sidebar => Focus::Content,
                Focus::Content => Focus::Sidebar,
            };
            return Ok(false);
        }
        _ => {}
    }

    if app.focus == Focus::Sidebar {
        handle_sidebar_input(app, key);
        return Ok(false);
    }

    match app.page {
        Page::Dashboard => handle_dashboard_input(app, key),
        Page::List(_) => handle_list_input(app, key),
        Page::Detail(_) => handle_detail_input(app, key),
        Page::Login | Page::Form(_) => {}
    }
    Ok(false)
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    let Page::List(list) = &mut app.page else {
        app.state = AppState::Normal;
        return;
    };
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            list.clear_filter();
        }
        KeyCode::Enter => {
            // Keep the filter active
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => list.pop_filter_char(),
        KeyCode::Char(c) => list.push_filter_char(c),
        _ => {}
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Username,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Username,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => app.login_focus = LoginFocus::Password,
            // Enter in the password field submits, like a browser form
            LoginFocus::Password | LoginFocus::Button => app.attempt_login().await,
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if can_add_username_char(app.login_username.len(), c) {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.len(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

fn handle_sidebar_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.sidebar_next(),
        KeyCode::Char('k') | KeyCode::Up => app.sidebar_prev(),
        KeyCode::Enter | KeyCode::Char(' ') => app.sidebar_activate(),
        KeyCode::Char('l') | KeyCode::Right | KeyCode::Esc => app.focus = Focus::Content,
        _ => {}
    }
}

/// Dashboard shortcut: digits open the resource lists in sidebar order
pub fn dashboard_shortcut(c: char) -> Option<ResourceKind> {
    let index = c.to_digit(10)?.checked_sub(1)?;
    ResourceKind::ALL.get(index as usize).copied()
}

fn handle_dashboard_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('h') | KeyCode::Left => app.focus = Focus::Sidebar,
        KeyCode::Char(c) => {
            if let Some(kind) = dashboard_shortcut(c) {
                app.navigate(Route::List(kind));
            }
        }
        _ => {}
    }
}

fn handle_list_input(app: &mut App, key: KeyEvent) {
    let Page::List(list) = &mut app.page else {
        return;
    };

    let mut reload = false;
    let route = match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            list.select_next();
            None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            list.select_prev();
            None
        }
        KeyCode::Enter => list.view_route(),
        KeyCode::Char('e') => list.edit_route(),
        KeyCode::Char('a') => list.add_route(),
        KeyCode::Char('n') | KeyCode::Char(']') => {
            reload = list.next_page();
            None
        }
        KeyCode::Char('p') | KeyCode::Char('[') => {
            reload = list.prev_page();
            None
        }
        KeyCode::Char('/') => {
            app.state = AppState::Searching;
            None
        }
        KeyCode::Esc if !list.filter().is_empty() => {
            list.clear_filter();
            None
        }
        KeyCode::Char('r') => {
            reload = true;
            None
        }
        KeyCode::Char('h') | KeyCode::Left => {
            app.focus = Focus::Sidebar;
            None
        }
        _ => None,
    };

    if let Some(route) = route {
        app.navigate(route);
    } else if reload {
        app.reload();
    }
}

fn handle_detail_input(app: &mut App, key: KeyEvent) {
    let Page::Detail(detail) = &mut app.page else {
        return;
    };

    let mut reload = false;
    let route = match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            detail.scroll_down();
            None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            detail.scroll_up();
            None
        }
        KeyCode::Char('e') => detail.edit_route(),
        KeyCode::Esc | KeyCode::Backspace => Some(Route::List(detail.kind())),
        KeyCode::Char('r') => {
            reload = true;
            None
        }
        KeyCode::Char('h') | KeyCode::Left => {
            app.focus = Focus::Sidebar;
            None
        }
        _ => None,
    };

    if let Some(route) = route {
        app.navigate(route);
    } else if reload {
        app.reload();
    }
}

fn handle_form_input(app: &mut App, key: KeyEvent) {
    let Page::Form(form) = &mut app.page else {
        return;
    };

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('s') {
            app.submit_form();
        }
        return;
    }

    match key.code {
        KeyCode::Esc => {
            let kind = form.kind();
            app.navigate(Route::List(kind));
        }
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Enter => {
            if form.newline() {
                return;
            }
            if form.focus() + 1 >= form.fields().len() {
                app.submit_form();
            } else {
                form.focus_next();
            }
        }
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(c) => form.input_char(c),
        _ => {}
    }
}
