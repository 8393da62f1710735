//! Non-interactive commands: `--login`, `--logout`, `--list`.
//!
//! These run before the terminal is put into raw mode and share the same
//! session guard and API client as the TUI.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tracing::info;

use touradmin_core::api::{ApiClient, PageQuery, ResourceApi};
use touradmin_core::auth::SessionGuard;
use touradmin_core::config::{Config, PASSWORD_ENV, USERNAME_ENV};
use touradmin_core::pages::{guarded, PageOutcome};
use touradmin_core::resources::ResourceKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tui,
    Login,
    Logout,
    List { kind: ResourceKind, page: Option<u32> },
    Help,
}

pub const USAGE: &str = "\
Usage: touradmin [COMMAND]

Commands:
  (none)                      Start the terminal admin panel
  --login                     Sign in and store the session token
  --logout                    Remove the stored session token
  --list <resource> [page]    Print a resource collection as JSON
                              (sliders, blogs, tours, locations, visas, contacts)
  --help                      Show this message";

/// Parse the arguments after the program name
pub fn parse_args(args: &[String]) -> Result<Command> {
    let Some(first) = args.first() else {
        return Ok(Command::Tui);
    };
    match first.as_str() {
        "--login" => Ok(Command::Login),
        "--logout" => Ok(Command::Logout),
        "--help" | "-h" => Ok(Command::Help),
        "--list" => {
            let slug = args.get(1).context("--list needs a resource name")?;
            let kind = ResourceKind::from_slug(slug)
                .with_context(|| format!("Unknown resource '{}'", slug))?;
            let page = args
                .get(2)
                .map(|p| p.parse::<u32>().with_context(|| format!("Invalid page '{}'", p)))
                .transpose()?;
            if page == Some(0) {
                bail!("Pages start at 1");
            }
            Ok(Command::List { kind, page })
        }
        other => bail!("Unknown argument '{}'\n\n{}", other, USAGE),
    }
}

pub async fn login(mut config: Config) -> Result<()> {
    let api = ApiClient::new(&config)?;
    let mut guard = SessionGuard::new(config.token_store()?);

    let default_user = std::env::var(USERNAME_ENV)
        .ok()
        .or_else(|| config.last_username.clone());
    let username = prompt_username(default_user.as_deref())?;
    if username.is_empty() {
        bail!("Username required");
    }
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) => password,
        Err(_) => rpassword::prompt_password("Password: ")?,
    };

    let token = api
        .authenticate(&username, &password)
        .await
        .context("Login failed")?;
    guard.begin(&token, Utc::now())?;

    config.last_username = Some(username);
    config.save()?;

    if let Some(left) = guard.countdown_label(Utc::now()) {
        println!("Login successful! Session expires in {}.", left);
    }
    info!("CLI login complete");
    Ok(())
}

pub fn logout(config: &Config) -> Result<()> {
    let mut guard = SessionGuard::new(config.token_store()?);
    guard.logout();
    println!("Logged out.");
    Ok(())
}

pub async fn list(config: &Config, kind: ResourceKind, page: Option<u32>) -> Result<()> {
    let api = ApiClient::new(config)?;
    let mut guard = SessionGuard::new(config.token_store()?);

    let query = kind.is_paginated().then(|| PageQuery {
        page: page.unwrap_or(1),
        limit: config.effective_page_size(),
    });
    let outcome = guarded(&mut guard, Utc::now(), |token| {
        let api = &api;
        async move { api.list(&token, kind, query).await }
    })
    .await;

    match outcome {
        PageOutcome::Ready(data) => {
            let json = serde_json::to_string_pretty(&data.records)?;
            println!("{}", json);
            eprintln!(
                "{}: page {} of {}, {} total",
                kind.title(),
                data.page.max(1),
                data.total_pages.max(1),
                data.total
            );
            Ok(())
        }
        PageOutcome::Redirect(_) => {
            bail!("Not logged in or session expired. Run `touradmin --login` first.")
        }
        PageOutcome::Failed(msg) => bail!("{}", msg),
    }
}

fn prompt_username(default: Option<&str>) -> Result<String> {
    match default {
        Some(name) => print!("Username [{}]: ", name),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    let username = username.trim();
    Ok(match (username.is_empty(), default) {
        (true, Some(name)) => name.to_string(),
        _ => username.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_args_starts_tui() {
        assert_eq!(parse_args(&[]).unwrap(), Command::Tui);
    }

    #[test]
    fn test_session_commands() {
        assert_eq!(parse_args(&args(&["--login"])).unwrap(), Command::Login);
        assert_eq!(parse_args(&args(&["--logout"])).unwrap(), Command::Logout);
        assert_eq!(parse_args(&args(&["-h"])).unwrap(), Command::Help);
    }

    #[test]
    fn test_list_with_and_without_page() {
        assert_eq!(
            parse_args(&args(&["--list", "tours"])).unwrap(),
            Command::List {
                kind: ResourceKind::Tour,
                page: None
            }
        );
        assert_eq!(
            parse_args(&args(&["--list", "visas", "3"])).unwrap(),
            Command::List {
                kind: ResourceKind::Visa,
                page: Some(3)
            }
        );
    }

    #[test]
    fn test_list_rejects_bad_input() {
        assert!(parse_args(&args(&["--list"])).is_err());
        assert!(parse_args(&args(&["--list", "hotels"])).is_err());
        assert!(parse_args(&args(&["--list", "tours", "abc"])).is_err());
        assert!(parse_args(&args(&["--list", "tours", "0"])).is_err());
        assert!(parse_args(&args(&["--frobnicate"])).is_err());
    }
}
