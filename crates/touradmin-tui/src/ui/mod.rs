//! Terminal UI module using ratatui.
//!
//! This module provides the TUI rendering and input handling:
//!
//! - `render`: Frame layout, title bar, status bar and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color schemes and text styling
//! - `sidebar`: Grouped navigation panel
//! - `pages`: Page-specific content rendering (dashboard, list, detail, form)

pub mod input;
pub mod pages;
pub mod render;
pub mod sidebar;
pub mod styles;
