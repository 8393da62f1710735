//! Sidebar navigation: fixed groups of entries with per-group open state.

use std::collections::HashMap;

use crate::routes::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavEntry {
    pub path: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

impl NavEntry {
    /// Active on the entry's own path or any path below it.
    pub fn is_active(&self, route: &str) -> bool {
        route == self.path
            || route
                .strip_prefix(self.path)
                .map(|rest| rest.starts_with('/'))
                .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavGroup {
    pub title: &'static str,
    pub key: &'static str,
    pub entries: &'static [NavEntry],
}

impl NavGroup {
    /// Whether navigating to `route` opens this group
    pub fn matches_route(&self, route: &str) -> bool {
        self.entries.iter().any(|entry| route.starts_with(entry.path))
    }
}

const fn entry(path: &'static str, label: &'static str, icon: &'static str) -> NavEntry {
    NavEntry { path, label, icon }
}

pub static NAV_GROUPS: [NavGroup; 4] = [
    NavGroup {
        title: "Home",
        key: "home",
        entries: &[entry("/dashboard", "Dashboard", "⌂")],
    },
    NavGroup {
        title: "Content",
        key: "content",
        entries: &[
            entry("/sliders", "Sliders", "▣"),
            entry("/blogs", "Blogs", "✎"),
        ],
    },
    NavGroup {
        title: "Travel",
        key: "travel",
        entries: &[
            entry("/tours", "Tours", "✈"),
            entry("/locations", "Locations", "◉"),
            entry("/visas", "Visas", "▤"),
        ],
    },
    NavGroup {
        title: "Inbox",
        key: "inbox",
        entries: &[entry("/contacts", "Contacts", "✉")],
    },
];

/// One row of the rendered sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavItem {
    Group(&'static NavGroup),
    Entry(&'static NavEntry),
}

/// Open/active state of the sidebar for one app run.
///
/// Navigation opens every group matching the new route and never closes
/// the others. A manual toggle flips a group's stored state regardless of
/// the current route.
#[derive(Debug, Clone)]
pub struct NavState {
    groups: &'static [NavGroup],
    open: HashMap<&'static str, bool>,
    current: String,
}

impl Default for NavState {
    fn default() -> Self {
        Self::new()
    }
}

impl NavState {
    pub fn new() -> Self {
        Self::with_groups(&NAV_GROUPS)
    }

    pub fn with_groups(groups: &'static [NavGroup]) -> Self {
        Self {
            groups,
            open: HashMap::new(),
            current: String::new(),
        }
    }

    pub fn groups(&self) -> &'static [NavGroup] {
        self.groups
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn on_route_change(&mut self, route: &Route) {
        self.current = route.path();
        for group in self.groups {
            if group.matches_route(&self.current) {
                self.open.insert(group.key, true);
            }
        }
    }

    /// Flip a group's open state. Returns the new state.
    pub fn toggle(&mut self, key: &str) -> bool {
        let Some(group) = self.groups.iter().find(|g| g.key == key) else {
            return false;
        };
        let open = self.open.entry(group.key).or_insert(false);
        *open = !*open;
        *open
    }

    pub fn is_open(&self, key: &str) -> bool {
        self.open.get(key).copied().unwrap_or(false)
    }

    pub fn active_entry(&self) -> Option<&'static NavEntry> {
        self.groups
            .iter()
            .flat_map(|group| group.entries.iter())
            .find(|entry| entry.is_active(&self.current))
    }

    /// Group headers plus the entries of open groups, in display order
    pub fn visible_items(&self) -> Vec<NavItem> {
        let mut items = Vec::new();
        for group in self.groups {
            items.push(NavItem::Group(group));
            if self.is_open(group.key) {
                items.extend(group.entries.iter().map(NavItem::Entry));
            }
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceKind;

    #[test]
    fn test_entry_active_on_exact_and_sub_paths() {
        let tours = entry("/tours", "Tours", "");
        assert!(tours.is_active("/tours"));
        assert!(tours.is_active("/tours/add"));
        assert!(tours.is_active("/tours/edit/42"));
        assert!(!tours.is_active("/toursearch"));
        assert!(!tours.is_active("/tour"));
        assert!(!tours.is_active("/blogs"));
    }

    #[test]
    fn test_route_change_opens_matching_group() {
        let mut nav = NavState::new();
        assert!(!nav.is_open("travel"));

        nav.on_route_change(&Route::Edit(ResourceKind::Tour, "1".to_string()));
        assert!(nav.is_open("travel"));
        assert!(!nav.is_open("content"));
        assert_eq!(nav.active_entry().map(|e| e.label), Some("Tours"));
    }

    #[test]
    fn test_route_change_never_closes_other_groups() {
        let mut nav = NavState::new();
        nav.on_route_change(&Route::List(ResourceKind::Blog));
        nav.on_route_change(&Route::List(ResourceKind::Visa));
        assert!(nav.is_open("content"));
        assert!(nav.is_open("travel"));
        assert_eq!(nav.active_entry().map(|e| e.label), Some("Visas"));
    }

    #[test]
    fn test_toggle_is_independent_of_route() {
        let mut nav = NavState::new();
        nav.on_route_change(&Route::List(ResourceKind::Location));

        // Closing the group holding the active route is allowed
        assert!(!nav.toggle("travel"));
        assert!(!nav.is_open("travel"));
        assert!(nav.toggle("travel"));

        assert!(nav.toggle("inbox"));
        assert!(nav.is_open("inbox"));
        assert!(!nav.toggle("inbox"));

        assert!(!nav.toggle("missing"));
    }

    #[test]
    fn test_navigation_reopens_toggled_group() {
        let mut nav = NavState::new();
        nav.on_route_change(&Route::List(ResourceKind::Tour));
        nav.toggle("travel");
        nav.on_route_change(&Route::Add(ResourceKind::Tour));
        assert!(nav.is_open("travel"));
    }

    #[test]
    fn test_visible_items_follow_open_state() {
        let mut nav = NavState::new();
        assert_eq!(nav.visible_items().len(), NAV_GROUPS.len());

        nav.toggle("content");
        let items = nav.visible_items();
        assert_eq!(items.len(), NAV_GROUPS.len() + 2);
        assert!(matches!(items[1], NavItem::Group(g) if g.key == "content"));
        assert!(matches!(items[2], NavItem::Entry(e) if e.path == "/sliders"));
    }

    #[test]
    fn test_every_resource_has_an_entry() {
        for kind in ResourceKind::ALL {
            let path = Route::List(kind).path();
            assert!(
                NAV_GROUPS
                    .iter()
                    .any(|g| g.entries.iter().any(|e| e.path == path)),
                "{} missing from sidebar",
                path
            );
        }
    }
}
