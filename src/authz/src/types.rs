//! Core access-control types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable page identity. `0` denotes a page that has not been created yet.
pub type PageId = u64;

/// Username that matches everyone, anonymous visitors included
pub const WILDCARD_USER: &str = "*";

/// Access tier, ordered from no access to full edit access.
///
/// Higher tiers imply every capability of the lower ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// No access at all
    None,
    /// Search snippets only
    Search,
    /// Read-only
    Read,
    /// Full edit access
    Write,
}

impl Tier {
    /// Tier granted by a group-page entry token (`(search)`, `(ro)` or nothing)
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("(search)") => Tier::Search,
            Some("(ro)") => Tier::Read,
            _ => Tier::Write,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::None => "none",
            Tier::Search => "search",
            Tier::Read => "read",
            Tier::Write => "write",
        };
        f.write_str(name)
    }
}

/// Requesting user as exposed by the host session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identity string (username)
    pub name: String,

    /// Whether the visitor is logged out
    #[serde(default)]
    pub anonymous: bool,

    /// Group memberships, consulted only for the privileged bypass
    #[serde(default)]
    pub groups: BTreeSet<String>,
}

impl User {
    /// Create a logged-in user
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            anonymous: false,
            groups: BTreeSet::new(),
        }
    }

    /// Create an anonymous visitor
    pub fn anonymous() -> Self {
        Self {
            name: String::new(),
            anonymous: true,
            groups: BTreeSet::new(),
        }
    }

    /// Add a group membership
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.insert(group.into());
        self
    }

    /// Whether the user is a member of `group`
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    /// Name used when matching group-page entries
    pub fn match_name(&self) -> &str {
        if self.anonymous {
            WILDCARD_USER
        } else {
            &self.name
        }
    }
}

/// Action being performed on a page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    /// Action name (view, read, search, edit, move, ...)
    pub name: String,
}

impl Action {
    pub const SEARCH: &'static str = "search";
    pub const VIEW: &'static str = "view";
    pub const READ: &'static str = "read";

    /// Create a new action
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Showing the page in search results
    pub fn is_search(&self) -> bool {
        self.name == Self::SEARCH
    }

    /// Reading the page content
    pub fn is_read(&self) -> bool {
        self.name == Self::VIEW || self.name == Self::READ
    }

    /// Minimum tier this action requires
    pub fn required_tier(&self) -> Tier {
        if self.is_search() {
            Tier::Search
        } else if self.is_read() {
            Tier::Read
        } else {
            Tier::Write
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::None < Tier::Search);
        assert!(Tier::Search < Tier::Read);
        assert!(Tier::Read < Tier::Write);
        assert_eq!(Tier::Write.min(Tier::Read), Tier::Read);
    }

    #[test]
    fn test_tier_from_token() {
        assert_eq!(Tier::from_token(Some("(search)")), Tier::Search);
        assert_eq!(Tier::from_token(Some("(ro)")), Tier::Read);
        assert_eq!(Tier::from_token(None), Tier::Write);
    }

    #[test]
    fn test_user_match_name() {
        assert_eq!(User::anonymous().match_name(), "*");

        let alice = User::named("Alice").with_group("sysop");
        assert_eq!(alice.match_name(), "Alice");
        assert!(alice.in_group("sysop"));
        assert!(!alice.in_group("bureaucrat"));
    }

    #[test]
    fn test_action_required_tier() {
        assert_eq!(Action::new("search").required_tier(), Tier::Search);
        assert_eq!(Action::new("view").required_tier(), Tier::Read);
        assert_eq!(Action::new("read").required_tier(), Tier::Read);
        assert_eq!(Action::new("edit").required_tier(), Tier::Write);
        assert_eq!(Action::new("move").required_tier(), Tier::Write);
    }
}
