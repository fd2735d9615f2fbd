//! Group page parser
//!
//! Group pages are free text. Only bullet lines (`* Name`, `*Name (ro)`)
//! contribute entries; everything else is ignored. A bullet holding only a
//! tier token (`* (search)`) is an entry for the wildcard user.

use std::collections::BTreeMap;

use super::types::{READ_ONLY_TOKEN, SEARCH_TOKEN};
use crate::types::{Tier, WILDCARD_USER};

/// Marker starting an entry line
const ENTRY_MARKER: char = '*';

/// Parse a group page's raw text into a username → tier mapping.
///
/// A later line for the same username replaces an earlier one.
///
/// # Examples
///
/// ```
/// use accesscontrol_authz::specifier::parse_group_page;
/// use accesscontrol_authz::Tier;
///
/// let members = parse_group_page("Editors:\n* Alice\n* Bob (ro)\n* * (search)");
/// assert_eq!(members.get("Alice"), Some(&Tier::Write));
/// assert_eq!(members.get("Bob"), Some(&Tier::Read));
/// assert_eq!(members.get("*"), Some(&Tier::Search));
/// ```
pub fn parse_group_page(text: &str) -> BTreeMap<String, Tier> {
    let mut members = BTreeMap::new();

    for line in text.lines() {
        if let Some((name, tier)) = parse_entry(line) {
            members.insert(name, tier);
        }
    }

    members
}

/// Parse one line into a `(username, tier)` entry
fn parse_entry(line: &str) -> Option<(String, Tier)> {
    let body = line.trim().strip_prefix(ENTRY_MARKER)?.trim();

    let (name, token) = if let Some(name) = body.strip_suffix(SEARCH_TOKEN) {
        (name.trim(), Some(SEARCH_TOKEN))
    } else if let Some(name) = body.strip_suffix(READ_ONLY_TOKEN) {
        (name.trim(), Some(READ_ONLY_TOKEN))
    } else {
        (body, None)
    };

    // `* (search)` and `* (ro)` grant the wildcard user
    let name = match (name.is_empty(), token) {
        (false, _) => name,
        (true, Some(_)) => WILDCARD_USER,
        (true, None) => return None,
    };

    Some((name.to_string(), Tier::from_token(token)))
}
