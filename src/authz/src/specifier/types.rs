/// Specifier type definitions and validation
///
/// Turns the textual declaration mini-language (`(ro)Group`,
/// `Group (search)`, `(nosearch)`) into tagged values.

use std::fmt;
use std::str::FromStr;

use crate::error::GroupResolutionError;
use crate::types::Tier;

/// Token limiting a specifier to search-tier grants
pub const SEARCH_TOKEN: &str = "(search)";

/// Token limiting a specifier to read-tier grants
pub const READ_ONLY_TOKEN: &str = "(ro)";

/// Flag token suppressing the search-snippet exception for a page
pub const NO_SEARCH_TOKEN: &str = "(nosearch)";

/// Characters that can never appear in a page title
const ILLEGAL_TITLE_CHARS: &[char] = &['[', ']', '{', '}', '|', '#', '<', '>'];

/// Maximum title length in bytes
const MAX_TITLE_BYTES: usize = 255;

/// Scope modifier attached to a specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScopeModifier {
    /// Full tier hierarchy
    #[default]
    Full,
    /// `(ro)`: write grants collapse to read
    ReadOnly,
    /// `(search)`: every grant collapses to search
    SearchOnly,
}

impl ScopeModifier {
    /// Highest tier a specifier with this modifier can grant
    pub fn cap(self) -> Tier {
        match self {
            Self::Full => Tier::Write,
            Self::ReadOnly => Tier::Read,
            Self::SearchOnly => Tier::Search,
        }
    }

    /// Restrict a group-page tier by this modifier. Never promotes.
    pub fn restrict(self, tier: Tier) -> Tier {
        tier.min(self.cap())
    }

    /// Split a leading or trailing modifier token off `raw`.
    ///
    /// `(search)` is checked before `(ro)`; at most one token is removed.
    pub fn split(raw: &str) -> (Self, &str) {
        for (token, modifier) in [
            (SEARCH_TOKEN, Self::SearchOnly),
            (READ_ONLY_TOKEN, Self::ReadOnly),
        ] {
            if let Some(rest) = raw.strip_prefix(token) {
                return (modifier, rest.trim());
            }
            if let Some(rest) = raw.strip_suffix(token) {
                return (modifier, rest.trim());
            }
        }

        (Self::Full, raw)
    }
}

impl fmt::Display for ScopeModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => Ok(()),
            Self::ReadOnly => f.write_str(READ_ONLY_TOKEN),
            Self::SearchOnly => f.write_str(SEARCH_TOKEN),
        }
    }
}

/// Normalized page title
///
/// Underscores and runs of whitespace become single spaces and the first
/// character is upper-cased, so `group_pages/editors` and
/// `Group pages/editors` name the same page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Title {
    text: String,
}

impl Title {
    /// Parse and normalize a title reference
    pub fn new(raw: &str) -> Result<Self, GroupResolutionError> {
        let collapsed = raw
            .split(|c: char| c == '_' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if collapsed.is_empty() {
            return Err(GroupResolutionError::MalformedTitle(raw.to_string()));
        }

        if collapsed.len() > MAX_TITLE_BYTES
            || collapsed
                .chars()
                .any(|c| ILLEGAL_TITLE_CHARS.contains(&c) || c.is_control())
        {
            return Err(GroupResolutionError::MalformedTitle(raw.to_string()));
        }

        let mut chars = collapsed.chars();
        let text = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => collapsed,
        };

        Ok(Self { text })
    }

    /// Display text (spaces)
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Database key form (underscores)
    pub fn db_key(&self) -> String {
        self.text.replace(' ', "_")
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Title {
    type Err = GroupResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// One access-declaration entry: a group page title plus scope modifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Specifier {
    /// Original text, used as the resolution cache key
    raw: String,
    /// Referenced group page
    title: Title,
    /// Scope restriction
    modifier: ScopeModifier,
}

impl Specifier {
    /// Parse a raw specifier string
    ///
    /// # Examples
    ///
    /// ```
    /// use accesscontrol_authz::specifier::{ScopeModifier, Specifier};
    ///
    /// let spec = Specifier::new("(ro)Editors").unwrap();
    /// assert_eq!(spec.title().as_str(), "Editors");
    /// assert_eq!(spec.modifier(), ScopeModifier::ReadOnly);
    /// ```
    pub fn new(raw: &str) -> Result<Self, GroupResolutionError> {
        let (modifier, rest) = ScopeModifier::split(raw.trim());
        let title = Title::new(rest)?;

        Ok(Self {
            raw: raw.to_string(),
            title,
            modifier,
        })
    }

    /// Original specifier text
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Referenced group page
    pub fn title(&self) -> &Title {
        &self.title
    }

    /// Scope modifier
    pub fn modifier(&self) -> ScopeModifier {
        self.modifier
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.modifier, self.title)
    }
}

impl FromStr for Specifier {
    type Err = GroupResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A page's specifier list after flag extraction
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecifierList {
    /// Raw specifiers in declaration order, `(nosearch)` removed
    pub entries: Vec<String>,
    /// Whether a `(nosearch)` flag was present
    pub no_search: bool,
}

impl SpecifierList {
    /// Normalize a stored or rendered specifier list.
    ///
    /// A single entry holding a comma-separated list (legacy encoding) is
    /// split first. Blank entries are dropped.
    pub fn new<S: AsRef<str>>(raw: &[S]) -> Self {
        let expanded: Vec<String> = match raw {
            [single] if single.as_ref().contains(',') => single
                .as_ref()
                .split(',')
                .map(|part| part.trim().to_string())
                .collect(),
            _ => raw.iter().map(|s| s.as_ref().trim().to_string()).collect(),
        };

        let mut no_search = false;
        let entries = expanded
            .into_iter()
            .filter(|entry| {
                if entry == NO_SEARCH_TOKEN {
                    no_search = true;
                    false
                } else {
                    !entry.is_empty()
                }
            })
            .collect();

        Self { entries, no_search }
    }

    /// Whether no restricting specifier remains
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of restricting specifiers
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
