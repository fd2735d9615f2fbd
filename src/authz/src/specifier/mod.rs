/// Access declaration parsing
///
/// Parses raw specifier strings into typed [`Specifier`] values and group
/// pages into tier-classified member maps.
///
/// # Examples
///
/// ```
/// use accesscontrol_authz::specifier::{ScopeModifier, Specifier, SpecifierList};
///
/// let list = SpecifierList::new(&["Editors, (ro)Reviewers, (nosearch)"]);
/// assert_eq!(list.entries, vec!["Editors", "(ro)Reviewers"]);
/// assert!(list.no_search);
///
/// let spec = Specifier::new("Reviewers (search)").unwrap();
/// assert_eq!(spec.modifier(), ScopeModifier::SearchOnly);
/// ```

mod types;
mod parser;


pub use types::{
    ScopeModifier, Specifier, SpecifierList, Title,
    NO_SEARCH_TOKEN, READ_ONLY_TOKEN, SEARCH_TOKEN,
};
pub use parser::parse_group_page;
