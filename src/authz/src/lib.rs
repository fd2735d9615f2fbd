//! # Page Access Control
//!
//! Decides, per page and per user, whether a page may be edited, read,
//! shown as a search snippet, or not accessed at all. Pages restrict
//! themselves with access declarations naming group pages; group pages list
//! usernames and the tier each is granted.
//!
//! ## Features
//!
//! - **Typed specifiers**: `(ro)`, `(search)` and `(nosearch)` tokens are
//!   parsed into tagged values
//! - **Most-restrictive evaluation** across all declarations on a page
//! - **Fail-closed** handling of broken or missing group pages
//! - **Two-level restriction store**: LRU/TTL cache over a persistent record
//! - **Explicit invalidation** when group pages or restricted pages change
//! - **PostgreSQL backend** behind the `postgres` feature
//!
//! ## Example
//!
//! ```rust
//! use accesscontrol_authz::{
//!     AccessControl, AccessControlConfig, Action, DeclarationBag, User,
//!     group::InMemoryPageSource, render::StaticRenderer,
//!     store::InMemoryRestrictionBackend,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pages = Arc::new(InMemoryPageSource::new());
//!     pages.insert("Editors", "* Alice\n* Bob (ro)").await?;
//!
//!     let control = AccessControl::new(
//!         AccessControlConfig::default(),
//!         pages,
//!         Arc::new(InMemoryRestrictionBackend::new()),
//!         Arc::new(StaticRenderer::new()),
//!     );
//!
//!     let mut bag = DeclarationBag::new();
//!     bag.register("Editors");
//!     control.on_content_reprocessed(12, bag).await;
//!
//!     let decision = control.check(&User::named("Bob"), 12, &Action::new("edit")).await;
//!     assert!(!decision.allowed);
//!
//!     let decision = control.check(&User::named("Bob"), 12, &Action::new("view")).await;
//!     assert!(decision.allowed);
//!
//!     Ok(())
//! }
//! ```

pub mod types;
pub mod error;
pub mod config;
pub mod specifier;
pub mod group;
pub mod engine;
pub mod store;
pub mod render;
pub mod control;

// Re-export commonly used types
pub use types::{Action, PageId, Tier, User, WILDCARD_USER};
pub use error::{AuthzError, GroupResolutionError, Result};
pub use config::AccessControlConfig;
pub use specifier::{ScopeModifier, Specifier, SpecifierList, Title};
pub use group::{GroupClassification, GroupResolver, PageSource};
pub use engine::{AccessDecision, DecisionReason, EvaluatorConfig, PermissionEvaluator};
pub use store::{Restriction, RestrictionBackend, RestrictionStore, WriteOutcome};
pub use render::{DeclarationBag, DeclarationRenderer};
pub use control::AccessControl;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
