//! Access-control context
//!
//! Owns every cache the engine uses so that nothing lives in process-wide
//! statics. The host creates one [`AccessControl`] per request (or per
//! worker) and routes page checks and content events through it.

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AccessControlConfig;
use crate::engine::{AccessDecision, PermissionEvaluator};
use crate::error::CODE_RESTRICTION_UNAVAILABLE;
use crate::group::{GroupResolver, PageSource};
use crate::render::{DeclarationBag, DeclarationRenderer};
use crate::specifier::Title;
use crate::store::{RestrictionBackend, RestrictionStore, WriteOutcome};
use crate::types::{Action, PageId, Tier, User};

/// Access-control entry point for one host context
///
/// # Architecture
///
/// ```text
/// check → RestrictionStore → PermissionEvaluator → GroupResolver → PageSource
///             ↓        ↓
///        [LRU+TTL]  RestrictionBackend / DeclarationRenderer
/// ```
pub struct AccessControl {
    evaluator: PermissionEvaluator,
    store: RestrictionStore,
    config: AccessControlConfig,
}

impl AccessControl {
    /// Wire the engine to its collaborators
    pub fn new(
        config: AccessControlConfig,
        pages: Arc<dyn PageSource>,
        backend: Arc<dyn RestrictionBackend>,
        renderer: Arc<dyn DeclarationRenderer>,
    ) -> Self {
        let resolver = Arc::new(GroupResolver::with_ttl(pages, config.group_ttl()));
        let evaluator = PermissionEvaluator::new(resolver, config.evaluator());
        let store = RestrictionStore::new(backend, renderer, config.page_cache());

        info!(
            "AccessControl initialized with admin_bypass={}, snippets_for_all={}",
            config.admin_bypass, config.allow_search_snippet_for_all
        );

        Self {
            evaluator,
            store,
            config,
        }
    }

    /// Check `user` performing `action` on a stored page.
    ///
    /// When the page's restriction cannot be determined at all the check
    /// fails closed.
    pub async fn check(&self, user: &User, page_id: PageId, action: &Action) -> AccessDecision {
        match self.store.get(page_id).await {
            Ok(restriction) => {
                self.evaluator
                    .evaluate(user, restriction.as_deref(), action)
                    .await
            }
            Err(e) => {
                warn!("Restriction for page {} unavailable, denying: {}", page_id, e);
                AccessDecision::from_tier(Tier::None, action.required_tier(), Vec::new())
                    .with_error(CODE_RESTRICTION_UNAVAILABLE)
            }
        }
    }

    /// Check against the declarations of the render pass in progress
    pub async fn check_rendered(
        &self,
        user: &User,
        bag: &DeclarationBag,
        action: &Action,
    ) -> AccessDecision {
        self.evaluator
            .evaluate(user, Some(bag.specifiers()), action)
            .await
    }

    /// Whether a search result snippet for `page_id` may be shown to `user`
    pub async fn search_snippet_visible(&self, user: &User, page_id: PageId) -> bool {
        self.check(user, page_id, &Action::new(Action::SEARCH))
            .await
            .snippet_visible(self.config.allow_search_snippet_for_all)
    }

    /// Persist the declarations found when `page_id` was reprocessed
    pub async fn on_content_reprocessed(&self, page_id: PageId, bag: DeclarationBag) -> WriteOutcome {
        self.store.put(page_id, bag.into_restriction()).await
    }

    /// Drop cached state derived from an edited page.
    ///
    /// The page's own restriction is forgotten, and if it is a group page
    /// every classification built from it is dropped as well.
    pub async fn on_page_edited(&self, page_id: PageId, title: &str) {
        self.store.invalidate(page_id).await;

        match Title::new(title) {
            Ok(title) => {
                self.evaluator.resolver().invalidate_title(&title);
            }
            Err(e) => warn!("Edited page has unusable title '{}': {}", title, e),
        }
    }

    /// Permission evaluator
    pub fn evaluator(&self) -> &PermissionEvaluator {
        &self.evaluator
    }

    /// Group resolver
    pub fn resolver(&self) -> &Arc<GroupResolver> {
        self.evaluator.resolver()
    }

    /// Restriction store
    pub fn store(&self) -> &RestrictionStore {
        &self.store
    }

    /// Active configuration
    pub fn config(&self) -> &AccessControlConfig {
        &self.config
    }
}
