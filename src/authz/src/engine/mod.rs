//! Permission evaluation
//!
//! Combines a page's specifier list with the requesting user and action.
//! Each specifier is resolved to a group classification; the user's
//! effective tier is the lowest tier granted across all specifiers.

pub mod decision;
pub mod metrics;

pub use decision::{AccessDecision, DecisionReason, MESSAGE_ACTION_LIMITED, WARNING_NO_SEARCH};
pub use metrics::{EvaluatorMetrics, MetricsCollector};

use crate::group::GroupResolver;
use crate::specifier::SpecifierList;
use crate::types::{Action, Tier, User};

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Evaluator configuration
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Let members of `privileged_group` bypass every restriction
    pub admin_bypass: bool,

    /// Group whose members bypass restrictions
    pub privileged_group: String,

    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            admin_bypass: true,
            privileged_group: "sysop".to_string(),
            enable_metrics: true,
        }
    }
}

/// Running tier flags across specifiers
///
/// Each flag starts `true` and can only be cleared. A lower flag is kept
/// alive by the flag above it, so the final state equals "every specifier
/// grants at least this tier".
#[derive(Debug, Clone, Copy)]
struct TierAccumulator {
    full: bool,
    read: bool,
    search: bool,
}

impl TierAccumulator {
    fn new() -> Self {
        Self {
            full: true,
            read: true,
            search: true,
        }
    }

    fn apply(&mut self, granted: Tier) {
        self.full = self.full && granted >= Tier::Write;
        self.read = self.full || (self.read && granted >= Tier::Read);
        self.search = self.read || (self.search && granted >= Tier::Search);
    }

    fn tier(&self) -> Tier {
        if self.full {
            Tier::Write
        } else if self.read {
            Tier::Read
        } else if self.search {
            Tier::Search
        } else {
            Tier::None
        }
    }
}

/// Permission evaluator
///
/// # Pipeline
///
/// 1. Normalize the specifier list (legacy comma split, `(nosearch)` flag)
/// 2. Unrestricted pages and privileged users are allowed outright
/// 3. Resolve each specifier; failures grant nothing and are reported
/// 4. Fold tiers, most restrictive specifier wins
/// 5. Compare against the action's required tier
pub struct PermissionEvaluator {
    /// Group resolution with caching
    resolver: Arc<GroupResolver>,

    /// Evaluator configuration
    config: EvaluatorConfig,

    /// Metrics collector
    metrics: Option<Arc<MetricsCollector>>,
}

impl PermissionEvaluator {
    /// Create an evaluator over a shared resolver
    pub fn new(resolver: Arc<GroupResolver>, config: EvaluatorConfig) -> Self {
        let metrics = if config.enable_metrics {
            Some(Arc::new(MetricsCollector::new()))
        } else {
            None
        };

        Self {
            resolver,
            config,
            metrics,
        }
    }

    /// Evaluate `user` performing `action` on a page restricted by `specifiers`.
    ///
    /// `None` or an empty list means the page is unrestricted.
    pub async fn evaluate(
        &self,
        user: &User,
        specifiers: Option<&[String]>,
        action: &Action,
    ) -> AccessDecision {
        let start = Instant::now();
        let decision = self.evaluate_inner(user, specifiers, action).await;

        if let Some(metrics) = &self.metrics {
            metrics.record_decision(decision.allowed, start.elapsed()).await;
        }

        debug!(
            "Decision for user={} action={}: {} (tier={})",
            user.match_name(),
            action,
            if decision.allowed { "ALLOW" } else { "DENY" },
            decision.tier
        );

        decision
    }

    async fn evaluate_inner(
        &self,
        user: &User,
        specifiers: Option<&[String]>,
        action: &Action,
    ) -> AccessDecision {
        let list = match specifiers {
            Some(raw) if !raw.is_empty() => SpecifierList::new(raw),
            _ => return self.unrestricted().await,
        };

        if list.is_empty() {
            return self.unrestricted().await;
        }

        if self.config.admin_bypass && user.in_group(&self.config.privileged_group) {
            debug!("Privileged bypass for '{}'", user.name);
            if let Some(metrics) = &self.metrics {
                metrics.record_bypass().await;
            }
            return AccessDecision::bypassed(list.entries);
        }

        let mut accumulator = TierAccumulator::new();
        let mut errors = Vec::new();
        let mut failed = Vec::new();

        for raw in &list.entries {
            let granted = match self.resolver.resolve(raw).await {
                Ok(classification) => classification.tier_for(user),
                Err(e) => {
                    warn!("Specifier '{}' failed to resolve: {}", raw, e);
                    if let Some(metrics) = &self.metrics {
                        metrics.record_resolution_error().await;
                    }
                    errors.push(e.code());
                    failed.push(raw.clone());
                    Tier::None
                }
            };

            debug!("Specifier '{}' grants {} to '{}'", raw, granted, user.match_name());
            accumulator.apply(granted);
        }

        let tier = accumulator.tier();
        let required = action.required_tier();
        let mut decision = AccessDecision::from_tier(tier, required, list.entries);

        for code in errors {
            decision = decision.with_error(code);
        }
        decision.failed_specifiers = failed;

        if !decision.allowed && action.is_search() && list.no_search {
            decision = decision.with_warning(WARNING_NO_SEARCH);
        }

        decision
    }

    async fn unrestricted(&self) -> AccessDecision {
        if let Some(metrics) = &self.metrics {
            metrics.record_unrestricted().await;
        }
        AccessDecision::unrestricted()
    }

    /// Shared resolver
    pub fn resolver(&self) -> &Arc<GroupResolver> {
        &self.resolver
    }

    /// Evaluator configuration
    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Get evaluator metrics
    pub async fn get_metrics(&self) -> Option<EvaluatorMetrics> {
        match &self.metrics {
            Some(metrics) => Some(metrics.get_metrics().await),
            None => None,
        }
    }
}
