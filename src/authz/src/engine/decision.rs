//! Access decision types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::Tier;

/// Warning attached when search is denied on a page flagged `(nosearch)`
pub const WARNING_NO_SEARCH: &str = "accesscontrol-nosearch";

/// Message key shown to users on denial
pub const MESSAGE_ACTION_LIMITED: &str = "accesscontrol-actionlimited";

/// Access decision for one user, page and action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    /// Whether the action is allowed
    pub allowed: bool,

    /// Effective tier of the user on the page
    pub tier: Tier,

    /// Why the decision was made
    pub reason: DecisionReason,

    /// Warning codes for display
    #[serde(default)]
    pub warnings: BTreeSet<String>,

    /// Error codes for display
    #[serde(default)]
    pub errors: BTreeSet<String>,

    /// Specifiers the decision was evaluated against
    #[serde(default)]
    pub specifiers: Vec<String>,

    /// Specifiers that failed to resolve
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_specifiers: Vec<String>,
}

impl AccessDecision {
    /// Page carries no restriction
    pub fn unrestricted() -> Self {
        Self::new(true, Tier::Write, DecisionReason::Unrestricted)
    }

    /// Privileged user bypassed the restriction
    pub fn bypassed(specifiers: Vec<String>) -> Self {
        Self {
            specifiers,
            ..Self::new(true, Tier::Write, DecisionReason::PrivilegedBypass)
        }
    }

    /// Decision from tier arithmetic
    pub fn from_tier(tier: Tier, required: Tier, specifiers: Vec<String>) -> Self {
        let allowed = tier >= required;
        let reason = if allowed {
            DecisionReason::TierGranted { tier, required }
        } else {
            DecisionReason::TierInsufficient { tier, required }
        };

        Self {
            specifiers,
            ..Self::new(allowed, tier, reason)
        }
    }

    fn new(allowed: bool, tier: Tier, reason: DecisionReason) -> Self {
        Self {
            allowed,
            tier,
            reason,
            warnings: BTreeSet::new(),
            errors: BTreeSet::new(),
            specifiers: Vec::new(),
            failed_specifiers: Vec::new(),
        }
    }

    /// Attach a warning code
    pub fn with_warning(mut self, code: impl Into<String>) -> Self {
        self.warnings.insert(code.into());
        self
    }

    /// Attach an error code
    pub fn with_error(mut self, code: impl Into<String>) -> Self {
        self.errors.insert(code.into());
        self
    }

    /// Whether a warning code is attached
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.contains(code)
    }

    /// Message key and arguments for the permission-check call site.
    ///
    /// `None` when the action is allowed.
    pub fn denial_message(&self) -> Option<(String, Vec<String>)> {
        if self.allowed {
            return None;
        }

        Some((MESSAGE_ACTION_LIMITED.to_string(), self.specifiers.clone()))
    }

    /// Whether a search-result snippet may be shown.
    ///
    /// A denied search still shows the snippet when the site allows snippets
    /// for everyone, unless the page opted out with `(nosearch)`.
    pub fn snippet_visible(&self, allow_search_snippet_for_all: bool) -> bool {
        self.allowed || (allow_search_snippet_for_all && !self.has_warning(WARNING_NO_SEARCH))
    }
}

/// Reason for an access decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DecisionReason {
    /// No specifier restricts the page
    Unrestricted,

    /// Privileged user with bypass enabled
    PrivilegedBypass,

    /// Effective tier meets the action's requirement
    TierGranted { tier: Tier, required: Tier },

    /// Effective tier is below the action's requirement
    TierInsufficient { tier: Tier, required: Tier },
}
