//! Error types for the access-control engine

use thiserror::Error;

/// Decision error code for a specifier whose title cannot be parsed
pub const CODE_INVALID_TITLE: &str = "accesscontrol-invalid-title";

/// Decision error code for a specifier naming a missing group page
pub const CODE_MISSING_GROUP: &str = "accesscontrol-missing-group";

/// Decision error code for a group page the source failed to load
pub const CODE_GROUP_UNAVAILABLE: &str = "accesscontrol-group-unavailable";

/// Decision error code when a page's restriction cannot be determined
pub const CODE_RESTRICTION_UNAVAILABLE: &str = "accesscontrol-restriction-unavailable";

/// Access-control engine errors
#[derive(Debug, Error)]
pub enum AuthzError {
    /// A specifier's referenced title cannot be parsed
    #[error("Malformed title: {0}")]
    MalformedTitle(String),

    /// The referenced group page does not exist
    #[error("Group page not found: {0}")]
    GroupPageNotFound(String),

    /// Backing store failed on read
    #[error("Store read failed: {0}")]
    StoreReadFailure(String),

    /// Backing store failed on write
    #[error("Store write failed: {0}")]
    StoreWriteFailure(String),

    /// Rendering collaborator failed
    #[error("Render failed: {0}")]
    RenderFailure(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON encoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for access-control operations
pub type Result<T> = std::result::Result<T, AuthzError>;

/// Failure resolving one specifier to its group classification.
///
/// Cloneable so that outcomes can be cached next to successful classifications.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupResolutionError {
    /// The specifier's title cannot be parsed
    #[error("Malformed title: {0}")]
    MalformedTitle(String),

    /// The referenced group page does not exist
    #[error("Group page not found: {0}")]
    GroupPageNotFound(String),

    /// The page source failed for another reason
    #[error("Group page unavailable: {0}")]
    Unavailable(String),
}

impl GroupResolutionError {
    /// Stable code attached to access decisions
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedTitle(_) => CODE_INVALID_TITLE,
            Self::GroupPageNotFound(_) => CODE_MISSING_GROUP,
            Self::Unavailable(_) => CODE_GROUP_UNAVAILABLE,
        }
    }

    /// Whether the outcome depends only on the page data and may be cached
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, Self::Unavailable(_))
    }
}

impl From<AuthzError> for GroupResolutionError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::MalformedTitle(title) => Self::MalformedTitle(title),
            AuthzError::GroupPageNotFound(title) => Self::GroupPageNotFound(title),
            other => Self::Unavailable(other.to_string()),
        }
    }
}
