//! Group page resolution
//!
//! A group page enumerates usernames and the tier each is granted. The
//! [`GroupResolver`] turns a specifier into a [`GroupClassification`] and
//! caches the outcome for a bounded time.

mod source;
mod resolver;

pub use source::{DirectoryPageSource, InMemoryPageSource, PageSource};
pub use resolver::{
    CacheStats, GroupClassification, GroupResolver, Resolution, DEFAULT_GROUP_TTL,
};
