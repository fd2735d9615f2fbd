//! Group page content sources
//!
//! The host owns title resolution and page storage; the resolver only needs
//! "does this page exist, and what is its raw text".

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{AuthzError, Result};
use crate::specifier::Title;

/// Title/content resolution collaborator
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Raw content of the page, or `None` when the page does not exist
    async fn fetch(&self, title: &Title) -> Result<Option<String>>;
}

/// In-memory page source
pub struct InMemoryPageSource {
    pages: Arc<RwLock<HashMap<Title, String>>>,
    fetches: AtomicUsize,
}

impl InMemoryPageSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self {
            pages: Arc::new(RwLock::new(HashMap::new())),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Create or replace a page
    pub async fn insert(&self, title: &str, content: impl Into<String>) -> Result<()> {
        let title = Title::new(title).map_err(|_| AuthzError::MalformedTitle(title.to_string()))?;
        let mut pages = self.pages.write().await;
        pages.insert(title, content.into());
        Ok(())
    }

    /// Delete a page
    pub async fn remove(&self, title: &str) -> Result<()> {
        let title = Title::new(title).map_err(|_| AuthzError::MalformedTitle(title.to_string()))?;
        let mut pages = self.pages.write().await;
        pages.remove(&title);
        Ok(())
    }

    /// Number of `fetch` calls served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryPageSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageSource for InMemoryPageSource {
    async fn fetch(&self, title: &Title) -> Result<Option<String>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let pages = self.pages.read().await;
        Ok(pages.get(title).cloned())
    }
}

/// Page source reading `<root>/<Title_key>.txt` files
///
/// Subpage separators are escaped so that every title maps to a file
/// directly under `root`.
pub struct DirectoryPageSource {
    root: PathBuf,
}

impl DirectoryPageSource {
    /// Create a source rooted at `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// File backing `title`
    pub fn path_for(&self, title: &Title) -> PathBuf {
        let file_name = format!("{}.txt", title.db_key().replace('/', "%2F"));
        self.root.join(file_name)
    }
}

#[async_trait]
impl PageSource for DirectoryPageSource {
    async fn fetch(&self, title: &Title) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(title)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AuthzError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_source() {
        let source = InMemoryPageSource::new();
        source.insert("editors", "* Alice").await.unwrap();

        let title = Title::new("Editors").unwrap();
        assert_eq!(source.fetch(&title).await.unwrap().as_deref(), Some("* Alice"));
        assert_eq!(source.fetch_count(), 1);

        source.remove("Editors").await.unwrap();
        assert!(source.fetch(&title).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_directory_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Group_editors.txt"), "* Alice (ro)").unwrap();
        std::fs::write(dir.path().join("Team%2Fleads.txt"), "* Bob").unwrap();

        let source = DirectoryPageSource::new(dir.path());

        let title = Title::new("Group editors").unwrap();
        assert_eq!(source.fetch(&title).await.unwrap().as_deref(), Some("* Alice (ro)"));

        let subpage = Title::new("Team/leads").unwrap();
        assert_eq!(source.fetch(&subpage).await.unwrap().as_deref(), Some("* Bob"));

        let missing = Title::new("Nobody").unwrap();
        assert!(source.fetch(&missing).await.unwrap().is_none());
    }
}
