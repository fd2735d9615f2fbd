//! Rendering-pipeline integration
//!
//! While a page renders, each access declaration registers its specifiers
//! in a [`DeclarationBag`] scoped to that render pass. The host stores the
//! bag under [`DeclarationBag::EXTENSION_KEY`] in its render output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{AuthzError, Result};
use crate::types::PageId;

/// Specifiers collected during one render pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationBag {
    specifiers: Vec<String>,
}

impl DeclarationBag {
    /// Key under which the host keeps the bag in render output
    pub const EXTENSION_KEY: &'static str = "accesscontrol-tags";

    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one declaration's comma-separated specifier list.
    ///
    /// Returns the placeholder text shown in place of the declaration.
    pub fn register(&mut self, raw: &str) -> String {
        let added: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let text = placeholder(&added);
        self.specifiers.extend(added);
        text
    }

    /// Collected specifiers in declaration order
    pub fn specifiers(&self) -> &[String] {
        &self.specifiers
    }

    /// Whether no declaration was seen
    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty()
    }

    /// The page restriction this bag describes; `None` when unrestricted
    pub fn into_restriction(self) -> Option<Vec<String>> {
        if self.specifiers.is_empty() {
            None
        } else {
            Some(self.specifiers)
        }
    }

    /// Encode for the host's render-output extension data
    pub fn to_extension_data(&self) -> serde_json::Value {
        serde_json::Value::from(self.specifiers.clone())
    }

    /// Decode from the host's render-output extension data
    pub fn from_extension_data(value: Option<&serde_json::Value>) -> Result<Self> {
        match value {
            None | Some(serde_json::Value::Null) => Ok(Self::new()),
            Some(value) => Ok(Self {
                specifiers: serde_json::from_value(value.clone())?,
            }),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for DeclarationBag {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            specifiers: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Visible text replacing a declaration in rendered output
pub fn placeholder(specifiers: &[String]) -> String {
    format!("[access control: {}]", specifiers.join(", "))
}

/// Rendering collaborator used on the cold path
#[async_trait]
pub trait DeclarationRenderer: Send + Sync {
    /// Fully re-render `page_id` and return the declarations it carries
    async fn render_declarations(&self, page_id: PageId) -> Result<DeclarationBag>;
}

/// Renderer backed by a fixed page → declarations table
pub struct StaticRenderer {
    pages: Arc<RwLock<HashMap<PageId, DeclarationBag>>>,
    renders: AtomicUsize,
}

impl StaticRenderer {
    /// Create an empty renderer; unknown pages render without declarations
    pub fn new() -> Self {
        Self {
            pages: Arc::new(RwLock::new(HashMap::new())),
            renders: AtomicUsize::new(0),
        }
    }

    /// Set the declarations `page_id` renders with
    pub async fn set_page(&self, page_id: PageId, bag: DeclarationBag) {
        let mut pages = self.pages.write().await;
        pages.insert(page_id, bag);
    }

    /// Number of renders performed
    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::Relaxed)
    }
}

impl Default for StaticRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeclarationRenderer for StaticRenderer {
    async fn render_declarations(&self, page_id: PageId) -> Result<DeclarationBag> {
        self.renders.fetch_add(1, Ordering::Relaxed);
        if page_id == 0 {
            return Err(AuthzError::RenderFailure("page does not exist".to_string()));
        }

        let pages = self.pages.read().await;
        Ok(pages.get(&page_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_returns_placeholder() {
        let mut bag = DeclarationBag::new();

        let text = bag.register("Editors, (ro)Reviewers");
        assert_eq!(text, "[access control: Editors, (ro)Reviewers]");

        bag.register("(nosearch)");
        assert_eq!(bag.specifiers(), &["Editors", "(ro)Reviewers", "(nosearch)"]);
    }

    #[test]
    fn test_register_skips_blank_entries() {
        let mut bag = DeclarationBag::new();
        bag.register(" , ,");
        assert!(bag.is_empty());
        assert_eq!(bag.into_restriction(), None);
    }

    #[test]
    fn test_extension_data() {
        let bag: DeclarationBag = ["Editors", "(nosearch)"].into_iter().collect();
        let value = bag.to_extension_data();
        assert_eq!(value, serde_json::json!(["Editors", "(nosearch)"]));

        let decoded = DeclarationBag::from_extension_data(Some(&value)).unwrap();
        assert_eq!(decoded, bag);

        assert!(DeclarationBag::from_extension_data(None).unwrap().is_empty());
        assert!(DeclarationBag::from_extension_data(Some(&serde_json::json!(42))).is_err());
    }

    #[tokio::test]
    async fn test_static_renderer() {
        let renderer = StaticRenderer::new();
        renderer
            .set_page(7, ["Editors"].into_iter().collect())
            .await;

        let bag = renderer.render_declarations(7).await.unwrap();
        assert_eq!(bag.specifiers(), &["Editors"]);
        assert!(renderer.render_declarations(8).await.unwrap().is_empty());
        assert!(renderer.render_declarations(0).await.is_err());
        assert_eq!(renderer.render_count(), 3);
    }
}
