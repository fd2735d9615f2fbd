//! Restriction store tests
//!
//! Read path (cache → replica → cold render), write path idempotence and
//! the degraded paths when the backend fails.

use accesscontrol_authz::{
    render::StaticRenderer,
    store::{InMemoryRestrictionBackend, StoreConfig},
    DeclarationBag, RestrictionStore, WriteOutcome,
};
use std::sync::Arc;
use std::time::Duration;

fn store_over(
    backend: &Arc<InMemoryRestrictionBackend>,
    renderer: &Arc<StaticRenderer>,
    config: StoreConfig,
) -> RestrictionStore {
    RestrictionStore::new(backend.clone(), renderer.clone(), config)
}

fn specs(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// WRITE THEN READ
// ============================================================================

#[tokio::test]
async fn test_put_then_get_from_fresh_store() {
    let backend = Arc::new(InMemoryRestrictionBackend::new());
    let renderer = Arc::new(StaticRenderer::new());

    let writer = store_over(&backend, &renderer, StoreConfig::default());
    let outcome = writer.put(7, Some(specs(&["Editors", "(ro)Reviewers"]))).await;
    assert_eq!(outcome, WriteOutcome::Persisted);

    // Separate process: empty cache, record served by the backend
    let reader = store_over(&backend, &renderer, StoreConfig::default());
    let restriction = reader.get(7).await.unwrap();
    assert_eq!(restriction, Some(specs(&["Editors", "(ro)Reviewers"])));
    assert_eq!(renderer.render_count(), 0);
}

#[tokio::test]
async fn test_put_none_reads_back_unrestricted() {
    let backend = Arc::new(InMemoryRestrictionBackend::new());
    let renderer = Arc::new(StaticRenderer::new());

    let writer = store_over(&backend, &renderer, StoreConfig::default());
    writer.put(3, None).await;
    assert_eq!(backend.raw(3).await, Some(None));

    let reader = store_over(&backend, &renderer, StoreConfig::default());
    assert_eq!(reader.get(3).await.unwrap(), None);
    assert_eq!(renderer.render_count(), 0);
}

#[tokio::test]
async fn test_empty_list_is_stored_as_unrestricted() {
    let backend = Arc::new(InMemoryRestrictionBackend::new());
    let renderer = Arc::new(StaticRenderer::new());
    let store = store_over(&backend, &renderer, StoreConfig::default());

    store.put(4, Some(Vec::new())).await;
    assert_eq!(backend.raw(4).await, Some(None));
    assert_eq!(store.get(4).await.unwrap(), None);
}

#[tokio::test]
async fn test_overwrite_replaces_record() {
    let backend = Arc::new(InMemoryRestrictionBackend::new());
    let renderer = Arc::new(StaticRenderer::new());
    let store = store_over(&backend, &renderer, StoreConfig::default());

    store.put(9, Some(specs(&["Editors"]))).await;
    store.put(9, Some(specs(&["Admins"]))).await;

    assert_eq!(store.get(9).await.unwrap(), Some(specs(&["Admins"])));
    assert_eq!(backend.write_count(), 2);
}

// ============================================================================
// IDEMPOTENCE
// ============================================================================

#[tokio::test]
async fn test_repeated_put_writes_once() {
    let backend = Arc::new(InMemoryRestrictionBackend::new());
    let renderer = Arc::new(StaticRenderer::new());
    let store = store_over(&backend, &renderer, StoreConfig::default());

    assert_eq!(store.put(5, Some(specs(&["Editors"]))).await, WriteOutcome::Persisted);
    assert_eq!(store.put(5, Some(specs(&["Editors"]))).await, WriteOutcome::Unchanged);
    assert_eq!(store.put(5, Some(specs(&["Editors"]))).await, WriteOutcome::Unchanged);

    assert_eq!(backend.write_count(), 1);

    let stats = store.stats().await;
    assert_eq!(stats.writes, 1);
    assert_eq!(stats.unchanged_writes, 2);
}

#[tokio::test]
async fn test_page_zero_is_never_stored() {
    let backend = Arc::new(InMemoryRestrictionBackend::new());
    let renderer = Arc::new(StaticRenderer::new());
    let store = store_over(&backend, &renderer, StoreConfig::default());

    assert_eq!(store.put(0, Some(specs(&["Editors"]))).await, WriteOutcome::Skipped);
    assert_eq!(store.get(0).await.unwrap(), None);
    assert_eq!(backend.write_count(), 0);
    assert_eq!(backend.read_count(), 0);
}

// ============================================================================
// COLD PATH
// ============================================================================

#[tokio::test]
async fn test_missing_record_renders_without_persisting() {
    let backend = Arc::new(InMemoryRestrictionBackend::new());
    let renderer = Arc::new(StaticRenderer::new());

    let bag: DeclarationBag = ["Editors"].into_iter().collect();
    renderer.set_page(11, bag).await;

    let store = store_over(&backend, &renderer, StoreConfig::default());
    assert_eq!(store.get(11).await.unwrap(), Some(specs(&["Editors"])));
    assert_eq!(renderer.render_count(), 1);
    assert_eq!(backend.write_count(), 0);
    assert_eq!(backend.raw(11).await, None);

    // Second read served from cache
    store.get(11).await.unwrap();
    assert_eq!(renderer.render_count(), 1);

    let stats = store.stats().await;
    assert_eq!(stats.cold_renders, 1);
    assert_eq!(stats.hits, 1);
}

#[tokio::test]
async fn test_put_after_cold_read_persists() {
    let backend = Arc::new(InMemoryRestrictionBackend::new());
    let renderer = Arc::new(StaticRenderer::new());
    renderer.set_page(14, ["Editors"].into_iter().collect()).await;

    let store = store_over(&backend, &renderer, StoreConfig::default());
    assert_eq!(store.get(14).await.unwrap(), Some(specs(&["Editors"])));

    // Rendered value is cached but has no record behind it yet
    assert_eq!(store.put(14, Some(specs(&["Editors"]))).await, WriteOutcome::Persisted);
    assert_eq!(backend.write_count(), 1);
    assert_eq!(backend.raw(14).await, Some(Some(r#"["Editors"]"#.to_string())));

    assert_eq!(store.put(14, Some(specs(&["Editors"]))).await, WriteOutcome::Unchanged);
    assert_eq!(backend.write_count(), 1);
}

#[tokio::test]
async fn test_put_after_backend_read_is_unchanged() {
    let backend = Arc::new(InMemoryRestrictionBackend::new());
    let renderer = Arc::new(StaticRenderer::new());
    backend.insert_raw(15, Some(r#"["Editors"]"#)).await;

    let store = store_over(&backend, &renderer, StoreConfig::default());
    store.get(15).await.unwrap();

    assert_eq!(store.put(15, Some(specs(&["Editors"]))).await, WriteOutcome::Unchanged);
    assert_eq!(backend.write_count(), 0);
}

#[tokio::test]
async fn test_read_failure_falls_back_to_render() {
    let backend = Arc::new(InMemoryRestrictionBackend::new());
    let renderer = Arc::new(StaticRenderer::new());

    backend.insert_raw(12, Some(r#"["Stale"]"#)).await;
    renderer.set_page(12, ["Fresh"].into_iter().collect()).await;
    backend.set_fail_reads(true);

    let store = store_over(&backend, &renderer, StoreConfig::default());
    assert_eq!(store.get(12).await.unwrap(), Some(specs(&["Fresh"])));
    assert_eq!(store.stats().await.read_failures, 1);
    assert_eq!(backend.raw(12).await, Some(Some(r#"["Stale"]"#.to_string())));
}

#[tokio::test]
async fn test_undecodable_record_falls_back_to_render() {
    let backend = Arc::new(InMemoryRestrictionBackend::new());
    let renderer = Arc::new(StaticRenderer::new());

    backend.insert_raw(13, Some("{not json")).await;
    renderer.set_page(13, ["Editors"].into_iter().collect()).await;

    let store = store_over(&backend, &renderer, StoreConfig::default());
    assert_eq!(store.get(13).await.unwrap(), Some(specs(&["Editors"])));
    assert_eq!(renderer.render_count(), 1);
}

// ============================================================================
// WRITE FAILURE
// ============================================================================

#[tokio::test]
async fn test_failed_write_is_retried_on_next_put() {
    let backend = Arc::new(InMemoryRestrictionBackend::new());
    let renderer = Arc::new(StaticRenderer::new());
    let store = store_over(&backend, &renderer, StoreConfig::default());

    backend.set_fail_writes(true);
    assert_eq!(store.put(20, Some(specs(&["Editors"]))).await, WriteOutcome::Failed);
    assert_eq!(backend.raw(20).await, None);

    backend.set_fail_writes(false);
    assert_eq!(store.put(20, Some(specs(&["Editors"]))).await, WriteOutcome::Persisted);
    assert_eq!(backend.raw(20).await, Some(Some(r#"["Editors"]"#.to_string())));

    let stats = store.stats().await;
    assert_eq!(stats.write_failures, 1);
    assert_eq!(stats.writes, 1);
}

// ============================================================================
// EXPIRY AND INVALIDATION
// ============================================================================

#[tokio::test]
async fn test_cached_entry_expires() {
    let backend = Arc::new(InMemoryRestrictionBackend::new());
    let renderer = Arc::new(StaticRenderer::new());
    let config = StoreConfig {
        ttl: Duration::from_millis(50),
        ..Default::default()
    };
    let store = store_over(&backend, &renderer, config);

    backend.insert_raw(30, Some(r#"["Editors"]"#)).await;
    assert_eq!(store.get(30).await.unwrap(), Some(specs(&["Editors"])));

    // Another process rewrites the record
    backend.insert_raw(30, Some(r#"["Admins"]"#)).await;
    assert_eq!(store.get(30).await.unwrap(), Some(specs(&["Editors"])));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.get(30).await.unwrap(), Some(specs(&["Admins"])));
}

#[tokio::test]
async fn test_invalidate_forces_reload() {
    let backend = Arc::new(InMemoryRestrictionBackend::new());
    let renderer = Arc::new(StaticRenderer::new());
    let store = store_over(&backend, &renderer, StoreConfig::default());

    backend.insert_raw(31, Some(r#"["Editors"]"#)).await;
    store.get(31).await.unwrap();

    backend.insert_raw(31, None).await;
    store.invalidate(31).await;
    assert_eq!(store.get(31).await.unwrap(), None);
    assert_eq!(backend.read_count(), 2);
}

#[tokio::test]
async fn test_capacity_bounds_cache() {
    let backend = Arc::new(InMemoryRestrictionBackend::new());
    let renderer = Arc::new(StaticRenderer::new());
    let config = StoreConfig {
        capacity: 2,
        ..Default::default()
    };
    let store = store_over(&backend, &renderer, config);

    for page_id in 1..=5 {
        store.put(page_id, Some(specs(&["Editors"]))).await;
    }

    assert_eq!(store.stats().await.entries, 2);
}
