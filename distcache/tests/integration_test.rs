//! Integration tests for distcache

use distcache::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Profile {
    id: u64,
    name: String,
    roles: Vec<String>,
    manager: Option<Box<Profile>>,
}

fn alice() -> Profile {
    Profile {
        id: 1,
        name: "Alice".into(),
        roles: vec!["admin".into(), "ops".into()],
        manager: Some(Box::new(Profile {
            id: 9,
            name: "Grace".into(),
            ..Default::default()
        })),
    }
}

fn memory_cache(nodes: usize) -> (CacheManager<InMemoryProvider>, Arc<InMemoryProvider>) {
    let provider = Arc::new(InMemoryProvider::with_nodes(nodes));
    let cache = CacheManager::new(CacheConfig::new("memory://test"), provider.clone()).unwrap();
    (cache, provider)
}

#[test]
fn test_construction_fails_fast_without_connection_string() {
    let result = CacheManager::new(CacheConfig::new(""), Arc::new(InMemoryProvider::new()));
    assert!(matches!(result, Err(CacheError::Config(_))));
}

#[tokio::test]
async fn test_unset_key_reads_as_absent() {
    let (cache, _) = memory_cache(1);

    assert_eq!(cache.get::<Profile>("user:404").await.unwrap(), None);
    assert_eq!(cache.get_or_default::<Profile>("user:404").await.unwrap(), Profile::default());
    assert_eq!(cache.get_or_default::<i64>("counter").await.unwrap(), 0);
    assert!(!cache.is_set("user:404").await.unwrap());
}

#[tokio::test]
async fn test_set_then_get_round_trips() {
    let (cache, _) = memory_cache(1);

    cache.set("user:1:profile", &alice(), 10).await.unwrap();

    assert!(cache.is_set("user:1:profile").await.unwrap());
    assert_eq!(cache.get::<Profile>("user:1:profile").await.unwrap(), Some(alice()));

    cache.set("greeting", "héllo", 1).await.unwrap();
    assert_eq!(cache.get::<String>("greeting").await.unwrap().as_deref(), Some("héllo"));
}

#[tokio::test]
async fn test_overwrite_replaces_value() {
    let (cache, _) = memory_cache(1);

    cache.set("n", &1, 5).await.unwrap();
    cache.set("n", &2, 5).await.unwrap();
    assert_eq!(cache.get::<i32>("n").await.unwrap(), Some(2));
}

#[tokio::test]
async fn test_null_set_keeps_prior_state() {
    let (cache, _) = memory_cache(1);

    cache.set("user:1:profile", &None::<Profile>, 5).await.unwrap();
    assert!(!cache.is_set("user:1:profile").await.unwrap());

    cache.set("user:1:profile", &alice(), 5).await.unwrap();
    cache.set("user:1:profile", &None::<Profile>, 5).await.unwrap();
    assert_eq!(cache.get::<Profile>("user:1:profile").await.unwrap(), Some(alice()));
}

#[tokio::test]
async fn test_wrong_type_is_a_deserialization_error() {
    let (cache, _) = memory_cache(1);

    cache.set("user:1:profile", &alice(), 5).await.unwrap();
    let result = cache.get::<Vec<u32>>("user:1:profile").await;
    assert!(matches!(result, Err(CacheError::Deserialization(_))));
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let (cache, _) = memory_cache(1);

    cache.set("session:abc", &"token", 5).await.unwrap();
    cache.remove("session:abc").await.unwrap();
    assert!(!cache.is_set("session:abc").await.unwrap());

    cache.remove("session:abc").await.unwrap();
    cache.remove("never-set").await.unwrap();
    assert!(!cache.is_set("never-set").await.unwrap());
}

#[tokio::test]
async fn test_remove_by_pattern_on_every_node() {
    for nodes in [1, 3] {
        let (cache, _) = memory_cache(nodes);

        cache.set("user:1:profile", &alice(), 5).await.unwrap();
        cache.set("user:1:session", &"abc", 5).await.unwrap();
        cache.set("order:1", &17, 5).await.unwrap();

        let deleted = cache.remove_by_pattern("user:1").await.unwrap();

        assert_eq!(deleted, 2, "nodes = {}", nodes);
        assert!(!cache.is_set("user:1:profile").await.unwrap());
        assert!(!cache.is_set("user:1:session").await.unwrap());
        assert!(cache.is_set("order:1").await.unwrap());
    }
}

#[tokio::test]
async fn test_remove_by_pattern_is_substring_and_case_sensitive() {
    let (cache, _) = memory_cache(2);

    cache.set("app:user:1:x", &1, 5).await.unwrap();
    cache.set("USER:1:y", &1, 5).await.unwrap();
    cache.set("user:10", &1, 5).await.unwrap();

    cache.remove_by_pattern("user:1").await.unwrap();

    assert!(!cache.is_set("app:user:1:x").await.unwrap());
    assert!(!cache.is_set("user:10").await.unwrap());
    assert!(cache.is_set("USER:1:y").await.unwrap());
}

#[tokio::test]
async fn test_remove_by_pattern_treats_glob_characters_literally() {
    let (cache, _) = memory_cache(1);

    cache.set("report[2024]", &1, 5).await.unwrap();
    cache.set("report2", &1, 5).await.unwrap();
    cache.set("a*b", &1, 5).await.unwrap();
    cache.set("axb", &1, 5).await.unwrap();

    assert_eq!(cache.remove_by_pattern("[2024]").await.unwrap(), 1);
    assert_eq!(cache.remove_by_pattern("*").await.unwrap(), 1);

    assert!(cache.is_set("report2").await.unwrap());
    assert!(cache.is_set("axb").await.unwrap());
    assert!(!cache.is_set("report[2024]").await.unwrap());
    assert!(!cache.is_set("a*b").await.unwrap());
}

#[tokio::test]
async fn test_clear_removes_everything_across_nodes() {
    let (cache, provider) = memory_cache(4);

    let keys: Vec<String> = (0..40).map(|i| format!("item:{}", i)).collect();
    for key in &keys {
        cache.set(key, &key.len(), 5).await.unwrap();
    }
    assert_eq!(provider.len().await, 40);

    assert_eq!(cache.clear().await.unwrap(), 40);

    for key in &keys {
        assert!(!cache.is_set(key).await.unwrap());
    }
    assert!(provider.is_empty().await);
    assert_eq!(cache.clear().await.unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_entry_expires_after_ttl() {
    let (cache, _) = memory_cache(1);

    cache.set("user:1:profile", &alice(), 1).await.unwrap();
    assert_eq!(cache.ttl("user:1:profile").await.unwrap(), Some(Duration::from_secs(60)));

    tokio::time::advance(Duration::from_secs(59)).await;
    assert!(cache.is_set("user:1:profile").await.unwrap());

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(!cache.is_set("user:1:profile").await.unwrap());
    assert_eq!(cache.get::<Profile>("user:1:profile").await.unwrap(), None);
    assert_eq!(cache.ttl("user:1:profile").await.unwrap(), None);
}

#[tokio::test]
async fn test_get_or_set_computes_once() {
    let (cache, _) = memory_cache(1);
    let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));

    for _ in 0..3 {
        let calls = calls.clone();
        let value = cache
            .get_or_set("expensive", 5, || async move {
                calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(alice())
            })
            .await
            .unwrap();
        assert_eq!(value, alice());
    }

    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_get_or_set_does_not_cache_factory_errors() {
    let (cache, _) = memory_cache(1);

    let result = cache
        .get_or_set::<u32, _, _>("flaky", 5, || async {
            Err(CacheError::Connection("upstream down".into()))
        })
        .await;
    assert!(result.is_err());
    assert!(!cache.is_set("flaky").await.unwrap());
}

#[tokio::test]
async fn test_set_default_uses_configured_ttl() {
    let provider = Arc::new(InMemoryProvider::new());
    let config = CacheConfig::new("memory://").with_default_ttl_minutes(15);
    let cache = CacheManager::new(config, provider).unwrap();

    cache.set_default("k", &true).await.unwrap();
    let ttl = cache.ttl("k").await.unwrap().unwrap();
    assert!(ttl <= Duration::from_secs(15 * 60));
    assert!(ttl > Duration::from_secs(14 * 60));
}

#[tokio::test]
async fn test_managers_share_one_provider() {
    let provider = Arc::new(InMemoryProvider::new());
    let writer = CacheManager::new(CacheConfig::new("memory://"), provider.clone()).unwrap();
    let reader = CacheManager::new(CacheConfig::new("memory://"), provider.clone()).unwrap();

    writer.set("shared", &"value", 5).await.unwrap();
    assert_eq!(reader.get::<String>("shared").await.unwrap().as_deref(), Some("value"));

    // Disposing one manager leaves the connection usable for the others
    writer.dispose();
    assert!(reader.is_set("shared").await.unwrap());
    assert_eq!(Arc::strong_count(&provider), 2);
}

#[tokio::test]
async fn test_concurrent_callers() {
    let (cache, provider) = memory_cache(3);

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move {
                let key = format!("task:{}", i);
                cache.set(&key, &i, 5).await.unwrap();
                cache.get::<i32>(&key).await.unwrap()
            })
        })
        .collect();

    for (i, task) in tasks.into_iter().enumerate() {
        assert_eq!(task.await.unwrap(), Some(i as i32));
    }
    assert_eq!(provider.len().await, 16);
}

// Note: These tests require a running Redis
// They are disabled by default but can be run with: cargo test -- --ignored

#[cfg(feature = "redis")]
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_redis_cache_contract() {
    let cache = CacheManager::connect(CacheConfig::new("redis://localhost:6379/15"))
        .await
        .unwrap();
    cache.clear().await.unwrap();

    cache.set("user:1:profile", &alice(), 1).await.unwrap();
    cache.set("user:1:session", &"abc", 1).await.unwrap();
    cache.set("order:1", &17, 1).await.unwrap();

    assert_eq!(cache.get::<Profile>("user:1:profile").await.unwrap(), Some(alice()));
    let ttl = cache.ttl("order:1").await.unwrap().unwrap();
    assert!(ttl <= Duration::from_secs(60));

    assert_eq!(cache.remove_by_pattern("user:1").await.unwrap(), 2);
    assert!(cache.is_set("order:1").await.unwrap());

    cache.remove("order:1").await.unwrap();
    cache.remove("order:1").await.unwrap();
    assert!(!cache.is_set("order:1").await.unwrap());
}
