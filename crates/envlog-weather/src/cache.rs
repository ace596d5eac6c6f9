//! Time-bounded response cache.

use std::{collections::HashMap, hash::Hash, time::Duration};

use tokio::{sync::RwLock, time::Instant};

/// A map whose entries expire `ttl` after insertion. A zero `ttl`
/// disables caching.
pub struct TtlCache<K, V> {
  ttl:     Duration,
  entries: RwLock<HashMap<K, (Instant, V)>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
  pub fn new(ttl: Duration) -> Self {
    Self {
      ttl,
      entries: RwLock::new(HashMap::new()),
    }
  }

  pub async fn get(&self, key: &K) -> Option<V> {
    let entries = self.entries.read().await;
    entries
      .get(key)
      .filter(|(inserted, _)| inserted.elapsed() < self.ttl)
      .map(|(_, value)| value.clone())
  }

  /// Store `value`, evicting anything that has already expired.
  pub async fn insert(&self, key: K, value: V) {
    if self.ttl.is_zero() {
      return;
    }
    let mut entries = self.entries.write().await;
    let ttl = self.ttl;
    entries.retain(|_, (inserted, _)| inserted.elapsed() < ttl);
    entries.insert(key, (Instant::now(), value));
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn returns_fresh_entries() {
    let cache = TtlCache::new(Duration::from_secs(60));
    cache.insert("k", 1).await;
    assert_eq!(cache.get(&"k").await, Some(1));
    assert_eq!(cache.get(&"other").await, None);
  }

  #[tokio::test]
  async fn zero_ttl_never_stores() {
    let cache = TtlCache::new(Duration::ZERO);
    cache.insert("k", 1).await;
    assert_eq!(cache.get(&"k").await, None);
  }

  #[tokio::test]
  async fn expired_entries_are_not_returned() {
    let cache = TtlCache::new(Duration::from_millis(20));
    cache.insert("k", 1).await;
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(cache.get(&"k").await, None);
  }
}
