use std::collections::HashMap;
use std::hash::Hash;

use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

const FEED_CAPACITY: usize = 256;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("record already exists")]
    AlreadyExists,

    #[error("record not found")]
    NotFound,

    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u64, found: u64 },
}

/// A stored record together with its write version. Every successful write
/// bumps the version; conditional writes compare against it.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub record: T,
    pub version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOp {
    Created,
    Updated,
    Removed,
}

/// A committed change, tagged with the collection-wide commit sequence.
#[derive(Debug, Clone)]
pub struct ChangeEvent<K, T> {
    pub seq: u64,
    pub op: ChangeOp,
    pub key: K,
    pub record: T,
}

struct Inner<K, T> {
    records: HashMap<K, Versioned<T>>,
    next_seq: u64,
}

/// An in-process record collection with conditional writes and an ordered
/// change feed. This stands in for whatever document store backs the
/// deployment; callers only rely on the conditional-write and feed-ordering
/// contract, not on any engine specifics.
///
/// Events are published while the write lock is held, so feed order always
/// matches commit order, and `watch` subscribes under the same lock so a
/// snapshot and its subsequent deltas have no gap and no overlap.
pub struct Collection<K, T> {
    name: &'static str,
    inner: RwLock<Inner<K, T>>,
    feed: broadcast::Sender<ChangeEvent<K, T>>,
}

impl<K, T> Collection<K, T>
where
    K: Clone + Eq + Hash + Send + Sync,
    T: Clone + Send + Sync,
{
    pub fn new(name: &'static str) -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);

        Self {
            name,
            inner: RwLock::new(Inner {
                records: HashMap::new(),
                next_seq: 0,
            }),
            feed,
        }
    }

    pub async fn get(&self, key: &K) -> Option<Versioned<T>> {
        let inner = self.inner.read().await;
        inner.records.get(key).cloned()
    }

    /// Insert a new record. Fails if the key is already present, which lets
    /// racing creators detect each other instead of overwriting.
    pub async fn insert(&self, key: K, record: T) -> Result<Versioned<T>, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.records.contains_key(&key) {
            return Err(StoreError::AlreadyExists);
        }

        let stored = Versioned { record, version: 1 };
        inner.records.insert(key.clone(), stored.clone());
        Self::publish(&self.feed, &mut inner, ChangeOp::Created, key, &stored);

        debug!("Inserted record into {}", self.name);
        Ok(stored)
    }

    /// Compare-and-swap update: succeeds only if the stored version still
    /// equals `expected_version`. The loser of a concurrent write race gets
    /// `VersionMismatch` and must re-read before retrying.
    pub async fn update(
        &self,
        key: &K,
        expected_version: u64,
        record: T,
    ) -> Result<Versioned<T>, StoreError> {
        let mut inner = self.inner.write().await;

        let current = inner.records.get(key).ok_or(StoreError::NotFound)?;
        if current.version != expected_version {
            return Err(StoreError::VersionMismatch {
                expected: expected_version,
                found: current.version,
            });
        }

        let stored = Versioned {
            record,
            version: expected_version + 1,
        };
        inner.records.insert(key.clone(), stored.clone());
        Self::publish(&self.feed, &mut inner, ChangeOp::Updated, key.clone(), &stored);

        debug!("Updated record in {} (version {})", self.name, stored.version);
        Ok(stored)
    }

    pub async fn remove(&self, key: &K) -> Result<T, StoreError> {
        let mut inner = self.inner.write().await;

        let removed = inner.records.remove(key).ok_or(StoreError::NotFound)?;
        Self::publish(&self.feed, &mut inner, ChangeOp::Removed, key.clone(), &removed);

        debug!("Removed record from {}", self.name);
        Ok(removed.record)
    }

    pub async fn find<F>(&self, predicate: F) -> Vec<Versioned<T>>
    where
        F: Fn(&T) -> bool,
    {
        let inner = self.inner.read().await;
        inner
            .records
            .values()
            .filter(|stored| predicate(&stored.record))
            .cloned()
            .collect()
    }

    /// Atomically snapshot the collection and subscribe to its change feed.
    /// Taking the read lock excludes writers, so no committed change can fall
    /// between the snapshot and the first delivered event.
    pub async fn watch(&self) -> (Vec<Versioned<T>>, broadcast::Receiver<ChangeEvent<K, T>>) {
        let inner = self.inner.read().await;
        let receiver = self.feed.subscribe();
        let snapshot = inner.records.values().cloned().collect();

        (snapshot, receiver)
    }

    fn publish(
        feed: &broadcast::Sender<ChangeEvent<K, T>>,
        inner: &mut Inner<K, T>,
        op: ChangeOp,
        key: K,
        stored: &Versioned<T>,
    ) {
        let seq = inner.next_seq;
        inner.next_seq += 1;

        // Send errors only mean nobody is subscribed right now.
        let _ = feed.send(ChangeEvent {
            seq,
            op,
            key,
            record: stored.record.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn insert_rejects_duplicate_keys() {
        let collection: Collection<String, i32> = Collection::new("test");

        collection.insert("a".to_string(), 1).await.unwrap();
        let result = collection.insert("a".to_string(), 2).await;

        assert_matches!(result, Err(StoreError::AlreadyExists));
        assert_eq!(collection.get(&"a".to_string()).await.unwrap().record, 1);
    }

    #[tokio::test]
    async fn update_enforces_version_check() {
        let collection: Collection<String, i32> = Collection::new("test");
        let key = "a".to_string();

        let stored = collection.insert(key.clone(), 1).await.unwrap();
        collection.update(&key, stored.version, 2).await.unwrap();

        // A second writer still holding the stale version loses.
        let result = collection.update(&key, stored.version, 3).await;
        assert_matches!(
            result,
            Err(StoreError::VersionMismatch {
                expected: 1,
                found: 2
            })
        );
        assert_eq!(collection.get(&key).await.unwrap().record, 2);
    }

    #[tokio::test]
    async fn watch_sees_no_gap_between_snapshot_and_feed() {
        let collection: Collection<String, i32> = Collection::new("test");
        collection.insert("a".to_string(), 1).await.unwrap();

        let (snapshot, mut receiver) = collection.watch().await;
        assert_eq!(snapshot.len(), 1);

        collection.insert("b".to_string(), 2).await.unwrap();
        collection
            .update(&"b".to_string(), 1, 3)
            .await
            .unwrap();

        let first = receiver.recv().await.unwrap();
        let second = receiver.recv().await.unwrap();
        assert_eq!(first.op, ChangeOp::Created);
        assert_eq!(first.record, 2);
        assert_eq!(second.op, ChangeOp::Updated);
        assert_eq!(second.record, 3);
        assert!(first.seq < second.seq);
    }

    #[tokio::test]
    async fn remove_publishes_removal() {
        let collection: Collection<String, i32> = Collection::new("test");
        collection.insert("a".to_string(), 1).await.unwrap();

        let (_, mut receiver) = collection.watch().await;
        collection.remove(&"a".to_string()).await.unwrap();

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.op, ChangeOp::Removed);
        assert_matches!(
            collection.remove(&"a".to_string()).await,
            Err(StoreError::NotFound)
        );
    }
}
