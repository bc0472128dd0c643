//! Bounded, TTL'd, single-flight embedding cache.
//!
//! Keyed by a content hash of the text being embedded rather than the
//! text itself, so the cache's memory footprint does not grow with
//! input size. At most one embed call is in flight per key at a time:
//! concurrent cache misses on the same key share one upstream call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, Notify};

use crate::embed::Embedder;
use crate::error::Result;
use crate::types::{Chunk, DenseVector};

enum Slot {
    Pending(Arc<Notify>),
    Ready { vector: DenseVector, inserted_at: Instant },
}

struct Inner {
    slots: HashMap<String, Slot>,
    last_used: HashMap<String, Instant>,
}

/// Wraps an [`Embedder`] with a bounded LRU cache, entry TTL, and
/// single-flight de-duplication of concurrent misses on the same key.
pub struct EmbeddingCache<E: Embedder> {
    embedder: E,
    capacity: usize,
    ttl: Duration,
    inner: Mutex<Inner>,
}

impl<E: Embedder> EmbeddingCache<E> {
    /// Wraps `embedder` with a cache holding at most `capacity` entries,
    /// each valid for `ttl` before it is treated as a miss again.
    #[must_use]
    pub fn new(embedder: E, capacity: usize, ttl: Duration) -> Self {
        Self {
            embedder,
            capacity: capacity.max(1),
            ttl,
            inner: Mutex::new(Inner {
                slots: HashMap::new(),
                last_used: HashMap::new(),
            }),
        }
    }

    /// Key used for cache lookups: the content hash shared with chunk ids.
    #[must_use]
    pub fn key_for(text: &str) -> String {
        Chunk::short_hash(text.as_bytes())
    }

    /// Returns the embedding for `text`, embedding and caching it on a
    /// miss. Concurrent callers racing on the same key block on one
    /// upstream embed call rather than issuing two.
    pub async fn get_or_embed(&self, text: &str) -> Result<DenseVector> {
        let key = Self::key_for(text);

        loop {
            let notify = {
                let mut guard = self.inner.lock().await;
                match guard.slots.get(&key) {
                    Some(Slot::Ready { vector, inserted_at }) => {
                        if inserted_at.elapsed() < self.ttl {
                            let vector = vector.clone();
                            guard.last_used.insert(key.clone(), Instant::now());
                            return Ok(vector);
                        }
                        guard.slots.remove(&key);
                        None
                    }
                    Some(Slot::Pending(notify)) => Some(Arc::clone(notify)),
                    None => None,
                }
            };

            if let Some(notify) = notify {
                notify.notified().await;
                continue;
            }

            // Claim the slot for this call.
            {
                let mut guard = self.inner.lock().await;
                if guard.slots.contains_key(&key) {
                    // Lost a race between the read above and this claim; retry.
                    continue;
                }
                guard.slots.insert(key.clone(), Slot::Pending(Arc::new(Notify::new())));
            }

            let result = self.embedder.embed(text).await;

            let mut guard = self.inner.lock().await;
            let notify = match guard.slots.remove(&key) {
                Some(Slot::Pending(n)) => n,
                _ => Arc::new(Notify::new()),
            };

            return match result {
                Ok(vector) => {
                    Self::evict_if_full(&mut guard, self.capacity);
                    guard.slots.insert(
                        key.clone(),
                        Slot::Ready { vector: vector.clone(), inserted_at: Instant::now() },
                    );
                    guard.last_used.insert(key, Instant::now());
                    notify.notify_waiters();
                    Ok(vector)
                }
                Err(e) => {
                    notify.notify_waiters();
                    Err(e)
                }
            };
        }
    }

    fn evict_if_full(inner: &mut Inner, capacity: usize) {
        if inner.slots.len() < capacity {
            return;
        }
        if let Some(oldest_key) = inner
            .last_used
            .iter()
            .min_by_key(|(_, t)| **t)
            .map(|(k, _)| k.clone())
        {
            inner.slots.remove(&oldest_key);
            inner.last_used.remove(&oldest_key);
        }
    }

    /// Number of entries currently cached (ready or pending).
    pub async fn len(&self) -> usize {
        self.inner.lock().await.slots.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
