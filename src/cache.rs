//! Bounded, access-ordered session cache with an eviction callback.
//!
//! Wraps [`lru::LruCache`] (the crate used for exactly this access-ordered,
//! O(1) get/put/pop-lru shape elsewhere in the pack). Not internally
//! concurrent — per §4.3, the memory manager is the sole lock holder around
//! any access.

use crate::SessionState;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Invoked with the evicted session's id and final state. Must be
/// synchronous and non-blocking — it only schedules background work (e.g.
/// dispatching a persistence task), never awaits.
pub type EvictionCallback = Arc<dyn Fn(String, SessionState) + Send + Sync>;

pub struct SessionCache {
    inner: LruCache<String, SessionState>,
    on_evict: Option<EvictionCallback>,
}

impl SessionCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: LruCache::new(capacity),
            on_evict: None,
        }
    }

    pub fn with_eviction_callback(capacity: NonZeroUsize, on_evict: EvictionCallback) -> Self {
        Self {
            inner: LruCache::new(capacity),
            on_evict: Some(on_evict),
        }
    }

    /// Marks `id` most-recently-used and returns a clone of its state.
    pub fn get(&mut self, id: &str) -> Option<SessionState> {
        self.inner.get(id).cloned()
    }

    pub fn contains(&mut self, id: &str) -> bool {
        self.inner.contains(id)
    }

    /// Mutates the entry in place (marking it most-recently-used) without
    /// cloning the whole state out and back in.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut SessionState> {
        let entry = self.inner.get_mut(id)?;
        entry.revision += 1;
        Some(entry)
    }

    /// Inserts or replaces `id`'s state, marking it most-recently-used. If
    /// this insertion pushes the cache above capacity, the least-recently-used
    /// entry is evicted and the eviction callback (if any) is invoked with
    /// its id and state.
    pub fn put(&mut self, id: String, mut state: SessionState) {
        state.revision += 1;
        if let Some((evicted_id, evicted_state)) = self.inner.push(id, state) {
            if let Some(cb) = &self.on_evict {
                cb(evicted_id, evicted_state);
            }
        }
    }

    /// Removes `id` without triggering the eviction callback — used for
    /// deliberate deletion, as distinct from LRU-driven eviction.
    pub fn remove(&mut self, id: &str) -> Option<SessionState> {
        self.inner.pop(id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    fn state_with(text: &str) -> SessionState {
        let mut s = SessionState::default();
        s.messages.push(crate::Message::user(text));
        s
    }

    #[test]
    fn put_and_get_round_trips() {
        let mut cache = SessionCache::new(NonZeroUsize::new(2).unwrap());
        cache.put("a".to_string(), state_with("hello"));
        let got = cache.get("a").unwrap();
        assert_eq!(got.messages[0].content.as_ref().unwrap().flatten_text(), "hello");
    }

    #[test]
    fn eviction_invokes_callback_with_lru_entry() {
        let evicted: Arc<StdMutex<Vec<String>>> = Arc::new(StdMutex::new(Vec::new()));
        let evicted2 = evicted.clone();
        let mut cache = SessionCache::with_eviction_callback(
            NonZeroUsize::new(2).unwrap(),
            Arc::new(move |id, _state| evicted2.lock().unwrap().push(id)),
        );

        cache.put("a".to_string(), state_with("A"));
        cache.put("b".to_string(), state_with("B"));
        // touching "a" makes "b" the least-recently-used
        cache.get("a");
        cache.put("c".to_string(), state_with("C"));

        assert_eq!(*evicted.lock().unwrap(), vec!["b".to_string()]);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains("a"));
        assert!(cache.contains("c"));
        assert!(!cache.contains("b"));
    }

    #[test]
    fn resident_size_never_exceeds_bound() {
        let mut cache = SessionCache::new(NonZeroUsize::new(3).unwrap());
        for i in 0..10 {
            cache.put(format!("s{i}"), state_with("x"));
            assert!(cache.len() <= 3);
        }
    }

    #[test]
    fn remove_does_not_trigger_eviction_callback() {
        let evicted: Arc<StdMutex<usize>> = Arc::new(StdMutex::new(0));
        let evicted2 = evicted.clone();
        let mut cache = SessionCache::with_eviction_callback(
            NonZeroUsize::new(2).unwrap(),
            Arc::new(move |_, _| *evicted2.lock().unwrap() += 1),
        );
        cache.put("a".to_string(), state_with("A"));
        cache.remove("a");
        assert_eq!(*evicted.lock().unwrap(), 0);
    }
}
