//! Client-side query cache with tag-based invalidation.
//!
//! Query results are stored per [`CacheKey`] together with the [`Tag`]s
//! describing which entities they depend on. Mutations name the tags they
//! affect, and every entry carrying one of those tags is marked stale so the
//! next read re-fetches it.
//!
//! # Guarantees
//!
//! - Concurrent queries for the same key share one in-flight fetch.
//! - A failed fetch leaves the cache untouched.
//! - A failed mutation invalidates nothing.
//! - A result that was in flight while one of its tags got invalidated is
//!   stored stale, and a result that was in flight across
//!   [`QueryCache::clear`] is discarded.

mod tag;

pub use tag::{CacheKey, Tag};

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use tag::TagIndex;

type Erased = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, std::result::Result<Erased, Arc<Error>>>>;

/// Capacity of the invalidation broadcast channel.
const EVENT_CAPACITY: usize = 64;

struct Entry {
    data: Erased,
    tags: BTreeSet<Tag>,
    stale: bool,
    fetched_at: DateTime<Utc>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, Entry>,
    index: TagIndex,
    in_flight: HashMap<CacheKey, SharedFetch>,
    /// Tags invalidated while a key's fetch was in flight
    missed: HashMap<CacheKey, BTreeSet<Tag>>,
    /// Bumped by `clear`; fetches started under an older epoch are dropped
    epoch: u64,
}

impl CacheState {
    fn store(&mut self, key: CacheKey, data: Erased, tags: BTreeSet<Tag>) {
        if let Some(old) = self.entries.remove(&key) {
            self.index.remove(&key, &old.tags);
        }
        self.index.insert(&key, &tags);
        // The fetch may have read state that a concurrent mutation changed.
        let stale = self
            .missed
            .remove(&key)
            .is_some_and(|missed| !missed.is_disjoint(&tags));
        self.entries.insert(
            key,
            Entry {
                data,
                tags,
                stale,
                fetched_at: Utc::now(),
            },
        );
    }
}

/// Event broadcast after an invalidation.
#[derive(Debug, Clone)]
pub struct Invalidated {
    pub keys: Arc<[CacheKey]>,
}

/// Shared query cache. Cloning yields another handle on the same cache.
#[derive(Clone)]
pub struct QueryCache {
    state: Arc<Mutex<CacheState>>,
    events: broadcast::Sender<Invalidated>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("QueryCache")
            .field("entries", &state.entries.len())
            .field("in_flight", &state.in_flight.len())
            .finish()
    }
}

impl QueryCache {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read through the cache.
    ///
    /// Returns the fresh entry for `key` if there is one. Otherwise joins the
    /// in-flight fetch for `key`, or starts one by calling `fetch`. On success
    /// the value is stored under the tags `tags_of` derives from it.
    ///
    /// # Errors
    ///
    /// Returns the fetch failure, wrapped in [`Error::Shared`] because every
    /// caller waiting on the same fetch receives it.
    pub async fn query<T, F, Fut, Tags>(&self, key: CacheKey, fetch: F, tags_of: Tags) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
        Tags: FnOnce(&T) -> Vec<Tag> + Send + 'static,
    {
        let pending = {
            let mut state = self.lock();

            if let Some(entry) = state.entries.get(&key) {
                if !entry.stale {
                    trace!(key = %key, fetched_at = %entry.fetched_at, "cache hit");
                    return downcast(Arc::clone(&entry.data), &key);
                }
            }

            if let Some(in_flight) = state.in_flight.get(&key) {
                debug!(key = %key, "joining in-flight request");
                in_flight.clone()
            } else {
                debug!(key = %key, "cache miss, fetching");
                let pending = store_when_settled(
                    Arc::clone(&self.state),
                    state.epoch,
                    key.clone(),
                    fetch(),
                    tags_of,
                )
                .boxed()
                .shared();
                state.in_flight.insert(key.clone(), pending.clone());
                pending
            }
        };

        match pending.await {
            Ok(data) => downcast(data, &key),
            Err(err) => Err(Error::Shared(err)),
        }
    }

    /// Run a mutation and invalidate the tags it reports.
    ///
    /// Tags are derived from the mutation's own result; nothing is
    /// invalidated when `fetch` fails.
    ///
    /// # Errors
    ///
    /// Returns the mutation failure unchanged.
    pub async fn mutate<R, Fut, Inv>(&self, fetch: Fut, invalidates: Inv) -> Result<R>
    where
        Fut: Future<Output = Result<R>>,
        Inv: FnOnce(&R) -> Vec<Tag>,
    {
        let result = fetch.await?;
        let tags = invalidates(&result);
        self.invalidate(&tags);
        Ok(result)
    }

    /// Mark every entry carrying one of `tags` as stale and notify subscribers.
    ///
    /// Returns the affected keys.
    ///
    /// Fetches still in flight remember `tags`; a result whose own tags
    /// intersect them is stored stale, even on a key's first fetch.
    pub fn invalidate(&self, tags: &[Tag]) -> Vec<CacheKey> {
        let keys: Vec<CacheKey> = {
            let mut state = self.lock();
            let keys = state.index.keys_for(tags);
            for key in &keys {
                if let Some(entry) = state.entries.get_mut(key) {
                    entry.stale = true;
                }
            }
            let CacheState {
                in_flight, missed, ..
            } = &mut *state;
            for key in in_flight.keys() {
                missed
                    .entry(key.clone())
                    .or_default()
                    .extend(tags.iter().cloned());
            }
            keys.into_iter().collect()
        };

        debug!(
            tags = %tags.iter().map(ToString::to_string).collect::<Vec<_>>().join(","),
            affected = keys.len(),
            "invalidated"
        );

        if !keys.is_empty() {
            // No receivers is fine: nobody is watching.
            let _ = self.events.send(Invalidated {
                keys: keys.clone().into(),
            });
        }
        keys
    }

    /// Watch one key for invalidation.
    #[must_use]
    pub fn subscribe(&self, key: CacheKey) -> Subscription {
        Subscription {
            key,
            rx: self.events.subscribe(),
        }
    }

    /// Cached value for `key`, fresh or stale, without fetching.
    #[must_use]
    pub fn peek<T: Send + Sync + 'static>(&self, key: &CacheKey) -> Option<Arc<T>> {
        let state = self.lock();
        let data = Arc::clone(&state.entries.get(key)?.data);
        data.downcast::<T>().ok()
    }

    /// `Some(true)` if the entry exists and is stale, `None` if absent.
    #[must_use]
    pub fn is_stale(&self, key: &CacheKey) -> Option<bool> {
        self.lock().entries.get(key).map(|e| e.stale)
    }

    /// Tags currently recorded for `key`.
    #[must_use]
    pub fn tags_of(&self, key: &CacheKey) -> Option<Vec<Tag>> {
        self.lock()
            .entries
            .get(key)
            .map(|e| e.tags.iter().cloned().collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry. Fetches still in flight will not be stored.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.index.clear();
        state.in_flight.clear();
        state.missed.clear();
        state.epoch += 1;
        debug!(epoch = state.epoch, "cache cleared");
    }
}

/// Await `fetch` and record its outcome in the cache.
async fn store_when_settled<T, Fut, Tags>(
    state: Arc<Mutex<CacheState>>,
    epoch: u64,
    key: CacheKey,
    fetch: Fut,
    tags_of: Tags,
) -> std::result::Result<Erased, Arc<Error>>
where
    T: Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    Tags: FnOnce(&T) -> Vec<Tag> + Send + 'static,
{
    let outcome = fetch.await;

    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    if state.epoch != epoch {
        debug!(key = %key, "discarding result fetched before cache clear");
        return outcome.map(|v| Arc::new(v) as Erased).map_err(Arc::new);
    }
    state.in_flight.remove(&key);

    match outcome {
        Ok(value) => {
            let tags: BTreeSet<Tag> = tags_of(&value).into_iter().collect();
            let data: Erased = Arc::new(value);
            trace!(key = %key, tags = tags.len(), "stored");
            state.store(key, Arc::clone(&data), tags);
            Ok(data)
        }
        Err(err) => {
            state.missed.remove(&key);
            debug!(key = %key, error = %err, "fetch failed, cache untouched");
            Err(Arc::new(err))
        }
    }
}

fn downcast<T: Send + Sync + 'static>(data: Erased, key: &CacheKey) -> Result<Arc<T>> {
    data.downcast::<T>()
        .map_err(|_| Error::Other(format!("cache entry {key} holds a different type")))
}

/// Invalidation watcher for a single key.
///
/// A view holds one of these for each query it renders and re-queries when
/// [`Subscription::changed`] resolves.
pub struct Subscription {
    key: CacheKey,
    rx: broadcast::Receiver<Invalidated>,
}

impl Subscription {
    #[must_use]
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Wait until the watched key is invalidated.
    ///
    /// Returns `false` once the cache has been dropped. A lagging receiver
    /// reports a change, since it may have missed one.
    pub async fn changed(&mut self) -> bool {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.keys.contains(&self.key) => return true,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => return true,
                Err(broadcast::error::RecvError::Closed) => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProjectId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
        value: Vec<&'static str>,
    ) -> impl FnOnce() -> futures::future::Ready<Result<Vec<&'static str>>> {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(Ok(value))
        }
    }

    fn project_tags(ids: &[&'static str]) -> Vec<Tag> {
        let mut tags: Vec<Tag> = ids.iter().map(|id| Tag::Project(ProjectId::from(*id))).collect();
        tags.push(Tag::ProjectList);
        tags
    }

    #[tokio::test]
    async fn test_second_read_is_a_hit() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::unit("projects");

        for _ in 0..3 {
            let got = cache
                .query(key.clone(), counting_fetch(&calls, vec!["p1"]), |_| project_tags(&["p1"]))
                .await
                .unwrap();
            assert_eq!(*got, vec!["p1"]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_identical_queries_share_one_fetch() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::new("tasks", "p1");
        let (release, gate) = oneshot::channel::<()>();

        let leader_calls = Arc::clone(&calls);
        let first = cache.query(
            key.clone(),
            move || {
                leader_calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    let _ = gate.await;
                    Ok(vec!["t1", "t2"])
                }
            },
            |_| vec![Tag::ProjectTasks("p1".into())],
        );
        let second = cache.query(key.clone(), counting_fetch(&calls, vec!["other"]), |_| Vec::new());

        let (a, b, ()) = tokio::join!(first, second, async move {
            tokio::task::yield_now().await;
            let _ = release.send(());
        });

        assert_eq!(*a.unwrap(), vec!["t1", "t2"]);
        assert_eq!(*b.unwrap(), vec!["t1", "t2"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_waiters_share_the_leader_failure() {
        let cache = QueryCache::new();
        let key = CacheKey::unit("projects");
        let (release, gate) = oneshot::channel::<()>();

        let first = cache.query(
            key.clone(),
            move || async move {
                let _ = gate.await;
                Err::<Vec<&str>, _>(Error::Transport("connection refused".into()))
            },
            |_| Vec::new(),
        );
        let second = cache.query(
            key.clone(),
            || async { Ok(vec!["never"]) },
            |_: &Vec<&str>| Vec::new(),
        );

        let (a, b, ()) = tokio::join!(first, second, async move {
            tokio::task::yield_now().await;
            let _ = release.send(());
        });

        assert!(matches!(a.unwrap_err().root(), Error::Transport(_)));
        assert!(matches!(b.unwrap_err().root(), Error::Transport(_)));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_invalidation_forces_refetch() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::unit("projects");

        cache
            .query(key.clone(), counting_fetch(&calls, vec!["p1"]), |_| project_tags(&["p1"]))
            .await
            .unwrap();
        assert_eq!(cache.is_stale(&key), Some(false));

        let affected = cache.invalidate(&[Tag::Project("p1".into())]);
        assert_eq!(affected, vec![key.clone()]);
        assert_eq!(cache.is_stale(&key), Some(true));

        cache
            .query(key.clone(), counting_fetch(&calls, vec!["p1"]), |_| project_tags(&["p1"]))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.is_stale(&key), Some(false));
    }

    #[tokio::test]
    async fn test_unrelated_entries_survive_invalidation() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let p1_tasks = CacheKey::new("tasks", "p1");
        let p2_tasks = CacheKey::new("tasks", "p2");

        cache
            .query(p1_tasks.clone(), counting_fetch(&calls, vec![]), |_| {
                vec![Tag::ProjectTasks("p1".into()), Tag::TaskList]
            })
            .await
            .unwrap();
        cache
            .query(p2_tasks.clone(), counting_fetch(&calls, vec![]), |_| {
                vec![Tag::ProjectTasks("p2".into()), Tag::TaskList]
            })
            .await
            .unwrap();

        cache.invalidate(&[Tag::ProjectTasks("p1".into())]);
        assert_eq!(cache.is_stale(&p1_tasks), Some(true));
        assert_eq!(cache.is_stale(&p2_tasks), Some(false));
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_entry() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::unit("projects");

        cache
            .query(key.clone(), counting_fetch(&calls, vec!["p1"]), |_| project_tags(&["p1"]))
            .await
            .unwrap();
        cache.invalidate(&[Tag::ProjectList]);

        let err = cache
            .query(
                key.clone(),
                || async { Err::<Vec<&str>, _>(Error::Remote { status: 500, message: "boom".into() }) },
                |_| Vec::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err.root(), Error::Remote { status: 500, .. }));

        // Old data still there, still stale, still indexed.
        assert_eq!(*cache.peek::<Vec<&str>>(&key).unwrap(), vec!["p1"]);
        assert_eq!(cache.is_stale(&key), Some(true));
        assert_eq!(cache.tags_of(&key).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_mutation_invalidates_nothing() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::unit("projects");
        cache
            .query(key.clone(), counting_fetch(&calls, vec!["p1"]), |_| project_tags(&["p1"]))
            .await
            .unwrap();

        let result = cache
            .mutate(
                async { Err::<(), _>(Error::Transport("down".into())) },
                |()| vec![Tag::ProjectList],
            )
            .await;
        assert!(result.is_err());
        assert_eq!(cache.is_stale(&key), Some(false));

        cache
            .mutate(async { Ok(()) }, |()| vec![Tag::ProjectList])
            .await
            .unwrap();
        assert_eq!(cache.is_stale(&key), Some(true));
    }

    #[tokio::test]
    async fn test_subscription_fires_for_its_key_only() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::new("tasks", "p1");
        cache
            .query(key.clone(), counting_fetch(&calls, vec![]), |_| {
                vec![Tag::ProjectTasks("p1".into())]
            })
            .await
            .unwrap();

        let mut sub = cache.subscribe(key.clone());
        cache.invalidate(&[Tag::ProjectTasks("p2".into())]);
        cache.invalidate(&[Tag::ProjectTasks("p1".into())]);

        let fired = tokio::time::timeout(std::time::Duration::from_secs(1), sub.changed())
            .await
            .expect("subscription should fire");
        assert!(fired);
        assert_eq!(sub.key(), &key);
    }

    #[tokio::test]
    async fn test_invalidated_while_in_flight_is_stored_stale() {
        let cache = QueryCache::new();
        let key = CacheKey::unit("projects");
        let calls = Arc::new(AtomicUsize::new(0));

        // Seed an entry so the key is indexed under ProjectList.
        cache
            .query(key.clone(), counting_fetch(&calls, vec!["old"]), |_| project_tags(&[]))
            .await
            .unwrap();
        cache.invalidate(&[Tag::ProjectList]);

        let (release, gate) = oneshot::channel::<()>();
        let refetch = cache.query(
            key.clone(),
            move || async move {
                let _ = gate.await;
                Ok(vec!["read-before-write"])
            },
            |_| project_tags(&[]),
        );
        let invalidate_midway = async {
            tokio::task::yield_now().await;
            cache.invalidate(&[Tag::ProjectList]);
            let _ = release.send(());
        };
        let (got, ()) = tokio::join!(refetch, invalidate_midway);

        assert_eq!(*got.unwrap(), vec!["read-before-write"]);
        assert_eq!(cache.is_stale(&key), Some(true));
    }

    #[tokio::test]
    async fn test_first_fetch_invalidated_midway_is_stored_stale() {
        let cache = QueryCache::new();
        let key = CacheKey::new("tasks", "p1");
        let (release, gate) = oneshot::channel::<()>();

        let first = cache.query(
            key.clone(),
            move || async move {
                let _ = gate.await;
                Ok(Vec::<&str>::new())
            },
            |_| vec![Tag::ProjectTasks("p1".into()), Tag::TaskList],
        );
        let create_midway = async {
            tokio::task::yield_now().await;
            // Nothing is indexed yet, so no stored entry is affected.
            assert!(cache.invalidate(&[Tag::ProjectTasks("p1".into())]).is_empty());
            let _ = release.send(());
        };
        let (got, ()) = tokio::join!(first, create_midway);

        assert!(got.unwrap().is_empty());
        assert_eq!(cache.is_stale(&key), Some(true));
    }

    #[tokio::test]
    async fn test_unrelated_invalidation_midway_keeps_result_fresh() {
        let cache = QueryCache::new();
        let key = CacheKey::new("tasks", "p1");
        let (release, gate) = oneshot::channel::<()>();

        let first = cache.query(
            key.clone(),
            move || async move {
                let _ = gate.await;
                Ok(vec!["t1"])
            },
            |_| vec![Tag::ProjectTasks("p1".into()), Tag::TaskList],
        );
        let other_midway = async {
            tokio::task::yield_now().await;
            cache.invalidate(&[Tag::ProjectList, Tag::ProjectTasks("p2".into())]);
            let _ = release.send(());
        };
        let (got, ()) = tokio::join!(first, other_midway);

        assert_eq!(*got.unwrap(), vec!["t1"]);
        assert_eq!(cache.is_stale(&key), Some(false));
    }

    #[tokio::test]
    async fn test_clear_discards_late_results() {
        let cache = QueryCache::new();
        let key = CacheKey::unit("projects");
        let (release, gate) = oneshot::channel::<()>();

        let pending = cache.query(
            key.clone(),
            move || async move {
                let _ = gate.await;
                Ok(vec!["previous-user"])
            },
            |_| project_tags(&[]),
        );
        let clear_midway = async {
            tokio::task::yield_now().await;
            cache.clear();
            let _ = release.send(());
        };
        let (got, ()) = tokio::join!(pending, clear_midway);

        // The caller that asked still sees its answer; the cache does not keep it.
        assert!(got.is_ok());
        assert!(cache.is_empty());
    }
}
