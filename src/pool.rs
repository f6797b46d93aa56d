//! Core object pool engine

use crate::config::PoolConfiguration;
use crate::context::{ContextId, ExecutionContext};
use crate::errors::{BoxError, PoolError, PoolResult};
#[cfg(feature = "metrics")]
use crate::metrics::MetricsExporter;
use crate::metrics::{MetricsTracker, PoolMetrics};
use crate::object::{Lifecycle, ObjectId, PooledObject};
use crate::queue::HandoffQueue;
use crate::status::{PoolStatus, StatusRow, StatusTable, now_millis};

use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Retry budget used by [`ObjectPool::acquire`]
pub const DEFAULT_RETRIES: u32 = 3;

// Slack on top of `max_objects` so a requeue never finds the queue full
const QUEUE_HEADROOM: usize = 8;

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

type FactoryFuture<T> = Pin<Box<dyn Future<Output = Result<T, BoxError>> + Send>>;
type Factory<T> = Arc<dyn Fn() -> FactoryFuture<T> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Membership {
    Idle,
    CheckedOut,
}

/// How a checkout treats the pool around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Checkout {
    /// Application checkout: may grow the pool and counts towards the load window
    Caller,
    /// Maintenance checkout of an idle object about to be destroyed
    Reclaim,
}

/// Rolling accumulators of the current load observation window
#[derive(Debug, Default)]
pub(crate) struct LoadWindow {
    pub wait: Duration,
    pub uses: u64,
}

pub(crate) struct PoolInner<T> {
    pub(crate) config: PoolConfiguration,
    factory: Factory<T>,
    pool_id: u64,
    pub(crate) key: String,
    pub(crate) status_table: Arc<StatusTable>,
    queue: Mutex<Option<Arc<HandoffQueue<PooledObject<T>>>>>,
    membership: DashMap<ObjectId, Membership>,
    in_use: DashMap<ObjectId, PooledObject<T>>,
    borrows: DashMap<ContextId, PooledObject<T>>,
    created: AtomicUsize,
    destroyed: AtomicBool,
    next_seq: AtomicU64,
    pub(crate) load: Mutex<LoadWindow>,
    pub(crate) timers: Mutex<Vec<JoinHandle<()>>>,
    pub(crate) metrics: MetricsTracker,
}

impl<T> Drop for PoolInner<T> {
    fn drop(&mut self) {
        for timer in self.timers.get_mut().drain(..) {
            timer.abort();
        }
        self.status_table.remove(&self.key);
    }
}

/// Bounded pool of lazily created objects shared by many tasks.
///
/// Objects are created on demand up to `max_objects`, handed out
/// exclusively, and kept between `min_objects` and `max_objects` by
/// maintenance timers that start with the first checkout. The handle is a
/// cheap clone of the same engine.
///
/// # Examples
///
/// ```
/// use coropool::{ObjectPool, PoolConfiguration};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> coropool::PoolResult<()> {
/// let config = PoolConfiguration::new().with_min_objects(1).with_max_objects(4);
/// let pool = ObjectPool::new(|| async { Ok::<_, std::io::Error>(String::from("conn")) }, config)?;
///
/// let conn = pool.acquire(None).await?.expect("pool has capacity");
/// assert_eq!(conn.as_str(), "conn");
/// assert!(pool.release(&conn).await?);
/// assert!(!pool.release(&conn).await?);
///
/// pool.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct ObjectPool<T> {
    pub(crate) inner: Arc<PoolInner<T>>,
}

impl<T> Clone for ObjectPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("key", &self.inner.key)
            .field("created", &self.inner.created.load(Ordering::Relaxed))
            .field("destroyed", &self.inner.destroyed.load(Ordering::Relaxed))
            .field("config", &self.inner.config)
            .finish()
    }
}

impl<T: Lifecycle> ObjectPool<T> {
    /// Create a pool that builds objects with `factory`.
    ///
    /// Nothing is created and no timer is started until first use.
    pub fn new<F, Fut, E>(factory: F, config: PoolConfiguration) -> PoolResult<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        Self::with_status_table(factory, config, Arc::new(StatusTable::default()))
    }

    /// Create a pool that publishes its row into a table shared with sibling pools
    pub fn with_status_table<F, Fut, E>(
        factory: F,
        config: PoolConfiguration,
        status_table: Arc<StatusTable>,
    ) -> PoolResult<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        config.validate()?;

        let pool_id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        let factory: Factory<T> = Arc::new(move || -> FactoryFuture<T> {
            let fut = factory();
            Box::pin(async move { fut.await.map_err(Into::<BoxError>::into) })
        });

        Ok(Self {
            inner: Arc::new(PoolInner {
                config,
                factory,
                pool_id,
                key: format!("{:08x}-{}", pool_id, std::process::id()),
                status_table,
                queue: Mutex::new(None),
                membership: DashMap::new(),
                in_use: DashMap::new(),
                borrows: DashMap::new(),
                created: AtomicUsize::new(0),
                destroyed: AtomicBool::new(false),
                next_seq: AtomicU64::new(1),
                load: Mutex::new(LoadWindow::default()),
                timers: Mutex::new(Vec::new()),
                metrics: MetricsTracker::new(),
            }),
        })
    }

    pub fn config(&self) -> &PoolConfiguration {
        &self.inner.config
    }

    /// Key of this pool's row in the status table (instance and process id)
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    pub fn status_table(&self) -> &Arc<StatusTable> {
        &self.inner.status_table
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    /// Objects currently alive
    pub fn created_count(&self) -> usize {
        self.inner.created.load(Ordering::SeqCst)
    }

    /// Objects currently checked out, including context borrows
    pub fn in_use_count(&self) -> usize {
        self.inner.in_use.len() + self.inner.borrows.len()
    }

    /// Objects waiting in the hand-off queue
    pub fn idle_count(&self) -> usize {
        self.inner.queue.lock().as_ref().map_or(0, |queue| queue.len())
    }

    /// Whether `obj` was created by this pool and is still alive
    pub fn is_pool_object(&self, obj: &PooledObject<T>) -> bool {
        self.inner.membership.contains_key(&obj.id())
    }

    /// Whether `obj` belongs to this pool and is currently idle
    pub fn is_idle(&self, obj: &PooledObject<T>) -> bool {
        self.inner
            .membership
            .get(&obj.id())
            .is_some_and(|state| *state == Membership::Idle)
    }

    /// Snapshot of every checked-out object
    pub fn used_objects(&self) -> Vec<PooledObject<T>> {
        self.inner
            .in_use
            .iter()
            .map(|entry| entry.value().clone())
            .chain(self.inner.borrows.iter().map(|entry| entry.value().clone()))
            .collect()
    }

    /// Check out an object, waiting up to `timeout` (default `get_object_timeout`).
    ///
    /// `Ok(None)` means no object was available: the pool is shut down, the
    /// wait timed out, or `before_use` kept rejecting objects.
    pub async fn acquire(&self, timeout: Option<Duration>) -> PoolResult<Option<PooledObject<T>>> {
        self.acquire_with_retries(timeout, DEFAULT_RETRIES).await
    }

    /// [`acquire`](Self::acquire) with an explicit retry budget for failed
    /// creations and rejected checkouts
    pub async fn acquire_with_retries(
        &self,
        timeout: Option<Duration>,
        retries: u32,
    ) -> PoolResult<Option<PooledObject<T>>> {
        self.checkout(timeout, retries, Checkout::Caller).await
    }

    pub(crate) async fn checkout(
        &self,
        timeout: Option<Duration>,
        mut retries: u32,
        mode: Checkout,
    ) -> PoolResult<Option<PooledObject<T>>> {
        let timeout = timeout.unwrap_or(self.inner.config.get_object_timeout);

        loop {
            if self.is_destroyed() {
                return Ok(None);
            }
            let Some(queue) = self.ensure_started() else {
                return Ok(None);
            };

            if mode == Checkout::Caller && queue.is_empty() {
                if let Err(err) = self.create_object(&queue).await {
                    if retries == 0 {
                        return Err(err);
                    }
                    retries -= 1;
                    continue;
                }
            }

            let started = Instant::now();
            let Some(obj) = queue.pop(timeout).await else {
                if mode == Checkout::Caller {
                    MetricsTracker::incr(&self.inner.metrics.empty_events);
                }
                return Ok(None);
            };
            let id = obj.id();

            // Evicted or reset while it sat in the queue
            if !self.transition(id, Membership::Idle, Membership::CheckedOut) {
                continue;
            }
            self.inner.in_use.insert(id, obj.clone());
            obj.touch();
            if mode == Checkout::Caller {
                self.inner.load.lock().wait += started.elapsed();
            }

            if self.is_destroyed() {
                self.evict(&obj).await?;
                return Ok(None);
            }

            match obj.before_use().await {
                Ok(true) => {
                    if !self.is_checked_out(id) {
                        // Reclaimed by a shutdown while the hook ran
                        return Ok(None);
                    }
                    if mode == Checkout::Caller {
                        self.inner.load.lock().uses += 1;
                        MetricsTracker::incr(&self.inner.metrics.total_acquired);
                    }
                    self.publish_status();
                    return Ok(Some(obj));
                }
                Ok(false) => {
                    MetricsTracker::incr(&self.inner.metrics.hook_rejections);
                    debug!(
                        pool = %self.inner.key,
                        object = %id,
                        retries,
                        "Object rejected on checkout"
                    );
                    self.evict(&obj).await?;
                    if retries == 0 {
                        return Ok(None);
                    }
                    retries -= 1;
                }
                Err(err) => {
                    warn!(
                        pool = %self.inner.key,
                        object = %id,
                        error = %err,
                        "before_use hook failed"
                    );
                    self.evict(&obj).await?;
                    if retries == 0 {
                        return Err(PoolError::hook("before_use", err));
                    }
                    retries -= 1;
                }
            }
        }
    }

    /// Return an object to the pool.
    ///
    /// Returns `Ok(false)` without side effects for objects this pool doesn't
    /// own or that are already idle. After shutdown, owned objects are
    /// destroyed instead of requeued.
    pub async fn release(&self, obj: &PooledObject<T>) -> PoolResult<bool> {
        let id = obj.id();
        if self.is_destroyed() {
            return self.evict(obj).await;
        }
        if !self.transition(id, Membership::CheckedOut, Membership::Idle) {
            debug!(
                pool = %self.inner.key,
                object = %id,
                "Ignoring release of foreign or idle object"
            );
            return Ok(false);
        }
        self.clear_borrow(id);
        self.inner.in_use.remove(&id);

        if let Err(err) = obj.after_return().await {
            warn!(pool = %self.inner.key, object = %id, error = %err, "after_return hook failed");
            if self.transition(id, Membership::Idle, Membership::CheckedOut) {
                self.evict(obj).await?;
            }
            return Err(PoolError::hook("after_return", err));
        }

        MetricsTracker::incr(&self.inner.metrics.total_released);
        self.requeue(obj.clone()).await?;
        self.publish_status();
        Ok(true)
    }

    /// Destroy a checked-out object owned by this pool.
    ///
    /// Returns `Ok(false)` for foreign or idle objects. The created count is
    /// decremented even when `before_destroy` fails; the hook error is then
    /// returned.
    pub async fn evict(&self, obj: &PooledObject<T>) -> PoolResult<bool> {
        let id = obj.id();
        if self
            .inner
            .membership
            .remove_if(&id, |_, state| *state == Membership::CheckedOut)
            .is_none()
        {
            return Ok(false);
        }
        self.clear_borrow(id);
        self.inner.in_use.remove(&id);

        let hook = obj.before_destroy().await;
        self.decrement_created();
        MetricsTracker::incr(&self.inner.metrics.total_destroyed);
        self.publish_status();
        debug!(
            pool = %self.inner.key,
            object = %id,
            created = self.created_count(),
            "Destroyed pooled object"
        );

        hook.map_err(|err| {
            warn!(pool = %self.inner.key, object = %id, error = %err, "before_destroy hook failed");
            PoolError::hook("before_destroy", err)
        })?;
        Ok(true)
    }

    /// Borrow an object for the lifetime of `ctx`.
    ///
    /// Repeated calls within the same context return the same object. The
    /// object goes back to the pool when the context ends, unless it was
    /// released or destroyed earlier. Fails with `NoContext` once `ctx` has
    /// ended.
    pub async fn with_context(
        &self,
        ctx: &ExecutionContext,
        timeout: Option<Duration>,
    ) -> PoolResult<PooledObject<T>> {
        if ctx.is_finished() {
            return Err(PoolError::NoContext);
        }
        let key = ctx.id();
        if let Some(held) = self.borrowed_by(key) {
            return Ok(held);
        }

        let obj = self.acquire(timeout).await?.ok_or(PoolError::PoolEmpty)?;
        if let Some(held) = self.borrowed_by(key) {
            // The same context borrowed while this acquire was waiting
            self.release(&obj).await?;
            return Ok(held);
        }

        self.inner.in_use.remove(&obj.id());
        self.inner.borrows.insert(key, obj.clone());

        let pool = Arc::downgrade(&self.inner);
        let registered = ctx.defer(move || async move {
            let Some(inner) = pool.upgrade() else {
                return;
            };
            let pool = ObjectPool { inner };
            let Some((_, obj)) = pool.inner.borrows.remove(&key) else {
                return;
            };
            if let Err(err) = pool.release(&obj).await {
                warn!(
                    pool = %pool.inner.key,
                    context = %key,
                    error = %err,
                    "Failed to return context-borrowed object"
                );
            }
        });
        if !registered {
            // The context ended while this acquire was waiting
            self.release(&obj).await?;
            return Err(PoolError::NoContext);
        }

        debug!(
            pool = %self.inner.key,
            context = %key,
            object = %obj.id(),
            "Object borrowed by context"
        );
        Ok(obj)
    }

    /// [`with_context`](Self::with_context) for the context the current task runs in
    pub async fn defer(&self, timeout: Option<Duration>) -> PoolResult<PooledObject<T>> {
        let ctx = ExecutionContext::current().ok_or(PoolError::NoContext)?;
        self.with_context(&ctx, timeout).await
    }

    /// Run `f` with a checked-out object and return it afterwards
    ///
    /// # Examples
    ///
    /// ```
    /// use coropool::{ObjectPool, PoolConfiguration};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> coropool::PoolResult<()> {
    /// let config = PoolConfiguration::new().with_min_objects(0).with_max_objects(2);
    /// let pool = ObjectPool::new(|| async { Ok::<_, std::io::Error>(21u64) }, config)?;
    ///
    /// let doubled = pool.invoke(None, |n| async move { *n * 2 }).await?;
    /// assert_eq!(doubled, 42);
    /// assert_eq!(pool.in_use_count(), 0);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn invoke<F, Fut, R>(&self, timeout: Option<Duration>, f: F) -> PoolResult<R>
    where
        F: FnOnce(PooledObject<T>) -> Fut,
        Fut: Future<Output = R>,
    {
        let obj = self.acquire(timeout).await?.ok_or(PoolError::PoolEmpty)?;
        let output = f(obj.clone()).await;
        self.release(&obj).await?;
        Ok(output)
    }

    /// Stop the pool and destroy every object it still tracks.
    ///
    /// Idle objects are destroyed first, then checked-out ones. Tasks still
    /// holding a handle keep a usable value, but the pool no longer knows
    /// it: releasing it later returns `Ok(false)`. Calling this again is a
    /// no-op.
    pub async fn shutdown(&self) -> PoolResult<()> {
        let first = !self.inner.destroyed.swap(true, Ordering::SeqCst);
        for timer in self.inner.timers.lock().drain(..) {
            timer.abort();
        }

        let queue = self.inner.queue.lock().take();
        let mut reclaimed = Vec::new();
        if let Some(queue) = queue {
            for obj in queue.close() {
                if self.transition(obj.id(), Membership::Idle, Membership::CheckedOut) {
                    reclaimed.push(obj);
                }
            }
        }
        reclaimed.extend(self.inner.in_use.iter().map(|entry| entry.value().clone()));
        self.inner.in_use.clear();
        reclaimed.extend(self.inner.borrows.iter().map(|entry| entry.value().clone()));
        self.inner.borrows.clear();

        let mut first_error = None;
        for obj in &reclaimed {
            if let Err(err) = self.evict(obj).await {
                first_error.get_or_insert(err);
            }
        }
        self.inner.status_table.remove(&self.inner.key);

        if first {
            info!(pool = %self.inner.key, destroyed = reclaimed.len(), "Pool shut down");
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Shut the pool down, then clear its state so it can start again lazily
    pub async fn reset(&self) -> PoolResult<()> {
        let result = self.shutdown().await;

        self.inner.membership.clear();
        self.inner.in_use.clear();
        self.inner.borrows.clear();
        self.inner.created.store(0, Ordering::SeqCst);
        *self.inner.load.lock() = LoadWindow::default();
        self.inner.destroyed.store(false, Ordering::SeqCst);

        info!(pool = %self.inner.key, "Pool reset");
        result
    }

    /// Counters of this pool
    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            created: self.created_count(),
            in_use: self.in_use_count(),
            min: self.inner.config.min_objects,
            max: self.inner.config.max_objects,
        }
    }

    /// Counters summed over every live row of the status table
    pub fn status_all(&self) -> PoolStatus {
        self.publish_status();
        self.inner.status_table.purge_stale();
        self.inner.status_table.aggregate()
    }

    /// Raw rows of the status table, keyed by pool key
    pub fn status_rows(&self) -> Vec<(String, StatusRow)> {
        self.inner.status_table.rows()
    }

    pub fn metrics(&self) -> PoolMetrics {
        self.inner.metrics.snapshot(
            self.created_count(),
            self.in_use_count(),
            self.idle_count(),
            self.inner.config.max_objects,
        )
    }

    /// Export metrics
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.metrics().export()
    }

    /// Export metrics in Prometheus format
    #[cfg(feature = "metrics")]
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> prometheus::Result<String> {
        MetricsExporter::export_prometheus(&self.metrics(), pool_name, tags)
    }

    /// Hand-off queue of the running pool, created together with the
    /// maintenance timers on first use. `None` once shut down.
    pub(crate) fn ensure_started(&self) -> Option<Arc<HandoffQueue<PooledObject<T>>>> {
        let mut slot = self.inner.queue.lock();
        if let Some(queue) = slot.as_ref() {
            return Some(Arc::clone(queue));
        }
        if self.is_destroyed() {
            return None;
        }
        let queue = Arc::new(HandoffQueue::new(self.inner.config.max_objects + QUEUE_HEADROOM));
        *slot = Some(Arc::clone(&queue));
        drop(slot);

        self.publish_status();
        self.start_timers();
        info!(
            pool = %self.inner.key,
            min = self.inner.config.min_objects,
            max = self.inner.config.max_objects,
            "Pool started"
        );
        Some(queue)
    }

    /// Create one object and queue it. `Ok(false)` when the pool is at
    /// `max_objects` or shut down.
    pub(crate) async fn create_object(
        &self,
        queue: &HandoffQueue<PooledObject<T>>,
    ) -> PoolResult<bool> {
        if self.is_destroyed() {
            return Ok(false);
        }
        let created = self.inner.created.fetch_add(1, Ordering::SeqCst) + 1;
        if created > self.inner.config.max_objects {
            self.decrement_created();
            return Ok(false);
        }

        let value = match (self.inner.factory)().await {
            Ok(value) => value,
            Err(err) => {
                self.decrement_created();
                MetricsTracker::incr(&self.inner.metrics.creation_failures);
                warn!(pool = %self.inner.key, error = %err, "Failed to create pooled object");
                return Err(PoolError::creation(err));
            }
        };

        let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);
        let id = ObjectId::new(self.inner.pool_id, seq);
        let obj = PooledObject::new(value, id);
        self.inner.membership.insert(id, Membership::Idle);
        MetricsTracker::incr(&self.inner.metrics.total_created);
        debug!(pool = %self.inner.key, object = %id, created, "Created pooled object");

        if let Err(obj) = queue.push(obj) {
            // Shut down while the factory was running
            if self.transition(id, Membership::Idle, Membership::CheckedOut) {
                self.evict(&obj).await?;
            }
            return Ok(false);
        }
        self.publish_status();
        Ok(true)
    }

    /// Put an idle object back in the queue, or destroy it if the queue is gone
    pub(crate) async fn requeue(&self, obj: PooledObject<T>) -> PoolResult<()> {
        if !self.is_idle(&obj) {
            // Forgotten by a reset while it was out; it is no longer counted
            debug!(
                pool = %self.inner.key,
                object = %obj.id(),
                "Destroying object unknown to the pool"
            );
            MetricsTracker::incr(&self.inner.metrics.total_destroyed);
            return obj
                .before_destroy()
                .await
                .map_err(|err| PoolError::hook("before_destroy", err));
        }
        let obj = match self.ensure_started() {
            Some(queue) => match queue.push(obj) {
                Ok(()) => return Ok(()),
                Err(obj) => obj,
            },
            None => obj,
        };
        if self.transition(obj.id(), Membership::Idle, Membership::CheckedOut) {
            self.evict(&obj).await?;
        }
        Ok(())
    }

    /// Atomically move `id` from `from` to `to`; `false` if it wasn't in `from`
    pub(crate) fn transition(&self, id: ObjectId, from: Membership, to: Membership) -> bool {
        match self.inner.membership.get_mut(&id) {
            Some(mut state) if *state == from => {
                *state = to;
                true
            }
            _ => false,
        }
    }

    fn is_checked_out(&self, id: ObjectId) -> bool {
        self.inner
            .membership
            .get(&id)
            .is_some_and(|state| *state == Membership::CheckedOut)
    }

    fn borrowed_by(&self, key: ContextId) -> Option<PooledObject<T>> {
        self.inner.borrows.get(&key).map(|entry| entry.value().clone())
    }

    fn clear_borrow(&self, id: ObjectId) {
        self.inner.borrows.retain(|_, held| held.id() != id);
    }

    fn decrement_created(&self) {
        let _ = self
            .inner
            .created
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)));
    }

    /// Write this pool's row into the status table
    pub(crate) fn publish_status(&self) {
        if self.is_destroyed() {
            return;
        }
        let (wait, uses) = {
            let load = self.inner.load.lock();
            (load.wait.as_secs_f64(), load.uses)
        };
        let row = StatusRow {
            pid: std::process::id(),
            created: self.created_count(),
            in_use: self.in_use_count(),
            min: self.inner.config.min_objects,
            max: self.inner.config.max_objects,
            load_wait_secs: wait,
            load_uses: uses,
            last_alive_ms: now_millis(),
        };
        if !self.inner.status_table.register(&self.inner.key, row) {
            debug!(pool = %self.inner.key, "Status table is full, row not published");
        }
    }
}
