//! Maintenance routines and the timers that drive them
//!
//! The timers only hold a weak reference to the pool and go through the
//! same public operations as application code.

use crate::errors::PoolResult;
use crate::object::Lifecycle;
use crate::pool::{Checkout, LoadWindow, Membership, ObjectPool, PoolInner};

use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Share of the created objects a light-load window may reclaim, as a divisor (5%)
const SHRINK_DIVISOR: usize = 20;

impl<T: Lifecycle> ObjectPool<T> {
    /// Evict idle objects unused for longer than `max_idle`, or whose
    /// [`keep_alive`](Lifecycle::keep_alive) check fails.
    ///
    /// Survivors go back to the queue in their original order. Returns the
    /// number of evicted objects.
    pub async fn idle_check(&self, max_idle: Duration) -> PoolResult<usize> {
        let Some(queue) = self.ensure_started() else {
            return Ok(0);
        };

        let mut evicted = 0;
        let mut first_error = None;
        for _ in 0..queue.len() {
            let Some(obj) = queue.try_pop() else {
                break;
            };
            let idle_for = obj.idle_for();
            let expired = idle_for > max_idle || !obj.keep_alive(idle_for).await;
            if !expired {
                if let Err(err) = self.requeue(obj).await {
                    first_error.get_or_insert(err);
                }
                continue;
            }
            if !self.transition(obj.id(), Membership::Idle, Membership::CheckedOut) {
                continue;
            }
            evicted += 1;
            if let Err(err) = self.evict(&obj).await {
                first_error.get_or_insert(err);
            }
        }

        if evicted > 0 {
            debug!(
                pool = %self.inner.key,
                evicted,
                created = self.created_count(),
                "Evicted idle objects"
            );
        }
        first_error.map_or(Ok(evicted), Err)
    }

    /// Create objects until `target` (default `min_objects`) are alive.
    ///
    /// Stops quietly at the first creation that fails or is refused.
    /// Returns the created count afterwards.
    pub async fn keep_min(&self, target: Option<usize>) -> usize {
        let target = target.unwrap_or(self.inner.config.min_objects);
        let Some(queue) = self.ensure_started() else {
            return self.created_count();
        };

        let deficit = target.saturating_sub(self.created_count());
        for _ in 0..deficit {
            match self.create_object(&queue).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => {
                    debug!(
                        pool = %self.inner.key,
                        error = %err,
                        "Warm-up stopped after a failed creation"
                    );
                    break;
                }
            }
        }
        self.created_count()
    }

    /// One maintenance tick: heartbeat, age out dead status rows, sweep idle
    /// objects and top the pool up to `min_objects`.
    pub async fn interval_check(&self) -> PoolResult<()> {
        self.publish_status();
        let purged = self.inner.status_table.purge_stale();
        if purged > 0 {
            debug!(pool = %self.inner.key, purged, "Aged out stale status rows");
        }

        let swept = self.idle_check(self.inner.config.max_idle_time).await;
        self.keep_min(None).await;
        swept.map(|_| ())
    }

    /// Close the current load window and shrink the pool when callers
    /// barely waited.
    ///
    /// When the average wait per checkout is below `load_average_target`,
    /// up to 5% of the created objects are taken from the queue without
    /// waiting and destroyed, never going below `min_objects`. Returns the
    /// number of destroyed objects.
    pub async fn load_shrink(&self) -> PoolResult<usize> {
        let LoadWindow { wait, uses } = std::mem::take(&mut *self.inner.load.lock());
        self.publish_status();

        let average = wait.as_secs_f64() / uses.max(1) as f64;
        if average >= self.inner.config.load_average_target.as_secs_f64() {
            return Ok(0);
        }

        let created = self.created_count();
        let budget =
            (created / SHRINK_DIVISOR).min(created.saturating_sub(self.inner.config.min_objects));
        let mut shrunk = 0;
        while shrunk < budget {
            let Some(obj) = self.checkout(Some(Duration::ZERO), 0, Checkout::Reclaim).await? else {
                break;
            };
            self.evict(&obj).await?;
            shrunk += 1;
        }

        if shrunk > 0 {
            debug!(
                pool = %self.inner.key,
                shrunk,
                average,
                created = self.created_count(),
                "Shrank lightly loaded pool"
            );
        }
        Ok(shrunk)
    }

    pub(crate) fn start_timers(&self) {
        let Ok(runtime) = Handle::try_current() else {
            warn!(pool = %self.inner.key, "No tokio runtime, maintenance timers not started");
            return;
        };
        let config = &self.inner.config;
        let mut timers = self.inner.timers.lock();

        if !config.interval_check_period.is_zero() {
            timers.push(spawn_periodic(
                &runtime,
                Arc::downgrade(&self.inner),
                config.interval_check_period,
                |pool| async move {
                    if let Err(err) = pool.interval_check().await {
                        warn!(pool = %pool.inner.key, error = %err, "Interval check failed");
                    }
                },
            ));
        }

        if !config.load_window.is_zero() {
            timers.push(spawn_periodic(
                &runtime,
                Arc::downgrade(&self.inner),
                config.load_window,
                |pool| async move {
                    if let Err(err) = pool.load_shrink().await {
                        warn!(pool = %pool.inner.key, error = %err, "Load-adaptive shrink failed");
                    }
                },
            ));
        }
    }
}

/// Run `tick` every `period` for as long as the pool is alive
fn spawn_periodic<T, F, Fut>(
    runtime: &Handle,
    pool: Weak<PoolInner<T>>,
    period: Duration,
    tick: F,
) -> JoinHandle<()>
where
    T: Lifecycle,
    F: Fn(ObjectPool<T>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    runtime.spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(inner) = pool.upgrade() else {
                break;
            };
            tick(ObjectPool { inner }).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use crate::{Lifecycle, ObjectPool, PoolConfiguration};
    use async_trait::async_trait;
    use std::io;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug)]
    struct Session {
        n: usize,
        alive: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Lifecycle for Session {
        async fn keep_alive(&self, _idle_for: Duration) -> bool {
            self.alive.load(Ordering::SeqCst)
        }
    }

    fn quiet(min: usize, max: usize) -> PoolConfiguration {
        PoolConfiguration::new()
            .with_min_objects(min)
            .with_max_objects(max)
            .with_get_object_timeout(Duration::from_millis(50))
            .with_interval_check_period(Duration::ZERO)
            .with_load_window(Duration::ZERO)
    }

    fn session_pool(min: usize, max: usize) -> (ObjectPool<Session>, Arc<AtomicBool>) {
        let alive = Arc::new(AtomicBool::new(true));
        let seq = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&alive);
        let pool = ObjectPool::new(
            move || {
                let n = seq.fetch_add(1, Ordering::SeqCst);
                let alive = Arc::clone(&flag);
                async move { Ok::<_, io::Error>(Session { n, alive }) }
            },
            quiet(min, max),
        )
        .unwrap();
        (pool, alive)
    }

    #[tokio::test]
    async fn test_keep_min_fills_up_to_target() {
        let (pool, _) = session_pool(3, 5);
        assert_eq!(pool.keep_min(None).await, 3);
        assert_eq!(pool.idle_count(), 3);
        assert_eq!(pool.keep_min(Some(10)).await, 5);
    }

    #[tokio::test]
    async fn test_keep_min_stops_at_first_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let pool = ObjectPool::new(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, _>(io::Error::other("refused")) }
            },
            quiet(4, 8),
        )
        .unwrap();

        assert_eq!(pool.keep_min(None).await, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_idle_sweep_evicts_stale_and_keeps_order() {
        let (pool, _) = session_pool(0, 5);
        pool.keep_min(Some(4)).await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        // Touch two objects and queue them behind the two stale ones
        let first = pool.acquire(Some(Duration::ZERO)).await.unwrap().unwrap();
        let second = pool.acquire(Some(Duration::ZERO)).await.unwrap().unwrap();
        pool.release(&second).await.unwrap();
        pool.release(&first).await.unwrap();

        assert_eq!(pool.idle_check(Duration::from_millis(60)).await.unwrap(), 2);
        assert_eq!(pool.created_count(), 2);
        assert_eq!(pool.idle_count(), 2);

        let a = pool.acquire(Some(Duration::ZERO)).await.unwrap().unwrap();
        let b = pool.acquire(Some(Duration::ZERO)).await.unwrap().unwrap();
        assert_eq!(a.n, second.n);
        assert_eq!(b.n, first.n);
    }

    #[tokio::test]
    async fn test_failed_keep_alive_evicts_fresh_objects() {
        let (pool, alive) = session_pool(0, 5);
        pool.keep_min(Some(2)).await;
        alive.store(false, Ordering::SeqCst);

        assert_eq!(pool.idle_check(Duration::from_secs(60)).await.unwrap(), 2);
        assert_eq!(pool.created_count(), 0);
        assert_eq!(pool.idle_count(), 0);
    }

    #[tokio::test]
    async fn test_load_shrink_takes_five_percent() {
        let (pool, _) = session_pool(5, 30);
        assert_eq!(pool.keep_min(Some(20)).await, 20);

        assert_eq!(pool.load_shrink().await.unwrap(), 1);
        assert_eq!(pool.created_count(), 19);
        assert_eq!(pool.metrics().total_acquired, 0);
    }

    #[tokio::test]
    async fn test_load_shrink_respects_minimum() {
        let (pool, _) = session_pool(20, 30);
        assert_eq!(pool.keep_min(None).await, 20);

        assert_eq!(pool.load_shrink().await.unwrap(), 0);
        assert_eq!(pool.created_count(), 20);
    }

    #[tokio::test]
    async fn test_load_shrink_skips_busy_pool() {
        let (pool, _) = session_pool(0, 30);
        pool.keep_min(Some(20)).await;
        pool.inner.load.lock().wait = Duration::from_secs(1);
        pool.inner.load.lock().uses = 1;

        assert_eq!(pool.load_shrink().await.unwrap(), 0);
        assert_eq!(pool.created_count(), 20);
        assert_eq!(pool.inner.load.lock().uses, 0);
    }

    #[tokio::test]
    async fn test_load_shrink_stops_when_nothing_is_idle() {
        let (pool, _) = session_pool(0, 60);
        pool.keep_min(Some(40)).await;
        let mut held = Vec::new();
        for _ in 0..40 {
            held.push(pool.acquire(None).await.unwrap().unwrap());
        }

        assert_eq!(pool.load_shrink().await.unwrap(), 0);
        assert_eq!(pool.created_count(), 40);
    }

    #[tokio::test]
    async fn test_interval_timer_warms_pool() {
        let pool = ObjectPool::new(
            || async { Ok::<_, io::Error>(1u32) },
            quiet(2, 4).with_interval_check_period(Duration::from_millis(20)),
        )
        .unwrap();

        let obj = pool.acquire(None).await.unwrap().unwrap();
        pool.release(&obj).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(pool.created_count(), 2);

        pool.shutdown().await.unwrap();
        assert!(pool.inner.timers.lock().is_empty());
    }
}
