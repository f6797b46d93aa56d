//! Name-keyed registry of pools

use crate::errors::PoolResult;
use crate::object::Lifecycle;
use crate::pool::ObjectPool;
use crate::status::PoolStatus;

use dashmap::DashMap;
use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use tracing::warn;

/// Type-erased view of a registered pool
pub trait ManagedPool: Send + Sync {
    fn status(&self) -> PoolStatus;

    fn shutdown(&self) -> Pin<Box<dyn Future<Output = PoolResult<()>> + Send + '_>>;

    fn as_any(&self) -> &dyn Any;
}

impl<T: Lifecycle> ManagedPool for ObjectPool<T> {
    fn status(&self) -> PoolStatus {
        ObjectPool::status(self)
    }

    fn shutdown(&self) -> Pin<Box<dyn Future<Output = PoolResult<()>> + Send + '_>> {
        Box::pin(ObjectPool::shutdown(self))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Registry mapping names to pools, with a bulk shutdown.
///
/// # Examples
///
/// ```
/// use coropool::{ObjectPool, PoolConfiguration, PoolManager};
///
/// let manager = PoolManager::new();
/// let config = PoolConfiguration::new().with_min_objects(0).with_max_objects(2);
/// let pool = ObjectPool::new(|| async { Ok::<_, std::io::Error>(5u16) }, config).unwrap();
///
/// manager.register("numbers", pool);
/// assert!(manager.get::<u16>("numbers").is_some());
/// assert!(manager.get::<u32>("numbers").is_none());
/// ```
#[derive(Default)]
pub struct PoolManager {
    pools: DashMap<String, Arc<dyn ManagedPool>>,
}

impl PoolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn global() -> &'static PoolManager {
        static GLOBAL: OnceLock<PoolManager> = OnceLock::new();
        GLOBAL.get_or_init(PoolManager::new)
    }

    /// Register `pool` under `name`, replacing any pool already there
    pub fn register<T: Lifecycle>(&self, name: impl Into<String>, pool: ObjectPool<T>) -> &Self {
        self.pools.insert(name.into(), Arc::new(pool));
        self
    }

    /// Register `pool` under the name of its object type
    pub fn register_default<T: Lifecycle>(&self, pool: ObjectPool<T>) -> &Self {
        self.register(std::any::type_name::<T>(), pool)
    }

    /// Look up a pool by name and object type
    pub fn get<T: Lifecycle>(&self, name: &str) -> Option<ObjectPool<T>> {
        let entry = self.pools.get(name)?;
        entry.as_any().downcast_ref::<ObjectPool<T>>().cloned()
    }

    pub fn get_managed(&self, name: &str) -> Option<Arc<dyn ManagedPool>> {
        self.pools.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, name: &str) -> Option<Arc<dyn ManagedPool>> {
        self.pools.remove(name).map(|(_, pool)| pool)
    }

    pub fn names(&self) -> Vec<String> {
        self.pools.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Shut down every registered pool. Pools stay registered.
    ///
    /// All pools are shut down even if some fail; the first error is returned.
    pub async fn reset_all(&self) -> PoolResult<()> {
        let pools: Vec<(String, Arc<dyn ManagedPool>)> = self
            .pools
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut first_error = None;
        for (name, pool) in pools {
            if let Err(err) = pool.shutdown().await {
                warn!(pool = %name, error = %err, "Failed to shut down pool");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PoolConfiguration;
    use std::io;

    fn small_pool() -> ObjectPool<u32> {
        let config = PoolConfiguration::new()
            .with_min_objects(0)
            .with_max_objects(2)
            .with_interval_check_period(std::time::Duration::ZERO);
        ObjectPool::new(|| async { Ok::<_, io::Error>(1u32) }, config).unwrap()
    }

    #[test]
    fn test_register_default_uses_type_name() {
        let manager = PoolManager::new();
        manager.register_default(small_pool());

        assert_eq!(manager.names(), vec!["u32".to_string()]);
        assert!(manager.get::<u32>("u32").is_some());
    }

    #[tokio::test]
    async fn test_reset_all_shuts_down_every_pool() {
        let manager = PoolManager::new();
        let a = small_pool();
        let b = small_pool();
        manager.register("a", a.clone()).register("b", b.clone());

        let held = a.acquire(None).await.unwrap().unwrap();
        manager.reset_all().await.unwrap();

        assert!(a.is_destroyed());
        assert!(b.is_destroyed());
        assert_eq!(manager.len(), 2);
        assert!(!a.release(&held).await.unwrap());
        assert_eq!(manager.get_managed("a").unwrap().status().created, 0);
    }

    #[test]
    fn test_global_registry_is_shared() {
        PoolManager::global().register("global-test", small_pool());
        assert!(PoolManager::global().get::<u32>("global-test").is_some());
        assert!(PoolManager::global().remove("global-test").is_some());
    }
}
