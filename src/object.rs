//! Pooled handles and the optional lifecycle hooks of pooled types

use crate::errors::BoxError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Opaque identity of a pooled object.
///
/// Unique within one engine and never reused while the engine lives. The
/// engine number keeps handles of sibling pools apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    pool: u64,
    seq: u64,
}

impl ObjectId {
    pub(crate) fn new(pool: u64, seq: u64) -> Self {
        Self { pool, seq }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pool, self.seq)
    }
}

/// Hooks a pooled type may implement to take part in its own lifecycle.
///
/// Every method has a default body, so `impl Lifecycle for MyConn {}` is
/// enough for types that don't care.
///
/// # Examples
///
/// ```
/// use coropool::{BoxError, Lifecycle};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Connection {
///     healthy: AtomicBool,
/// }
///
/// #[async_trait::async_trait]
/// impl Lifecycle for Connection {
///     async fn before_use(&self) -> Result<bool, BoxError> {
///         Ok(self.healthy.load(Ordering::Relaxed))
///     }
/// }
/// ```
#[async_trait]
pub trait Lifecycle: Send + Sync + 'static {
    /// Runs on checkout. `Ok(false)` rejects the object and it is destroyed.
    async fn before_use(&self) -> Result<bool, BoxError> {
        Ok(true)
    }

    /// Runs when the object is returned, before it is requeued.
    async fn after_return(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Runs once right before the pool forgets the object.
    async fn before_destroy(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Consulted by the idle sweep for objects that haven't timed out yet.
    /// Returning `false` evicts the object.
    async fn keep_alive(&self, _idle_for: Duration) -> bool {
        true
    }
}

macro_rules! plain_lifecycle {
    ($($ty:ty),* $(,)?) => {
        $(impl Lifecycle for $ty {})*
    };
}

// Plain values never need hooks.
plain_lifecycle!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool, char, String, Vec<u8>,
);

struct Slot<T> {
    id: ObjectId,
    last_used: Mutex<Instant>,
    value: T,
}

/// A pooled object: the user value plus pool-private identity and timestamp.
///
/// Clones share the same underlying object. Return it with
/// [`ObjectPool::release`](crate::ObjectPool::release) or borrow it through an
/// [`ExecutionContext`](crate::ExecutionContext) to have it returned
/// automatically.
pub struct PooledObject<T> {
    slot: Arc<Slot<T>>,
}

impl<T> PooledObject<T> {
    pub(crate) fn new(value: T, id: ObjectId) -> Self {
        Self {
            slot: Arc::new(Slot {
                id,
                last_used: Mutex::new(Instant::now()),
                value,
            }),
        }
    }

    /// Identity assigned by the pool that created this object
    pub fn id(&self) -> ObjectId {
        self.slot.id
    }

    /// When the object was last checked out
    pub fn last_used(&self) -> Instant {
        *self.slot.last_used.lock()
    }

    /// Time elapsed since the last checkout
    pub fn idle_for(&self) -> Duration {
        self.last_used().elapsed()
    }

    pub(crate) fn touch(&self) {
        *self.slot.last_used.lock() = Instant::now();
    }

    /// Whether both handles refer to the same pooled object
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl<T> Clone for PooledObject<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Deref for PooledObject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.slot.value
    }
}

impl<T: fmt::Debug> fmt::Debug for PooledObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledObject")
            .field("id", &self.slot.id)
            .field("value", &self.slot.value)
            .finish()
    }
}
