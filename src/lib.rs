//! # coropool
//!
//! Task-aware object pool for tokio: a bounded set of expensive objects
//! (connections, sessions, clients) shared by many concurrent tasks of one
//! process.
//!
//! ## Features
//!
//! - Lazy creation up to `max_objects`, with bounded retries on factory failures
//! - Exclusive checkout through a FIFO hand-off queue with timeout
//! - Optional lifecycle hooks on the pooled type (`before_use`, `after_return`,
//!   `before_destroy`, `keep_alive`)
//! - Idle eviction, keep-minimum warm-up and load-adaptive shrinking on timers
//!   that start with the first checkout
//! - Borrows scoped to an [`ExecutionContext`], returned when the context ends
//! - Deterministic shutdown that reclaims idle and checked-out objects
//! - Status rows in a table shareable by sibling pools, plus metrics with
//!   Prometheus export
//! - A name-keyed [`PoolManager`] with bulk shutdown
//!
//! ## Quick Start
//!
//! ```rust
//! use coropool::{ExecutionContext, ObjectPool, PoolConfiguration};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> coropool::PoolResult<()> {
//! let config = PoolConfiguration::new().with_min_objects(1).with_max_objects(8);
//! let pool = ObjectPool::new(|| async { Ok::<_, std::io::Error>(42u32) }, config)?;
//!
//! {
//!     let obj = pool.acquire(None).await?.expect("pool has capacity");
//!     println!("Got: {}", *obj);
//!     pool.release(&obj).await?;
//! }
//!
//! // Borrowed for the request, returned automatically when it ends
//! let inner = pool.clone();
//! ExecutionContext::scope(async move {
//!     let obj = inner.defer(None).await?;
//!     println!("Borrowed: {}", *obj);
//!     Ok::<_, coropool::PoolError>(())
//! })
//! .await?;
//!
//! assert_eq!(pool.in_use_count(), 0);
//! pool.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod context;
mod errors;
mod maintenance;
mod metrics;
mod object;
mod pool;
mod queue;
mod registry;
mod status;

pub use async_trait::async_trait;
pub use config::PoolConfiguration;
pub use context::{ContextId, ExecutionContext};
pub use errors::{BoxError, PoolError, PoolResult, SharedError};
#[cfg(feature = "metrics")]
pub use metrics::MetricsExporter;
pub use metrics::PoolMetrics;
pub use object::{Lifecycle, ObjectId, PooledObject};
pub use pool::{DEFAULT_RETRIES, ObjectPool};
pub use registry::{ManagedPool, PoolManager};
pub use status::{PoolStatus, StatusRow, StatusTable};
