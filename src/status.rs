//! Point-in-time pool status and the shared status table

use dashmap::DashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counters for one pool, or summed over every live row of a table.
///
/// # Examples
///
/// ```
/// use coropool::{ObjectPool, PoolConfiguration};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> coropool::PoolResult<()> {
/// let config = PoolConfiguration::new().with_min_objects(0).with_max_objects(4);
/// let pool = ObjectPool::new(|| async { Ok::<_, std::io::Error>(1u8) }, config)?;
///
/// let obj = pool.acquire(None).await?.unwrap();
/// let status = pool.status();
/// assert_eq!(status.created, 1);
/// assert_eq!(status.in_use, 1);
/// pool.release(&obj).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoolStatus {
    /// Objects currently alive
    pub created: usize,

    /// Objects currently checked out
    pub in_use: usize,

    /// Configured floor
    pub min: usize,

    /// Configured ceiling
    pub max: usize,
}

/// One engine's row in a [`StatusTable`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatusRow {
    pub pid: u32,
    pub created: usize,
    pub in_use: usize,
    pub min: usize,
    pub max: usize,
    /// Wait time accumulated in the current load window, in seconds
    pub load_wait_secs: f64,
    /// Checkouts counted in the current load window
    pub load_uses: u64,
    /// Milliseconds since the Unix epoch of the last heartbeat
    pub last_alive_ms: u64,
}

impl StatusRow {
    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            created: self.created,
            in_use: self.in_use,
            min: self.min,
            max: self.max,
        }
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Fixed-capacity table of status rows, shareable by sibling pools.
///
/// Each pool writes only the row under its own key. Rows whose heartbeat
/// is older than the liveness timeout are dropped by [`purge_stale`](Self::purge_stale),
/// which any pool may call without coordinating with the others.
///
/// # Examples
///
/// ```
/// use coropool::{StatusRow, StatusTable};
///
/// let table = StatusTable::new(8);
/// assert!(table.register("a", StatusRow { created: 2, ..Default::default() }));
/// assert!(table.register("b", StatusRow { created: 3, ..Default::default() }));
/// assert_eq!(table.aggregate().created, 5);
/// ```
#[derive(Debug)]
pub struct StatusTable {
    rows: DashMap<String, StatusRow>,
    capacity: usize,
    liveness: Duration,
}

impl StatusTable {
    pub const DEFAULT_CAPACITY: usize = 1024;
    pub const DEFAULT_LIVENESS: Duration = Duration::from_secs(15);

    pub fn new(capacity: usize) -> Self {
        Self {
            rows: DashMap::with_capacity(capacity.min(Self::DEFAULT_CAPACITY)),
            capacity,
            liveness: Self::DEFAULT_LIVENESS,
        }
    }

    /// Set how long a row may go without a heartbeat before it is aged out
    pub fn with_liveness(mut self, liveness: Duration) -> Self {
        self.liveness = liveness;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Insert or overwrite a row. Returns `false` if the table is full.
    pub fn register(&self, key: &str, mut row: StatusRow) -> bool {
        if !self.rows.contains_key(key) && self.rows.len() >= self.capacity {
            return false;
        }
        if row.last_alive_ms == 0 {
            row.last_alive_ms = now_millis();
        }
        self.rows.insert(key.to_string(), row);
        true
    }

    /// Apply `f` to an existing row; missing rows are left alone
    pub fn update<F>(&self, key: &str, f: F)
    where
        F: FnOnce(&mut StatusRow),
    {
        if let Some(mut row) = self.rows.get_mut(key) {
            f(row.value_mut());
        }
    }

    pub fn heartbeat(&self, key: &str) {
        self.update(key, |row| row.last_alive_ms = now_millis());
    }

    pub fn get(&self, key: &str) -> Option<StatusRow> {
        self.rows.get(key).map(|row| row.value().clone())
    }

    pub fn remove(&self, key: &str) -> Option<StatusRow> {
        self.rows.remove(key).map(|(_, row)| row)
    }

    /// Drop rows that missed their heartbeat. Returns how many were removed.
    pub fn purge_stale(&self) -> usize {
        self.purge_stale_at(now_millis())
    }

    pub fn purge_stale_at(&self, now_ms: u64) -> usize {
        let liveness = self.liveness.as_millis() as u64;
        let before = self.rows.len();
        self.rows
            .retain(|_, row| now_ms.saturating_sub(row.last_alive_ms) < liveness);
        before.saturating_sub(self.rows.len())
    }

    /// Snapshot of every row with its key
    pub fn rows(&self) -> Vec<(String, StatusRow)> {
        self.rows
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Sum of every row currently in the table
    pub fn aggregate(&self) -> PoolStatus {
        self.rows.iter().fold(PoolStatus::default(), |acc, row| PoolStatus {
            created: acc.created + row.created,
            in_use: acc.in_use + row.in_use,
            min: acc.min + row.min,
            max: acc.max + row.max,
        })
    }
}

impl Default for StatusTable {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
