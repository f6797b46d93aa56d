//! Metrics collection and export for object pools

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "metrics")]
use serde::Serialize;

/// Metrics snapshot for a pool
///
/// # Examples
///
/// ```
/// use coropool::{ObjectPool, PoolConfiguration};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> coropool::PoolResult<()> {
/// let config = PoolConfiguration::new().with_min_objects(0).with_max_objects(3);
/// let pool = ObjectPool::new(|| async { Ok::<_, std::io::Error>(7u32) }, config)?;
///
/// let obj = pool.acquire(None).await?.unwrap();
/// let metrics = pool.metrics();
/// assert_eq!(metrics.total_acquired, 1);
/// assert_eq!(metrics.in_use_objects, 1);
/// pool.release(&obj).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "metrics", derive(Serialize))]
pub struct PoolMetrics {
    /// Successful checkouts
    pub total_acquired: usize,

    /// Objects returned and requeued
    pub total_released: usize,

    /// Objects created by the factory
    pub total_created: usize,

    /// Objects destroyed for any reason
    pub total_destroyed: usize,

    /// Factory calls that failed
    pub creation_failures: usize,

    /// Checkouts refused by `before_use`
    pub hook_rejections: usize,

    /// Acquires that came back with nothing
    pub empty_events: usize,

    /// Objects currently alive
    pub created_objects: usize,

    /// Objects currently checked out
    pub in_use_objects: usize,

    /// Objects waiting in the queue
    pub idle_objects: usize,

    pub max_objects: usize,

    /// `in_use_objects / max_objects`
    pub utilization: f64,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("total_acquired".to_string(), self.total_acquired.to_string());
        metrics.insert("total_released".to_string(), self.total_released.to_string());
        metrics.insert("total_created".to_string(), self.total_created.to_string());
        metrics.insert("total_destroyed".to_string(), self.total_destroyed.to_string());
        metrics.insert("creation_failures".to_string(), self.creation_failures.to_string());
        metrics.insert("hook_rejections".to_string(), self.hook_rejections.to_string());
        metrics.insert("empty_events".to_string(), self.empty_events.to_string());
        metrics.insert("created_objects".to_string(), self.created_objects.to_string());
        metrics.insert("in_use_objects".to_string(), self.in_use_objects.to_string());
        metrics.insert("idle_objects".to_string(), self.idle_objects.to_string());
        metrics.insert("max_objects".to_string(), self.max_objects.to_string());
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics
    }
}

/// Metrics exporter for Prometheus format
#[cfg(feature = "metrics")]
pub struct MetricsExporter;

#[cfg(feature = "metrics")]
impl MetricsExporter {
    /// Render metrics in the Prometheus text exposition format
    ///
    /// # Examples
    ///
    /// ```
    /// use coropool::{ObjectPool, PoolConfiguration};
    /// use std::collections::HashMap;
    ///
    /// let config = PoolConfiguration::new().with_min_objects(0).with_max_objects(3);
    /// let pool = ObjectPool::new(|| async { Ok::<_, std::io::Error>(1u8) }, config).unwrap();
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = pool.export_metrics_prometheus("db", Some(&tags)).unwrap();
    /// assert!(output.contains("coropool_objects_in_use"));
    /// assert!(output.contains("service=\"api\""));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> prometheus::Result<String> {
        use prometheus::{Encoder, Gauge, IntGauge, Opts, Registry, TextEncoder};

        let mut labels = HashMap::new();
        labels.insert("pool".to_string(), pool_name.to_string());
        if let Some(tags) = tags {
            for (key, value) in tags {
                labels.insert(key.clone(), value.clone());
            }
        }
        let registry = Registry::new_custom(Some("coropool".to_string()), Some(labels))?;

        let values = [
            ("objects_created", "Objects currently alive", metrics.created_objects),
            ("objects_in_use", "Objects currently checked out", metrics.in_use_objects),
            ("objects_idle", "Objects waiting in the queue", metrics.idle_objects),
            ("objects_max", "Configured maximum number of objects", metrics.max_objects),
            ("acquired_total", "Successful checkouts", metrics.total_acquired),
            ("released_total", "Objects returned to the pool", metrics.total_released),
            ("created_total", "Objects created by the factory", metrics.total_created),
            ("destroyed_total", "Objects destroyed", metrics.total_destroyed),
            ("creation_failures_total", "Factory failures", metrics.creation_failures),
            ("hook_rejections_total", "Checkouts refused by before_use", metrics.hook_rejections),
            ("empty_events_total", "Acquires that returned nothing", metrics.empty_events),
        ];
        for (name, help, value) in values {
            let gauge = IntGauge::with_opts(Opts::new(name, help))?;
            gauge.set(value as i64);
            registry.register(Box::new(gauge))?;
        }

        let utilization = Gauge::with_opts(Opts::new("utilization", "Pool utilization ratio"))?;
        utilization.set(metrics.utilization);
        registry.register(Box::new(utilization))?;

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Internal metrics tracker
#[derive(Debug, Default)]
pub(crate) struct MetricsTracker {
    pub total_acquired: AtomicUsize,
    pub total_released: AtomicUsize,
    pub total_created: AtomicUsize,
    pub total_destroyed: AtomicUsize,
    pub creation_failures: AtomicUsize,
    pub hook_rejections: AtomicUsize,
    pub empty_events: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, created: usize, in_use: usize, idle: usize, max: usize) -> PoolMetrics {
        let utilization = if max > 0 {
            in_use as f64 / max as f64
        } else {
            0.0
        };

        PoolMetrics {
            total_acquired: self.total_acquired.load(Ordering::Relaxed),
            total_released: self.total_released.load(Ordering::Relaxed),
            total_created: self.total_created.load(Ordering::Relaxed),
            total_destroyed: self.total_destroyed.load(Ordering::Relaxed),
            creation_failures: self.creation_failures.load(Ordering::Relaxed),
            hook_rejections: self.hook_rejections.load(Ordering::Relaxed),
            empty_events: self.empty_events.load(Ordering::Relaxed),
            created_objects: created,
            in_use_objects: in_use,
            idle_objects: idle,
            max_objects: max,
            utilization,
        }
    }
}
